//! The `namu` application.
//!
//! Builds the embedding providers, the Postgres store, and the search and
//! ingestion services from [`NamuConfig`], then dispatches one command.

use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use namu_core::{Error, Result, SearchResult};
use namu_embed::{CachingEmbeddingProvider, EmbeddingProvider, HttpEmbeddingProvider};
use namu_ingest::{
    IngestionOrchestrator, IngestionRunner, JsonlRowSource, ProgressTracker, RowSource,
};
use namu_search::{HybridSearchEngine, HybridSearchRequest, MAX_LIMIT, VectorSearch};
use namu_server::AppState;
use namu_store::{PgStore, RetrievalStore};

use crate::cli::{CliArgs, Command};
use crate::config::NamuConfig;
use crate::config_handlers;

// ============================================================================
// NamuApp
// ============================================================================

/// The CLI application.
pub struct NamuApp {
    config: Arc<NamuConfig>,
}

impl NamuApp {
    /// Create from CLI args, loading config from file/env.
    pub fn from_args(args: &CliArgs) -> Result<Self> {
        let config = NamuConfig::load(args.config.as_deref())?;
        Ok(Self::new(config))
    }

    /// Create from an already-loaded config.
    pub fn new(config: NamuConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    /// Initialise tracing-based logging.
    ///
    /// Uses `RUST_LOG` env var if set, otherwise defaults based on verbosity flags.
    pub fn init_logging(verbose: bool, quiet: bool) {
        let filter = if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else if quiet {
            EnvFilter::new("warn")
        } else if verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("info")
        };

        // Ignore error if a subscriber is already set (e.g. in tests).
        let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
    }

    /// Run the CLI with the given arguments.
    pub async fn run(&self, args: CliArgs) -> Result<()> {
        Self::init_logging(args.verbose, args.quiet);

        match args.command {
            Command::Serve => self.serve().await,
            Command::Ingest { path, limit } => self.ingest(path, limit).await,
            Command::Search { query, limit } => self.search(&query, limit).await,
            Command::Hybrid {
                query,
                no_vector,
                no_text,
                keyword_weight,
                limit,
            } => {
                let request = HybridSearchRequest::new(query)
                    .with_vector(!no_vector)
                    .with_text(!no_text)
                    .with_keyword_weight(keyword_weight)
                    .with_limit(limit);
                self.hybrid(&request).await
            }
            Command::Stats => self.stats().await,
            Command::Config(config_cmd) => {
                config_handlers::handle_config_command(args.config.as_deref(), config_cmd.command)
            }
        }
    }

    // ------------------------------------------------------------------------
    // Commands
    // ------------------------------------------------------------------------

    async fn serve(&self) -> Result<()> {
        let store = self.store().await?;
        let embedder = self.embedder()?;
        let runner = IngestionRunner::new(Arc::new(self.orchestrator(
            Arc::clone(&embedder),
            Arc::clone(&store),
        )));

        let mut state = AppState::new(
            runner,
            self.query_embedder(embedder),
            store,
            self.config.search.clone(),
        );
        if let Some(source) = self.source(None, None) {
            state = state.with_source(source);
        }

        namu_server::serve(self.config.server.socket_addr()?, state).await
    }

    async fn ingest(&self, path: Option<String>, limit: Option<usize>) -> Result<()> {
        let source = self
            .source(path, limit)
            .ok_or_else(|| Error::config("no dataset path: pass --path or set ingest.dataset_path"))?;
        let orchestrator = self.orchestrator(self.embedder()?, self.store().await?);

        let summary = orchestrator.run(source.as_ref()).await?;
        println!(
            "Ingested {} of {} rows from {}",
            summary.inserted,
            summary.rows_read,
            source.describe()
        );
        Ok(())
    }

    async fn search(&self, query: &str, limit: usize) -> Result<()> {
        let search = VectorSearch::new(
            self.query_embedder(self.embedder()?),
            self.store().await?,
            self.config.search.clone(),
        );
        let results = search.search(query, limit.clamp(1, MAX_LIMIT)).await?;
        print_results(&results);
        Ok(())
    }

    async fn hybrid(&self, request: &HybridSearchRequest) -> Result<()> {
        let engine = HybridSearchEngine::new(
            self.query_embedder(self.embedder()?),
            self.store().await?,
            self.config.search.clone(),
        );
        let outcome = engine.search(request).await?;
        print_results(&outcome.results);
        if !outcome.generated_sql.is_empty() {
            println!("\n{}", outcome.generated_sql);
        }
        tracing::debug!(explanation = %outcome.diagnostics, "query plan");
        Ok(())
    }

    async fn stats(&self) -> Result<()> {
        let count = self.store().await?.count().await?;
        println!("{count} documents");
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Wiring
    // ------------------------------------------------------------------------

    async fn store(&self) -> Result<Arc<dyn RetrievalStore>> {
        let store = PgStore::connect(&self.config.database)
            .await?
            .with_fulltext_config(&self.config.search.fulltext_config)?
            .with_rrf_k(self.config.search.rrf_k)
            .with_unified_candidates(self.config.search.unified_candidates);
        Ok(Arc::new(store))
    }

    fn embedder(&self) -> Result<Arc<dyn EmbeddingProvider>> {
        Ok(Arc::new(HttpEmbeddingProvider::new(&self.config.embedding)?))
    }

    /// Wrap `embedder` with the query cache.
    fn query_embedder(&self, embedder: Arc<dyn EmbeddingProvider>) -> Arc<dyn EmbeddingProvider> {
        Arc::new(CachingEmbeddingProvider::new(
            embedder,
            self.config.embedding.cache_size,
        ))
    }

    fn orchestrator(
        &self,
        embedder: Arc<dyn EmbeddingProvider>,
        store: Arc<dyn RetrievalStore>,
    ) -> IngestionOrchestrator {
        let progress = Arc::new(ProgressTracker::with_capacity(
            self.config.ingest.history_capacity,
        ));
        IngestionOrchestrator::new(embedder, store, progress)
            .with_embed_batch_size(self.config.embedding.batch_size)
            .with_insert_batch_size(self.config.ingest.insert_batch_size)
    }

    /// The dataset source, with CLI overrides taking precedence over config.
    fn source(&self, path: Option<String>, limit: Option<usize>) -> Option<Arc<dyn RowSource>> {
        let path = path.or_else(|| self.config.ingest.dataset_path.clone())?;
        let limit = limit.or(self.config.ingest.limit);
        Some(Arc::new(JsonlRowSource::new(path).with_limit(limit)))
    }
}

fn print_results(results: &[SearchResult]) {
    if results.is_empty() {
        println!("No results.");
        return;
    }
    for (i, r) in results.iter().enumerate() {
        match r.score {
            Some(score) => println!(
                "{:>3}. [{}] {} ({:.1}%, score {:.4})",
                i + 1,
                r.id,
                r.title,
                r.similarity_percent,
                score
            ),
            None => println!(
                "{:>3}. [{}] {} ({:.1}%)",
                i + 1,
                r.id,
                r.title,
                r.similarity_percent
            ),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
