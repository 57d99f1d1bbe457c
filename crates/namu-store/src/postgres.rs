//! PostgreSQL + pgvector retrieval store.
//!
//! Vector search uses pgvector's `<=>` cosine distance operator. Full-text
//! search ranks `ts_rank` matches and reports their position as a 1-based
//! rank. The unified hybrid query joins both candidate pools and scores them
//! with the SQL rendering of [`namu_core::scoring`].
//!
//! The full-text configuration is inlined into the SQL as a `regconfig`
//! literal, so it is restricted to plain identifiers.

use async_trait::async_trait;
use pgvector::Vector;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::{Postgres, QueryBuilder, Row};
use std::time::Duration;

use crate::config::DatabaseConfig;
use crate::store::{EMPTY_EXPLANATION, RetrievalStore};
use namu_core::scoring::{DEFAULT_RRF_K, fused_score_sql};
use namu_core::{Document, Error, FusedHit, FusionWeights, Result, TextHit, VectorHit};

/// Quotes Postgres identifiers, escaping embedded quotes.
pub fn quote_ident(input: &str) -> String {
    let escaped = input.replace('"', "\"\"");
    format!("\"{}\"", escaped)
}

fn quote_literal(input: &str) -> String {
    format!("'{}'", input.replace('\'', "''"))
}

fn store_err(context: &str) -> impl Fn(sqlx::Error) -> Error + '_ {
    move |e| Error::store(format!("{context}: {e}"))
}

// ============================================================================
// SQL rendering
// ============================================================================

/// Renders every statement the store runs.
///
/// Executable and display variants share one template; they differ only in
/// whether values are `$n` placeholders or inlined literals.
#[derive(Debug, Clone)]
struct PgSql {
    table: String,
    fulltext_config: String,
    rrf_k: u32,
    unified_candidates: usize,
}

impl PgSql {
    fn tsvector(&self) -> String {
        format!(
            "to_tsvector('{}'::regconfig, title || ' ' || content)",
            self.fulltext_config
        )
    }

    fn tsquery(&self, query: &str) -> String {
        format!("plainto_tsquery('{}'::regconfig, {query})", self.fulltext_config)
    }

    fn insert_prefix(&self) -> String {
        format!(
            "INSERT INTO {} (title, content, embedding, namespace, contributors) ",
            self.table
        )
    }

    fn count(&self) -> String {
        format!("SELECT COUNT(*) FROM {}", self.table)
    }

    fn vector(&self, embedding: &str, limit: usize) -> String {
        format!(
            "SELECT id, title, content, (embedding <=> {embedding}) AS dist\n\
             FROM {table}\n\
             WHERE embedding IS NOT NULL\n\
             ORDER BY embedding <=> {embedding}\n\
             LIMIT {limit}",
            table = self.table,
        )
    }

    fn full_text(&self, query: &str, limit: usize) -> String {
        format!(
            "SELECT id, title, content, ROW_NUMBER() OVER (ORDER BY r DESC, id) AS rank\n\
             FROM (\n\
             \x20   SELECT id, title, content, ts_rank({tsv}, {tsq}) AS r\n\
             \x20   FROM {table}\n\
             \x20   WHERE {tsv} @@ {tsq}\n\
             \x20   ORDER BY r DESC, id\n\
             \x20   LIMIT {limit}\n\
             ) matches\n\
             ORDER BY rank",
            tsv = self.tsvector(),
            tsq = self.tsquery(query),
            table = self.table,
        )
    }

    fn unified(
        &self,
        embedding: &str,
        query: &str,
        semantic: &str,
        keyword: &str,
        limit: usize,
    ) -> String {
        let score = fused_score_sql("f.dist", "f.rank::float8", self.rrf_k, semantic, keyword);
        format!(
            "WITH vector_pool AS (\n\
             \x20   SELECT id, (embedding <=> {embedding}) AS dist\n\
             \x20   FROM {table}\n\
             \x20   WHERE embedding IS NOT NULL\n\
             \x20   ORDER BY embedding <=> {embedding}\n\
             \x20   LIMIT {pool}\n\
             ),\n\
             text_pool AS (\n\
             \x20   SELECT id, ROW_NUMBER() OVER (ORDER BY ts_rank({tsv}, {tsq}) DESC, id) AS rank\n\
             \x20   FROM {table}\n\
             \x20   WHERE {tsv} @@ {tsq}\n\
             \x20   ORDER BY ts_rank({tsv}, {tsq}) DESC, id\n\
             \x20   LIMIT {pool}\n\
             ),\n\
             fused AS (\n\
             \x20   SELECT COALESCE(v.id, t.id) AS id, v.dist, t.rank\n\
             \x20   FROM vector_pool v\n\
             \x20   FULL OUTER JOIN text_pool t ON v.id = t.id\n\
             )\n\
             SELECT d.id, d.title, d.content, f.dist, {score} AS total_score\n\
             FROM fused f\n\
             JOIN {table} d ON d.id = f.id\n\
             ORDER BY total_score DESC, d.id\n\
             LIMIT {limit}",
            table = self.table,
            pool = self.unified_candidates,
            tsv = self.tsvector(),
            tsq = self.tsquery(query),
        )
    }
}

fn is_plain_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

// ============================================================================
// PgStore
// ============================================================================

/// Retrieval store backed by PostgreSQL with the pgvector extension.
pub struct PgStore {
    pool: PgPool,
    sql: PgSql,
}

impl PgStore {
    /// Connect a pool using `config`.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        if config.url.trim().is_empty() {
            return Err(Error::config("database url is not configured"));
        }
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_seconds))
            .connect(&config.url)
            .await
            .map_err(store_err("connect"))?;
        tracing::info!(table = %config.table, "connected to postgres");
        Ok(Self::from_pool(pool, &config.table))
    }

    /// Wrap an existing pool.
    pub fn from_pool(pool: PgPool, table: &str) -> Self {
        Self {
            pool,
            sql: PgSql {
                table: quote_ident(table),
                fulltext_config: "simple".to_string(),
                rrf_k: DEFAULT_RRF_K,
                unified_candidates: 60,
            },
        }
    }

    /// Set the text search configuration (e.g. `simple`, `english`).
    pub fn with_fulltext_config(mut self, config: &str) -> Result<Self> {
        if !is_plain_identifier(config) {
            return Err(Error::config(format!(
                "invalid full-text configuration name: {config:?}"
            )));
        }
        self.sql.fulltext_config = config.to_string();
        Ok(self)
    }

    /// Set the reciprocal-rank constant used by the unified query.
    pub fn with_rrf_k(mut self, k: u32) -> Self {
        self.sql.rrf_k = k;
        self
    }

    /// Set the per-signal candidate pool of the unified query.
    pub fn with_unified_candidates(mut self, candidates: usize) -> Self {
        self.sql.unified_candidates = candidates;
        self
    }

    async fn explain(&self, sql: &str, binds: ExplainBinds<'_>) -> Result<String> {
        let explain = format!("EXPLAIN (FORMAT JSON)\n{sql}");
        let mut query = sqlx::query_scalar::<_, serde_json::Value>(&explain);
        if let Some(embedding) = binds.embedding {
            query = query.bind(Vector::from(embedding.to_vec()));
        }
        if let Some(text) = binds.text {
            query = query.bind(text.to_string());
        }
        if let Some(weights) = binds.weights {
            query = query.bind(weights.semantic).bind(weights.keyword);
        }
        let plan = query
            .fetch_optional(&self.pool)
            .await
            .map_err(store_err("explain"))?;
        Ok(plan.map_or_else(|| EMPTY_EXPLANATION.to_string(), |v| v.to_string()))
    }
}

#[derive(Default)]
struct ExplainBinds<'a> {
    embedding: Option<&'a [f32]>,
    text: Option<&'a str>,
    weights: Option<FusionWeights>,
}

fn vector_hit(row: &PgRow) -> std::result::Result<VectorHit, sqlx::Error> {
    Ok(VectorHit {
        id: row.try_get("id")?,
        title: row.try_get::<Option<String>, _>("title")?.unwrap_or_default(),
        content: row.try_get::<Option<String>, _>("content")?.unwrap_or_default(),
        distance: row.try_get("dist")?,
    })
}

fn text_hit(row: &PgRow) -> std::result::Result<TextHit, sqlx::Error> {
    let rank: i64 = row.try_get("rank")?;
    Ok(TextHit {
        id: row.try_get("id")?,
        title: row.try_get::<Option<String>, _>("title")?.unwrap_or_default(),
        content: row.try_get::<Option<String>, _>("content")?.unwrap_or_default(),
        rank: u32::try_from(rank).unwrap_or(u32::MAX),
    })
}

fn fused_hit(row: &PgRow) -> std::result::Result<FusedHit, sqlx::Error> {
    Ok(FusedHit {
        id: row.try_get("id")?,
        title: row.try_get::<Option<String>, _>("title")?.unwrap_or_default(),
        content: row.try_get::<Option<String>, _>("content")?.unwrap_or_default(),
        total_score: row.try_get("total_score")?,
        distance: row.try_get("dist")?,
    })
}

#[async_trait]
impl RetrievalStore for PgStore {
    async fn insert_batch(&self, documents: &[Document]) -> Result<()> {
        if documents.is_empty() {
            return Ok(());
        }
        let mut builder = QueryBuilder::<Postgres>::new(self.sql.insert_prefix());
        builder.push_values(documents, |mut b, doc| {
            b.push_bind(doc.title.clone())
                .push_bind(doc.content.clone())
                .push_bind(Vector::from(doc.embedding.clone()))
                .push_bind(doc.namespace.clone())
                .push_bind(doc.contributors.clone());
        });
        builder
            .build()
            .execute(&self.pool)
            .await
            .map_err(store_err("insert batch"))?;
        tracing::debug!(count = documents.len(), "inserted documents");
        Ok(())
    }

    async fn count(&self) -> Result<u64> {
        let count: i64 = sqlx::query_scalar(&self.sql.count())
            .fetch_one(&self.pool)
            .await
            .map_err(store_err("count"))?;
        Ok(u64::try_from(count).unwrap_or(0))
    }

    async fn search_by_vector(&self, embedding: &[f32], limit: usize) -> Result<Vec<VectorHit>> {
        if embedding.is_empty() {
            return Ok(Vec::new());
        }
        let rows = sqlx::query(&self.sql.vector("$1", limit))
            .bind(Vector::from(embedding.to_vec()))
            .fetch_all(&self.pool)
            .await
            .map_err(store_err("vector search"))?;
        rows.iter()
            .map(vector_hit)
            .collect::<std::result::Result<_, _>>()
            .map_err(store_err("vector search row"))
    }

    async fn search_by_full_text(&self, query: &str, limit: usize) -> Result<Vec<TextHit>> {
        if query.trim().is_empty() {
            return Ok(Vec::new());
        }
        let rows = sqlx::query(&self.sql.full_text("$1", limit))
            .bind(query.to_string())
            .fetch_all(&self.pool)
            .await
            .map_err(store_err("full-text search"))?;
        rows.iter()
            .map(text_hit)
            .collect::<std::result::Result<_, _>>()
            .map_err(store_err("full-text search row"))
    }

    fn supports_unified_hybrid(&self) -> bool {
        true
    }

    async fn search_by_unified_hybrid(
        &self,
        embedding: &[f32],
        query: &str,
        limit: usize,
        weights: FusionWeights,
    ) -> Result<Vec<FusedHit>> {
        let sql = self.sql.unified("$1", "$2", "$3::float8", "$4::float8", limit);
        let rows = sqlx::query(&sql)
            .bind(Vector::from(embedding.to_vec()))
            .bind(query.to_string())
            .bind(weights.semantic)
            .bind(weights.keyword)
            .fetch_all(&self.pool)
            .await
            .map_err(store_err("unified hybrid search"))?;
        rows.iter()
            .map(fused_hit)
            .collect::<std::result::Result<_, _>>()
            .map_err(store_err("unified hybrid row"))
    }

    async fn explain_vector(&self, embedding: &[f32], limit: usize) -> Result<String> {
        if embedding.is_empty() {
            return Ok(EMPTY_EXPLANATION.to_string());
        }
        let binds = ExplainBinds {
            embedding: Some(embedding),
            ..ExplainBinds::default()
        };
        self.explain(&self.sql.vector("$1", limit), binds).await
    }

    async fn explain_full_text(&self, query: &str, limit: usize) -> Result<String> {
        if query.trim().is_empty() {
            return Ok(EMPTY_EXPLANATION.to_string());
        }
        let binds = ExplainBinds {
            text: Some(query),
            ..ExplainBinds::default()
        };
        self.explain(&self.sql.full_text("$1", limit), binds).await
    }

    async fn explain_unified_hybrid(
        &self,
        embedding: &[f32],
        query: &str,
        limit: usize,
        weights: FusionWeights,
    ) -> Result<String> {
        let sql = self.sql.unified("$1", "$2", "$3::float8", "$4::float8", limit);
        let binds = ExplainBinds {
            embedding: Some(embedding),
            text: Some(query),
            weights: Some(weights),
        };
        self.explain(&sql, binds).await
    }

    fn vector_sql(&self, limit: usize) -> String {
        self.sql.vector("$1", limit)
    }

    fn full_text_sql(&self, query: &str, limit: usize) -> String {
        self.sql.full_text(&quote_literal(query), limit)
    }

    fn unified_hybrid_sql(&self, query: &str, limit: usize, weights: FusionWeights) -> String {
        self.sql.unified(
            "$1",
            &quote_literal(query),
            &weights.semantic.to_string(),
            &weights.keyword.to_string(),
            limit,
        )
    }

    fn name(&self) -> &str {
        "postgres"
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn sql() -> PgSql {
        PgSql {
            table: quote_ident("namuwiki_doc"),
            fulltext_config: "simple".to_string(),
            rrf_k: 60,
            unified_candidates: 60,
        }
    }

    #[test]
    fn test_quote_ident() {
        assert_eq!(quote_ident("namuwiki_doc"), "\"namuwiki_doc\"");
        assert_eq!(quote_ident("we\"ird"), "\"we\"\"ird\"");
    }

    #[test]
    fn test_quote_literal() {
        assert_eq!(quote_literal("it's"), "'it''s'");
    }

    #[test]
    fn test_plain_identifier() {
        assert!(is_plain_identifier("simple"));
        assert!(is_plain_identifier("pg_catalog_english2"));
        assert!(!is_plain_identifier("simple'; drop"));
        assert!(!is_plain_identifier("2cool"));
        assert!(!is_plain_identifier(""));
    }

    #[test]
    fn test_vector_sql() {
        let text = sql().vector("$1", 50);
        assert!(text.contains("(embedding <=> $1) AS dist"));
        assert!(text.contains("FROM \"namuwiki_doc\""));
        assert!(text.contains("WHERE embedding IS NOT NULL"));
        assert!(text.ends_with("LIMIT 50"));
    }

    #[test]
    fn test_full_text_sql_ranks_by_position() {
        let text = sql().full_text("$1", 50);
        assert!(text.contains("ROW_NUMBER() OVER (ORDER BY r DESC, id) AS rank"));
        assert!(text.contains("plainto_tsquery('simple'::regconfig, $1)"));
        assert!(text.contains("@@"));
        assert!(text.contains("LIMIT 50"));
    }

    #[test]
    fn test_unified_sql_uses_shared_formula() {
        let text = sql().unified("$1", "$2", "$3::float8", "$4::float8", 10);
        let expected = fused_score_sql("f.dist", "f.rank::float8", 60, "$3::float8", "$4::float8");
        assert!(text.contains(&expected));
        assert!(text.contains("FULL OUTER JOIN text_pool"));
        assert_eq!(text.matches("LIMIT 60").count(), 2);
        assert!(text.ends_with("LIMIT 10"));
    }

    #[test]
    fn test_display_variants_inline_values() {
        let text = sql().full_text(&quote_literal("나무 위키"), 5);
        assert!(text.contains("plainto_tsquery('simple'::regconfig, '나무 위키')"));

        let unified = sql().unified("$1", &quote_literal("q"), "0.5", "0.5", 5);
        assert!(unified.contains("(0.5 * (2.0 - LEAST"));
    }
}
