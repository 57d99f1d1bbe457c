use clap::Parser;
use namu_cli::{CliArgs, NamuApp};

#[tokio::main]
async fn main() {
    let args = CliArgs::parse();
    let result = match NamuApp::from_args(&args) {
        Ok(app) => app.run(args).await,
        Err(e) => Err(e),
    };
    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
