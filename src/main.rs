use clap::Parser;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use chkeeper::cli::{run, Cli};

#[tokio::main]
async fn main() {
    // Init logging
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap();
    fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    let cli = Cli::parse();
    let rust_log = std::env::var("RUST_LOG").unwrap_or_else(|_| "<unset>".to_string());
    info!(target: "chkeeper", "chkeeper starting: RUST_LOG='{}'", rust_log);

    if let Err(err) = run(cli).await {
        eprintln!("error: {err}");
        std::process::exit(err.exit_code());
    }
}
