//! Notary PDF server
//!
//! Binds the generation endpoint and health probe, serving until killed.

use anyhow::Result;
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::info;

use notary_pdf::api::{router, AppState};

/// Notary PDF - generate notarized documents over HTTP
#[derive(Parser)]
#[command(name = "notary-pdf")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Address to bind (falls back to $HOST, then 0.0.0.0)
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on (falls back to $PORT, then 8000)
    #[arg(short, long)]
    port: Option<u16>,

    /// Directory holding the layout template PDFs
    #[arg(long, default_value = "templates")]
    template_dir: PathBuf,

    /// Enable debug logging (RUST_LOG still takes precedence)
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "notary_pdf=debug,tower_http=debug"
    } else {
        "notary_pdf=info,tower_http=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter)),
        )
        .init();

    let host = cli
        .host
        .or_else(|| std::env::var("HOST").ok())
        .unwrap_or_else(|| "0.0.0.0".to_string());
    let port = cli
        .port
        .or_else(|| std::env::var("PORT").ok().and_then(|p| p.parse().ok()))
        .unwrap_or(8000);

    info!("Template directory: {}", cli.template_dir.display());
    let app = router(AppState {
        template_dir: cli.template_dir,
    });

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("Starting notary-pdf on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
