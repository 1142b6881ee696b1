//! ChapterSmith shell entry point.

use std::error::Error;
use std::sync::Arc;

use chaptersmith_cli::clipboard::SystemClipboard;
use chaptersmith_cli::config::Config;
use chaptersmith_cli::shell::Shell;
use chaptersmith_http::HttpBackend;
use chaptersmith_workspace::application::workspace::Workspace;
use tokio::io::BufReader;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // Logs go to stderr so they stay out of the shell's output.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .json()
        .with_writer(std::io::stderr)
        .init();

    // Read configuration from environment.
    let config = Config::from_env()?;
    tracing::info!(
        backend_url = %config.backend_url,
        timeout = ?config.timeout,
        "starting ChapterSmith shell"
    );

    let backend = Arc::new(HttpBackend::new(&config.backend_url, config.timeout)?);
    let clipboard = Arc::new(SystemClipboard::new(config.clipboard));
    let workspace = Arc::new(Workspace::new(backend, clipboard));

    let mut shell = Shell::new(
        workspace,
        BufReader::new(tokio::io::stdin()),
        std::io::stdout(),
    );
    shell.run().await?;

    Ok(())
}
