//! php-symbols language server entry point.
//!
//! Starts the LSP server on stdio using tower-lsp-server.

use php_symbols_server::PhpSymbolsBackend;
use tower_lsp::{LspService, Server};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    // Logs go to stderr so they don't interfere with stdio LSP transport
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    tracing::info!("Starting php-symbols server");

    let stdin = tokio::io::stdin();
    let stdout = tokio::io::stdout();

    let (service, socket) = LspService::new(PhpSymbolsBackend::new);

    Server::new(stdin, stdout, socket).serve(service).await;
}
