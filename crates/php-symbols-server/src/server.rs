//! LSP server implementation: LanguageServer trait.

use crate::config::ServerConfig;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use php_symbols_index::files::{collect_php_files, index_file, index_files_with, path_to_uri, uri_to_path, IndexSummary};
use php_symbols_index::workspace::WorkspaceIndex;
use php_symbols_scanner::diagnostics::extract_scan_diagnostics;
use php_symbols_scanner::document::SourceDocument;
use php_symbols_scanner::{ScanOptions, ScanReport};
use php_symbols_types::{FileSymbols, SymbolRecord};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_lsp::jsonrpc::Result;
use tower_lsp::ls_types::*;
use tower_lsp::{Client, LanguageServer};

/// Files scanned per blocking task during workspace indexing.
const INDEX_BATCH_SIZE: usize = 25;

/// Main LSP backend holding all state.
pub struct PhpSymbolsBackend {
    /// Client handle for sending notifications to the editor.
    client: Client,
    /// Open documents (URI string → rope-backed text).
    open_files: Arc<DashMap<String, SourceDocument>>,
    /// Global workspace symbol index.
    index: Arc<WorkspaceIndex>,
    /// Workspace root path (set during initialize).
    workspace_root: Mutex<Option<PathBuf>>,
    /// Settings from initializationOptions.
    config: Mutex<ServerConfig>,
    /// Trace level from InitializeParams (off/messages/verbose).
    trace_level: Mutex<TraceValue>,
    /// Whether the client accepts window/workDoneProgress/create.
    work_done_progress: Mutex<bool>,
}

impl PhpSymbolsBackend {
    pub fn new(client: Client) -> Self {
        PhpSymbolsBackend {
            client,
            open_files: Arc::new(DashMap::new()),
            index: Arc::new(WorkspaceIndex::new()),
            workspace_root: Mutex::new(None),
            config: Mutex::new(ServerConfig::default()),
            trace_level: Mutex::new(TraceValue::Off),
            work_done_progress: Mutex::new(false),
        }
    }

    /// Log a message to the client if trace level is verbose.
    async fn log_trace(&self, message: &str) {
        let level = *self.trace_level.lock().await;
        if level == TraceValue::Verbose {
            tracing::trace!("{}", message);
            self.client.log_message(MessageType::LOG, message).await;
        }
    }

    async fn scan_options(&self) -> ScanOptions {
        self.config.lock().await.scan.clone()
    }

    /// Store a finished scan in the index and return its diagnostics.
    fn apply_scan(&self, uri_str: &str, doc: &SourceDocument, report: ScanReport) -> Vec<Diagnostic> {
        let diagnostics = compute_diagnostics(&report, doc);
        self.index
            .update_file(uri_str, FileSymbols::new(report.symbols));
        diagnostics
    }

    /// Replace the index entry for `uri_str` with a fresh scan of `path`.
    ///
    /// The entry is dropped when the file can no longer be read.
    async fn rescan_from_disk(&self, uri_str: &str, path: PathBuf) {
        let options = self.scan_options().await;
        match tokio::task::spawn_blocking({
            let index = self.index.clone();
            move || index_file(&index, &path, &options)
        })
        .await
        {
            Ok(Ok(count)) => {
                self.log_trace(&format!("Rescanned {} symbols from {}", count, uri_str))
                    .await;
            }
            Ok(Err(e)) => {
                tracing::warn!("Failed to rescan {}: {}", uri_str, e);
                self.index.remove_file(uri_str);
            }
            Err(e) => tracing::error!("Rescan task failed for {}: {}", uri_str, e),
        }
    }

    /// Publish diagnostics for a file, unless disabled in the config.
    async fn publish_diagnostics(&self, uri: Uri, diagnostics: Vec<Diagnostic>) {
        if !self.config.lock().await.diagnostics {
            return;
        }
        self.client
            .publish_diagnostics(uri, diagnostics, None)
            .await;
    }
}

/// Convert scan diagnostics to LSP warnings with UTF-16 columns.
fn compute_diagnostics(report: &ScanReport, doc: &SourceDocument) -> Vec<Diagnostic> {
    extract_scan_diagnostics(report)
        .into_iter()
        .map(|d| {
            let (start_line, start_col, end_line, end_col) = d.range;
            Diagnostic {
                range: Range {
                    start: Position::new(start_line, doc.utf16_column(start_line, start_col)),
                    end: Position::new(end_line, doc.utf16_column(end_line, end_col)),
                },
                severity: Some(DiagnosticSeverity::WARNING),
                source: Some("php-symbols".to_string()),
                message: d.message,
                ..Default::default()
            }
        })
        .collect()
}

fn to_range(r: (u32, u32, u32, u32)) -> Range {
    Range {
        start: Position::new(r.0, r.1),
        end: Position::new(r.2, r.3),
    }
}

#[allow(deprecated)] // SymbolInformation.deprecated field
fn symbol_information(
    symbol: &SymbolRecord,
    uri: Uri,
    range: (u32, u32, u32, u32),
) -> SymbolInformation {
    SymbolInformation {
        name: symbol.name.clone(),
        kind: symbol.kind.to_lsp_symbol_kind(),
        tags: None,
        deprecated: None,
        location: Location {
            uri,
            range: to_range(range),
        },
        container_name: None,
    }
}

/// Background workspace indexing.
///
/// Scans PHP files under the workspace root and adds their symbols to the
/// index. Files open in the editor, including ones opened while indexing
/// runs, are left to the open document.
async fn index_workspace(
    client: &Client,
    index: &Arc<WorkspaceIndex>,
    open_files: &Arc<DashMap<String, SourceDocument>>,
    root: &Path,
    config: &ServerConfig,
    progress_supported: bool,
) -> std::result::Result<IndexSummary, String> {
    let progress_token = ProgressToken::String("php-symbols-indexing".to_string());

    let progress_supported = progress_supported
        && client
            .create_work_done_progress(progress_token.clone())
            .await
            .is_ok();

    let ongoing = if progress_supported {
        let progress = client
            .progress(progress_token, "Indexing PHP symbols")
            .with_percentage(0)
            .with_message("Discovering files...");
        Some(progress.begin().await)
    } else {
        None
    };

    let discover_root = root.to_path_buf();
    let exclude = config.exclude_dirs.clone();
    let mut files = tokio::task::spawn_blocking(move || collect_php_files(&discover_root, &exclude))
        .await
        .map_err(|e| format!("File discovery failed: {}", e))?;
    files.retain(|path| !open_files.contains_key(&path_to_uri(path)));

    let total = files.len();
    tracing::info!("Indexing {} PHP files", total);

    if let Some(ref p) = ongoing {
        p.report_with_message(format!("Indexing {} files...", total), 0)
            .await;
    }

    let mut summary = IndexSummary::default();
    for batch in files.chunks(INDEX_BATCH_SIZE) {
        let batch_index = index.clone();
        let batch_files = batch.to_vec();
        let batch_open = open_files.clone();
        let options = config.scan.clone();
        let batch_summary = tokio::task::spawn_blocking(move || {
            // The entry guard blocks didOpen until the disk symbols are stored
            index_files_with(&batch_files, &options, |uri, symbols| {
                match batch_open.entry(uri.to_string()) {
                    Entry::Occupied(_) => false,
                    Entry::Vacant(_) => {
                        batch_index.update_file(uri, symbols);
                        true
                    }
                }
            })
        })
        .await
        .map_err(|e| format!("Indexing task failed: {}", e))?;

        summary.files += batch_summary.files;
        summary.symbols += batch_summary.symbols;
        summary.failed += batch_summary.failed;
        summary.skipped += batch_summary.skipped;

        if let Some(ref p) = ongoing {
            let done = summary.files + summary.failed + summary.skipped;
            let percentage = if total > 0 {
                ((done as f64 / total as f64) * 100.0) as u32
            } else {
                100
            };
            p.report_with_message(format!("Indexed {}/{} files", done, total), percentage)
                .await;
        }
    }

    if let Some(p) = ongoing {
        p.finish_with_message(format!("Indexed {} files", summary.files))
            .await;
    }

    client
        .log_message(
            MessageType::INFO,
            format!(
                "php-symbols: indexed {} symbols from {} PHP files",
                summary.symbols, summary.files
            ),
        )
        .await;

    tracing::info!(
        "Workspace indexing complete: {} files, {} symbols, {} failed, {} open",
        summary.files,
        summary.symbols,
        summary.failed,
        summary.skipped
    );

    Ok(summary)
}

impl LanguageServer for PhpSymbolsBackend {
    async fn initialize(&self, params: InitializeParams) -> Result<InitializeResult> {
        tracing::info!("php-symbols: initialize");

        if let Some(trace) = params.trace {
            *self.trace_level.lock().await = trace;
            tracing::info!("Trace level: {:?}", trace);
        }

        let progress = params
            .capabilities
            .window
            .as_ref()
            .and_then(|w| w.work_done_progress)
            .unwrap_or(false);
        *self.work_done_progress.lock().await = progress;

        #[allow(deprecated)]
        let root_path = params
            .workspace_folders
            .as_ref()
            .and_then(|folders| folders.first())
            .and_then(|folder| uri_to_path(folder.uri.as_str()))
            .or_else(|| {
                params
                    .root_uri
                    .as_ref()
                    .and_then(|uri| uri_to_path(uri.as_str()))
            })
            .or_else(|| params.root_path.as_ref().map(PathBuf::from));

        if let Some(ref root) = root_path {
            tracing::info!("Workspace root: {}", root.display());
            *self.workspace_root.lock().await = Some(root.clone());
        }

        let config = ServerConfig::from_initialization_options(params.initialization_options.as_ref());
        tracing::info!("Server config: {:?}", config);
        *self.config.lock().await = config;

        Ok(InitializeResult {
            capabilities: ServerCapabilities {
                text_document_sync: Some(TextDocumentSyncCapability::Options(
                    TextDocumentSyncOptions {
                        open_close: Some(true),
                        change: Some(TextDocumentSyncKind::INCREMENTAL),
                        save: Some(TextDocumentSyncSaveOptions::SaveOptions(SaveOptions {
                            include_text: Some(false),
                        })),
                        ..Default::default()
                    },
                )),
                document_symbol_provider: Some(OneOf::Left(true)),
                workspace_symbol_provider: Some(OneOf::Left(true)),
                ..Default::default()
            },
            server_info: Some(ServerInfo {
                name: "php-symbols".to_string(),
                version: Some(env!("CARGO_PKG_VERSION").to_string()),
            }),
            ..Default::default()
        })
    }

    async fn initialized(&self, _params: InitializedParams) {
        tracing::info!("php-symbols: initialized");
        self.client
            .log_message(MessageType::INFO, "php-symbols server initialized")
            .await;

        let config = self.config.lock().await.clone();
        if !config.index_workspace {
            tracing::info!("Workspace indexing disabled");
            return;
        }

        let workspace_root = self.workspace_root.lock().await.clone();
        if let Some(root) = workspace_root {
            let client = self.client.clone();
            let index = self.index.clone();
            let open_files = self.open_files.clone();
            let progress_supported = *self.work_done_progress.lock().await;
            tokio::spawn(async move {
                if let Err(e) = index_workspace(
                    &client,
                    &index,
                    &open_files,
                    &root,
                    &config,
                    progress_supported,
                )
                .await
                {
                    tracing::error!("Background indexing failed: {}", e);
                    client
                        .log_message(MessageType::ERROR, format!("Indexing failed: {}", e))
                        .await;
                }
            });
        } else {
            tracing::warn!("No workspace root, skipping indexing");
        }
    }

    async fn shutdown(&self) -> Result<()> {
        tracing::info!("php-symbols: shutdown");
        Ok(())
    }

    // --- Document Synchronization ---

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        let uri = params.text_document.uri;
        let uri_str = uri.as_str().to_string();

        tracing::debug!("didOpen: {}", uri_str);
        self.log_trace(&format!("didOpen: {}", uri_str)).await;

        let options = self.scan_options().await;
        let doc = SourceDocument::new(&params.text_document.text);
        let report = doc.scan(&options);
        let sym_count = report.symbols.len();
        let diagnostics = compute_diagnostics(&report, &doc);
        // Registered before the index write so workspace indexing skips this file
        self.open_files.insert(uri_str.clone(), doc);
        self.index
            .update_file(&uri_str, FileSymbols::new(report.symbols));

        self.log_trace(&format!("Indexed {} symbols from {}", sym_count, uri_str))
            .await;
        self.publish_diagnostics(uri, diagnostics).await;
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        let uri = params.text_document.uri;
        let uri_str = uri.as_str().to_string();

        tracing::debug!("didChange: {}", uri_str);

        let options = self.scan_options().await;
        let diagnostics = match self.open_files.get_mut(&uri_str) {
            Some(mut doc) => {
                for change in &params.content_changes {
                    if let Some(range) = change.range {
                        doc.apply_edit(
                            range.start.line,
                            range.start.character,
                            range.end.line,
                            range.end.character,
                            &change.text,
                        );
                    } else {
                        doc.replace(&change.text);
                    }
                }
                let report = doc.scan(&options);
                self.apply_scan(&uri_str, &doc, report)
            }
            None => {
                tracing::warn!("didChange for unopened document: {}", uri_str);
                return;
            }
        };

        self.publish_diagnostics(uri, diagnostics).await;
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        let uri = params.text_document.uri;
        let uri_str = uri.as_str().to_string();
        tracing::debug!("didClose: {}", uri_str);
        self.open_files.remove(&uri_str);

        // Unsaved edits are dropped; the index goes back to the file on disk
        match uri_to_path(&uri_str).filter(|path| path.is_file()) {
            Some(path) => self.rescan_from_disk(&uri_str, path).await,
            None => self.index.remove_file(&uri_str),
        }

        self.publish_diagnostics(uri, vec![]).await;
    }

    async fn did_save(&self, params: DidSaveTextDocumentParams) {
        let uri_str = params.text_document.uri.as_str().to_string();
        tracing::debug!("didSave: {}", uri_str);

        if self.open_files.contains_key(&uri_str) {
            return;
        }

        if let Some(path) = uri_to_path(&uri_str) {
            self.rescan_from_disk(&uri_str, path).await;
        }
    }

    // --- Symbols ---

    async fn document_symbol(
        &self,
        params: DocumentSymbolParams,
    ) -> Result<Option<DocumentSymbolResponse>> {
        let uri = params.text_document.uri;
        let uri_str = uri.as_str().to_string();
        let options = self.scan_options().await;

        // Try open files first, then fall back to index
        let symbols: Vec<SymbolInformation> = if let Some(doc) = self.open_files.get(&uri_str) {
            doc.scan(&options)
                .symbols
                .iter()
                .map(|sym| symbol_information(sym, uri.clone(), doc.symbol_range(sym)))
                .collect()
        } else if let Some(file_symbols) = self.index.get(&uri_str) {
            file_symbols
                .symbols
                .iter()
                .map(|sym| symbol_information(sym, uri.clone(), sym.selection_range()))
                .collect()
        } else {
            return Ok(None);
        };

        if symbols.is_empty() {
            Ok(None)
        } else {
            Ok(Some(DocumentSymbolResponse::Flat(symbols)))
        }
    }

    async fn symbol(
        &self,
        params: WorkspaceSymbolParams,
    ) -> Result<Option<WorkspaceSymbolResponse>> {
        let query = &params.query;

        // Empty query returns nothing (avoid overwhelming results)
        if query.is_empty() {
            return Ok(Some(WorkspaceSymbolResponse::Flat(vec![])));
        }

        let limit = self.config.lock().await.max_workspace_symbols;
        let symbols: Vec<SymbolInformation> = self
            .index
            .search(query)
            .into_iter()
            .take(limit)
            .filter_map(|hit| {
                let uri: Uri = hit.uri.parse().ok()?;
                let range = match self.open_files.get(&hit.uri) {
                    Some(doc) => doc.symbol_range(&hit.symbol),
                    None => hit.symbol.selection_range(),
                };
                Some(symbol_information(&hit.symbol, uri, range))
            })
            .collect();

        Ok(Some(WorkspaceSymbolResponse::Flat(symbols)))
    }
}
