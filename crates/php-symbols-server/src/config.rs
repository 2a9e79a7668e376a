//! Server configuration read from the client's `initializationOptions`.

use php_symbols_index::files::DEFAULT_EXCLUDE_DIRS;
use php_symbols_scanner::ScanOptions;
use serde::{Deserialize, Serialize};

/// Default cap on `workspace/symbol` results.
pub const DEFAULT_MAX_WORKSPACE_SYMBOLS: usize = 200;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerConfig {
    /// Scanner options, given at the top level of `initializationOptions`.
    #[serde(flatten)]
    pub scan: ScanOptions,
    /// Scan all PHP files under the workspace root after `initialized`.
    pub index_workspace: bool,
    /// Publish scan diagnostics for open documents.
    pub diagnostics: bool,
    /// Directory names skipped while indexing.
    pub exclude_dirs: Vec<String>,
    /// Maximum number of `workspace/symbol` results.
    pub max_workspace_symbols: usize,
}

impl ServerConfig {
    /// Build the config from `initializationOptions`.
    ///
    /// Missing options take their defaults. Options that fail to deserialize
    /// are logged and replaced by the full default config.
    pub fn from_initialization_options(options: Option<&serde_json::Value>) -> Self {
        match options {
            None | Some(serde_json::Value::Null) => ServerConfig::default(),
            Some(value) => match serde_json::from_value(value.clone()) {
                Ok(config) => config,
                Err(e) => {
                    tracing::warn!("Invalid initializationOptions, using defaults: {}", e);
                    ServerConfig::default()
                }
            },
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            scan: ScanOptions::default(),
            index_workspace: true,
            diagnostics: true,
            exclude_dirs: DEFAULT_EXCLUDE_DIRS.iter().map(|d| d.to_string()).collect(),
            max_workspace_symbols: DEFAULT_MAX_WORKSPACE_SYMBOLS,
        }
    }
}
