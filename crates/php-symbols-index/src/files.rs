//! PHP file discovery and scanning into the workspace index.

use crate::workspace::WorkspaceIndex;
use php_symbols_scanner::{scan_file, ScanError, ScanOptions};
use php_symbols_types::FileSymbols;
use std::path::{Path, PathBuf};

/// Directory names skipped during discovery unless configured otherwise.
pub const DEFAULT_EXCLUDE_DIRS: &[&str] = &["vendor", "node_modules"];

/// Outcome of indexing a batch of files.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IndexSummary {
    pub files: usize,
    pub symbols: usize,
    pub failed: usize,
    /// Scanned files whose symbols were not stored.
    pub skipped: usize,
}

/// Collect all .php files under `root`, sorted by path.
///
/// Hidden directories and directories whose name is in `exclude` are skipped.
pub fn collect_php_files<S: AsRef<str>>(root: &Path, exclude: &[S]) -> Vec<PathBuf> {
    let mut files = Vec::new();
    if root.is_dir() {
        collect_php_files_recursive(root, exclude, &mut files);
    } else if is_php_file(root) {
        files.push(root.to_path_buf());
    }
    files.sort();
    files
}

fn collect_php_files_recursive<S: AsRef<str>>(dir: &Path, exclude: &[S], files: &mut Vec<PathBuf>) {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!("Failed to read directory {}: {}", dir.display(), e);
            return;
        }
    };

    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            let name = entry.file_name();
            let name_str = name.to_string_lossy();
            if name_str.starts_with('.') || exclude.iter().any(|e| e.as_ref() == name_str) {
                continue;
            }
            collect_php_files_recursive(&path, exclude, files);
        } else if is_php_file(&path) {
            files.push(path);
        }
    }
}

fn is_php_file(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some("php")
}

/// Scan one file from disk and store its symbols under its file URI.
///
/// Returns the number of symbols found.
pub fn index_file(
    index: &WorkspaceIndex,
    path: &Path,
    options: &ScanOptions,
) -> Result<usize, ScanError> {
    let report = scan_file(path, options)?;
    let count = report.symbols.len();
    index.update_file(&path_to_uri(path), FileSymbols::new(report.symbols));
    Ok(count)
}

/// Scan every file in `files` and hand its symbols to `store` with the file URI.
///
/// Failures are logged and counted; they never stop the batch. `store`
/// returns false when it declined the symbols; those files are counted as
/// skipped. The decision is taken after the scan, so a caller can check
/// state that changed while the file was being read.
pub fn index_files_with<F>(files: &[PathBuf], options: &ScanOptions, mut store: F) -> IndexSummary
where
    F: FnMut(&str, FileSymbols) -> bool,
{
    let mut summary = IndexSummary::default();
    for path in files {
        let report = match scan_file(path, options) {
            Ok(report) => report,
            Err(e) => {
                summary.failed += 1;
                tracing::warn!("Failed to scan {}: {}", path.display(), e);
                continue;
            }
        };
        let count = report.symbols.len();
        if store(&path_to_uri(path), FileSymbols::new(report.symbols)) {
            summary.files += 1;
            summary.symbols += count;
            if count > 0 {
                tracing::debug!("Indexed {}: {} symbols", path.display(), count);
            }
        } else {
            summary.skipped += 1;
            tracing::debug!("Skipped {}", path.display());
        }
    }
    summary
}

/// Convert a file:// URI to a filesystem path.
pub fn uri_to_path(uri: &str) -> Option<PathBuf> {
    uri.strip_prefix("file://").map(PathBuf::from)
}

/// Convert a file path to a file:// URI.
pub fn path_to_uri(path: &Path) -> String {
    format!("file://{}", path.display())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(name);
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(dir.join("src/Http")).unwrap();
        std::fs::create_dir_all(dir.join("vendor/acme")).unwrap();
        std::fs::create_dir_all(dir.join(".cache")).unwrap();
        std::fs::create_dir_all(dir.join("build")).unwrap();

        std::fs::write(
            dir.join("src/Http/Kernel.php"),
            "<?php\nclass Kernel\n{\n    public function handle() {}\n}\n",
        )
        .unwrap();
        std::fs::write(dir.join("src/helpers.php"), "<?php\nfunction app() {}\n").unwrap();
        std::fs::write(dir.join("src/README.md"), "function notPhp() {}\n").unwrap();
        std::fs::write(dir.join("vendor/acme/Lib.php"), "<?php class Lib {}\n").unwrap();
        std::fs::write(dir.join(".cache/Cached.php"), "<?php class Cached {}\n").unwrap();
        std::fs::write(dir.join("build/Out.php"), "<?php class Out {}\n").unwrap();
        dir
    }

    #[test]
    fn test_collect_skips_hidden_and_excluded() {
        let dir = fixture_dir("php-symbols-test-collect");

        let files = collect_php_files(&dir, DEFAULT_EXCLUDE_DIRS);
        let names: Vec<String> = files
            .iter()
            .map(|p| p.strip_prefix(&dir).unwrap().display().to_string())
            .collect();
        assert_eq!(names, vec!["build/Out.php", "src/Http/Kernel.php", "src/helpers.php"]);

        let files = collect_php_files(&dir, &["build".to_string(), "vendor".to_string()]);
        assert_eq!(files.len(), 2);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_collect_missing_root() {
        let dir = std::env::temp_dir().join("php-symbols-test-no-such-root");
        assert!(collect_php_files(&dir, DEFAULT_EXCLUDE_DIRS).is_empty());
    }

    #[test]
    fn test_index_files_with() {
        let dir = fixture_dir("php-symbols-test-index-files");
        let index = WorkspaceIndex::new();

        let mut files = collect_php_files(&dir, DEFAULT_EXCLUDE_DIRS);
        files.push(dir.join("src/Deleted.php"));

        let summary = index_files_with(&files, &ScanOptions::default(), |uri, symbols| {
            index.update_file(uri, symbols);
            true
        });
        assert_eq!(
            summary,
            IndexSummary {
                files: 3,
                symbols: 4,
                failed: 1,
                skipped: 0,
            }
        );
        assert_eq!(index.file_count(), 3);

        let kernel_uri = path_to_uri(&dir.join("src/Http/Kernel.php"));
        let kernel = index.get(&kernel_uri).unwrap();
        assert_eq!(kernel.symbols[0].name, "Kernel");
        assert_eq!(kernel.symbols[1].name, "handle");
        assert_eq!(index.search("app")[0].symbol.line, 2);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_index_files_with_declined_store() {
        let dir = fixture_dir("php-symbols-test-index-files-with");
        let index = WorkspaceIndex::new();
        let files = collect_php_files(&dir, DEFAULT_EXCLUDE_DIRS);
        let kernel_uri = path_to_uri(&dir.join("src/Http/Kernel.php"));

        // An open buffer already owns the kernel entry
        index.update_file(&kernel_uri, FileSymbols::default());

        let summary = index_files_with(&files, &ScanOptions::default(), |uri, symbols| {
            if uri == kernel_uri {
                return false;
            }
            index.update_file(uri, symbols);
            true
        });
        assert_eq!(
            summary,
            IndexSummary {
                files: 2,
                symbols: 2,
                failed: 0,
                skipped: 1,
            }
        );
        assert!(index.get(&kernel_uri).unwrap().symbols.is_empty());
        assert!(index.search("Kernel").is_empty());
        assert_eq!(index.search("app").len(), 1);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_uri_to_path_and_back() {
        let path = PathBuf::from("/home/user/project/src/Foo.php");
        let uri = path_to_uri(&path);
        assert_eq!(uri, "file:///home/user/project/src/Foo.php");
        assert_eq!(uri_to_path(&uri), Some(path));
        assert_eq!(uri_to_path("untitled:Untitled-1"), None);
    }
}
