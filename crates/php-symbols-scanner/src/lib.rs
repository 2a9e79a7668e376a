//! Streaming PHP declaration scanner for php-symbols.
//!
//! A character-level state machine that finds class, interface, trait and
//! function declarations without building a syntax tree. Input may arrive in
//! chunks of any size; results do not depend on where the chunks split.

pub mod diagnostics;
pub mod document;
pub mod error;
pub mod intent;
pub mod lookback;
pub mod options;
pub mod scanner;
pub mod state;
pub mod stream;

pub use error::ScanError;
pub use options::ScanOptions;
pub use scanner::{scan_str, ScanReport, Scanner};
pub use stream::{scan_async_reader, scan_file, scan_reader};
