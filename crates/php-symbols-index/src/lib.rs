//! Symbol index for php-symbols.
//!
//! Provides the global workspace symbol index and discovery/scanning of the
//! PHP files that feed it.

pub mod files;
pub mod workspace;
