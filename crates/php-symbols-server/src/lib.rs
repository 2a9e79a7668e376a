//! php-symbols language server library.
//!
//! Exposes the backend so the binary and the end-to-end tests share it.

pub mod config;
pub mod server;

pub use config::ServerConfig;
pub use server::PhpSymbolsBackend;
