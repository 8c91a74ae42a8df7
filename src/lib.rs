//! Pot logger library - serial sensor bridge, reading store, and HTTP API.
//!
//! This library exposes the core functionality of the `potlog` CLI for use
//! in tests and potentially other applications.
//!
//! # Modules
//!
//! - `device`: Serial instrument abstraction (real and mock)
//! - `bridge`: Poll loop forwarding instrument readings to the API
//! - `store`: SQLite reading store and its initializer
//! - `api`: HTTP routes over the store
//! - `config`: Settings with file and flag overrides
//! - `error`: Error types with user-recoverable hints
#![forbid(unsafe_code)]

pub mod api;
pub mod bridge;
pub mod cli;
pub mod config;
pub mod device;
pub mod error;
pub mod logging;
pub mod store;
