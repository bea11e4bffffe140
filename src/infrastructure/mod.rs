//! Infrastructure layer providing external service integrations.
//!
//! This module contains the HTTP gateway to the archive backend,
//! configuration loading, CSV export and clipboard access.

pub mod http;
pub mod config;
pub mod export;
pub mod clipboard;

pub use http::*;
pub use config::*;
pub use export::*;
