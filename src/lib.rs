//! Plate Archive - terminal client for license-plate archive requests.
//!
//! Operators submit archive requests, work the pending queue in order, and
//! approve, reject or roll back requests against the archive REST backend.

pub mod domain;
pub mod application;
pub mod infrastructure;
pub mod presentation;

pub use domain::*;
pub use application::*;
