//! Application layer managing workflow state and business operations.
//!
//! This module coordinates between the domain layer, the backend gateway and
//! the presentation layer.

pub mod gateway;
pub mod workflow;
pub mod debounce;
pub mod submission;
pub mod state;

#[cfg(test)]
pub(crate) mod testing;

pub use gateway::*;
pub use workflow::*;
pub use debounce::*;
pub use submission::*;
pub use state::*;
