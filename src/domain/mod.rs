pub mod models;
pub mod plate;
pub mod errors;

pub use models::*;
pub use plate::*;
pub use errors::*;
