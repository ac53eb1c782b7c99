//! Domain records and the pure HR logic shared by the storage and HTTP layers.

pub mod document;
pub mod org;
pub mod time;
pub mod types;
pub mod validation;

pub use validation::ValidationError;
