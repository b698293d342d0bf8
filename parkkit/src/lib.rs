pub mod backoff;
pub mod config;
pub mod errors;
pub mod types;

pub use errors::FetchError;
