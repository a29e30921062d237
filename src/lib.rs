pub mod config;
pub mod error;
pub mod handlers;
pub mod notify;
pub mod report;
pub mod router;
pub mod store;
pub mod types;

pub use error::ApiError;
