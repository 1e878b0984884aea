pub mod config;
pub mod error;
pub mod history;
pub mod interview;
pub mod persona;
pub mod secret;
pub mod service;
pub mod session;

// Re-export common error type
pub use error::{MockmateError, Result};
