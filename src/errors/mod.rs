//! Centralized error handling for ticket-watch
//!
//! Every layer has its own error enum so callers can decide what is worth
//! retrying and what should surface to the requester.
//!
//! # Error Categories
//!
//! - **Repository Errors**: job store and station table access
//! - **Query Errors**: the remote availability endpoint (transport vs. remote)
//! - **Notify Errors**: digest rendering and mail delivery
//! - **Validation Errors**: malformed registration requests
//!
//! # Usage
//!
//! ```rust
//! use ticket_watch::errors::{AppError, AppResult};
//!
//! async fn example_function() -> AppResult<String> {
//!     Ok("accepted".to_string())
//! }
//! ```

pub mod types;

pub use types::*;

/// Convenience type alias for Results using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Convenience type alias for Repository Results
pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Convenience type alias for availability query Results
pub type QueryResult<T> = Result<T, QueryError>;

/// Convenience type alias for notification Results
pub type NotifyResult<T> = Result<T, NotifyError>;
