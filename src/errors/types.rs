//! Error type definitions for ticket-watch

use thiserror::Error;

use crate::job_scheduling::JobSchedulingError;

/// Top-level application error type
///
/// Handlers in the web layer map each variant onto an HTTP status code.
#[derive(Error, Debug)]
pub enum AppError {
    /// Database-related errors (SeaORM)
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// Repository layer errors
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),

    /// Remote availability query errors
    #[error("Query error: {0}")]
    Query(#[from] QueryError),

    /// Notification errors
    #[error("Notification error: {0}")]
    Notify(#[from] NotifyError),

    /// Validation errors
    #[error("Validation error: {message}")]
    Validation { message: String },

    /// Resource not found errors
    #[error("Not found: {resource} with id {id}")]
    NotFound { resource: String, id: String },

    /// Resource already exists
    #[error("Conflict: {resource} with id {id} already exists")]
    Conflict { resource: String, id: String },

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Generic internal errors
    #[error("Internal error: {message}")]
    Internal { message: String },
}

/// Repository layer specific errors
#[derive(Error, Debug)]
pub enum RepositoryError {
    /// Database errors from SeaORM
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// Data serialization/deserialization failures
    #[error("Serialization failed: {0}")]
    SerializationFailed(#[from] serde_json::Error),

    /// A stored column could not be converted back into its domain type
    #[error("Corrupt record in {table}: {message}")]
    CorruptRecord { table: String, message: String },

    /// Unique key already taken
    #[error("Duplicate key in {table}: {key}")]
    DuplicateKey { table: String, key: String },

    /// Record not found
    #[error("Record not found: {table} with {field} = {value}")]
    RecordNotFound {
        table: String,
        field: String,
        value: String,
    },
}

/// Errors raised while talking to the remote availability endpoint
#[derive(Error, Debug)]
pub enum QueryError {
    /// The request did not complete within the configured timeout
    #[error("Request to {url} timed out")]
    Timeout { url: String },

    /// Connection, TLS or body-read failure
    #[error("Transport error for {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The query URL could not be assembled
    #[error("Invalid query URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl QueryError {
    /// Transport failures are worth another attempt, everything else is not
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            QueryError::Transport { .. } | QueryError::Timeout { .. }
        )
    }
}

/// Notification specific errors
#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("SMTP error: {0}")]
    Smtp(String),

    #[error("Template error: {0}")]
    Template(#[from] minijinja::Error),

    #[error("Invalid address '{address}': {message}")]
    Address { address: String, message: String },

    #[error("Config error: {0}")]
    Config(String),
}

impl AppError {
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn not_found<R: Into<String>, I: Into<String>>(resource: R, id: I) -> Self {
        Self::NotFound {
            resource: resource.into(),
            id: id.into(),
        }
    }

    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

impl From<JobSchedulingError> for AppError {
    fn from(err: JobSchedulingError) -> Self {
        match err {
            JobSchedulingError::DuplicateJob { id } => AppError::Conflict {
                resource: "job".to_string(),
                id,
            },
            JobSchedulingError::JobNotFound { id } => AppError::not_found("job", id),
            JobSchedulingError::UnknownStation { name } => {
                AppError::validation(format!("unknown station '{name}'"))
            }
            JobSchedulingError::InvalidJob { reason } => AppError::validation(reason),
            JobSchedulingError::Repository(e) => AppError::Repository(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeouts_are_transient() {
        let err = QueryError::Timeout {
            url: "https://kyfw.12306.cn/otn/leftTicket/query".to_string(),
        };
        assert!(err.is_transient());
    }

    #[test]
    fn test_invalid_url_is_not_transient() {
        let err: QueryError = url::Url::parse("not a url").unwrap_err().into();
        assert!(!err.is_transient());
    }

    #[test]
    fn test_duplicate_job_maps_to_conflict() {
        let err: AppError = JobSchedulingError::DuplicateJob {
            id: "abc".to_string(),
        }
        .into();
        assert!(matches!(err, AppError::Conflict { ref id, .. } if id == "abc"));
    }

    #[test]
    fn test_unknown_station_maps_to_validation() {
        let err: AppError = JobSchedulingError::UnknownStation {
            name: "Atlantis".to_string(),
        }
        .into();
        assert!(matches!(err, AppError::Validation { .. }));
        assert!(err.to_string().contains("Atlantis"));
    }
}
