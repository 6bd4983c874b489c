//! Error types for the asset expiration service

use uuid::Uuid;

/// Errors surfaced by the expiration checker and its collaborators
#[derive(Debug, thiserror::Error)]
pub enum ExpiryError {
    /// A required named query could not be resolved, or service
    /// configuration is invalid. Fatal at startup.
    #[error("Configuration error: {message}")]
    Configuration {
        message: String,
        /// Named query or configuration key the error refers to, if any
        key: Option<String>,
    },

    /// A selection query failed during a run. The run is aborted and the
    /// transaction rolled back.
    #[error("Query '{query}' failed: {message}")]
    Query { query: String, message: String },

    /// Acquiring, committing, or rolling back the run's transaction failed.
    #[error("Transaction error: {0}")]
    Transaction(String),

    /// A selected asset failed the predicate its query is supposed to
    /// encode. Always a defect in the query layer or the data.
    #[error("Invariant violation in query '{query}': asset {asset_id} {detail}")]
    InvariantViolation {
        query: String,
        asset_id: Uuid,
        detail: String,
    },

    /// `run()` was called before `validate()` succeeded.
    #[error("Checker not validated: call validate() before run()")]
    NotValidated,
}

impl ExpiryError {
    /// Configuration error without an associated key
    pub fn configuration(message: impl Into<String>) -> Self {
        ExpiryError::Configuration {
            message: message.into(),
            key: None,
        }
    }

    /// Configuration error tied to a named query or env key
    pub fn configuration_for(key: impl Into<String>, message: impl Into<String>) -> Self {
        ExpiryError::Configuration {
            message: message.into(),
            key: Some(key.into()),
        }
    }

    /// Query execution error for a named query
    pub fn query(query: impl Into<String>, message: impl Into<String>) -> Self {
        ExpiryError::Query {
            query: query.into(),
            message: message.into(),
        }
    }

    /// True for errors that indicate a data or query-layer defect rather
    /// than an environmental failure
    pub fn is_defect(&self) -> bool {
        matches!(self, ExpiryError::InvariantViolation { .. })
    }
}
