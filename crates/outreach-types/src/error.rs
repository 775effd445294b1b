use thiserror::Error;

/// Errors returned by capability providers (extraction, contact lookup,
/// drafting, dispatch).
#[derive(Debug, Error)]
pub enum CapabilityError {
    #[error("capability '{capability}' unavailable: {message}")]
    Unavailable { capability: String, message: String },

    #[error("capability '{capability}' rejected the request: {message}")]
    Rejected { capability: String, message: String },

    #[error("capability '{capability}' returned an invalid response: {message}")]
    InvalidResponse { capability: String, message: String },
}

impl CapabilityError {
    /// The capability the error originated from.
    pub fn capability(&self) -> &str {
        match self {
            CapabilityError::Unavailable { capability, .. }
            | CapabilityError::Rejected { capability, .. }
            | CapabilityError::InvalidResponse { capability, .. } => capability,
        }
    }
}

/// Errors from repository operations (used by trait definitions in outreach-core).
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database connection error")]
    Connection,

    #[error("query error: {0}")]
    Query(String),

    #[error("entity not found")]
    NotFound,
}
