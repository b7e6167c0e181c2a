//! Fleet capability errors.

use thiserror::Error;

pub type FleetResult<T> = Result<T, FleetError>;

#[derive(Debug, Error)]
pub enum FleetError {
    /// The group could not be described.
    #[error("failed to describe group {group}: {message}")]
    Query { group: String, message: String },

    #[error("group {0} not found")]
    GroupNotFound(String),

    /// An enter/exit standby request was rejected.
    #[error("{operation} failed for group {group}: {message}")]
    Mutation {
        operation: &'static str,
        group: String,
        message: String,
    },

    #[error("{0} returned no activities")]
    MissingActivity(&'static str),

    #[error("failed to describe scaling activities: {0}")]
    Describe(String),
}
