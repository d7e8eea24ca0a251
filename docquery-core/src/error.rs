//! Error types and result types for query execution and result consumption.
//!
//! Every fallible operation in this crate returns [`DocQueryResult<T>`]. Errors raised by a backend
//! are forwarded unchanged; the only translation performed by this layer is turning "no document"
//! into [`DocQueryError::NotFound`] when a single result is consumed.

use bson::error::Error as BsonError;
use thiserror::Error;

/// Represents all possible errors that can occur when building, executing or consuming a query.
#[derive(Error, Debug)]
pub enum DocQueryError {
    /// A single-document lookup executed successfully but matched no document.
    ///
    /// This is the only error a caller should treat as "absence is expected".
    #[error("result not found")]
    NotFound,
    /// The backend failed to run the compiled operation (network, server-side, malformed document).
    #[error("Execution error: {0}")]
    Execution(String),
    /// A matched document could not be converted into the caller's target type.
    #[error("Decode error: {0}")]
    Decode(String),
    /// An operand or a saved document could not be serialized into BSON.
    #[error("Serialization error: {0}")]
    Serialization(String),
    /// An update terminal was invoked without any queued update operations.
    #[error("Invalid update: {0}")]
    InvalidUpdate(String),
    /// Error during backend initialization or connection setup.
    #[error("Initialization error: {0}")]
    Initialization(String),
}

impl DocQueryError {
    /// Returns `true` if this error is [`DocQueryError::NotFound`].
    pub fn is_not_found(&self) -> bool {
        matches!(self, DocQueryError::NotFound)
    }
}

/// A specialized `Result` type for query operations.
pub type DocQueryResult<T> = Result<T, DocQueryError>;

impl From<BsonError> for DocQueryError {
    fn from(err: BsonError) -> Self {
        DocQueryError::Serialization(err.to_string())
    }
}
