use thiserror::Error;

use crate::engine::error::EngineError;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SummationError {
    #[error("Expected {expected} values but got {found}")]
    ArityMismatch { expected: usize, found: usize },

    #[error("Index {index} is out of range for length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Unknown parameter: {0}")]
    UnknownParameter(String),

    #[error("Unsupported derivative order {0:?}: only a first derivative in a single argument is supported")]
    UnsupportedDerivativeOrder(Vec<usize>),

    #[error("Invalid configuration: {reason}")]
    InvalidConfiguration {
        reason: String,
        source: Option<EngineError>,
    },

    #[error(transparent)]
    Engine(#[from] EngineError),
}
