use thiserror::Error;

use crate::core::expression::CompileError;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum EngineError {
    #[error("Initialization failed: {0}")]
    Initialization(String),

    #[error("Expression failed to compile: {source}")]
    Compile {
        #[from]
        source: CompileError,
    },

    #[error("Rejected term parametrization: {0}")]
    Structural(String),

    #[error("Unknown parameter: {0}")]
    UnknownParameter(String),

    #[error("Evaluation failed: {0}")]
    Evaluation(String),
}
