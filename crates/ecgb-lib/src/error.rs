use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failures that abort a single pipeline run.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("invalid input: {0}")]
    Input(String),

    #[error("signal has {len} samples, wavelet decomposition needs at least {required}")]
    InsufficientLength { len: usize, required: usize },

    #[error("classifier failed: {0}")]
    Classifier(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, PipelineError>;

/// Non-fatal events raised while processing a recording.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Diagnostic {
    /// Annotation symbol outside the AAMI vocabulary; treated as missing truth.
    UnknownSymbol { sample: usize, symbol: char },
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Diagnostic::UnknownSymbol { sample, symbol } => {
                write!(f, "unknown annotation symbol {:?} at sample {}", symbol, sample)
            }
        }
    }
}
