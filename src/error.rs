//! Error taxonomy for the digest pipeline.
//!
//! Each variant maps to one failure class with its own recovery policy:
//!
//! | Variant | Policy |
//! |---------|--------|
//! | [`DigestError::Configuration`] | Fatal, raised before any stage runs |
//! | [`DigestError::Transport`] | Network failure or timeout; swallowed by the harvest stage, propagated everywhere else |
//! | [`DigestError::Parse`] | Recovered locally by skipping the offending item |
//! | [`DigestError::Generation`] | Text generation failed after retries; aborts the run |
//! | [`DigestError::Stage`] | An unrecovered stage failure, wrapped with the stage name |

use std::fmt;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, DigestError>;

#[derive(Debug, Error)]
pub enum DigestError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("transport failure: {0}")]
    Transport(String),

    #[error("search backend returned status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("parse failure: {0}")]
    Parse(String),

    #[error("text generation failed: {0}")]
    Generation(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("run cancelled")]
    Cancelled,

    #[error("{stage} stage failed: {source}")]
    Stage {
        stage: Stage,
        #[source]
        source: Box<DigestError>,
    },
}

impl DigestError {
    /// Network, HTTP status and malformed-body failures from the search backend.
    pub fn is_transport(&self) -> bool {
        matches!(self, DigestError::Transport(_) | DigestError::Status { .. })
    }

    /// Wrap an unrecovered error with the stage it escaped from.
    ///
    /// Cancellation passes through unwrapped so callers can tell it apart
    /// from a genuine failure.
    pub fn in_stage(self, stage: Stage) -> Self {
        match self {
            DigestError::Cancelled | DigestError::Stage { .. } => self,
            other => DigestError::Stage {
                stage,
                source: Box::new(other),
            },
        }
    }
}

impl From<reqwest::Error> for DigestError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            DigestError::Transport(format!("request timed out: {err}"))
        } else {
            DigestError::Transport(err.to_string())
        }
    }
}

impl From<serde_yaml::Error> for DigestError {
    fn from(err: serde_yaml::Error) -> Self {
        DigestError::Configuration(err.to_string())
    }
}

/// The four stages of a run, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Harvest,
    Summarize,
    Verify,
    Compile,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Harvest => "harvest",
            Stage::Summarize => "summarize",
            Stage::Verify => "verify",
            Stage::Compile => "compile",
        };
        f.write_str(name)
    }
}
