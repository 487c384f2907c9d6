/// Convenience result alias used across the crate.
pub type HudResult<T> = Result<T, HudError>;

/// Error type for every pipeline phase.
///
/// Variants carry enough context (phase, chunk index, merge round) to reproduce a failure
/// without side-channel bookkeeping.
#[derive(thiserror::Error, Debug)]
pub enum HudError {
    /// Unusable job input: empty or unparseable telemetry, missing video.
    #[error("input error: {0}")]
    Input(String),

    /// Invalid parameter or configuration value.
    #[error("validation error: {0}")]
    Validation(String),

    /// Rendering of one chunk failed.
    #[error("render error in chunk {chunk}: {message}")]
    Render {
        /// Index of the failing chunk.
        chunk: usize,
        /// Failure description.
        message: String,
    },

    /// A batch concatenation failed during hierarchical merge.
    #[error("merge error in round {round}: {message}")]
    Merge {
        /// 1-based merge round.
        round: usize,
        /// Failure description.
        message: String,
    },

    /// External probe/encode/mux failure.
    #[error("encode error: {0}")]
    Encode(String),

    /// Work was aborted through a cancellation token or deadline.
    #[error("cancelled: {0}")]
    Cancelled(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl HudError {
    pub fn input(msg: impl Into<String>) -> Self {
        Self::Input(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn render(chunk: usize, msg: impl Into<String>) -> Self {
        Self::Render {
            chunk,
            message: msg.into(),
        }
    }

    pub fn merge(round: usize, msg: impl Into<String>) -> Self {
        Self::Merge {
            round,
            message: msg.into(),
        }
    }

    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }

    pub fn cancelled(msg: impl Into<String>) -> Self {
        Self::Cancelled(msg.into())
    }

    /// Pipeline phase the error belongs to.
    pub fn phase(&self) -> &'static str {
        match self {
            Self::Input(_) => "ingest",
            Self::Validation(_) => "validate",
            Self::Render { .. } => "render",
            Self::Merge { .. } => "merge",
            Self::Encode(_) => "encode",
            Self::Cancelled(_) => "cancel",
            Self::Other(_) => "other",
        }
    }

    /// Attach a chunk index to an error raised inside a chunk worker.
    ///
    /// Cancellation stays a cancellation so the scheduler can tell the root cause apart from
    /// chunks that merely stopped because another one failed.
    pub fn in_chunk(self, chunk: usize) -> Self {
        match self {
            Self::Render { .. } | Self::Cancelled(_) => self,
            other => Self::render(chunk, other.to_string()),
        }
    }

    /// Return `true` for [`HudError::Cancelled`].
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled(_))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
