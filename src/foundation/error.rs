/// Convenience alias used throughout the crate.
pub type ExrmixResult<T> = Result<T, ExrmixError>;

/// Error taxonomy for the whole compose pipeline.
///
/// Parse-time and pre-flight variants (`Syntax`, `Wildcard`,
/// `MissingInputs`) abort a run before any image is read. The remaining
/// variants are produced per patch while a batch is running.
#[derive(thiserror::Error, Debug)]
pub enum ExrmixError {
    #[error("syntax error: {0}")]
    Syntax(String),

    #[error("wildcard error: {0}")]
    Wildcard(String),

    #[error("missing input files:\n{}", .0.join("\n"))]
    MissingInputs(Vec<String>),

    #[error("shape mismatch: {0}")]
    ShapeMismatch(String),

    #[error("alpha mismatch: {0}")]
    AlphaMismatch(String),

    #[error("expression for '{0}' evaluates to a constant, not an image")]
    NonImageResult(String),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("read '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("write '{path}': {source}")]
    Write {
        path: String,
        #[source]
        source: anyhow::Error,
    },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ExrmixError {
    pub fn syntax(msg: impl Into<String>) -> Self {
        Self::Syntax(msg.into())
    }

    pub fn wildcard(msg: impl Into<String>) -> Self {
        Self::Wildcard(msg.into())
    }

    pub fn shape_mismatch(msg: impl Into<String>) -> Self {
        Self::ShapeMismatch(msg.into())
    }

    pub fn alpha_mismatch(msg: impl Into<String>) -> Self {
        Self::AlphaMismatch(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn read(path: impl Into<String>, source: impl Into<anyhow::Error>) -> Self {
        Self::Read {
            path: path.into(),
            source: source.into(),
        }
    }

    pub fn write(path: impl Into<String>, source: impl Into<anyhow::Error>) -> Self {
        Self::Write {
            path: path.into(),
            source: source.into(),
        }
    }
}
