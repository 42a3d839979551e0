//! Domain error types.

/// Top-level error type for statarb.
#[derive(Debug, thiserror::Error)]
pub enum StatArbError {
    #[error("insufficient data for {what}: have {have} observations, need {need}")]
    InsufficientData {
        what: String,
        have: usize,
        need: usize,
    },

    #[error("invalid cluster size {size}: expected between {min} and {max} series")]
    InvalidClusterSize { size: usize, min: usize, max: usize },

    #[error("statistical test failed: {reason}")]
    StatisticalTestFailure { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("data error: {reason}")]
    Data { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl StatArbError {
    pub(crate) fn insufficient(what: impl Into<String>, have: usize, need: usize) -> Self {
        StatArbError::InsufficientData {
            what: what.into(),
            have,
            need,
        }
    }

    pub(crate) fn test_failure(reason: impl Into<String>) -> Self {
        StatArbError::StatisticalTestFailure {
            reason: reason.into(),
        }
    }

    /// True for failures that are absorbed into a zero-confidence result
    /// rather than surfaced to the caller.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, StatArbError::StatisticalTestFailure { .. })
    }
}

impl From<&StatArbError> for std::process::ExitCode {
    fn from(err: &StatArbError) -> Self {
        let code: u8 = match err {
            StatArbError::Io(_) => 1,
            StatArbError::ConfigParse { .. }
            | StatArbError::ConfigMissing { .. }
            | StatArbError::ConfigInvalid { .. } => 2,
            StatArbError::Data { .. } => 3,
            StatArbError::StatisticalTestFailure { .. } => 4,
            StatArbError::InsufficientData { .. } | StatArbError::InvalidClusterSize { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
