/// Why an evaluation run was aborted.
///
/// Items that fail to decode are not errors; the ingestion pipeline skips
/// them and counts them instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EvaluationError {
    /// Missing or invalid endpoint URL, or no usable definition. Raised before
    /// any request is sent.
    Configuration(String),
    /// Network failure, non-success status or an unreadable response body.
    Transport(String),
}

impl EvaluationError {
    pub fn is_configuration(&self) -> bool {
        matches!(self, EvaluationError::Configuration(_))
    }
}

impl std::fmt::Display for EvaluationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EvaluationError::Configuration(msg) => write!(f, "{msg}"),
            EvaluationError::Transport(msg) => write!(f, "evaluation failed: {msg}"),
        }
    }
}

impl std::error::Error for EvaluationError {}

/// Failure reported by a [`crate::Transport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportError {
    pub status: Option<u16>,
    pub message: String,
}

impl TransportError {
    pub fn network(message: impl Into<String>) -> Self {
        Self {
            status: None,
            message: message.into(),
        }
    }

    pub fn status(status: u16, body: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            message: body.into(),
        }
    }
}

impl std::fmt::Display for TransportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.status {
            Some(code) if self.message.trim().is_empty() => write!(f, "HTTP {code}"),
            Some(code) => write!(f, "HTTP {code}: {}", self.message.trim()),
            None => write!(f, "{}", self.message),
        }
    }
}

impl std::error::Error for TransportError {}

impl From<TransportError> for EvaluationError {
    fn from(err: TransportError) -> Self {
        EvaluationError::Transport(err.to_string())
    }
}
