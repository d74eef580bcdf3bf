use once_cell::sync::Lazy;
use regex::Regex;

static NOT_FOUND_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)not[ _]found|\b404\b").expect("static regex"));

/// Failures talking to a generation vendor or persisting what it returned.
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("operation expired or not found: {0}")]
    OperationNotFound(String),

    #[error("prediction {id} {status}: {detail}")]
    PredictionFailed {
        id: String,
        status: String,
        detail: String,
    },

    /// The operation finished with an error of its own, such as a safety block.
    #[error("operation failed: {0}")]
    OperationFailed(String),

    #[error("timed out waiting for prediction {0}")]
    Timeout(String),

    #[error("unexpected response: {0}")]
    Vendor(String),

    #[error(transparent)]
    Transport(#[from] reqwest::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("invalid base64 payload: {0}")]
    Decode(#[from] base64::DecodeError),
}

impl GenerationError {
    /// True when the vendor no longer knows the handle, so polling it again is pointless.
    pub fn is_expired(&self) -> bool {
        match self {
            GenerationError::OperationNotFound(_) => true,
            GenerationError::Http { status, body } => {
                *status == 404 || NOT_FOUND_RE.is_match(body)
            }
            GenerationError::Vendor(msg) => NOT_FOUND_RE.is_match(msg),
            _ => false,
        }
    }

    /// True when the operation is over and will never produce media.
    pub fn is_terminal(&self) -> bool {
        matches!(self, GenerationError::OperationFailed(_))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} is not configured; set it in the environment or in .env")]
    MissingKey(&'static str),

    #[error("{0} still holds the placeholder value; paste the real key into .env")]
    PlaceholderKey(&'static str),
}
