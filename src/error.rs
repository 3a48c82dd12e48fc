use reqwest::StatusCode;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    #[error("could not reach {url}: {reason}")]
    Unreachable { url: String, reason: String },

    #[error("backend rejected request with {status}")]
    Rejected {
        status: StatusCode,
        detail: Option<String>,
    },

    #[error("malformed response from {url}: {reason}")]
    Malformed { url: String, reason: String },
}

impl ApiError {
    /// Server-provided reason, only present for rejected requests.
    pub fn detail(&self) -> Option<&str> {
        match self {
            ApiError::Rejected { detail, .. } => detail.as_deref(),
            _ => None,
        }
    }

    pub fn is_rejection(&self) -> bool {
        matches!(self, ApiError::Rejected { .. })
    }

    /// Banner text for this failure. Rejections surface the backend's `detail`,
    /// everything else gets the transport message.
    pub fn user_message(&self, rejected_fallback: &str, transport_message: &str) -> String {
        match self {
            ApiError::Rejected { detail, .. } => detail
                .as_deref()
                .map(str::trim)
                .filter(|d| !d.is_empty())
                .unwrap_or(rejected_fallback)
                .to_string(),
            ApiError::Unreachable { .. } | ApiError::Malformed { .. } => {
                transport_message.to_string()
            }
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value:?} ({reason})")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },

    #[error("invalid api url {0:?}")]
    InvalidUrl(String),

    #[error("could not build http client: {0}")]
    HttpClient(String),
}
