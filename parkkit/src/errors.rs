use thiserror::Error;

/// Failure of a single request against the parking/analytics backend.
///
/// Callers that poll treat every variant the same way (the fetch failed and
/// simulated data is shown), but the variant is kept for the activity log.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("HTTP status {code}")]
    HttpStatus { code: u16 },

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Not supported by backend: {0}")]
    Unsupported(&'static str),
}

impl FetchError {
    /// Short label used in the offline banner.
    pub fn kind(&self) -> &'static str {
        match self {
            FetchError::Network(_) => "network",
            FetchError::HttpStatus { .. } => "http-status",
            FetchError::Decode(_) => "decode",
            FetchError::Unsupported(_) => "unsupported",
        }
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(err: serde_json::Error) -> Self {
        FetchError::Decode(err.to_string())
    }
}
