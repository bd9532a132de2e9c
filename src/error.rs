//! Error types for the photo booth core
//!
//! Only precondition violations of the invoking operation are returned
//! synchronously (`BoothError`). Gateway outcomes (`GatewayError`) are
//! recorded on the session state and never returned from `capture` or
//! `assemble`.

use thiserror::Error;

/// Synchronous rejections of an orchestrator operation.
///
/// None of these leave the session modified.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BoothError {
    /// Capture attempted in custom mode while the prompt text is blank
    #[error("custom prompt is empty; enter a prompt before capturing")]
    EmptyInstruction,

    /// Assembly needs at least two transformed photos
    #[error("need at least 2 ready photos to assemble, have {ready}")]
    InsufficientReadyPhotos { ready: usize },

    /// A previous assembly has not resolved yet
    #[error("an assembly is already in progress")]
    AssemblyAlreadyInProgress,

    /// Mode id is neither a catalog entry nor one of the synthetic modes
    #[error("unknown mode: {0}")]
    UnknownMode(String),
}

/// Failures reported by a transformation or assembly gateway.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("request failed: {0}")]
    Request(String),

    #[error("service returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("timed out after {0}s")]
    Timeout(u64),

    #[error("response did not contain an image")]
    NoImage,

    #[error("no frames to assemble")]
    NoFrames,

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("task join error: {0}")]
    Join(String),

    #[error("no API key configured (set GEMINI_API_KEY or gemini.api_key)")]
    MissingApiKey,
}

impl GatewayError {
    /// Whether a repeated attempt could plausibly succeed.
    ///
    /// Client errors other than 408 and 429 will not resolve with retries.
    pub fn is_retryable(&self) -> bool {
        match self {
            GatewayError::Status { status, .. } => {
                !(400..500).contains(status) || *status == 408 || *status == 429
            }
            GatewayError::Request(_) | GatewayError::Timeout(_) | GatewayError::NoImage => true,
            GatewayError::Image(_)
            | GatewayError::NoFrames
            | GatewayError::Join(_)
            | GatewayError::MissingApiKey => false,
        }
    }
}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => GatewayError::Status {
                status: status.as_u16(),
                message: err.to_string(),
            },
            None => GatewayError::Request(err.to_string()),
        }
    }
}

/// Errors loading the configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Validation(String),
}

/// Errors from a capture source.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("no more frames available")]
    Exhausted,

    #[error("failed to load frame from {path}: {source}")]
    Load {
        path: String,
        #[source]
        source: image::ImageError,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_errors_are_not_retryable() {
        let bad_request = GatewayError::Status {
            status: 400,
            message: "bad".into(),
        };
        assert!(!bad_request.is_retryable());

        let rate_limited = GatewayError::Status {
            status: 429,
            message: "slow down".into(),
        };
        assert!(rate_limited.is_retryable());

        let server = GatewayError::Status {
            status: 503,
            message: "unavailable".into(),
        };
        assert!(server.is_retryable());
    }

    #[test]
    fn test_transient_failures_are_retryable() {
        assert!(GatewayError::Timeout(5).is_retryable());
        assert!(GatewayError::NoImage.is_retryable());
        assert!(!GatewayError::MissingApiKey.is_retryable());
    }

    #[test]
    fn test_insufficient_message_includes_count() {
        let err = BoothError::InsufficientReadyPhotos { ready: 1 };
        assert!(err.to_string().contains("have 1"));
    }
}
