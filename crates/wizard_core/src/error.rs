use std::time::Duration;

use thiserror::Error;

/// Failure of one portfolio-service call. Never touches the draft.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("portfolio service unreachable at {endpoint}: {source}")]
    Transport {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{endpoint} timed out after {}s", timeout.as_secs())]
    Timeout { endpoint: String, timeout: Duration },
    #[error("{endpoint} returned HTTP {status}{}", message.as_deref().map(|m| format!(": {m}")).unwrap_or_default())]
    Status {
        endpoint: String,
        status: u16,
        message: Option<String>,
    },
    #[error("invalid response from {endpoint}: {reason}")]
    InvalidResponse { endpoint: String, reason: String },
    #[error("file type not allowed: {filename:?} (expected png, jpg, jpeg or gif)")]
    UnsupportedImage { filename: String },
    #[error("portfolio service worker unavailable: {0}")]
    Unavailable(String),
}

impl ServiceError {
    pub fn status(endpoint: impl Into<String>, status: u16, message: Option<String>) -> Self {
        Self::Status {
            endpoint: endpoint.into(),
            status,
            message,
        }
    }

    /// Whether retrying the same request later could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            ServiceError::Transport { .. }
            | ServiceError::Timeout { .. }
            | ServiceError::Unavailable(_) => true,
            ServiceError::Status { status, .. } => *status >= 500,
            ServiceError::InvalidResponse { .. } | ServiceError::UnsupportedImage { .. } => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_message_is_included_when_present() {
        let err = ServiceError::status("/api/generate", 500, Some("template missing".into()));
        assert_eq!(
            err.to_string(),
            "/api/generate returned HTTP 500: template missing"
        );
        assert!(err.is_transient());

        let err = ServiceError::status("/api/upload", 400, None);
        assert_eq!(err.to_string(), "/api/upload returned HTTP 400");
        assert!(!err.is_transient());
    }

    #[test]
    fn timeout_reports_whole_seconds() {
        let err = ServiceError::Timeout {
            endpoint: "/api/preview".into(),
            timeout: Duration::from_secs(30),
        };
        assert_eq!(err.to_string(), "/api/preview timed out after 30s");
        assert!(err.is_transient());
    }
}
