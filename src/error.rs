//! Error types for the chat transport.

pub const GENERIC_ERROR_TEXT: &str = "Đã xảy ra lỗi. Vui lòng thử lại!";
pub const BAD_REQUEST_TEXT: &str = "Dữ liệu không hợp lệ. Vui lòng kiểm tra lại!";
pub const SERVER_ERROR_TEXT: &str = "Lỗi máy chủ. Vui lòng thử lại sau!";

/// A failed round trip to the chat endpoint. Every variant is retryable.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("network error: {0}")]
    Network(String),
    #[error("request timed out")]
    Timeout,
    #[error("Request failed with status code {status}")]
    Status { status: u16, detail: Option<String> },
    #[error("malformed reply: {0}")]
    Malformed(String),
}

impl TransportError {
    pub fn is_status(&self) -> bool {
        matches!(self, Self::Status { .. })
    }

    /// Text of the bot message shown once all attempts have failed.
    pub fn user_message(&self) -> String {
        match self {
            Self::Status { status: 400, .. } => BAD_REQUEST_TEXT.to_string(),
            Self::Status { status: 500, .. } => SERVER_ERROR_TEXT.to_string(),
            Self::Status {
                detail: Some(detail),
                ..
            } if !detail.is_empty() => detail.clone(),
            Self::Status { .. } => self.to_string(),
            Self::Network(_) | Self::Timeout | Self::Malformed(_) => {
                GENERIC_ERROR_TEXT.to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(status: u16, detail: Option<&str>) -> TransportError {
        TransportError::Status {
            status,
            detail: detail.map(str::to_string),
        }
    }

    #[test]
    fn test_status_specific_messages() {
        assert_eq!(status(400, None).user_message(), BAD_REQUEST_TEXT);
        assert_eq!(status(500, Some("boom")).user_message(), SERVER_ERROR_TEXT);
    }

    #[test]
    fn test_other_status_prefers_server_detail() {
        assert_eq!(status(429, Some("Too many requests")).user_message(), "Too many requests");
        assert_eq!(
            status(404, None).user_message(),
            "Request failed with status code 404"
        );
        assert_eq!(
            status(503, Some("")).user_message(),
            "Request failed with status code 503"
        );
    }

    #[test]
    fn test_non_status_failures_are_generic() {
        assert_eq!(TransportError::Timeout.user_message(), GENERIC_ERROR_TEXT);
        assert_eq!(
            TransportError::Network("refused".into()).user_message(),
            GENERIC_ERROR_TEXT
        );
        assert_eq!(
            TransportError::Malformed("missing field".into()).user_message(),
            GENERIC_ERROR_TEXT
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(TransportError::Timeout.to_string(), "request timed out");
        assert!(status(502, None).is_status());
        assert!(!TransportError::Timeout.is_status());
    }
}
