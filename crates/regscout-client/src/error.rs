use std::fmt;
use thiserror::Error;

/// Which defensive-block signature a response matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    /// CAPTCHA challenge markup.
    Captcha,
    /// Rate-limit page.
    RateLimit,
    /// Access-denied / blocked page.
    AccessDenied,
    /// WAF "Request Rejected" page or an implausibly short body.
    Rejected,
}

impl fmt::Display for BlockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Captcha => write!(f, "captcha"),
            Self::RateLimit => write!(f, "rate limit"),
            Self::AccessDenied => write!(f, "access denied"),
            Self::Rejected => write!(f, "request rejected"),
        }
    }
}

/// Errors raised by registry drivers.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Network-level failure (connect, timeout, TLS).
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The response matched a known defensive-block signature. Callers
    /// escalate the throttle and retry the unit after the cooldown.
    #[error("blocked by remote defense ({kind})")]
    Blocked {
        /// Matched signature.
        kind: BlockKind,
    },

    /// Unexpected HTTP status.
    #[error("unexpected HTTP status {status}")]
    HttpStatus {
        /// Status code returned.
        status: u16,
    },

    /// Response body did not have the expected structure.
    #[error("unexpected response: {0}")]
    InvalidResponse(String),
}

impl ClientError {
    /// Whether the error is transient (worth an immediate in-place retry
    /// with a fixed delay, without touching the frontier or checkpoint).
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Network(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            Self::HttpStatus { status } => *status >= 500,
            Self::Blocked { .. } | Self::InvalidResponse(_) => false,
        }
    }

    /// Whether the error is a defensive block (escalates the throttle).
    #[must_use]
    pub fn is_blocked(&self) -> bool {
        matches!(self, Self::Blocked { .. })
    }
}

/// Result type alias using `ClientError`.
pub type Result<T> = std::result::Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blocked_is_not_transient() {
        let err = ClientError::Blocked {
            kind: BlockKind::Captcha,
        };
        assert!(err.is_blocked());
        assert!(!err.is_transient());
    }

    #[test]
    fn test_server_errors_are_transient() {
        assert!(ClientError::HttpStatus { status: 503 }.is_transient());
        assert!(!ClientError::HttpStatus { status: 404 }.is_transient());
    }

    #[test]
    fn test_block_kind_display() {
        assert_eq!(BlockKind::Captcha.to_string(), "captcha");
        assert_eq!(BlockKind::Rejected.to_string(), "request rejected");
    }
}
