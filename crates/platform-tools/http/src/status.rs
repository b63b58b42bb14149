//! Upstream status classification and error mapping.

use platform_tools_core::ToolError;
use reqwest::StatusCode;
use std::fmt;

/// Upstream bodies are truncated to this many characters in errors.
pub const MAX_ERROR_BODY_CHARS: usize = 400;

/// Classification of upstream HTTP failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpKind {
    Unauthorized,
    Forbidden,
    NotFound,
    RateLimited,
    ClientError,
    ServerError,
    Timeout,
    Network,
    Unknown,
}

impl HttpKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unauthorized => "unauthorized",
            Self::Forbidden => "forbidden",
            Self::NotFound => "not_found",
            Self::RateLimited => "rate_limited",
            Self::ClientError => "client_error",
            Self::ServerError => "server_error",
            Self::Timeout => "timeout",
            Self::Network => "network",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for HttpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn classify_status(status: StatusCode) -> HttpKind {
    match status {
        StatusCode::UNAUTHORIZED => HttpKind::Unauthorized,
        StatusCode::FORBIDDEN => HttpKind::Forbidden,
        StatusCode::NOT_FOUND => HttpKind::NotFound,
        StatusCode::TOO_MANY_REQUESTS => HttpKind::RateLimited,
        s if s.is_client_error() => HttpKind::ClientError,
        s if s.is_server_error() => HttpKind::ServerError,
        _ => HttpKind::Unknown,
    }
}

/// Build a [`ToolError::Upstream`] from a non-success response body.
pub fn upstream_error(status: StatusCode, body: &[u8]) -> ToolError {
    let text = String::from_utf8_lossy(body);
    ToolError::Upstream {
        status: status.as_u16(),
        kind: classify_status(status).to_string(),
        body: text.chars().take(MAX_ERROR_BODY_CHARS).collect(),
    }
}

/// Map a transport failure (no response received) to a tool error.
pub fn transport_error(err: &reqwest::Error) -> ToolError {
    let kind = if err.is_timeout() {
        HttpKind::Timeout
    } else if err.is_connect() {
        HttpKind::Network
    } else {
        HttpKind::Unknown
    };
    ToolError::external(format!("{kind}: {err}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_known_statuses() {
        assert_eq!(classify_status(StatusCode::UNAUTHORIZED), HttpKind::Unauthorized);
        assert_eq!(classify_status(StatusCode::FORBIDDEN), HttpKind::Forbidden);
        assert_eq!(classify_status(StatusCode::NOT_FOUND), HttpKind::NotFound);
        assert_eq!(classify_status(StatusCode::TOO_MANY_REQUESTS), HttpKind::RateLimited);
        assert_eq!(classify_status(StatusCode::CONFLICT), HttpKind::ClientError);
        assert_eq!(classify_status(StatusCode::BAD_GATEWAY), HttpKind::ServerError);
    }

    #[test]
    fn success_is_unknown() {
        assert_eq!(classify_status(StatusCode::OK), HttpKind::Unknown);
    }

    #[test]
    fn upstream_body_is_capped() {
        let body = "x".repeat(1000);
        match upstream_error(StatusCode::INTERNAL_SERVER_ERROR, body.as_bytes()) {
            ToolError::Upstream { status, kind, body } => {
                assert_eq!(status, 500);
                assert_eq!(kind, "server_error");
                assert_eq!(body.len(), MAX_ERROR_BODY_CHARS);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn capping_respects_char_boundaries() {
        let body = "é".repeat(500);
        match upstream_error(StatusCode::BAD_REQUEST, body.as_bytes()) {
            ToolError::Upstream { body, .. } => assert_eq!(body.chars().count(), MAX_ERROR_BODY_CHARS),
            other => panic!("unexpected {other:?}"),
        }
    }
}
