//! Error types for the morgen bridge.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::client::RateLimit;

/// Why a request never completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportReason {
    Timeout,
    Connect,
    Other,
}

impl std::fmt::Display for TransportReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TransportReason::Timeout => "timeout",
            TransportReason::Connect => "connect",
            TransportReason::Other => "other",
        };
        f.write_str(s)
    }
}

/// Errors that can occur in morgen bridge operations.
#[derive(Error, Debug)]
pub enum MorgenError {
    #[error("Malformed ID: {0}")]
    MalformedId(String),

    #[error(
        "ID '{0}' not found. IDs do not survive a restart; call list_accounts, list_calendars, or list_events to get fresh IDs."
    )]
    UnknownVirtualId(String),

    #[error("API error (HTTP {status}): {message}")]
    Upstream {
        status: u16,
        message: String,
        rate_limit: Option<RateLimit>,
        retry_after: Option<u64>,
    },

    #[error("Request did not complete ({reason}): {message}")]
    Transport {
        reason: TransportReason,
        message: String,
    },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid response from Morgen: {0}")]
    InvalidResponse(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Stable, wire-visible classification of a [`MorgenError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    MalformedId,
    UnknownVirtualId,
    Upstream,
    Transport,
    Validation,
    InvalidResponse,
    Config,
    Serialization,
}

impl MorgenError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            MorgenError::MalformedId(_) => ErrorKind::MalformedId,
            MorgenError::UnknownVirtualId(_) => ErrorKind::UnknownVirtualId,
            MorgenError::Upstream { .. } => ErrorKind::Upstream,
            MorgenError::Transport { .. } => ErrorKind::Transport,
            MorgenError::Validation(_) => ErrorKind::Validation,
            MorgenError::InvalidResponse(_) => ErrorKind::InvalidResponse,
            MorgenError::Config(_) => ErrorKind::Config,
            MorgenError::Serialization(_) => ErrorKind::Serialization,
        }
    }

    /// HTTP status for upstream rejections, `None` for everything else.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            MorgenError::Upstream { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        MorgenError::Validation(msg.into())
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        MorgenError::Transport {
            reason: TransportReason::Timeout,
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for MorgenError {
    fn from(err: serde_json::Error) -> Self {
        MorgenError::Serialization(err.to_string())
    }
}

/// Result type alias for morgen bridge operations.
pub type MorgenResult<T> = Result<T, MorgenError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_virtual_id_message_tells_caller_to_relist() {
        let err = MorgenError::UnknownVirtualId("aB-9xZ_".into());
        let msg = err.to_string();
        assert!(msg.contains("aB-9xZ_"));
        assert!(msg.contains("list_events"));
        assert_eq!(err.kind(), ErrorKind::UnknownVirtualId);
    }

    #[test]
    fn test_upstream_and_transport_are_distinct_kinds() {
        let upstream = MorgenError::Upstream {
            status: 404,
            message: "not found".into(),
            rate_limit: None,
            retry_after: None,
        };
        let transport = MorgenError::Transport {
            reason: TransportReason::Connect,
            message: "connection refused".into(),
        };

        assert_eq!(upstream.kind(), ErrorKind::Upstream);
        assert_eq!(upstream.status_code(), Some(404));
        assert_eq!(transport.kind(), ErrorKind::Transport);
        assert_eq!(transport.status_code(), None);
    }
}
