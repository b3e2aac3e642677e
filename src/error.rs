//! Error taxonomy for ring operations.
//!
//! Handlers return `ChordError` directly; the `IntoResponse` impl maps each class onto an
//! HTTP status so the calling node can tell a lookup failure from an unreachable peer.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::ring::Identifier;
use crate::rpc::protocol::ErrorResponse;

pub type Result<T, E = ChordError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum ChordError {
    /// Dial budget exhausted.
    #[error("node {addr} is unreachable")]
    Unreachable { addr: String },

    /// The peer answered, but with a failure status.
    #[error("node {addr} replied {status}: {message}")]
    Remote {
        addr: String,
        status: u16,
        message: String,
    },

    #[error("lookup of {target} failed after {hops} hops")]
    LookupFailed { target: Identifier, hops: u32 },

    /// Every entry of the successor list is unreachable.
    #[error("no live successor left in the successor list")]
    NoLiveSuccessor,

    #[error("predecessor is unknown")]
    NoPredecessor,

    #[error("node is not part of a ring")]
    NotInRing,

    #[error("node is already part of a ring")]
    AlreadyInRing,

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Transport(#[from] reqwest::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ChordError {
    /// Connectivity failures are worth retrying after a successor-list repair.
    pub fn is_connectivity(&self) -> bool {
        matches!(self, Self::Unreachable { .. } | Self::Transport(_))
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::LookupFailed { .. } | Self::NoLiveSuccessor => StatusCode::SERVICE_UNAVAILABLE,
            Self::Unreachable { .. } | Self::Remote { .. } | Self::Transport(_) => {
                StatusCode::BAD_GATEWAY
            }
            Self::NotInRing | Self::AlreadyInRing | Self::NoPredecessor => StatusCode::CONFLICT,
            Self::Config(_) | Self::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ChordError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::warn!("Request failed: {}", self);
        }
        (
            status,
            Json(ErrorResponse {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let lookup = ChordError::LookupFailed {
            target: Identifier::from(7),
            hops: 32,
        };
        assert_eq!(lookup.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(
            ChordError::Unreachable {
                addr: "127.0.0.1:1".to_string()
            }
            .status(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(ChordError::NotInRing.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_connectivity_classification() {
        assert!(
            ChordError::Unreachable {
                addr: "x".to_string()
            }
            .is_connectivity()
        );
        assert!(!ChordError::NoLiveSuccessor.is_connectivity());
        assert!(!ChordError::NoPredecessor.is_connectivity());
    }
}
