//! Error type for the grocery API client.
//!
//! # Design
//! The backend contract only distinguishes "a document came back" from "no
//! result". Every failure still carries its reason so callers and logs can
//! tell a refused connection from a 401, but nothing is interpreted beyond
//! that: an expired session, a bad password and a malformed cart mutation all
//! arrive as `Api` with whatever status the server chose.

use thiserror::Error;

/// Errors returned by `SessionClient` operations.
#[derive(Debug, Error)]
pub enum ClientError {
    /// No response was obtained (DNS, connect, TLS, timeout, body read).
    #[error("transport error: {0}")]
    Transport(String),

    /// A response was obtained but its status was outside 2xx.
    #[error("HTTP {status}: {body}")]
    Api { status: u16, body: String },

    /// The response body was not a JSON object, or a typed projection failed.
    #[error("deserialization failed: {0}")]
    Deserialization(String),

    /// A request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// The login succeeded but the profile carried no `sessionid` string.
    #[error("login response did not contain a session id")]
    MissingSessionToken,

    /// Client configuration was incomplete or invalid.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl ClientError {
    /// HTTP status of an `Api` error, if this is one.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// True when no response was obtained at all.
    pub fn is_transport(&self) -> bool {
        matches!(self, ClientError::Transport(_))
    }
}
