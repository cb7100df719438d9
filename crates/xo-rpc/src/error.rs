// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Error types for the JSON-RPC transport.

use thiserror::Error;

/// Errors that can occur while performing a JSON-RPC call.
#[derive(Debug, Error)]
pub enum RpcError {
    /// The HTTP request could not be sent or the connection dropped.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-success HTTP status.
    #[error("unexpected HTTP status {status}: {body}")]
    Status { status: u16, body: String },

    /// The response body was not a valid JSON-RPC envelope.
    #[error("malformed response: {0}")]
    Decode(String),

    /// The server rejected the call.
    #[error("remote error [{code}]: {message}")]
    Remote {
        code: i64,
        message: String,
        data: Option<serde_json::Value>,
    },

    /// The envelope carried neither `result` nor `error`.
    #[error("response carried neither result nor error")]
    MissingResult,

    /// The response belongs to a different request.
    #[error("response id {actual} does not match request id {expected}")]
    IdMismatch { expected: u64, actual: u64 },

    /// The configured server URL cannot be used.
    #[error("invalid url: {0}")]
    InvalidUrl(String),

    /// Request parameters could not be encoded.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl RpcError {
    /// Whether retrying the same call later may succeed.
    ///
    /// Only connection-level failures and 5xx statuses qualify. A remote
    /// rejection is an answer, not an outage.
    pub fn is_transient(&self) -> bool {
        match self {
            RpcError::Http(_) => true,
            RpcError::Status { status, .. } => *status >= 500,
            _ => false,
        }
    }
}
