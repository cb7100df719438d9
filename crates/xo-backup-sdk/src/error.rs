// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Error types for xo-backup-sdk.

use std::time::Duration;

use thiserror::Error;
use xo_rpc::RpcError;

/// Result type using SdkError.
pub type Result<T> = std::result::Result<T, SdkError>;

/// Errors that can occur when using the backup SDK.
#[derive(Debug, Error)]
pub enum SdkError {
    /// Configuration error (missing or invalid values).
    #[error("configuration error: {0}")]
    Config(String),

    /// The server could not be reached or the connection dropped.
    #[error("connection error: {0}")]
    Connection(String),

    /// Server rejected the request.
    #[error("server error [{code}]: {message}")]
    Server { code: String, message: String },

    /// Unexpected response from server.
    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),

    /// No backup matched the lookup.
    #[error("backup not found: {0}")]
    BackupNotFound(String),

    /// More than one backup matched a lookup that expects exactly one.
    #[error("expected a single backup for {query}, found {count}")]
    AmbiguousBackup { query: String, count: usize },

    /// Invalid input.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// The wait deadline passed before the target condition was observed.
    #[error(
        "timed out after {elapsed:?} waiting for backup {id} (last observed: {})",
        .last_observed.as_deref().unwrap_or("nothing")
    )]
    WaitTimeout {
        id: String,
        elapsed: Duration,
        last_observed: Option<String>,
    },

    /// The backup reached a state it cannot leave on its own.
    #[error("backup {id} entered unexpected state {state}")]
    UnexpectedState { id: String, state: String },

    /// Refreshing failed more consecutive times than the retry budget allows.
    #[error("refresh failed {attempts} consecutive times: {source}")]
    RetryBudgetExhausted {
        attempts: u32,
        #[source]
        source: Box<SdkError>,
    },

    /// The wait was cancelled by the caller.
    #[error("operation cancelled")]
    Cancelled,
}

impl SdkError {
    /// Whether a refresh failing with this error should be retried.
    ///
    /// A freshly created backup may not be visible to the next read yet, and
    /// connection blips heal on their own. Everything else is final.
    pub fn is_retryable(&self) -> bool {
        matches!(self, SdkError::BackupNotFound(_) | SdkError::Connection(_))
    }

    /// Whether this error means "no such backup".
    pub fn is_not_found(&self) -> bool {
        matches!(self, SdkError::BackupNotFound(_))
    }
}

impl From<RpcError> for SdkError {
    fn from(err: RpcError) -> Self {
        match err {
            err if err.is_transient() => SdkError::Connection(err.to_string()),
            RpcError::Remote { code, message, .. } => SdkError::Server {
                code: code.to_string(),
                message,
            },
            RpcError::Status { status, body } => SdkError::Server {
                code: status.to_string(),
                message: body,
            },
            RpcError::InvalidUrl(msg) => SdkError::Config(msg),
            RpcError::Serialization(err) => SdkError::Serialization(err.to_string()),
            other => SdkError::UnexpectedResponse(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for SdkError {
    fn from(err: serde_json::Error) -> Self {
        SdkError::Serialization(err.to_string())
    }
}
