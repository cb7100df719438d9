// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! JSON-RPC 2.0 request and response envelopes.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::RpcError;

/// Protocol version sent in every request.
pub const JSONRPC_VERSION: &str = "2.0";

/// Outgoing JSON-RPC request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcRequest {
    pub jsonrpc: String,
    pub id: u64,
    pub method: String,
    pub params: Value,
}

impl RpcRequest {
    pub fn new(id: u64, method: impl Into<String>, params: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            method: method.into(),
            params,
        }
    }
}

/// Error object carried by a failed response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcErrorObject {
    pub code: i64,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// Incoming JSON-RPC response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcResponse {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default, deserialize_with = "present")]
    pub result: Option<Value>,
    #[serde(default)]
    pub error: Option<RpcErrorObject>,
}

impl RpcResponse {
    /// Unwrap the envelope of the response to request `expected_id`.
    ///
    /// An error object wins over everything else, because servers may answer
    /// malformed requests with a null id.
    pub fn into_result(self, expected_id: u64) -> Result<Value, RpcError> {
        if let Some(err) = self.error {
            return Err(RpcError::Remote {
                code: err.code,
                message: err.message,
                data: err.data,
            });
        }

        if let Some(actual) = self.id
            && actual != expected_id
        {
            return Err(RpcError::IdMismatch {
                expected: expected_id,
                actual,
            });
        }

        // `"result": null` is a legitimate answer for void methods.
        match self.result {
            Some(value) => Ok(value),
            None => Err(RpcError::MissingResult),
        }
    }
}

/// Keep an explicit `null` as `Some(Value::Null)`; only an absent key is `None`.
fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}
