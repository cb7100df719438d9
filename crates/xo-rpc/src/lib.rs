// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! xo-rpc - JSON-RPC communication layer for Xen Orchestra
//!
//! This crate provides the wire plumbing used by `xo-backup-sdk` to talk to a
//! Xen Orchestra server. It knows nothing about backups, power states or
//! waiting; it only moves a method name and a parameter object to the server
//! and brings back either a result value or a structured remote error.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                          xo-rpc                             │
//! ├─────────────────────────────────────────────────────────────┤
//! │  RpcTransport trait: call(method, params) -> Value          │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Envelope: JSON-RPC 2.0 request / response (serde_json)     │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Transport: HTTP POST (reqwest)                             │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```no_run
//! use xo_rpc::{HttpTransport, RpcTransport, TransportConfig};
//!
//! # async fn example() -> Result<(), xo_rpc::RpcError> {
//! let transport = HttpTransport::new(
//!     TransportConfig::new("https://xoa.example.com").with_token("secret-token"),
//! )?;
//!
//! let id = transport
//!     .call("backup.create", serde_json::json!({"name": "nightly", "mode": "full"}))
//!     .await?;
//! println!("created {}", id);
//! # Ok(())
//! # }
//! ```

mod envelope;
mod error;
mod transport;

pub use envelope::{JSONRPC_VERSION, RpcErrorObject, RpcRequest, RpcResponse};
pub use error::RpcError;
pub use transport::{HttpTransport, RpcTransport, TransportConfig};
