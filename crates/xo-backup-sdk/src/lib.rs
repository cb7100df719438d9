// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Xen Orchestra Backup SDK
//!
//! High-level SDK for managing backup jobs on a Xen Orchestra server.
//!
//! The server accepts mutating calls before it applies them. This crate pairs
//! each command with a bounded wait for its effect, so a returned [`Backup`]
//! always reflects the change that was asked for.
//!
//! # Architecture
//!
//! ```text
//! BackupClient ── typed request ──► RpcTransport (xo-rpc)
//!      │
//!      └─ StateWaiter ── RefreshSource (one get_backup per poll)
//!                    └── Condition (power state, addresses, generation)
//! ```
//!
//! # Example
//!
//! ```no_run
//! use xo_backup_sdk::{AddressRequirement, BackupClient, CreateBackupOptions, SdkConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = BackupClient::new(SdkConfig::new("https://xoa.example.com").with_token("token"))?;
//!
//! let options = CreateBackupOptions::new("nightly", "full")
//!     .with_vm("id", "vm-uuid")
//!     .with_remote("id", "remote-uuid")
//!     .with_address("0", AddressRequirement::Any);
//! let backup = client.create_backup(options).await?;
//! println!("Created backup {} ({})", backup.id, backup.power_state);
//! # Ok(())
//! # }
//! ```

mod client;
mod config;
mod error;
mod lookup;
mod refresh;
pub mod request;
mod types;
pub mod waiter;

pub use client::BackupClient;
pub use config::SdkConfig;
pub use error::{Result, SdkError};
pub use lookup::{decode_snapshot, select_all, select_one};
pub use refresh::{AddressRefresh, GenerationRefresh, PowerStateRefresh};
pub use request::{RpcMethod, Tristate};
pub use types::{
    AddressFamily, AddressRequirement, Backup, BackupFilter, BackupKind, CreateBackupOptions,
    DeleteBackupOptions, DesiredAddresses, MatchStrategy, PowerState, SweepReport,
    UpdateBackupOptions,
};
pub use waiter::{
    AddressCondition, Condition, Evaluation, GenerationAdvanced, PowerStateCondition,
    RefreshSource, StateWaiter, WaitConfig, WaitOutcome,
};
