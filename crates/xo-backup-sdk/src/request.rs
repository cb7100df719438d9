// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Typed request parameters, one struct per remote method.
//!
//! Each parameter struct names its method and reply type through
//! [`RpcMethod`], so the client can only send a method with the parameters
//! that belong to it.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::{Serialize, Serializer};

use crate::types::{BackupKind, CreateBackupOptions, PowerState, UpdateBackupOptions};

/// Object type the lookup filters on.
pub(crate) const BACKUP_OBJECT_TYPE: &str = "backup";

/// A remote method together with its parameter and reply shapes.
pub trait RpcMethod: Serialize {
    const METHOD: &'static str;
    type Response: DeserializeOwned;
}

/// A field that can be left out, cleared, or set.
///
/// `Absent` is skipped entirely (use with
/// `#[serde(skip_serializing_if = "Tristate::is_absent")]`), `Null` is sent as
/// JSON `null` and `Value(v)` is sent as `v` itself.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Tristate<T> {
    #[default]
    Absent,
    Null,
    Value(T),
}

impl<T> Tristate<T> {
    pub fn is_absent(&self) -> bool {
        matches!(self, Tristate::Absent)
    }
}

impl Tristate<String> {
    /// `""` clears the field, anything else sets it.
    pub fn from_id(id: impl Into<String>) -> Self {
        let id = id.into();
        if id.is_empty() {
            Tristate::Null
        } else {
            Tristate::Value(id)
        }
    }

    /// `None` leaves the field alone; `Some` goes through [`Tristate::from_id`].
    pub fn from_optional_id(id: Option<String>) -> Self {
        id.map(Self::from_id).unwrap_or(Tristate::Absent)
    }
}

impl<T: Serialize> Serialize for Tristate<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Tristate::Value(value) => value.serialize(serializer),
            Tristate::Absent | Tristate::Null => serializer.serialize_none(),
        }
    }
}

/// `backup.create`; replies with the new backup id.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBackupParams {
    pub name: String,
    pub mode: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<BackupKind>,
    pub enabled: bool,
    pub vms: BTreeMap<String, String>,
    pub remotes: BTreeMap<String, String>,
    pub settings: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Tristate::is_absent")]
    pub resource_set: Tristate<String>,
}

impl RpcMethod for CreateBackupParams {
    const METHOD: &'static str = "backup.create";
    type Response = String;
}

impl From<&CreateBackupOptions> for CreateBackupParams {
    fn from(options: &CreateBackupOptions) -> Self {
        Self {
            name: options.name.clone(),
            mode: options.mode.clone(),
            kind: options.kind,
            enabled: options.power_state == PowerState::Enabled,
            vms: options.vms.clone(),
            remotes: options.remotes.clone(),
            settings: options.settings.clone(),
            // Nothing to detach on a new backup, so an empty id means "omit".
            resource_set: match &options.resource_set {
                Some(id) if !id.is_empty() => Tristate::Value(id.clone()),
                _ => Tristate::Absent,
            },
        }
    }
}

/// `backup.set`; replies `true` once the change is accepted.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SetBackupParams {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<BackupKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vms: Option<BTreeMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remotes: Option<BTreeMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub settings: Option<BTreeMap<String, String>>,
    #[serde(skip_serializing_if = "Tristate::is_absent")]
    pub resource_set: Tristate<String>,
}

impl RpcMethod for SetBackupParams {
    const METHOD: &'static str = "backup.set";
    type Response = bool;
}

impl From<&UpdateBackupOptions> for SetBackupParams {
    fn from(options: &UpdateBackupOptions) -> Self {
        Self {
            id: options.id.clone(),
            name: options.name.clone(),
            mode: options.mode.clone(),
            kind: options.kind,
            enabled: options.power_state.map(|s| s == PowerState::Enabled),
            vms: options.vms.clone(),
            remotes: options.remotes.clone(),
            settings: options.settings.clone(),
            resource_set: Tristate::from_optional_id(options.resource_set.clone()),
        }
    }
}

/// Operations a backup can be protected against.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BlockedOperations {
    pub destroy: Tristate<String>,
}

/// `backup.set` that lifts the destroy block.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnblockDestroyParams {
    pub id: String,
    pub blocked_operations: BlockedOperations,
}

impl UnblockDestroyParams {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            blocked_operations: BlockedOperations {
                destroy: Tristate::Null,
            },
        }
    }
}

impl RpcMethod for UnblockDestroyParams {
    const METHOD: &'static str = "backup.set";
    type Response = bool;
}

/// `backup.delete`.
#[derive(Debug, Clone, Serialize)]
pub struct DeleteBackupParams {
    pub id: String,
}

impl RpcMethod for DeleteBackupParams {
    const METHOD: &'static str = "backup.delete";
    // Older servers reply with an object, newer ones with `true`.
    type Response = serde_json::Value;
}

/// Type filter for `xo.getAllObjects`.
#[derive(Debug, Clone, Serialize)]
pub struct ObjectFilter {
    #[serde(rename = "type")]
    pub object_type: &'static str,
}

/// `xo.getAllObjects`; replies with every matching object keyed by id.
///
/// Entries stay raw JSON so one malformed object cannot spoil the snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct GetAllObjectsParams {
    pub filter: ObjectFilter,
}

impl GetAllObjectsParams {
    pub fn backups() -> Self {
        Self {
            filter: ObjectFilter {
                object_type: BACKUP_OBJECT_TYPE,
            },
        }
    }
}

impl RpcMethod for GetAllObjectsParams {
    const METHOD: &'static str = "xo.getAllObjects";
    type Response = BTreeMap<String, serde_json::Value>;
}
