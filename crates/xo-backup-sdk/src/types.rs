// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! High-level types for the backup SDK.

use std::collections::BTreeMap;
use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;
use std::time::Duration;

use ipnet::IpNet;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::SdkError;

/// Power state of a backup job.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PowerState {
    /// The job runs on its schedule.
    Enabled,
    /// The job exists but does not run.
    Disabled,
    /// Anything the server reports that is neither of the above.
    #[default]
    Unknown,
}

impl PowerState {
    pub fn as_str(&self) -> &'static str {
        match self {
            PowerState::Enabled => "Enabled",
            PowerState::Disabled => "Disabled",
            PowerState::Unknown => "Unknown",
        }
    }
}

impl From<String> for PowerState {
    fn from(value: String) -> Self {
        match value.as_str() {
            "Enabled" => PowerState::Enabled,
            "Disabled" => PowerState::Disabled,
            _ => PowerState::Unknown,
        }
    }
}

impl From<PowerState> for String {
    fn from(state: PowerState) -> Self {
        state.as_str().to_string()
    }
}

impl fmt::Display for PowerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of backup job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BackupKind {
    /// Full or delta VM backup / replication.
    #[serde(rename = "VM")]
    Vm,
    /// Mirror of another backup repository.
    Mirror,
    /// Pool and XO metadata backup.
    Metadata,
    /// A job type this client does not know. Decoded only, never sent.
    #[serde(other)]
    Unknown,
}

/// A backup job as reported by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Backup {
    /// Server-assigned identity. Immutable once created.
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub mode: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<BackupKind>,
    /// VM selection pattern.
    #[serde(default, deserialize_with = "null_as_default")]
    pub vms: BTreeMap<String, String>,
    /// Target remotes.
    #[serde(default, deserialize_with = "null_as_default")]
    pub remotes: BTreeMap<String, String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub settings: BTreeMap<String, String>,
    #[serde(default)]
    pub resource_set: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub power_state: PowerState,
    /// Observed addresses keyed by `<slot>/<family>[/<index>]`.
    #[serde(default, deserialize_with = "null_as_default")]
    pub addresses: BTreeMap<String, String>,
    /// Counter the server bumps on every applied change, when it exposes one.
    #[serde(default)]
    pub generation: Option<u64>,
}

/// Servers report `null` for fields that are unset; treat that as absent.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// IP address family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressFamily {
    Ipv4,
    Ipv6,
}

impl AddressFamily {
    pub fn as_str(&self) -> &'static str {
        match self {
            AddressFamily::Ipv4 => "ipv4",
            AddressFamily::Ipv6 => "ipv6",
        }
    }

    pub fn of(addr: &IpAddr) -> Self {
        match addr {
            IpAddr::V4(_) => AddressFamily::Ipv4,
            IpAddr::V6(_) => AddressFamily::Ipv6,
        }
    }
}

impl FromStr for AddressFamily {
    type Err = SdkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ipv4" => Ok(AddressFamily::Ipv4),
            "ipv6" => Ok(AddressFamily::Ipv6),
            other => Err(SdkError::InvalidInput(format!(
                "unknown address family: {}",
                other
            ))),
        }
    }
}

/// What an interface slot must report before an address wait succeeds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddressRequirement {
    /// Any non-empty address.
    Any,
    /// A non-empty address of this family.
    Family(AddressFamily),
    /// An address inside this network.
    Cidr(IpNet),
}

impl AddressRequirement {
    /// Whether an observed `(family, value)` pair satisfies the requirement.
    ///
    /// `family` is the family named in the observed key, if it had one.
    pub fn accepts(&self, family: Option<AddressFamily>, value: &str) -> bool {
        if value.is_empty() {
            return false;
        }
        match self {
            AddressRequirement::Any => true,
            AddressRequirement::Family(wanted) => family == Some(*wanted),
            AddressRequirement::Cidr(net) => value
                .parse::<IpAddr>()
                .map(|addr| net.contains(&addr))
                .unwrap_or(false),
        }
    }
}

impl FromStr for AddressRequirement {
    type Err = SdkError;

    /// Parses `""`/`"any"`, `"ipv4"`/`"ipv6"`, or a CIDR like `10.0.0.0/24`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("any") {
            return Ok(AddressRequirement::Any);
        }
        if let Ok(family) = trimmed.parse::<AddressFamily>() {
            return Ok(AddressRequirement::Family(family));
        }
        trimmed
            .parse::<IpNet>()
            .map(AddressRequirement::Cidr)
            .map_err(|_| {
                SdkError::InvalidInput(format!("invalid address requirement: {}", trimmed))
            })
    }
}

impl fmt::Display for AddressRequirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AddressRequirement::Any => f.write_str("any"),
            AddressRequirement::Family(family) => f.write_str(family.as_str()),
            AddressRequirement::Cidr(net) => write!(f, "{}", net),
        }
    }
}

/// Interface slot (ordinal as string) to requirement.
pub type DesiredAddresses = BTreeMap<String, AddressRequirement>;

/// How a single backup is identified in a lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchStrategy {
    ById(String),
    ByName(String),
}

impl MatchStrategy {
    pub fn by_id(id: impl Into<String>) -> Self {
        MatchStrategy::ById(id.into())
    }

    pub fn by_name(name: impl Into<String>) -> Self {
        MatchStrategy::ByName(name.into())
    }

    /// Empty identifiers never match anything.
    pub fn matches(&self, backup: &Backup) -> bool {
        match self {
            MatchStrategy::ById(id) => !id.is_empty() && backup.id == *id,
            MatchStrategy::ByName(name) => !name.is_empty() && backup.name == *name,
        }
    }
}

impl fmt::Display for MatchStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchStrategy::ById(id) => write!(f, "id={}", id),
            MatchStrategy::ByName(name) => write!(f, "name={}", name),
        }
    }
}

/// Filter for listing backups. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BackupFilter {
    pub name: Option<String>,
    pub name_prefix: Option<String>,
    pub mode: Option<String>,
    pub kind: Option<BackupKind>,
    pub power_state: Option<PowerState>,
}

impl BackupFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.name_prefix = Some(prefix.into());
        self
    }

    pub fn with_mode(mut self, mode: impl Into<String>) -> Self {
        self.mode = Some(mode.into());
        self
    }

    pub fn with_kind(mut self, kind: BackupKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn with_power_state(mut self, state: PowerState) -> Self {
        self.power_state = Some(state);
        self
    }

    pub fn matches(&self, backup: &Backup) -> bool {
        self.name.as_ref().is_none_or(|n| backup.name == *n)
            && self
                .name_prefix
                .as_ref()
                .is_none_or(|p| backup.name.starts_with(p.as_str()))
            && self.mode.as_ref().is_none_or(|m| backup.mode == *m)
            && self.kind.is_none_or(|k| backup.kind == Some(k))
            && self.power_state.is_none_or(|s| backup.power_state == s)
    }
}

/// Options for creating a backup.
#[derive(Debug, Clone)]
pub struct CreateBackupOptions {
    pub name: String,
    pub mode: String,
    pub kind: Option<BackupKind>,
    pub vms: BTreeMap<String, String>,
    pub remotes: BTreeMap<String, String>,
    pub settings: BTreeMap<String, String>,
    /// Resource set id; empty means none.
    pub resource_set: Option<String>,
    /// Power state to wait for when no addresses are requested.
    pub power_state: PowerState,
    /// Interfaces that must report an address before creation completes.
    pub wait_for_addresses: DesiredAddresses,
    /// Overrides the configured wait timeout.
    pub timeout: Option<Duration>,
}

impl CreateBackupOptions {
    pub fn new(name: impl Into<String>, mode: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            mode: mode.into(),
            kind: None,
            vms: BTreeMap::new(),
            remotes: BTreeMap::new(),
            settings: BTreeMap::new(),
            resource_set: None,
            power_state: PowerState::Disabled,
            wait_for_addresses: DesiredAddresses::new(),
            timeout: None,
        }
    }

    pub fn with_kind(mut self, kind: BackupKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn with_vm(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.vms.insert(key.into(), value.into());
        self
    }

    pub fn with_remote(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.remotes.insert(key.into(), value.into());
        self
    }

    pub fn with_setting(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.settings.insert(key.into(), value.into());
        self
    }

    pub fn with_resource_set(mut self, id: impl Into<String>) -> Self {
        self.resource_set = Some(id.into());
        self
    }

    pub fn with_power_state(mut self, state: PowerState) -> Self {
        self.power_state = state;
        self
    }

    pub fn with_address(mut self, slot: impl Into<String>, requirement: AddressRequirement) -> Self {
        self.wait_for_addresses.insert(slot.into(), requirement);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Options for updating a backup. `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct UpdateBackupOptions {
    pub id: String,
    pub name: Option<String>,
    pub mode: Option<String>,
    pub kind: Option<BackupKind>,
    pub vms: Option<BTreeMap<String, String>>,
    pub remotes: Option<BTreeMap<String, String>>,
    pub settings: Option<BTreeMap<String, String>>,
    /// `Some("")` detaches the resource set, `Some(id)` attaches one.
    pub resource_set: Option<String>,
    pub power_state: Option<PowerState>,
    pub timeout: Option<Duration>,
}

impl UpdateBackupOptions {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_mode(mut self, mode: impl Into<String>) -> Self {
        self.mode = Some(mode.into());
        self
    }

    pub fn with_kind(mut self, kind: BackupKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn with_vms(mut self, vms: BTreeMap<String, String>) -> Self {
        self.vms = Some(vms);
        self
    }

    pub fn with_remotes(mut self, remotes: BTreeMap<String, String>) -> Self {
        self.remotes = Some(remotes);
        self
    }

    pub fn with_settings(mut self, settings: BTreeMap<String, String>) -> Self {
        self.settings = Some(settings);
        self
    }

    pub fn with_resource_set(mut self, id: impl Into<String>) -> Self {
        self.resource_set = Some(id.into());
        self
    }

    /// Detach whatever resource set the backup currently belongs to.
    pub fn without_resource_set(mut self) -> Self {
        self.resource_set = Some(String::new());
        self
    }

    pub fn with_power_state(mut self, state: PowerState) -> Self {
        self.power_state = Some(state);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Options for deleting a backup.
#[derive(Debug, Clone)]
pub struct DeleteBackupOptions {
    pub id: String,
    /// Clear the destroy block first. Failure to do so is logged, not fatal.
    pub unblock_destroy: bool,
}

impl DeleteBackupOptions {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            unblock_destroy: false,
        }
    }

    pub fn with_unblock_destroy(mut self, unblock: bool) -> Self {
        self.unblock_destroy = unblock;
        self
    }
}

/// Outcome of a prefix sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Ids that were deleted.
    pub deleted: Vec<String>,
    /// Ids that could not be deleted, with the reason.
    pub failed: Vec<(String, String)>,
}
