// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Selecting backups out of an object snapshot.

use std::collections::BTreeMap;

use serde_json::Value;
use tracing::warn;

use crate::error::{Result, SdkError};
use crate::types::{Backup, BackupFilter, MatchStrategy};

/// Decode an `xo.getAllObjects` snapshot entry by entry.
///
/// Objects that do not decode as a backup are logged and left out; the rest
/// of the snapshot is still usable.
pub fn decode_snapshot(objects: BTreeMap<String, Value>) -> Vec<Backup> {
    objects
        .into_iter()
        .filter_map(|(key, object)| match serde_json::from_value::<Backup>(object) {
            Ok(backup) => Some(backup),
            Err(err) => {
                warn!(object_id = %key, error = %err, "Skipping undecodable backup object");
                None
            }
        })
        .collect()
}

/// The single backup `strategy` identifies.
pub fn select_one<I>(backups: I, strategy: &MatchStrategy) -> Result<Backup>
where
    I: IntoIterator<Item = Backup>,
{
    let mut matches: Vec<Backup> = backups
        .into_iter()
        .filter(|b| strategy.matches(b))
        .collect();

    match matches.len() {
        0 => Err(SdkError::BackupNotFound(strategy.to_string())),
        1 => Ok(matches.remove(0)),
        count => Err(SdkError::AmbiguousBackup {
            query: strategy.to_string(),
            count,
        }),
    }
}

/// Every backup `filter` accepts, ordered by name then id.
pub fn select_all<I>(backups: I, filter: &BackupFilter) -> Vec<Backup>
where
    I: IntoIterator<Item = Backup>,
{
    let mut selected: Vec<Backup> = backups.into_iter().filter(|b| filter.matches(b)).collect();
    selected.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
    selected
}
