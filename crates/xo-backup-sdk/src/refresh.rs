// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Refresh sources backed by a live client.
//!
//! Each refresh performs one fresh `get_backup` by id and projects out a
//! single attribute. Nothing is cached between calls.

use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::client::BackupClient;
use crate::error::Result;
use crate::types::{MatchStrategy, PowerState};
use crate::waiter::RefreshSource;

/// Reads the current power state.
pub struct PowerStateRefresh<'a> {
    client: &'a BackupClient,
}

impl<'a> PowerStateRefresh<'a> {
    pub fn new(client: &'a BackupClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl RefreshSource for PowerStateRefresh<'_> {
    type Value = PowerState;

    async fn refresh(&self, id: &str) -> Result<PowerState> {
        let backup = self.client.get_backup(MatchStrategy::by_id(id)).await?;
        Ok(backup.power_state)
    }
}

/// Reads the current per-interface address map.
pub struct AddressRefresh<'a> {
    client: &'a BackupClient,
}

impl<'a> AddressRefresh<'a> {
    pub fn new(client: &'a BackupClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl RefreshSource for AddressRefresh<'_> {
    type Value = BTreeMap<String, String>;

    async fn refresh(&self, id: &str) -> Result<BTreeMap<String, String>> {
        let backup = self.client.get_backup(MatchStrategy::by_id(id)).await?;
        Ok(backup.addresses)
    }
}

/// Reads the change counter, when the server exposes one.
pub struct GenerationRefresh<'a> {
    client: &'a BackupClient,
}

impl<'a> GenerationRefresh<'a> {
    pub fn new(client: &'a BackupClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl RefreshSource for GenerationRefresh<'_> {
    type Value = Option<u64>;

    async fn refresh(&self, id: &str) -> Result<Option<u64>> {
        let backup = self.client.get_backup(MatchStrategy::by_id(id)).await?;
        Ok(backup.generation)
    }
}
