// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! BackupClient for managing Xen Orchestra backup jobs.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use xo_rpc::{HttpTransport, RpcTransport};

use crate::config::SdkConfig;
use crate::error::{Result, SdkError};
use crate::lookup::{decode_snapshot, select_all, select_one};
use crate::refresh::{AddressRefresh, GenerationRefresh, PowerStateRefresh};
use crate::request::{
    CreateBackupParams, DeleteBackupParams, GetAllObjectsParams, RpcMethod, SetBackupParams,
    UnblockDestroyParams,
};
use crate::types::{
    Backup, BackupFilter, CreateBackupOptions, DeleteBackupOptions, DesiredAddresses,
    MatchStrategy, PowerState, SweepReport, UpdateBackupOptions,
};
use crate::waiter::{
    AddressCondition, GenerationAdvanced, PowerStateCondition, StateWaiter, WaitOutcome,
};

/// High-level client for backup jobs.
///
/// Mutating calls are accepted by the server before they take effect. Every
/// orchestrator therefore issues its command, waits until the effect is
/// observable, and returns a freshly fetched [`Backup`].
///
/// Waits run on the caller's task and honour the client's cancellation
/// token. Clone the client with [`BackupClient::with_cancellation`] to give
/// a group of calls its own token.
#[derive(Clone)]
pub struct BackupClient {
    transport: Arc<dyn RpcTransport>,
    config: SdkConfig,
    cancel: CancellationToken,
}

impl BackupClient {
    /// Create a client that talks to the server over HTTP.
    pub fn new(config: SdkConfig) -> Result<Self> {
        let transport = HttpTransport::new(config.transport_config())?;
        Ok(Self::with_transport(config, Arc::new(transport)))
    }

    /// Create a client over an existing transport.
    pub fn with_transport(config: SdkConfig, transport: Arc<dyn RpcTransport>) -> Self {
        Self {
            transport,
            config,
            cancel: CancellationToken::new(),
        }
    }

    /// Create a client from environment variables.
    pub fn from_env() -> Result<Self> {
        let config = SdkConfig::from_env()?;
        Self::new(config)
    }

    /// Use `token` to cancel waits started through this client.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Get the SDK configuration.
    pub fn config(&self) -> &SdkConfig {
        &self.config
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// A waiter using the configured policy, optionally with another deadline.
    pub fn waiter(&self, timeout: Option<Duration>) -> StateWaiter {
        let mut config = self.config.wait.clone();
        if let Some(timeout) = timeout {
            config.timeout = timeout;
        }
        StateWaiter::new(config)
    }

    // =========================================================================
    // Internal helpers
    // =========================================================================

    async fn call<M: RpcMethod>(&self, params: &M) -> Result<M::Response> {
        let params = serde_json::to_value(params)?;
        let value = self.transport.call(M::METHOD, params).await?;
        serde_json::from_value(value)
            .map_err(|e| SdkError::UnexpectedResponse(format!("{}: {}", M::METHOD, e)))
    }

    async fn all_backups(&self) -> Result<Vec<Backup>> {
        let objects = self.call(&GetAllObjectsParams::backups()).await?;
        Ok(decode_snapshot(objects))
    }

    /// Sleep the settle delay unless cancelled first.
    async fn settle(&self) -> Result<()> {
        let delay = self.config.update_settle_delay;
        debug!(?delay, "No generation counter, waiting for the update to settle");
        tokio::select! {
            biased;

            _ = self.cancel.cancelled() => Err(SdkError::Cancelled),
            _ = tokio::time::sleep(delay) => Ok(()),
        }
    }

    // =========================================================================
    // Lookup
    // =========================================================================

    /// Fetch the single backup `strategy` identifies.
    #[instrument(skip(self, strategy), fields(query = %strategy))]
    pub async fn get_backup(&self, strategy: MatchStrategy) -> Result<Backup> {
        debug!("Getting backup");
        select_one(self.all_backups().await?, &strategy)
    }

    /// List every backup `filter` accepts. An empty result is not an error.
    #[instrument(skip(self))]
    pub async fn list_backups(&self, filter: BackupFilter) -> Result<Vec<Backup>> {
        debug!("Listing backups");
        Ok(select_all(self.all_backups().await?, &filter))
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Create a backup and wait until it is observable.
    ///
    /// With desired addresses the wait is for addresses; otherwise it is for
    /// `options.power_state`. A failed wait leaves the created backup in
    /// place.
    #[instrument(skip(self, options), fields(name = %options.name, mode = %options.mode))]
    pub async fn create_backup(&self, options: CreateBackupOptions) -> Result<Backup> {
        if options.name.is_empty() {
            return Err(SdkError::InvalidInput("backup name is empty".to_string()));
        }

        info!("Creating backup");
        let id = self.call(&CreateBackupParams::from(&options)).await?;
        if id.is_empty() {
            return Err(SdkError::UnexpectedResponse(
                "backup.create returned an empty id".to_string(),
            ));
        }
        info!(backup_id = %id, "Backup created");

        if options.wait_for_addresses.is_empty() {
            self.wait_for_power_state(&id, options.power_state, options.timeout)
                .await?;
        } else {
            self.wait_for_addresses(&id, options.wait_for_addresses, options.timeout)
                .await?;
        }

        self.get_backup(MatchStrategy::ById(id)).await
    }

    /// Apply an update and wait until it is observable.
    ///
    /// When the backup exposes a generation counter the wait is for it to
    /// advance; otherwise the client sleeps `update_settle_delay`. A changed
    /// power state is waited for as well, within whatever is left of the
    /// same deadline.
    #[instrument(skip(self, options), fields(backup_id = %options.id))]
    pub async fn update_backup(&self, options: UpdateBackupOptions) -> Result<Backup> {
        if options.id.is_empty() {
            return Err(SdkError::InvalidInput("backup id is empty".to_string()));
        }

        let before = self.get_backup(MatchStrategy::by_id(&options.id)).await?;

        info!("Updating backup");
        let accepted = self.call(&SetBackupParams::from(&options)).await?;
        if !accepted {
            return Err(SdkError::UnexpectedResponse(format!(
                "backup.set rejected update of {}",
                options.id
            )));
        }

        // Both waits share one deadline.
        let budget = options.timeout.unwrap_or(self.config.wait.timeout);
        let started = Instant::now();

        match before.generation {
            Some(generation) => {
                self.wait_for_generation(&options.id, generation, Some(budget))
                    .await?;
            }
            None => self.settle().await?,
        }

        if let Some(state) = options.power_state {
            let remaining = budget.saturating_sub(started.elapsed());
            self.wait_for_power_state(&options.id, state, Some(remaining))
                .await?;
        }

        self.get_backup(MatchStrategy::ById(options.id)).await
    }

    /// Delete a backup.
    ///
    /// With `unblock_destroy` the destroy block is cleared first; if that
    /// fails the delete is still attempted.
    #[instrument(skip(self, options), fields(backup_id = %options.id))]
    pub async fn delete_backup(&self, options: DeleteBackupOptions) -> Result<()> {
        if options.id.is_empty() {
            return Err(SdkError::InvalidInput("backup id is empty".to_string()));
        }

        if options.unblock_destroy
            && let Err(err) = self.call(&UnblockDestroyParams::new(&options.id)).await
        {
            warn!(error = %err, "Failed to clear destroy block, deleting anyway");
        }

        info!("Deleting backup");
        self.call(&DeleteBackupParams {
            id: options.id.clone(),
        })
        .await?;
        Ok(())
    }

    /// Delete every backup whose name starts with `prefix`.
    ///
    /// Per-backup failures are logged and collected; the sweep carries on.
    #[instrument(skip(self))]
    pub async fn sweep_backups_with_prefix(&self, prefix: &str) -> Result<SweepReport> {
        if prefix.is_empty() {
            return Err(SdkError::InvalidInput(
                "refusing to sweep with an empty prefix".to_string(),
            ));
        }

        let backups = self
            .list_backups(BackupFilter::new().with_name_prefix(prefix))
            .await?;
        info!(count = backups.len(), "Sweeping backups");

        let mut report = SweepReport::default();
        for backup in backups {
            if self.cancel.is_cancelled() {
                return Err(SdkError::Cancelled);
            }

            let options = DeleteBackupOptions::new(&backup.id).with_unblock_destroy(true);
            match self.delete_backup(options).await {
                Ok(()) => report.deleted.push(backup.id),
                Err(err) => {
                    warn!(backup_id = %backup.id, name = %backup.name, error = %err, "Failed to sweep backup");
                    report.failed.push((backup.id, err.to_string()));
                }
            }
        }

        Ok(report)
    }

    // =========================================================================
    // Waits
    // =========================================================================

    /// Wait until the backup reports `state`.
    #[instrument(skip(self, id, state), fields(backup_id = %id, target = %state))]
    pub async fn wait_for_power_state(
        &self,
        id: &str,
        state: PowerState,
        timeout: Option<Duration>,
    ) -> Result<WaitOutcome<PowerState>> {
        let outcome = self
            .waiter(timeout)
            .wait(
                &PowerStateRefresh::new(self),
                &PowerStateCondition::new(state),
                id,
                &self.cancel,
            )
            .await?;
        info!(attempts = outcome.attempts, elapsed = ?outcome.elapsed, "Power state reached");
        Ok(outcome)
    }

    /// Wait until every desired interface slot reports an acceptable address.
    #[instrument(skip(self, id, desired), fields(backup_id = %id, slots = desired.len()))]
    pub async fn wait_for_addresses(
        &self,
        id: &str,
        desired: DesiredAddresses,
        timeout: Option<Duration>,
    ) -> Result<WaitOutcome<BTreeMap<String, String>>> {
        let outcome = self
            .waiter(timeout)
            .wait(
                &AddressRefresh::new(self),
                &AddressCondition::new(desired),
                id,
                &self.cancel,
            )
            .await?;
        info!(attempts = outcome.attempts, elapsed = ?outcome.elapsed, "Addresses assigned");
        Ok(outcome)
    }

    /// Wait until the generation counter moves past `after`.
    #[instrument(skip(self, id), fields(backup_id = %id))]
    pub async fn wait_for_generation(
        &self,
        id: &str,
        after: u64,
        timeout: Option<Duration>,
    ) -> Result<WaitOutcome<Option<u64>>> {
        let outcome = self
            .waiter(timeout)
            .wait(
                &GenerationRefresh::new(self),
                &GenerationAdvanced::new(after),
                id,
                &self.cancel,
            )
            .await?;
        debug!(attempts = outcome.attempts, "Update applied");
        Ok(outcome)
    }
}
