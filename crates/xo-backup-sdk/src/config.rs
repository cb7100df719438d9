// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Configuration for the backup SDK.

use std::str::FromStr;
use std::time::Duration;

use xo_rpc::TransportConfig;

use crate::error::{Result, SdkError};
use crate::waiter::WaitConfig;

/// Configuration for the BackupClient.
#[derive(Debug, Clone)]
pub struct SdkConfig {
    /// Base URL of the Xen Orchestra server.
    pub url: String,
    /// Username for basic authentication.
    pub username: Option<String>,
    /// Password for basic authentication.
    pub password: Option<String>,
    /// API token; takes precedence over username/password.
    pub token: Option<String>,
    /// Skip TLS certificate verification (development only).
    pub skip_cert_verification: bool,
    /// Connection timeout.
    pub connect_timeout: Duration,
    /// Request timeout.
    pub request_timeout: Duration,
    /// Polling policy shared by every wait.
    pub wait: WaitConfig,
    /// Pause after an update when the server exposes no generation counter.
    pub update_settle_delay: Duration,
}

impl Default for SdkConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost".to_string(),
            username: None,
            password: None,
            token: None,
            skip_cert_verification: false,
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(60),
            wait: WaitConfig::default(),
            update_settle_delay: Duration::from_secs(25),
        }
    }
}

impl SdkConfig {
    /// Create a configuration for `url` with default values.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    /// Create a configuration from environment variables.
    ///
    /// Environment variables:
    /// - `XOA_URL`: Server URL (required)
    /// - `XOA_TOKEN`: API token
    /// - `XOA_USER` / `XOA_PASSWORD`: Credentials, required when no token is set
    /// - `XOA_INSECURE`: Skip TLS verification (default: "false")
    /// - `XOA_POLL_INTERVAL_MS`: Pause between refreshes (default: 5000)
    /// - `XOA_RETRY_BUDGET`: Consecutive refresh errors tolerated (default: 3)
    /// - `XOA_WAIT_TIMEOUT_MS`: Default wait deadline (default: 300000)
    /// - `XOA_UPDATE_SETTLE_MS`: Post-update settle delay (default: 25000)
    pub fn from_env() -> Result<Self> {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    /// Same as [`SdkConfig::from_env`], reading variables through `lookup`.
    pub fn from_vars<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.is_empty());

        let url = var("XOA_URL")
            .ok_or_else(|| SdkError::Config("XOA_URL must be set".to_string()))?;
        let token = var("XOA_TOKEN");
        let username = var("XOA_USER");
        let password = var("XOA_PASSWORD");

        if token.is_none() && (username.is_none() || password.is_none()) {
            return Err(SdkError::Config(
                "either XOA_TOKEN or both XOA_USER and XOA_PASSWORD must be set".to_string(),
            ));
        }

        let skip_cert_verification = var("XOA_INSECURE")
            .map(|v| v.to_lowercase() == "true" || v == "1")
            .unwrap_or(false);

        let defaults = Self::default();
        let wait = WaitConfig {
            poll_interval: millis(&var, "XOA_POLL_INTERVAL_MS")?
                .unwrap_or(defaults.wait.poll_interval),
            retry_budget: parsed(&var, "XOA_RETRY_BUDGET")?.unwrap_or(defaults.wait.retry_budget),
            timeout: millis(&var, "XOA_WAIT_TIMEOUT_MS")?.unwrap_or(defaults.wait.timeout),
            ..defaults.wait.clone()
        };
        let update_settle_delay =
            millis(&var, "XOA_UPDATE_SETTLE_MS")?.unwrap_or(defaults.update_settle_delay);

        Ok(Self {
            url,
            username,
            password,
            token,
            skip_cert_verification,
            wait,
            update_settle_delay,
            ..defaults
        })
    }

    /// Set the API token.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Set basic authentication credentials.
    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    /// Enable or disable certificate verification skipping.
    pub fn with_skip_cert_verification(mut self, skip: bool) -> Self {
        self.skip_cert_verification = skip;
        self
    }

    /// Set the connection timeout.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the request timeout.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Replace the polling policy.
    pub fn with_wait(mut self, wait: WaitConfig) -> Self {
        self.wait = wait;
        self
    }

    /// Set the post-update settle delay.
    pub fn with_update_settle_delay(mut self, delay: Duration) -> Self {
        self.update_settle_delay = delay;
        self
    }

    /// Transport settings derived from this configuration.
    pub fn transport_config(&self) -> TransportConfig {
        TransportConfig {
            url: self.url.clone(),
            token: self.token.clone(),
            username: self.username.clone(),
            password: self.password.clone(),
            skip_cert_verification: self.skip_cert_verification,
            connect_timeout: self.connect_timeout,
            request_timeout: self.request_timeout,
        }
    }
}

fn parsed<T, F>(var: &F, name: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    var(name)
        .map(|raw| {
            raw.trim()
                .parse()
                .map_err(|e| SdkError::Config(format!("invalid {}: {}", name, e)))
        })
        .transpose()
}

fn millis<F>(var: &F, name: &str) -> Result<Option<Duration>>
where
    F: Fn(&str) -> Option<String>,
{
    Ok(parsed::<u64, F>(var, name)?.map(Duration::from_millis))
}
