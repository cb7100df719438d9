// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Transport trait and the HTTP implementation.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Url;
use reqwest::header::COOKIE;
use serde_json::Value;
use tracing::{debug, instrument};

use crate::envelope::{RpcRequest, RpcResponse};
use crate::error::RpcError;

/// Cookie Xen Orchestra reads its API token from.
const TOKEN_COOKIE: &str = "authenticationToken";

/// A synchronous request/response channel to the remote API.
///
/// Implementations must be safe to share between concurrent callers; every
/// call is independent and carries no state from earlier calls.
#[async_trait]
pub trait RpcTransport: Send + Sync {
    /// Invoke `method` with `params` and return the raw result value.
    async fn call(&self, method: &str, params: Value) -> Result<Value, RpcError>;
}

/// Configuration for [`HttpTransport`].
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Base URL of the server, e.g. `https://xoa.example.com`.
    pub url: String,
    /// API token sent as the `authenticationToken` cookie.
    pub token: Option<String>,
    /// User for basic authentication (ignored when a token is set).
    pub username: Option<String>,
    /// Password for basic authentication.
    pub password: Option<String>,
    /// Accept self-signed certificates (development only).
    pub skip_cert_verification: bool,
    /// TCP connect timeout.
    pub connect_timeout: Duration,
    /// Whole-request timeout.
    pub request_timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost".to_string(),
            token: None,
            username: None,
            password: None,
            skip_cert_verification: false,
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(60),
        }
    }
}

impl TransportConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    pub fn with_skip_cert_verification(mut self, skip: bool) -> Self {
        self.skip_cert_verification = skip;
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

/// JSON-RPC over HTTP POST to `<url>/api/`.
pub struct HttpTransport {
    http: reqwest::Client,
    endpoint: Url,
    config: TransportConfig,
    next_id: AtomicU64,
}

impl HttpTransport {
    /// Build a transport; fails when the URL does not parse or the HTTP
    /// client cannot be constructed.
    pub fn new(config: TransportConfig) -> Result<Self, RpcError> {
        let mut base =
            Url::parse(&config.url).map_err(|e| RpcError::InvalidUrl(e.to_string()))?;
        // `join` replaces the last path segment unless it ends with a slash.
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let endpoint = base
            .join("api/")
            .map_err(|e| RpcError::InvalidUrl(e.to_string()))?;

        let http = reqwest::Client::builder()
            .danger_accept_invalid_certs(config.skip_cert_verification)
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            http,
            endpoint,
            config,
            next_id: AtomicU64::new(1),
        })
    }

    /// The resolved API endpoint.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    pub fn config(&self) -> &TransportConfig {
        &self.config
    }
}

#[async_trait]
impl RpcTransport for HttpTransport {
    #[instrument(skip(self, params), fields(endpoint = %self.endpoint))]
    async fn call(&self, method: &str, params: Value) -> Result<Value, RpcError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let request = RpcRequest::new(id, method, params);
        debug!(id, method, "sending rpc request");

        let mut builder = self.http.post(self.endpoint.clone()).json(&request);
        if let Some(token) = &self.config.token {
            builder = builder.header(COOKIE, format!("{}={}", TOKEN_COOKIE, token));
        } else if let Some(username) = &self.config.username {
            builder = builder.basic_auth(username, self.config.password.as_deref());
        }

        let response = builder.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RpcError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let envelope: RpcResponse = response
            .json()
            .await
            .map_err(|e| RpcError::Decode(e.to_string()))?;

        envelope.into_result(id)
    }
}
