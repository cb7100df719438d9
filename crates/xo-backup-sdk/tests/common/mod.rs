// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Scripted transport shared by the client tests.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Map, Value, json};
use xo_backup_sdk::{BackupClient, SdkConfig, WaitConfig};
use xo_rpc::{RpcError, RpcTransport};

/// One canned reply.
#[derive(Debug, Clone)]
pub enum Reply {
    Value(Value),
    Remote(i64, &'static str),
    Status(u16),
}

/// Answers each method from its own queue. The last reply of a queue repeats.
#[derive(Default)]
pub struct ScriptedTransport {
    replies: Mutex<HashMap<String, VecDeque<Reply>>>,
    calls: Mutex<Vec<(String, Value)>>,
}

impl ScriptedTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn on(&self, method: &str, replies: impl IntoIterator<Item = Reply>) {
        self.replies
            .lock()
            .unwrap()
            .entry(method.to_string())
            .or_default()
            .extend(replies);
    }

    pub fn calls(&self) -> Vec<(String, Value)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn methods(&self) -> Vec<String> {
        self.calls().into_iter().map(|(m, _)| m).collect()
    }

    pub fn count(&self, method: &str) -> usize {
        self.calls().iter().filter(|(m, _)| m == method).count()
    }

    pub fn params_of(&self, method: &str) -> Vec<Value> {
        self.calls()
            .into_iter()
            .filter(|(m, _)| m == method)
            .map(|(_, p)| p)
            .collect()
    }
}

#[async_trait]
impl RpcTransport for ScriptedTransport {
    async fn call(&self, method: &str, params: Value) -> Result<Value, RpcError> {
        self.calls
            .lock()
            .unwrap()
            .push((method.to_string(), params));

        let reply = {
            let mut replies = self.replies.lock().unwrap();
            match replies.get_mut(method) {
                Some(queue) if queue.len() > 1 => queue.pop_front(),
                Some(queue) => queue.front().cloned(),
                None => None,
            }
        };

        match reply {
            Some(Reply::Value(value)) => Ok(value),
            Some(Reply::Remote(code, message)) => Err(RpcError::Remote {
                code,
                message: message.to_string(),
                data: None,
            }),
            Some(Reply::Status(status)) => Err(RpcError::Status {
                status,
                body: String::new(),
            }),
            None => Err(RpcError::Remote {
                code: -32601,
                message: format!("no reply scripted for {}", method),
                data: None,
            }),
        }
    }
}

/// A backup object as `xo.getAllObjects` reports it.
pub fn backup(id: &str, name: &str, power_state: &str) -> Value {
    json!({
        "id": id,
        "name": name,
        "mode": "full",
        "type": "VM",
        "powerState": power_state,
    })
}

/// An `xo.getAllObjects` reply holding `backups`.
pub fn objects(backups: &[Value]) -> Reply {
    let map: Map<String, Value> = backups
        .iter()
        .map(|b| (b["id"].as_str().unwrap_or_default().to_string(), b.clone()))
        .collect();
    Reply::Value(Value::Object(map))
}

pub fn fast_wait() -> WaitConfig {
    WaitConfig::new()
        .with_poll_interval(Duration::from_secs(1))
        .with_timeout(Duration::from_secs(30))
        .with_retry_budget(3)
}

pub fn client(transport: &Arc<ScriptedTransport>) -> BackupClient {
    let config = SdkConfig::new("http://xoa.test")
        .with_token("test")
        .with_wait(fast_wait());
    BackupClient::with_transport(config, transport.clone())
}
