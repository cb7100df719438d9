// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Error type tests for xo-backup-sdk.

use std::error::Error;
use std::time::Duration;

use xo_backup_sdk::SdkError;
use xo_rpc::RpcError;

#[test]
fn test_config_error_display() {
    let err = SdkError::Config("missing url".to_string());
    assert!(err.to_string().contains("configuration error"));
    assert!(err.to_string().contains("missing url"));
}

#[test]
fn test_server_error_display() {
    let err = SdkError::Server {
        code: "10".to_string(),
        message: "invalid parameters".to_string(),
    };
    let display = err.to_string();
    assert!(display.contains("server error"));
    assert!(display.contains("10"));
    assert!(display.contains("invalid parameters"));
}

#[test]
fn test_backup_not_found_display() {
    let err = SdkError::BackupNotFound("id=b-1".to_string());
    assert!(err.to_string().contains("backup not found"));
    assert!(err.to_string().contains("id=b-1"));
}

#[test]
fn test_ambiguous_display() {
    let err = SdkError::AmbiguousBackup {
        query: "name=nightly".to_string(),
        count: 3,
    };
    assert!(err.to_string().contains("name=nightly"));
    assert!(err.to_string().contains('3'));
}

#[test]
fn test_wait_timeout_display() {
    let err = SdkError::WaitTimeout {
        id: "b-1".to_string(),
        elapsed: Duration::from_secs(300),
        last_observed: Some("Disabled".to_string()),
    };
    let display = err.to_string();
    assert!(display.contains("timed out"));
    assert!(display.contains("b-1"));
    assert!(display.contains("Disabled"));

    let err = SdkError::WaitTimeout {
        id: "b-1".to_string(),
        elapsed: Duration::from_secs(1),
        last_observed: None,
    };
    assert!(err.to_string().contains("nothing"));
}

#[test]
fn test_retry_budget_keeps_cause() {
    let err = SdkError::RetryBudgetExhausted {
        attempts: 4,
        source: Box::new(SdkError::BackupNotFound("id=b-1".to_string())),
    };

    assert!(err.to_string().contains('4'));
    let cause = err.source().unwrap();
    assert!(cause.to_string().contains("backup not found"));
}

#[test]
fn test_retry_classification() {
    assert!(SdkError::BackupNotFound("x".to_string()).is_retryable());
    assert!(SdkError::Connection("reset".to_string()).is_retryable());
    assert!(
        !SdkError::Server {
            code: "3".to_string(),
            message: "unauthorized".to_string(),
        }
        .is_retryable()
    );
    assert!(!SdkError::Cancelled.is_retryable());
    assert!(!SdkError::InvalidInput("x".to_string()).is_retryable());
}

#[test]
fn test_from_rpc_error() {
    let err: SdkError = RpcError::Status {
        status: 503,
        body: "unavailable".to_string(),
    }
    .into();
    assert!(matches!(err, SdkError::Connection(_)));

    let err: SdkError = RpcError::Status {
        status: 401,
        body: "unauthorized".to_string(),
    }
    .into();
    assert!(matches!(err, SdkError::Server { ref code, .. } if code == "401"));

    let err: SdkError = RpcError::Remote {
        code: 10,
        message: "invalid parameters".to_string(),
        data: None,
    }
    .into();
    assert!(matches!(err, SdkError::Server { ref code, .. } if code == "10"));

    let err: SdkError = RpcError::InvalidUrl("nope".to_string()).into();
    assert!(matches!(err, SdkError::Config(_)));

    let err: SdkError = RpcError::MissingResult.into();
    assert!(matches!(err, SdkError::UnexpectedResponse(_)));
}
