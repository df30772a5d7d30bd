// Copyright (c) 2026 Toolsmith Contributors
// SPDX-License-Identifier: Apache-2.0
//! Error taxonomy (spec §7). Not Rust type names for exceptions — a
//! classification of *why* a verification/execution attempt failed, used to
//! route recovery: Refiner retries, bounded backoff, or immediate failure.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Verifier stage 1. Never retried by the Refiner.
    Security,
    /// Verifier stage 1.
    Syntax,
    /// Verifier stage 2.
    Exec,
    /// Verifier stage 2.
    Assert,
    /// Verifier stage 3.
    Contract,
    /// Verifier stage 4. Transient (network) subject to bounded backoff.
    Integration,
    /// Any exec stage; consult the module replacement guide.
    Import,
    /// Treated as Exec; Refiner attempts a fix once, repeated is fatal.
    Timeout,
    /// LanguageModel transport failure; surfaced, never substituted.
    ModelTransport,
    /// TaskExecutor: query the OHLCV source cannot answer.
    ProviderUnsupported,
}

impl ErrorKind {
    /// SECURITY, and any error whose message matches a security-violation
    /// pattern, terminate the Refiner loop immediately (spec §4.8).
    pub fn is_unfixable(&self) -> bool {
        matches!(self, ErrorKind::Security)
    }

    pub fn is_transient(&self) -> bool {
        matches!(self, ErrorKind::Integration | ErrorKind::Timeout)
    }
}

/// The orchestrator-level result shape (spec §7 closing paragraph).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskStatus {
    Ok,
    Fail,
    Error,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskResult {
    pub status: TaskStatus,
    pub value: Option<serde_json::Value>,
    pub error_kind: Option<ErrorKind>,
    pub message: Option<String>,
}

impl TaskResult {
    pub fn ok(value: serde_json::Value) -> Self {
        Self { status: TaskStatus::Ok, value: Some(value), error_kind: None, message: None }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self { status: TaskStatus::Fail, value: None, error_kind: None, message: Some(message.into()) }
    }

    pub fn error(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self { status: TaskStatus::Error, value: None, error_kind: Some(kind), message: Some(message.into()) }
    }
}
