// Copyright (c) 2026 Toolsmith Contributors
// SPDX-License-Identifier: Apache-2.0
//! Checkpoint — a rollback marker the Gateway takes before every mutation.
//! A failed verification never mutates registry state, so "rollback" here
//! is limited to transitioning the checkpoint to `Failed`; no compensating
//! writes are required (spec §5, "Checkpoint discipline").

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::ids::CheckpointId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CheckpointStatus {
    Pending,
    Complete,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Checkpoint {
    pub checkpoint_id: CheckpointId,
    pub created_at: DateTime<Utc>,
    pub status: CheckpointStatus,
    /// Subset of pre-mutation registry state needed for rollback/audit.
    pub context: Value,
}

impl Checkpoint {
    pub fn pending(context: Value) -> Self {
        Self {
            checkpoint_id: CheckpointId::new(),
            created_at: Utc::now(),
            status: CheckpointStatus::Pending,
            context,
        }
    }
}
