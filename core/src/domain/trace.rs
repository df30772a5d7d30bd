// Copyright (c) 2026 Toolsmith Contributors
// SPDX-License-Identifier: Apache-2.0
//! ExecutionTrace — one invocation record, immutable after write.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::ids::{ToolId, TraceId};

/// Exit code mapping: 0 ok, 1 exception, 124 timeout, other = sandbox killed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExitOutcome {
    Ok,
    Exception,
    Timeout,
    Killed(i32),
}

impl ExitOutcome {
    pub fn from_code(code: i32) -> Self {
        match code {
            0 => ExitOutcome::Ok,
            1 => ExitOutcome::Exception,
            124 => ExitOutcome::Timeout,
            other => ExitOutcome::Killed(other),
        }
    }

    pub fn code(&self) -> i32 {
        match self {
            ExitOutcome::Ok => 0,
            ExitOutcome::Exception => 1,
            ExitOutcome::Timeout => 124,
            ExitOutcome::Killed(c) => *c,
        }
    }
}

/// Snapshot of the language model configuration in effect for a generation,
/// recorded on the trace for reproducibility/audit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfigSnapshot {
    pub provider: String,
    pub model: String,
    pub temperature: Option<f32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionTrace {
    pub trace_id: TraceId,
    pub task_id: String,
    pub tool_id: Option<ToolId>,
    pub input_args: Value,
    pub output_repr: String,
    pub exit_outcome: ExitOutcome,
    pub std_out: String,
    pub std_err: String,
    pub execution_time_ms: u64,
    pub model_config: Option<ModelConfigSnapshot>,
    pub created_at: DateTime<Utc>,
}

impl ExecutionTrace {
    /// `exit_code = 0` implies `std_err` is informational only.
    pub fn is_clean(&self) -> bool {
        matches!(self.exit_outcome, ExitOutcome::Ok)
    }

    /// Truncates `output_repr` to the 1000-char bound spec.md mandates.
    pub fn truncated_output(&self) -> &str {
        let max = 1000;
        if self.output_repr.len() <= max {
            &self.output_repr
        } else {
            &self.output_repr[..max]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_outcome_mapping() {
        assert_eq!(ExitOutcome::from_code(0), ExitOutcome::Ok);
        assert_eq!(ExitOutcome::from_code(1), ExitOutcome::Exception);
        assert_eq!(ExitOutcome::from_code(124), ExitOutcome::Timeout);
        assert_eq!(ExitOutcome::from_code(9), ExitOutcome::Killed(9));
    }
}
