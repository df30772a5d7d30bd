// Copyright (c) 2026 Toolsmith Contributors
// SPDX-License-Identifier: Apache-2.0
//! Executor (C3). Ties the static capability guard and the subprocess
//! sandbox together into the two operations spec §4.1 names:
//! `static_check` and `execute`. Memory-capping the sandboxed process is out
//! of scope here — no cgroups/rlimit crate appears anywhere in the reference
//! corpus, so `Constraints::memory_limit_mb` is carried as audit metadata on
//! the trace rather than enforced at the OS level (see `DESIGN.md`).

use std::time::Duration;

use serde_json::Value;

use crate::domain::constraints::Constraints;
use crate::domain::ids::TraceId;
use crate::domain::tool::Category;
use crate::domain::trace::{ExecutionTrace, ModelConfigSnapshot};
use crate::infrastructure::ast_guard::{PyAstGuard, StaticCheckViolation};
use crate::infrastructure::sandbox::{extract_result, Sandbox, SandboxError};

pub struct ExecutorService {
    sandbox: Sandbox,
}

impl ExecutorService {
    pub fn new(sandbox: Sandbox) -> Self {
        Self { sandbox }
    }

    pub fn static_check(&self, source: &str, category: Category, constraints: &Constraints) -> Result<(), StaticCheckViolation> {
        PyAstGuard::static_check(source, category, constraints)
    }

    /// `execute(source, entry_function, args, task_id, timeout) ->
    /// ExecutionTrace` (spec §4.1).
    pub async fn execute(
        &self,
        source: &str,
        entry_function: &str,
        args: &Value,
        task_id: &str,
        constraints: &Constraints,
        tool_id: Option<crate::domain::ids::ToolId>,
        model_config: Option<ModelConfigSnapshot>,
    ) -> Result<ExecutionTrace, SandboxError> {
        let timeout = Duration::from_secs(constraints.execution_timeout_seconds);
        let outcome = self.sandbox.execute(source, entry_function, args, timeout).await?;

        Ok(ExecutionTrace {
            trace_id: TraceId::new(),
            task_id: task_id.to_string(),
            tool_id,
            input_args: args.clone(),
            output_repr: outcome.output_repr,
            exit_outcome: outcome.exit_outcome,
            std_out: outcome.std_out,
            std_err: outcome.std_err,
            execution_time_ms: outcome.execution_time_ms,
            model_config,
            created_at: chrono::Utc::now(),
        })
    }

    /// `extract_result(trace) -> value | None` (spec §4.1).
    pub fn extract_result(&self, trace: &ExecutionTrace) -> Option<Value> {
        extract_result(&trace.output_repr)
    }

    /// Runs the module's embedded self-test block (Verifier stage 2). See
    /// [`Sandbox::run_self_test`] for why this is a distinct code path from
    /// `execute`.
    pub async fn sandbox_run_self_test(
        &self,
        source: &str,
        timeout: Duration,
    ) -> Result<crate::infrastructure::sandbox::SandboxOutcome, SandboxError> {
        self.sandbox.run_self_test(source, timeout).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_check_rejects_banned_import() {
        let service = ExecutorService::new(Sandbox::default_executable());
        let err = service
            .static_check("import os\n", Category::Calculation, &Constraints::default())
            .unwrap_err();
        assert!(err.0.contains("os"));
    }
}
