// Copyright (c) 2026 Toolsmith Contributors
// SPDX-License-Identifier: Apache-2.0
//! Subprocess sandbox (spec §4.1 `execute`). Grounded on the teacher's own
//! `domain::policy::IsolationType::Process` variant — the process-isolation
//! case the teacher's domain model already names alongside Docker/
//! Firecracker, which is the isolation level this spec actually calls for
//! (a per-invocation temp directory + JSON IPC + wall-clock timeout, no
//! container runtime).

use std::path::PathBuf;
use std::process::Stdio;
use std::time::{Duration, Instant};

use serde_json::Value;
use tokio::process::Command;
use tracing::{info, warn};

use crate::domain::trace::ExitOutcome;

#[derive(Debug, thiserror::Error)]
pub enum SandboxError {
    #[error("failed to prepare sandbox directory: {0}")]
    Setup(String),
    #[error("failed to spawn sandboxed process: {0}")]
    Spawn(String),
    #[error("failed to read sandbox result: {0}")]
    ResultRead(String),
}

pub struct SandboxOutcome {
    pub exit_outcome: ExitOutcome,
    pub output_repr: String,
    pub std_out: String,
    pub std_err: String,
    pub execution_time_ms: u64,
}

const RUNNER_TEMPLATE: &str = r#"
import json
import sys
import traceback

with open("args.json", "r", encoding="utf-8") as f:
    _args = json.load(f)

_namespace = {}
with open("module.py", "r", encoding="utf-8") as f:
    _source = f.read()

try:
    exec(compile(_source, "module.py", "exec"), _namespace)
except Exception:
    with open("result.json", "w", encoding="utf-8") as f:
        json.dump({"ok": False, "traceback": traceback.format_exc()}, f)
    sys.exit(1)

_entry = _namespace.get(ENTRY_PLACEHOLDER)
if _entry is None:
    with open("result.json", "w", encoding="utf-8") as f:
        json.dump({"ok": False, "traceback": "entry function not found in module namespace"}, f)
    sys.exit(1)

try:
    _result = _entry(**_args) if isinstance(_args, dict) else _entry(*_args)
    try:
        _payload = json.dumps(_result)
        _is_json = True
    except TypeError:
        _payload = repr(_result)
        _is_json = False
    with open("result.json", "w", encoding="utf-8") as f:
        json.dump({"ok": True, "value": _result if _is_json else None, "repr": _payload}, f, default=str)
except Exception:
    with open("result.json", "w", encoding="utf-8") as f:
        json.dump({"ok": False, "traceback": traceback.format_exc()}, f)
    sys.exit(1)
"#;

/// Note on "no eval": the runner above never calls Python's `eval`. It
/// resolves the entry function by dict-lookup on `_namespace` and invokes
/// it directly — `exec(compile(...))` loads the *module*, it does not
/// evaluate attacker-chosen expressions (spec §9 "Dynamic dispatch over
/// generated code").
pub struct Sandbox {
    python_executable: String,
}

impl Sandbox {
    pub fn new(python_executable: impl Into<String>) -> Self {
        Self { python_executable: python_executable.into() }
    }

    pub fn default_executable() -> Self {
        Self::new("python3")
    }

    fn render_runner(entry_function: &str) -> String {
        RUNNER_TEMPLATE.replace("ENTRY_PLACEHOLDER", &format!("{:?}", entry_function))
    }

    /// `execute(source, entry_function, args, task_id, timeout) ->
    /// ExecutionTrace` (spec §4.1). Returns the raw sandbox outcome; the
    /// caller ([`crate::application::executor_service::ExecutorService`])
    /// wraps it into an `ExecutionTrace`.
    pub async fn execute(
        &self,
        source: &str,
        entry_function: &str,
        args: &Value,
        timeout: Duration,
    ) -> Result<SandboxOutcome, SandboxError> {
        let dir = tempfile::tempdir().map_err(|e| SandboxError::Setup(e.to_string()))?;
        let dir_path: PathBuf = dir.path().to_path_buf();

        tokio::fs::write(dir_path.join("module.py"), source)
            .await
            .map_err(|e| SandboxError::Setup(e.to_string()))?;
        tokio::fs::write(dir_path.join("args.json"), serde_json::to_vec(args).unwrap())
            .await
            .map_err(|e| SandboxError::Setup(e.to_string()))?;
        tokio::fs::write(dir_path.join("runner.py"), Self::render_runner(entry_function))
            .await
            .map_err(|e| SandboxError::Setup(e.to_string()))?;

        let started = Instant::now();

        let mut child = Command::new(&self.python_executable)
            .arg("runner.py")
            .current_dir(&dir_path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| SandboxError::Spawn(e.to_string()))?;

        // scopeguard ensures the child is reaped even if the future is
        // cancelled after `timeout` fires but before we explicitly kill it.
        let mut child_guard = scopeguard::guard(&mut child, |c| {
            let _ = c.start_kill();
        });

        let mut stdout_handle = child_guard.stdout.take();
        let mut stderr_handle = child_guard.stderr.take();

        let wait_result = tokio::time::timeout(timeout, child_guard.wait()).await;

        let mut std_out = String::new();
        let mut std_err = String::new();
        if let Some(mut h) = stdout_handle.take() {
            use tokio::io::AsyncReadExt;
            let _ = h.read_to_string(&mut std_out).await;
        }
        if let Some(mut h) = stderr_handle.take() {
            use tokio::io::AsyncReadExt;
            let _ = h.read_to_string(&mut std_err).await;
        }

        let execution_time_ms = started.elapsed().as_millis() as u64;

        let (exit_outcome, output_repr) = match wait_result {
            Err(_) => {
                warn!(timeout_s = timeout.as_secs(), "sandbox execution timed out, killing process");
                let _ = child_guard.start_kill();
                (ExitOutcome::Timeout, String::new())
            }
            Ok(Ok(status)) => {
                let code = status.code().unwrap_or(-1);
                let outcome = ExitOutcome::from_code(code);
                let repr = Self::read_result_repr(&dir_path).await.unwrap_or_default();
                (outcome, repr)
            }
            Ok(Err(e)) => return Err(SandboxError::Spawn(e.to_string())),
        };

        info!(?exit_outcome, execution_time_ms, "sandbox execution complete");

        Ok(SandboxOutcome { exit_outcome, output_repr, std_out, std_err, execution_time_ms })
    }

    /// Runs `source` as a plain script (`python3 module.py`), so a trailing
    /// `if __name__ == "__main__":` self-test block actually executes —
    /// unlike [`Sandbox::execute`], which `exec`s the module into a
    /// namespace with no `__name__` binding. Used by Verifier stage 2
    /// (spec §4.5 SELF_TEST).
    pub async fn run_self_test(&self, source: &str, timeout: Duration) -> Result<SandboxOutcome, SandboxError> {
        let dir = tempfile::tempdir().map_err(|e| SandboxError::Setup(e.to_string()))?;
        let dir_path: PathBuf = dir.path().to_path_buf();

        tokio::fs::write(dir_path.join("module.py"), source)
            .await
            .map_err(|e| SandboxError::Setup(e.to_string()))?;

        let started = Instant::now();

        let mut child = Command::new(&self.python_executable)
            .arg("module.py")
            .current_dir(&dir_path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| SandboxError::Spawn(e.to_string()))?;

        let mut child_guard = scopeguard::guard(&mut child, |c| {
            let _ = c.start_kill();
        });

        let mut stdout_handle = child_guard.stdout.take();
        let mut stderr_handle = child_guard.stderr.take();

        let wait_result = tokio::time::timeout(timeout, child_guard.wait()).await;

        let mut std_out = String::new();
        let mut std_err = String::new();
        if let Some(mut h) = stdout_handle.take() {
            use tokio::io::AsyncReadExt;
            let _ = h.read_to_string(&mut std_out).await;
        }
        if let Some(mut h) = stderr_handle.take() {
            use tokio::io::AsyncReadExt;
            let _ = h.read_to_string(&mut std_err).await;
        }

        let execution_time_ms = started.elapsed().as_millis() as u64;

        let exit_outcome = match wait_result {
            Err(_) => {
                warn!(timeout_s = timeout.as_secs(), "self-test timed out, killing process");
                let _ = child_guard.start_kill();
                ExitOutcome::Timeout
            }
            Ok(Ok(status)) => ExitOutcome::from_code(status.code().unwrap_or(-1)),
            Ok(Err(e)) => return Err(SandboxError::Spawn(e.to_string())),
        };

        Ok(SandboxOutcome { exit_outcome, output_repr: String::new(), std_out, std_err, execution_time_ms })
    }

    async fn read_result_repr(dir_path: &std::path::Path) -> Result<String, SandboxError> {
        let result_path = dir_path.join("result.json");
        let contents = tokio::fs::read_to_string(&result_path)
            .await
            .map_err(|e| SandboxError::ResultRead(e.to_string()))?;
        Ok(contents)
    }
}

/// Parses the structured output channel written by the runner (spec §4.1
/// `extract_result`). Returns `None` when the trace carries no usable value
/// (e.g. a timeout, where `result.json` was never written).
pub fn extract_result(output_repr: &str) -> Option<Value> {
    let parsed: Value = serde_json::from_str(output_repr).ok()?;
    if parsed.get("ok").and_then(|v| v.as_bool()) != Some(true) {
        return None;
    }
    parsed.get("value").cloned().filter(|v| !v.is_null()).or_else(|| {
        parsed.get("repr").and_then(|v| v.as_str()).map(|s| Value::String(s.to_string()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_result_reads_json_value() {
        let repr = r#"{"ok": true, "value": 42.0, "repr": "42.0"}"#;
        assert_eq!(extract_result(repr), Some(Value::from(42.0)));
    }

    #[test]
    fn extract_result_none_on_failure() {
        let repr = r#"{"ok": false, "traceback": "boom"}"#;
        assert_eq!(extract_result(repr), None);
    }

    #[test]
    fn extract_result_falls_back_to_repr_when_not_json_encodable() {
        let repr = r#"{"ok": true, "value": null, "repr": "<DataFrame>"}"#;
        assert_eq!(extract_result(repr), Some(Value::String("<DataFrame>".to_string())));
    }
}
