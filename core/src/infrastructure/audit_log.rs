// Copyright (c) 2026 Toolsmith Contributors
// SPDX-License-Identifier: Apache-2.0
//! Append-only log writers for the Gateway's audit trail (spec §6.3, §6.4).
//! Every writer opens in append mode and writes a single `write_all` call per
//! entry so concurrent appenders interleave whole lines, never partial ones
//! (spec §5, "writers must tolerate concurrent appends").

use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::Serialize;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;

use crate::domain::checkpoint::Checkpoint;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AttemptOutcome {
    Registered,
    Rejected,
}

#[derive(Debug, Clone, Serialize)]
pub struct AttemptLogEntry {
    pub ts: String,
    pub task_id: String,
    pub category: String,
    pub outcome: AttemptOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage_failed: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl AttemptLogEntry {
    pub fn registered(task_id: impl Into<String>, category: impl Into<String>, tool_id: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            ts: Utc::now().to_rfc3339(),
            task_id: task_id.into(),
            category: category.into(),
            outcome: AttemptOutcome::Registered,
            stage_failed: None,
            tool_id: Some(tool_id.into()),
            version: Some(version.into()),
            message: None,
        }
    }

    pub fn rejected(task_id: impl Into<String>, category: impl Into<String>, stage_failed: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            ts: Utc::now().to_rfc3339(),
            task_id: task_id.into(),
            category: category.into(),
            outcome: AttemptOutcome::Rejected,
            stage_failed: Some(stage_failed.into()),
            tool_id: None,
            version: None,
            message: Some(message.into()),
        }
    }
}

/// Owns the `logs/` and `checkpoints/` directories under a configured root
/// and exposes one append method per audit stream.
#[derive(Debug, Clone)]
pub struct AuditLog {
    root: PathBuf,
}

impl AuditLog {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn logs_dir(&self) -> PathBuf {
        self.root.join("logs")
    }

    fn checkpoints_dir(&self) -> PathBuf {
        self.root.join("checkpoints")
    }

    async fn append_line(&self, file_name: &str, line: &str) -> std::io::Result<()> {
        let dir = self.logs_dir();
        tokio::fs::create_dir_all(&dir).await?;
        let path = dir.join(file_name);
        let mut file = OpenOptions::new().create(true).append(true).open(&path).await?;
        file.write_all(line.as_bytes()).await?;
        file.write_all(b"\n").await?;
        file.flush().await
    }

    /// `<ISO-8601> | <task_id> | <reason>` appended to
    /// `logs/security_violations.log` (spec §6.4).
    pub async fn log_security_violation(&self, task_id: &str, reason: &str) -> std::io::Result<()> {
        let line = format!("{} | {} | {}", Utc::now().to_rfc3339(), task_id, reason);
        self.append_line("security_violations.log", &line).await
    }

    /// One JSON object per line appended to `logs/attempts.jsonl` (spec §6.3).
    pub async fn log_attempt(&self, entry: &AttemptLogEntry) -> std::io::Result<()> {
        let line = serde_json::to_string(entry)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        self.append_line("attempts.jsonl", &line).await
    }

    /// Human-readable line appended to `logs/gateway.log`.
    pub async fn log_gateway(&self, message: &str) -> std::io::Result<()> {
        let line = format!("{} {}", Utc::now().to_rfc3339(), message);
        self.append_line("gateway.log", &line).await
    }

    /// Writes the checkpoint's current state to `checkpoints/<id>.json`,
    /// overwriting any prior snapshot — a checkpoint's history is its status
    /// transitions in `gateway.log`, not a version chain of its own.
    pub async fn write_checkpoint(&self, checkpoint: &Checkpoint) -> std::io::Result<()> {
        let dir = self.checkpoints_dir();
        tokio::fs::create_dir_all(&dir).await?;
        let path = dir.join(format!("{}.json", checkpoint.checkpoint_id));
        let body = serde_json::to_string_pretty(checkpoint)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        tokio::fs::write(path, body).await
    }

    pub fn checkpoint_path(&self, checkpoint_id: &str) -> PathBuf {
        self.checkpoints_dir().join(format!("{checkpoint_id}.json"))
    }
}

pub fn default_root() -> PathBuf {
    Path::new(".").to_path_buf()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn security_violation_line_contains_task_id_and_reason() {
        let dir = tempfile::tempdir().unwrap();
        let log = AuditLog::new(dir.path());
        log.log_security_violation("task-1", "banned import: os").await.unwrap();
        let content = tokio::fs::read_to_string(dir.path().join("logs/security_violations.log")).await.unwrap();
        assert!(content.contains("task-1"));
        assert!(content.contains("banned import: os"));
    }

    #[tokio::test]
    async fn attempts_are_appended_as_one_json_object_per_line() {
        let dir = tempfile::tempdir().unwrap();
        let log = AuditLog::new(dir.path());
        log.log_attempt(&AttemptLogEntry::registered("t1", "calculation", "tool-1", "0.1.0")).await.unwrap();
        log.log_attempt(&AttemptLogEntry::rejected("t2", "fetch", "AST_SECURITY", "banned call")).await.unwrap();
        let content = tokio::fs::read_to_string(dir.path().join("logs/attempts.jsonl")).await.unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(serde_json::from_str::<serde_json::Value>(lines[0]).is_ok());
        assert!(serde_json::from_str::<serde_json::Value>(lines[1]).is_ok());
    }

    #[tokio::test]
    async fn checkpoint_snapshot_round_trips_as_json() {
        let dir = tempfile::tempdir().unwrap();
        let log = AuditLog::new(dir.path());
        let checkpoint = Checkpoint::pending(serde_json::json!({"tool_name": "calc_rsi"}));
        log.write_checkpoint(&checkpoint).await.unwrap();
        let path = log.checkpoint_path(&checkpoint.checkpoint_id.to_string());
        let content = tokio::fs::read_to_string(path).await.unwrap();
        assert!(content.contains("calc_rsi"));
    }
}
