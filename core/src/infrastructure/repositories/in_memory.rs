// Copyright (c) 2026 Toolsmith Contributors
// SPDX-License-Identifier: Apache-2.0
//! In-memory repository implementations — used for development, tests, and
//! the default `StorageBackend::InMemory` configuration (spec §5).

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;

use crate::domain::checkpoint::{Checkpoint, CheckpointStatus};
use crate::domain::error_report::ErrorReport;
use crate::domain::ids::{CheckpointId, ErrorReportId, PatchId, ToolId, TraceId};
use crate::domain::patch::ToolPatch;
use crate::domain::repository::{
    CheckpointRepository, ErrorReportRepository, ExecutionTraceRepository, RepositoryError,
    ToolFilter, ToolPatchRepository, ToolRepository,
};
use crate::domain::tool::{ContentHash, SchemaTags, Tool, ToolStatus};
use crate::domain::trace::ExecutionTrace;

#[derive(Clone, Default)]
pub struct InMemoryToolRepository {
    tools: Arc<RwLock<HashMap<ToolId, Tool>>>,
}

impl InMemoryToolRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ToolRepository for InMemoryToolRepository {
    async fn insert(&self, tool: &Tool) -> Result<(), RepositoryError> {
        let mut tools = self.tools.write().unwrap();
        if tools.values().any(|t| t.content_hash == tool.content_hash) {
            return Err(RepositoryError::DuplicateContentHash(tool.content_hash.0.clone()));
        }
        tools.insert(tool.id, tool.clone());
        Ok(())
    }

    async fn get_by_id(&self, id: ToolId) -> Result<Option<Tool>, RepositoryError> {
        Ok(self.tools.read().unwrap().get(&id).cloned())
    }

    async fn get_by_name(&self, name: &str) -> Result<Option<Tool>, RepositoryError> {
        let tools = self.tools.read().unwrap();
        Ok(tools
            .values()
            .filter(|t| t.name == name)
            .max_by_key(|t| t.semantic_version)
            .cloned())
    }

    async fn get_by_hash(&self, hash: &ContentHash) -> Result<Option<Tool>, RepositoryError> {
        Ok(self.tools.read().unwrap().values().find(|t| &t.content_hash == hash).cloned())
    }

    async fn list_versions(&self, name: &str) -> Result<Vec<Tool>, RepositoryError> {
        let tools = self.tools.read().unwrap();
        let mut versions: Vec<Tool> = tools.values().filter(|t| t.name == name).cloned().collect();
        versions.sort_by(|a, b| b.semantic_version.cmp(&a.semantic_version));
        Ok(versions)
    }

    async fn find_by_schema(&self, filter: &ToolFilter) -> Result<Option<Tool>, RepositoryError> {
        let tools = self.tools.read().unwrap();
        let mut matches: Vec<&Tool> = tools
            .values()
            .filter(|t| t.status != ToolStatus::Failed)
            .filter(|t| matches_filter(t, filter))
            .collect();
        matches.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(matches.into_iter().next().cloned())
    }

    async fn list(&self, filter: &ToolFilter) -> Result<Vec<Tool>, RepositoryError> {
        let tools = self.tools.read().unwrap();
        Ok(tools.values().filter(|t| matches_filter(t, filter)).cloned().collect())
    }

    async fn update_schema_tags(&self, id: ToolId, tags: SchemaTags) -> Result<(), RepositoryError> {
        let mut tools = self.tools.write().unwrap();
        let tool = tools.get_mut(&id).ok_or_else(|| RepositoryError::NotFound(id.to_string()))?;
        tool.schema_tags = tags;
        tool.updated_at = chrono::Utc::now();
        Ok(())
    }

    async fn mark_status(&self, id: ToolId, status: ToolStatus) -> Result<(), RepositoryError> {
        let mut tools = self.tools.write().unwrap();
        let tool = tools.get_mut(&id).ok_or_else(|| RepositoryError::NotFound(id.to_string()))?;
        tool.status = status;
        tool.updated_at = chrono::Utc::now();
        Ok(())
    }
}

fn matches_filter(tool: &Tool, filter: &ToolFilter) -> bool {
    if let Some(category) = filter.category {
        if tool.schema_tags.category != Some(category) {
            return false;
        }
    }
    if let Some(indicator) = &filter.indicator {
        if tool.schema_tags.indicator.as_deref() != Some(indicator.as_str()) {
            return false;
        }
    }
    if let Some(data_type) = &filter.data_type {
        if tool.schema_tags.data_type.as_deref() != Some(data_type.as_str()) {
            return false;
        }
    }
    true
}

#[derive(Clone, Default)]
pub struct InMemoryExecutionTraceRepository {
    traces: Arc<RwLock<HashMap<TraceId, ExecutionTrace>>>,
}

impl InMemoryExecutionTraceRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ExecutionTraceRepository for InMemoryExecutionTraceRepository {
    async fn insert(&self, trace: &ExecutionTrace) -> Result<(), RepositoryError> {
        self.traces.write().unwrap().insert(trace.trace_id, trace.clone());
        Ok(())
    }

    async fn get(&self, id: TraceId) -> Result<Option<ExecutionTrace>, RepositoryError> {
        Ok(self.traces.read().unwrap().get(&id).cloned())
    }

    async fn find_by_tool(&self, tool_id: ToolId) -> Result<Vec<ExecutionTrace>, RepositoryError> {
        let traces = self.traces.read().unwrap();
        Ok(traces.values().filter(|t| t.tool_id == Some(tool_id)).cloned().collect())
    }
}

#[derive(Clone, Default)]
pub struct InMemoryErrorReportRepository {
    reports: Arc<RwLock<HashMap<ErrorReportId, ErrorReport>>>,
}

impl InMemoryErrorReportRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ErrorReportRepository for InMemoryErrorReportRepository {
    async fn insert(&self, report: &ErrorReport) -> Result<(), RepositoryError> {
        self.reports.write().unwrap().insert(report.error_report_id, report.clone());
        Ok(())
    }

    async fn get(&self, id: ErrorReportId) -> Result<Option<ErrorReport>, RepositoryError> {
        Ok(self.reports.read().unwrap().get(&id).cloned())
    }
}

#[derive(Clone, Default)]
pub struct InMemoryToolPatchRepository {
    patches: Arc<RwLock<HashMap<PatchId, ToolPatch>>>,
}

impl InMemoryToolPatchRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ToolPatchRepository for InMemoryToolPatchRepository {
    async fn insert(&self, patch: &ToolPatch) -> Result<(), RepositoryError> {
        self.patches.write().unwrap().insert(patch.patch_id, patch.clone());
        Ok(())
    }

    async fn find_by_base_tool(&self, base_tool_id: ToolId) -> Result<Vec<ToolPatch>, RepositoryError> {
        let patches = self.patches.read().unwrap();
        Ok(patches.values().filter(|p| p.base_tool_id == base_tool_id).cloned().collect())
    }

    async fn get(&self, id: PatchId) -> Result<Option<ToolPatch>, RepositoryError> {
        Ok(self.patches.read().unwrap().get(&id).cloned())
    }
}

#[derive(Clone, Default)]
pub struct InMemoryCheckpointRepository {
    checkpoints: Arc<RwLock<HashMap<CheckpointId, Checkpoint>>>,
}

impl InMemoryCheckpointRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CheckpointRepository for InMemoryCheckpointRepository {
    async fn insert(&self, checkpoint: &Checkpoint) -> Result<(), RepositoryError> {
        self.checkpoints.write().unwrap().insert(checkpoint.checkpoint_id, checkpoint.clone());
        Ok(())
    }

    async fn mark_complete(&self, id: CheckpointId) -> Result<(), RepositoryError> {
        let mut checkpoints = self.checkpoints.write().unwrap();
        let checkpoint = checkpoints.get_mut(&id).ok_or_else(|| RepositoryError::NotFound(id.to_string()))?;
        checkpoint.status = CheckpointStatus::Complete;
        Ok(())
    }

    async fn mark_failed(&self, id: CheckpointId) -> Result<(), RepositoryError> {
        let mut checkpoints = self.checkpoints.write().unwrap();
        let checkpoint = checkpoints.get_mut(&id).ok_or_else(|| RepositoryError::NotFound(id.to_string()))?;
        checkpoint.status = CheckpointStatus::Failed;
        Ok(())
    }

    async fn get(&self, id: CheckpointId) -> Result<Option<Checkpoint>, RepositoryError> {
        Ok(self.checkpoints.read().unwrap().get(&id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::tool::{ArgsSchema, Capability, SchemaTags, SemanticVersion, VerificationStage};
    use std::collections::BTreeSet;

    fn sample_tool(name: &str, source: &str) -> Tool {
        let now = chrono::Utc::now();
        Tool {
            id: ToolId::new(),
            name: name.to_string(),
            semantic_version: SemanticVersion::INITIAL,
            source_text: source.to_string(),
            file_path: format!("tools/{name}.py"),
            content_hash: ContentHash::compute(source),
            args_schema: ArgsSchema::new(),
            capabilities: BTreeSet::from([Capability::CalcOnly]),
            status: ToolStatus::Provisional,
            verification_stage: VerificationStage::AstSecurity,
            schema_tags: SchemaTags::default(),
            contract_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn insert_rejects_duplicate_content_hash() {
        let repo = InMemoryToolRepository::new();
        let a = sample_tool("calc_ma", "def f(): return 1");
        let b = sample_tool("calc_ma_alias", "def f(): return 1");
        repo.insert(&a).await.unwrap();
        let err = repo.insert(&b).await.unwrap_err();
        assert!(matches!(err, RepositoryError::DuplicateContentHash(_)));
    }

    #[tokio::test]
    async fn get_by_name_returns_highest_version() {
        let repo = InMemoryToolRepository::new();
        let mut v1 = sample_tool("calc_ma", "def f(): return 1");
        let mut v2 = sample_tool("calc_ma", "def f(): return 2");
        v2.semantic_version = v1.semantic_version.bump_patch();
        repo.insert(&v1).await.unwrap();
        repo.insert(&v2).await.unwrap();
        let found = repo.get_by_name("calc_ma").await.unwrap().unwrap();
        assert_eq!(found.semantic_version, v2.semantic_version);
        let _ = &mut v1;
    }
}
