// Copyright (c) 2026 Toolsmith Contributors
// SPDX-License-Identifier: Apache-2.0
//! Repository pattern — storage backend abstraction (DDD). Defines
//! pluggable persistence for the Registry's aggregates: in-memory for
//! development/testing, PostgreSQL for production, mirroring the teacher's
//! `domain::repository` factory shape.

use async_trait::async_trait;

use crate::domain::checkpoint::Checkpoint;
use crate::domain::error_report::ErrorReport;
use crate::domain::ids::{CheckpointId, ErrorReportId, PatchId, ToolId, TraceId};
use crate::domain::patch::ToolPatch;
use crate::domain::tool::{Category, ContentHash, Tool};
use crate::domain::trace::ExecutionTrace;

#[derive(Debug, Clone)]
pub enum StorageBackend {
    InMemory,
    PostgreSQL(PostgresConfig),
}

#[derive(Debug, Clone)]
pub struct PostgresConfig {
    pub connection_string: String,
}

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("entity not found: {0}")]
    NotFound(String),
    #[error("database error: {0}")]
    Database(String),
    #[error("serialization error: {0}")]
    Serialization(String),
    #[error("duplicate content hash: {0}")]
    DuplicateContentHash(String),
}

impl From<sqlx::Error> for RepositoryError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => RepositoryError::NotFound("row not found".to_string()),
            _ => RepositoryError::Database(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for RepositoryError {
    fn from(err: serde_json::Error) -> Self {
        RepositoryError::Serialization(err.to_string())
    }
}

/// Filter parameters for [`ToolRepository::list`] and
/// [`ToolRepository::find_by_schema`].
#[derive(Debug, Clone, Default)]
pub struct ToolFilter {
    pub category: Option<Category>,
    pub indicator: Option<String>,
    pub data_type: Option<String>,
}

#[async_trait]
pub trait ToolRepository: Send + Sync {
    /// Insert a new tool row. Rejects duplicate `content_hash` by returning
    /// `RepositoryError::DuplicateContentHash` — the caller (RegistryService)
    /// is expected to fetch and return the existing tool instead.
    async fn insert(&self, tool: &Tool) -> Result<(), RepositoryError>;

    async fn get_by_id(&self, id: ToolId) -> Result<Option<Tool>, RepositoryError>;
    async fn get_by_name(&self, name: &str) -> Result<Option<Tool>, RepositoryError>;
    async fn get_by_hash(&self, hash: &ContentHash) -> Result<Option<Tool>, RepositoryError>;

    /// Most-recent-first list of every version ever registered under `name`,
    /// used to compute the next MINOR/PATCH bump.
    async fn list_versions(&self, name: &str) -> Result<Vec<Tool>, RepositoryError>;

    /// First matching tool with status != Failed; ties broken by most recent
    /// registration (spec §4.2).
    async fn find_by_schema(&self, filter: &ToolFilter) -> Result<Option<Tool>, RepositoryError>;

    async fn list(&self, filter: &ToolFilter) -> Result<Vec<Tool>, RepositoryError>;

    async fn update_schema_tags(
        &self,
        id: ToolId,
        tags: crate::domain::tool::SchemaTags,
    ) -> Result<(), RepositoryError>;

    async fn mark_status(&self, id: ToolId, status: crate::domain::tool::ToolStatus) -> Result<(), RepositoryError>;
}

#[async_trait]
pub trait ExecutionTraceRepository: Send + Sync {
    async fn insert(&self, trace: &ExecutionTrace) -> Result<(), RepositoryError>;
    async fn get(&self, id: TraceId) -> Result<Option<ExecutionTrace>, RepositoryError>;
    async fn find_by_tool(&self, tool_id: ToolId) -> Result<Vec<ExecutionTrace>, RepositoryError>;
}

#[async_trait]
pub trait ErrorReportRepository: Send + Sync {
    async fn insert(&self, report: &ErrorReport) -> Result<(), RepositoryError>;
    async fn get(&self, id: ErrorReportId) -> Result<Option<ErrorReport>, RepositoryError>;
}

#[async_trait]
pub trait ToolPatchRepository: Send + Sync {
    async fn insert(&self, patch: &ToolPatch) -> Result<(), RepositoryError>;
    async fn find_by_base_tool(&self, base_tool_id: ToolId) -> Result<Vec<ToolPatch>, RepositoryError>;
    async fn get(&self, id: PatchId) -> Result<Option<ToolPatch>, RepositoryError>;
}

#[async_trait]
pub trait CheckpointRepository: Send + Sync {
    async fn insert(&self, checkpoint: &Checkpoint) -> Result<(), RepositoryError>;
    async fn mark_complete(&self, id: CheckpointId) -> Result<(), RepositoryError>;
    async fn mark_failed(&self, id: CheckpointId) -> Result<(), RepositoryError>;
    async fn get(&self, id: CheckpointId) -> Result<Option<Checkpoint>, RepositoryError>;
}
