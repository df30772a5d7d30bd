// Copyright (c) 2026 Toolsmith Contributors
// SPDX-License-Identifier: Apache-2.0
//! PostgreSQL-backed [`ExecutionTraceRepository`].

use async_trait::async_trait;
use sqlx::postgres::PgPool;
use sqlx::Row;

use crate::domain::ids::{ToolId, TraceId};
use crate::domain::repository::{ExecutionTraceRepository, RepositoryError};
use crate::domain::trace::ExecutionTrace;

pub struct PostgresExecutionTraceRepository {
    pool: PgPool,
}

impl PostgresExecutionTraceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ExecutionTraceRepository for PostgresExecutionTraceRepository {
    async fn insert(&self, trace: &ExecutionTrace) -> Result<(), RepositoryError> {
        let trace_json = serde_json::to_value(trace)?;
        sqlx::query(
            r#"
            INSERT INTO execution_traces (trace_id, tool_id, trace_json, created_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(trace.trace_id.0)
        .bind(trace.tool_id.map(|t| t.0))
        .bind(trace_json)
        .bind(trace.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryError::Database(format!("failed to insert trace: {e}")))?;
        Ok(())
    }

    async fn get(&self, id: TraceId) -> Result<Option<ExecutionTrace>, RepositoryError> {
        let row = sqlx::query("SELECT trace_json FROM execution_traces WHERE trace_id = $1")
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await?;
        row.map(|r| serde_json::from_value(r.get("trace_json")).map_err(RepositoryError::from))
            .transpose()
    }

    async fn find_by_tool(&self, tool_id: ToolId) -> Result<Vec<ExecutionTrace>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT trace_json FROM execution_traces WHERE tool_id = $1 ORDER BY created_at DESC",
        )
        .bind(tool_id.0)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter()
            .map(|r| serde_json::from_value(r.get("trace_json")).map_err(RepositoryError::from))
            .collect()
    }
}
