// Copyright (c) 2026 Toolsmith Contributors
// SPDX-License-Identifier: Apache-2.0
//! PostgreSQL-backed [`ToolPatchRepository`].

use async_trait::async_trait;
use sqlx::postgres::PgPool;
use sqlx::Row;

use crate::domain::ids::{PatchId, ToolId};
use crate::domain::patch::ToolPatch;
use crate::domain::repository::{RepositoryError, ToolPatchRepository};

pub struct PostgresToolPatchRepository {
    pool: PgPool,
}

impl PostgresToolPatchRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ToolPatchRepository for PostgresToolPatchRepository {
    async fn insert(&self, patch: &ToolPatch) -> Result<(), RepositoryError> {
        let patch_json = serde_json::to_value(patch)?;
        sqlx::query(
            r#"
            INSERT INTO tool_patches (patch_id, base_tool_id, patch_json)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(patch.patch_id.0)
        .bind(patch.base_tool_id.0)
        .bind(patch_json)
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryError::Database(format!("failed to insert patch: {e}")))?;
        Ok(())
    }

    async fn find_by_base_tool(&self, base_tool_id: ToolId) -> Result<Vec<ToolPatch>, RepositoryError> {
        let rows = sqlx::query("SELECT patch_json FROM tool_patches WHERE base_tool_id = $1")
            .bind(base_tool_id.0)
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter()
            .map(|r| serde_json::from_value(r.get("patch_json")).map_err(RepositoryError::from))
            .collect()
    }

    async fn get(&self, id: PatchId) -> Result<Option<ToolPatch>, RepositoryError> {
        let row = sqlx::query("SELECT patch_json FROM tool_patches WHERE patch_id = $1")
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await?;
        row.map(|r| serde_json::from_value(r.get("patch_json")).map_err(RepositoryError::from))
            .transpose()
    }
}
