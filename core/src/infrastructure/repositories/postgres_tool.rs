// Copyright (c) 2026 Toolsmith Contributors
// SPDX-License-Identifier: Apache-2.0
//! PostgreSQL-backed [`ToolRepository`]. Queryable columns (`name`,
//! `semantic_version`, `content_hash`, `status`, schema-tag projections) sit
//! alongside a `tool_json` blob holding the full aggregate, mirroring the
//! teacher's `manifest_json` pattern so a schema migration never has to
//! touch every field individually.

use async_trait::async_trait;
use sqlx::postgres::PgPool;
use sqlx::Row;

use crate::domain::repository::{RepositoryError, ToolFilter, ToolRepository};
use crate::domain::tool::{ContentHash, SchemaTags, Tool, ToolStatus};
use crate::domain::ids::ToolId;

pub struct PostgresToolRepository {
    pool: PgPool,
}

impl PostgresToolRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn row_to_tool(tool_json: serde_json::Value) -> Result<Tool, RepositoryError> {
        serde_json::from_value(tool_json).map_err(RepositoryError::from)
    }
}

#[async_trait]
impl ToolRepository for PostgresToolRepository {
    async fn insert(&self, tool: &Tool) -> Result<(), RepositoryError> {
        let existing = sqlx::query("SELECT id FROM tools WHERE content_hash = $1")
            .bind(&tool.content_hash.0)
            .fetch_optional(&self.pool)
            .await?;
        if existing.is_some() {
            return Err(RepositoryError::DuplicateContentHash(tool.content_hash.0.clone()));
        }

        let tool_json = serde_json::to_value(tool)?;
        let category = tool.schema_tags.category.map(|c| c.as_str().to_string());

        sqlx::query(
            r#"
            INSERT INTO tools (
                id, name, semantic_version, content_hash, status,
                category, indicator, data_type, tool_json, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(tool.id.0)
        .bind(&tool.name)
        .bind(tool.semantic_version.to_string())
        .bind(&tool.content_hash.0)
        .bind(format!("{:?}", tool.status))
        .bind(category)
        .bind(&tool.schema_tags.indicator)
        .bind(&tool.schema_tags.data_type)
        .bind(tool_json)
        .bind(tool.created_at)
        .bind(tool.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryError::Database(format!("failed to insert tool: {e}")))?;

        Ok(())
    }

    async fn get_by_id(&self, id: ToolId) -> Result<Option<Tool>, RepositoryError> {
        let row = sqlx::query("SELECT tool_json FROM tools WHERE id = $1")
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await?;
        row.map(|r| Self::row_to_tool(r.get("tool_json"))).transpose()
    }

    async fn get_by_name(&self, name: &str) -> Result<Option<Tool>, RepositoryError> {
        let row = sqlx::query(
            "SELECT tool_json FROM tools WHERE name = $1 ORDER BY semantic_version DESC LIMIT 1",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;
        row.map(|r| Self::row_to_tool(r.get("tool_json"))).transpose()
    }

    async fn get_by_hash(&self, hash: &ContentHash) -> Result<Option<Tool>, RepositoryError> {
        let row = sqlx::query("SELECT tool_json FROM tools WHERE content_hash = $1")
            .bind(&hash.0)
            .fetch_optional(&self.pool)
            .await?;
        row.map(|r| Self::row_to_tool(r.get("tool_json"))).transpose()
    }

    async fn list_versions(&self, name: &str) -> Result<Vec<Tool>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT tool_json FROM tools WHERE name = $1 ORDER BY semantic_version DESC",
        )
        .bind(name)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(|r| Self::row_to_tool(r.get("tool_json"))).collect()
    }

    async fn find_by_schema(&self, filter: &ToolFilter) -> Result<Option<Tool>, RepositoryError> {
        let mut query = String::from("SELECT tool_json FROM tools WHERE status != 'Failed'");
        if filter.category.is_some() {
            query.push_str(" AND category = $1");
        }
        if filter.indicator.is_some() {
            query.push_str(" AND indicator = $2");
        }
        if filter.data_type.is_some() {
            query.push_str(" AND data_type = $3");
        }
        query.push_str(" ORDER BY created_at DESC LIMIT 1");

        let mut q = sqlx::query(&query);
        if let Some(category) = filter.category {
            q = q.bind(category.as_str().to_string());
        }
        if let Some(indicator) = &filter.indicator {
            q = q.bind(indicator.clone());
        }
        if let Some(data_type) = &filter.data_type {
            q = q.bind(data_type.clone());
        }

        let row = q.fetch_optional(&self.pool).await?;
        row.map(|r| Self::row_to_tool(r.get("tool_json"))).transpose()
    }

    async fn list(&self, filter: &ToolFilter) -> Result<Vec<Tool>, RepositoryError> {
        let mut query = String::from("SELECT tool_json FROM tools WHERE TRUE");
        if filter.category.is_some() {
            query.push_str(" AND category = $1");
        }
        if filter.indicator.is_some() {
            query.push_str(" AND indicator = $2");
        }
        if filter.data_type.is_some() {
            query.push_str(" AND data_type = $3");
        }

        let mut q = sqlx::query(&query);
        if let Some(category) = filter.category {
            q = q.bind(category.as_str().to_string());
        }
        if let Some(indicator) = &filter.indicator {
            q = q.bind(indicator.clone());
        }
        if let Some(data_type) = &filter.data_type {
            q = q.bind(data_type.clone());
        }

        let rows = q.fetch_all(&self.pool).await?;
        rows.into_iter().map(|r| Self::row_to_tool(r.get("tool_json"))).collect()
    }

    async fn update_schema_tags(&self, id: ToolId, tags: SchemaTags) -> Result<(), RepositoryError> {
        let tool = self.get_by_id(id).await?.ok_or_else(|| RepositoryError::NotFound(id.to_string()))?;
        let mut updated = tool;
        updated.schema_tags = tags.clone();
        updated.updated_at = chrono::Utc::now();
        let tool_json = serde_json::to_value(&updated)?;

        sqlx::query(
            r#"
            UPDATE tools
            SET category = $1, indicator = $2, data_type = $3, tool_json = $4, updated_at = $5
            WHERE id = $6
            "#,
        )
        .bind(tags.category.map(|c| c.as_str().to_string()))
        .bind(&tags.indicator)
        .bind(&tags.data_type)
        .bind(tool_json)
        .bind(updated.updated_at)
        .bind(id.0)
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryError::Database(e.to_string()))?;

        Ok(())
    }

    async fn mark_status(&self, id: ToolId, status: ToolStatus) -> Result<(), RepositoryError> {
        let tool = self.get_by_id(id).await?.ok_or_else(|| RepositoryError::NotFound(id.to_string()))?;
        let mut updated = tool;
        updated.status = status;
        updated.updated_at = chrono::Utc::now();
        let tool_json = serde_json::to_value(&updated)?;

        sqlx::query("UPDATE tools SET status = $1, tool_json = $2, updated_at = $3 WHERE id = $4")
            .bind(format!("{status:?}"))
            .bind(tool_json)
            .bind(updated.updated_at)
            .bind(id.0)
            .execute(&self.pool)
            .await
            .map_err(|e| RepositoryError::Database(e.to_string()))?;

        Ok(())
    }
}
