// Copyright (c) 2026 Toolsmith Contributors
// SPDX-License-Identifier: Apache-2.0
//! PostgreSQL-backed [`CheckpointRepository`].

use async_trait::async_trait;
use sqlx::postgres::PgPool;
use sqlx::Row;

use crate::domain::checkpoint::{Checkpoint, CheckpointStatus};
use crate::domain::ids::CheckpointId;
use crate::domain::repository::{CheckpointRepository, RepositoryError};

pub struct PostgresCheckpointRepository {
    pool: PgPool,
}

impl PostgresCheckpointRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn set_status(&self, id: CheckpointId, status: CheckpointStatus) -> Result<(), RepositoryError> {
        let rows_affected = sqlx::query("UPDATE checkpoints SET status = $1 WHERE checkpoint_id = $2")
            .bind(format!("{status:?}"))
            .bind(id.0)
            .execute(&self.pool)
            .await
            .map_err(|e| RepositoryError::Database(e.to_string()))?
            .rows_affected();
        if rows_affected == 0 {
            return Err(RepositoryError::NotFound(id.to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl CheckpointRepository for PostgresCheckpointRepository {
    async fn insert(&self, checkpoint: &Checkpoint) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO checkpoints (checkpoint_id, status, context, created_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(checkpoint.checkpoint_id.0)
        .bind(format!("{:?}", checkpoint.status))
        .bind(&checkpoint.context)
        .bind(checkpoint.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryError::Database(format!("failed to insert checkpoint: {e}")))?;
        Ok(())
    }

    async fn mark_complete(&self, id: CheckpointId) -> Result<(), RepositoryError> {
        self.set_status(id, CheckpointStatus::Complete).await
    }

    async fn mark_failed(&self, id: CheckpointId) -> Result<(), RepositoryError> {
        self.set_status(id, CheckpointStatus::Failed).await
    }

    async fn get(&self, id: CheckpointId) -> Result<Option<Checkpoint>, RepositoryError> {
        let row = sqlx::query(
            "SELECT checkpoint_id, status, context, created_at FROM checkpoints WHERE checkpoint_id = $1",
        )
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| {
            let status_str: String = r.get("status");
            let status = match status_str.as_str() {
                "Complete" => CheckpointStatus::Complete,
                "Failed" => CheckpointStatus::Failed,
                _ => CheckpointStatus::Pending,
            };
            Ok(Checkpoint {
                checkpoint_id: CheckpointId(r.get("checkpoint_id")),
                created_at: r.get("created_at"),
                status,
                context: r.get("context"),
            })
        })
        .transpose()
    }
}
