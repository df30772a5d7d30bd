// Copyright (c) 2026 Toolsmith Contributors
// SPDX-License-Identifier: Apache-2.0
//! PostgreSQL-backed [`ErrorReportRepository`].

use async_trait::async_trait;
use sqlx::postgres::PgPool;
use sqlx::Row;

use crate::domain::error_report::ErrorReport;
use crate::domain::ids::ErrorReportId;
use crate::domain::repository::{ErrorReportRepository, RepositoryError};

pub struct PostgresErrorReportRepository {
    pool: PgPool,
}

impl PostgresErrorReportRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ErrorReportRepository for PostgresErrorReportRepository {
    async fn insert(&self, report: &ErrorReport) -> Result<(), RepositoryError> {
        let report_json = serde_json::to_value(report)?;
        sqlx::query(
            r#"
            INSERT INTO error_reports (error_report_id, trace_id, report_json, created_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(report.error_report_id.0)
        .bind(report.trace_id.0)
        .bind(report_json)
        .bind(report.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryError::Database(format!("failed to insert error report: {e}")))?;
        Ok(())
    }

    async fn get(&self, id: ErrorReportId) -> Result<Option<ErrorReport>, RepositoryError> {
        let row = sqlx::query("SELECT report_json FROM error_reports WHERE error_report_id = $1")
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await?;
        row.map(|r| serde_json::from_value(r.get("report_json")).map_err(RepositoryError::from))
            .transpose()
    }
}
