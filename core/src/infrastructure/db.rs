// Copyright (c) 2026 Toolsmith Contributors
// SPDX-License-Identifier: Apache-2.0
//! PostgreSQL connection pool, wrapped so it can be injected into every
//! `Postgres*Repository` implementation.

use anyhow::Result;
use sqlx::postgres::{PgPool, PgPoolOptions};

#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    pub async fn connect(connection_string: &str) -> Result<Self> {
        let pool = PgPoolOptions::new().max_connections(5).connect(connection_string).await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Applies the schema migrations embedded under `migrations/` at build
    /// time. Safe to call repeatedly; sqlx tracks applied versions in its
    /// own bookkeeping table.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}
