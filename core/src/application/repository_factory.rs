// Copyright (c) 2026 Toolsmith Contributors
// SPDX-License-Identifier: Apache-2.0
//! Backend-switched repository construction, mirroring the teacher's
//! `create_*_repository(backend, pool) -> Arc<dyn *Repository>` factory
//! shape so callers never branch on `StorageBackend` themselves.

use std::sync::Arc;

use sqlx::PgPool;

use crate::domain::repository::{
    CheckpointRepository, ErrorReportRepository, ExecutionTraceRepository, StorageBackend,
    ToolPatchRepository, ToolRepository,
};
use crate::infrastructure::repositories::{
    InMemoryCheckpointRepository, InMemoryErrorReportRepository, InMemoryExecutionTraceRepository,
    InMemoryToolPatchRepository, InMemoryToolRepository, PostgresCheckpointRepository,
    PostgresErrorReportRepository, PostgresExecutionTraceRepository, PostgresToolPatchRepository,
    PostgresToolRepository,
};

pub fn create_tool_repository(backend: &StorageBackend, pool: Option<PgPool>) -> Arc<dyn ToolRepository> {
    match backend {
        StorageBackend::InMemory => Arc::new(InMemoryToolRepository::new()),
        StorageBackend::PostgreSQL(_) => {
            Arc::new(PostgresToolRepository::new(pool.expect("pool required for PostgreSQL backend")))
        }
    }
}

pub fn create_trace_repository(backend: &StorageBackend, pool: Option<PgPool>) -> Arc<dyn ExecutionTraceRepository> {
    match backend {
        StorageBackend::InMemory => Arc::new(InMemoryExecutionTraceRepository::new()),
        StorageBackend::PostgreSQL(_) => {
            Arc::new(PostgresExecutionTraceRepository::new(pool.expect("pool required for PostgreSQL backend")))
        }
    }
}

pub fn create_error_report_repository(backend: &StorageBackend, pool: Option<PgPool>) -> Arc<dyn ErrorReportRepository> {
    match backend {
        StorageBackend::InMemory => Arc::new(InMemoryErrorReportRepository::new()),
        StorageBackend::PostgreSQL(_) => {
            Arc::new(PostgresErrorReportRepository::new(pool.expect("pool required for PostgreSQL backend")))
        }
    }
}

pub fn create_patch_repository(backend: &StorageBackend, pool: Option<PgPool>) -> Arc<dyn ToolPatchRepository> {
    match backend {
        StorageBackend::InMemory => Arc::new(InMemoryToolPatchRepository::new()),
        StorageBackend::PostgreSQL(_) => {
            Arc::new(PostgresToolPatchRepository::new(pool.expect("pool required for PostgreSQL backend")))
        }
    }
}

pub fn create_checkpoint_repository(backend: &StorageBackend, pool: Option<PgPool>) -> Arc<dyn CheckpointRepository> {
    match backend {
        StorageBackend::InMemory => Arc::new(InMemoryCheckpointRepository::new()),
        StorageBackend::PostgreSQL(_) => {
            Arc::new(PostgresCheckpointRepository::new(pool.expect("pool required for PostgreSQL backend")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_memory_backend_never_requires_a_pool() {
        let repo = create_tool_repository(&StorageBackend::InMemory, None);
        drop(repo);
    }
}
