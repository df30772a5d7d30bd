// Copyright (c) 2026 Toolsmith Contributors
// SPDX-License-Identifier: Apache-2.0
//! Repository implementations.
//!
//! ## PostgreSQL
//!
//! Production-ready implementations backed by PostgreSQL, each storing its
//! aggregate's full JSON representation alongside queryable columns used by
//! the trait's filter/lookup methods.
//!
//! ## In-memory
//!
//! `RwLock<HashMap<..>>`-backed implementations for tests, the default
//! `StorageBackend::InMemory` configuration, and local development.

pub mod in_memory;
pub mod postgres_checkpoint;
pub mod postgres_error_report;
pub mod postgres_patch;
pub mod postgres_tool;
pub mod postgres_trace;

pub use in_memory::{
    InMemoryCheckpointRepository, InMemoryErrorReportRepository, InMemoryExecutionTraceRepository,
    InMemoryToolPatchRepository, InMemoryToolRepository,
};
pub use postgres_checkpoint::PostgresCheckpointRepository;
pub use postgres_error_report::PostgresErrorReportRepository;
pub use postgres_patch::PostgresToolPatchRepository;
pub use postgres_tool::PostgresToolRepository;
pub use postgres_trace::PostgresExecutionTraceRepository;
