// Copyright (c) 2026 Toolsmith Contributors
// SPDX-License-Identifier: Apache-2.0
//! Simple direct-extraction patterns short-circuit tool synthesis entirely
//! (spec §4.9): "latest close" style queries are answered inline from the
//! fetched OHLCV table, never reaching the Synthesizer.

use std::sync::Arc;

use toolsmith_core::application::executor_service::ExecutorService;
use toolsmith_core::application::gateway::Gateway;
use toolsmith_core::application::refiner::Refiner;
use toolsmith_core::application::registry_service::RegistryService;
use toolsmith_core::application::synthesizer::Synthesizer;
use toolsmith_core::application::task_executor::TaskExecutor;
use toolsmith_core::application::verifier::Verifier;
use toolsmith_core::domain::constraints::Constraints;
use toolsmith_core::domain::data_provider::DataProvider;
use toolsmith_core::domain::errors::TaskStatus;
use toolsmith_core::domain::repository::{CheckpointRepository, ToolPatchRepository, ToolRepository};
use toolsmith_core::infrastructure::audit_log::AuditLog;
use toolsmith_core::infrastructure::data_provider::sample::DeterministicSampleProvider;
use toolsmith_core::infrastructure::llm::mock::MockLlmProvider;
use toolsmith_core::infrastructure::repositories::{InMemoryCheckpointRepository, InMemoryToolPatchRepository, InMemoryToolRepository};
use toolsmith_core::infrastructure::sandbox::Sandbox;

fn build_task_executor(dir: &std::path::Path) -> TaskExecutor {
    let data_provider: Arc<dyn DataProvider> = Arc::new(DeterministicSampleProvider::new());

    let executor = Arc::new(ExecutorService::new(Sandbox::default_executable()));
    let verifier = Arc::new(Verifier::new(executor.clone(), Arc::new(Constraints::default()), data_provider.clone()));

    let tool_repo: Arc<dyn ToolRepository> = Arc::new(InMemoryToolRepository::new());
    let registry = Arc::new(RegistryService::new(tool_repo.clone(), dir));
    let checkpoints: Arc<dyn CheckpointRepository> = Arc::new(InMemoryCheckpointRepository::new());
    let audit = Arc::new(AuditLog::new(dir));
    let gateway = Arc::new(Gateway::new(verifier, registry, checkpoints, audit));

    let llm = Arc::new(MockLlmProvider);
    let patches: Arc<dyn ToolPatchRepository> = Arc::new(InMemoryToolPatchRepository::new());
    let refiner = Arc::new(Refiner::new(gateway.clone(), llm.clone(), patches, 3));
    let synthesizer = Arc::new(Synthesizer::new(gateway, llm, refiner, tool_repo, 3));

    TaskExecutor::new(data_provider, executor, synthesizer)
}

#[tokio::test]
async fn latest_close_query_is_answered_without_synthesis() {
    let dir = tempfile::tempdir().unwrap();
    let task_executor = build_task_executor(dir.path());

    let result = task_executor.run("What is the latest close for AAPL?", "task-direct-1").await;

    assert_eq!(result.status, TaskStatus::Ok);
    assert!(result.value.is_some());
}

#[tokio::test]
async fn unsupported_query_without_a_symbol_returns_typed_error_not_a_panic() {
    let dir = tempfile::tempdir().unwrap();
    let task_executor = build_task_executor(dir.path());

    let result = task_executor.run("please help me understand investing", "task-no-symbol").await;

    assert_eq!(result.status, TaskStatus::Error);
    assert!(result.message.is_some());
}
