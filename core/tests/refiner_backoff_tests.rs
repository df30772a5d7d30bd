// Copyright (c) 2026 Toolsmith Contributors
// SPDX-License-Identifier: Apache-2.0
//! The Refiner never retries a SECURITY-kind failure (spec §8 invariant #5)
//! and the attempts counter never exceeds `max_attempts`.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;

use toolsmith_core::application::executor_service::ExecutorService;
use toolsmith_core::application::gateway::Gateway;
use toolsmith_core::application::refiner::Refiner;
use toolsmith_core::application::registry_service::RegistryService;
use toolsmith_core::application::verifier::{StageOutcome, StageResult, VerificationReport, Verifier};
use toolsmith_core::domain::constraints::Constraints;
use toolsmith_core::domain::data_provider::{DataProvider, DataProviderError, FinancialInfo, OhlcvTable, Quote};
use toolsmith_core::domain::ids::ToolId;
use toolsmith_core::domain::llm::{GenerationRequest, LlmError, LlmProvider, LlmResponse};
use toolsmith_core::domain::repository::CheckpointRepository;
use toolsmith_core::domain::tool::{ArgsSchema, Capability, Category, VerificationStage};
use toolsmith_core::infrastructure::audit_log::AuditLog;
use toolsmith_core::infrastructure::repositories::{InMemoryCheckpointRepository, InMemoryToolPatchRepository, InMemoryToolRepository};
use toolsmith_core::infrastructure::sandbox::Sandbox;

struct UnreachableProvider;

#[async_trait]
impl DataProvider for UnreachableProvider {
    async fn get_historical(&self, _symbol: &str, _start: NaiveDate, _end: NaiveDate) -> Result<OhlcvTable, DataProviderError> {
        Err(DataProviderError::Unsupported("unused".into()))
    }
    async fn get_quote(&self, _symbol: &str) -> Result<Quote, DataProviderError> {
        Err(DataProviderError::Unsupported("unused".into()))
    }
    async fn get_financial_info(&self, _symbol: &str) -> Result<FinancialInfo, DataProviderError> {
        Err(DataProviderError::Unsupported("unused".into()))
    }
}

struct CountingLlmProvider {
    calls: AtomicUsize,
}

#[async_trait]
impl LlmProvider for CountingLlmProvider {
    async fn generate(&self, _request: GenerationRequest<'_>) -> Result<LlmResponse, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(LlmResponse {
            reasoning_trace: "retry attempt".to_string(),
            code_payload: Some("import os\ndef calc_ma(prices):\n    return os.getpid()\n".to_string()),
            text_response: "still banned".to_string(),
            raw: String::new(),
        })
    }
    fn provider_name(&self) -> &str {
        "counting-mock"
    }
    fn model_name(&self) -> &str {
        "counting-mock-v1"
    }
}

fn security_report() -> VerificationReport {
    VerificationReport {
        final_stage: None,
        stages: vec![StageResult {
            stage: VerificationStage::AstSecurity,
            outcome: StageOutcome::Fail,
            message: "banned module import: 'os' is in ALWAYS_BANNED".to_string(),
            duration_ms: 1,
        }],
    }
}

#[tokio::test]
async fn refiner_never_retries_a_security_failure() {
    let dir = tempfile::tempdir().unwrap();

    let executor = Arc::new(ExecutorService::new(Sandbox::default_executable()));
    let verifier = Arc::new(Verifier::new(executor, Arc::new(Constraints::default()), Arc::new(UnreachableProvider)));
    let registry = Arc::new(RegistryService::new(Arc::new(InMemoryToolRepository::new()), dir.path()));
    let checkpoints: Arc<dyn CheckpointRepository> = Arc::new(InMemoryCheckpointRepository::new());
    let audit = Arc::new(AuditLog::new(dir.path()));
    let gateway = Arc::new(Gateway::new(verifier, registry, checkpoints, audit));

    let llm = Arc::new(CountingLlmProvider { calls: AtomicUsize::new(0) });
    let patches = Arc::new(InMemoryToolPatchRepository::new());
    let refiner = Refiner::new(gateway, llm.clone(), patches, 3);

    let result = refiner
        .refine(
            ToolId::new(),
            "import os\ndef calc_ma(prices):\n    return os.getpid()\n",
            &security_report(),
            "calculate moving average",
            Category::Calculation,
            "task-security-refine",
            "calc_ma",
            ArgsSchema::default(),
            BTreeSet::from([Capability::CalcOnly]),
            None,
        )
        .await;

    assert!(result.is_none());
    assert_eq!(llm.calls.load(Ordering::SeqCst), 0, "the language model must never be called for an unfixable SECURITY failure");
}
