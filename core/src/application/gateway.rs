// Copyright (c) 2026 Toolsmith Contributors
// SPDX-License-Identifier: Apache-2.0
//! Gateway (C7) — the single enforcement point for registration (spec §4.6).
//! Synthesizer and Refiner hold a `Gateway` handle, never a repository or
//! `RegistryService` handle directly; no registration path bypasses it.

use std::collections::BTreeSet;
use std::sync::Arc;

use serde_json::json;

use crate::domain::checkpoint::{Checkpoint, CheckpointStatus};
use crate::domain::contract::Contract;
use crate::domain::repository::CheckpointRepository;
use crate::domain::tool::{ArgsSchema, Capability, Category, SchemaTags, Tool};

use super::registry_service::{RegistryError, RegistryService, ToolRegistration};
use super::verifier::{StageOutcome, VerificationReport, Verifier};

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error("checkpoint repository error: {0}")]
    Checkpoint(#[from] crate::domain::repository::RepositoryError),
}

pub struct SubmitOutcome {
    pub ok: bool,
    pub tool: Option<Tool>,
    pub report: VerificationReport,
}

pub struct Gateway {
    verifier: Arc<Verifier>,
    registry: Arc<RegistryService>,
    checkpoints: Arc<dyn CheckpointRepository>,
    audit: Arc<crate::infrastructure::audit_log::AuditLog>,
}

impl Gateway {
    pub fn new(
        verifier: Arc<Verifier>,
        registry: Arc<RegistryService>,
        checkpoints: Arc<dyn CheckpointRepository>,
        audit: Arc<crate::infrastructure::audit_log::AuditLog>,
    ) -> Self {
        Self { verifier, registry, checkpoints, audit }
    }

    /// `submit(source, category, task_id, contract?) -> (ok, tool?, report)`
    /// (spec §4.6). Capabilities are inferred from `category` via
    /// `Constraints::allowed_for` at the caller, so the Gateway only takes
    /// the capability set the verifier actually checked against.
    #[allow(clippy::too_many_arguments)]
    pub async fn submit(
        &self,
        source: &str,
        category: Category,
        task_id: &str,
        name: &str,
        args_schema: ArgsSchema,
        capabilities: BTreeSet<Capability>,
        contract: Option<&Contract>,
        patch_of: Option<crate::domain::ids::ToolId>,
    ) -> Result<SubmitOutcome, GatewayError> {
        let checkpoint = Checkpoint::pending(json!({
            "task_id": task_id,
            "name": name,
            "category": category.as_str(),
        }));
        self.checkpoints.insert(&checkpoint).await?;
        let _ = self.audit.write_checkpoint(&checkpoint).await;

        let report = self.verifier.verify(source, category, task_id, contract).await;

        if !report.passed() {
            self.checkpoints.mark_failed(checkpoint.checkpoint_id).await?;
            let message = report.failure_message().unwrap_or("verification failed").to_string();
            let failing_stage = report.stages.iter().find(|s| s.outcome == StageOutcome::Fail).map(|s| s.stage);
            let stage = failing_stage.map(|s| format!("{s:?}")).unwrap_or_default();

            // Spec §7 scopes the security audit log to SECURITY-kind
            // violations; CONTRACT/SELF_TEST/etc. failures are ordinary
            // rejections and belong only in the attempt log.
            if failing_stage == Some(crate::domain::tool::VerificationStage::AstSecurity) {
                let _ = self.audit.log_security_violation(task_id, &message).await;
            }
            let entry = crate::infrastructure::audit_log::AttemptLogEntry::rejected(task_id, category.as_str(), stage, message);
            let _ = self.audit.log_attempt(&entry).await;
            let _ = self.audit.log_gateway(&format!("submit rejected for task {task_id}")).await;

            return Ok(SubmitOutcome { ok: false, tool: None, report });
        }

        let verification_stage = report.final_stage.unwrap_or(crate::domain::tool::VerificationStage::ContractValid);

        let registration = ToolRegistration {
            name: name.to_string(),
            source_text: source.to_string(),
            args_schema,
            capabilities,
            category,
            verification_stage,
            contract_id: contract.map(|c| c.contract_id.clone()),
            patch_of,
        };

        let tool = self.registry.register(registration).await?;
        self.registry
            .update_schema(tool.id, SchemaTags { category: Some(category), ..Default::default() })
            .await?;
        self.checkpoints.mark_complete(checkpoint.checkpoint_id).await?;

        let entry = crate::infrastructure::audit_log::AttemptLogEntry::registered(
            task_id,
            category.as_str(),
            tool.id.to_string(),
            tool.semantic_version.to_string(),
        );
        let _ = self.audit.log_attempt(&entry).await;
        let _ = self.audit.log_gateway(&format!("registered tool {} ({})", tool.name, tool.id)).await;

        Ok(SubmitOutcome { ok: true, tool: Some(tool), report })
    }

    /// `verify_only(…)` — runs the pipeline without registration (spec §4.6).
    pub async fn verify_only(&self, source: &str, category: Category, task_id: &str, contract: Option<&Contract>) -> VerificationReport {
        self.verifier.verify(source, category, task_id, contract).await
    }

    /// Updates a registered tool's schema tags. Routed through the Gateway
    /// even though it is not a registration per se, so the Synthesizer never
    /// holds a direct Registry handle (spec §4.6 "direct Registry writes are
    /// prohibited").
    pub async fn update_schema(&self, tool_id: crate::domain::ids::ToolId, tags: SchemaTags) -> Result<(), GatewayError> {
        Ok(self.registry.update_schema(tool_id, tags).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::data_provider::{DataProvider, DataProviderError, FinancialInfo, OhlcvTable, Quote};
    use crate::domain::constraints::Constraints;
    use crate::infrastructure::repositories::{InMemoryCheckpointRepository, InMemoryToolRepository};
    use crate::infrastructure::sandbox::Sandbox;
    use async_trait::async_trait;
    use chrono::NaiveDate;

    struct NullProvider;

    #[async_trait]
    impl DataProvider for NullProvider {
        async fn get_historical(&self, _symbol: &str, _start: NaiveDate, _end: NaiveDate) -> Result<OhlcvTable, DataProviderError> {
            Err(DataProviderError::Unsupported("not needed".into()))
        }
        async fn get_quote(&self, _symbol: &str) -> Result<Quote, DataProviderError> {
            Err(DataProviderError::Unsupported("not needed".into()))
        }
        async fn get_financial_info(&self, _symbol: &str) -> Result<FinancialInfo, DataProviderError> {
            Err(DataProviderError::Unsupported("not needed".into()))
        }
    }

    fn make_gateway(dir: &std::path::Path) -> (Gateway, Arc<RegistryService>) {
        let executor = Arc::new(super::super::executor_service::ExecutorService::new(Sandbox::default_executable()));
        let verifier = Arc::new(Verifier::new(executor, Arc::new(Constraints::default()), Arc::new(NullProvider)));
        let registry = Arc::new(RegistryService::new(Arc::new(InMemoryToolRepository::new()), dir));
        let checkpoints: Arc<dyn CheckpointRepository> = Arc::new(InMemoryCheckpointRepository::new());
        let audit = Arc::new(crate::infrastructure::audit_log::AuditLog::new(dir));
        (Gateway::new(verifier, registry.clone(), checkpoints, audit), registry)
    }

    #[tokio::test]
    async fn rejected_submission_never_creates_a_tool_row() {
        let dir = tempfile::tempdir().unwrap();
        let (gateway, registry) = make_gateway(dir.path());
        let outcome = gateway
            .submit("import os\n", Category::Calculation, "task-1", "bad_tool", ArgsSchema::default(), BTreeSet::from([Capability::CalcOnly]), None, None)
            .await
            .unwrap();
        assert!(!outcome.ok);
        assert!(outcome.tool.is_none());
        assert!(registry.get_by_name("bad_tool").await.unwrap().is_none());
    }
}
