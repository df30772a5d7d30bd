// Copyright (c) 2026 Toolsmith Contributors
// SPDX-License-Identifier: Apache-2.0
//! Verifier (C6) — the four-stage pipeline AST_SECURITY -> SELF_TEST ->
//! CONTRACT_VALID -> INTEGRATION (spec §4.5). The first failure terminates
//! the pipeline; the report records the highest stage that passed.

use std::sync::{Arc, LazyLock};
use std::time::Duration;

use chrono::NaiveDate;
use regex::Regex;
use serde_json::Value;

use crate::domain::constraints::Constraints;
use crate::domain::contract::Contract;
use crate::domain::data_provider::{DataProvider, DataProviderError};
use crate::domain::tool::{Category, VerificationStage};
use crate::infrastructure::sample_inputs;

use super::executor_service::ExecutorService;

static ENTRY_FN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^def\s+([A-Za-z_][A-Za-z0-9_]*)\s*\(").unwrap());

static SELF_TEST_GUARD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"if\s+__name__\s*==\s*['"]__main__['"]\s*:"#).unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageOutcome {
    Pass,
    Fail,
    Skip,
}

#[derive(Debug, Clone)]
pub struct StageResult {
    pub stage: VerificationStage,
    pub outcome: StageOutcome,
    pub message: String,
    pub duration_ms: u64,
}

#[derive(Debug, Clone)]
pub struct VerificationReport {
    pub final_stage: Option<VerificationStage>,
    pub stages: Vec<StageResult>,
}

impl VerificationReport {
    pub fn passed(&self) -> bool {
        self.stages.iter().all(|s| s.outcome != StageOutcome::Fail)
    }

    /// The message of the first FAIL stage, if any — used to build an
    /// `ErrorReport` and to drive the Refiner's error-kind classification.
    pub fn failure_message(&self) -> Option<&str> {
        self.stages.iter().find(|s| s.outcome == StageOutcome::Fail).map(|s| s.message.as_str())
    }
}

/// Extracts the first top-level function name — the entry function the
/// sandbox binds by dict-lookup (spec §9 "Dynamic dispatch over generated
/// code").
pub fn extract_entry_function(source: &str) -> Option<String> {
    ENTRY_FN_RE.captures(source).map(|c| c[1].to_string())
}

pub struct Verifier {
    executor: Arc<ExecutorService>,
    constraints: Arc<Constraints>,
    data_provider: Arc<dyn DataProvider>,
}

impl Verifier {
    pub fn new(executor: Arc<ExecutorService>, constraints: Arc<Constraints>, data_provider: Arc<dyn DataProvider>) -> Self {
        Self { executor, constraints, data_provider }
    }

    pub async fn verify(
        &self,
        source: &str,
        category: Category,
        task_id: &str,
        contract: Option<&Contract>,
    ) -> VerificationReport {
        let mut stages = Vec::new();

        // Stage 1: AST_SECURITY.
        let started = std::time::Instant::now();
        match self.executor.static_check(source, category, &self.constraints) {
            Ok(()) => stages.push(StageResult {
                stage: VerificationStage::AstSecurity,
                outcome: StageOutcome::Pass,
                message: "static check passed".to_string(),
                duration_ms: started.elapsed().as_millis() as u64,
            }),
            Err(violation) => {
                stages.push(StageResult {
                    stage: VerificationStage::AstSecurity,
                    outcome: StageOutcome::Fail,
                    message: violation.0,
                    duration_ms: started.elapsed().as_millis() as u64,
                });
                return VerificationReport { final_stage: None, stages };
            }
        }

        // Stage 2: SELF_TEST.
        let started = std::time::Instant::now();
        if !SELF_TEST_GUARD_RE.is_match(source) {
            stages.push(StageResult {
                stage: VerificationStage::SelfTest,
                outcome: StageOutcome::Fail,
                message: "no self-test block found (missing `if __name__ == \"__main__\":`)".to_string(),
                duration_ms: started.elapsed().as_millis() as u64,
            });
            return VerificationReport { final_stage: Some(VerificationStage::AstSecurity), stages };
        }

        let timeout = Duration::from_secs(self.constraints.execution_timeout_seconds);
        match self.executor_run_self_test(source, timeout).await {
            Ok(outcome) if outcome.exit_outcome == crate::domain::trace::ExitOutcome::Ok => stages.push(StageResult {
                stage: VerificationStage::SelfTest,
                outcome: StageOutcome::Pass,
                message: "self-test passed".to_string(),
                duration_ms: started.elapsed().as_millis() as u64,
            }),
            Ok(outcome) => {
                stages.push(StageResult {
                    stage: VerificationStage::SelfTest,
                    outcome: StageOutcome::Fail,
                    message: format!("self-test failed: {}", outcome.std_err.trim()),
                    duration_ms: started.elapsed().as_millis() as u64,
                });
                return VerificationReport { final_stage: Some(VerificationStage::AstSecurity), stages };
            }
            Err(e) => {
                stages.push(StageResult {
                    stage: VerificationStage::SelfTest,
                    outcome: StageOutcome::Fail,
                    message: format!("sandbox error running self-test: {e}"),
                    duration_ms: started.elapsed().as_millis() as u64,
                });
                return VerificationReport { final_stage: Some(VerificationStage::AstSecurity), stages };
            }
        }

        let Some(entry_function) = extract_entry_function(source) else {
            stages.push(StageResult {
                stage: VerificationStage::ContractValid,
                outcome: StageOutcome::Fail,
                message: "no entry function found in module namespace".to_string(),
                duration_ms: 0,
            });
            return VerificationReport { final_stage: Some(VerificationStage::SelfTest), stages };
        };

        // Stage 3: CONTRACT_VALID.
        let started = std::time::Instant::now();
        match contract {
            None => stages.push(StageResult {
                stage: VerificationStage::ContractValid,
                outcome: StageOutcome::Skip,
                message: "no contract supplied".to_string(),
                duration_ms: started.elapsed().as_millis() as u64,
            }),
            Some(contract) => {
                let sample = sample_inputs::sample_args(&contract.input_types);
                let args = Value::Object(sample.into_iter().collect());
                match self.invoke_and_validate(source, &entry_function, &args, task_id, contract, timeout).await {
                    Ok(()) => stages.push(StageResult {
                        stage: VerificationStage::ContractValid,
                        outcome: StageOutcome::Pass,
                        message: "contract validation passed".to_string(),
                        duration_ms: started.elapsed().as_millis() as u64,
                    }),
                    Err(message) => {
                        stages.push(StageResult {
                            stage: VerificationStage::ContractValid,
                            outcome: StageOutcome::Fail,
                            message,
                            duration_ms: started.elapsed().as_millis() as u64,
                        });
                        return VerificationReport { final_stage: Some(VerificationStage::SelfTest), stages };
                    }
                }
            }
        }

        // Stage 4: INTEGRATION — fetch category only.
        let started = std::time::Instant::now();
        if category != Category::Fetch {
            stages.push(StageResult {
                stage: VerificationStage::Integration,
                outcome: StageOutcome::Skip,
                message: "integration stage only applies to fetch-category tools".to_string(),
                duration_ms: started.elapsed().as_millis() as u64,
            });
            return VerificationReport { final_stage: Some(VerificationStage::ContractValid), stages };
        }

        match self.run_integration_stage(source, &entry_function, task_id, contract, timeout).await {
            Ok(()) => {
                stages.push(StageResult {
                    stage: VerificationStage::Integration,
                    outcome: StageOutcome::Pass,
                    message: "integration passed".to_string(),
                    duration_ms: started.elapsed().as_millis() as u64,
                });
                VerificationReport { final_stage: Some(VerificationStage::Integration), stages }
            }
            Err(message) => {
                stages.push(StageResult {
                    stage: VerificationStage::Integration,
                    outcome: StageOutcome::Fail,
                    message,
                    duration_ms: started.elapsed().as_millis() as u64,
                });
                VerificationReport { final_stage: Some(VerificationStage::ContractValid), stages }
            }
        }
    }

    async fn executor_run_self_test(
        &self,
        source: &str,
        timeout: Duration,
    ) -> Result<crate::infrastructure::sandbox::SandboxOutcome, crate::infrastructure::sandbox::SandboxError> {
        self.executor.sandbox_run_self_test(source, timeout).await
    }

    async fn invoke_and_validate(
        &self,
        source: &str,
        entry_function: &str,
        args: &Value,
        task_id: &str,
        contract: &Contract,
        timeout: Duration,
    ) -> Result<(), String> {
        let outcome = self
            .executor
            .execute(source, entry_function, args, task_id, &self.constraints, None, None)
            .await
            .map_err(|e| format!("sandbox error: {e}"))?;

        if !outcome.is_clean() {
            return Err(format!("entry function raised: {}", outcome.std_err.trim()));
        }

        let value = self.executor.extract_result(&outcome).ok_or_else(|| "no result value produced".to_string())?;

        if let Some(constraints) = &contract.output_constraints {
            constraints.validate(&value).map_err(|v| v.to_string())?;
        }

        let _ = timeout;
        Ok(())
    }

    async fn run_integration_stage(
        &self,
        source: &str,
        entry_function: &str,
        task_id: &str,
        contract: Option<&Contract>,
        timeout: Duration,
    ) -> Result<(), String> {
        let symbol = "AAPL";
        let start = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2023, 12, 31).unwrap();

        let table = self.fetch_with_retry(symbol, start, end).await?;
        let args = serde_json::to_value(&table).map_err(|e| format!("failed to serialize provider data: {e}"))?;

        let outcome = self
            .executor
            .execute(source, entry_function, &args, task_id, &self.constraints, None, None)
            .await
            .map_err(|e| format!("sandbox error: {e}"))?;

        if !outcome.is_clean() {
            return Err(format!("entry function raised: {}", outcome.std_err.trim()));
        }

        if let Some(contract) = contract {
            let value = self.executor.extract_result(&outcome).ok_or_else(|| "no result value produced".to_string())?;
            if let Some(constraints) = &contract.output_constraints {
                constraints.validate(&value).map_err(|v| v.to_string())?;
            }
        }

        let _ = timeout;
        Ok(())
    }

    /// Bounded exponential backoff on transient network errors
    /// (`Constraints::integration_retry_max/base_ms`, spec §4.5).
    async fn fetch_with_retry(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<crate::domain::data_provider::OhlcvTable, String> {
        let mut attempt = 0;
        loop {
            match self.data_provider.get_historical(symbol, start, end).await {
                Ok(table) => return Ok(table),
                Err(DataProviderError::Network(msg)) if attempt < self.constraints.integration_retry_max => {
                    let delay = self.constraints.integration_retry_base_ms * 2_u64.pow(attempt);
                    tracing::warn!(attempt, delay_ms = delay, error = %msg, "integration fetch failed, retrying");
                    tokio::time::sleep(Duration::from_millis(delay)).await;
                    attempt += 1;
                }
                Err(e) => return Err(format!("integration fetch failed: {e}")),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_entry_function_finds_first_top_level_def() {
        let src = "import math\n\ndef calc_ma(prices):\n    return sum(prices)\n";
        assert_eq!(extract_entry_function(src), Some("calc_ma".to_string()));
    }

    #[test]
    fn extract_entry_function_none_when_absent() {
        assert_eq!(extract_entry_function("x = 1\n"), None);
    }
}
