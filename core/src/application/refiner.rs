// Copyright (c) 2026 Toolsmith Contributors
// SPDX-License-Identifier: Apache-2.0
//! Refiner (C9) — classifies a verification failure, consults the module
//! replacement guide, and asks the LanguageModel for a patch (spec §4.8).
//! Holds a Gateway handle, never a Synthesizer handle: the loop between them
//! is data (the verification report), not control (spec §9).

use std::collections::BTreeSet;
use std::sync::{Arc, LazyLock};
use std::time::Duration;

use crate::domain::contract::Contract;
use crate::domain::errors::ErrorKind;
use crate::domain::ids::ToolId;
use crate::domain::llm::{GenerationRequest, LlmProvider};
use crate::domain::patch::ToolPatch;
use crate::domain::repository::ToolPatchRepository;
use crate::domain::tool::{ArgsSchema, Capability, Category, Tool};

use super::gateway::Gateway;
use super::verifier::VerificationReport;

/// Maps a forbidden-import substring to an allowed-equivalent hint (spec
/// §4.8 "MODULE_REPLACEMENT_GUIDE"). Keyed on the offending module name as
/// it appears in a Python traceback / import statement.
static MODULE_REPLACEMENT_GUIDE: LazyLock<Vec<(&str, &str)>> = LazyLock::new(|| {
    vec![
        ("ta-lib", "compute the indicator directly over the provided price list with plain arithmetic"),
        ("talib", "compute the indicator directly over the provided price list with plain arithmetic"),
        ("pandas_ta", "compute the indicator directly over the provided price list with plain arithmetic"),
        ("requests", "accept the data as a function argument instead of fetching it from within the tool"),
        ("urllib", "accept the data as a function argument instead of fetching it from within the tool"),
        ("socket", "accept the data as a function argument instead of fetching it from within the tool"),
        ("os", "remove the dependency entirely; the sandbox provides no filesystem or process access"),
        ("subprocess", "remove the dependency entirely; the sandbox provides no process-spawn access"),
    ]
});

fn replacement_hint(message: &str) -> Option<&'static str> {
    let lower = message.to_lowercase();
    MODULE_REPLACEMENT_GUIDE.iter().find(|(module, _)| lower.contains(module)).map(|(_, hint)| *hint)
}

/// Pattern table mapping a substring found in a failure message to an
/// `ErrorKind` and a short strategy tag (spec §4.8).
fn classify(message: &str) -> (ErrorKind, &'static str) {
    let patterns: &[(&str, ErrorKind, &str)] = &[
        ("SyntaxError", ErrorKind::Syntax, "fix syntax"),
        ("ModuleNotFoundError", ErrorKind::Import, "replace forbidden import"),
        ("ImportError", ErrorKind::Import, "replace forbidden import"),
        ("NameError", ErrorKind::Exec, "define missing name"),
        ("TypeError", ErrorKind::Exec, "fix type mismatch"),
        ("KeyError", ErrorKind::Exec, "guard missing key"),
        ("IndexError", ErrorKind::Exec, "guard out-of-range index"),
        ("ValueError", ErrorKind::Exec, "fix invalid value handling"),
        ("ZeroDivisionError", ErrorKind::Exec, "guard division by zero"),
        ("AttributeError", ErrorKind::Exec, "fix attribute access"),
        ("AssertionError", ErrorKind::Assert, "fix self-test assertion"),
        ("TimeoutExpired", ErrorKind::Timeout, "reduce work per call or add early exit"),
        ("timed out", ErrorKind::Timeout, "reduce work per call or add early exit"),
        ("banned", ErrorKind::Security, "unfixable"),
        ("forbidden", ErrorKind::Security, "unfixable"),
        ("security", ErrorKind::Security, "unfixable"),
    ];

    if message.contains("contract") || message.contains("output") {
        return (ErrorKind::Contract, "align output with contract constraints");
    }

    patterns
        .iter()
        .find(|(needle, _, _)| message.contains(needle))
        .map(|(_, kind, strategy)| (*kind, *strategy))
        .unwrap_or((ErrorKind::Exec, "unknown failure, attempt a general fix"))
}

pub struct Refiner {
    gateway: Arc<Gateway>,
    llm: Arc<dyn LlmProvider>,
    patches: Arc<dyn ToolPatchRepository>,
    max_attempts: u32,
}

impl Refiner {
    pub fn new(gateway: Arc<Gateway>, llm: Arc<dyn LlmProvider>, patches: Arc<dyn ToolPatchRepository>, max_attempts: u32) -> Self {
        Self { gateway, llm, patches, max_attempts }
    }

    /// `refine(base_source, report, task) -> Tool | None` (spec §4.8).
    #[allow(clippy::too_many_arguments)]
    pub async fn refine(
        &self,
        base_tool_id: ToolId,
        base_source: &str,
        report: &VerificationReport,
        task: &str,
        category: Category,
        task_id: &str,
        name: &str,
        args_schema: ArgsSchema,
        capabilities: BTreeSet<Capability>,
        contract: Option<&Contract>,
    ) -> Option<Tool> {
        let mut current_source = base_source.to_string();
        let mut current_report = report.clone();
        let mut history: Vec<ToolPatch> = Vec::new();

        for attempt in 0..self.max_attempts {
            let message = current_report.failure_message().unwrap_or("unknown failure").to_string();
            let (error_kind, strategy) = classify(&message);

            if error_kind.is_unfixable() {
                tracing::warn!(task_id, "refiner stopping: SECURITY failure is unfixable");
                return None;
            }

            if attempt > 0 {
                let delay = Duration::from_secs(2_u64.pow(attempt - 1));
                tokio::time::sleep(delay).await;
            }

            let hint = replacement_hint(&message);
            let error_context = self.build_patch_prompt(&current_source, &message, error_kind, strategy, hint, &history);

            let request = GenerationRequest { task, category, contract, error_context: Some(&error_context) };
            let response = match self.llm.generate(request).await {
                Ok(r) => r,
                Err(e) => {
                    tracing::error!(task_id, error = %e, "refiner: language model transport failure");
                    return None;
                }
            };

            let Some(patched_source) = response.code_payload else {
                tracing::warn!(task_id, attempt, "refiner: no code payload returned, stopping");
                return None;
            };

            let outcome = self
                .gateway
                .submit(&patched_source, category, task_id, name, args_schema.clone(), capabilities.clone(), contract, Some(base_tool_id))
                .await
                .ok()?;

            if outcome.ok {
                let patch = ToolPatch {
                    patch_id: crate::domain::ids::PatchId::new(),
                    error_report_id: crate::domain::ids::ErrorReportId::new(),
                    base_tool_id,
                    resulting_tool_id: outcome.tool.as_ref().map(|t| t.id),
                    approach: strategy.to_string(),
                    failure_reason: None,
                };
                let _ = self.patches.insert(&patch).await;
                return outcome.tool;
            }

            let failure_reason = outcome.report.failure_message().unwrap_or("verification failed").to_string();
            let patch = ToolPatch {
                patch_id: crate::domain::ids::PatchId::new(),
                error_report_id: crate::domain::ids::ErrorReportId::new(),
                base_tool_id,
                resulting_tool_id: None,
                approach: strategy.to_string(),
                failure_reason: Some(failure_reason),
            };
            let _ = self.patches.insert(&patch).await;
            history.push(patch);

            current_source = patched_source;
            current_report = outcome.report;
        }

        None
    }

    fn build_patch_prompt(
        &self,
        original_code: &str,
        failing_excerpt: &str,
        error_kind: ErrorKind,
        strategy: &str,
        replacement_hint: Option<&str>,
        history: &[ToolPatch],
    ) -> String {
        let mut prompt = String::new();
        prompt.push_str("Original code:\n");
        prompt.push_str(original_code);
        prompt.push_str("\n\nFailing trace excerpt:\n");
        prompt.push_str(failing_excerpt);
        prompt.push_str(&format!("\n\nError kind: {error_kind:?}\nStrategy: {strategy}\n"));
        if let Some(hint) = replacement_hint {
            prompt.push_str(&format!("Replacement guide: {hint}\n"));
        }
        prompt.push_str("Do not use any banned module under any circumstance.\n");
        if !history.is_empty() {
            prompt.push_str("\nPrior patch attempts:\n");
            for patch in history {
                prompt.push_str(&format!(
                    "- approach={} failure_reason={}\n",
                    patch.approach,
                    patch.failure_reason.as_deref().unwrap_or("none")
                ));
            }
        }
        prompt
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_syntax_error_message() {
        let (kind, _) = classify("SyntaxError: invalid syntax at line 3");
        assert_eq!(kind, ErrorKind::Syntax);
    }

    #[test]
    fn classifies_module_not_found_as_import() {
        let (kind, _) = classify("ModuleNotFoundError: No module named 'talib'");
        assert_eq!(kind, ErrorKind::Import);
    }

    #[test]
    fn classifies_banned_message_as_security() {
        let (kind, _) = classify("banned import detected: os");
        assert!(kind.is_unfixable());
    }

    #[test]
    fn replacement_guide_matches_talib() {
        assert!(replacement_hint("ModuleNotFoundError: No module named 'talib'").is_some());
    }

    #[test]
    fn unknown_message_falls_back_to_exec() {
        let (kind, strategy) = classify("something completely unexpected happened");
        assert_eq!(kind, ErrorKind::Exec);
        assert_eq!(strategy, "unknown failure, attempt a general fix");
    }
}
