// Copyright (c) 2026 Toolsmith Contributors
// SPDX-License-Identifier: Apache-2.0
//! Synthesizer (C8) — classify, attempt reuse, generate, submit, refine on
//! failure (spec §4.7). Holds a Gateway and a LanguageModel as constructor
//! dependencies, never a Refiner: the Refiner is invoked, not imported as a
//! control dependency (spec §9).

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::domain::llm::{GenerationRequest, LlmProvider};
use crate::domain::tool::{ArgsSchema, Capability, Category, SchemaTags, Tool};
use crate::domain::repository::ToolRepository;

use super::contracts_table::{self, CONTRACTS};
use super::gateway::Gateway;
use super::refiner::Refiner;
use super::schema_extraction;

fn capabilities_for(category: Category) -> BTreeSet<Capability> {
    match category {
        Category::Fetch => BTreeSet::from([Capability::NetworkRead]),
        Category::Calculation | Category::Composite => BTreeSet::from([Capability::CalcOnly]),
    }
}

pub struct Synthesizer {
    gateway: Arc<Gateway>,
    llm: Arc<dyn LlmProvider>,
    refiner: Arc<Refiner>,
    tools: Arc<dyn ToolRepository>,
    max_attempts: u32,
}

impl Synthesizer {
    pub fn new(gateway: Arc<Gateway>, llm: Arc<dyn LlmProvider>, refiner: Arc<Refiner>, tools: Arc<dyn ToolRepository>, max_attempts: u32) -> Self {
        Self { gateway, llm, refiner, tools, max_attempts }
    }

    /// `synthesize(task) -> Tool | None` (spec §4.7).
    pub async fn synthesize(&self, task: &str, task_id: &str) -> Option<Tool> {
        let category = schema_extraction::infer_category(task);

        let filter = schema_extraction::reuse_filter(task, category);
        if let Ok(Some(existing)) = self.tools.find_by_schema(&filter).await {
            tracing::info!(task_id, tool = %existing.name, "synthesizer: reusing existing tool");
            return Some(existing);
        }

        let contract_id = contracts_table::infer_contract_id(task);
        let contract = contract_id.as_deref().and_then(|id| CONTRACTS.get(id));

        let name = derive_tool_name(task, contract_id.as_deref());
        let args_schema: ArgsSchema = contract.map(|c| c.input_types.clone()).unwrap_or_default();
        let capabilities = capabilities_for(category);

        // Step 7: bounded by max_attempts (spec §4.7) — each attempt asks the
        // language model for a fresh generation, submits it, and on failure
        // hands the report to the Refiner's own bounded repair loop before
        // the Synthesizer gives up and tries a whole new generation.
        for attempt in 0..self.max_attempts {
            let request = GenerationRequest { task, category, contract, error_context: None };
            let response = match self.llm.generate(request).await {
                Ok(r) => r,
                Err(e) => {
                    tracing::error!(task_id, error = %e, "synthesizer: language model transport failure");
                    return None;
                }
            };

            let Some(source) = response.code_payload else {
                tracing::warn!(task_id, "synthesizer: no code payload returned, failing (no mock substitution)");
                return None;
            };

            let outcome = self
                .gateway
                .submit(&source, category, task_id, &name, args_schema.clone(), capabilities.clone(), contract, None)
                .await
                .ok()?;

            if outcome.ok {
                let tool = outcome.tool?;
                let (indicator, data_type) = schema_extraction::extract_schema_tags(task);
                let _ = self
                    .gateway_update_schema(tool.id, SchemaTags { category: Some(category), indicator, data_type, input_requirements: vec![] })
                    .await;
                return Some(tool);
            }

            // The base tool does not exist yet (the synthesis attempt never
            // registered), so the Refiner patches against a synthetic base id
            // and the resulting patch edge records the synthesis lineage.
            let base_tool_id = crate::domain::ids::ToolId::new();
            let refined = self
                .refiner
                .refine(base_tool_id, &source, &outcome.report, task, category, task_id, &name, args_schema.clone(), capabilities.clone(), contract)
                .await;

            if let Some(tool) = refined {
                let (indicator, data_type) = schema_extraction::extract_schema_tags(task);
                let _ = self
                    .gateway_update_schema(tool.id, SchemaTags { category: Some(category), indicator, data_type, input_requirements: vec![] })
                    .await;
                return Some(tool);
            }

            tracing::warn!(task_id, attempt, "synthesizer: generation attempt exhausted, trying again");
        }

        None
    }

    async fn gateway_update_schema(&self, tool_id: crate::domain::ids::ToolId, tags: SchemaTags) -> Result<(), super::registry_service::RegistryError> {
        self.gateway.update_schema(tool_id, tags).await
    }
}

/// A short, filesystem-safe tool name derived from the contract id (when
/// inferred) or a slug of the task text.
fn derive_tool_name(task: &str, contract_id: Option<&str>) -> String {
    if let Some(id) = contract_id {
        return id.to_string();
    }
    let slug: String = task
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect();
    let trimmed: String = slug.split('_').filter(|s| !s.is_empty()).take(6).collect::<Vec<_>>().join("_");
    format!("generated_{trimmed}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derives_contract_name_when_available() {
        assert_eq!(derive_tool_name("calculate rsi", Some("calc_rsi")), "calc_rsi");
    }

    #[test]
    fn derives_slug_name_when_no_contract() {
        let name = derive_tool_name("Fetch the latest 10-K for AAPL", None);
        assert!(name.starts_with("generated_"));
    }

    #[test]
    fn calc_only_capability_for_calculation_category() {
        assert_eq!(capabilities_for(Category::Calculation), BTreeSet::from([Capability::CalcOnly]));
    }
}
