// Copyright (c) 2026 Toolsmith Contributors
// SPDX-License-Identifier: Apache-2.0
//! Category-specific system prompt assembly (spec §4.3).

use crate::domain::contract::Contract;
use crate::domain::tool::Category;

pub struct PromptAssembler;

impl PromptAssembler {
    /// Builds the full prompt sent to the language model: a category system
    /// prompt, the task text, an optional contract injection, and an
    /// optional error-context appendix (spec §4.3 items 1-8).
    pub fn assemble(
        task: &str,
        category: Category,
        contract: Option<&Contract>,
        error_context: Option<&str>,
    ) -> String {
        let mut prompt = String::new();
        prompt.push_str(Self::system_prompt(category));
        prompt.push_str("\n\n## Task\n\n");
        prompt.push_str(task);

        if let Some(contract) = contract {
            prompt.push_str("\n\n## Required output contract\n\n");
            prompt.push_str(&format!(
                "contract_id: {}\nrequired_inputs: {:?}\n",
                contract.contract_id, contract.required_inputs
            ));
            if let Some(constraints) = &contract.output_constraints {
                prompt.push_str(&format!("output_type: {:?}\n", constraints.output_type()));
            }
        }

        if let Some(error_context) = error_context {
            prompt.push_str("\n\n## Prior attempt failed\n\n");
            prompt.push_str(error_context);
            prompt.push_str("\n\nFix the code so it passes verification. Do not reintroduce the same error.");
        }

        prompt
    }

    fn system_prompt(category: Category) -> &'static str {
        match category {
            Category::Fetch => FETCH_SYSTEM_PROMPT,
            Category::Calculation => CALCULATION_SYSTEM_PROMPT,
            Category::Composite => COMPOSITE_SYSTEM_PROMPT,
        }
    }
}

const COMMON_RULES: &str = r#"
You are generating a single self-contained Python module for a financial
analysis tool. Follow these rules exactly:

1. Every parameter and return value must carry a type annotation.
2. Write a docstring with `Args:` and `Returns:` sections.
3. Include a self-test block guarded by `if __name__ == "__main__":` that
   contains at least two `assert` statements using inline literal sample
   data. The self-test must never perform a network call.
4. Only import modules from the ALLOWED list below.
5. FORBIDDEN — using any of these will cause the code to be rejected:
   banned modules (os, sys, subprocess, socket, pickle, threading, ...),
   banned calls (eval, exec, compile, getattr, setattr, open, input, ...),
   and banned attributes (__class__, __subclasses__, __globals__, ...).
   These are rejected because they allow escaping the sandbox, not because
   of style.
"#;

const FETCH_SYSTEM_PROMPT: &str = r#"You generate FETCH-category tools.

ALLOWED modules: the data client module, hashlib, warnings, plus the
standard calculation allowlist (pandas, numpy, json, math, datetime, typing).

Fetch tools receive already-fetched data as arguments; they must not invoke
network I/O directly other than through the provided data client interface.
"#;

const CALCULATION_SYSTEM_PROMPT: &str = r#"You generate CALCULATION-category tools.

ALLOWED modules: pandas, numpy, scipy, statistics, collections, dataclasses,
datetime, decimal, json, math, re, typing, itertools, functools.

Naming convention: a single time-series input is named `prices`. Multi-asset
portfolio inputs are named positionally `prices1, prices2, ..., pricesN`.
Volume-price tasks use the plural `volumes`. Pure calculation tools never
fetch data — all inputs arrive as arguments.
"#;

const COMPOSITE_SYSTEM_PROMPT: &str = r#"You generate COMPOSITE-category tools.

ALLOWED modules: same as CALCULATION. A composite tool combines multiple
calculations (e.g. a signal derived from two indicators) but, like
calculation tools, never fetches data itself.
"#;

pub fn full_prompt_template(category: Category) -> String {
    format!("{}\n{}", PromptAssembler::system_prompt(category), COMMON_RULES)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contract_is_injected_verbatim_when_present() {
        use std::collections::{HashMap, HashSet};
        let contract = Contract {
            contract_id: "calc_rsi".to_string(),
            input_types: HashMap::new(),
            required_inputs: HashSet::new(),
            output_constraints: None,
        };
        let prompt = PromptAssembler::assemble("Calculate RSI-14", Category::Calculation, Some(&contract), None);
        assert!(prompt.contains("calc_rsi"));
    }

    #[test]
    fn error_context_appends_fix_instruction() {
        let prompt = PromptAssembler::assemble("Calculate RSI-14", Category::Calculation, None, Some("KeyError: 'close'"));
        assert!(prompt.contains("KeyError"));
        assert!(prompt.contains("Fix the code"));
    }
}
