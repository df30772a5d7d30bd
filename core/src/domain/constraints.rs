// Copyright (c) 2026 Toolsmith Contributors
// SPDX-License-Identifier: Apache-2.0
//! Constraints (C1) — allowed modules per category, banned names/attributes,
//! and execution/refinement limits. Loaded once at startup (spec §9,
//! "Configuration"); hot-reload is a non-goal.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::domain::tool::Category;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Constraints {
    pub allowed_modules: HashMap<Category, HashSet<String>>,
    pub always_banned_modules: HashSet<String>,
    pub banned_calls: HashSet<String>,
    pub banned_attributes: HashSet<String>,
    pub execution_timeout_seconds: u64,
    pub memory_limit_mb: u64,
    pub llm_timeout_seconds: u64,
    pub max_synthesis_attempts: u32,
    pub max_refine_attempts: u32,
    pub integration_retry_max: u32,
    pub integration_retry_base_ms: u64,
}

/// Always-allowed calc set: tabular/numerical/statistical libraries,
/// standard containers, date/decimal/json/math/re/typing (spec §4.1).
const CALC_ALWAYS_ALLOWED: &[&str] = &[
    "pandas", "numpy", "scipy", "statistics", "collections", "dataclasses",
    "datetime", "decimal", "json", "math", "re", "typing", "itertools", "functools",
];

/// `ALWAYS_BANNED_MODULES` (spec §6.5): operating-system, process-spawn,
/// file-copy, built-in introspection, dynamic import, C-interop, raw
/// network, HTTP, URL, pickling, multiprocessing, threading, tty/pty,
/// signal, code/codeop, commands.
const ALWAYS_BANNED_MODULES: &[&str] = &[
    "os", "sys", "subprocess", "shutil", "inspect", "importlib", "ctypes",
    "socket", "http", "urllib", "urllib2", "urllib3", "ftplib", "telnetlib",
    "pickle", "cPickle", "shelve", "marshal", "multiprocessing", "threading",
    "tty", "pty", "signal", "code", "codeop", "commands", "pty", "fcntl",
    "pdb", "platform", "resource", "ctypes.util", "asyncio",
];

/// `BANNED_CALLS` (spec §6.5): dynamic evaluation, compilation, dynamic
/// import, globals/locals/vars, dir, get/set/del/has-attribute, open (all
/// modes), file, input, breakpoint, exit helpers.
const BANNED_CALLS: &[&str] = &[
    "eval", "exec", "compile", "__import__", "globals", "locals", "vars",
    "dir", "getattr", "setattr", "delattr", "hasattr", "open", "file",
    "input", "raw_input", "breakpoint", "exit", "quit", "os_system",
];

/// `BANNED_ATTRIBUTES` (spec §6.5): dunder reflection chain.
const BANNED_ATTRIBUTES: &[&str] = &[
    "__class__", "__bases__", "__subclasses__", "__mro__", "__dict__",
    "__globals__", "__code__", "__builtins__", "__getattribute__",
    "__setattr__", "__delattr__", "__reduce__", "__reduce_ex__",
    "__init_subclass__", "__class_getitem__", "func_globals", "func_code",
];

fn set_of(items: &[&str]) -> HashSet<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Default for Constraints {
    fn default() -> Self {
        let calc_set = set_of(CALC_ALWAYS_ALLOWED);

        let mut fetch_set = calc_set.clone();
        // Fetch tools additionally get the data client, hashing, and
        // warning-suppression modules (spec §4.1 category table).
        fetch_set.insert("market_data_client".to_string());
        fetch_set.insert("hashlib".to_string());
        fetch_set.insert("warnings".to_string());

        let mut allowed_modules = HashMap::new();
        allowed_modules.insert(Category::Calculation, calc_set.clone());
        allowed_modules.insert(Category::Composite, calc_set);
        allowed_modules.insert(Category::Fetch, fetch_set);

        Self {
            allowed_modules,
            always_banned_modules: set_of(ALWAYS_BANNED_MODULES),
            banned_calls: set_of(BANNED_CALLS),
            banned_attributes: set_of(BANNED_ATTRIBUTES),
            execution_timeout_seconds: 30,
            memory_limit_mb: 512,
            llm_timeout_seconds: 180,
            max_synthesis_attempts: 3,
            max_refine_attempts: 3,
            integration_retry_max: 2,
            integration_retry_base_ms: 500,
        }
    }
}

impl Constraints {
    /// Loads a YAML document, falling back to documented defaults for any
    /// field the document does not set (column-add-migration-friendly; spec
    /// §4.2 migration note applies the same tolerance to the Registry schema).
    pub fn from_yaml(source: &str) -> Result<Self, serde_yaml::Error> {
        let overrides: ConstraintsOverrides = serde_yaml::from_str(source)?;
        Ok(overrides.apply(Self::default()))
    }

    pub fn allowed_for(&self, category: Category) -> HashSet<String> {
        self.allowed_modules.get(&category).cloned().unwrap_or_default()
    }
}

/// Partial document: every field optional so a deployment can override a
/// handful of knobs without restating the whole default table.
#[derive(Debug, Default, Deserialize)]
struct ConstraintsOverrides {
    execution_timeout_seconds: Option<u64>,
    memory_limit_mb: Option<u64>,
    llm_timeout_seconds: Option<u64>,
    max_synthesis_attempts: Option<u32>,
    max_refine_attempts: Option<u32>,
    integration_retry_max: Option<u32>,
    integration_retry_base_ms: Option<u64>,
    extra_banned_modules: Option<Vec<String>>,
}

impl ConstraintsOverrides {
    fn apply(self, mut base: Constraints) -> Constraints {
        if let Some(v) = self.execution_timeout_seconds {
            base.execution_timeout_seconds = v;
        }
        if let Some(v) = self.memory_limit_mb {
            base.memory_limit_mb = v;
        }
        if let Some(v) = self.llm_timeout_seconds {
            base.llm_timeout_seconds = v;
        }
        if let Some(v) = self.max_synthesis_attempts {
            base.max_synthesis_attempts = v;
        }
        if let Some(v) = self.max_refine_attempts {
            base.max_refine_attempts = v;
        }
        if let Some(v) = self.integration_retry_max {
            base.integration_retry_max = v;
        }
        if let Some(v) = self.integration_retry_base_ms {
            base.integration_retry_base_ms = v;
        }
        if let Some(extra) = self.extra_banned_modules {
            base.always_banned_modules.extend(extra);
        }
        base
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_ban_os_and_allow_pandas() {
        let c = Constraints::default();
        assert!(c.always_banned_modules.contains("os"));
        assert!(c.allowed_for(Category::Calculation).contains("pandas"));
        assert!(!c.allowed_for(Category::Calculation).contains("market_data_client"));
        assert!(c.allowed_for(Category::Fetch).contains("market_data_client"));
    }

    #[test]
    fn yaml_override_merges_with_defaults() {
        let yaml = "execution_timeout_seconds: 10\nextra_banned_modules: [\"evilmod\"]\n";
        let c = Constraints::from_yaml(yaml).unwrap();
        assert_eq!(c.execution_timeout_seconds, 10);
        assert_eq!(c.memory_limit_mb, 512);
        assert!(c.always_banned_modules.contains("evilmod"));
        assert!(c.always_banned_modules.contains("os"));
    }
}
