// Copyright (c) 2026 Toolsmith Contributors
// SPDX-License-Identifier: Apache-2.0
//! Content-hash dedup (spec §8 "Round-trip / idempotence"): registering the
//! same source text twice, under any name, yields the same Tool row.

use std::collections::BTreeSet;
use std::sync::Arc;

use toolsmith_core::application::registry_service::{RegistryService, ToolRegistration};
use toolsmith_core::domain::tool::{ArgsSchema, Capability, Category, VerificationStage};
use toolsmith_core::infrastructure::repositories::InMemoryToolRepository;

fn registration(name: &str, source: &str) -> ToolRegistration {
    ToolRegistration {
        name: name.to_string(),
        source_text: source.to_string(),
        args_schema: ArgsSchema::default(),
        capabilities: BTreeSet::from([Capability::CalcOnly]),
        category: Category::Calculation,
        verification_stage: VerificationStage::ContractValid,
        contract_id: Some("calc_ma".to_string()),
        patch_of: None,
    }
}

#[tokio::test]
async fn registering_identical_source_under_different_names_dedups_by_content_hash() {
    let dir = tempfile::tempdir().unwrap();
    let service = RegistryService::new(Arc::new(InMemoryToolRepository::new()), dir.path());

    let source = "def calc_ma(prices):\n    return sum(prices) / len(prices)\n";
    let first = service.register(registration("calc_ma", source)).await.unwrap();
    let second = service.register(registration("calc_ma_v2", source)).await.unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(first.content_hash, second.content_hash);
}

#[tokio::test]
async fn tool_row_content_hash_matches_sha256_of_source() {
    let dir = tempfile::tempdir().unwrap();
    let service = RegistryService::new(Arc::new(InMemoryToolRepository::new()), dir.path());

    let tool = service.register(registration("calc_ma", "def f(): return 1")).await.unwrap();
    assert!(tool.content_hash_matches_source());
}
