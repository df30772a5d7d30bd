// Copyright (c) 2026 Toolsmith Contributors
// SPDX-License-Identifier: Apache-2.0
//! Deterministic sample-input generation for Verifier Stage 3 (spec §4.5,
//! §8 "Round-trip / idempotence"). A fixed table keyed by input type tag,
//! not randomized, so the stage is reproducible run to run.

use std::collections::HashMap;

use serde_json::{json, Value};

use crate::domain::tool::ArgsSchema;

/// Fixed seed vector reused across calculation/composite contracts whose
/// type tag is `list[float]` — 15 points, enough for any window-based
/// indicator's lookback (RSI-14, a 20-day Bollinger band, MACD(12,26,9)).
const PRICE_SERIES: &[f64] = &[
    44.0, 44.5, 44.25, 43.75, 44.5, 44.25, 44.5, 45.0, 45.5, 46.0, 46.5, 46.0, 45.5, 45.0, 44.5,
];

const VOLUME_SERIES: &[f64] =
    &[1_200.0, 1_350.0, 980.0, 1_500.0, 1_100.0, 1_250.0, 1_400.0, 1_600.0, 1_300.0, 1_450.0];

/// Returns a deterministic sample value for a single parameter's type tag.
pub fn sample_for_type(type_tag: &str) -> Value {
    match type_tag {
        "list[float]" | "list" => json!(PRICE_SERIES),
        "volumes" => json!(VOLUME_SERIES),
        "float" => json!(45.0),
        "int" => json!(14),
        "str" => json!("AAPL"),
        "bool" => json!(true),
        "dict" => json!({"close": PRICE_SERIES}),
        other if other.starts_with("prices") => json!(PRICE_SERIES),
        _ => json!(PRICE_SERIES),
    }
}

/// Builds the full argument map for an `ArgsSchema`, substituting a fixed
/// sample value per declared parameter type.
pub fn sample_args(schema: &ArgsSchema) -> HashMap<String, Value> {
    schema.iter().map(|(name, type_tag)| (name.clone(), sample_for_type(type_tag))).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_type_tag_yields_identical_sample_across_calls() {
        assert_eq!(sample_for_type("list[float]"), sample_for_type("list[float]"));
    }

    #[test]
    fn sample_args_covers_every_declared_parameter() {
        let mut schema = ArgsSchema::new();
        schema.insert("prices".to_string(), "list[float]".to_string());
        schema.insert("window".to_string(), "int".to_string());
        let args = sample_args(&schema);
        assert_eq!(args.len(), 2);
        assert!(args.contains_key("prices"));
        assert!(args.contains_key("window"));
    }
}
