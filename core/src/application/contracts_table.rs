// Copyright (c) 2026 Toolsmith Contributors
// SPDX-License-Identifier: Apache-2.0
//! Contracts (C5) — the static table of named input/output specifications
//! (spec §4.4). Built once at process start via `LazyLock`, mirroring the
//! teacher's static-registry-table convention elsewhere in the codebase.

use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use crate::domain::contract::{Contract, OutputConstraints};

fn types(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
}

fn required(names: &[&str]) -> HashSet<String> {
    names.iter().map(|s| s.to_string()).collect()
}

fn contract(
    id: &str,
    input_types: HashMap<String, String>,
    required_inputs: HashSet<String>,
    output_constraints: OutputConstraints,
) -> Contract {
    Contract {
        contract_id: id.to_string(),
        input_types,
        required_inputs,
        output_constraints: Some(output_constraints),
    }
}

/// The 15-20 named contracts spec §4.4 enumerates, keyed by `contract_id`.
pub static CONTRACTS: LazyLock<HashMap<String, Contract>> = LazyLock::new(|| {
    let mut table = HashMap::new();

    table.insert(
        "calc_rsi".to_string(),
        contract(
            "calc_rsi",
            types(&[("prices", "list[float]"), ("window", "int")]),
            required(&["prices"]),
            OutputConstraints::Numeric { min: Some(0.0), max: Some(100.0) },
        ),
    );
    table.insert(
        "calc_ma".to_string(),
        contract(
            "calc_ma",
            types(&[("prices", "list[float]"), ("window", "int")]),
            required(&["prices"]),
            OutputConstraints::Numeric { min: None, max: None },
        ),
    );
    table.insert(
        "calc_bollinger".to_string(),
        contract(
            "calc_bollinger",
            types(&[("prices", "list[float]"), ("window", "int")]),
            required(&["prices"]),
            OutputConstraints::Dict { required_keys: vec!["upper".into(), "middle".into(), "lower".into()] },
        ),
    );
    table.insert(
        "calc_macd".to_string(),
        contract(
            "calc_macd",
            types(&[("prices", "list[float]")]),
            required(&["prices"]),
            OutputConstraints::Dict { required_keys: vec!["macd".into(), "signal".into(), "histogram".into()] },
        ),
    );
    table.insert(
        "calc_kdj".to_string(),
        contract(
            "calc_kdj",
            types(&[("high", "list[float]"), ("low", "list[float]"), ("close", "list[float]")]),
            required(&["high", "low", "close"]),
            OutputConstraints::Dict { required_keys: vec!["k".into(), "d".into(), "j".into()] },
        ),
    );
    table.insert(
        "calc_drawdown".to_string(),
        contract(
            "calc_drawdown",
            types(&[("prices", "list[float]")]),
            required(&["prices"]),
            OutputConstraints::Numeric { min: Some(-1.0), max: Some(0.0) },
        ),
    );
    table.insert(
        "calc_correlation".to_string(),
        contract(
            "calc_correlation",
            types(&[("prices1", "list[float]"), ("prices2", "list[float]")]),
            required(&["prices1", "prices2"]),
            OutputConstraints::Numeric { min: Some(-1.0), max: Some(1.0) },
        ),
    );
    table.insert(
        "calc_volatility".to_string(),
        contract(
            "calc_volatility",
            types(&[("prices", "list[float]"), ("window", "int")]),
            required(&["prices"]),
            OutputConstraints::Numeric { min: Some(0.0), max: None },
        ),
    );
    table.insert(
        "comp_signal".to_string(),
        contract(
            "comp_signal",
            types(&[("prices", "list[float]")]),
            required(&["prices"]),
            OutputConstraints::Boolean,
        ),
    );
    table.insert(
        "comp_divergence".to_string(),
        contract(
            "comp_divergence",
            types(&[("prices", "list[float]"), ("volumes", "list[float]")]),
            required(&["prices", "volumes"]),
            OutputConstraints::Boolean,
        ),
    );
    table.insert(
        "comp_portfolio".to_string(),
        contract(
            "comp_portfolio",
            types(&[("prices1", "list[float]"), ("prices2", "list[float]")]),
            required(&["prices1", "prices2"]),
            OutputConstraints::Dict { required_keys: vec!["weights".into(), "expected_return".into()] },
        ),
    );
    table.insert(
        "comp_conditional_return".to_string(),
        contract(
            "comp_conditional_return",
            types(&[("prices", "list[float]"), ("condition", "str")]),
            required(&["prices", "condition"]),
            OutputConstraints::Numeric { min: None, max: None },
        ),
    );
    table.insert(
        "fetch_ohlcv".to_string(),
        contract(
            "fetch_ohlcv",
            types(&[("symbol", "str"), ("start", "str"), ("end", "str")]),
            required(&["symbol", "start", "end"]),
            OutputConstraints::Frame {
                required_columns: vec!["Date".into(), "Open".into(), "High".into(), "Low".into(), "Close".into(), "Volume".into()],
                min_rows: Some(1),
                max_rows: None,
            },
        ),
    );
    table.insert(
        "fetch_quote".to_string(),
        contract(
            "fetch_quote",
            types(&[("symbol", "str")]),
            required(&["symbol"]),
            OutputConstraints::Dict { required_keys: vec!["price".into(), "timestamp".into()] },
        ),
    );
    table.insert(
        "fetch_financial".to_string(),
        contract(
            "fetch_financial",
            types(&[("symbol", "str")]),
            required(&["symbol"]),
            OutputConstraints::Dict { required_keys: vec!["symbol".into()] },
        ),
    );
    table.insert(
        "fetch_list".to_string(),
        contract(
            "fetch_list",
            types(&[("symbols", "list[str]")]),
            required(&["symbols"]),
            OutputConstraints::List { min_len: Some(1), max_len: None, element_type: Some("str".to_string()) },
        ),
    );

    table
});

/// Pattern-matches an indicator keyword from task text to a contract id
/// (spec §4.7 step 3, "infer contract id (pattern match on indicator
/// keywords)"). Order matters: more specific keywords are checked first so
/// e.g. "bollinger band" never falls through to the generic "band" miss.
pub fn infer_contract_id(task: &str) -> Option<String> {
    let lower = task.to_lowercase();
    let table: &[(&str, &str)] = &[
        ("rsi", "calc_rsi"),
        ("bollinger", "calc_bollinger"),
        ("macd", "calc_macd"),
        ("kdj", "calc_kdj"),
        ("drawdown", "calc_drawdown"),
        ("correlation", "calc_correlation"),
        ("volatility", "calc_volatility"),
        ("moving average", "calc_ma"),
        ("divergence", "comp_divergence"),
        ("portfolio", "comp_portfolio"),
        ("conditional return", "comp_conditional_return"),
        ("signal", "comp_signal"),
        ("financial", "fetch_financial"),
        ("quote", "fetch_quote"),
        ("list", "fetch_list"),
        ("ohlcv", "fetch_ohlcv"),
        ("historical", "fetch_ohlcv"),
    ];
    table.iter().find(|(keyword, _)| lower.contains(keyword)).map(|(_, id)| id.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_carries_every_named_contract() {
        let expected = [
            "calc_rsi", "calc_ma", "calc_bollinger", "calc_macd", "calc_kdj", "calc_drawdown",
            "calc_correlation", "calc_volatility", "comp_signal", "comp_divergence", "comp_portfolio",
            "comp_conditional_return", "fetch_ohlcv", "fetch_quote", "fetch_financial", "fetch_list",
        ];
        for id in expected {
            assert!(CONTRACTS.contains_key(id), "missing contract {id}");
        }
    }

    #[test]
    fn infers_rsi_contract_from_task_text() {
        assert_eq!(infer_contract_id("Calculate RSI-14 for AAPL"), Some("calc_rsi".to_string()));
    }

    #[test]
    fn infers_drawdown_not_confused_with_dow() {
        assert_eq!(infer_contract_id("Calculate MSFT max drawdown over last 250 days"), Some("calc_drawdown".to_string()));
    }
}
