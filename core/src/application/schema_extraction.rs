// Copyright (c) 2026 Toolsmith Contributors
// SPDX-License-Identifier: Apache-2.0
//! Schema extraction (C11) — keyword heuristics the Synthesizer uses to
//! infer a tool's category and the schema tags (indicator, data_type) used
//! for reuse lookup via `Registry.find_by_schema` (spec §4.7 steps 1-2).

use crate::domain::repository::ToolFilter;
use crate::domain::tool::Category;

/// Infers `fetch` / `calculation` / `composite` from task text (spec §4.7
/// step 1). Fetch keywords take priority since a composite task often
/// mentions both a fetch verb and an indicator name ("fetch AAPL prices and
/// compute RSI" is still ultimately a composite chain, but the category
/// recorded for the synthesized tool follows the dominant verb).
pub fn infer_category(task: &str) -> Category {
    let lower = task.to_lowercase();

    const COMPOSITE_KEYWORDS: &[&str] = &["portfolio", "compare", "correlat", "conditional", "allocate", "weight"];
    const FETCH_KEYWORDS: &[&str] = &["fetch", "get the", "retrieve", "download", "quote", "price history", "historical data"];
    const CALC_KEYWORDS: &[&str] =
        &["calculate", "compute", "rsi", "macd", "bollinger", "kdj", "moving average", "drawdown", "volatility", "signal"];

    if COMPOSITE_KEYWORDS.iter().any(|k| lower.contains(k)) {
        return Category::Composite;
    }
    if CALC_KEYWORDS.iter().any(|k| lower.contains(k)) {
        return Category::Calculation;
    }
    if FETCH_KEYWORDS.iter().any(|k| lower.contains(k)) {
        return Category::Fetch;
    }
    Category::Fetch
}

const KNOWN_INDICATORS: &[&str] = &[
    "rsi", "macd", "bollinger", "kdj", "drawdown", "correlation", "volatility", "moving average", "signal", "divergence",
];

const KNOWN_DATA_TYPES: &[&str] = &["ohlcv", "quote", "financial", "list"];

/// Extracts `(indicator, data_type)` tags from task text (spec §4.7 step 2).
pub fn extract_schema_tags(task: &str) -> (Option<String>, Option<String>) {
    let lower = task.to_lowercase();
    let indicator = KNOWN_INDICATORS.iter().find(|k| lower.contains(*k)).map(|k| k.to_string());
    let data_type = KNOWN_DATA_TYPES.iter().find(|k| lower.contains(*k)).map(|k| k.to_string());
    (indicator, data_type)
}

/// Builds the reuse-lookup filter for `Registry.find_by_schema`.
pub fn reuse_filter(task: &str, category: Category) -> ToolFilter {
    let (indicator, data_type) = extract_schema_tags(task);
    ToolFilter { category: Some(category), indicator, data_type }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn infers_calculation_category_from_indicator_keyword() {
        assert_eq!(infer_category("Calculate RSI-14 for AAPL"), Category::Calculation);
    }

    #[test]
    fn infers_composite_category_from_portfolio_keyword() {
        assert_eq!(infer_category("Build a portfolio allocation between AAPL and MSFT"), Category::Composite);
    }

    #[test]
    fn infers_fetch_category_from_quote_keyword() {
        assert_eq!(infer_category("Get the current quote for AAPL"), Category::Fetch);
    }

    #[test]
    fn extracts_known_indicator_tag() {
        let (indicator, _) = extract_schema_tags("Calculate the Bollinger Bands for AAPL");
        assert_eq!(indicator, Some("bollinger".to_string()));
    }
}
