// Copyright (c) 2026 Toolsmith Contributors
// SPDX-License-Identifier: Apache-2.0
//! TaskExecutor (C10) — orchestrates fetch/calc chains over free-text tasks
//! (spec §4.9). Pure calc tools never fetch data themselves; this is the
//! only component that calls `DataProvider` on a tool's behalf.

use std::collections::HashMap;
use std::sync::{Arc, LazyLock};

use chrono::NaiveDate;
use regex::Regex;
use serde_json::{json, Value};

use crate::domain::data_provider::DataProvider;
use crate::domain::errors::{ErrorKind, TaskResult};
use crate::domain::tool::Category;

use super::executor_service::ExecutorService;
use super::synthesizer::Synthesizer;
use super::verifier::extract_entry_function;

/// Known index-name aliases (spec §4.9 "explicit index name -> mapped
/// symbol").
static INDEX_ALIASES: LazyLock<Vec<(&str, &str)>> = LazyLock::new(|| {
    vec![
        ("s&p 500", "^GSPC"),
        ("s&p500", "^GSPC"),
        ("nasdaq 100", "^NDX"),
        ("dow jones", "^DJI"),
        ("russell 2000", "^RUT"),
    ]
});

/// A closed set of common tickers/ETFs checked before falling back to the
/// uppercase-letter regex.
static KNOWN_TICKERS: LazyLock<Vec<&str>> =
    LazyLock::new(|| vec!["AAPL", "MSFT", "GOOGL", "AMZN", "TSLA", "NVDA", "SPY", "QQQ", "VTI", "VOO"]);

/// Common English words that collide with the 1-5 uppercase-letter ticker
/// regex and must be excluded (spec §4.9).
static SYMBOL_EXCLUSIONS: LazyLock<std::collections::HashSet<&str>> = LazyLock::new(|| {
    ["GET", "SET", "NOW", "THE", "FOR", "AND", "ITS", "ALL", "NEW"].into_iter().collect()
});

static TICKER_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b([A-Z]{1,5})\b").unwrap());
static DAY_PERIOD_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\d+)-?\s*day").unwrap());
static RSI_PERIOD_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)RSI-?(\d+)").unwrap());
static MACD_PERIOD_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)MACD\((\d+),\s*(\d+),\s*(\d+)\)").unwrap());
static QUARTER_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)Q([1-4])").unwrap());
static YEAR_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b(20\d{2})\b").unwrap());
static DATE_RANGE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{4}-\d{2}-\d{2})\s*(?:to|through|-)\s*(\d{4}-\d{2}-\d{2})").unwrap());

#[derive(Debug, Clone)]
pub struct ParsedQuery {
    pub symbol: Option<String>,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub day_period: Option<u32>,
    pub rsi_period: Option<u32>,
    pub macd_periods: Option<(u32, u32, u32)>,
    pub quarter: Option<u32>,
    pub year: Option<i32>,
}

fn default_range() -> (NaiveDate, NaiveDate) {
    (NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(), NaiveDate::from_ymd_opt(2023, 12, 31).unwrap())
}

/// Parses symbol, date range, and period hints out of free text (spec
/// §4.9 "Query parsing").
pub fn parse_query(task: &str) -> ParsedQuery {
    let lower = task.to_lowercase();

    let symbol = INDEX_ALIASES
        .iter()
        .find(|(alias, _)| lower.contains(alias))
        .map(|(_, mapped)| mapped.to_string())
        .or_else(|| KNOWN_TICKERS.iter().find(|t| task.contains(**t)).map(|t| t.to_string()))
        .or_else(|| {
            TICKER_RE
                .find_iter(task)
                .map(|m| m.as_str())
                .find(|candidate| !SYMBOL_EXCLUSIONS.contains(candidate))
                .map(|s| s.to_string())
        });

    let (default_start, default_end) = default_range();
    let (start, end) = DATE_RANGE_RE
        .captures(task)
        .and_then(|c| {
            let start = NaiveDate::parse_from_str(&c[1], "%Y-%m-%d").ok()?;
            let end = NaiveDate::parse_from_str(&c[2], "%Y-%m-%d").ok()?;
            Some((start, end))
        })
        .unwrap_or((default_start, default_end));

    let day_period = DAY_PERIOD_RE.captures(&lower).and_then(|c| c[1].parse().ok());
    let rsi_period = RSI_PERIOD_RE.captures(task).and_then(|c| c[1].parse().ok());
    let macd_periods = MACD_PERIOD_RE.captures(task).and_then(|c| {
        Some((c[1].parse().ok()?, c[2].parse().ok()?, c[3].parse().ok()?))
    });
    let quarter = QUARTER_RE.captures(task).and_then(|c| c[1].parse().ok());
    let year = YEAR_RE.captures(task).and_then(|c| c[1].parse().ok());

    ParsedQuery { symbol, start, end, day_period, rsi_period, macd_periods, quarter, year }
}

/// Direct-extraction patterns that need no generated tool (spec §4.9
/// "Simple direct-extraction patterns").
fn direct_extraction(task: &str, table: &crate::domain::data_provider::OhlcvTable) -> Option<Value> {
    let lower = task.to_lowercase();
    let close = &table.close;
    if close.is_empty() {
        return None;
    }
    if lower.contains("latest close") || lower.contains("current close") || lower.contains("last close") {
        return Some(json!(close.last().copied().unwrap()));
    }
    if lower.contains("highest close") || lower.contains("max close") {
        return Some(json!(close.iter().cloned().fold(f64::MIN, f64::max)));
    }
    if lower.contains("lowest close") || lower.contains("min close") {
        return Some(json!(close.iter().cloned().fold(f64::MAX, f64::min)));
    }
    None
}

/// Builds the standard calc-tool data shape (spec §4.9 "Data shape").
fn bind_ohlcv_args(table: &crate::domain::data_provider::OhlcvTable) -> Value {
    json!({
        "symbol": table.symbol,
        "dates": table.dates.iter().map(|d| d.to_string()).collect::<Vec<_>>(),
        "open": table.open,
        "high": table.high,
        "low": table.low,
        "close": table.close,
        "volume": table.volume,
    })
}

pub struct TaskExecutor {
    data_provider: Arc<dyn DataProvider>,
    executor: Arc<ExecutorService>,
    synthesizer: Arc<Synthesizer>,
}

impl TaskExecutor {
    pub fn new(data_provider: Arc<dyn DataProvider>, executor: Arc<ExecutorService>, synthesizer: Arc<Synthesizer>) -> Self {
        Self { data_provider, executor, synthesizer }
    }

    pub async fn run(&self, task: &str, task_id: &str) -> TaskResult {
        let query = parse_query(task);

        let Some(symbol) = query.symbol.clone() else {
            return TaskResult::error(ErrorKind::ProviderUnsupported, "no symbol could be extracted from the task text");
        };

        let table = match self.data_provider.get_historical(&symbol, query.start, query.end).await {
            Ok(table) => table,
            Err(e) => return TaskResult::error(ErrorKind::ProviderUnsupported, format!("data provider could not satisfy the query: {e}")),
        };

        if let Some(value) = direct_extraction(task, &table) {
            return TaskResult::ok(value);
        }

        let Some(tool) = self.synthesizer.synthesize(task, task_id).await else {
            return TaskResult::fail("synthesis failed to produce a verified tool for this task");
        };

        let Some(entry_function) = extract_entry_function(&tool.source_text) else {
            return TaskResult::error(ErrorKind::Exec, "registered tool has no discoverable entry function");
        };

        let args = self.bind_args(&tool.schema_tags, &table);
        let constraints = crate::domain::constraints::Constraints::default();

        let trace = match self
            .executor
            .execute(&tool.source_text, &entry_function, &args, task_id, &constraints, Some(tool.id), None)
            .await
        {
            Ok(trace) => trace,
            Err(e) => return TaskResult::error(ErrorKind::Exec, format!("sandbox execution failed: {e}")),
        };

        if !trace.is_clean() {
            return TaskResult::error(ErrorKind::Exec, format!("tool execution failed: {}", trace.std_err.trim()));
        }

        match self.executor.extract_result(&trace) {
            Some(value) => TaskResult::ok(value),
            None => TaskResult::error(ErrorKind::Exec, "tool execution produced no extractable result"),
        }
    }

    /// Binds the OHLCV table to the tool's expected parameter shape (spec
    /// §4.9 "Data shape"): `volumes` for volume-price tasks, positional
    /// `prices1..N` for portfolio/composite tasks, the standard shape
    /// otherwise.
    fn bind_args(&self, schema_tags: &crate::domain::tool::SchemaTags, table: &crate::domain::data_provider::OhlcvTable) -> Value {
        match schema_tags.category {
            Some(Category::Composite) => json!({ "prices1": table.close }),
            _ if schema_tags.data_type.as_deref() == Some("volumes") => {
                let mut args: HashMap<String, Value> = HashMap::new();
                args.insert("prices".to_string(), json!(table.close));
                args.insert("volumes".to_string(), json!(table.volume));
                Value::Object(args.into_iter().collect())
            }
            _ => bind_ohlcv_args(table),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_explicit_ticker() {
        let q = parse_query("Calculate RSI-14 for AAPL over the last 90 days");
        assert_eq!(q.symbol.as_deref(), Some("AAPL"));
        assert_eq!(q.rsi_period, Some(14));
        assert_eq!(q.day_period, Some(90));
    }

    #[test]
    fn does_not_mistake_drawdown_for_dow() {
        let q = parse_query("Calculate MSFT max drawdown over last 250 days");
        assert_eq!(q.symbol.as_deref(), Some("MSFT"));
    }

    #[test]
    fn maps_index_alias_to_symbol() {
        let q = parse_query("What is the S&P 500 doing this quarter?");
        assert_eq!(q.symbol.as_deref(), Some("^GSPC"));
    }

    #[test]
    fn parses_explicit_date_range() {
        let q = parse_query("Get AAPL prices from 2022-06-01 to 2022-09-01");
        assert_eq!(q.start, NaiveDate::from_ymd_opt(2022, 6, 1).unwrap());
        assert_eq!(q.end, NaiveDate::from_ymd_opt(2022, 9, 1).unwrap());
    }

    #[test]
    fn defaults_date_range_when_absent() {
        let q = parse_query("Calculate RSI for AAPL");
        assert_eq!(q.start, NaiveDate::from_ymd_opt(2023, 1, 1).unwrap());
        assert_eq!(q.end, NaiveDate::from_ymd_opt(2023, 12, 31).unwrap());
    }

    #[test]
    fn parses_macd_periods() {
        let q = parse_query("Compute MACD(12, 26, 9) for MSFT");
        assert_eq!(q.macd_periods, Some((12, 26, 9)));
    }

    #[test]
    fn direct_extraction_handles_latest_close() {
        let table = crate::domain::data_provider::OhlcvTable {
            symbol: "AAPL".to_string(),
            dates: vec![],
            open: vec![],
            high: vec![],
            low: vec![],
            close: vec![100.0, 101.0, 102.5],
            volume: vec![],
        };
        let result = direct_extraction("What is the latest close for AAPL?", &table);
        assert_eq!(result, Some(json!(102.5)));
    }
}
