// Copyright (c) 2026 Toolsmith Contributors
// SPDX-License-Identifier: Apache-2.0
//! Deterministic synthetic OHLCV generator. This is *not* the concrete
//! market-data client (out of scope) — it exists purely so the Verifier's
//! integration stage and bootstrap fixtures have reproducible sample data
//! without a network dependency. A fixed-seed linear congruential
//! generator is enough here; quality randomness is not the goal,
//! bit-for-bit reproducibility across runs is (spec §6.3/§8).

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, NaiveDate};

use crate::domain::data_provider::{DataProvider, DataProviderError, FinancialInfo, OhlcvTable, Quote};

/// Numeric-recipes constants for a 32-bit LCG; chosen only for determinism,
/// not cryptographic quality.
const LCG_MULTIPLIER: u64 = 1_664_525;
const LCG_INCREMENT: u64 = 1_013_904_223;

struct Lcg {
    state: u64,
}

impl Lcg {
    fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    fn next_u32(&mut self) -> u32 {
        self.state = self.state.wrapping_mul(LCG_MULTIPLIER).wrapping_add(LCG_INCREMENT);
        (self.state >> 16) as u32
    }

    /// Uniform float in `[lo, hi)`.
    fn next_range(&mut self, lo: f64, hi: f64) -> f64 {
        let fraction = self.next_u32() as f64 / u32::MAX as f64;
        lo + fraction * (hi - lo)
    }
}

fn seed_from_symbol(symbol: &str) -> u64 {
    symbol.bytes().fold(0x1234_5678_9abc_def0_u64, |acc, b| acc.wrapping_mul(31).wrapping_add(b as u64))
}

/// Deterministic OHLCV generator, seeded from the symbol string so the same
/// symbol always yields the same series regardless of when it's requested.
pub struct DeterministicSampleProvider;

impl DeterministicSampleProvider {
    pub fn new() -> Self {
        Self
    }

    fn generate_series(symbol: &str, start: NaiveDate, end: NaiveDate) -> OhlcvTable {
        let mut rng = Lcg::new(seed_from_symbol(symbol));
        let mut dates = Vec::new();
        let mut open = Vec::new();
        let mut high = Vec::new();
        let mut low = Vec::new();
        let mut close = Vec::new();
        let mut volume = Vec::new();

        let mut price = rng.next_range(50.0, 150.0);
        let mut cursor = start;
        while cursor <= end {
            // Skip weekends so the series looks like real trading data.
            let weekday = cursor.format("%u").to_string();
            if weekday != "6" && weekday != "7" {
                let day_open = price;
                let drift = rng.next_range(-0.02, 0.02);
                let day_close = (day_open * (1.0 + drift)).max(0.01);
                let day_high = day_open.max(day_close) * rng.next_range(1.0, 1.015);
                let day_low = day_open.min(day_close) * rng.next_range(0.985, 1.0);

                dates.push(cursor);
                open.push(day_open);
                high.push(day_high);
                low.push(day_low);
                close.push(day_close);
                volume.push(rng.next_range(1_000.0, 100_000.0).round());

                price = day_close;
            }
            cursor += ChronoDuration::days(1);
        }

        OhlcvTable { symbol: symbol.to_string(), dates, open, high, low, close, volume }
    }
}

impl Default for DeterministicSampleProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DataProvider for DeterministicSampleProvider {
    async fn get_historical(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<OhlcvTable, DataProviderError> {
        if start > end {
            return Err(DataProviderError::Unsupported(format!(
                "start date {start} is after end date {end}"
            )));
        }
        Ok(Self::generate_series(symbol, start, end))
    }

    async fn get_quote(&self, symbol: &str) -> Result<Quote, DataProviderError> {
        let mut rng = Lcg::new(seed_from_symbol(symbol));
        Ok(Quote { price: rng.next_range(50.0, 150.0), timestamp: "1970-01-01T00:00:00Z".to_string() })
    }

    async fn get_financial_info(&self, symbol: &str) -> Result<FinancialInfo, DataProviderError> {
        let mut rng = Lcg::new(seed_from_symbol(symbol));
        let mut fields = serde_json::Map::new();
        fields.insert("market_cap".to_string(), serde_json::json!(rng.next_range(1.0e9, 1.0e12)));
        fields.insert("pe_ratio".to_string(), serde_json::json!(rng.next_range(5.0, 40.0)));
        Ok(FinancialInfo { symbol: symbol.to_string(), fields })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[tokio::test]
    async fn generation_is_deterministic_across_calls() {
        let provider = DeterministicSampleProvider::new();
        let a = provider.get_historical("AAPL", date(2023, 1, 1), date(2023, 1, 31)).await.unwrap();
        let b = provider.get_historical("AAPL", date(2023, 1, 1), date(2023, 1, 31)).await.unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn different_symbols_yield_different_series() {
        let provider = DeterministicSampleProvider::new();
        let a = provider.get_historical("AAPL", date(2023, 1, 1), date(2023, 1, 10)).await.unwrap();
        let b = provider.get_historical("MSFT", date(2023, 1, 1), date(2023, 1, 10)).await.unwrap();
        assert_ne!(a.close, b.close);
    }

    #[tokio::test]
    async fn inverted_range_is_rejected() {
        let provider = DeterministicSampleProvider::new();
        let result = provider.get_historical("AAPL", date(2023, 1, 31), date(2023, 1, 1)).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn weekends_are_excluded() {
        let provider = DeterministicSampleProvider::new();
        // 2023-01-07/08 is a Sat/Sun.
        let table = provider.get_historical("AAPL", date(2023, 1, 6), date(2023, 1, 9)).await.unwrap();
        assert_eq!(table.dates, vec![date(2023, 1, 6), date(2023, 1, 9)]);
    }
}
