// Copyright (c) 2026 Toolsmith Contributors
// SPDX-License-Identifier: Apache-2.0
//! Record-replay cache wrapping any [`DataProvider`]. Cache key is
//! `md5(func_name, args_repr)` (spec §6.3) so repeated calls with the same
//! arguments during a single evolution run — or across replayed test
//! fixtures — avoid refetching from the underlying provider.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::NaiveDate;
use md5::{Digest, Md5};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, warn};

use crate::domain::data_provider::{DataProvider, DataProviderError, FinancialInfo, OhlcvTable, Quote};

pub struct CachedDataProvider<P: DataProvider> {
    inner: P,
    cache_dir: PathBuf,
}

impl<P: DataProvider> CachedDataProvider<P> {
    pub fn new(inner: P, cache_dir: impl Into<PathBuf>) -> Self {
        Self { inner, cache_dir: cache_dir.into() }
    }

    fn cache_key(func: &str, args_repr: &str) -> String {
        let mut hasher = Md5::new();
        hasher.update(func.as_bytes());
        hasher.update(b":");
        hasher.update(args_repr.as_bytes());
        hex::encode(hasher.finalize())
    }

    fn cache_path(&self, key: &str) -> PathBuf {
        self.cache_dir.join(format!("{key}.json"))
    }

    async fn read_cached<T: DeserializeOwned>(&self, path: &Path) -> Option<T> {
        let bytes = tokio::fs::read(path).await.ok()?;
        match serde_json::from_slice(&bytes) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(error = %e, path = %path.display(), "cache entry failed to deserialize, refetching");
                None
            }
        }
    }

    async fn write_cached<T: Serialize>(&self, path: &Path, value: &T) {
        if let Err(e) = tokio::fs::create_dir_all(&self.cache_dir).await {
            warn!(error = %e, "failed to create data-provider cache directory");
            return;
        }
        match serde_json::to_vec_pretty(value) {
            Ok(bytes) => {
                if let Err(e) = tokio::fs::write(path, bytes).await {
                    warn!(error = %e, path = %path.display(), "failed to write cache entry");
                }
            }
            Err(e) => warn!(error = %e, "failed to serialize cache entry"),
        }
    }
}

#[async_trait]
impl<P: DataProvider> DataProvider for CachedDataProvider<P> {
    async fn get_historical(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<OhlcvTable, DataProviderError> {
        let args_repr = format!("{symbol}:{start}:{end}");
        let key = Self::cache_key("get_historical", &args_repr);
        let path = self.cache_path(&key);

        if let Some(cached) = self.read_cached::<OhlcvTable>(&path).await {
            debug!(symbol, %key, "data-provider cache hit");
            return Ok(cached);
        }

        let result = self.inner.get_historical(symbol, start, end).await?;
        self.write_cached(&path, &result).await;
        Ok(result)
    }

    async fn get_quote(&self, symbol: &str) -> Result<Quote, DataProviderError> {
        let key = Self::cache_key("get_quote", symbol);
        let path = self.cache_path(&key);

        if let Some(cached) = self.read_cached::<Quote>(&path).await {
            return Ok(cached);
        }

        let result = self.inner.get_quote(symbol).await?;
        self.write_cached(&path, &result).await;
        Ok(result)
    }

    async fn get_financial_info(&self, symbol: &str) -> Result<FinancialInfo, DataProviderError> {
        let key = Self::cache_key("get_financial_info", symbol);
        let path = self.cache_path(&key);

        if let Some(cached) = self.read_cached::<FinancialInfo>(&path).await {
            return Ok(cached);
        }

        let result = self.inner.get_financial_info(symbol).await?;
        self.write_cached(&path, &result).await;
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::data_provider::sample::DeterministicSampleProvider;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[tokio::test]
    async fn second_call_is_served_from_cache() {
        let dir = tempfile::tempdir().unwrap();
        let cached = CachedDataProvider::new(DeterministicSampleProvider::new(), dir.path());

        let first = cached.get_historical("AAPL", date(2023, 1, 1), date(2023, 1, 5)).await.unwrap();
        let cache_files_after_first = std::fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(cache_files_after_first, 1);

        let second = cached.get_historical("AAPL", date(2023, 1, 1), date(2023, 1, 5)).await.unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn cache_key_differs_by_function_and_args() {
        let a = CachedDataProvider::<DeterministicSampleProvider>::cache_key("get_quote", "AAPL");
        let b = CachedDataProvider::<DeterministicSampleProvider>::cache_key("get_quote", "MSFT");
        let c = CachedDataProvider::<DeterministicSampleProvider>::cache_key("get_historical", "AAPL");
        assert_ne!(a, b);
        assert_ne!(a, c);
    }
}
