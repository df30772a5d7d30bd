// Copyright (c) 2026 Toolsmith Contributors
// SPDX-License-Identifier: Apache-2.0
//! DataProvider domain interface (spec §6.2). Backed by a deterministic
//! record-replay cache (`infrastructure::data_provider::cached`); pure calc
//! tools never fetch data themselves, only the TaskExecutor does.

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OhlcvTable {
    pub symbol: String,
    pub dates: Vec<NaiveDate>,
    pub open: Vec<f64>,
    pub high: Vec<f64>,
    pub low: Vec<f64>,
    pub close: Vec<f64>,
    pub volume: Vec<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quote {
    pub price: f64,
    pub timestamp: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinancialInfo {
    pub symbol: String,
    pub fields: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, thiserror::Error, Clone)]
pub enum DataProviderError {
    #[error("network error: {0}")]
    Network(String),
    #[error("symbol not found: {0}")]
    SymbolNotFound(String),
    #[error("provider does not support this query: {0}")]
    Unsupported(String),
}

#[async_trait]
pub trait DataProvider: Send + Sync {
    async fn get_historical(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<OhlcvTable, DataProviderError>;

    async fn get_quote(&self, symbol: &str) -> Result<Quote, DataProviderError>;

    async fn get_financial_info(&self, symbol: &str) -> Result<FinancialInfo, DataProviderError>;

    async fn get_multi_historical(
        &self,
        symbols: &[String],
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<std::collections::HashMap<String, OhlcvTable>, DataProviderError> {
        let mut out = std::collections::HashMap::new();
        for symbol in symbols {
            out.insert(symbol.clone(), self.get_historical(symbol, start, end).await?);
        }
        Ok(out)
    }
}
