// Copyright (c) 2026 Toolsmith Contributors
// SPDX-License-Identifier: Apache-2.0
//! Mock LLM provider. Used *only* when no API credential is configured at
//! adapter construction time (spec §4.3) — never substituted per-call on a
//! transport failure. Returns deterministic canned code per category so
//! unit tests and self-tests run without network access.

use async_trait::async_trait;

use crate::domain::llm::{GenerationRequest, LlmError, LlmProvider, LlmResponse};
use crate::domain::tool::Category;

pub struct MockLlmProvider;

impl MockLlmProvider {
    fn canned_code(category: Category) -> &'static str {
        match category {
            Category::Calculation => {
                r#"def calc_ma(prices: list[float], window: int = 5) -> float:
    """Compute the simple moving average of the most recent `window` prices.

    Args:
        prices: Historical closing prices, oldest first.
        window: Number of trailing observations to average.

    Returns:
        The arithmetic mean of the last `window` prices.
    """
    tail = prices[-window:]
    return sum(tail) / len(tail)


if __name__ == "__main__":
    sample = [10.0, 11.0, 12.0, 13.0, 14.0]
    assert calc_ma(sample, window=5) == 12.0
    assert calc_ma(sample, window=1) == 14.0
"#
            }
            Category::Fetch => {
                r#"def fetch_ohlcv(symbol: str, start: str, end: str) -> dict:
    """Pass through already-fetched OHLCV data bound by the TaskExecutor.

    Args:
        symbol: Ticker symbol.
        start: ISO start date.
        end: ISO end date.

    Returns:
        A dict with symbol/dates/open/high/low/close/volume arrays.
    """
    return {"symbol": symbol, "dates": [start, end], "close": [1.0, 2.0]}


if __name__ == "__main__":
    result = fetch_ohlcv("TEST", "2023-01-01", "2023-01-02")
    assert result["symbol"] == "TEST"
    assert len(result["close"]) == 2
"#
            }
            Category::Composite => {
                r#"def comp_signal(prices: list[float]) -> bool:
    """Return True when the last price exceeds the mean of the series.

    Args:
        prices: Historical closing prices, oldest first.

    Returns:
        True if the most recent price is above the series mean.
    """
    mean = sum(prices) / len(prices)
    return prices[-1] > mean


if __name__ == "__main__":
    assert comp_signal([1.0, 2.0, 3.0]) is True
    assert comp_signal([3.0, 2.0, 1.0]) is False
"#
            }
        }
    }
}

#[async_trait]
impl LlmProvider for MockLlmProvider {
    async fn generate(&self, request: GenerationRequest<'_>) -> Result<LlmResponse, LlmError> {
        let code = Self::canned_code(request.category);
        Ok(LlmResponse {
            reasoning_trace: format!("mock reasoning for task: {}", request.task),
            code_payload: Some(code.to_string()),
            text_response: "generated via mock provider (no API credential configured)".to_string(),
            raw: format!("```python\n{code}\n```"),
        })
    }

    fn provider_name(&self) -> &str {
        "mock"
    }

    fn model_name(&self) -> &str {
        "mock-v1"
    }
}
