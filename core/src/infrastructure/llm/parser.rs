// Copyright (c) 2026 Toolsmith Contributors
// SPDX-License-Identifier: Apache-2.0
//! Parses a raw model response into `{reasoning_trace, code_payload,
//! text_response}` (spec §4.3 "Parsing").

use std::sync::LazyLock;

use regex::Regex;

static THINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<think>(.*?)</think>").unwrap());
static CODE_BLOCK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```(?:python)?\s*\n(.*?)```").unwrap());

pub struct ParsedResponse {
    pub reasoning_trace: String,
    pub code_payload: Option<String>,
    pub text_response: String,
}

/// Extracts the optional `<think>...</think>` reasoning trace and the first
/// fenced ` ```python ` block as `code_payload`. Everything else
/// (with the think block and code fence removed) becomes `text_response`.
pub fn parse(raw: &str) -> ParsedResponse {
    let reasoning_trace = THINK_RE
        .captures(raw)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
        .unwrap_or_default();

    let without_think = THINK_RE.replace(raw, "").to_string();

    let code_payload = CODE_BLOCK_RE
        .captures(&without_think)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim_end().to_string());

    let text_response = CODE_BLOCK_RE.replace(&without_think, "").trim().to_string();

    ParsedResponse { reasoning_trace, code_payload, text_response }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_think_block_and_code_block() {
        let raw = "<think>reasoning here</think>\nHere is the code:\n```python\ndef f():\n    return 1\n```\nDone.";
        let parsed = parse(raw);
        assert_eq!(parsed.reasoning_trace, "reasoning here");
        assert_eq!(parsed.code_payload.unwrap().trim(), "def f():\n    return 1");
        assert!(parsed.text_response.contains("Here is the code"));
        assert!(parsed.text_response.contains("Done."));
    }

    #[test]
    fn no_code_block_yields_none_payload() {
        let raw = "I could not generate a solution for this task.";
        let parsed = parse(raw);
        assert!(parsed.code_payload.is_none());
        assert_eq!(parsed.text_response, raw);
    }

    #[test]
    fn missing_think_block_is_not_an_error() {
        let raw = "```python\nx = 1\n```";
        let parsed = parse(raw);
        assert_eq!(parsed.reasoning_trace, "");
        assert_eq!(parsed.code_payload.unwrap().trim(), "x = 1");
    }
}
