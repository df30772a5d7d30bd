// Copyright (c) 2026 Toolsmith Contributors
// SPDX-License-Identifier: Apache-2.0
//! Static capability enforcement over generated Python source (spec §4.1).
//!
//! No Python-AST crate appears anywhere in the reference corpus this crate
//! was grounded on (see `DESIGN.md`), so this is a conservative,
//! hand-written lexical/structural scanner rather than a real parser: it
//! tokenizes imports, call expressions, attribute accesses, and short
//! string literals with regexes and checks them against
//! [`crate::domain::constraints::Constraints`]. Because this is a security
//! gate and not a compiler front-end, ambiguous or unparseable input fails
//! closed (`SyntaxError: …`) rather than being let through.

use std::sync::LazyLock;

use regex::Regex;

use crate::domain::constraints::Constraints;
use crate::domain::tool::Category;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct StaticCheckViolation(pub String);

static IMPORT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[ \t]*(?:import\s+([A-Za-z_][\w\.]*)|from\s+([A-Za-z_][\w\.]*)\s+import)").unwrap()
});

// Name(...) or .attr(...) call sites.
static NAME_CALL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^|[^\w.])([A-Za-z_][A-Za-z0-9_]*)\s*\(").unwrap());
static ATTR_CALL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\.([A-Za-z_][A-Za-z0-9_]*)\s*\(").unwrap());
static ATTR_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\.([A-Za-z_][A-Za-z0-9_]*)").unwrap());

// Single/double-quoted string literals (not triple-quoted docstrings — those
// are almost never < 50 chars and are excluded to avoid false positives on
// docstrings that merely *mention* a banned name).
static STRING_LITERAL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"'([^'\n]{0,49})'|"([^"\n]{0,49})""#).unwrap());

static ENCODING_COMMENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^[ \t]*#.*coding[:=][ \t]*[-\w.]+").unwrap());

// Argument lists of reflection-style calls capable of turning a string
// literal into a banned name/attribute at runtime. Deliberately narrow: a
// data literal like "open"/"close"/"signal" used as a dict key or column
// name never appears inside one of these call's parens.
static REFLECTION_CALL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|[^\w.])(?:getattr|setattr|delattr|hasattr|__import__|import_module)\s*\(([^)]*)\)").unwrap()
});

pub struct PyAstGuard;

impl PyAstGuard {
    /// `static_check(source, category) -> (ok, reason?)`. Returns `Ok(())`
    /// when every rule in spec §4.1 passes.
    pub fn static_check(source: &str, category: Category, constraints: &Constraints) -> Result<(), StaticCheckViolation> {
        let stripped = Self::strip_encoding_comment(source);

        Self::check_balanced(&stripped)?;

        let allowed = constraints.allowed_for(category);

        for caps in IMPORT_RE.captures_iter(&stripped) {
            let module = caps.get(1).or_else(|| caps.get(2)).map(|m| m.as_str()).unwrap_or("");
            let top_level = module.split('.').next().unwrap_or(module);
            if constraints.always_banned_modules.contains(top_level) {
                return Err(StaticCheckViolation(format!(
                    "banned module import: '{top_level}' is in ALWAYS_BANNED"
                )));
            }
            if !allowed.contains(top_level) {
                return Err(StaticCheckViolation(format!(
                    "module '{top_level}' is not in the allowlist for category"
                )));
            }
        }

        let code_without_strings = STRING_LITERAL_RE.replace_all(&stripped, " ");

        for caps in NAME_CALL_RE.captures_iter(&code_without_strings) {
            let name = &caps[1];
            if constraints.banned_calls.contains(name) {
                return Err(StaticCheckViolation(format!("banned call: '{name}'")));
            }
        }
        for caps in ATTR_CALL_RE.captures_iter(&code_without_strings) {
            let name = &caps[1];
            if constraints.banned_calls.contains(name) {
                return Err(StaticCheckViolation(format!("banned call: '{name}'")));
            }
        }
        for caps in ATTR_RE.captures_iter(&code_without_strings) {
            let attr = &caps[1];
            if constraints.banned_attributes.contains(attr) {
                return Err(StaticCheckViolation(format!("banned attribute access: '{attr}'")));
            }
        }

        // Only string literals passed as an argument to a reflection-style
        // call (`getattr(x, "eval")`, `__import__("os")`, …) are checked
        // against the banned sets, and only by whole-token equality — a
        // literal merely *named* the same as a banned call or module (an
        // OHLCV dict key like "open"/"close", or a tag like "signal") is
        // never itself a reflection target and must pass.
        for call_args in REFLECTION_CALL_RE.captures_iter(&stripped) {
            let args = &call_args[1];
            for lit in STRING_LITERAL_RE.captures_iter(args) {
                let literal = lit.get(1).or_else(|| lit.get(2)).map(|m| m.as_str()).unwrap_or("");
                for banned in constraints.banned_calls.iter().chain(constraints.always_banned_modules.iter()) {
                    if !banned.is_empty() && literal == banned.as_str() {
                        return Err(StaticCheckViolation(format!(
                            "string literal '{literal}' references banned name '{banned}' via reflection"
                        )));
                    }
                }
            }
        }

        Ok(())
    }

    /// Strips PEP-263-style encoding comment lines from the first two lines
    /// (prevents UTF-7 bypass of the scanner above).
    fn strip_encoding_comment(source: &str) -> String {
        let mut lines: Vec<&str> = source.lines().collect();
        for line in lines.iter_mut().take(2) {
            if ENCODING_COMMENT_RE.is_match(line) {
                *line = "";
            }
        }
        lines.join("\n")
    }

    /// A minimal structural sanity check standing in for a real parser:
    /// balanced brackets and balanced quotes. Whitespace at EOF never
    /// affects the result (spec §8 invariant #3).
    fn check_balanced(source: &str) -> Result<(), StaticCheckViolation> {
        let mut stack: Vec<char> = Vec::new();
        let mut chars = source.chars().peekable();
        let mut in_single = false;
        let mut in_double = false;
        let mut in_triple: Option<char> = None;

        while let Some(c) = chars.next() {
            if let Some(q) = in_triple {
                if c == q && chars.clone().take(2).collect::<String>() == format!("{q}{q}") {
                    chars.next();
                    chars.next();
                    in_triple = None;
                }
                continue;
            }
            if in_single {
                if c == '\\' {
                    chars.next();
                } else if c == '\'' {
                    in_single = false;
                }
                continue;
            }
            if in_double {
                if c == '\\' {
                    chars.next();
                } else if c == '"' {
                    in_double = false;
                }
                continue;
            }
            match c {
                '\'' | '"' => {
                    let rest: String = chars.clone().take(2).collect();
                    if rest == format!("{c}{c}") {
                        chars.next();
                        chars.next();
                        in_triple = Some(c);
                    } else if c == '\'' {
                        in_single = true;
                    } else {
                        in_double = true;
                    }
                }
                '(' | '[' | '{' => stack.push(c),
                ')' | ']' | '}' => {
                    let expected = match c {
                        ')' => '(',
                        ']' => '[',
                        _ => '{',
                    };
                    match stack.pop() {
                        Some(open) if open == expected => {}
                        _ => {
                            return Err(StaticCheckViolation(format!(
                                "SyntaxError: unbalanced closing '{c}'"
                            )))
                        }
                    }
                }
                _ => {}
            }
        }

        if !stack.is_empty() {
            return Err(StaticCheckViolation(format!(
                "SyntaxError: unclosed bracket(s): {:?}",
                stack
            )));
        }
        if in_single || in_double || in_triple.is_some() {
            return Err(StaticCheckViolation("SyntaxError: unterminated string literal".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn constraints() -> Constraints {
        Constraints::default()
    }

    #[test]
    fn allows_pandas_for_calculation() {
        let src = "import pandas as pd\n\ndef calc_ma(prices: list[float]) -> float:\n    return sum(prices) / len(prices)\n";
        assert!(PyAstGuard::static_check(src, Category::Calculation, &constraints()).is_ok());
    }

    #[test]
    fn rejects_os_import() {
        let src = "import os\nos.system('ls')\n";
        let err = PyAstGuard::static_check(src, Category::Calculation, &constraints()).unwrap_err();
        assert!(err.0.contains("os"));
    }

    #[test]
    fn rejects_banned_dunder_attribute() {
        let src = "x = ''.__class__.__bases__[0].__subclasses__()\n";
        let err = PyAstGuard::static_check(src, Category::Calculation, &constraints()).unwrap_err();
        assert!(err.0.contains("__class__"));
    }

    #[test]
    fn rejects_indirect_eval_via_string_literal() {
        let src = "x = getattr(obj, 'eval')(1)\n";
        let err = PyAstGuard::static_check(src, Category::Calculation, &constraints()).unwrap_err();
        assert!(err.0.to_lowercase().contains("eval") || err.0.contains("getattr"));
    }

    #[test]
    fn strips_utf7_style_encoding_comment_before_scanning() {
        let src = "# coding: utf-7\nimport os\n";
        let err = PyAstGuard::static_check(src, Category::Calculation, &constraints()).unwrap_err();
        assert!(err.0.contains("os"));
    }

    #[test]
    fn invariant_under_trailing_whitespace() {
        let src = "import pandas\n";
        let padded = format!("{src}\n\n   \n");
        assert_eq!(
            PyAstGuard::static_check(src, Category::Calculation, &constraints()).is_ok(),
            PyAstGuard::static_check(&padded, Category::Calculation, &constraints()).is_ok()
        );
    }

    #[test]
    fn unbalanced_brackets_is_syntax_error() {
        let src = "def f(:\n    return 1\n";
        let err = PyAstGuard::static_check(src, Category::Calculation, &constraints()).unwrap_err();
        assert!(err.0.starts_with("SyntaxError"));
    }
}
