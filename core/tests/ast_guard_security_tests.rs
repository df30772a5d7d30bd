// Copyright (c) 2026 Toolsmith Contributors
// SPDX-License-Identifier: Apache-2.0
//! `static_check` rejects the closed banned sets (spec §6.5) and is
//! invariant under PEP-263 encoding-line/trailing-whitespace stripping
//! (spec §8 invariant #3).

use toolsmith_core::domain::constraints::Constraints;
use toolsmith_core::domain::tool::Category;
use toolsmith_core::infrastructure::ast_guard::PyAstGuard;

#[test]
fn rejects_always_banned_module_import() {
    let err = PyAstGuard::static_check("import subprocess\n", Category::Calculation, &Constraints::default()).unwrap_err();
    assert!(err.0.to_lowercase().contains("subprocess"));
}

#[test]
fn rejects_banned_call_even_when_aliased_via_builtins() {
    let err = PyAstGuard::static_check("eval('1 + 1')\n", Category::Calculation, &Constraints::default()).unwrap_err();
    assert!(err.0.to_lowercase().contains("eval"));
}

#[test]
fn rejects_dunder_reflection_attribute_access() {
    let source = "def f(x):\n    return x.__class__.__bases__\n";
    let err = PyAstGuard::static_check(source, Category::Calculation, &Constraints::default()).unwrap_err();
    assert!(err.0.contains("__bases__") || err.0.contains("__class__"));
}

#[test]
fn fetch_category_permits_network_read_but_not_process_spawn() {
    let constraints = Constraints::default();
    let fetch_source = "import market_data_client\ndef fetch(symbol):\n    return market_data_client.get(symbol)\n";
    assert!(PyAstGuard::static_check(fetch_source, Category::Fetch, &constraints).is_ok());

    let spawn_source = "import subprocess\ndef fetch(symbol):\n    return subprocess.run(['ls'])\n";
    assert!(PyAstGuard::static_check(spawn_source, Category::Fetch, &constraints).is_err());
}

#[test]
fn static_check_invariant_under_encoding_line_and_trailing_whitespace() {
    let constraints = Constraints::default();
    let plain = "def calc_ma(prices):\n    return sum(prices) / len(prices)\n";
    let with_encoding = "# -*- coding: utf-8 -*-\ndef calc_ma(prices):\n    return sum(prices) / len(prices)\n   \n\n";

    let plain_result = PyAstGuard::static_check(plain, Category::Calculation, &constraints);
    let decorated_result = PyAstGuard::static_check(with_encoding, Category::Calculation, &constraints);

    assert_eq!(plain_result.is_ok(), decorated_result.is_ok());
}
