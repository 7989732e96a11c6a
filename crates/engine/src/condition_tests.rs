// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

#[parameterized(
    num_eq = { "1 == 1", true },
    num_ne = { "1 != 2", true },
    num_lt = { "2 < 10", true },
    num_le = { "10 <= 10", true },
    num_gt = { "3 > 5", false },
    num_ge = { "5 >= 6", false },
    float_cmp = { "1.5 < 1.6", true },
    str_eq = { "abc == abc", true },
    str_ne = { "abc != abd", true },
    str_lexical = { "abc < abd", true },
    quoted = { "'hello world' == 'hello world'", true },
    double_quoted = { "\"a b\" != \"a c\"", true },
    bool_literal = { "true", true },
    bool_false = { "false", false },
    not = { "!false", true },
    and = { "1 == 1 && 2 == 2", true },
    and_short = { "1 == 2 && 2 == 2", false },
    or = { "1 == 2 || 2 == 2", true },
    parens = { "(1 == 2 || 2 == 2) && 3 == 3", true },
    nested_not = { "!(1 == 2)", true },
)]
fn evaluates(expr: &str, expect: bool) {
    assert_eq!(ConditionEvaluator::evaluate(expr).unwrap(), expect, "{expr}");
}

#[test]
fn empty_condition_means_run() {
    assert!(ConditionEvaluator::should_run(None).unwrap());
    assert!(ConditionEvaluator::should_run(Some("")).unwrap());
    assert!(ConditionEvaluator::should_run(Some("   ")).unwrap());
}

#[test]
fn false_condition_means_skip() {
    assert!(!ConditionEvaluator::should_run(Some("1 == 2")).unwrap());
}

#[parameterized(
    unterminated = { "'abc == 1" },
    trailing = { "1 == 1 extra" },
    missing_paren = { "(1 == 1" },
    bare_operator = { "==" },
)]
fn parse_errors(expr: &str) {
    assert!(ConditionEvaluator::evaluate(expr).is_err(), "{expr}");
}

#[test]
fn non_boolean_value_errors() {
    assert!(matches!(
        ConditionEvaluator::evaluate("banana"),
        Err(ConditionError::NotBoolean(_))
    ));
}

#[test]
fn numbers_compare_numerically_not_lexically() {
    // lexically "10" < "9"; numerically it is not
    assert!(!ConditionEvaluator::evaluate("10 < 9").unwrap());
}
