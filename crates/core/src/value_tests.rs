// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Tests for scalar cell values.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use super::Value;
use yare::parameterized;

#[parameterized(
    whole = { 7.0, "7" },
    negative_whole = { -3.0, "-3" },
    fractional = { 7.5, "7.5" },
    zero = { 0.0, "0" },
)]
fn number_coercion(n: f64, expected: &str) {
    assert_eq!(Value::Number(n).as_cell(), expected);
}

#[test]
fn test_text_is_trimmed() {
    assert_eq!(Value::Text("  EQ-7  ".to_string()).as_cell(), "EQ-7");
}

#[test]
fn test_empty_coerces_to_empty_string() {
    assert_eq!(Value::Empty.as_cell(), "");
}

#[test]
fn test_is_blank() {
    assert!(Value::Empty.is_blank());
    assert!(Value::Text("   ".to_string()).is_blank());
    assert!(!Value::Text("x".to_string()).is_blank());
    assert!(!Value::Number(0.0).is_blank());
}

#[test]
fn test_untagged_serde_round_trip() {
    let text: Value = serde_json::from_str("\"hello\"").unwrap();
    assert_eq!(text, Value::Text("hello".to_string()));

    let num: Value = serde_json::from_str("42.5").unwrap();
    assert_eq!(num, Value::Number(42.5));

    let empty: Value = serde_json::from_str("null").unwrap();
    assert_eq!(empty, Value::Empty);
}

#[test]
fn test_from_conversions() {
    assert_eq!(Value::from("a"), Value::Text("a".to_string()));
    assert_eq!(Value::from(7i64), Value::Number(7.0));
    assert_eq!(Value::from(1.5f64), Value::Number(1.5));
}
