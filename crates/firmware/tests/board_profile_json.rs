//! Integration test: board profiles loaded from JSON.
//!
//! Tests that:
//!   1. The checked-in starter kit profile matches the built-in one
//!   2. Omitted sections fall back to starter kit defaults
//!   3. Invalid geometry and oversized names are rejected at load time
//!
//! Run with: cargo test -p firmware --features std --test board_profile_json

#![cfg(feature = "serde")]
// Integration test file -- intentional test patterns permitted.
#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::indexing_slicing
)]

use ddr2::TimeoutPolicy;
use firmware::BoardProfile;
use serde_json::{json, Value};

const STARTER_KIT_JSON: &str = include_str!("../../../boards/pic32mzda-starter-kit.json");

fn starter_kit_value() -> Value {
    serde_json::from_str(STARTER_KIT_JSON).unwrap()
}

#[test]
fn checked_in_profile_matches_built_in() {
    let profile: BoardProfile = serde_json::from_str(STARTER_KIT_JSON).unwrap();
    assert_eq!(profile, BoardProfile::pic32mzda_starter_kit());
}

#[test]
fn omitted_sections_take_defaults() {
    let mut value = starter_kit_value();
    let map = value.as_object_mut().unwrap();
    map.remove("timeout_policy");
    map.remove("poll_timeout_ms");

    let profile: BoardProfile = serde_json::from_value(value).unwrap();
    assert_eq!(profile.timeout_policy, TimeoutPolicy::BestEffort);
    assert_eq!(profile.poll_timeout_ms, 1_000);
    assert!(profile.arbiter.is_none());
}

#[test]
fn overrides_are_applied() {
    let mut value = starter_kit_value();
    value["timeout_policy"] = json!("FailFast");
    value["mpll"] = json!({
        "reference_hz": 24_000_000,
        "input_divider": 3,
        "multiplier": 40,
        "output_divider1": 2,
        "output_divider2": 1
    });
    let agent = json!({ "min_limit": 2, "request_period": 16, "min_commands": 1 });
    value["arbiter"] = json!({ "agents": vec![agent; 5] });

    let profile: BoardProfile = serde_json::from_value(value).unwrap();
    assert_eq!(profile.timeout_policy, TimeoutPolicy::FailFast);
    assert_eq!(profile.mpll.output_hz().unwrap(), 160_000_000);
    assert_eq!(profile.arbiter.unwrap().agents[4].request_period, 16);
}

#[test]
fn impossible_geometry_is_rejected() {
    let mut value = starter_kit_value();
    value["geometry"]["bank_bits"] = json!(4);
    assert!(serde_json::from_value::<BoardProfile>(value).is_err());
}

#[test]
fn oversized_name_is_rejected() {
    let mut value = starter_kit_value();
    value["name"] = json!("a-board-name-well-past-thirty-two-bytes");
    assert!(serde_json::from_value::<BoardProfile>(value).is_err());
}
