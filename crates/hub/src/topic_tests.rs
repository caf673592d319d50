// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

#[parameterized(
    exact = { "a.b.c", "a.b.c", true },
    exact_mismatch = { "a.b.c", "a.b.d", false },
    single_wildcard_hits = { "a.*.c", "a.x.c", true },
    single_wildcard_wrong_arity = { "a.*.c", "a.x.y.c", false },
    trailing_glob_bare = { "a.b.**", "a.b", true },
    trailing_glob_one = { "a.b.**", "a.b.x", true },
    trailing_glob_many = { "a.b.**", "a.b.x.y", true },
    trailing_glob_wrong_prefix = { "a.b.**", "a.c.x", false },
    bare_glob_matches_everything = { "**", "device.boiler.pump-1.changed", true },
)]
fn table(pattern: &str, topic: &str, expected: bool) {
    assert_eq!(matches(pattern, topic), expected);
}

#[test]
fn bare_glob_matches_the_empty_topic() {
    assert!(matches("**", ""));
}

#[test]
fn token_rotation_invariant_pattern_only_matches_itself() {
    // A wildcard-free pattern matches only the exact same token
    // sequence, never a rotation of it.
    assert!(matches("a.b.c", "a.b.c"));
    assert!(!matches("a.b.c", "b.c.a"));
}
