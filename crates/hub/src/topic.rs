// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Topic matching for subscription and cache invalidation:
//! `a.b.c` exact, `a.*.c` single-token wildcard, `a.b.**` zero-or-more
//! trailing tokens.

/// Whether `topic` matches `pattern`. Pure and total = true` for all
/// `t`").
pub fn matches(pattern: &str, topic: &str) -> bool {
    let pattern_tokens: Vec<&str> = pattern.split('.').collect();
    let topic_tokens: Vec<&str> = topic.split('.').collect();
    matches_tokens(&pattern_tokens, &topic_tokens)
}

fn matches_tokens(pattern: &[&str], topic: &[&str]) -> bool {
    match pattern.split_first() {
        None => topic.is_empty(),
        Some(("**", rest)) => {
            // Zero or more trailing tokens: try consuming 0, 1, 2, ... tokens
            // of `topic` against the remainder of the pattern.
            (0..=topic.len()).any(|skip| matches_tokens(rest, &topic[skip..]))
        }
        Some(("*", rest)) => match topic.split_first() {
            Some((_, topic_rest)) => matches_tokens(rest, topic_rest),
            None => false,
        },
        Some((token, rest)) => match topic.split_first() {
            Some((topic_token, topic_rest)) => *token == *topic_token && matches_tokens(rest, topic_rest),
            None => false,
        },
    }
}

#[cfg(test)]
#[path = "topic_tests.rs"]
mod tests;
