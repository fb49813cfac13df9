//! Topic matching and the subscription registry entry.
//!
//! Topics and patterns are `/`-separated segment lists. In a pattern `+`
//! stands for exactly one segment and a trailing `#` for zero or more
//! remaining segments. The same `matches` function is used by the broker to
//! find subscribers and by each client to pick a handler, so the two can
//! never disagree.
//!
//! Concurrency note: `Subscription` is not synchronized on its own; the
//! broker only touches it while holding its registry lock.

use std::collections::HashSet;

use crate::utils::error::{McpError, McpResult};

pub type ClientId = String;

pub const SEPARATOR: char = '/';
pub const SINGLE_LEVEL: &str = "+";
pub const MULTI_LEVEL: &str = "#";

/// Returns `true` if `topic` is matched by `pattern`.
///
/// Patterns without wildcards compare by plain string equality. A `#`
/// ends the match successfully wherever it is met; `validate_pattern`
/// keeps it in final position for anything that gets subscribed.
pub fn matches(topic: &str, pattern: &str) -> bool {
    if !is_wildcard(pattern) {
        return topic == pattern;
    }

    let mut topic_segments = topic.split(SEPARATOR);
    for segment in pattern.split(SEPARATOR) {
        match segment {
            MULTI_LEVEL => return true,
            SINGLE_LEVEL => {
                if topic_segments.next().is_none() {
                    return false;
                }
            }
            literal => {
                if topic_segments.next() != Some(literal) {
                    return false;
                }
            }
        }
    }

    topic_segments.next().is_none()
}

/// Returns the patterns, in iteration order, that match `topic`.
pub fn find_matching_patterns<'a, I>(topic: &str, patterns: I) -> Vec<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    patterns
        .into_iter()
        .filter(|pattern| matches(topic, pattern))
        .collect()
}

/// Whether `pattern` contains a `+` or `#` segment.
pub fn is_wildcard(pattern: &str) -> bool {
    pattern
        .split(SEPARATOR)
        .any(|segment| segment == SINGLE_LEVEL || segment == MULTI_LEVEL)
}

/// Checks a subscription pattern: non-empty, wildcards occupy whole
/// segments, `#` only in last position.
pub fn validate_pattern(pattern: &str) -> McpResult<()> {
    if pattern.is_empty() {
        return Err(McpError::invalid_pattern(pattern, "pattern is empty"));
    }

    let segments: Vec<&str> = pattern.split(SEPARATOR).collect();
    let last = segments.len() - 1;

    for (position, segment) in segments.iter().enumerate() {
        match *segment {
            MULTI_LEVEL if position != last => {
                return Err(McpError::invalid_pattern(
                    pattern,
                    "'#' must be the last segment",
                ));
            }
            MULTI_LEVEL | SINGLE_LEVEL => {}
            other if other.contains(['+', '#']) => {
                return Err(McpError::invalid_pattern(
                    pattern,
                    format!("wildcard mixed into segment '{other}' at position {position}"),
                ));
            }
            _ => {}
        }
    }

    Ok(())
}

/// Checks a concrete publish topic: non-empty and free of wildcards.
pub fn validate_topic(topic: &str) -> McpResult<()> {
    if topic.is_empty() {
        return Err(McpError::invalid_topic(topic, "topic is empty"));
    }
    if topic.contains(['+', '#']) {
        return Err(McpError::invalid_topic(
            topic,
            "wildcards are only allowed in subscription patterns",
        ));
    }
    Ok(())
}

/// One registered pattern and the clients subscribed to it.
///
/// Duplicate subscribes are a no-op. The broker drops the entry once
/// `is_empty` turns true.
#[derive(Debug, Default)]
pub struct Subscription {
    pub pattern: String,
    pub subscribers: HashSet<ClientId>,
}

impl Subscription {
    pub fn new(pattern: &str) -> Self {
        Self {
            pattern: pattern.to_string(),
            subscribers: HashSet::new(),
        }
    }

    /// Add a subscriber. Returns `false` if it was already present.
    pub fn subscribe(&mut self, id: ClientId) -> bool {
        self.subscribers.insert(id)
    }

    /// Remove a subscriber. Returns `false` if it was not present.
    pub fn unsubscribe(&mut self, id: &str) -> bool {
        self.subscribers.remove(id)
    }

    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }
}
