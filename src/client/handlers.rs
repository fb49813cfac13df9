//! Per-client handler table.
//!
//! Resolution is two-phase: an exact-pattern handler for the topic wins;
//! otherwise the first wildcard pattern, in registration order, that
//! matches the topic. Matching goes through `broker::topic::matches`, the
//! same function the broker uses to pick subscribers.

use std::collections::HashMap;
use std::sync::Arc;

use crate::broker::message::Payload;
use crate::broker::topic;

pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;
pub type HandlerResult = Result<(), HandlerError>;

/// Callback invoked with the delivered topic and payload.
pub type Handler = Arc<dyn Fn(&str, &Payload) -> HandlerResult + Send + Sync>;

#[derive(Default)]
pub(crate) struct HandlerTable {
    exact: HashMap<String, Handler>,
    wildcard: Vec<(String, Handler)>,
}

impl HandlerTable {
    /// Registers `handler` for `pattern`. An existing wildcard entry is
    /// replaced in place so it keeps its position.
    pub(crate) fn insert(&mut self, pattern: &str, handler: Handler) {
        if !topic::is_wildcard(pattern) {
            self.exact.insert(pattern.to_string(), handler);
            return;
        }

        match self.wildcard.iter_mut().find(|(p, _)| p.as_str() == pattern) {
            Some(entry) => entry.1 = handler,
            None => self.wildcard.push((pattern.to_string(), handler)),
        }
    }

    /// Returns `false` if nothing was registered for `pattern`.
    pub(crate) fn remove(&mut self, pattern: &str) -> bool {
        if self.exact.remove(pattern).is_some() {
            return true;
        }
        let before = self.wildcard.len();
        self.wildcard.retain(|(p, _)| p.as_str() != pattern);
        self.wildcard.len() != before
    }

    pub(crate) fn resolve(&self, topic: &str) -> Option<Handler> {
        if let Some(handler) = self.exact.get(topic) {
            return Some(Arc::clone(handler));
        }
        self.wildcard
            .iter()
            .find(|(pattern, _)| topic::matches(topic, pattern))
            .map(|(_, handler)| Arc::clone(handler))
    }

    /// Exact patterns (sorted) followed by wildcard patterns in
    /// registration order.
    pub(crate) fn patterns(&self) -> Vec<String> {
        let mut exact: Vec<String> = self.exact.keys().cloned().collect();
        exact.sort();
        exact.extend(self.wildcard.iter().map(|(p, _)| p.clone()));
        exact
    }

    pub(crate) fn clear(&mut self) {
        self.exact.clear();
        self.wildcard.clear();
    }
}
