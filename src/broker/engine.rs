//! Broker engine
//!
//! The in-memory router every `Client` is attached to. It keeps two
//! registries:
//! - pattern -> set of subscribed client ids
//! - client id -> `ClientHandle` (the enqueue side of that client's inbox)
//!
//! Concurrency and usage notes:
//! - Both registries sit behind one lock, and `publish` holds it for the
//!   whole match-and-enqueue pass. Publishes are therefore totally ordered,
//!   and every subscriber sees them in that order.
//! - Enqueueing is a non-blocking send on an unbounded channel, so a slow
//!   subscriber never stalls a publisher.
//! - Nothing here runs on its own thread. All work happens on the caller.
//! - Unknown ids and patterns are normal in a fleet where clients come and
//!   go, so none of the operations fail on them.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, trace, warn};

use crate::broker::message::{Envelope, Payload};
use crate::broker::topic::{self, ClientId, Subscription};
use crate::client::ClientHandle;
use crate::config::BrokerSettings;
use crate::utils::error::McpResult;

#[derive(Debug, Default)]
struct Registry {
    patterns: HashMap<String, Subscription>,
    clients: HashMap<ClientId, ClientHandle>,
}

#[derive(Debug, Default)]
pub struct Broker {
    registry: Mutex<Registry>,
    settings: BrokerSettings,
}

impl Broker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_settings(settings: BrokerSettings) -> Self {
        Self {
            registry: Mutex::new(Registry::default()),
            settings,
        }
    }

    /// Adds a client to the client registry. A second registration under
    /// the same id replaces the first handle.
    pub fn register(&self, client: ClientHandle) {
        let id = client.id.clone();
        let mut registry = self.registry.lock();
        if registry.clients.insert(id.clone(), client).is_some() {
            warn!(client = %id, "client id registered twice, previous handle replaced");
        } else {
            debug!(client = %id, "registered client");
        }
    }

    /// Removes a client from every subscription and from the client
    /// registry. Unknown ids are ignored.
    pub fn unregister(&self, client_id: &str) {
        let mut registry = self.registry.lock();
        let removed = registry.clients.remove(client_id).is_some();

        registry.patterns.retain(|_, subscription| {
            if subscription.unsubscribe(client_id) {
                trace!(client = %client_id, pattern = %subscription.pattern, "dropped subscription");
            }
            !subscription.is_empty()
        });

        if removed {
            debug!(client = %client_id, "unregistered client");
        }
    }

    /// Subscribes `client_id` to `pattern`, creating the pattern entry if
    /// needed. Repeated calls with the same pair are a no-op.
    pub fn subscribe(&self, client_id: &str, pattern: &str) -> McpResult<()> {
        topic::validate_pattern(pattern)?;

        let mut registry = self.registry.lock();
        let subscription = registry
            .patterns
            .entry(pattern.to_string())
            .or_insert_with(|| Subscription::new(pattern));

        if subscription.subscribe(client_id.to_string()) {
            debug!(client = %client_id, %pattern, "subscribed");
        }
        Ok(())
    }

    /// Removes `client_id` from `pattern`. The pattern entry goes away with
    /// its last subscriber.
    pub fn unsubscribe(&self, client_id: &str, pattern: &str) {
        let mut registry = self.registry.lock();
        let Some(subscription) = registry.patterns.get_mut(pattern) else {
            trace!(client = %client_id, %pattern, "unsubscribe for unknown pattern");
            return;
        };

        if subscription.unsubscribe(client_id) {
            debug!(client = %client_id, %pattern, "unsubscribed");
        }
        if subscription.is_empty() {
            registry.patterns.remove(pattern);
        }
    }

    /// Routes `payload` on `topic` to every matching subscriber except the
    /// sender.
    ///
    /// Fire-and-forget: missing subscribers and unmatched topics are logged
    /// at debug level and otherwise ignored. An invalid topic is dropped with
    /// a warning.
    pub fn publish(&self, sender_id: &str, topic: &str, payload: Payload) {
        if let Err(e) = topic::validate_topic(topic) {
            warn!(client = %sender_id, error = %e, "dropping publish");
            return;
        }

        let envelope = Arc::new(Envelope::new(topic, sender_id, payload));
        let registry = self.registry.lock();

        let matching = topic::find_matching_patterns(
            topic,
            registry.patterns.keys().map(String::as_str),
        );
        if matching.is_empty() {
            debug!(%topic, message_id = %envelope.message_id(), "no subscribers for topic");
            return;
        }

        let mut seen: HashSet<&str> = HashSet::new();
        let mut delivered = 0usize;

        for pattern in matching {
            let Some(subscription) = registry.patterns.get(pattern) else {
                continue;
            };
            for subscriber in &subscription.subscribers {
                if subscriber == sender_id {
                    continue;
                }
                if !self.settings.deliver_per_pattern && !seen.insert(subscriber.as_str()) {
                    continue;
                }

                match registry.clients.get(subscriber) {
                    Some(client) if client.deliver(Arc::clone(&envelope)) => {
                        trace!(client = %subscriber, %topic, %pattern, "enqueued");
                        delivered += 1;
                    }
                    Some(_) => {
                        debug!(client = %subscriber, %topic, "inbox closed, skipping");
                    }
                    None => {
                        debug!(client = %subscriber, %topic, "subscriber not registered, skipping");
                    }
                }
            }
        }

        trace!(%topic, message_id = %envelope.message_id(), delivered, "published");
    }

    /// Registered patterns, sorted.
    pub fn patterns(&self) -> Vec<String> {
        let registry = self.registry.lock();
        let mut patterns: Vec<String> = registry.patterns.keys().cloned().collect();
        patterns.sort();
        patterns
    }

    /// Subscribers of `pattern`, sorted. Empty for unknown patterns.
    pub fn subscribers(&self, pattern: &str) -> Vec<ClientId> {
        let registry = self.registry.lock();
        let mut subscribers: Vec<ClientId> = registry
            .patterns
            .get(pattern)
            .map(|s| s.subscribers.iter().cloned().collect())
            .unwrap_or_default();
        subscribers.sort();
        subscribers
    }

    pub fn is_registered(&self, client_id: &str) -> bool {
        self.registry.lock().clients.contains_key(client_id)
    }

    pub fn client_count(&self) -> usize {
        self.registry.lock().clients.len()
    }
}
