//! Message envelope
//!
//! `Envelope` wraps every published payload with its routing metadata. The
//! broker builds exactly one per publish call and hands the same
//! `Arc<Envelope>` to every recipient, so the payload is never copied or
//! mutated by delivery.
//!
//! Notes on fields:
//! - `topic`: concrete topic the message was published on
//! - `sender`: id of the publishing client
//! - `timestamp`: milliseconds since UNIX epoch, set by the broker
//! - `message_id`: UUID v4, unique per publish call
//! - `payload`: arbitrary JSON value

use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::broker::topic::ClientId;

pub type Payload = serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    topic: String,
    sender: ClientId,
    timestamp: i64,
    message_id: String,
    payload: Payload,
}

impl Envelope {
    /// Stamp a new envelope with the current time and a fresh id.
    pub fn new(topic: &str, sender: &str, payload: Payload) -> Self {
        Self {
            topic: topic.to_string(),
            sender: sender.to_string(),
            timestamp: Utc::now().timestamp_millis(),
            message_id: Uuid::new_v4().to_string(),
            payload,
        }
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn sender(&self) -> &str {
        &self.sender
    }

    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    pub fn message_id(&self) -> &str {
        &self.message_id
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    /// Decode the payload into a typed value.
    pub fn payload_as<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        T::deserialize(&self.payload)
    }
}
