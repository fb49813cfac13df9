use std::sync::Arc;

use tokio::sync::mpsc::UnboundedSender;

use crate::broker::message::Envelope;
use crate::broker::topic::ClientId;

/// What the broker keeps for a registered client: its id and the enqueue
/// side of its inbox.
///
/// The handle does not own the `Client`. Once the client's dispatch loop
/// exits, sends through a stale handle fail and are ignored.
#[derive(Debug, Clone)]
pub struct ClientHandle {
    pub id: ClientId,
    pub sender: UnboundedSender<Arc<Envelope>>,
}

impl ClientHandle {
    pub fn new(id: impl Into<ClientId>, sender: UnboundedSender<Arc<Envelope>>) -> Self {
        Self {
            id: id.into(),
            sender,
        }
    }

    /// Non-blocking enqueue. Returns `false` if the inbox is already closed.
    pub fn deliver(&self, envelope: Arc<Envelope>) -> bool {
        self.sender.send(envelope).is_ok()
    }
}
