//! Client
//!
//! A `Client` is what a device manager, pipeline or rule holds to talk on
//! the bus. Construction registers it with the broker and spawns its
//! dispatch loop on the current Tokio runtime. The loop drains the client's
//! inbox in FIFO order and hands each envelope to the best-matching handler.
//!
//! Lifecycle: `Running -> Closing -> Closed`, never back. After `close()`
//! the client is inert: subscribe, unsubscribe and publish log a warning
//! and do nothing.
//!
//! Handlers run inline on the dispatch task. A handler that returns an
//! error or panics is logged and the loop carries on with the next message.
//! Handlers should not block for long, as that delays every later message
//! for this client.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use tokio::runtime::Handle;
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tokio::sync::watch;
use tokio::task::{AbortHandle, JoinHandle};
use tracing::{debug, error, info, trace, warn};
use uuid::Uuid;

use crate::broker::Broker;
use crate::broker::message::{Envelope, Payload};
use crate::broker::topic::{self, ClientId};
use crate::client::handle::ClientHandle;
use crate::client::handlers::{HandlerResult, HandlerTable};
use crate::config::ClientSettings;
use crate::utils::error::{McpError, McpResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientState {
    Running,
    Closing,
    Closed,
}

pub struct Client {
    id: ClientId,
    broker: Arc<Broker>,
    handlers: Arc<RwLock<HandlerTable>>,
    state: RwLock<ClientState>,
    shutdown: watch::Sender<bool>,
    worker: Mutex<Option<JoinHandle<()>>>,
    settings: ClientSettings,
}

impl Client {
    /// Creates a client with default settings. A `None` id generates
    /// `client-<uuid>`.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn new(broker: Arc<Broker>, id: Option<&str>) -> McpResult<Self> {
        Self::with_settings(broker, id, ClientSettings::default())
    }

    pub fn with_settings(
        broker: Arc<Broker>,
        id: Option<&str>,
        settings: ClientSettings,
    ) -> McpResult<Self> {
        let runtime = Handle::try_current().map_err(|_| McpError::NoRuntime)?;
        let id = match id {
            Some(id) => id.to_string(),
            None => format!("client-{}", Uuid::new_v4()),
        };

        let (tx, rx) = mpsc::unbounded_channel();
        let (shutdown, shutdown_rx) = watch::channel(false);
        let handlers = Arc::new(RwLock::new(HandlerTable::default()));

        broker.register(ClientHandle::new(id.clone(), tx));
        let worker = runtime.spawn(dispatch_loop(
            id.clone(),
            rx,
            Arc::clone(&handlers),
            shutdown_rx,
        ));

        info!(client = %id, "client started");

        Ok(Self {
            id,
            broker,
            handlers,
            state: RwLock::new(ClientState::Running),
            shutdown,
            worker: Mutex::new(Some(worker)),
            settings,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn state(&self) -> ClientState {
        *self.state.read()
    }

    pub fn is_running(&self) -> bool {
        self.state() == ClientState::Running
    }

    /// Patterns this client has handlers for.
    pub fn patterns(&self) -> Vec<String> {
        self.handlers.read().patterns()
    }

    /// Registers `handler` for `pattern` and subscribes with the broker.
    ///
    /// Re-subscribing a pattern replaces its handler. Invalid patterns are
    /// rejected before any state changes.
    pub fn subscribe<F>(&self, pattern: &str, handler: F) -> McpResult<()>
    where
        F: Fn(&str, &Payload) -> HandlerResult + Send + Sync + 'static,
    {
        let state = self.state.read();
        if *state != ClientState::Running {
            warn!(client = %self.id, %pattern, state = ?*state, "subscribe on inactive client ignored");
            return Ok(());
        }

        topic::validate_pattern(pattern)?;
        // local first, so nothing routed by the broker arrives unhandled
        self.handlers.write().insert(pattern, Arc::new(handler));
        self.broker.subscribe(&self.id, pattern)
    }

    pub fn unsubscribe(&self, pattern: &str) {
        let state = self.state.read();
        if *state != ClientState::Running {
            warn!(client = %self.id, %pattern, state = ?*state, "unsubscribe on inactive client ignored");
            return;
        }

        self.broker.unsubscribe(&self.id, pattern);
        if !self.handlers.write().remove(pattern) {
            debug!(client = %self.id, %pattern, "unsubscribe for pattern without handler");
        }
    }

    /// Publishes `payload` on `topic` to every other matching subscriber.
    ///
    /// Only fails if `payload` cannot be serialized.
    pub fn publish<T>(&self, topic: &str, payload: &T) -> McpResult<()>
    where
        T: Serialize + ?Sized,
    {
        let state = self.state.read();
        if *state != ClientState::Running {
            warn!(client = %self.id, %topic, state = ?*state, "publish on inactive client ignored");
            return Ok(());
        }

        let payload = serde_json::to_value(payload)?;
        self.broker.publish(&self.id, topic, payload);
        Ok(())
    }

    /// Stops the dispatch loop and unregisters from the broker.
    ///
    /// Waits at most `close_timeout` for the loop, then aborts it. Messages
    /// still queued are discarded. Calling it again is a no-op. If the
    /// returned future is dropped before completion, the loop is aborted and
    /// the client still ends up unregistered and `Closed`.
    pub async fn close(&self) {
        {
            let mut state = self.state.write();
            if *state != ClientState::Running {
                debug!(client = %self.id, state = ?*state, "close on inactive client ignored");
                return;
            }
            *state = ClientState::Closing;
        }

        self.shutdown.send_replace(true);

        let worker = self.worker.lock().take();
        // finishes the close even if this future is dropped mid-wait
        let mut guard = CloseGuard {
            client: self,
            abort: worker.as_ref().map(JoinHandle::abort_handle),
        };

        if let Some(worker) = worker {
            match tokio::time::timeout(self.settings.close_timeout(), worker).await {
                Ok(Ok(())) => {
                    guard.abort = None;
                }
                Ok(Err(e)) => {
                    warn!(client = %self.id, error = %e, "dispatch loop ended abnormally");
                }
                Err(_) => {
                    warn!(
                        client = %self.id,
                        timeout_ms = self.settings.close_timeout_ms,
                        "dispatch loop did not stop in time, aborting"
                    );
                }
            }
        }
    }

    fn finish_close(&self) {
        self.broker.unregister(&self.id);
        self.handlers.write().clear();
        *self.state.write() = ClientState::Closed;
        info!(client = %self.id, "client closed");
    }
}

/// Aborts a still-running dispatch loop and completes the close when
/// dropped.
struct CloseGuard<'a> {
    client: &'a Client,
    abort: Option<AbortHandle>,
}

impl Drop for CloseGuard<'_> {
    fn drop(&mut self) {
        if let Some(abort) = self.abort.take() {
            abort.abort();
        }
        self.client.finish_close();
    }
}

impl Drop for Client {
    fn drop(&mut self) {
        if self.state() != ClientState::Closed {
            self.shutdown.send_replace(true);
            self.finish_close();
        }
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("id", &self.id)
            .field("state", &self.state())
            .field("patterns", &self.patterns())
            .finish()
    }
}

async fn dispatch_loop(
    client_id: ClientId,
    mut inbox: UnboundedReceiver<Arc<Envelope>>,
    handlers: Arc<RwLock<HandlerTable>>,
    mut shutdown: watch::Receiver<bool>,
) {
    debug!(client = %client_id, "dispatch loop started");

    loop {
        let envelope = tokio::select! {
            biased;
            _ = shutdown.changed() => break,
            next = inbox.recv() => match next {
                Some(envelope) => envelope,
                None => break,
            },
        };

        dispatch(&client_id, &handlers, &envelope);
    }

    inbox.close();
    let mut discarded = 0usize;
    while inbox.try_recv().is_ok() {
        discarded += 1;
    }

    debug!(client = %client_id, discarded, "dispatch loop stopped");
}

fn dispatch(client_id: &str, handlers: &RwLock<HandlerTable>, envelope: &Envelope) {
    let handler = handlers.read().resolve(envelope.topic());
    let Some(handler) = handler else {
        debug!(
            client = %client_id,
            topic = %envelope.topic(),
            message_id = %envelope.message_id(),
            "no handler for topic, dropping"
        );
        return;
    };

    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        handler(envelope.topic(), envelope.payload())
    }));

    match outcome {
        Ok(Ok(())) => {
            trace!(client = %client_id, message_id = %envelope.message_id(), "handled");
        }
        Ok(Err(e)) => {
            error!(
                client = %client_id,
                topic = %envelope.topic(),
                message_id = %envelope.message_id(),
                error = %e,
                "handler failed"
            );
        }
        Err(cause) => {
            error!(
                client = %client_id,
                topic = %envelope.topic(),
                message_id = %envelope.message_id(),
                panic = panic_message(cause.as_ref()),
                "handler panicked"
            );
        }
    }
}

fn panic_message(cause: &(dyn Any + Send)) -> &str {
    if let Some(message) = cause.downcast_ref::<&str>() {
        message
    } else if let Some(message) = cause.downcast_ref::<String>() {
        message.as_str()
    } else {
        "non-string panic payload"
    }
}
