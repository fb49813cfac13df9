use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use crate::broker::Payload;
use crate::client::HandlerResult;

/// Shared log of `(topic, payload)` pairs seen by a handler.
pub(crate) type Received = Arc<Mutex<Vec<(String, Payload)>>>;

pub(crate) fn received() -> Received {
    Arc::new(Mutex::new(Vec::new()))
}

/// Handler that appends every delivery to `log`.
pub(crate) fn recorder(
    log: Received,
) -> impl Fn(&str, &Payload) -> HandlerResult + Send + Sync + 'static {
    move |topic: &str, payload: &Payload| {
        log.lock().push((topic.to_string(), payload.clone()));
        Ok(())
    }
}

/// Polls `condition` until it holds or two seconds pass.
pub(crate) async fn wait_until(condition: impl Fn() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while tokio::time::Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    condition()
}

/// Gives dispatch loops a moment to process anything already queued.
pub(crate) async fn settle() {
    tokio::time::sleep(Duration::from_millis(50)).await;
}
