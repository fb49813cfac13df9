//! The `client` module is the application-facing side of the bus.
//!
//! - `mcp_client`: `Client`, which owns an inbox and a background dispatch
//!   loop and exposes subscribe/unsubscribe/publish/close.
//! - `handle`: `ClientHandle`, the non-owning reference the broker keeps
//!   for each registered client.
//! - `handlers`: the per-client table that resolves a delivered topic to a
//!   handler.

pub mod handle;
pub mod handlers;
pub mod mcp_client;

pub use handle::ClientHandle;
pub use handlers::{Handler, HandlerError, HandlerResult};
pub use mcp_client::{Client, ClientState};
