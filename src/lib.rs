//! # MCP Bus
//!
//! `mcp_bus` is the in-process Module Communication Protocol bus: a
//! publish/subscribe broker that device managers, pipelines and automation
//! rules use to talk to each other without knowing about one another.
//!
//! ## Core Modules
//!
//! - `broker`: topic matching, the message envelope and the `Broker` that routes
//!   published messages to every matching subscriber.
//! - `client`: the `Client` each component owns. It has its own inbox and
//!   background dispatch loop that invokes the registered handlers.
//! - `config`: layered settings loaded from file and environment.
//! - `utils`: shared error type and logging setup.

pub mod broker;
pub mod client;
pub mod config;
pub mod utils;

pub use broker::{Broker, Envelope, Payload};
pub use client::{Client, ClientState};
pub use utils::error::{McpError, McpResult};

#[cfg(test)]
mod tests;
