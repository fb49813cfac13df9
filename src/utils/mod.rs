//! The `utils` module holds what the broker and client share but neither
//! owns: the crate error type and tracing setup.

pub mod error;
pub mod logging;
