//! End-to-end behavior of brokers and clients working together.

pub(crate) mod support;
