//! Utility functions and helpers.

pub mod http;

#[cfg(test)]
pub(crate) mod testing;

pub use http::{HttpReply, ReqwestTransport, Transport};
