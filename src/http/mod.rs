//! HTTP surface of the gateway shell
//!
//! Public root and health endpoints, the record resource family and the cross-origin policy.

pub mod cors;
pub mod handlers;
pub mod records;
