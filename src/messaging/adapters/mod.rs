//! Adapter implementations for messaging ports.

pub mod memory;
pub mod postgres;

mod http;

pub use http::HttpPeerTransport;
