//! Adapter implementations for agent registry and liveness probe ports.

pub mod memory;
pub mod postgres;

mod http;

pub use http::HttpHealthProbe;
