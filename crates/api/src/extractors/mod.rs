//! Custom Axum extractors.

pub mod request_context;

pub use request_context::{client_ip, RequestContext};
