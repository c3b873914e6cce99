//! Network transport backed by `reqwest`

mod client;

pub use client::{ReqwestTransport, ReqwestTransportBuilder};
