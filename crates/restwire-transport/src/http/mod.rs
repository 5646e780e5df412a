//! Blocking HTTP transport built on `reqwest::blocking`.

mod client;

pub use client::{HttpTransport, HttpTransportConfig};
