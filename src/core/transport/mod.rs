//! Transport layer for the gateway.
//!
//! - **HTTP**: tool routes, REST aliases and `/query` behind the gate
//!   (credential check, rate limit, compression, CORS) - feature: `http`
//! - **STDIO**: the same tool catalogue served over MCP - feature: `stdio`

mod config;
mod error;
mod service;

#[cfg(feature = "http")]
pub mod http;

#[cfg(feature = "stdio")]
pub mod stdio;

pub use config::TransportConfig;
pub use error::{TransportError, TransportResult};
pub use service::TransportService;

#[cfg(feature = "http")]
pub use config::{CompressionConfig, CorsConfig, HttpConfig};
