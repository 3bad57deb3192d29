//! Core module containing shared infrastructure components.
//!
//! Configuration, error handling, the cross-cutting gate stages, the gateway
//! server and the transport layer.

pub mod config;
pub mod error;
pub mod security;
pub mod server;
pub mod transport;

pub use config::Config;
pub use error::{Error, Result};
pub use server::GatewayServer;
pub use transport::{TransportConfig, TransportService};
