//! OpenProject Gateway Library
//!
//! This crate exposes OpenProject operations as named tool calls, served
//! over HTTP (tool routes, REST aliases and `/query`) or as MCP tools over
//! STDIO.
//!
//! # Architecture
//!
//! - **core**: configuration, error handling, the cross-cutting gate, the
//!   gateway server and its transports
//! - **domains**: business logic organized by bounded contexts
//!   - **openproject**: backend client with full-collection retrieval
//!   - **tools**: the tool catalogue and the generic dispatcher
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use openproject_gateway::core::{Config, GatewayServer, TransportService};
//! use openproject_gateway::domains::openproject::OpenProjectClient;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env()?;
//!     let client = Arc::new(OpenProjectClient::new(&config.backend)?);
//!     let server = GatewayServer::new(config.clone(), client);
//!     TransportService::new(config.transport).run(server).await?;
//!     Ok(())
//! }
//! ```

pub mod core;
pub mod domains;

#[cfg(test)]
pub(crate) mod testing;

// Re-export commonly used types for convenience
pub use core::{Config, Error, GatewayServer, Result};
