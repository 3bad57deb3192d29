//! OpenProject domain module.
//!
//! Everything the gateway knows about its backend:
//!
//! - `client` - the [`BackendClient`] boundary and [`Resource`] catalogue
//! - `http_client` - the reqwest implementation performing full retrieval
//! - `filters` - the Filter Builder
//! - `envelope` - the Collection Envelope Assembler

mod client;
pub mod envelope;
mod error;
pub mod filters;
mod http_client;

pub use client::{BackendClient, Resource, deletion_ack};
pub use envelope::{CollectionEnvelope, CollectionPage, RetrievalMode};
pub use error::{BackendError, BackendResult};
pub use filters::{FilterBuilder, FilterClause, FilterOperator};
pub use http_client::OpenProjectClient;
#[cfg(test)]
pub(crate) use http_client::collect_pages;
