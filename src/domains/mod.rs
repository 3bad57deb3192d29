//! Domains module containing business logic organized by bounded contexts.
//!
//! - `openproject`: the backend client, filters and the collection envelope
//! - `tools`: the tool catalogue, its handlers and the `/query` dispatcher

pub mod openproject;
pub mod tools;
