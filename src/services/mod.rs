//! Service layer
//!
//! Request semantics that sit between the HTTP router and
//! the external grammar client.

pub mod relay_service;

pub use relay_service::{CheckRequest, RelayService};
