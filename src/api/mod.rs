//! Skoola API collaborator.
//!
//! The backend is an external service; this module only attaches the active
//! identity's credential to outgoing requests, maps non-2xx responses into a
//! typed error, and keeps a small response cache scoped per credential so
//! switching accounts never serves one user's data to another.

pub mod cache;
pub mod client;

pub use cache::ResponseCache;
pub use client::{ApiError, SkoolaApi};
