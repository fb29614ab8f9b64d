//! # Farmgate - Marketplace Lifecycle Server
//!
//! Library surface for the farmgate binary: the HTTP API and CLI layers
//! over `farmgate-core` (THE POLICY). Exposed as a library so the
//! integration tests can build routers against the real handlers.

pub mod api;
pub mod cli;
