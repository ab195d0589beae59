//! HTTP API layer for Storyguard.
//!
//! Provides REST endpoints for story evaluation and policy lookup.

pub mod handlers;
mod routes;
mod types;

pub use routes::build_router;
