//! Authentication for Storyguard.
//!
//! Story clients authenticate with an API key, sent either as `X-API-Key`
//! or as a bearer token.

mod api_key;
mod middleware;

pub use api_key::*;
pub use middleware::*;
