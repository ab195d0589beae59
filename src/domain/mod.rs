//! Domain types for Storyguard.
//!
//! Topics, per-request policy, and the values that flow through an
//! evaluation.

mod outcome;
mod policy;
mod topic;

pub use outcome::*;
pub use policy::*;
pub use topic::*;
