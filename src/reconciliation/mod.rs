//! Reconciliation engine: exact, tolerance-window and aggregate matching
//!
//! Each phase takes a [`CrossPair`](crate::types::CrossPair) by reference and
//! returns the matches it found together with a new, disjoint residual pair.

pub mod aggregate;
pub mod engine;
pub mod exact;
mod index;
pub mod report;
pub mod window;

pub use aggregate::*;
pub use engine::*;
pub use exact::*;
pub use report::*;
pub use window::*;
