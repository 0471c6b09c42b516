//! Ledger module containing row normalization and direction splitting

pub mod normalize;
pub mod split;

pub use normalize::*;
pub use split::*;
