//! Utility modules

pub mod csv_io;
pub mod memory_storage;
pub mod validation;

pub use csv_io::*;
pub use memory_storage::*;
pub use validation::*;
