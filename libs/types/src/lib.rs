//! Types library for the custody escrow
//!
//! Identifier and amount types shared by the escrow program, its host ledger
//! and any client that builds operations against it.
//!
//! # Modules
//! - `ids`: Public keys and condition identifiers
//! - `numeric`: Lamport amounts and checked arithmetic

pub mod ids;
pub mod numeric;

// Library version constant
pub const LIB_VERSION: &str = "1.0.0";

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::ids::*;
    pub use crate::numeric::*;
}
