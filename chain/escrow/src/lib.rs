//! Conditional-payment escrow
//!
//! A payer locks funds in a custody record tied to a post identifier and a
//! match criterion. The attester releases them to a recipient once the
//! condition is met, or the payer takes them back first.
//!
//! # Modules
//! - `address`: Deterministic off-curve record addresses
//! - `state`: Custody record model and its fixed byte layout
//! - `security`: Authorization guard for Settle and Cancel
//! - `instruction`: Instruction encoding and client-side builders
//! - `processor`: Create, Settle and Cancel
//! - `events`: Events emitted by each successful operation
//! - `errors`: Program, address and transaction error types
//! - `config`: Fee and minimum-reserve parameters
//! - `ledger`: In-process host ledger that executes signed transactions

pub mod address;
pub mod config;
pub mod errors;
pub mod events;
pub mod instruction;
pub mod ledger;
pub mod processor;
pub mod security;
pub mod state;

use types::ids::Pubkey;

/// Program ABI version, frozen after release
pub const PROGRAM_ABI_VERSION: &str = "1.0.0";

/// Address of the escrow program.
pub const ID: Pubkey = Pubkey::new_from_array([
    0x5e, 0x3c, 0x1b, 0x9a, 0x47, 0xd2, 0x08, 0xe6, 0x71, 0x0f, 0xa4, 0x33, 0xc8, 0x5d, 0x92, 0x1e,
    0xb7, 0x64, 0x2a, 0xf1, 0x0c, 0x89, 0x56, 0xde, 0x13, 0x7b, 0xe0, 0x45, 0x9f, 0x28, 0xc6, 0x0d,
]);

pub mod prelude {
    pub use crate::config::LedgerConfig;
    pub use crate::errors::{EscrowError, TransactionError};
    pub use crate::events::EscrowEvent;
    pub use crate::instruction;
    pub use crate::ledger::{pubkey_of, Ledger, Message, Transaction};
    pub use crate::state::{CustodyRecord, RecordStatus};
    pub use types::ids::{ConditionId, Pubkey};
}
