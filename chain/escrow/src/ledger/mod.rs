//! Host ledger — accounts, signed transactions and atomic execution
//!
//! # Modules
//! - `account`: Accounts and the key-addressed store
//! - `context`: Per-invocation view handed to the escrow program
//! - `locks`: Per-account exclusive locks
//! - `transaction`: Instructions, messages and Ed25519-signed transactions
//! - `runtime`: The [`Ledger`] itself

pub mod account;
pub mod context;
pub mod locks;
pub mod runtime;
pub mod transaction;

pub use account::{Account, AccountStore, SYSTEM_PROGRAM_ID};
pub use context::{Clock, InvokeContext};
pub use runtime::{Ledger, TransactionReceipt};
pub use transaction::{pubkey_of, AccountMeta, Instruction, Message, Transaction};
