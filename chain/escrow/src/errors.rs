//! Escrow error types
//!
//! Program errors abort the enclosing operation. The host ledger wraps them
//! in [`TransactionError::Program`] and rolls the whole transaction back.

use thiserror::Error;
use types::ids::{ConditionId, Pubkey};
use types::numeric::Lamports;

/// Base of the numeric error codes surfaced to callers.
pub const ERROR_CODE_OFFSET: u32 = 6000;

/// Address derivation errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AddressError {
    #[error("Seed too long: {len} bytes exceeds {max}")]
    MaxSeedLengthExceeded { len: usize, max: usize },

    #[error("Too many seeds: {count} exceeds {max}")]
    TooManySeeds { count: usize, max: usize },

    #[error("Derived address lies on the curve")]
    OnCurve,

    #[error("No viable bump seed found")]
    NoViableBump,
}

/// Escrow program errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EscrowError {
    #[error("Record address mismatch: expected {expected}, got {actual}")]
    AddressMismatch { expected: Pubkey, actual: Pubkey },

    #[error("Record already exists at {address}")]
    AlreadyExists { address: Pubkey },

    #[error("Insufficient funds: required {required}, available {available}")]
    InsufficientFunds {
        required: Lamports,
        available: Lamports,
    },

    #[error("Escrow amount must be positive")]
    InvalidAmount,

    #[error("Match criterion too large: {len} bytes exceeds {max}")]
    BufferTooLarge { len: usize, max: usize },

    #[error("Unauthorized: {signer} may not act on this record")]
    Unauthorized { signer: Pubkey },

    #[error("Condition mismatch: record holds {expected}, got {actual}")]
    ConditionMismatch {
        expected: ConditionId,
        actual: ConditionId,
    },

    #[error("No active record at {address}")]
    NotFound { address: Pubkey },

    #[error("Recipient may not be the record itself")]
    InvalidRecipient,

    #[error("Invalid instruction data")]
    InvalidInstructionData,

    #[error("Not enough account keys: expected {expected}, got {actual}")]
    NotEnoughAccountKeys { expected: usize, actual: usize },

    #[error("Arithmetic overflow in balance calculation")]
    ArithmeticOverflow,

    #[error("Invalid record data length: {len}")]
    InvalidAccountData { len: usize },

    #[error("Address derivation failed: {0}")]
    Derivation(#[from] AddressError),
}

impl EscrowError {
    /// Stable numeric code for the error kind.
    pub fn code(&self) -> u32 {
        let index = match self {
            EscrowError::AddressMismatch { .. } => 0,
            EscrowError::AlreadyExists { .. } => 1,
            EscrowError::InsufficientFunds { .. } => 2,
            EscrowError::InvalidAmount => 3,
            EscrowError::BufferTooLarge { .. } => 4,
            EscrowError::Unauthorized { .. } => 5,
            EscrowError::ConditionMismatch { .. } => 6,
            EscrowError::NotFound { .. } => 7,
            EscrowError::InvalidRecipient => 8,
            EscrowError::InvalidInstructionData => 9,
            EscrowError::NotEnoughAccountKeys { .. } => 10,
            EscrowError::ArithmeticOverflow => 11,
            EscrowError::InvalidAccountData { .. } => 12,
            EscrowError::Derivation(_) => 13,
        };
        ERROR_CODE_OFFSET + index
    }
}

/// Host ledger transaction errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransactionError {
    #[error("Invalid signature from {signer}")]
    InvalidSignature { signer: Pubkey },

    #[error("Missing signature for {account}")]
    MissingSignature { account: Pubkey },

    #[error("Fee payer {payer} cannot cover fee {fee}")]
    InsufficientFundsForFee { payer: Pubkey, fee: Lamports },

    #[error("Unknown program: {program_id}")]
    UnknownProgram { program_id: Pubkey },

    #[error("Read-only account modified: {account}")]
    ReadonlyModified { account: Pubkey },

    #[error("Account {account} debited without owner or signer authority")]
    UnauthorizedDebit { account: Pubkey },

    #[error("Lamports not conserved: before {before}, after {after}")]
    UnbalancedTransaction { before: u128, after: u128 },

    #[error("Transaction already processed: {hash}")]
    AlreadyProcessed { hash: String },

    #[error("Program error: {0}")]
    Program(#[from] EscrowError),
}

impl TransactionError {
    /// Program error carried by this failure, if any.
    pub fn program_error(&self) -> Option<&EscrowError> {
        match self {
            TransactionError::Program(err) => Some(err),
            _ => None,
        }
    }
}
