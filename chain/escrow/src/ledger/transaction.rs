//! Instructions, messages and signed transactions
//!
//! A message is hashed over a fixed byte encoding (SHA-256) and every signer
//! signs that hash with Ed25519. The ledger re-derives the hash and verifies
//! each signature before anything executes.

use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeSet;
use types::ids::Pubkey;

use crate::errors::TransactionError;

/// Public key of a signing key.
pub fn pubkey_of(signing_key: &SigningKey) -> Pubkey {
    Pubkey::new_from_array(signing_key.verifying_key().to_bytes())
}

/// Account reference within an instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountMeta {
    pub pubkey: Pubkey,
    pub is_signer: bool,
    pub is_writable: bool,
}

impl AccountMeta {
    /// Writable account reference.
    pub fn new(pubkey: Pubkey, is_signer: bool) -> Self {
        Self {
            pubkey,
            is_signer,
            is_writable: true,
        }
    }

    pub fn new_readonly(pubkey: Pubkey, is_signer: bool) -> Self {
        Self {
            pubkey,
            is_signer,
            is_writable: false,
        }
    }
}

/// A single program call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instruction {
    pub program_id: Pubkey,
    pub accounts: Vec<AccountMeta>,
    pub data: Vec<u8>,
}

/// What signers sign: one instruction plus the account paying the fee.
///
/// `sequence` distinguishes otherwise identical messages; the ledger refuses
/// to commit the same message hash twice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub fee_payer: Pubkey,
    pub instruction: Instruction,
    pub sequence: u64,
}

impl Message {
    pub fn new(instruction: Instruction, fee_payer: Pubkey) -> Self {
        Self {
            fee_payer,
            instruction,
            sequence: 0,
        }
    }

    pub fn with_sequence(mut self, sequence: u64) -> Self {
        self.sequence = sequence;
        self
    }

    /// Fixed byte encoding the signatures cover.
    pub fn canonical_bytes(&self) -> Vec<u8> {
        let ix = &self.instruction;
        let mut bytes = Vec::with_capacity(32 * 2 + 16 + ix.accounts.len() * 34 + ix.data.len());
        bytes.extend_from_slice(self.fee_payer.as_ref());
        bytes.extend_from_slice(&self.sequence.to_le_bytes());
        bytes.extend_from_slice(ix.program_id.as_ref());
        bytes.extend_from_slice(&(ix.accounts.len() as u32).to_le_bytes());
        for meta in &ix.accounts {
            bytes.extend_from_slice(meta.pubkey.as_ref());
            bytes.push(meta.is_signer as u8);
            bytes.push(meta.is_writable as u8);
        }
        bytes.extend_from_slice(&(ix.data.len() as u32).to_le_bytes());
        bytes.extend_from_slice(&ix.data);
        bytes
    }

    /// SHA-256 of the canonical bytes.
    pub fn hash(&self) -> [u8; 32] {
        Sha256::digest(self.canonical_bytes()).into()
    }

    /// Every key the message touches, fee payer included.
    pub fn account_keys(&self) -> BTreeSet<Pubkey> {
        std::iter::once(self.fee_payer)
            .chain(self.instruction.accounts.iter().map(|meta| meta.pubkey))
            .collect()
    }

    /// Keys that must have signed: the fee payer and every signer meta.
    pub fn required_signers(&self) -> BTreeSet<Pubkey> {
        std::iter::once(self.fee_payer)
            .chain(
                self.instruction
                    .accounts
                    .iter()
                    .filter(|meta| meta.is_signer)
                    .map(|meta| meta.pubkey),
            )
            .collect()
    }

    /// The fee payer and any key referenced writable by some meta.
    pub fn is_writable(&self, key: &Pubkey) -> bool {
        *key == self.fee_payer
            || self
                .instruction
                .accounts
                .iter()
                .any(|meta| meta.pubkey == *key && meta.is_writable)
    }
}

/// A message with the signatures that authorize it.
#[derive(Debug, Clone)]
pub struct Transaction {
    pub message: Message,
    pub signatures: Vec<(Pubkey, Signature)>,
}

impl Transaction {
    /// Sign `message` with every key in `signers`.
    pub fn new_signed(message: Message, signers: &[&SigningKey]) -> Self {
        let hash = message.hash();
        let signatures = signers
            .iter()
            .map(|key| (pubkey_of(key), key.sign(&hash)))
            .collect();
        Self {
            message,
            signatures,
        }
    }

    /// Verify every signature and return the set of verified signers.
    ///
    /// Fails if any signature is invalid or a required signer is missing.
    pub fn verify(&self) -> Result<BTreeSet<Pubkey>, TransactionError> {
        let hash = self.message.hash();
        let mut signers = BTreeSet::new();

        for (signer, signature) in &self.signatures {
            let verifying_key = VerifyingKey::from_bytes(signer.as_array())
                .map_err(|_| TransactionError::InvalidSignature { signer: *signer })?;
            verifying_key
                .verify(&hash, signature)
                .map_err(|_| TransactionError::InvalidSignature { signer: *signer })?;
            signers.insert(*signer);
        }

        if let Some(missing) = self
            .message
            .required_signers()
            .into_iter()
            .find(|key| !signers.contains(key))
        {
            return Err(TransactionError::MissingSignature { account: missing });
        }

        Ok(signers)
    }

    /// Hex form of the message hash, used as the transaction id.
    pub fn id(&self) -> String {
        hex::encode(self.message.hash())
    }
}
