//! Escrow instructions — wire encoding and client-side builders
//!
//! Every instruction starts with an 8-byte discriminator,
//! `sha256("global:<name>")[..8]`, followed by fixed-width little-endian
//! arguments. Data of any other length is rejected.

use sha2::{Digest, Sha256};
use types::ids::{ConditionId, Pubkey};
use types::numeric::Lamports;

use crate::address;
use crate::errors::EscrowError;
use crate::ledger::transaction::{AccountMeta, Instruction};
use crate::state::{MatchCriterion, MAX_CRITERION_LEN};

const DISCRIMINATOR_LEN: usize = 8;

/// Decoded escrow instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EscrowInstruction {
    /// Open and fund a custody record.
    ///
    /// Accounts: `[payer (writable, signer), record (writable), attester]`
    Create {
        bump: u8,
        nonce: u64,
        amount: Lamports,
        condition_id: ConditionId,
        match_criterion: MatchCriterion,
    },

    /// Release the record to a recipient.
    ///
    /// Accounts: `[attester (writable, signer), recipient (writable), record (writable)]`
    Settle { condition_id: ConditionId },

    /// Return the record to its payer.
    ///
    /// Accounts: `[payer (writable, signer), record (writable)]`
    Cancel { condition_id: ConditionId },
}

impl EscrowInstruction {
    pub const CREATE_LEN: usize = DISCRIMINATOR_LEN + 1 + 8 + 8 + 8 + MAX_CRITERION_LEN;
    pub const SETTLE_LEN: usize = DISCRIMINATOR_LEN + 8;
    pub const CANCEL_LEN: usize = DISCRIMINATOR_LEN + 8;

    /// Discriminator for the instruction named `name`.
    pub fn discriminator(name: &str) -> [u8; DISCRIMINATOR_LEN] {
        let hash = Sha256::digest(format!("global:{name}").as_bytes());
        let mut disc = [0u8; DISCRIMINATOR_LEN];
        disc.copy_from_slice(&hash[..DISCRIMINATOR_LEN]);
        disc
    }

    pub fn name(&self) -> &'static str {
        match self {
            EscrowInstruction::Create { .. } => "create",
            EscrowInstruction::Settle { .. } => "settle",
            EscrowInstruction::Cancel { .. } => "cancel",
        }
    }

    pub fn pack(&self) -> Vec<u8> {
        let mut data = Self::discriminator(self.name()).to_vec();
        match self {
            EscrowInstruction::Create {
                bump,
                nonce,
                amount,
                condition_id,
                match_criterion,
            } => {
                data.reserve(Self::CREATE_LEN - DISCRIMINATOR_LEN);
                data.push(*bump);
                data.extend_from_slice(&nonce.to_le_bytes());
                data.extend_from_slice(&amount.to_le_bytes());
                data.extend_from_slice(&condition_id.get().to_le_bytes());
                data.extend_from_slice(&match_criterion.to_padded());
            }
            EscrowInstruction::Settle { condition_id }
            | EscrowInstruction::Cancel { condition_id } => {
                data.extend_from_slice(&condition_id.get().to_le_bytes());
            }
        }
        data
    }

    pub fn unpack(data: &[u8]) -> Result<Self, EscrowError> {
        if data.len() < DISCRIMINATOR_LEN {
            return Err(EscrowError::InvalidInstructionData);
        }
        let (disc, rest) = data.split_at(DISCRIMINATOR_LEN);

        if disc == Self::discriminator("create") {
            if data.len() != Self::CREATE_LEN {
                return Err(EscrowError::InvalidInstructionData);
            }
            let (bump, rest) = rest.split_at(1);
            let (nonce, rest) = rest.split_at(8);
            let (amount, rest) = rest.split_at(8);
            let (condition_id, criterion) = rest.split_at(8);
            Ok(EscrowInstruction::Create {
                bump: bump[0],
                nonce: read_u64(nonce)?,
                amount: read_u64(amount)?,
                condition_id: ConditionId::new(read_u64(condition_id)?),
                match_criterion: MatchCriterion::from_padded(
                    criterion
                        .try_into()
                        .map_err(|_| EscrowError::InvalidInstructionData)?,
                ),
            })
        } else if disc == Self::discriminator("settle") {
            if data.len() != Self::SETTLE_LEN {
                return Err(EscrowError::InvalidInstructionData);
            }
            Ok(EscrowInstruction::Settle {
                condition_id: ConditionId::new(read_u64(rest)?),
            })
        } else if disc == Self::discriminator("cancel") {
            if data.len() != Self::CANCEL_LEN {
                return Err(EscrowError::InvalidInstructionData);
            }
            Ok(EscrowInstruction::Cancel {
                condition_id: ConditionId::new(read_u64(rest)?),
            })
        } else {
            Err(EscrowError::InvalidInstructionData)
        }
    }
}

fn read_u64(bytes: &[u8]) -> Result<u64, EscrowError> {
    bytes
        .try_into()
        .map(u64::from_le_bytes)
        .map_err(|_| EscrowError::InvalidInstructionData)
}

// ───────────────────────── Builders ─────────────────────────

/// Build a Create instruction, deriving the record address for `(payer, nonce)`.
pub fn create(
    program_id: &Pubkey,
    payer: &Pubkey,
    attester: &Pubkey,
    nonce: u64,
    amount: Lamports,
    condition_id: ConditionId,
    match_criterion: &[u8],
) -> Result<Instruction, EscrowError> {
    let (record, bump) = address::derive(program_id, payer, nonce)?;
    let data = EscrowInstruction::Create {
        bump,
        nonce,
        amount,
        condition_id,
        match_criterion: MatchCriterion::new(match_criterion)?,
    }
    .pack();

    Ok(Instruction {
        program_id: *program_id,
        accounts: vec![
            AccountMeta::new(*payer, true),
            AccountMeta::new(record, false),
            AccountMeta::new_readonly(*attester, false),
        ],
        data,
    })
}

pub fn settle(
    program_id: &Pubkey,
    attester: &Pubkey,
    recipient: &Pubkey,
    record: &Pubkey,
    condition_id: ConditionId,
) -> Instruction {
    Instruction {
        program_id: *program_id,
        accounts: vec![
            AccountMeta::new(*attester, true),
            AccountMeta::new(*recipient, false),
            AccountMeta::new(*record, false),
        ],
        data: EscrowInstruction::Settle { condition_id }.pack(),
    }
}

pub fn cancel(
    program_id: &Pubkey,
    payer: &Pubkey,
    record: &Pubkey,
    condition_id: ConditionId,
) -> Instruction {
    Instruction {
        program_id: *program_id,
        accounts: vec![
            AccountMeta::new(*payer, true),
            AccountMeta::new(*record, false),
        ],
        data: EscrowInstruction::Cancel { condition_id }.pack(),
    }
}
