//! Custody record — the persisted escrow entity
//!
//! Layout (little-endian, fixed size):
//!
//! | offset | size | field            |
//! |--------|------|------------------|
//! | 0      | 8    | discriminator    |
//! | 8      | 1    | status           |
//! | 9      | 1    | bump             |
//! | 10     | 8    | nonce            |
//! | 18     | 8    | amount           |
//! | 26     | 8    | condition_id     |
//! | 34     | 8    | created_at       |
//! | 42     | 32   | payer            |
//! | 74     | 32   | attester         |
//! | 106    | 256  | match_criterion  |

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use types::ids::{ConditionId, Pubkey};
use types::numeric::Lamports;

use crate::errors::EscrowError;

/// Maximum length of a match criterion in bytes.
pub const MAX_CRITERION_LEN: usize = 256;

/// Discriminator tag hashed into the first eight bytes of every record.
const RECORD_DISCRIMINATOR_PREIMAGE: &[u8] = b"account:CustodyRecord";

/// Lifecycle status of a custody record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecordStatus {
    /// Holding funds, awaiting settlement or cancellation
    Active,
    /// Released to the recipient on the attester's signature
    Settled,
    /// Returned to the payer
    Cancelled,
}

impl RecordStatus {
    /// Settled and Cancelled admit no further operations.
    pub fn is_terminal(self) -> bool {
        !matches!(self, RecordStatus::Active)
    }

    fn to_byte(self) -> u8 {
        match self {
            RecordStatus::Active => 0,
            RecordStatus::Settled => 1,
            RecordStatus::Cancelled => 2,
        }
    }

    fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0 => Some(RecordStatus::Active),
            1 => Some(RecordStatus::Settled),
            2 => Some(RecordStatus::Cancelled),
            _ => None,
        }
    }
}

/// Content the attester must find in the referenced post.
///
/// Holds at most [`MAX_CRITERION_LEN`] bytes. On the wire and in storage it
/// occupies a fixed 256-byte buffer; unused trailing bytes are zero, and
/// trailing zeros are not part of the criterion.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchCriterion(Vec<u8>);

impl MatchCriterion {
    /// Validate and wrap a criterion. Trailing zero bytes are dropped.
    pub fn new(bytes: impl Into<Vec<u8>>) -> Result<Self, EscrowError> {
        let mut bytes = bytes.into();
        if bytes.len() > MAX_CRITERION_LEN {
            return Err(EscrowError::BufferTooLarge {
                len: bytes.len(),
                max: MAX_CRITERION_LEN,
            });
        }
        while bytes.last() == Some(&0) {
            bytes.pop();
        }
        Ok(Self(bytes))
    }

    /// Read a criterion back from its fixed buffer.
    pub fn from_padded(buffer: &[u8; MAX_CRITERION_LEN]) -> Self {
        let len = buffer
            .iter()
            .rposition(|b| *b != 0)
            .map_or(0, |last| last + 1);
        Self(buffer[..len].to_vec())
    }

    /// Zero-filled fixed buffer holding the criterion.
    pub fn to_padded(&self) -> [u8; MAX_CRITERION_LEN] {
        let mut buffer = [0u8; MAX_CRITERION_LEN];
        buffer[..self.0.len()].copy_from_slice(&self.0);
        buffer
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Persisted escrow entity, one per `(payer, nonce)`.
///
/// The record address is the store key and is not part of the layout; it is
/// re-derived from `payer`, `nonce` and `bump` whenever the record is used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustodyRecord {
    pub status: RecordStatus,
    pub bump: u8,
    pub nonce: u64,
    /// Escrowed value, excluding the minimum reserve
    pub amount: Lamports,
    pub condition_id: ConditionId,
    /// Unix seconds at creation
    pub created_at: i64,
    pub payer: Pubkey,
    pub attester: Pubkey,
    pub match_criterion: MatchCriterion,
}

impl CustodyRecord {
    /// Serialized size in bytes.
    pub const LEN: usize = 8 + 1 + 1 + 8 + 8 + 8 + 8 + 32 + 32 + MAX_CRITERION_LEN;

    /// First eight bytes of every packed record.
    pub fn discriminator() -> [u8; 8] {
        let hash = Sha256::digest(RECORD_DISCRIMINATOR_PREIMAGE);
        let mut disc = [0u8; 8];
        disc.copy_from_slice(&hash[..8]);
        disc
    }

    pub fn is_active(&self) -> bool {
        self.status == RecordStatus::Active
    }

    /// Packed representation.
    pub fn pack(&self) -> Vec<u8> {
        let mut data = Vec::with_capacity(Self::LEN);
        data.extend_from_slice(&Self::discriminator());
        data.extend_from_slice(&[self.status.to_byte(), self.bump]);
        data.extend_from_slice(&self.nonce.to_le_bytes());
        data.extend_from_slice(&self.amount.to_le_bytes());
        data.extend_from_slice(&self.condition_id.get().to_le_bytes());
        data.extend_from_slice(&self.created_at.to_le_bytes());
        data.extend_from_slice(self.payer.as_ref());
        data.extend_from_slice(self.attester.as_ref());
        data.extend_from_slice(&self.match_criterion.to_padded());
        data
    }

    /// Write the record into account data of exactly [`Self::LEN`] bytes.
    pub fn pack_into(&self, dst: &mut [u8]) -> Result<(), EscrowError> {
        if dst.len() != Self::LEN {
            return Err(EscrowError::InvalidAccountData { len: dst.len() });
        }
        dst.copy_from_slice(&self.pack());
        Ok(())
    }

    /// Decode a record, `None` if `src` is not a packed record.
    pub fn unpack(src: &[u8]) -> Option<Self> {
        if src.len() != Self::LEN || src[..8] != Self::discriminator() {
            return None;
        }
        let mut reader = Reader { buf: src, pos: 8 };
        let status = RecordStatus::from_byte(reader.array::<1>()[0])?;
        let bump = reader.array::<1>()[0];
        let nonce = u64::from_le_bytes(reader.array());
        let amount = u64::from_le_bytes(reader.array());
        let condition_id = ConditionId::new(u64::from_le_bytes(reader.array()));
        let created_at = i64::from_le_bytes(reader.array());
        let payer = Pubkey::new_from_array(reader.array());
        let attester = Pubkey::new_from_array(reader.array());
        let match_criterion = MatchCriterion::from_padded(&reader.array());

        Some(Self {
            status,
            bump,
            nonce,
            amount,
            condition_id,
            created_at,
            payer,
            attester,
            match_criterion,
        })
    }
}

struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl Reader<'_> {
    // Callers check the total length up front.
    fn array<const N: usize>(&mut self) -> [u8; N] {
        let mut out = [0u8; N];
        out.copy_from_slice(&self.buf[self.pos..self.pos + N]);
        self.pos += N;
        out
    }
}
