//! Authorization guard shared by Settle and Cancel
//!
//! A valid signature alone proves nothing: the guard also checks that the key
//! in the signer position is the identity the record stored at creation.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use types::ids::Pubkey;

use crate::errors::EscrowError;
use crate::state::CustodyRecord;

/// Identities fixed on a record at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// Funds the record and may cancel it
    Payer,
    /// Confirms the condition and may settle the record
    Attester,
}

impl Role {
    /// Key stored on `record` for this role.
    pub fn identity(self, record: &CustodyRecord) -> &Pubkey {
        match self {
            Role::Payer => &record.payer,
            Role::Attester => &record.attester,
        }
    }
}

/// Checks signers against the verified signature set of a transaction.
#[derive(Debug, Clone, Copy)]
pub struct AuthorizationGuard<'a> {
    signers: &'a BTreeSet<Pubkey>,
}

impl<'a> AuthorizationGuard<'a> {
    pub fn new(signers: &'a BTreeSet<Pubkey>) -> Self {
        Self { signers }
    }

    /// `key` must have signed the transaction.
    pub fn require_signed(&self, key: &Pubkey) -> Result<(), EscrowError> {
        if !self.signers.contains(key) {
            return Err(EscrowError::Unauthorized { signer: *key });
        }
        Ok(())
    }

    /// `signer` must have signed and hold `role` on `record`.
    pub fn authorize(
        &self,
        signer: &Pubkey,
        record: &CustodyRecord,
        role: Role,
    ) -> Result<(), EscrowError> {
        self.require_signed(signer)?;
        if role.identity(record) != signer {
            return Err(EscrowError::Unauthorized { signer: *signer });
        }
        Ok(())
    }
}
