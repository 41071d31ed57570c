//! Escrow events
//!
//! Immutable records emitted by each successful operation. The host ledger
//! appends them to its log and returns them in the transaction receipt.

use serde::{Deserialize, Serialize};
use types::ids::{ConditionId, Pubkey};
use types::numeric::Lamports;

/// Custody record created and funded
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscrowCreated {
    pub record: Pubkey,
    pub payer: Pubkey,
    pub attester: Pubkey,
    pub nonce: u64,
    pub amount: Lamports,
    /// Minimum reserve funded alongside `amount`
    pub reserve: Lamports,
    pub condition_id: ConditionId,
    pub created_at: i64,
}

/// Record released to a recipient on the attester's signature
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscrowSettled {
    pub record: Pubkey,
    pub attester: Pubkey,
    pub recipient: Pubkey,
    pub condition_id: ConditionId,
    /// Entire record balance moved to the recipient
    pub released: Lamports,
}

/// Record returned to its payer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscrowCancelled {
    pub record: Pubkey,
    pub payer: Pubkey,
    pub condition_id: ConditionId,
    /// Entire record balance moved back to the payer
    pub refunded: Lamports,
}

/// Enum wrapper for all escrow events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EscrowEvent {
    Created(EscrowCreated),
    Settled(EscrowSettled),
    Cancelled(EscrowCancelled),
}

impl EscrowEvent {
    /// Address of the record the event concerns.
    pub fn record(&self) -> &Pubkey {
        match self {
            EscrowEvent::Created(e) => &e.record,
            EscrowEvent::Settled(e) => &e.record,
            EscrowEvent::Cancelled(e) => &e.record,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settled_serialization() {
        let event = EscrowEvent::Settled(EscrowSettled {
            record: Pubkey::new_from_array([1; 32]),
            attester: Pubkey::new_from_array([2; 32]),
            recipient: Pubkey::new_from_array([3; 32]),
            condition_id: ConditionId::new(474429261),
            released: 693_410_400,
        });
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"Settled\""));
        assert!(json.contains("474429261"));

        let deser: EscrowEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(event, deser);
    }

    #[test]
    fn test_event_record_accessor() {
        let record = Pubkey::new_from_array([7; 32]);
        let event = EscrowEvent::Cancelled(EscrowCancelled {
            record,
            payer: Pubkey::new_from_array([1; 32]),
            condition_id: ConditionId::new(1),
            refunded: 10,
        });
        assert_eq!(event.record(), &record);
    }
}
