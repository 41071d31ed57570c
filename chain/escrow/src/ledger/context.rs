//! Invocation context — everything a program sees of the host ledger
//!
//! The context wraps the transaction's working copy of the referenced
//! accounts. Nothing written through it is visible outside the transaction
//! until the ledger commits.

use std::collections::BTreeSet;
use types::ids::Pubkey;
use types::numeric::Lamports;

use crate::config::Rent;
use crate::errors::EscrowError;
use crate::events::EscrowEvent;
use crate::ledger::account::{Account, AccountStore};

/// Wall-clock view supplied by the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Clock {
    pub unix_timestamp: i64,
}

impl Clock {
    pub fn new(unix_timestamp: i64) -> Self {
        Self { unix_timestamp }
    }

    /// Current UTC time.
    pub fn now() -> Self {
        Self::new(chrono::Utc::now().timestamp())
    }
}

/// Per-invocation view of the ledger.
pub struct InvokeContext<'a> {
    program_id: Pubkey,
    store: &'a mut dyn AccountStore,
    signers: &'a BTreeSet<Pubkey>,
    rent: Rent,
    clock: Clock,
    events: Vec<EscrowEvent>,
}

impl<'a> InvokeContext<'a> {
    pub fn new(
        program_id: Pubkey,
        store: &'a mut dyn AccountStore,
        signers: &'a BTreeSet<Pubkey>,
        rent: Rent,
        clock: Clock,
    ) -> Self {
        Self {
            program_id,
            store,
            signers,
            rent,
            clock,
            events: Vec::new(),
        }
    }

    pub fn program_id(&self) -> &Pubkey {
        &self.program_id
    }

    /// Keys whose signatures the ledger verified for this transaction.
    pub fn signers(&self) -> &BTreeSet<Pubkey> {
        self.signers
    }

    pub fn rent(&self) -> &Rent {
        &self.rent
    }

    pub fn clock(&self) -> Clock {
        self.clock
    }

    pub fn account(&self, key: &Pubkey) -> Option<&Account> {
        self.store.get(key)
    }

    pub fn account_mut(&mut self, key: &Pubkey) -> Option<&mut Account> {
        self.store.get_mut(key)
    }

    pub fn lamports(&self, key: &Pubkey) -> Lamports {
        self.store.lamports(key)
    }

    /// Assign `key` to `owner` with `data`, creating the account if needed.
    ///
    /// Lamports already held at `key` are kept.
    pub fn allocate(&mut self, key: Pubkey, owner: Pubkey, data: Vec<u8>) {
        let lamports = self.store.lamports(&key);
        self.store
            .insert(key, Account::with_data(lamports, owner, data));
    }

    /// Move `lamports` from one account to another.
    ///
    /// The destination is created as a system account if it does not exist.
    pub fn transfer(
        &mut self,
        from: &Pubkey,
        to: &Pubkey,
        lamports: Lamports,
    ) -> Result<(), EscrowError> {
        if from == to {
            return Ok(());
        }

        let available = self.store.lamports(from);
        if available < lamports {
            return Err(EscrowError::InsufficientFunds {
                required: lamports,
                available,
            });
        }
        let credited = self
            .store
            .lamports(to)
            .checked_add(lamports)
            .ok_or(EscrowError::ArithmeticOverflow)?;

        if let Some(source) = self.store.get_mut(from) {
            source.lamports = available - lamports;
        }
        match self.store.get_mut(to) {
            Some(destination) => destination.lamports = credited,
            None => {
                self.store.insert(*to, Account::system(credited));
            }
        }
        Ok(())
    }

    pub fn emit(&mut self, event: EscrowEvent) {
        self.events.push(event);
    }

    pub fn events(&self) -> &[EscrowEvent] {
        &self.events
    }

    /// Consume the context, yielding the events emitted during the invocation.
    pub fn into_events(self) -> Vec<EscrowEvent> {
        self.events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn key(b: u8) -> Pubkey {
        Pubkey::new_from_array([b; 32])
    }

    #[test]
    fn test_transfer_moves_lamports() {
        let mut store = BTreeMap::new();
        store.insert(key(1), Account::system(100));
        let signers = BTreeSet::new();
        let mut ctx = InvokeContext::new(key(9), &mut store, &signers, Rent::default(), Clock::new(0));

        ctx.transfer(&key(1), &key(2), 40).unwrap();
        assert_eq!(ctx.lamports(&key(1)), 60);
        assert_eq!(ctx.lamports(&key(2)), 40);
    }

    #[test]
    fn test_transfer_insufficient() {
        let mut store = BTreeMap::new();
        store.insert(key(1), Account::system(10));
        let signers = BTreeSet::new();
        let mut ctx = InvokeContext::new(key(9), &mut store, &signers, Rent::default(), Clock::new(0));

        let result = ctx.transfer(&key(1), &key(2), 11);
        assert_eq!(
            result,
            Err(EscrowError::InsufficientFunds {
                required: 11,
                available: 10
            })
        );
        assert_eq!(ctx.lamports(&key(1)), 10);
        assert!(ctx.account(&key(2)).is_none());
    }

    #[test]
    fn test_transfer_overflow() {
        let mut store = BTreeMap::new();
        store.insert(key(1), Account::system(10));
        store.insert(key(2), Account::system(u64::MAX));
        let signers = BTreeSet::new();
        let mut ctx = InvokeContext::new(key(9), &mut store, &signers, Rent::default(), Clock::new(0));

        assert_eq!(
            ctx.transfer(&key(1), &key(2), 1),
            Err(EscrowError::ArithmeticOverflow)
        );
        assert_eq!(ctx.lamports(&key(1)), 10);
    }

    #[test]
    fn test_allocate_keeps_existing_lamports() {
        let mut store = BTreeMap::new();
        store.insert(key(3), Account::system(7));
        let signers = BTreeSet::new();
        let mut ctx = InvokeContext::new(key(9), &mut store, &signers, Rent::default(), Clock::new(0));

        ctx.allocate(key(3), key(9), vec![1, 2, 3]);
        let account = ctx.account(&key(3)).unwrap();
        assert_eq!(account.lamports, 7);
        assert_eq!(account.owner, key(9));
        assert_eq!(account.data, vec![1, 2, 3]);
    }
}
