//! Per-account exclusive locks
//!
//! A transaction locks every key it references before it reads anything and
//! holds the locks until it has committed or aborted. Acquisition is
//! all-or-nothing under one mutex, so two transactions can never each hold
//! part of the other's key set.

use parking_lot::{Condvar, Mutex};
use std::collections::{BTreeSet, HashSet};
use types::ids::Pubkey;

/// Set of currently locked account keys.
#[derive(Debug, Default)]
pub struct AccountLocks {
    locked: Mutex<HashSet<Pubkey>>,
    released: Condvar,
}

impl AccountLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Block until every key is free, then lock them all.
    pub fn lock(&self, keys: impl IntoIterator<Item = Pubkey>) -> AccountLockGuard<'_> {
        let keys: BTreeSet<Pubkey> = keys.into_iter().collect();
        let mut locked = self.locked.lock();
        while keys.iter().any(|key| locked.contains(key)) {
            self.released.wait(&mut locked);
        }
        locked.extend(keys.iter().copied());
        AccountLockGuard { locks: self, keys }
    }

    /// Lock every key if all are free right now.
    #[cfg(test)]
    fn try_lock(&self, keys: impl IntoIterator<Item = Pubkey>) -> Option<AccountLockGuard<'_>> {
        let keys: BTreeSet<Pubkey> = keys.into_iter().collect();
        let mut locked = self.locked.lock();
        if keys.iter().any(|key| locked.contains(key)) {
            return None;
        }
        locked.extend(keys.iter().copied());
        Some(AccountLockGuard { locks: self, keys })
    }

    #[cfg(test)]
    fn is_locked(&self, key: &Pubkey) -> bool {
        self.locked.lock().contains(key)
    }
}

/// Releases its keys on drop and wakes waiting transactions.
#[derive(Debug)]
pub struct AccountLockGuard<'a> {
    locks: &'a AccountLocks,
    keys: BTreeSet<Pubkey>,
}

#[cfg(test)]
impl AccountLockGuard<'_> {
    fn keys(&self) -> &BTreeSet<Pubkey> {
        &self.keys
    }
}

impl Drop for AccountLockGuard<'_> {
    fn drop(&mut self) {
        let mut locked = self.locks.locked.lock();
        for key in &self.keys {
            locked.remove(key);
        }
        drop(locked);
        self.locks.released.notify_all();
    }
}
