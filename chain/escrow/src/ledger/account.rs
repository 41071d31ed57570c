//! Accounts and the key-addressed account store

use std::collections::BTreeMap;
use types::ids::Pubkey;
use types::numeric::Lamports;

/// Owner of plain balance-holding accounts.
pub const SYSTEM_PROGRAM_ID: Pubkey = Pubkey::new_from_array([0; 32]);

/// A ledger account: a balance, an owning program and opaque data.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Account {
    pub lamports: Lamports,
    pub owner: Pubkey,
    pub data: Vec<u8>,
}

impl Account {
    /// Data-less account owned by `owner`.
    pub fn new(lamports: Lamports, owner: Pubkey) -> Self {
        Self {
            lamports,
            owner,
            data: Vec::new(),
        }
    }

    pub fn with_data(lamports: Lamports, owner: Pubkey, data: Vec<u8>) -> Self {
        Self {
            lamports,
            owner,
            data,
        }
    }

    /// Plain balance account owned by the system program.
    pub fn system(lamports: Lamports) -> Self {
        Self::new(lamports, SYSTEM_PROGRAM_ID)
    }
}

/// Key-addressed account storage handed to every program invocation.
pub trait AccountStore {
    fn get(&self, key: &Pubkey) -> Option<&Account>;

    fn get_mut(&mut self, key: &Pubkey) -> Option<&mut Account>;

    /// Insert or replace the account at `key`.
    fn insert(&mut self, key: Pubkey, account: Account) -> Option<Account>;

    /// Balance at `key`, zero when no account exists.
    fn lamports(&self, key: &Pubkey) -> Lamports {
        self.get(key).map_or(0, |account| account.lamports)
    }
}

impl AccountStore for BTreeMap<Pubkey, Account> {
    fn get(&self, key: &Pubkey) -> Option<&Account> {
        BTreeMap::get(self, key)
    }

    fn get_mut(&mut self, key: &Pubkey) -> Option<&mut Account> {
        BTreeMap::get_mut(self, key)
    }

    fn insert(&mut self, key: Pubkey, account: Account) -> Option<Account> {
        BTreeMap::insert(self, key, account)
    }
}
