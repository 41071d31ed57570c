//! Ledger — atomic transaction execution over the account store
//!
//! `process_transaction` runs one signed transaction end to end:
//! 1. Verify every Ed25519 signature
//! 2. Lock every referenced account
//! 3. Snapshot the referenced accounts and charge the fee
//! 4. Invoke the escrow program against the snapshot
//! 5. Check lamport conservation, read-only and debit rules
//! 6. Reject a message hash that has already committed
//! 7. Commit the snapshot, or drop it on any error
//!
//! Program errors surface before the replay check, so resending a committed
//! Create reports `AlreadyExists` and resending a committed Settle reports
//! `NotFound`. The replay check only stops a resent message that would
//! succeed again, such as a Create for a record that has since been reclaimed.
//!
//! Zero-lamport accounts are purged at commit, which is how closed records
//! disappear from the store.

use parking_lot::{Mutex, RwLock};
use std::collections::{BTreeMap, BTreeSet, HashSet, VecDeque};
use tracing::{debug, info, warn};
use types::ids::Pubkey;
use types::numeric::Lamports;

use crate::config::LedgerConfig;
use crate::errors::{EscrowError, TransactionError};
use crate::events::EscrowEvent;
use crate::ledger::account::{Account, AccountStore};
use crate::ledger::context::{Clock, InvokeContext};
use crate::ledger::locks::AccountLocks;
use crate::ledger::transaction::{Message, Transaction};
use crate::processor;
use crate::state::CustodyRecord;

/// Outcome of a committed transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionReceipt {
    /// Hex message hash
    pub id: String,
    pub fee: Lamports,
    pub events: Vec<EscrowEvent>,
}

/// In-process host ledger for the escrow program.
#[derive(Debug)]
pub struct Ledger {
    config: LedgerConfig,
    program_id: Pubkey,
    accounts: RwLock<BTreeMap<Pubkey, Account>>,
    locks: AccountLocks,
    /// Recently committed message hashes (replay protection)
    processed: Mutex<ReplayWindow>,
    /// Emitted events log (append-only)
    events: Mutex<Vec<EscrowEvent>>,
    /// Pinned clock; wall clock when unset
    clock: RwLock<Option<Clock>>,
}

impl Ledger {
    /// Create an empty ledger running the escrow program at [`crate::ID`].
    pub fn new(config: LedgerConfig) -> Self {
        Self::with_program_id(config, crate::ID)
    }

    pub fn with_program_id(config: LedgerConfig, program_id: Pubkey) -> Self {
        Self {
            processed: Mutex::new(ReplayWindow::new(config.replay_window)),
            config,
            program_id,
            accounts: RwLock::new(BTreeMap::new()),
            locks: AccountLocks::new(),
            events: Mutex::new(Vec::new()),
            clock: RwLock::new(None),
        }
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    pub fn program_id(&self) -> &Pubkey {
        &self.program_id
    }

    /// Pin the clock seen by programs.
    pub fn set_clock(&self, clock: Clock) {
        *self.clock.write() = Some(clock);
    }

    fn current_clock(&self) -> Clock {
        self.clock.read().unwrap_or_else(Clock::now)
    }

    // ───────────────────────── Queries ─────────────────────────

    /// Balance of `key`, zero when no account exists.
    pub fn balance(&self, key: &Pubkey) -> Lamports {
        self.accounts.read().lamports(key)
    }

    pub fn account(&self, key: &Pubkey) -> Option<Account> {
        self.accounts.read().get(key).cloned()
    }

    /// Decode the custody record stored at `address`, if any.
    pub fn record(&self, address: &Pubkey) -> Option<CustodyRecord> {
        let accounts = self.accounts.read();
        let account = accounts.get(address)?;
        if account.owner != self.program_id {
            return None;
        }
        CustodyRecord::unpack(&account.data)
    }

    /// Minimum reserve for an account holding `data_len` bytes.
    pub fn minimum_balance(&self, data_len: usize) -> Lamports {
        self.config.rent.minimum_balance(data_len)
    }

    /// Fee a transaction with `signatures` signatures pays on commit.
    pub fn fee_for(&self, signatures: usize) -> Lamports {
        self.config
            .fee_per_signature
            .saturating_mul(signatures as u64)
    }

    // ───────────────────────── Provisioning ─────────────────────────

    /// Credit `lamports` to `key`, creating a system account if needed.
    pub fn fund(&self, key: &Pubkey, lamports: Lamports) -> Result<Lamports, TransactionError> {
        let _guard = self.locks.lock([*key]);
        let mut accounts = self.accounts.write();
        let balance = accounts
            .lamports(key)
            .checked_add(lamports)
            .ok_or(EscrowError::ArithmeticOverflow)?;
        match accounts.get_mut(key) {
            Some(account) => account.lamports = balance,
            None => {
                accounts.insert(*key, Account::system(balance));
            }
        }
        debug!(account = %key, lamports, balance, "Funded account");
        Ok(balance)
    }

    // ───────────────────────── Execution ─────────────────────────

    /// Execute a signed transaction atomically.
    pub fn process_transaction(
        &self,
        tx: &Transaction,
    ) -> Result<TransactionReceipt, TransactionError> {
        let id = tx.id();
        let result = self.execute(tx, &id);
        match &result {
            Ok(receipt) => info!(
                tx = %id,
                fee = receipt.fee,
                events = receipt.events.len(),
                "Transaction committed"
            ),
            Err(err) => warn!(tx = %id, error = %err, "Transaction aborted"),
        }
        result
    }

    fn execute(&self, tx: &Transaction, id: &str) -> Result<TransactionReceipt, TransactionError> {
        let message = &tx.message;
        let signers = tx.verify()?;

        if message.instruction.program_id != self.program_id {
            return Err(TransactionError::UnknownProgram {
                program_id: message.instruction.program_id,
            });
        }

        let keys = message.account_keys();
        let _guard = self.locks.lock(keys.iter().copied());

        let mut working = self.snapshot(&keys);

        let fee = self.fee_for(tx.signatures.len());
        let payer_balance = working.lamports(&message.fee_payer);
        match working.get_mut(&message.fee_payer) {
            Some(payer) if payer_balance >= fee => payer.lamports = payer_balance - fee,
            _ => {
                return Err(TransactionError::InsufficientFundsForFee {
                    payer: message.fee_payer,
                    fee,
                })
            }
        }
        let charged = working.clone();

        let events = {
            let mut ctx = InvokeContext::new(
                self.program_id,
                &mut working,
                &signers,
                self.config.rent,
                self.current_clock(),
            );
            processor::process_instruction(
                &mut ctx,
                &message.instruction.accounts,
                &message.instruction.data,
            )?;
            ctx.into_events()
        };

        self.check_post_conditions(message, &signers, &charged, &working)?;

        let hash = message.hash();
        let mut processed = self.processed.lock();
        if processed.contains(&hash) {
            return Err(TransactionError::AlreadyProcessed { hash: id.to_string() });
        }
        self.commit(working);
        processed.insert(hash);
        drop(processed);

        for event in &events {
            debug!(tx = %id, record = %event.record(), "Event emitted");
        }
        self.events.lock().extend(events.iter().cloned());

        Ok(TransactionReceipt {
            id: id.to_string(),
            fee,
            events,
        })
    }

    fn snapshot(&self, keys: &BTreeSet<Pubkey>) -> BTreeMap<Pubkey, Account> {
        let accounts = self.accounts.read();
        keys.iter()
            .filter_map(|key| accounts.get(key).map(|account| (*key, account.clone())))
            .collect()
    }

    /// Compare the fee-charged snapshot with the state the program left.
    fn check_post_conditions(
        &self,
        message: &Message,
        signers: &BTreeSet<Pubkey>,
        before: &BTreeMap<Pubkey, Account>,
        after: &BTreeMap<Pubkey, Account>,
    ) -> Result<(), TransactionError> {
        let keys = message.account_keys();
        if let Some(stray) = after.keys().find(|key| !keys.contains(key)) {
            return Err(TransactionError::ReadonlyModified { account: *stray });
        }

        let total = |accounts: &BTreeMap<Pubkey, Account>| -> u128 {
            accounts.values().map(|a| a.lamports as u128).sum()
        };
        let (total_before, total_after) = (total(before), total(after));
        if total_before != total_after {
            return Err(TransactionError::UnbalancedTransaction {
                before: total_before,
                after: total_after,
            });
        }

        for key in &keys {
            let old = before.get(key);
            let new = after.get(key);

            if !message.is_writable(key) && old != new {
                return Err(TransactionError::ReadonlyModified { account: *key });
            }

            let old_lamports = old.map_or(0, |a| a.lamports);
            let new_lamports = new.map_or(0, |a| a.lamports);
            let owned = old.is_some_and(|a| a.owner == self.program_id);
            if new_lamports < old_lamports && !owned && !signers.contains(key) {
                return Err(TransactionError::UnauthorizedDebit { account: *key });
            }
        }
        Ok(())
    }

    fn commit(&self, working: BTreeMap<Pubkey, Account>) {
        let mut accounts = self.accounts.write();
        for (key, account) in working {
            if account.lamports == 0 {
                accounts.remove(&key);
            } else {
                accounts.insert(key, account);
            }
        }
    }

    // ───────────────────────── Events ─────────────────────────

    /// All events emitted by committed transactions.
    pub fn events(&self) -> Vec<EscrowEvent> {
        self.events.lock().clone()
    }

    /// Drain all events (consume and clear).
    pub fn drain_events(&self) -> Vec<EscrowEvent> {
        std::mem::take(&mut *self.events.lock())
    }
}

/// Committed message hashes, bounded to the most recent `capacity`.
///
/// A capacity of zero disables replay rejection.
#[derive(Debug)]
struct ReplayWindow {
    capacity: usize,
    seen: HashSet<[u8; 32]>,
    order: VecDeque<[u8; 32]>,
}

impl ReplayWindow {
    fn new(capacity: usize) -> Self {
        Self {
            capacity,
            seen: HashSet::new(),
            order: VecDeque::new(),
        }
    }

    fn contains(&self, hash: &[u8; 32]) -> bool {
        self.seen.contains(hash)
    }

    fn insert(&mut self, hash: [u8; 32]) {
        if self.capacity == 0 || !self.seen.insert(hash) {
            return;
        }
        self.order.push_back(hash);
        while self.order.len() > self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.seen.remove(&oldest);
            }
        }
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.order.len()
    }
}
