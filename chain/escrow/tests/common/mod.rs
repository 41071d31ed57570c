//! Shared fixtures for the escrow integration suites.

#![allow(dead_code)]

use ed25519_dalek::SigningKey;
use escrow::errors::TransactionError;
use escrow::instruction;
use escrow::ledger::{pubkey_of, Instruction, Ledger, Message, Transaction, TransactionReceipt};
use escrow::prelude::*;
use types::numeric::{Lamports, LAMPORTS_PER_SOL};

pub const AMOUNT: Lamports = 690_000_000;
pub const CONDITION: ConditionId = ConditionId::new(474429261);
pub const CRITERION: &[u8] = b"@DemoxLabs";
pub const FEE: Lamports = 5000;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

pub fn keypair(seed: u8) -> SigningKey {
    SigningKey::from_bytes(&[seed; 32])
}

pub fn new_ledger() -> Ledger {
    init_tracing();
    Ledger::new(LedgerConfig::default())
}

pub fn reserve(ledger: &Ledger) -> Lamports {
    ledger.minimum_balance(CustodyRecord::LEN)
}

/// Give `key` `sol` whole coins and return its public key.
pub fn fund(ledger: &Ledger, key: &SigningKey, sol: u64) -> Pubkey {
    let pubkey = pubkey_of(key);
    ledger
        .fund(&pubkey, sol * LAMPORTS_PER_SOL)
        .expect("funding succeeds");
    pubkey
}

/// Sign `ix` with `signers`; the first signer pays the fee.
pub fn submit(
    ledger: &Ledger,
    ix: Instruction,
    signers: &[&SigningKey],
) -> Result<TransactionReceipt, TransactionError> {
    let message = Message::new(ix, pubkey_of(signers[0]));
    ledger.process_transaction(&Transaction::new_signed(message, signers))
}

/// Submit a Create for `(payer, nonce)` and return the record address.
pub fn create(
    ledger: &Ledger,
    payer: &SigningKey,
    attester: &Pubkey,
    nonce: u64,
    amount: Lamports,
) -> (Pubkey, Result<TransactionReceipt, TransactionError>) {
    let ix = instruction::create(
        ledger.program_id(),
        &pubkey_of(payer),
        attester,
        nonce,
        amount,
        CONDITION,
        CRITERION,
    )
    .expect("valid create instruction");
    let record = ix.accounts[1].pubkey;
    (record, submit(ledger, ix, &[payer]))
}

pub fn settle(
    ledger: &Ledger,
    attester: &SigningKey,
    recipient: &Pubkey,
    record: &Pubkey,
    condition_id: ConditionId,
) -> Result<TransactionReceipt, TransactionError> {
    let ix = instruction::settle(
        ledger.program_id(),
        &pubkey_of(attester),
        recipient,
        record,
        condition_id,
    );
    submit(ledger, ix, &[attester])
}

pub fn cancel(
    ledger: &Ledger,
    payer: &SigningKey,
    record: &Pubkey,
    condition_id: ConditionId,
) -> Result<TransactionReceipt, TransactionError> {
    let ix = instruction::cancel(ledger.program_id(), &pubkey_of(payer), record, condition_id);
    submit(ledger, ix, &[payer])
}

pub fn program_error(result: Result<TransactionReceipt, TransactionError>) -> EscrowError {
    match result {
        Err(TransactionError::Program(err)) => err,
        other => panic!("expected a program error, got {other:?}"),
    }
}
