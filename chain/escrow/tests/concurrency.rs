//! Concurrency Tests — racing operations on one record
//!
//! The ledger serializes transactions that share an account, so of two racing
//! operations on the same record exactly one commits.

mod common;

use common::*;
use escrow::prelude::*;
use std::sync::{Arc, Barrier};
use std::thread;

#[test]
fn test_racing_creates_single_winner() {
    let ledger = Arc::new(new_ledger());
    let payer = keypair(1);
    let attester_pk = pubkey_of(&keypair(2));
    let payer_pk = fund(&ledger, &payer, 10);
    let start = ledger.balance(&payer_pk);

    let threads = 4;
    let barrier = Arc::new(Barrier::new(threads));
    let handles: Vec<_> = (0..threads)
        .map(|_| {
            let ledger = Arc::clone(&ledger);
            let barrier = Arc::clone(&barrier);
            let payer = payer.clone();
            thread::spawn(move || {
                barrier.wait();
                create(&ledger, &payer, &attester_pk, 77, AMOUNT)
            })
        })
        .collect();

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    let record = results[0].0;
    let winners: Vec<_> = results.iter().filter(|(_, r)| r.is_ok()).collect();
    assert_eq!(winners.len(), 1, "Exactly one create may commit");

    for (_, result) in results.iter().filter(|(_, r)| r.is_err()) {
        assert_eq!(
            result.as_ref().unwrap_err().program_error(),
            Some(&EscrowError::AlreadyExists { address: record })
        );
    }

    let stored = ledger.record(&record).unwrap();
    assert_eq!(
        ledger.balance(&payer_pk),
        start - stored.amount - reserve(&ledger) - FEE
    );
}

#[test]
fn test_settle_cancel_race_single_winner() {
    for round in 0..8u64 {
        let ledger = Arc::new(new_ledger());
        let payer = keypair(1);
        let attester = keypair(2);
        let recipient = pubkey_of(&keypair(3));
        let payer_pk = fund(&ledger, &payer, 5);
        let attester_pk = fund(&ledger, &attester, 1);

        let (record, result) = create(&ledger, &payer, &attester_pk, round, AMOUNT);
        result.unwrap();
        let locked = ledger.balance(&record);
        let payer_before = ledger.balance(&payer_pk);

        let barrier = Arc::new(Barrier::new(2));
        let settler = {
            let ledger = Arc::clone(&ledger);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                settle(&ledger, &attester, &recipient, &record, CONDITION)
            })
        };
        let canceller = {
            let ledger = Arc::clone(&ledger);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                cancel(&ledger, &payer, &record, CONDITION)
            })
        };

        let settled = settler.join().unwrap();
        let cancelled = canceller.join().unwrap();
        assert!(
            settled.is_ok() ^ cancelled.is_ok(),
            "Exactly one terminal transition may commit"
        );

        let loser = if settled.is_ok() { cancelled } else { settled };
        assert_eq!(
            loser.unwrap_err().program_error(),
            Some(&EscrowError::NotFound { address: record })
        );

        assert_eq!(ledger.balance(&record), 0);
        if ledger.balance(&recipient) > 0 {
            assert_eq!(ledger.balance(&recipient), locked);
            assert_eq!(ledger.balance(&payer_pk), payer_before);
        } else {
            assert_eq!(ledger.balance(&payer_pk), payer_before + locked - FEE);
        }
    }
}

#[test]
fn test_independent_records_proceed_in_parallel() {
    let ledger = Arc::new(new_ledger());
    let attester_pk = pubkey_of(&keypair(100));

    let handles: Vec<_> = (1..=8u8)
        .map(|seed| {
            let ledger = Arc::clone(&ledger);
            thread::spawn(move || {
                let payer = keypair(seed);
                fund(&ledger, &payer, 1);
                let (record, result) = create(&ledger, &payer, &attester_pk, 1, AMOUNT);
                result.map(|_| record)
            })
        })
        .collect();

    for handle in handles {
        let record = handle.join().unwrap().unwrap();
        assert!(ledger.record(&record).unwrap().is_active());
    }
    assert_eq!(ledger.events().len(), 8);
}
