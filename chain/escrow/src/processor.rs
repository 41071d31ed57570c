//! Escrow processor — Create, Settle and Cancel
//!
//! The processor holds no state of its own. Every read and write goes
//! through the [`InvokeContext`], and any error aborts the whole transaction;
//! the ledger discards the working copy, so a failed check never needs to
//! undo anything here.

use tracing::{debug, info, warn};
use types::ids::{ConditionId, Pubkey};
use types::numeric::{checked_sum, Lamports};

use crate::address;
use crate::errors::EscrowError;
use crate::events::{EscrowCancelled, EscrowCreated, EscrowEvent, EscrowSettled};
use crate::instruction::EscrowInstruction;
use crate::ledger::context::InvokeContext;
use crate::ledger::transaction::AccountMeta;
use crate::security::{AuthorizationGuard, Role};
use crate::state::{CustodyRecord, MatchCriterion, RecordStatus};

/// Accounts for [`create`], in instruction order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CreateAccounts {
    pub payer: Pubkey,
    pub record: Pubkey,
    pub attester: Pubkey,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateArgs {
    pub bump: u8,
    pub nonce: u64,
    pub amount: Lamports,
    pub condition_id: ConditionId,
    pub match_criterion: Vec<u8>,
}

/// Accounts for [`settle`], in instruction order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SettleAccounts {
    pub attester: Pubkey,
    pub recipient: Pubkey,
    pub record: Pubkey,
}

/// Accounts for [`cancel`], in instruction order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CancelAccounts {
    pub payer: Pubkey,
    pub record: Pubkey,
}

/// Decode `data` and run the instruction against `metas`.
pub fn process_instruction(
    ctx: &mut InvokeContext<'_>,
    metas: &[AccountMeta],
    data: &[u8],
) -> Result<(), EscrowError> {
    let instruction = EscrowInstruction::unpack(data)?;
    debug!(instruction = instruction.name(), accounts = metas.len(), "Processing instruction");

    let result = match instruction {
        EscrowInstruction::Create {
            bump,
            nonce,
            amount,
            condition_id,
            match_criterion,
        } => {
            let [payer, record, attester] = account_keys(metas)?;
            create(
                ctx,
                CreateAccounts {
                    payer,
                    record,
                    attester,
                },
                CreateArgs {
                    bump,
                    nonce,
                    amount,
                    condition_id,
                    match_criterion: match_criterion.as_bytes().to_vec(),
                },
            )
        }
        EscrowInstruction::Settle { condition_id } => {
            let [attester, recipient, record] = account_keys(metas)?;
            settle(
                ctx,
                SettleAccounts {
                    attester,
                    recipient,
                    record,
                },
                condition_id,
            )
        }
        EscrowInstruction::Cancel { condition_id } => {
            let [payer, record] = account_keys(metas)?;
            cancel(ctx, CancelAccounts { payer, record }, condition_id)
        }
    };

    if let Err(err) = &result {
        warn!(error = %err, code = err.code(), "Instruction rejected");
    }
    result
}

fn account_keys<const N: usize>(metas: &[AccountMeta]) -> Result<[Pubkey; N], EscrowError> {
    if metas.len() < N {
        return Err(EscrowError::NotEnoughAccountKeys {
            expected: N,
            actual: metas.len(),
        });
    }
    let mut keys = [Pubkey::default(); N];
    for (key, meta) in keys.iter_mut().zip(metas) {
        *key = meta.pubkey;
    }
    Ok(keys)
}

// ───────────────────────── Create ─────────────────────────

/// Open a custody record at the address derived from `(payer, nonce)` and
/// fund it with `amount` plus the minimum reserve.
pub fn create(
    ctx: &mut InvokeContext<'_>,
    accounts: CreateAccounts,
    args: CreateArgs,
) -> Result<(), EscrowError> {
    let program_id = *ctx.program_id();

    address::verify_record_address(
        &program_id,
        &accounts.payer,
        args.nonce,
        args.bump,
        &accounts.record,
    )?;

    // A bare pre-funded system account is adopted; anything else is a record.
    let exists = ctx
        .account(&accounts.record)
        .is_some_and(|account| account.owner == program_id || !account.data.is_empty());
    if exists {
        return Err(EscrowError::AlreadyExists {
            address: accounts.record,
        });
    }

    AuthorizationGuard::new(ctx.signers()).require_signed(&accounts.payer)?;

    let reserve = ctx.rent().minimum_balance(CustodyRecord::LEN);
    let required = checked_sum([reserve, args.amount]).ok_or(EscrowError::ArithmeticOverflow)?;
    let available = ctx.lamports(&accounts.payer);
    if available < required {
        return Err(EscrowError::InsufficientFunds {
            required,
            available,
        });
    }

    if args.amount == 0 {
        return Err(EscrowError::InvalidAmount);
    }

    let match_criterion = MatchCriterion::new(args.match_criterion)?;

    let record = CustodyRecord {
        status: RecordStatus::Active,
        bump: args.bump,
        nonce: args.nonce,
        amount: args.amount,
        condition_id: args.condition_id,
        created_at: ctx.clock().unix_timestamp,
        payer: accounts.payer,
        attester: accounts.attester,
        match_criterion,
    };

    ctx.allocate(accounts.record, program_id, record.pack());
    ctx.transfer(&accounts.payer, &accounts.record, required)?;

    info!(
        record = %accounts.record,
        payer = %accounts.payer,
        nonce = args.nonce,
        amount = args.amount,
        reserve,
        condition_id = %args.condition_id,
        "Custody record created"
    );

    ctx.emit(EscrowEvent::Created(EscrowCreated {
        record: accounts.record,
        payer: accounts.payer,
        attester: accounts.attester,
        nonce: args.nonce,
        amount: args.amount,
        reserve,
        condition_id: args.condition_id,
        created_at: record.created_at,
    }));
    Ok(())
}

// ───────────────────────── Settle ─────────────────────────

/// Release the entire record balance to `recipient` on the attester's signature.
pub fn settle(
    ctx: &mut InvokeContext<'_>,
    accounts: SettleAccounts,
    condition_id: ConditionId,
) -> Result<(), EscrowError> {
    let record = load_active_record(ctx, &accounts.record)?;
    AuthorizationGuard::new(ctx.signers()).authorize(&accounts.attester, &record, Role::Attester)?;
    check_condition(&record, condition_id)?;
    if accounts.recipient == accounts.record {
        return Err(EscrowError::InvalidRecipient);
    }

    let released = close_record(
        ctx,
        &accounts.record,
        record,
        RecordStatus::Settled,
        &accounts.recipient,
    )?;

    info!(
        record = %accounts.record,
        recipient = %accounts.recipient,
        released,
        "Custody record settled"
    );

    ctx.emit(EscrowEvent::Settled(EscrowSettled {
        record: accounts.record,
        attester: accounts.attester,
        recipient: accounts.recipient,
        condition_id,
        released,
    }));
    Ok(())
}

// ───────────────────────── Cancel ─────────────────────────

/// Return the entire record balance to its payer.
pub fn cancel(
    ctx: &mut InvokeContext<'_>,
    accounts: CancelAccounts,
    condition_id: ConditionId,
) -> Result<(), EscrowError> {
    let record = load_active_record(ctx, &accounts.record)?;
    AuthorizationGuard::new(ctx.signers()).authorize(&accounts.payer, &record, Role::Payer)?;
    check_condition(&record, condition_id)?;

    let refunded = close_record(
        ctx,
        &accounts.record,
        record,
        RecordStatus::Cancelled,
        &accounts.payer,
    )?;

    info!(
        record = %accounts.record,
        payer = %accounts.payer,
        refunded,
        "Custody record cancelled"
    );

    ctx.emit(EscrowEvent::Cancelled(EscrowCancelled {
        record: accounts.record,
        payer: accounts.payer,
        condition_id,
        refunded,
    }));
    Ok(())
}

// ───────────────────────── Helpers ─────────────────────────

/// Decode the Active record at `address` and re-check its address.
///
/// Missing, foreign-owned, undecodable and terminal records all read as
/// `NotFound`.
fn load_active_record(
    ctx: &InvokeContext<'_>,
    address: &Pubkey,
) -> Result<CustodyRecord, EscrowError> {
    let not_found = || EscrowError::NotFound { address: *address };

    let account = ctx.account(address).ok_or_else(not_found)?;
    if account.owner != *ctx.program_id() {
        return Err(not_found());
    }
    let record = CustodyRecord::unpack(&account.data).ok_or_else(not_found)?;
    if !record.is_active() {
        return Err(not_found());
    }

    address::verify_record_address(
        ctx.program_id(),
        &record.payer,
        record.nonce,
        record.bump,
        address,
    )?;
    Ok(record)
}

fn check_condition(record: &CustodyRecord, condition_id: ConditionId) -> Result<(), EscrowError> {
    if record.condition_id != condition_id {
        return Err(EscrowError::ConditionMismatch {
            expected: record.condition_id,
            actual: condition_id,
        });
    }
    Ok(())
}

/// Mark the record terminal and drain its whole balance to `destination`.
///
/// The drained account is purged when the transaction commits.
fn close_record(
    ctx: &mut InvokeContext<'_>,
    address: &Pubkey,
    mut record: CustodyRecord,
    status: RecordStatus,
    destination: &Pubkey,
) -> Result<Lamports, EscrowError> {
    record.status = status;
    let account = ctx
        .account_mut(address)
        .ok_or(EscrowError::NotFound { address: *address })?;
    record.pack_into(&mut account.data)?;

    let balance = ctx.lamports(address);
    ctx.transfer(address, destination, balance)?;
    Ok(balance)
}
