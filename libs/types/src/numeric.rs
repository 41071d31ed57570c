//! Ledger amounts
//!
//! Balances are whole lamports held in `u64`. Arithmetic on balances is
//! always checked; callers turn `None` into their own overflow error.

/// Smallest indivisible unit of ledger value.
pub type Lamports = u64;

/// Lamports in one whole coin.
pub const LAMPORTS_PER_SOL: Lamports = 1_000_000_000;

/// Sum of several amounts, `None` on overflow.
pub fn checked_sum<I>(amounts: I) -> Option<Lamports>
where
    I: IntoIterator<Item = Lamports>,
{
    amounts
        .into_iter()
        .try_fold(0u64, |acc, amount| acc.checked_add(amount))
}
