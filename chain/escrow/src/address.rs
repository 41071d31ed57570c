//! Record address derivation
//!
//! A custody record lives at an address derived from the program id, the
//! payer and the payer-chosen nonce. Candidates are hashed for bump values
//! 255 down to 0 and the first one that is *not* a valid Ed25519 point wins,
//! so no private key can ever sign for a record address.

use ed25519_dalek::VerifyingKey;
use sha2::{Digest, Sha256};
use types::ids::Pubkey;

use crate::errors::{AddressError, EscrowError};

/// Domain tag mixed into every record address.
pub const RECORD_SEED: &[u8] = b"custody-record";

/// Maximum length of a single seed.
pub const MAX_SEED_LEN: usize = 32;

/// Maximum number of seeds, bump included.
pub const MAX_SEEDS: usize = 16;

const DERIVED_ADDRESS_MARKER: &[u8] = b"ProgramDerivedAddress";

/// Whether `bytes` decode to a point on the Ed25519 curve.
pub fn is_on_curve(bytes: &[u8; 32]) -> bool {
    VerifyingKey::from_bytes(bytes).is_ok()
}

/// Hash `seeds` into a program address.
///
/// Fails with [`AddressError::OnCurve`] when the hash is a valid public key.
pub fn create_program_address(
    seeds: &[&[u8]],
    program_id: &Pubkey,
) -> Result<Pubkey, AddressError> {
    if seeds.len() > MAX_SEEDS {
        return Err(AddressError::TooManySeeds {
            count: seeds.len(),
            max: MAX_SEEDS,
        });
    }

    let mut hasher = Sha256::new();
    for seed in seeds {
        if seed.len() > MAX_SEED_LEN {
            return Err(AddressError::MaxSeedLengthExceeded {
                len: seed.len(),
                max: MAX_SEED_LEN,
            });
        }
        hasher.update(seed);
    }
    hasher.update(program_id.as_ref());
    hasher.update(DERIVED_ADDRESS_MARKER);

    let hash: [u8; 32] = hasher.finalize().into();
    if is_on_curve(&hash) {
        return Err(AddressError::OnCurve);
    }
    Ok(Pubkey::new_from_array(hash))
}

/// Search bump values from 255 down and return the first off-curve address.
pub fn find_program_address(
    seeds: &[&[u8]],
    program_id: &Pubkey,
) -> Result<(Pubkey, u8), AddressError> {
    if seeds.len() >= MAX_SEEDS {
        return Err(AddressError::TooManySeeds {
            count: seeds.len() + 1,
            max: MAX_SEEDS,
        });
    }

    for bump in (0..=u8::MAX).rev() {
        let bump_seed = [bump];
        let mut with_bump: Vec<&[u8]> = seeds.to_vec();
        with_bump.push(&bump_seed);

        match create_program_address(&with_bump, program_id) {
            Ok(address) => return Ok((address, bump)),
            Err(AddressError::OnCurve) => continue,
            Err(err) => return Err(err),
        }
    }
    Err(AddressError::NoViableBump)
}

/// Derive the record address and canonical bump for `(payer, nonce)`.
pub fn derive(program_id: &Pubkey, payer: &Pubkey, nonce: u64) -> Result<(Pubkey, u8), AddressError> {
    let nonce_bytes = nonce.to_le_bytes();
    find_program_address(&[RECORD_SEED, payer.as_ref(), &nonce_bytes], program_id)
}

/// Check that `address` is the record address for `(payer, nonce)` with `bump`.
///
/// Only the canonical bump is accepted, so every `(payer, nonce)` pair maps to
/// exactly one address.
pub fn verify_record_address(
    program_id: &Pubkey,
    payer: &Pubkey,
    nonce: u64,
    bump: u8,
    address: &Pubkey,
) -> Result<(), EscrowError> {
    let (expected, canonical_bump) = derive(program_id, payer, nonce)?;
    if expected != *address || canonical_bump != bump {
        return Err(EscrowError::AddressMismatch {
            expected,
            actual: *address,
        });
    }
    Ok(())
}
