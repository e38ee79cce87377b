//! Salt expansion.
//!
//! [`expand_seed`] turns a caller identifier (user id, e-mail, account
//! number) into a 32-byte salt by keying HMAC-SHA256 with the SHA-256 of the
//! identifier and MACing the identifier itself:
//!
//! ```text
//! K    = SHA-256(seed)
//! salt = HMAC-SHA256(K, seed)
//! ```
//!
//! The result is deterministic, so the same identity always re-derives the
//! same key without storing anything, and distinct identities get unrelated
//! salts even when the identifiers are short or share prefixes.
//!
//! The expansion adds no entropy: anyone who knows the seed can recompute the
//! salt, so it only decorrelates identities and defeats tables precomputed
//! for a fixed salt. It is not a random salt. When the salt can be stored
//! alongside the derived material, draw one with [`generate_salt`] instead.

use std::fmt;

use getrandom::fill;
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};

use super::{RANDOM_SALT_LEN, SALT_LEN};
use crate::error::{KdfError, Result};

type HmacSha256 = Hmac<Sha256>;

/// A salt deterministically expanded from a seed.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct ExpandedSalt([u8; SALT_LEN]);

impl ExpandedSalt {
    pub fn as_bytes(&self) -> &[u8; SALT_LEN] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl AsRef<[u8]> for ExpandedSalt {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for ExpandedSalt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ExpandedSalt").field(&self.to_hex()).finish()
    }
}

/// Expand a non-empty seed into a 32-byte salt.
///
/// # Errors
///
/// Returns [`KdfError::InvalidInput`] if `seed` is empty.
pub fn expand_seed(seed: &[u8]) -> Result<ExpandedSalt> {
    if seed.is_empty() {
        return Err(KdfError::InvalidInput("seed must not be empty".into()));
    }
    tracing::debug!(seed_len = seed.len(), "expanding seed");

    let key = Sha256::digest(seed);
    let mut mac = HmacSha256::new_from_slice(&key)
        .map_err(|e| KdfError::InvalidInput(format!("hmac key rejected: {e}")))?;
    mac.update(seed);

    Ok(ExpandedSalt(mac.finalize().into_bytes().into()))
}

/// Draw a fresh salt from the OS random generator.
pub fn generate_salt() -> Result<[u8; RANDOM_SALT_LEN]> {
    let mut salt = [0u8; RANDOM_SALT_LEN];
    fill(&mut salt).map_err(|_| KdfError::EntropyUnavailable)?;
    Ok(salt)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expansion_matches_reference_vector() {
        let salt = expand_seed(b"User-ID-2").unwrap();
        assert_eq!(
            salt.to_hex(),
            "19fb70f401ea7e96dda84b6e1d456e5192c445fbb39da9f002d43b7f6cb3bde6"
        );
    }

    #[test]
    fn single_byte_seed_expands() {
        let salt = expand_seed(b"a").unwrap();
        assert_eq!(
            salt.to_hex(),
            "46be8be6d8c269e5f0a86cbef9c3cac1e989fcbaa40139347568d11602f1cf37"
        );
    }

    #[test]
    fn expansion_is_fixed_width() {
        for len in [1usize, 64, 10_000] {
            let seed = vec![0xA5u8; len];
            assert_eq!(expand_seed(&seed).unwrap().as_bytes().len(), SALT_LEN);
        }
    }

    #[test]
    fn neighbouring_ids_get_unrelated_salts() {
        let s1 = expand_seed(b"User-ID-1").unwrap();
        let s2 = expand_seed(b"User-ID-2").unwrap();
        assert_ne!(s1, s2);
        assert_eq!(
            s1.to_hex(),
            "15dfecdb7ddcd5c45ca3b7b748e0c3b472456b6289a4436b556c171717b99841"
        );
    }

    #[test]
    fn empty_seed_is_rejected() {
        let err = expand_seed(b"").unwrap_err();
        assert!(err.is_invalid_input());
    }

    #[test]
    fn byte_views_agree() {
        let salt = expand_seed(b"User-ID-2").unwrap();
        assert_eq!(salt.as_ref(), &salt.as_bytes()[..]);
    }

    #[test]
    fn debug_prints_hex() {
        let salt = expand_seed(b"a").unwrap();
        assert_eq!(
            format!("{salt:?}"),
            "ExpandedSalt(\"46be8be6d8c269e5f0a86cbef9c3cac1e989fcbaa40139347568d11602f1cf37\")"
        );
    }

    #[test]
    fn random_salts_differ() {
        let a = generate_salt().unwrap();
        let b = generate_salt().unwrap();
        assert_eq!(a.len(), RANDOM_SALT_LEN);
        assert_ne!(a, b);
    }
}
