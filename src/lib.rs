//! Password-based key derivation from a caller identifier.
//!
//! A seed (user id, account name, ...) is expanded into a 32-byte salt with
//! self-keyed HMAC-SHA256, then Argon2id derives the key from the password and
//! that salt. Both steps are deterministic: the same password, seed and
//! parameters always yield the same key.
//!
//! ```no_run
//! use seedkdf::{KdfParams, derive_from_seed};
//!
//! let params = KdfParams::new(64 * 1024, 3, 4, 32)?;
//! let derivation = derive_from_seed("correct horse", b"User-ID-2", params)?;
//! assert_eq!(derivation.key.len(), 32);
//! # Ok::<(), seedkdf::KdfError>(())
//! ```
//!
//! Keys are wiped when dropped; callers that copy the bytes out own that copy.

mod crypto;
mod error;

pub use crate::crypto::{
    DerivedKey, ExpandedSalt, KEY_LEN, KdfParams, MIN_HASH_LEN, RANDOM_SALT_LEN, SALT_LEN,
    derive_key, expand_seed, generate_salt,
};
pub use crate::error::{KdfError, Result};

/// The salt a seed expanded to, and the key derived with it.
#[derive(Debug, Clone)]
pub struct Derivation {
    pub salt: ExpandedSalt,
    pub key: DerivedKey,
}

/// Expand `seed` and derive a key from `password` with the expanded salt.
///
/// Either both values come back or neither does.
pub fn derive_from_seed(password: &str, seed: &[u8], params: KdfParams) -> Result<Derivation> {
    let salt = expand_seed(seed)?;
    let key = derive_key(password, salt.as_ref(), params)?;
    Ok(Derivation { salt, key })
}
