//! Cryptographic primitives for seeded key derivation.
//!
//! Provides self-keyed salt expansion and Argon2id key derivation.

pub mod kdf;
pub mod salt;

pub use kdf::{DerivedKey, KdfParams, derive_key};
pub use salt::{ExpandedSalt, expand_seed, generate_salt};

/// Length of an expanded salt (32 bytes, the SHA-256 digest width).
pub const SALT_LEN: usize = 32;
/// Length of a freshly drawn random salt (16 bytes).
pub const RANDOM_SALT_LEN: usize = 16;
/// Shortest derived key Argon2 will produce (4 bytes).
pub const MIN_HASH_LEN: usize = 4;
/// Default derived key length (32 bytes / 256 bits).
pub const KEY_LEN: usize = 32;
