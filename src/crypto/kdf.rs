use std::fmt;

use argon2::{Algorithm, Argon2, Block, Params, Version};
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, Zeroizing};

use super::KEY_LEN;
use crate::error::{KdfError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KdfParams {
    mem_cost_kib: u32,
    time_cost: u32,
    parallelism: u32,
    hash_len: usize,
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            // default memory cost
            mem_cost_kib: 100 * 1024, // 100 MiB
            // default number of iterations
            time_cost: 2,
            // default number of lanes
            parallelism: 8,
            hash_len: KEY_LEN,
        }
    }
}

impl KdfParams {
    pub fn new(mem_cost_kib: u32, time_cost: u32, parallelism: u32, hash_len: usize) -> Result<Self> {
        let params = Self {
            mem_cost_kib,
            time_cost,
            parallelism,
            hash_len,
        };
        params.validate()?;
        Ok(params)
    }

    pub fn mem_cost_kib(&self) -> u32 {
        self.mem_cost_kib
    }

    pub fn time_cost(&self) -> u32 {
        self.time_cost
    }

    pub fn parallelism(&self) -> u32 {
        self.parallelism
    }

    pub fn hash_len(&self) -> usize {
        self.hash_len
    }

    /// Check every field is positive, then let Argon2 apply its own bounds
    /// (lane count, `mem_cost_kib >= 8 * parallelism`, minimum output length).
    pub fn validate(&self) -> Result<()> {
        if self.time_cost == 0 {
            return Err(KdfError::InvalidParameter("time cost must be >= 1".into()));
        }
        if self.mem_cost_kib == 0 {
            return Err(KdfError::InvalidParameter("memory cost must be >= 1 KiB".into()));
        }
        if self.parallelism == 0 {
            return Err(KdfError::InvalidParameter("parallelism must be >= 1".into()));
        }
        if self.hash_len == 0 {
            return Err(KdfError::InvalidParameter("hash length must be >= 1".into()));
        }
        self.to_argon2().map(|_| ())
    }

    fn to_argon2(self) -> Result<Params> {
        Ok(Params::new(
            self.mem_cost_kib,
            self.time_cost,
            self.parallelism,
            Some(self.hash_len),
        )?)
    }
}

/// Key material produced by [`derive_key`]. Zeroized on drop.
#[derive(Clone)]
pub struct DerivedKey(Zeroizing<Vec<u8>>);

impl DerivedKey {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn to_hex(&self) -> Zeroizing<String> {
        Zeroizing::new(hex::encode(&*self.0))
    }
}

impl fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DerivedKey([REDACTED; {}])", self.0.len())
    }
}

/// Argon2 lane memory, owned for the length of one derivation.
///
/// Reserved fallibly so an oversized `mem_cost_kib` comes back as an error
/// instead of aborting the process; wiped and freed on drop.
struct WorkingMemory {
    blocks: Vec<Block>,
}

impl WorkingMemory {
    fn allocate(block_count: usize) -> Result<Self> {
        let mut blocks = Vec::new();
        // One block per KiB.
        blocks
            .try_reserve_exact(block_count)
            .map_err(|_| KdfError::ResourceExhausted {
                requested_kib: block_count as u64,
            })?;
        blocks.resize(block_count, Block::default());
        Ok(Self { blocks })
    }

    fn blocks_mut(&mut self) -> &mut [Block] {
        &mut self.blocks
    }
}

impl Drop for WorkingMemory {
    fn drop(&mut self) {
        self.blocks.zeroize();
    }
}

/// Derive a `params.hash_len()`-byte key from `password` and `salt` with Argon2id.
///
/// The password is hashed as its UTF-8 bytes.
///
/// # Errors
///
/// - [`KdfError::InvalidInput`] if `salt` is empty or shorter than Argon2's minimum.
/// - [`KdfError::InvalidParameter`] if `params` fails [`KdfParams::validate`].
/// - [`KdfError::ResourceExhausted`] if the working memory cannot be allocated.
pub fn derive_key(password: &str, salt: &[u8], params: KdfParams) -> Result<DerivedKey> {
    if salt.is_empty() {
        return Err(KdfError::InvalidInput("salt must not be empty".into()));
    }
    params.validate()?;

    let argon2_params = params.to_argon2()?;
    let span = tracing::debug_span!(
        "derive_key",
        mem_cost_kib = params.mem_cost_kib,
        time_cost = params.time_cost,
        parallelism = params.parallelism,
        hash_len = params.hash_len,
        salt_len = salt.len(),
    );
    let _guard = span.enter();

    let mut memory = WorkingMemory::allocate(argon2_params.block_count())?;
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, argon2_params);

    let mut key = Zeroizing::new(vec![0u8; params.hash_len]);
    argon2
        .hash_password_into_with_memory(password.as_bytes(), salt, &mut key, memory.blocks_mut())
        .inspect_err(|e| tracing::debug!(error = %e, "argon2 rejected derivation"))?;

    tracing::debug!("key derived");
    Ok(DerivedKey(key))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::MIN_HASH_LEN;

    fn cheap() -> KdfParams {
        KdfParams {
            mem_cost_kib: 256,
            time_cost: 2,
            parallelism: 2,
            hash_len: 32,
        }
    }

    #[test]
    fn kdf_is_deterministic() {
        let salt = [42u8; 16];

        let k1 = derive_key("password", &salt, cheap()).unwrap();
        let k2 = derive_key("password", &salt, cheap()).unwrap();

        assert_eq!(k1.as_bytes(), k2.as_bytes());
    }

    #[test]
    fn kdf_matches_reference_vector() {
        let salt = hex::decode("19fb70f401ea7e96dda84b6e1d456e5192c445fbb39da9f002d43b7f6cb3bde6")
            .unwrap();
        let key = derive_key("your_password_here", &salt, cheap()).unwrap();
        assert_eq!(
            *key.to_hex(),
            "a398e95ad8a7a1ca56ec3db5cd5c4ac4678301f46a048b827805af79c1f0ce08"
        );
    }

    #[test]
    fn kdf_params_affect_output() {
        let salt = [7u8; 16];
        let base = derive_key("pw", &salt, cheap()).unwrap();

        let variants = [
            KdfParams { mem_cost_kib: 512, ..cheap() },
            KdfParams { time_cost: 3, ..cheap() },
            KdfParams { parallelism: 1, ..cheap() },
            KdfParams { hash_len: 33, ..cheap() },
        ];
        for params in variants {
            let k = derive_key("pw", &salt, params).unwrap();
            assert_ne!(k.as_bytes(), base.as_bytes(), "{params:?}");
        }
    }

    #[test]
    fn password_and_salt_affect_output() {
        let base = derive_key("pw", &[7u8; 16], cheap()).unwrap();
        let other_pw = derive_key("pW", &[7u8; 16], cheap()).unwrap();
        let other_salt = derive_key("pw", &[8u8; 16], cheap()).unwrap();
        assert_ne!(base.as_bytes(), other_pw.as_bytes());
        assert_ne!(base.as_bytes(), other_salt.as_bytes());
    }

    #[test]
    fn output_has_requested_length() {
        for hash_len in [16, 32, 64] {
            let params = KdfParams { hash_len, ..cheap() };
            let key = derive_key("pw", &[1u8; 16], params).unwrap();
            assert_eq!(key.len(), hash_len);
        }
    }

    #[test]
    fn empty_salt_is_rejected() {
        let err = derive_key("pw", b"", cheap()).unwrap_err();
        assert!(err.is_invalid_input());
    }

    #[test]
    fn short_salt_is_rejected_by_argon2() {
        let err = derive_key("pw", b"short", cheap()).unwrap_err();
        assert!(err.is_invalid_input());
    }

    #[test]
    fn zero_costs_are_rejected() {
        let zero_time = KdfParams { time_cost: 0, ..cheap() };
        let zero_lanes = KdfParams { parallelism: 0, ..cheap() };
        let zero_mem = KdfParams { mem_cost_kib: 0, ..cheap() };
        let zero_len = KdfParams { hash_len: 0, ..cheap() };

        for params in [zero_time, zero_lanes, zero_mem, zero_len] {
            let err = derive_key("pw", &[1u8; 16], params).unwrap_err();
            assert!(err.is_invalid_parameter(), "{params:?}: {err}");
        }
    }

    #[test]
    fn memory_below_lane_minimum_is_rejected() {
        // Argon2 needs 8 KiB per lane.
        let err = KdfParams::new(16, 1, 4, 32).unwrap_err();
        assert!(err.is_invalid_parameter());
        assert!(KdfParams::new(32, 1, 4, 32).is_ok());
    }

    #[test]
    fn too_short_output_is_rejected() {
        let err = KdfParams::new(256, 1, 1, MIN_HASH_LEN - 1).unwrap_err();
        assert!(err.is_invalid_parameter());
        assert!(KdfParams::new(256, 1, 1, MIN_HASH_LEN).is_ok());
    }

    #[test]
    fn default_params_are_valid() {
        let params = KdfParams::default();
        params.validate().unwrap();
        assert_eq!(params.mem_cost_kib(), 102_400);
        assert_eq!(params.time_cost(), 2);
        assert_eq!(params.parallelism(), 8);
        assert_eq!(params.hash_len(), 32);
    }

    #[test]
    fn oversized_working_memory_is_resource_exhausted() {
        let err = WorkingMemory::allocate(usize::MAX).err().unwrap();
        assert!(err.is_resource_exhausted());
    }

    #[test]
    fn derive_key_reports_unallocatable_memory() {
        // 256 GiB of lane memory.
        let params = KdfParams::new(0x0FFF_FFFF, 1, 1, 32).unwrap();
        let err = derive_key("pw", &[1u8; 16], params).unwrap_err();
        assert!(err.is_resource_exhausted(), "{err}");
    }

    #[test]
    fn working_memory_has_requested_blocks() {
        let mut memory = WorkingMemory::allocate(16).unwrap();
        assert_eq!(memory.blocks_mut().len(), 16);
    }

    #[test]
    fn debug_redacts_key() {
        let key = derive_key("pw", &[1u8; 16], cheap()).unwrap();
        assert_eq!(format!("{key:?}"), "DerivedKey([REDACTED; 32])");
    }

    #[test]
    fn params_serialize_as_plain_fields() {
        let json = serde_json::to_value(cheap()).unwrap();
        assert_eq!(json["mem_cost_kib"], 256);
        assert_eq!(json["time_cost"], 2);
        assert_eq!(json["parallelism"], 2);
        assert_eq!(json["hash_len"], 32);
    }
}
