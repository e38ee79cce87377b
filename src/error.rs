use thiserror::Error;

/// Failures surfaced by salt expansion and key derivation.
///
/// No variant is retried internally: the same inputs fail the same way, so
/// only a caller-side change (new seed, new parameters) can succeed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum KdfError {
    /// Empty seed or salt, or a salt/password the primitive refuses.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A cost parameter is zero or outside the primitive's bounds.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Working memory for the derivation could not be allocated.
    #[error("resource exhausted: could not allocate {requested_kib} KiB of working memory")]
    ResourceExhausted { requested_kib: u64 },

    /// The OS random generator failed while drawing a random salt.
    #[error("OS random generator unavailable")]
    EntropyUnavailable,
}

pub type Result<T> = std::result::Result<T, KdfError>;

impl KdfError {
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, Self::InvalidInput(_))
    }

    pub fn is_invalid_parameter(&self) -> bool {
        matches!(self, Self::InvalidParameter(_))
    }

    pub fn is_resource_exhausted(&self) -> bool {
        matches!(self, Self::ResourceExhausted { .. })
    }

    pub fn is_entropy_unavailable(&self) -> bool {
        matches!(self, Self::EntropyUnavailable)
    }
}

impl From<argon2::Error> for KdfError {
    fn from(e: argon2::Error) -> Self {
        match e {
            argon2::Error::SaltTooShort
            | argon2::Error::SaltTooLong
            | argon2::Error::PwdTooLong => KdfError::InvalidInput(e.to_string()),
            _ => KdfError::InvalidParameter(e.to_string()),
        }
    }
}
