//! # Block Randomness and SHA-256 Helpers
//!
//! The court derives all of its unpredictability from block hashes. A term's
//! [`Randomness`] is the hash of a block mined *after* the term was created,
//! so whoever triggered the transition could not have known it.
//!
//! Draft sub-seeds and vote commitments are derived with SHA-256 over
//! fixed-width big-endian encodings, via [`Sha256Accumulator`].

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// A 32-byte randomness seed. All-zero means "not yet computed".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Randomness(pub [u8; 32]);

impl Randomness {
    /// The unset seed carried by terms whose randomness is not yet known.
    pub const EMPTY: Randomness = Randomness([0u8; 32]);

    /// Wrap a block hash.
    pub fn from_block_hash(hash: [u8; 32]) -> Self {
        Self(hash)
    }

    /// Whether this seed is still unset.
    pub fn is_empty(&self) -> bool {
        self.0 == [0u8; 32]
    }

    /// The raw seed bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Render the seed as a lowercase hex string.
    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{b:02x}")).collect()
    }
}

impl std::fmt::Display for Randomness {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "0x{}", self.to_hex())
    }
}

/// Incremental SHA-256 over a sequence of fixed-width fields.
///
/// ```
/// use juris_core::Sha256Accumulator;
///
/// let a = Sha256Accumulator::new().u64(1).u64(2).finish();
/// let b = Sha256Accumulator::new().u64(2).u64(1).finish();
/// assert_ne!(a, b);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Sha256Accumulator {
    hasher: Sha256,
}

impl Sha256Accumulator {
    /// Start an empty accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append raw bytes.
    pub fn bytes(mut self, data: &[u8]) -> Self {
        self.hasher.update(data);
        self
    }

    /// Append a `u64` as 8 big-endian bytes.
    pub fn u64(self, value: u64) -> Self {
        self.bytes(&value.to_be_bytes())
    }

    /// Append a single byte.
    pub fn u8(self, value: u8) -> Self {
        self.bytes(&[value])
    }

    /// Finalize into a 32-byte digest.
    pub fn finish(self) -> [u8; 32] {
        let hash = self.hasher.finalize();
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(&hash);
        bytes
    }
}
