//! # Hashing Utilities
//!
//! The 256-bit hash functions a runtime may use for module accounts, plus the
//! Blake2b-512 digest SS58 checksums are built from.
//!
//! - **Blake2b-256** — the Substrate family's account hash. The default.
//! - **BLAKE3** — for runtimes that swapped the hasher out.
//! - **SHA-256** — for runtimes bridged to ecosystems that expect it.
//!
//! Whichever one the chain uses is a property of the chain, not a preference
//! of ours. Pick the wrong one and every derived address is wrong, with no
//! error anywhere to tell you.

use std::fmt;
use std::str::FromStr;

use blake2::digest::consts::U32;
use blake2::{Blake2b, Blake2b512};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

type Blake2b256 = Blake2b<U32>;

/// Compute the Blake2b-256 hash of the input data.
///
/// # Example
///
/// ```
/// use halal_lending_core::crypto::blake2_256;
///
/// let hash = blake2_256(b"modlhlallend");
/// assert_eq!(hash.len(), 32);
/// ```
pub fn blake2_256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Blake2b256::new();
    hasher.update(data);
    let mut output = [0u8; 32];
    output.copy_from_slice(&hasher.finalize());
    output
}

/// Compute the Blake2b-512 hash of the input data.
///
/// Only the SS58 checksum needs the wide variant.
pub fn blake2_512(data: &[u8]) -> [u8; 64] {
    let mut hasher = Blake2b512::new();
    hasher.update(data);
    let mut output = [0u8; 64];
    output.copy_from_slice(&hasher.finalize());
    output
}

/// Compute the BLAKE3 hash of the input data.
pub fn blake3_hash(data: &[u8]) -> [u8; 32] {
    *blake3::hash(data).as_bytes()
}

/// Compute the SHA-256 hash and return a fixed-size array.
pub fn sha256_array(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    let mut output = [0u8; 32];
    output.copy_from_slice(&hasher.finalize());
    output
}

// ---------------------------------------------------------------------------
// HashAlgorithm
// ---------------------------------------------------------------------------

/// The 256-bit hash a runtime derives module accounts with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    /// Blake2b with a 32-byte digest.
    #[default]
    Blake2b256,
    /// BLAKE3.
    Blake3,
    /// SHA-256.
    Sha256,
}

impl HashAlgorithm {
    /// Hash `data` with this algorithm. Always 32 bytes.
    pub fn digest(&self, data: &[u8]) -> [u8; 32] {
        match self {
            Self::Blake2b256 => blake2_256(data),
            Self::Blake3 => blake3_hash(data),
            Self::Sha256 => sha256_array(data),
        }
    }

    /// Canonical lowercase name, as accepted by [`FromStr`].
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Blake2b256 => "blake2b256",
            Self::Blake3 => "blake3",
            Self::Sha256 => "sha256",
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HashAlgorithm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "").as_str() {
            "blake2b256" | "blake2" | "blake2256" => Ok(Self::Blake2b256),
            "blake3" => Ok(Self::Blake3),
            "sha256" => Ok(Self::Sha256),
            other => Err(format!("unknown hash algorithm: {other}")),
        }
    }
}
