//! # Cryptographic Primitives
//!
//! Hashing and address encoding: the two capabilities module-account
//! derivation cannot work without.
//!
//! Nothing here is novel. Blake2b, BLAKE3 and SHA-256 come from audited
//! crates; SS58 is a thin framing around base58 and a Blake2b checksum.

pub mod hash;
pub mod ss58;

pub use hash::{blake2_256, blake2_512, blake3_hash, sha256_array, HashAlgorithm};
pub use ss58::Ss58Error;
