//! # SS58 Address Encoding
//!
//! The human-facing account format of Substrate chains:
//!
//! ```text
//! base58( prefix_bytes || account_id (32) || checksum (2) )
//! checksum = Blake2b-512("SS58PRE" || prefix_bytes || account_id)[..2]
//! ```
//!
//! Prefixes below 64 take one byte. Prefixes in `64..16384` take two, with
//! the bit shuffle the format defines. Anything larger is not a valid
//! network prefix.

use thiserror::Error;

use super::hash::blake2_512;
use crate::config::ACCOUNT_ID_LENGTH;

const CHECKSUM_PREIMAGE_PREFIX: &[u8] = b"SS58PRE";
const CHECKSUM_LENGTH: usize = 2;
const MAX_PREFIX: u16 = 16_383;

/// Errors from SS58 encoding and decoding.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Ss58Error {
    /// The string is not valid base58.
    #[error("invalid base58: {0}")]
    InvalidBase58(String),

    /// The network prefix does not fit the SS58 prefix space.
    #[error("network prefix {0} out of range (max 16383)")]
    PrefixOutOfRange(u16),

    /// The first byte announces a prefix form the format reserves.
    #[error("reserved prefix byte 0x{0:02x}")]
    ReservedPrefix(u8),

    /// The decoded payload is not prefix + 32 bytes + checksum.
    #[error("invalid payload length: {0} bytes")]
    InvalidLength(usize),

    /// The checksum does not match the payload.
    #[error("checksum mismatch")]
    BadChecksum,
}

fn prefix_bytes(prefix: u16) -> Result<Vec<u8>, Ss58Error> {
    match prefix {
        0..=63 => Ok(vec![prefix as u8]),
        64..=MAX_PREFIX => {
            let first = (((prefix & 0b0000_0000_1111_1100) >> 2) as u8) | 0b0100_0000;
            let second = ((prefix >> 8) as u8) | (((prefix & 0b0000_0000_0000_0011) as u8) << 6);
            Ok(vec![first, second])
        }
        _ => Err(Ss58Error::PrefixOutOfRange(prefix)),
    }
}

fn checksum(payload: &[u8]) -> [u8; CHECKSUM_LENGTH] {
    let mut preimage = Vec::with_capacity(CHECKSUM_PREIMAGE_PREFIX.len() + payload.len());
    preimage.extend_from_slice(CHECKSUM_PREIMAGE_PREFIX);
    preimage.extend_from_slice(payload);
    let digest = blake2_512(&preimage);
    [digest[0], digest[1]]
}

/// Encode a 32-byte account id under the given network prefix.
///
/// # Example
///
/// ```
/// use halal_lending_core::crypto::ss58;
///
/// let address = ss58::encode(&[0u8; 32], 42).unwrap();
/// assert!(address.starts_with('5'));
/// ```
pub fn encode(account: &[u8; ACCOUNT_ID_LENGTH], prefix: u16) -> Result<String, Ss58Error> {
    let mut payload = prefix_bytes(prefix)?;
    payload.extend_from_slice(account);
    let check = checksum(&payload);
    payload.extend_from_slice(&check);
    Ok(bs58::encode(payload).into_string())
}

/// Decode an SS58 string into `(account_id, network_prefix)`.
///
/// Validates length and checksum. The prefix is returned rather than
/// checked so callers can compare accounts across networks.
pub fn decode(address: &str) -> Result<([u8; ACCOUNT_ID_LENGTH], u16), Ss58Error> {
    let data = bs58::decode(address.trim())
        .into_vec()
        .map_err(|e| Ss58Error::InvalidBase58(e.to_string()))?;

    let first = *data.first().ok_or(Ss58Error::InvalidLength(0))?;
    let (prefix_len, prefix) = match first {
        0..=63 => (1, first as u16),
        64..=127 => {
            let second = *data.get(1).ok_or(Ss58Error::InvalidLength(data.len()))?;
            let lower = (first << 2) | (second >> 6);
            let upper = second & 0b0011_1111;
            (2, (lower as u16) | ((upper as u16) << 8))
        }
        _ => return Err(Ss58Error::ReservedPrefix(first)),
    };

    if data.len() != prefix_len + ACCOUNT_ID_LENGTH + CHECKSUM_LENGTH {
        return Err(Ss58Error::InvalidLength(data.len()));
    }

    let body_end = prefix_len + ACCOUNT_ID_LENGTH;
    if checksum(&data[..body_end]) != data[body_end..] {
        return Err(Ss58Error::BadChecksum);
    }

    let mut account = [0u8; ACCOUNT_ID_LENGTH];
    account.copy_from_slice(&data[prefix_len..body_end]);
    Ok((account, prefix))
}

/// Whether two address strings name the same account.
///
/// Identical strings always match. Otherwise both sides must decode as SS58
/// and carry the same 32-byte account id; the network prefix is ignored.
pub fn same_account(a: &str, b: &str) -> bool {
    if a == b {
        return true;
    }
    match (decode(a), decode(b)) {
        (Ok((left, _)), Ok((right, _))) => left == right,
        _ => false,
    }
}
