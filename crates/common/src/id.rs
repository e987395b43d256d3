//! Hub and document identifiers: 16 random bytes behind a two-byte
//! multicodec header (`0x00` identity, `0x10` length), encoded as
//! multibase base58btc.

use getrandom::getrandom;

/// Length of a decoded identifier: two header bytes plus 16 bytes of entropy.
pub const DECODED_SIZE: usize = 18;

const MULTIBASE_BASE58: char = 'z';
const MULTICODEC_IDENTITY: u8 = 0x00;
const PAYLOAD_SIZE_TAG: u8 = 0x10;

/// Errors that can occur while validating an identifier
#[derive(Debug, thiserror::Error)]
pub enum IdError {
    #[error("identifier must be multibase base58 (leading 'z')")]
    NotMultibase,
    #[error("identifier is not valid base58: {0}")]
    Base58(#[from] bs58::decode::Error),
    #[error("identifier must decode to {DECODED_SIZE} bytes, got {0}")]
    InvalidSize(usize),
    #[error("identifier header bytes are invalid")]
    InvalidHeader,
}

/// Mint a fresh identifier from 16 cryptographically random bytes.
pub fn generate() -> String {
    let mut bytes = [0u8; DECODED_SIZE];
    bytes[0] = MULTICODEC_IDENTITY;
    bytes[1] = PAYLOAD_SIZE_TAG;
    getrandom(&mut bytes[2..]).expect("failed to generate random bytes");
    format!("{}{}", MULTIBASE_BASE58, bs58::encode(&bytes).into_string())
}

/// Validate the structural shape of an identifier.
///
/// # Errors
///
/// Returns an error if the multibase prefix is missing, the base58 payload
/// does not decode, the decoded buffer is not exactly 18 bytes, or the
/// header bytes are wrong.
pub fn validate(id: &str) -> Result<(), IdError> {
    let encoded = id
        .strip_prefix(MULTIBASE_BASE58)
        .ok_or(IdError::NotMultibase)?;
    let bytes = bs58::decode(encoded).into_vec()?;
    if bytes.len() != DECODED_SIZE {
        return Err(IdError::InvalidSize(bytes.len()));
    }
    if bytes[0] != MULTICODEC_IDENTITY || bytes[1] != PAYLOAD_SIZE_TAG {
        return Err(IdError::InvalidHeader);
    }
    Ok(())
}
