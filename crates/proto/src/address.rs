//! Algorand account address.
//!
//! On the wire an address is the raw 32-byte public key. The text form is
//! base32 (RFC 4648, no padding) of `pubkey || checksum`, where `checksum`
//! is the last 4 bytes of SHA-512/256 over the public key, giving 58 chars.

use std::fmt;
use std::str::FromStr;

use data_encoding::BASE32_NOPAD;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha512_256};

use crate::abi::{AbiCodec, AbiReader, AbiWriter};
use crate::error::DecodeError;

/// Length of the public key part.
pub const ADDRESS_LEN: usize = 32;
/// Length of the checksum suffix.
const CHECKSUM_LEN: usize = 4;
/// Length of the text form.
pub const ADDRESS_TEXT_LEN: usize = 58;

/// 32-byte account address.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Address([u8; ADDRESS_LEN]);

impl Address {
    /// The all-zero address, used as the null pointer in on-chain lists.
    pub const ZERO: Address = Address([0u8; ADDRESS_LEN]);

    pub const fn new(bytes: [u8; ADDRESS_LEN]) -> Self {
        Self(bytes)
    }

    /// Build from a byte slice that must be exactly 32 bytes long.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, DecodeError> {
        let raw: [u8; ADDRESS_LEN] = bytes.try_into().map_err(|_| {
            DecodeError::InvalidAddress(format!(
                "expected {} bytes, got {}",
                ADDRESS_LEN,
                bytes.len()
            ))
        })?;
        Ok(Self(raw))
    }

    pub fn as_bytes(&self) -> &[u8; ADDRESS_LEN] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; ADDRESS_LEN]
    }

    fn checksum(&self) -> [u8; CHECKSUM_LEN] {
        let digest = Sha512_256::digest(self.0);
        let mut out = [0u8; CHECKSUM_LEN];
        out.copy_from_slice(&digest[digest.len() - CHECKSUM_LEN..]);
        out
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut raw = [0u8; ADDRESS_LEN + CHECKSUM_LEN];
        raw[..ADDRESS_LEN].copy_from_slice(&self.0);
        raw[ADDRESS_LEN..].copy_from_slice(&self.checksum());
        f.write_str(&BASE32_NOPAD.encode(&raw))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self)
    }
}

impl FromStr for Address {
    type Err = DecodeError;

    /// Parse the 58-character text form, verifying the checksum.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != ADDRESS_TEXT_LEN {
            return Err(DecodeError::InvalidAddress(format!(
                "expected {} characters, got {}",
                ADDRESS_TEXT_LEN,
                s.len()
            )));
        }
        let raw = BASE32_NOPAD
            .decode(s.as_bytes())
            .map_err(|e| DecodeError::InvalidAddress(format!("invalid base32: {}", e)))?;
        if raw.len() != ADDRESS_LEN + CHECKSUM_LEN {
            return Err(DecodeError::InvalidAddress(format!(
                "decoded {} bytes, expected {}",
                raw.len(),
                ADDRESS_LEN + CHECKSUM_LEN
            )));
        }
        let address = Address::from_slice(&raw[..ADDRESS_LEN])?;
        if raw[ADDRESS_LEN..] != address.checksum() {
            return Err(DecodeError::InvalidAddress(format!(
                "checksum mismatch for '{}'",
                s
            )));
        }
        Ok(address)
    }
}

impl From<[u8; ADDRESS_LEN]> for Address {
    fn from(bytes: [u8; ADDRESS_LEN]) -> Self {
        Self(bytes)
    }
}

impl AbiCodec for Address {
    const NAME: &'static str = "address";
    const WIDTH: usize = ADDRESS_LEN;

    fn write_to(&self, w: &mut AbiWriter) {
        w.put_bytes(&self.0);
    }

    fn read_from(r: &mut AbiReader<'_>) -> Result<Self, DecodeError> {
        Ok(Self(r.read_bytes::<ADDRESS_LEN>()?))
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}
