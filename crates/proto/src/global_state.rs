//! Application global state as returned by the node, and the typed view over it.

use std::collections::BTreeMap;

use crate::abi::AbiCodec;
use crate::address::Address;
use crate::error::DecodeError;

/// A single TEAL value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TealValue {
    Bytes(Vec<u8>),
    Uint(u64),
}

/// Key/value global state of one application.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GlobalState {
    entries: BTreeMap<Vec<u8>, TealValue>,
}

impl GlobalState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<Vec<u8>>, value: TealValue) {
        self.entries.insert(key.into(), value);
    }

    /// Builder-style insert of a uint entry.
    pub fn with_uint(mut self, key: &str, value: u64) -> Self {
        self.insert(key.as_bytes(), TealValue::Uint(value));
        self
    }

    /// Builder-style insert of a bytes entry.
    pub fn with_bytes(mut self, key: &str, value: impl Into<Vec<u8>>) -> Self {
        self.insert(key.as_bytes(), TealValue::Bytes(value.into()));
        self
    }

    pub fn get(&self, key: &str) -> Option<&TealValue> {
        self.entries.get(key.as_bytes())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Vec<u8>, &TealValue)> {
        self.entries.iter()
    }

    // ── Typed accessors ─────────────────────────────────────────────────

    pub fn uint(&self, key: &str) -> Result<u64, DecodeError> {
        match self.get(key) {
            Some(TealValue::Uint(v)) => Ok(*v),
            Some(TealValue::Bytes(_)) => Err(DecodeError::WrongType {
                key: key.to_string(),
                expected: "uint",
            }),
            None => Err(DecodeError::MissingKey(key.to_string())),
        }
    }

    pub fn bytes(&self, key: &str) -> Result<&[u8], DecodeError> {
        match self.get(key) {
            Some(TealValue::Bytes(v)) => Ok(v.as_slice()),
            Some(TealValue::Uint(_)) => Err(DecodeError::WrongType {
                key: key.to_string(),
                expected: "bytes",
            }),
            None => Err(DecodeError::MissingKey(key.to_string())),
        }
    }

    /// Bytes entry holding exactly `N` bytes.
    pub fn fixed<const N: usize>(&self, key: &str) -> Result<[u8; N], DecodeError> {
        let raw = self.bytes(key)?;
        raw.try_into().map_err(|_| DecodeError::InvalidField {
            field: "global state bytes",
            reason: format!("key '{}' expected {} bytes, got {}", key, N, raw.len()),
        })
    }

    /// Single-byte stage code stored as `byte[1]`.
    pub fn byte(&self, key: &str) -> Result<u8, DecodeError> {
        Ok(self.fixed::<1>(key)?[0])
    }

    pub fn address(&self, key: &str) -> Result<Address, DecodeError> {
        Address::from_slice(self.bytes(key)?)
    }

    /// Bytes entry decoded through an ABI schema.
    pub fn schema<T: AbiCodec>(&self, key: &str) -> Result<T, DecodeError> {
        T::decode(self.bytes(key)?)
    }
}

/// A record that can be built from an application's global state.
pub trait FromGlobalState: Sized {
    fn from_global_state(app_id: u64, state: &GlobalState) -> Result<Self, DecodeError>;
}
