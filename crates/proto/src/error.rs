//! Decode Error Types
//!
//! Every failure produced while turning on-chain bytes into typed records.
//! A `DecodeError` is fatal to the single fetch that produced it: the same
//! bytes will always fail the same way, so callers never retry on it.

use thiserror::Error;

/// Errors raised while decoding ABI tuples or global state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// Input length does not match the schema's fixed width.
    #[error("invalid length for {schema}: expected {expected} bytes, got {actual}")]
    InvalidLength {
        /// Schema name (e.g. `TermsTime`).
        schema: &'static str,
        /// Fixed width of the schema.
        expected: usize,
        /// Length actually received.
        actual: usize,
    },

    /// Reader ran out of bytes in the middle of a field.
    #[error("unexpected end of input at offset {offset} (need {needed} more bytes)")]
    UnexpectedEnd {
        /// Offset where the read started.
        offset: usize,
        /// Bytes that were still required.
        needed: usize,
    },

    /// Address text or bytes did not validate.
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// Required global state key is not present.
    #[error("missing global state key '{0}'")]
    MissingKey(String),

    /// Global state key holds the other TEAL value type.
    #[error("global state key '{key}' has wrong type: expected {expected}")]
    WrongType {
        /// Offending key (lossy UTF-8).
        key: String,
        /// Expected TEAL type name.
        expected: &'static str,
    },

    /// A field decoded but its value is not acceptable.
    #[error("invalid field '{field}': {reason}")]
    InvalidField {
        /// Field name.
        field: &'static str,
        /// Why it was rejected.
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_length_display() {
        let err = DecodeError::InvalidLength {
            schema: "TermsTime",
            expected: 40,
            actual: 39,
        };
        assert_eq!(
            err.to_string(),
            "invalid length for TermsTime: expected 40 bytes, got 39"
        );
    }

    #[test]
    fn test_missing_key_display() {
        let err = DecodeError::MissingKey("round_start".to_string());
        assert!(err.to_string().contains("round_start"));
    }
}
