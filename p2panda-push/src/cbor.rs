// SPDX-License-Identifier: MIT OR Apache-2.0

//! [CBOR] encoding of push wire structures.
//!
//! Byte fields are encoded as CBOR byte strings which carry their own length prefix. Every
//! encoded structure is exactly one CBOR data item, decoding rejects bytes trailing after it.
//!
//! [CBOR]: https://cbor.io/
use ciborium::de::Error as CiboriumDecodeError;
use ciborium::ser::Error as CiboriumEncodeError;
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

/// Serializes a wire structure into CBOR.
pub fn encode_cbor<T: Serialize>(value: &T) -> Result<Vec<u8>, EncodeError> {
    let mut bytes = Vec::new();
    ciborium::into_writer(value, &mut bytes).map_err(|err| match err {
        CiboriumEncodeError::Io(err) => EncodeError::Io(err),
        CiboriumEncodeError::Value(message) => EncodeError::Value(message),
    })?;
    Ok(bytes)
}

/// Deserializes a wire structure from a buffer holding exactly one CBOR data item.
pub fn decode_cbor<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, DecodeError> {
    let mut remaining = bytes;
    let value = ciborium::from_reader(&mut remaining).map_err(|err| match err {
        CiboriumDecodeError::Io(_) => DecodeError::UnexpectedEnd,
        CiboriumDecodeError::Syntax(offset) => DecodeError::Syntax(offset),
        CiboriumDecodeError::Semantic(_, message) => DecodeError::Semantic(message),
        CiboriumDecodeError::RecursionLimitExceeded => DecodeError::RecursionLimitExceeded,
    })?;

    if !remaining.is_empty() {
        return Err(DecodeError::TrailingBytes(remaining.len()));
    }

    Ok(value)
}

#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("could not write cbor bytes: {0}")]
    Io(std::io::Error),

    /// The value can't be represented in CBOR.
    #[error("could not serialize value: {0}")]
    Value(String),
}

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("input ended before the cbor item was complete")]
    UnexpectedEnd,

    /// Invalid CBOR at the given byte offset.
    #[error("invalid cbor at position {0}")]
    Syntax(usize),

    /// Valid CBOR which does not match the shape of the expected structure.
    #[error("unexpected cbor value: {0}")]
    Semantic(String),

    #[error("recursion limit exceeded while decoding")]
    RecursionLimitExceeded,

    #[error("{0} bytes trailing after cbor item")]
    TrailingBytes(usize),
}
