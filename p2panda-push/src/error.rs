// SPDX-License-Identifier: MIT OR Apache-2.0

use std::time::Duration;

use thiserror::Error;

use crate::cbor::EncodeError;
use crate::crypto::RngError;
use crate::wire::GroupPublicKey;

/// Errors which can occur when handling push payloads.
///
/// Every stage of the decryption pipeline reports one of these kinds. `UnableToDecrypt` and
/// `CryptoDecrypt` wrap the failure of the stage they guard; use [`PushError::cause`] to get to
/// the innermost kind.
#[derive(Debug, Error)]
pub enum PushError {
    /// A fixed-size field (nonce, key) had the wrong length.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The outer push envelope could not be decoded.
    #[error("invalid push payload: {0}")]
    InvalidPayload(String),

    /// No trusted push server was cached yet.
    #[error("no push server configured")]
    NotConfigured,

    #[error("invalid push server key size, expected {expected} bytes, got {got}")]
    Corrupt { expected: usize, got: usize },

    #[error("unable to serialize value: {0}")]
    Serialization(#[from] EncodeError),

    #[error("unable to deserialize value: {0}")]
    Deserialization(String),

    /// Push envelope addressed to this device could not be opened.
    #[error("unable to decrypt push payload")]
    UnableToDecrypt(#[source] Option<Box<PushError>>),

    #[error("group {0} is unknown to this device")]
    GroupNotFound(GroupPublicKey),

    /// The group envelope failed authentication.
    #[error("unable to open group envelope")]
    DecryptFailure,

    /// The group envelope or the message inside of it could not be opened.
    #[error("unable to decrypt out-of-store message")]
    CryptoDecrypt(#[source] Option<Box<PushError>>),

    #[error("message keystore failed to open message: {0}")]
    MessageKeystore(String),

    #[error("storage failure: {0}")]
    Storage(String),

    #[error("remote call did not complete within {0:?}")]
    Timeout(Duration),

    #[error("remote call failed: {0}")]
    Transport(String),

    /// Key-material operation on a handler which does not hold any keys.
    #[error("{0} is not supported in client mode")]
    Unsupported(&'static str),

    #[error(transparent)]
    Rng(#[from] RngError),
}

impl PushError {
    pub(crate) fn unable_to_decrypt(cause: PushError) -> Self {
        PushError::UnableToDecrypt(Some(Box::new(cause)))
    }

    pub(crate) fn crypto_decrypt(cause: PushError) -> Self {
        PushError::CryptoDecrypt(Some(Box::new(cause)))
    }

    /// Returns the innermost error this one wraps, or itself if it doesn't wrap any.
    pub fn cause(&self) -> &PushError {
        match self {
            PushError::UnableToDecrypt(Some(inner)) | PushError::CryptoDecrypt(Some(inner)) => {
                inner.cause()
            }
            _ => self,
        }
    }
}
