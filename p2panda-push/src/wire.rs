// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wire structures of push payloads and of the push RPC methods.
//!
//! A push payload is nested three times:
//!
//! 1. [`PushExposedData`] is what the push relay forwards to a device. It is sealed towards the
//!    device's push key by the push server.
//! 2. Its plaintext is an [`OutOfStoreMessageEnvelope`], sealed with the secret of the group the
//!    message was posted in.
//! 3. Its plaintext is an [`OutOfStoreMessage`], which is handed to the message keystore.
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::cbor::{DecodeError, decode_cbor, encode_cbor};
use crate::crypto::push_box::{BOX_NONCE_SIZE, BoxNonce};
use crate::crypto::x25519::PUBLIC_KEY_SIZE;
use crate::error::PushError;

/// Size of an Ed25519 group public key.
pub const GROUP_PUBLIC_KEY_SIZE: usize = 32;

/// Converts a nonce of a wire structure into a fixed-size array.
pub(crate) fn nonce_from_slice(nonce: &[u8]) -> Result<BoxNonce, PushError> {
    nonce.try_into().map_err(|_| {
        PushError::InvalidInput(format!(
            "invalid nonce size, expected {} bytes, got {}",
            BOX_NONCE_SIZE,
            nonce.len()
        ))
    })
}

/// Outer envelope forwarded by the push relay.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushExposedData {
    #[serde(with = "serde_bytes")]
    pub nonce: Vec<u8>,

    #[serde(rename = "box", with = "serde_bytes")]
    pub sealed: Vec<u8>,
}

impl PushExposedData {
    pub fn to_bytes(&self) -> Result<Vec<u8>, PushError> {
        Ok(encode_cbor(self)?)
    }

    pub fn try_from_bytes(bytes: &[u8]) -> Result<Self, DecodeError> {
        decode_cbor(bytes)
    }
}

/// Envelope scoped to one group, recovered from [`PushExposedData`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutOfStoreMessageEnvelope {
    #[serde(with = "serde_bytes")]
    pub group_public_key: Vec<u8>,

    #[serde(with = "serde_bytes")]
    pub nonce: Vec<u8>,

    #[serde(rename = "box", with = "serde_bytes")]
    pub sealed: Vec<u8>,
}

impl OutOfStoreMessageEnvelope {
    pub fn to_bytes(&self) -> Result<Vec<u8>, PushError> {
        Ok(encode_cbor(self)?)
    }

    pub fn try_from_bytes(bytes: &[u8]) -> Result<Self, DecodeError> {
        decode_cbor(bytes)
    }
}

/// Protocol message delivered through a push notification instead of the regular sync path.
///
/// Contents stay opaque here, they are interpreted by the message keystore.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutOfStoreMessage {
    /// Content identifier of the message in the group log.
    #[serde(with = "serde_bytes")]
    pub cid: Vec<u8>,

    /// Public key of the sending device.
    #[serde(with = "serde_bytes")]
    pub device_pk: Vec<u8>,

    /// Position of the message in the sending device's key chain.
    pub counter: u64,

    #[serde(with = "serde_bytes")]
    pub sig: Vec<u8>,

    pub flags: u32,

    #[serde(with = "serde_bytes")]
    pub encrypted_payload: Vec<u8>,

    #[serde(with = "serde_bytes")]
    pub nonce: Vec<u8>,
}

impl OutOfStoreMessage {
    pub fn to_bytes(&self) -> Result<Vec<u8>, PushError> {
        Ok(encode_cbor(self)?)
    }

    pub fn try_from_bytes(bytes: &[u8]) -> Result<Self, DecodeError> {
        decode_cbor(bytes)
    }
}

/// Cached record of the trusted push server.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushServer {
    /// X25519 public key the server seals push payloads with.
    #[serde(with = "serde_bytes")]
    pub server_key: Vec<u8>,

    /// Address of the push server, informational only.
    #[serde(default)]
    pub service_addr: Option<String>,
}

impl PushServer {
    pub fn new(server_key: [u8; PUBLIC_KEY_SIZE]) -> Self {
        Self {
            server_key: server_key.to_vec(),
            service_addr: None,
        }
    }

    pub fn with_service_addr(mut self, service_addr: impl Into<String>) -> Self {
        self.service_addr = Some(service_addr.into());
        self
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, PushError> {
        Ok(encode_cbor(self)?)
    }

    pub fn try_from_bytes(bytes: &[u8]) -> Result<Self, DecodeError> {
        decode_cbor(bytes)
    }
}

/// Ed25519 public key identifying a group.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GroupPublicKey(#[serde(with = "serde_bytes")] [u8; GROUP_PUBLIC_KEY_SIZE]);

impl GroupPublicKey {
    /// Parses and validates a group public key.
    ///
    /// Fails if the bytes are not a valid compressed Ed25519 point.
    pub fn try_from_bytes(bytes: &[u8]) -> Result<Self, PushError> {
        let bytes: [u8; GROUP_PUBLIC_KEY_SIZE] = bytes.try_into().map_err(|_| {
            PushError::Deserialization(format!(
                "invalid group public key size, expected {} bytes, got {}",
                GROUP_PUBLIC_KEY_SIZE,
                bytes.len()
            ))
        })?;
        ed25519_dalek::VerifyingKey::from_bytes(&bytes).map_err(|err| {
            PushError::Deserialization(format!("invalid group public key: {err}"))
        })?;
        Ok(Self(bytes))
    }

    pub fn as_bytes(&self) -> &[u8; GROUP_PUBLIC_KEY_SIZE] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.as_bytes())
    }
}

impl fmt::Display for GroupPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for GroupPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("GroupPublicKey")
            .field(&self.to_hex())
            .finish()
    }
}

/// Request of the "receive push" RPC method.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushReceiveRequest {
    #[serde(with = "serde_bytes")]
    pub payload: Vec<u8>,
}

/// Request of the "set push server" RPC method.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushSetServerRequest {
    pub server: PushServer,
}

/// Result of successfully opening a push payload.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushReceiveReply {
    /// Message recovered from the group envelope.
    pub message: OutOfStoreMessage,

    /// Plaintext returned by the message keystore.
    #[serde(with = "serde_bytes")]
    pub cleartext: Vec<u8>,

    pub group_public_key: GroupPublicKey,

    /// True if the message keystore had already opened this message before.
    pub already_received: bool,
}

#[cfg(test)]
mod tests {
    use ed25519_dalek::SigningKey;

    use crate::error::PushError;

    use super::{GroupPublicKey, PushServer, nonce_from_slice};

    #[test]
    fn validate_group_public_key() {
        let verifying_key = SigningKey::from_bytes(&[4; 32]).verifying_key();
        let group_key = GroupPublicKey::try_from_bytes(verifying_key.as_bytes()).unwrap();
        assert_eq!(group_key.as_bytes(), verifying_key.as_bytes());

        assert!(matches!(
            GroupPublicKey::try_from_bytes(&[1; 31]),
            Err(PushError::Deserialization(_))
        ));
    }

    #[test]
    fn nonce_size() {
        assert!(nonce_from_slice(&[0; 24]).is_ok());
        assert!(matches!(
            nonce_from_slice(&[0; 12]),
            Err(PushError::InvalidInput(_))
        ));
    }

    #[test]
    fn push_server_record() {
        let server = PushServer::new([3; 32]).with_service_addr("push.example.org:443");
        let bytes = server.to_bytes().unwrap();
        assert_eq!(PushServer::try_from_bytes(&bytes).unwrap(), server);
    }
}
