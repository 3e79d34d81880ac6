// SPDX-License-Identifier: MIT OR Apache-2.0

//! Cache of the trusted push server record.
use tracing::debug;

use crate::crypto::x25519::{PUBLIC_KEY_SIZE, PublicKey};
use crate::error::PushError;
use crate::traits::KeyValueStore;
use crate::wire::PushServer;

/// Persists the record of the push server this device trusts and reads its public key.
///
/// The record is read from the underlying store on every lookup, as it can be replaced at any
/// time.
#[derive(Clone, Debug)]
pub struct TrustedServerKeyStore<S> {
    store: S,
    cache_key: String,
}

impl<S> TrustedServerKeyStore<S> {
    pub fn new(store: S, cache_key: impl Into<String>) -> Self {
        Self {
            store,
            cache_key: cache_key.into(),
        }
    }
}

impl<S> TrustedServerKeyStore<S>
where
    S: KeyValueStore,
{
    /// Replaces the cached push server record.
    pub fn update(&self, server: &PushServer) -> Result<(), PushError> {
        let bytes = server.to_bytes()?;
        self.store
            .put(&self.cache_key, &bytes)
            .map_err(|err| PushError::Storage(format!("unable to cache push server: {err}")))?;
        debug!(service_addr = ?server.service_addr, "updated trusted push server");
        Ok(())
    }

    /// Returns the public key of the currently trusted push server.
    pub fn current_server_public_key(&self) -> Result<PublicKey, PushError> {
        let bytes = self
            .store
            .get(&self.cache_key)
            .map_err(|err| PushError::Storage(format!("unable to read push server: {err}")))?
            .ok_or(PushError::NotConfigured)?;

        if bytes.is_empty() {
            return Err(PushError::NotConfigured);
        }

        let server = PushServer::try_from_bytes(&bytes).map_err(|err| {
            PushError::Deserialization(format!("unable to decode push server: {err}"))
        })?;

        let server_key: [u8; PUBLIC_KEY_SIZE] = server
            .server_key
            .as_slice()
            .try_into()
            .map_err(|_| PushError::Corrupt {
                expected: PUBLIC_KEY_SIZE,
                got: server.server_key.len(),
            })?;

        Ok(PublicKey::from_bytes(server_key))
    }
}
