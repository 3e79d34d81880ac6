// SPDX-License-Identifier: MIT OR Apache-2.0

//! Opening push payloads on a device which holds its own push key material.
use tracing::{debug, warn};

use crate::config::Config;
use crate::crypto::Rng;
use crate::crypto::x25519::{PublicKey, SecretKey};
use crate::error::PushError;
use crate::group::{open_group_envelope, resolve_group_secret};
use crate::keypair::PushKeyPair;
use crate::memory::MemoryStore;
use crate::message::open_message;
use crate::server::TrustedServerKeyStore;
use crate::traits::{GroupStore, KeyValueStore, MessageKeystore};
use crate::transport::open_push_data;
use crate::wire::{PushReceiveReply, PushServer};

/// Operations every push handler offers, whether it decrypts payloads itself or delegates to a
/// remote protocol service.
///
/// Key-material operations fail with `Unsupported` on handlers which don't hold any keys.
pub trait PushHandler {
    /// Opens a push payload and returns the message it carried.
    fn receive_push(
        &self,
        payload: &[u8],
    ) -> impl Future<Output = Result<PushReceiveReply, PushError>> + Send;

    /// Replaces the trusted push server.
    fn update_push_server(
        &self,
        server: &PushServer,
    ) -> impl Future<Output = Result<(), PushError>> + Send;

    /// Public key push servers should seal payloads for this device with.
    fn push_public_key(&self) -> Result<PublicKey, PushError>;

    fn set_push_secret_key(&self, secret_key: SecretKey) -> Result<(), PushError>;

    /// Replaces the push secret with a freshly generated one and returns the new public key.
    fn rotate_push_key(&self, rng: &Rng) -> Result<PublicKey, PushError>;
}

/// Push handler holding the push keypair of this device.
///
/// Every payload passes three stages, each one has to succeed before the next one starts:
///
/// 1. The push envelope is opened with the device's push secret and the trusted push server's
///    public key.
/// 2. The group envelope inside of it is opened with the secret of the group it names.
/// 3. The out-of-store message is handed to the message keystore.
#[derive(Debug)]
pub struct LocalPushHandler<G, M, S = MemoryStore> {
    keypair: PushKeyPair,
    servers: TrustedServerKeyStore<S>,
    groups: G,
    messages: M,
}

impl<G, M, S> LocalPushHandler<G, M, S> {
    pub fn new(
        keypair: PushKeyPair,
        servers: TrustedServerKeyStore<S>,
        groups: G,
        messages: M,
    ) -> Self {
        Self {
            keypair,
            servers,
            groups,
            messages,
        }
    }

    pub fn public_key(&self) -> Option<PublicKey> {
        self.keypair.public_key()
    }
}

impl<G, M, S> LocalPushHandler<G, M, S>
where
    G: GroupStore,
    M: MessageKeystore,
    S: KeyValueStore,
{
    /// Runs a push payload through all stages of the decryption pipeline.
    pub fn receive(&self, payload: &[u8]) -> Result<PushReceiveReply, PushError> {
        let server_public_key = self.servers.current_server_public_key().map_err(|err| {
            debug!(%err, "no usable push server key");
            PushError::unable_to_decrypt(err)
        })?;

        let secret_key = self.keypair.secret_key().ok_or_else(|| {
            PushError::unable_to_decrypt(PushError::InvalidInput(
                "no push receiver secret key set".into(),
            ))
        })?;

        let opened = open_push_data(payload, &server_public_key, &secret_key);
        drop(secret_key);
        let (group_public_key, envelope) = opened.inspect_err(|err| {
            debug!(%err, "unable to open push envelope");
        })?;

        let message = resolve_group_secret(&self.groups, &group_public_key)
            .and_then(|secret| open_group_envelope(&envelope, &secret))
            .map_err(|err| {
                if matches!(err, PushError::GroupNotFound(_)) {
                    debug!(group = %group_public_key, "push received for unknown group");
                } else {
                    warn!(group = %group_public_key, %err, "unable to open group envelope");
                }
                PushError::crypto_decrypt(err)
            })?;

        let reply = open_message(&self.messages, message, group_public_key).map_err(|err| {
            warn!(group = %group_public_key, %err, "unable to open out-of-store message");
            PushError::crypto_decrypt(err)
        })?;

        debug!(
            group = %group_public_key,
            already_received = reply.already_received,
            "received push message"
        );

        Ok(reply)
    }

    pub fn update_server(&self, server: &PushServer) -> Result<(), PushError> {
        self.servers.update(server)
    }
}

impl<G, M, S> PushHandler for LocalPushHandler<G, M, S>
where
    G: GroupStore,
    M: MessageKeystore,
    S: KeyValueStore,
{
    fn receive_push(
        &self,
        payload: &[u8],
    ) -> impl Future<Output = Result<PushReceiveReply, PushError>> + Send {
        let result = self.receive(payload);
        async move { result }
    }

    fn update_push_server(
        &self,
        server: &PushServer,
    ) -> impl Future<Output = Result<(), PushError>> + Send {
        let result = self.update_server(server);
        async move { result }
    }

    fn push_public_key(&self) -> Result<PublicKey, PushError> {
        self.public_key()
            .ok_or_else(|| PushError::InvalidInput("no push secret key set".into()))
    }

    fn set_push_secret_key(&self, secret_key: SecretKey) -> Result<(), PushError> {
        self.keypair.set_secret_key(secret_key);
        Ok(())
    }

    fn rotate_push_key(&self, rng: &Rng) -> Result<PublicKey, PushError> {
        self.keypair.rotate(rng)
    }
}

/// Builds a [`LocalPushHandler`].
///
/// Group store and message keystore are required. The account cache falls back to an in-memory
/// store when none was given, the push secret key has to be set before building.
#[derive(Debug)]
pub struct PushHandlerBuilder<G, M, S = MemoryStore> {
    account_cache: S,
    config: Config,
    groups: G,
    messages: M,
    secret_key: Option<SecretKey>,
}

impl<G, M> PushHandlerBuilder<G, M, MemoryStore> {
    pub fn new(groups: G, messages: M) -> Self {
        Self {
            account_cache: MemoryStore::new(),
            config: Config::default(),
            groups,
            messages,
            secret_key: None,
        }
    }

    /// Instantiate a push handler builder from a configuration.
    pub fn from_config(config: Config, groups: G, messages: M) -> Self {
        Self::new(groups, messages).config(config)
    }
}

impl<G, M, S> PushHandlerBuilder<G, M, S> {
    pub fn config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Sets the secret key this device receives push payloads with.
    pub fn push_secret_key(mut self, secret_key: SecretKey) -> Self {
        self.secret_key = Some(secret_key);
        self
    }

    /// Sets the store the trusted push server record is cached in.
    pub fn account_cache<T>(self, account_cache: T) -> PushHandlerBuilder<G, M, T> {
        PushHandlerBuilder {
            account_cache,
            config: self.config,
            groups: self.groups,
            messages: self.messages,
            secret_key: self.secret_key,
        }
    }

    pub fn build(self) -> Result<LocalPushHandler<G, M, S>, PushError> {
        let secret_key = self
            .secret_key
            .ok_or_else(|| PushError::InvalidInput("no cross account push key specified".into()))?;

        let servers =
            TrustedServerKeyStore::new(self.account_cache, self.config.push_server_cache_key);

        Ok(LocalPushHandler::new(
            PushKeyPair::new(secret_key),
            servers,
            self.groups,
            self.messages,
        ))
    }
}
