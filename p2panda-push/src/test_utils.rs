// SPDX-License-Identifier: MIT OR Apache-2.0

//! Fixtures and in-memory collaborators for testing push handlers.
//!
//! Contains helpers to seal payloads the way a push server would. They only exist to produce
//! test input, this crate does not implement the sending side.
use std::collections::{HashMap, HashSet};
use std::convert::Infallible;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use ed25519_dalek::SigningKey;
use thiserror::Error;

use crate::crypto::Rng;
use crate::crypto::push_box::{box_seal, secret_box_seal};
use crate::crypto::x25519::{PublicKey, SecretKey};
use crate::error::PushError;
use crate::group::{GroupRecord, GroupSecret};
use crate::handler::LocalPushHandler;
use crate::traits::{GroupStore, KeyValueStore, MessageKeystore, ProtocolService};
use crate::wire::{
    GroupPublicKey, OutOfStoreMessage, OutOfStoreMessageEnvelope, PushExposedData,
    PushReceiveReply, PushReceiveRequest, PushSetServerRequest,
};

pub fn setup_logging() {
    if std::env::var("RUST_LOG").is_ok() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .try_init();
    }
}

#[derive(Debug, Error)]
#[error("{0}")]
pub struct TestError(pub &'static str);

/// Group with a random Ed25519 public key and a random shared secret.
#[derive(Clone, Debug)]
pub struct TestGroup {
    pub public_key: GroupPublicKey,
    pub secret: GroupSecret,
}

impl TestGroup {
    pub fn new(rng: &Rng) -> Self {
        let signing_key = SigningKey::from_bytes(&rng.random_array().unwrap());
        let public_key = GroupPublicKey::try_from_bytes(signing_key.verifying_key().as_bytes())
            .expect("valid ed25519 public key");
        Self {
            public_key,
            secret: GroupSecret::from_bytes(rng.random_array().unwrap()),
        }
    }

    pub fn record(&self) -> GroupRecord {
        GroupRecord::new(self.public_key, self.secret.clone())
    }

    /// Seals a message into an envelope for this group.
    pub fn seal(&self, rng: &Rng, message: &OutOfStoreMessage) -> OutOfStoreMessageEnvelope {
        let nonce = rng.random_array().unwrap();
        let sealed = secret_box_seal(&message.to_bytes().unwrap(), nonce, self.secret.as_bytes())
            .unwrap();
        OutOfStoreMessageEnvelope {
            group_public_key: self.public_key.as_bytes().to_vec(),
            nonce: nonce.to_vec(),
            sealed,
        }
    }
}

pub fn test_message(rng: &Rng, counter: u64) -> OutOfStoreMessage {
    let cid: [u8; 34] = rng.random_array().unwrap();
    let device_pk: [u8; 32] = rng.random_array().unwrap();
    let sig: [u8; 64] = rng.random_array().unwrap();
    let payload: [u8; 48] = rng.random_array().unwrap();
    let nonce: [u8; 24] = rng.random_array().unwrap();
    OutOfStoreMessage {
        cid: cid.to_vec(),
        device_pk: device_pk.to_vec(),
        counter,
        sig: sig.to_vec(),
        flags: 0,
        encrypted_payload: payload.to_vec(),
        nonce: nonce.to_vec(),
    }
}

/// Seals a message for a group and the result towards a device, like a push server does.
pub fn seal_push_data(
    rng: &Rng,
    server_secret: &SecretKey,
    device_public: &PublicKey,
    group: &TestGroup,
    message: &OutOfStoreMessage,
) -> PushExposedData {
    let envelope = group.seal(rng, message);
    let nonce = rng.random_array().unwrap();
    let sealed = box_seal(
        &envelope.to_bytes().unwrap(),
        nonce,
        device_public,
        server_secret,
    )
    .unwrap();
    PushExposedData {
        nonce: nonce.to_vec(),
        sealed,
    }
}

/// Group store holding group records in memory.
#[derive(Clone, Debug, Default)]
pub struct MemoryGroupStore {
    groups: Arc<RwLock<HashMap<GroupPublicKey, GroupRecord>>>,
}

impl MemoryGroupStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, record: GroupRecord) {
        let mut groups = self.groups.write().unwrap_or_else(PoisonError::into_inner);
        groups.insert(*record.public_key(), record);
    }

    pub fn remove(&self, public_key: &GroupPublicKey) {
        let mut groups = self.groups.write().unwrap_or_else(PoisonError::into_inner);
        groups.remove(public_key);
    }
}

impl GroupStore for MemoryGroupStore {
    type Error = Infallible;

    fn lookup_group(
        &self,
        public_key: &GroupPublicKey,
    ) -> Result<Option<GroupRecord>, Self::Error> {
        let groups = self.groups.read().unwrap_or_else(PoisonError::into_inner);
        Ok(groups.get(public_key).cloned())
    }
}

/// Group store which fails every lookup, like stores reporting unknown groups as errors.
#[derive(Clone, Debug)]
pub struct FailingGroupStore;

impl GroupStore for FailingGroupStore {
    type Error = TestError;

    fn lookup_group(
        &self,
        _public_key: &GroupPublicKey,
    ) -> Result<Option<GroupRecord>, Self::Error> {
        Err(TestError("group not found"))
    }
}

/// Message keystore stub which remembers every message it opened.
///
/// The "cleartext" it returns is the encrypted payload of the message as-is.
#[derive(Clone, Debug, Default)]
pub struct MemoryMessageKeystore {
    opened: Arc<Mutex<HashSet<(GroupPublicKey, Vec<u8>, u64)>>>,
}

impl MemoryMessageKeystore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl MessageKeystore for MemoryMessageKeystore {
    type Error = Infallible;

    fn open_out_of_store_message(
        &self,
        message: &OutOfStoreMessage,
        group_public_key: &GroupPublicKey,
    ) -> Result<(Vec<u8>, bool), Self::Error> {
        let mut opened = self.opened.lock().unwrap_or_else(PoisonError::into_inner);
        let newly_decrypted =
            opened.insert((*group_public_key, message.cid.clone(), message.counter));
        Ok((message.encrypted_payload.clone(), newly_decrypted))
    }
}

/// Message keystore which can't open any message.
#[derive(Clone, Debug)]
pub struct FailingMessageKeystore;

impl MessageKeystore for FailingMessageKeystore {
    type Error = TestError;

    fn open_out_of_store_message(
        &self,
        _message: &OutOfStoreMessage,
        _group_public_key: &GroupPublicKey,
    ) -> Result<(Vec<u8>, bool), Self::Error> {
        Err(TestError("no message key for counter"))
    }
}

/// Protocol service answering with an in-process local push handler.
#[derive(Debug)]
pub struct LocalService<G, M, S> {
    handler: Arc<LocalPushHandler<G, M, S>>,
}

impl<G, M, S> LocalService<G, M, S> {
    pub fn new(handler: Arc<LocalPushHandler<G, M, S>>) -> Self {
        Self { handler }
    }
}

impl<G, M, S> ProtocolService for LocalService<G, M, S>
where
    G: GroupStore,
    M: MessageKeystore,
    S: KeyValueStore,
{
    type Error = PushError;

    fn push_receive(
        &self,
        request: PushReceiveRequest,
    ) -> impl Future<Output = Result<PushReceiveReply, Self::Error>> + Send {
        let result = self.handler.receive(&request.payload);
        async move { result }
    }

    fn push_set_server(
        &self,
        request: PushSetServerRequest,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send {
        let result = self.handler.update_server(&request.server);
        async move { result }
    }
}

/// Protocol service which never answers.
#[derive(Clone, Debug)]
pub struct UnresponsiveService;

impl ProtocolService for UnresponsiveService {
    type Error = TestError;

    fn push_receive(
        &self,
        _request: PushReceiveRequest,
    ) -> impl Future<Output = Result<PushReceiveReply, Self::Error>> + Send {
        std::future::pending()
    }

    fn push_set_server(
        &self,
        _request: PushSetServerRequest,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send {
        std::future::pending()
    }
}

/// Protocol service whose channel is broken.
#[derive(Clone, Debug)]
pub struct DisconnectedService;

impl ProtocolService for DisconnectedService {
    type Error = TestError;

    fn push_receive(
        &self,
        _request: PushReceiveRequest,
    ) -> impl Future<Output = Result<PushReceiveReply, Self::Error>> + Send {
        std::future::ready(Err(TestError("connection reset")))
    }

    fn push_set_server(
        &self,
        _request: PushSetServerRequest,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send {
        std::future::ready(Err(TestError("connection reset")))
    }
}
