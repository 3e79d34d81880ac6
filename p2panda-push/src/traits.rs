// SPDX-License-Identifier: MIT OR Apache-2.0

//! Interfaces to the stores and services the push handler depends on.
//!
//! None of them is owned by this crate: group secrets, message keys and the account cache are
//! managed by the surrounding application, which hands implementations of these traits to the
//! handler when building it.
use std::error::Error;

use crate::group::GroupRecord;
use crate::wire::{
    GroupPublicKey, OutOfStoreMessage, PushReceiveReply, PushReceiveRequest, PushSetServerRequest,
};

/// Key-value persistence layer, for example the account cache of an application.
///
/// Implementations need to be safe for concurrent use. A `put` replaces the previous value as a
/// whole; readers observe either the old or the new value.
pub trait KeyValueStore {
    type Error: Error;

    fn put(&self, key: &str, value: &[u8]) -> Result<(), Self::Error>;

    /// Returns `None` if no value was stored under this key.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, Self::Error>;
}

/// Read-only access to the groups known to this device.
pub trait GroupStore {
    type Error: Error;

    /// Returns `None` if the device is not (or no longer) a member of this group.
    ///
    /// Stores which can't tell an unknown group apart from other lookup failures may return an
    /// error instead, both are treated as an unknown group.
    fn lookup_group(&self, public_key: &GroupPublicKey) -> Result<Option<GroupRecord>, Self::Error>;
}

/// Derives per-message keys and keeps track of which messages were already opened.
pub trait MessageKeystore {
    type Error: Error;

    /// Opens an out-of-store message, returning its cleartext and `true` if it was opened for
    /// the first time.
    fn open_out_of_store_message(
        &self,
        message: &OutOfStoreMessage,
        group_public_key: &GroupPublicKey,
    ) -> Result<(Vec<u8>, bool), Self::Error>;
}

/// Client of a remote protocol service which holds the push key material of this device.
pub trait ProtocolService {
    type Error: Error + Send + Sync + 'static;

    fn push_receive(
        &self,
        request: PushReceiveRequest,
    ) -> impl Future<Output = Result<PushReceiveReply, Self::Error>> + Send;

    fn push_set_server(
        &self,
        request: PushSetServerRequest,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;
}
