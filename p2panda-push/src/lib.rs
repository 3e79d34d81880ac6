// SPDX-License-Identifier: MIT OR Apache-2.0

//! `p2panda-push` opens end-to-end encrypted push notification payloads for p2p groups.
//!
//! Push relays and push servers only ever see opaque ciphertext: a payload carries just enough
//! encrypted material for the receiving device to learn that a new message exists in one of its
//! groups and to recover it locally. Neither the content, the sender nor the group is revealed to
//! the push infrastructure.
//!
//! ## Three nested envelopes
//!
//! Opening a payload chains three independent key domains:
//!
//! 1. The push envelope ([`PushExposedData`]) is sealed by the trusted push server towards the
//!    push key of this device (NaCl `box`, X25519 and XSalsa20-Poly1305).
//! 2. Inside is a group envelope ([`OutOfStoreMessageEnvelope`]) naming the group it was posted
//!    in. It is sealed with the symmetric secret of that group, which is looked up in the
//!    application's [`GroupStore`] for every payload and never cached here.
//! 3. The recovered [`OutOfStoreMessage`] is handed to the application's [`MessageKeystore`],
//!    which derives the message key and tells whether the message was already received before.
//!
//! A failure at any stage aborts the whole call, no partial result is ever returned.
//!
//! ## Local and remote handlers
//!
//! [`LocalPushHandler`] holds the push keypair of the device and runs all stages itself. It is
//! built with [`PushHandlerBuilder`]. Devices which leave their key material to a separate
//! protocol service use [`RemotePushHandler`] instead, forwarding every payload to that service
//! with a bounded timeout. Both implement [`PushHandler`]; key-material operations on the remote
//! handler fail with [`PushError::Unsupported`].
mod cbor;
pub mod config;
pub mod crypto;
mod error;
mod group;
mod handler;
mod keypair;
mod memory;
mod message;
mod remote;
mod server;
#[cfg(any(test, feature = "test_utils"))]
pub mod test_utils;
pub mod traits;
mod transport;
pub mod wire;

pub use cbor::{DecodeError, EncodeError};
pub use config::Config;
pub use error::PushError;
pub use group::{
    GROUP_SECRET_SIZE, GroupRecord, GroupSecret, open_group_envelope, resolve_group_secret,
};
pub use handler::{LocalPushHandler, PushHandler, PushHandlerBuilder};
pub use keypair::PushKeyPair;
pub use memory::MemoryStore;
pub use message::open_message;
pub use remote::RemotePushHandler;
pub use server::TrustedServerKeyStore;
pub use traits::{GroupStore, KeyValueStore, MessageKeystore, ProtocolService};
pub use transport::open_push_data;
pub use wire::{
    GroupPublicKey, OutOfStoreMessage, OutOfStoreMessageEnvelope, PushExposedData,
    PushReceiveReply, PushServer,
};
