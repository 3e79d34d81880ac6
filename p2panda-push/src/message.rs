// SPDX-License-Identifier: MIT OR Apache-2.0

//! Hands recovered out-of-store messages to the message keystore.
use crate::error::PushError;
use crate::traits::MessageKeystore;
use crate::wire::{GroupPublicKey, OutOfStoreMessage, PushReceiveReply};

/// Opens the message with the message keystore and packages the result.
///
/// Deduplication is left to the keystore: a message it reports as not newly decrypted is marked
/// as `already_received`. Failures are not retried.
pub fn open_message<M: MessageKeystore>(
    keystore: &M,
    message: OutOfStoreMessage,
    group_public_key: GroupPublicKey,
) -> Result<PushReceiveReply, PushError> {
    let (cleartext, newly_decrypted) = keystore
        .open_out_of_store_message(&message, &group_public_key)
        .map_err(|err| PushError::MessageKeystore(err.to_string()))?;

    Ok(PushReceiveReply {
        message,
        cleartext,
        group_public_key,
        already_received: !newly_decrypted,
    })
}
