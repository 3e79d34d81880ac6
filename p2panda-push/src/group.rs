// SPDX-License-Identifier: MIT OR Apache-2.0

//! Group secrets and the group-scoped envelope of push payloads.
use tracing::{debug, trace};

use crate::crypto::Secret;
use crate::crypto::push_box::secret_box_open;
use crate::error::PushError;
use crate::traits::GroupStore;
use crate::wire::{GroupPublicKey, OutOfStoreMessage, OutOfStoreMessageEnvelope, nonce_from_slice};

/// 256-bit secret group key.
pub const GROUP_SECRET_SIZE: usize = 32;

/// Symmetric secret shared by all members of a group.
///
/// Owned by the group store. The push handler only borrows it to open one envelope and never
/// keeps it around.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GroupSecret(Secret<GROUP_SECRET_SIZE>);

impl GroupSecret {
    pub fn from_bytes(bytes: [u8; GROUP_SECRET_SIZE]) -> Self {
        Self(Secret::from_bytes(bytes))
    }

    pub(crate) fn as_bytes(&self) -> &[u8; GROUP_SECRET_SIZE] {
        self.0.as_bytes()
    }
}

/// Group as known to the group store of this device.
#[derive(Clone, Debug)]
pub struct GroupRecord {
    public_key: GroupPublicKey,
    secret: GroupSecret,
}

impl GroupRecord {
    pub fn new(public_key: GroupPublicKey, secret: GroupSecret) -> Self {
        Self { public_key, secret }
    }

    pub fn public_key(&self) -> &GroupPublicKey {
        &self.public_key
    }

    pub fn secret(&self) -> &GroupSecret {
        &self.secret
    }
}

/// Looks up the shared secret of a group.
///
/// Groups the device doesn't know (anymore) result in `GroupNotFound`, whether the group store
/// reports them as absent or fails the lookup.
pub fn resolve_group_secret<G: GroupStore>(
    groups: &G,
    group_public_key: &GroupPublicKey,
) -> Result<GroupSecret, PushError> {
    let record = groups
        .lookup_group(group_public_key)
        .map_err(|err| {
            debug!(group = %group_public_key, %err, "group lookup failed");
            PushError::GroupNotFound(*group_public_key)
        })?
        .ok_or(PushError::GroupNotFound(*group_public_key))?;
    trace!(group = %group_public_key, "resolved group secret");
    Ok(record.secret().clone())
}

/// Opens a group envelope and decodes the out-of-store message inside of it.
pub fn open_group_envelope(
    envelope: &OutOfStoreMessageEnvelope,
    secret: &GroupSecret,
) -> Result<OutOfStoreMessage, PushError> {
    let nonce = nonce_from_slice(&envelope.nonce)?;

    let message_bytes = secret_box_open(&envelope.sealed, nonce, secret.as_bytes())
        .map_err(|_| PushError::DecryptFailure)?;

    OutOfStoreMessage::try_from_bytes(&message_bytes).map_err(|err| {
        PushError::Deserialization(format!("unable to decode out-of-store message: {err}"))
    })
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use crate::crypto::Rng;
    use crate::crypto::push_box::secret_box_seal;
    use crate::error::PushError;
    use crate::test_utils::{FailingGroupStore, MemoryGroupStore, TestGroup, test_message};
    use crate::wire::OutOfStoreMessageEnvelope;

    use super::{GroupSecret, open_group_envelope, resolve_group_secret};

    #[test]
    fn resolve_known_and_unknown_groups() {
        let rng = Rng::from_seed([1; 32]);
        let group = TestGroup::new(&rng);
        let other_group = TestGroup::new(&rng);

        let groups = MemoryGroupStore::new();
        groups.insert(group.record());

        assert_eq!(
            resolve_group_secret(&groups, &group.public_key).unwrap(),
            group.secret
        );
        assert_matches!(
            resolve_group_secret(&groups, &other_group.public_key),
            Err(PushError::GroupNotFound(key)) if key == other_group.public_key
        );
    }

    #[test]
    fn failed_lookup_is_unknown_group() {
        let rng = Rng::from_seed([6; 32]);
        let group = TestGroup::new(&rng);

        assert_matches!(
            resolve_group_secret(&FailingGroupStore, &group.public_key),
            Err(PushError::GroupNotFound(key)) if key == group.public_key
        );
    }

    #[test]
    fn open_envelope() {
        let rng = Rng::from_seed([2; 32]);
        let group = TestGroup::new(&rng);
        let message = test_message(&rng, 7);

        let envelope = group.seal(&rng, &message);
        assert_eq!(open_group_envelope(&envelope, &group.secret).unwrap(), message);
    }

    #[test]
    fn wrong_secret() {
        let rng = Rng::from_seed([3; 32]);
        let group = TestGroup::new(&rng);
        let envelope = group.seal(&rng, &test_message(&rng, 1));

        let wrong_secret = GroupSecret::from_bytes(rng.random_array().unwrap());
        assert_matches!(
            open_group_envelope(&envelope, &wrong_secret),
            Err(PushError::DecryptFailure)
        );
    }

    #[test]
    fn invalid_nonce() {
        let rng = Rng::from_seed([4; 32]);
        let group = TestGroup::new(&rng);
        let mut envelope = group.seal(&rng, &test_message(&rng, 1));
        envelope.nonce.truncate(16);

        assert_matches!(
            open_group_envelope(&envelope, &group.secret),
            Err(PushError::InvalidInput(_))
        );
    }

    #[test]
    fn malformed_message() {
        let rng = Rng::from_seed([5; 32]);
        let group = TestGroup::new(&rng);
        let nonce = rng.random_array().unwrap();

        let sealed = secret_box_seal(&[0xff, 0xfe, 0x00], nonce, group.secret.as_bytes()).unwrap();
        let envelope = OutOfStoreMessageEnvelope {
            group_public_key: group.public_key.as_bytes().to_vec(),
            nonce: nonce.to_vec(),
            sealed,
        };

        assert_matches!(
            open_group_envelope(&envelope, &group.secret),
            Err(PushError::Deserialization(_))
        );
    }
}
