// SPDX-License-Identifier: MIT OR Apache-2.0

//! Opens the push envelope the push server sealed towards this device.
use crate::crypto::push_box::box_open;
use crate::crypto::x25519::{PublicKey, SecretKey};
use crate::error::PushError;
use crate::wire::{GroupPublicKey, OutOfStoreMessageEnvelope, PushExposedData, nonce_from_slice};

/// Opens a push payload with the device's push secret and the public key of the trusted push
/// server.
///
/// Returns the group envelope carried inside of it together with the validated public key of its
/// group. Authentication failures are not further distinguished: a payload sealed for another
/// device and a corrupted payload both result in `UnableToDecrypt`.
pub fn open_push_data(
    payload: &[u8],
    server_public_key: &PublicKey,
    secret_key: &SecretKey,
) -> Result<(GroupPublicKey, OutOfStoreMessageEnvelope), PushError> {
    let push_data = PushExposedData::try_from_bytes(payload)
        .map_err(|err| PushError::InvalidPayload(err.to_string()))?;

    let nonce = nonce_from_slice(&push_data.nonce)
        .map_err(|err| PushError::InvalidPayload(err.to_string()))?;

    let envelope_bytes = box_open(&push_data.sealed, nonce, server_public_key, secret_key)
        .map_err(|_| PushError::UnableToDecrypt(None))?;

    let envelope = OutOfStoreMessageEnvelope::try_from_bytes(&envelope_bytes).map_err(|err| {
        PushError::Deserialization(format!("unable to decode group envelope: {err}"))
    })?;

    let group_public_key = GroupPublicKey::try_from_bytes(&envelope.group_public_key)?;

    Ok((group_public_key, envelope))
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use crate::cbor::encode_cbor;
    use crate::crypto::Rng;
    use crate::crypto::push_box::box_seal;
    use crate::crypto::x25519::SecretKey;
    use crate::error::PushError;
    use crate::test_utils::{TestGroup, seal_push_data};
    use crate::wire::{OutOfStoreMessage, OutOfStoreMessageEnvelope, PushExposedData};

    use super::open_push_data;

    #[test]
    fn open_envelope() {
        let rng = Rng::from_seed([1; 32]);
        let server_secret = SecretKey::from_bytes(rng.random_array().unwrap());
        let device_secret = SecretKey::from_bytes(rng.random_array().unwrap());
        let group = TestGroup::new(&rng);

        let push_data = seal_push_data(
            &rng,
            &server_secret,
            &device_secret.public_key(),
            &group,
            &OutOfStoreMessage::default(),
        );

        let (group_public_key, envelope) = open_push_data(
            &push_data.to_bytes().unwrap(),
            &server_secret.public_key(),
            &device_secret,
        )
        .unwrap();

        assert_eq!(group_public_key, group.public_key);
        assert_eq!(&envelope.group_public_key, group.public_key.as_bytes());
        assert_eq!(envelope.nonce.len(), 24);
    }

    #[test]
    fn invalid_payload() {
        let rng = Rng::from_seed([2; 32]);
        let server_secret = SecretKey::from_bytes(rng.random_array().unwrap());
        let device_secret = SecretKey::from_bytes(rng.random_array().unwrap());

        assert_matches!(
            open_push_data(&[1, 2, 3], &server_secret.public_key(), &device_secret),
            Err(PushError::InvalidPayload(_))
        );

        let short_nonce = PushExposedData {
            nonce: vec![0; 12],
            sealed: vec![0; 64],
        };
        assert_matches!(
            open_push_data(
                &short_nonce.to_bytes().unwrap(),
                &server_secret.public_key(),
                &device_secret
            ),
            Err(PushError::InvalidPayload(_))
        );
    }

    #[test]
    fn wrong_device() {
        let rng = Rng::from_seed([3; 32]);
        let server_secret = SecretKey::from_bytes(rng.random_array().unwrap());
        let device_secret = SecretKey::from_bytes(rng.random_array().unwrap());
        let other_secret = SecretKey::from_bytes(rng.random_array().unwrap());
        let group = TestGroup::new(&rng);

        let push_data = seal_push_data(
            &rng,
            &server_secret,
            &device_secret.public_key(),
            &group,
            &OutOfStoreMessage::default(),
        );

        assert_matches!(
            open_push_data(
                &push_data.to_bytes().unwrap(),
                &server_secret.public_key(),
                &other_secret
            ),
            Err(PushError::UnableToDecrypt(None))
        );
    }

    #[test]
    fn malformed_group_envelope() {
        let rng = Rng::from_seed([4; 32]);
        let server_secret = SecretKey::from_bytes(rng.random_array().unwrap());
        let device_secret = SecretKey::from_bytes(rng.random_array().unwrap());

        let seal = |plaintext: &[u8]| {
            let nonce = rng.random_array().unwrap();
            let sealed = box_seal(plaintext, nonce, &device_secret.public_key(), &server_secret)
                .unwrap();
            PushExposedData {
                nonce: nonce.to_vec(),
                sealed,
            }
            .to_bytes()
            .unwrap()
        };

        // Plaintext is not a group envelope.
        let payload = seal(&encode_cbor(&"hello").unwrap());
        assert_matches!(
            open_push_data(&payload, &server_secret.public_key(), &device_secret),
            Err(PushError::Deserialization(_))
        );

        // Group public key has the wrong size.
        let envelope = OutOfStoreMessageEnvelope {
            group_public_key: vec![1; 12],
            nonce: vec![0; 24],
            sealed: vec![],
        };
        let payload = seal(&envelope.to_bytes().unwrap());
        assert_matches!(
            open_push_data(&payload, &server_secret.public_key(), &device_secret),
            Err(PushError::Deserialization(_))
        );
    }
}
