// SPDX-License-Identifier: MIT OR Apache-2.0

//! Push keypair of this device.
//!
//! Push servers seal payloads towards the public part of this keypair. The secret never leaves
//! the keypair manager except as a short-lived copy used to open a single payload.
use std::sync::{PoisonError, RwLock};

use crate::crypto::Rng;
use crate::crypto::x25519::{PublicKey, SecretKey};
use crate::error::PushError;

#[derive(Clone, Debug)]
struct KeyPairState {
    secret_key: SecretKey,
    public_key: PublicKey,
}

impl KeyPairState {
    fn from_secret(secret_key: SecretKey) -> Self {
        let public_key = PushKeyPair::derive_public_key(&secret_key);
        Self {
            secret_key,
            public_key,
        }
    }
}

/// Holds the push secret key of this device and the public key derived from it.
///
/// Secret and public key are always replaced together, concurrent readers never observe a
/// public key which does not belong to the current secret.
#[derive(Debug, Default)]
pub struct PushKeyPair {
    state: RwLock<Option<KeyPairState>>,
}

impl PushKeyPair {
    pub fn new(secret_key: SecretKey) -> Self {
        Self {
            state: RwLock::new(Some(KeyPairState::from_secret(secret_key))),
        }
    }

    /// Keypair without any key material, every key lookup returns `None` until a secret key was
    /// set.
    pub fn unset() -> Self {
        Self::default()
    }

    pub fn derive_public_key(secret_key: &SecretKey) -> PublicKey {
        secret_key.public_key()
    }

    /// Replaces the secret key and with it the public key.
    pub fn set_secret_key(&self, secret_key: SecretKey) {
        let next = KeyPairState::from_secret(secret_key);
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        *state = Some(next);
    }

    /// Replaces the secret key with a freshly generated one and returns the new public key.
    pub fn rotate(&self, rng: &Rng) -> Result<PublicKey, PushError> {
        let secret_key = SecretKey::from_bytes(rng.random_array()?);
        let public_key = Self::derive_public_key(&secret_key);
        self.set_secret_key(secret_key);
        Ok(public_key)
    }

    pub fn public_key(&self) -> Option<PublicKey> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        state.as_ref().map(|state| state.public_key)
    }

    pub(crate) fn secret_key(&self) -> Option<SecretKey> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        state.as_ref().map(|state| state.secret_key.clone())
    }

    #[cfg(test)]
    fn snapshot(&self) -> Option<(SecretKey, PublicKey)> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        state
            .as_ref()
            .map(|state| (state.secret_key.clone(), state.public_key))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use crate::crypto::Rng;
    use crate::crypto::x25519::SecretKey;

    use super::PushKeyPair;

    #[test]
    fn unset_keypair() {
        let keypair = PushKeyPair::unset();
        assert!(keypair.public_key().is_none());
        assert!(keypair.secret_key().is_none());
    }

    #[test]
    fn public_key_follows_secret() {
        let rng = Rng::from_seed([1; 32]);

        let secret_1 = SecretKey::from_bytes(rng.random_array().unwrap());
        let secret_2 = SecretKey::from_bytes(rng.random_array().unwrap());

        let keypair = PushKeyPair::new(secret_1.clone());
        assert_eq!(
            keypair.public_key(),
            Some(PushKeyPair::derive_public_key(&secret_1))
        );

        keypair.set_secret_key(secret_2.clone());
        assert_eq!(
            keypair.public_key(),
            Some(PushKeyPair::derive_public_key(&secret_2))
        );
        assert_eq!(keypair.secret_key(), Some(secret_2));
    }

    #[test]
    fn rotate() {
        let rng = Rng::from_seed([2; 32]);
        let keypair = PushKeyPair::new(SecretKey::from_bytes(rng.random_array().unwrap()));
        let before = keypair.public_key().unwrap();

        let after = keypair.rotate(&rng).unwrap();
        assert_ne!(before, after);
        assert_eq!(keypair.public_key(), Some(after));
    }

    #[test]
    fn concurrent_readers_see_matching_pairs() {
        let rng = Rng::from_seed([3; 32]);
        let secrets: Vec<SecretKey> = (0..16)
            .map(|_| SecretKey::from_bytes(rng.random_array().unwrap()))
            .collect();

        let keypair = Arc::new(PushKeyPair::new(secrets[0].clone()));

        thread::scope(|scope| {
            for _ in 0..4 {
                let keypair = keypair.clone();
                scope.spawn(move || {
                    for _ in 0..200 {
                        let (secret, public) = keypair.snapshot().unwrap();
                        assert_eq!(PushKeyPair::derive_public_key(&secret), public);
                    }
                });
            }

            let writer = keypair.clone();
            let secrets = &secrets;
            scope.spawn(move || {
                for secret in secrets {
                    writer.set_secret_key(secret.clone());
                }
            });
        });

        assert_eq!(
            keypair.public_key(),
            Some(PushKeyPair::derive_public_key(&secrets[15]))
        );
    }
}
