// SPDX-License-Identifier: MIT OR Apache-2.0

//! NaCl-compatible authenticated encryption for push payloads.
//!
//! The push envelope is a NaCl `box` (X25519, HSalsa20 and XSalsa20-Poly1305) addressed from the
//! push server's keypair to the device's keypair. As Diffie-Hellman is symmetric, the device opens
//! with `(server public key, device secret key)` what the server sealed with
//! `(device public key, server secret key)`.
//!
//! The group envelope is a NaCl `secretbox` (XSalsa20-Poly1305) keyed directly with the 256-bit
//! secret shared by all members of a group.
//!
//! Sealed boxes are the ciphertext prefixed with the 16-byte Poly1305 tag.
use crypto_box::SalsaBox;
use crypto_box::aead::Aead;
use crypto_box::aead::generic_array::GenericArray;
use crypto_secretbox::XSalsa20Poly1305;
use crypto_secretbox::aead::KeyInit;
use thiserror::Error;

use crate::crypto::x25519::{PublicKey, SecretKey, X25519Error};

/// 192-bit nonce size of `box` and `secretbox`.
pub const BOX_NONCE_SIZE: usize = 24;

/// 256-bit key size of `secretbox`.
pub const SECRET_BOX_KEY_SIZE: usize = 32;

/// Size of the authentication tag in every sealed box.
pub const BOX_TAG_SIZE: usize = 16;

pub type BoxNonce = [u8; BOX_NONCE_SIZE];

pub type SecretBoxKey = [u8; SECRET_BOX_KEY_SIZE];

fn salsa_box(their_public: &PublicKey, our_secret: &SecretKey) -> Result<SalsaBox, BoxError> {
    // Low-order public keys would produce a shared secret which does not depend on ours.
    our_secret.calculate_agreement(their_public)?;

    let their_public = crypto_box::PublicKey::from(their_public.to_bytes());
    let our_secret = crypto_box::SecretKey::from(*our_secret.as_bytes());
    Ok(SalsaBox::new(&their_public, &our_secret))
}

#[cfg(any(test, feature = "test_utils"))]
pub fn box_seal(
    plaintext: &[u8],
    nonce: BoxNonce,
    their_public: &PublicKey,
    our_secret: &SecretKey,
) -> Result<Vec<u8>, BoxError> {
    salsa_box(their_public, our_secret)?
        .encrypt(GenericArray::from_slice(&nonce), plaintext)
        .map_err(|_| BoxError::Seal)
}

/// Opens a box sealed by `their_public` towards our keypair.
///
/// A wrong key, a wrong nonce, a truncated box and any modified byte all fail the same way.
pub fn box_open(
    sealed: &[u8],
    nonce: BoxNonce,
    their_public: &PublicKey,
    our_secret: &SecretKey,
) -> Result<Vec<u8>, BoxError> {
    if sealed.len() < BOX_TAG_SIZE {
        return Err(BoxError::Open);
    }

    salsa_box(their_public, our_secret)?
        .decrypt(GenericArray::from_slice(&nonce), sealed)
        .map_err(|_| BoxError::Open)
}

#[cfg(any(test, feature = "test_utils"))]
pub fn secret_box_seal(
    plaintext: &[u8],
    nonce: BoxNonce,
    key: &SecretBoxKey,
) -> Result<Vec<u8>, BoxError> {
    XSalsa20Poly1305::new(GenericArray::from_slice(key))
        .encrypt(GenericArray::from_slice(&nonce), plaintext)
        .map_err(|_| BoxError::Seal)
}

pub fn secret_box_open(
    sealed: &[u8],
    nonce: BoxNonce,
    key: &SecretBoxKey,
) -> Result<Vec<u8>, BoxError> {
    if sealed.len() < BOX_TAG_SIZE {
        return Err(BoxError::Open);
    }

    XSalsa20Poly1305::new(GenericArray::from_slice(key))
        .decrypt(GenericArray::from_slice(&nonce), sealed)
        .map_err(|_| BoxError::Open)
}

#[derive(Debug, Error)]
pub enum BoxError {
    #[error(transparent)]
    X25519(#[from] X25519Error),

    #[error("could not seal box")]
    Seal,

    #[error("could not open box")]
    Open,
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use crate::crypto::Rng;
    use crate::crypto::x25519::{PublicKey, SecretKey};

    use super::{BOX_TAG_SIZE, BoxError, box_open, box_seal, secret_box_open, secret_box_seal};

    #[test]
    fn box_is_symmetric_between_keypairs() {
        let rng = Rng::from_seed([1; 32]);

        let server_secret = SecretKey::from_bytes(rng.random_array().unwrap());
        let device_secret = SecretKey::from_bytes(rng.random_array().unwrap());
        let nonce = rng.random_array().unwrap();

        let sealed = box_seal(
            b"out-of-store",
            nonce,
            &device_secret.public_key(),
            &server_secret,
        )
        .unwrap();
        assert_eq!(sealed.len(), b"out-of-store".len() + BOX_TAG_SIZE);

        let plaintext =
            box_open(&sealed, nonce, &server_secret.public_key(), &device_secret).unwrap();
        assert_eq!(plaintext, b"out-of-store");
    }

    #[test]
    fn box_rejects_foreign_device() {
        let rng = Rng::from_seed([2; 32]);

        let server_secret = SecretKey::from_bytes(rng.random_array().unwrap());
        let device_secret = SecretKey::from_bytes(rng.random_array().unwrap());
        let other_secret = SecretKey::from_bytes(rng.random_array().unwrap());
        let nonce = rng.random_array().unwrap();

        let sealed = box_seal(
            b"out-of-store",
            nonce,
            &device_secret.public_key(),
            &server_secret,
        )
        .unwrap();

        assert_matches!(
            box_open(&sealed, nonce, &server_secret.public_key(), &other_secret),
            Err(BoxError::Open)
        );
        assert_matches!(
            box_open(
                &sealed[..BOX_TAG_SIZE - 1],
                nonce,
                &server_secret.public_key(),
                &device_secret,
            ),
            Err(BoxError::Open)
        );
    }

    #[test]
    fn box_rejects_low_order_key() {
        let rng = Rng::from_seed([3; 32]);
        let device_secret = SecretKey::from_bytes(rng.random_array().unwrap());
        let nonce = rng.random_array().unwrap();

        assert_matches!(
            box_open(
                &[0; 32],
                nonce,
                &PublicKey::from_bytes([0; 32]),
                &device_secret,
            ),
            Err(BoxError::X25519(_))
        );
    }

    #[test]
    fn secret_box() {
        let rng = Rng::from_seed([4; 32]);

        let key = rng.random_array().unwrap();
        let nonce = rng.random_array().unwrap();

        let sealed = secret_box_seal(b"message", nonce, &key).unwrap();
        assert_eq!(secret_box_open(&sealed, nonce, &key).unwrap(), b"message");

        let wrong_nonce = rng.random_array().unwrap();
        assert_matches!(
            secret_box_open(&sealed, wrong_nonce, &key),
            Err(BoxError::Open)
        );
        assert_matches!(secret_box_open(&[], nonce, &key), Err(BoxError::Open));
    }
}
