// SPDX-License-Identifier: MIT OR Apache-2.0

use std::sync::{Mutex, PoisonError};

use rand_chacha::rand_core::{SeedableRng, TryRngCore};
use thiserror::Error;

/// ChaCha20 CSPRNG seeded from the operating system.
///
/// Draws fresh push secret keys during key rotation. Can be shared between threads, draws are
/// serialized.
#[derive(Debug)]
pub struct Rng {
    rng: Mutex<rand_chacha::ChaCha20Rng>,
}

impl Default for Rng {
    fn default() -> Self {
        Self {
            rng: Mutex::new(rand_chacha::ChaCha20Rng::from_os_rng()),
        }
    }
}

#[cfg(any(test, feature = "test_utils"))]
impl Rng {
    pub fn from_seed(seed: [u8; 32]) -> Self {
        Self {
            rng: Mutex::new(rand_chacha::ChaCha20Rng::from_seed(seed)),
        }
    }
}

impl Rng {
    pub fn random_array<const N: usize>(&self) -> Result<[u8; N], RngError> {
        let mut out = [0u8; N];
        self.rng
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .try_fill_bytes(&mut out)
            .map_err(|_| RngError::NotEnoughRandomness)?;
        Ok(out)
    }
}

#[derive(Debug, Error)]
pub enum RngError {
    #[error("unable to collect enough randomness")]
    NotEnoughRandomness,
}

#[cfg(test)]
mod tests {
    use super::Rng;

    #[test]
    fn seeded_rng_is_deterministic() {
        let sample_1: [u8; 64] = Rng::from_seed([7; 32]).random_array().unwrap();
        let sample_2: [u8; 64] = Rng::from_seed([7; 32]).random_array().unwrap();
        assert_eq!(sample_1, sample_2);

        let sample_3: [u8; 64] = Rng::from_seed([8; 32]).random_array().unwrap();
        assert_ne!(sample_1, sample_3);
    }
}
