// SPDX-License-Identifier: MIT OR Apache-2.0

//! Cryptographic algorithms required to open push payloads.
pub mod push_box;
mod rng;
mod secret;
pub mod x25519;

pub use rng::{Rng, RngError};
pub use secret::Secret;
