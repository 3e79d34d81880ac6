// SPDX-License-Identifier: MIT OR Apache-2.0

use std::fmt;

use subtle::ConstantTimeEq;
use zeroize::ZeroizeOnDrop;

/// Fixed-size key material which must not outlive its use.
///
/// Wraps the push secret key of the device, the shared secrets of groups and the X25519 shared
/// secret of a box. Bytes are wiped when the value is dropped, so every short-lived copy made
/// while opening a payload is gone once the payload is handled.
///
/// Comparisons run in constant time. `Debug` never prints the bytes, not even in tests, so keys
/// can't leak through logs or assertion messages.
#[derive(Clone, Eq, ZeroizeOnDrop)]
pub struct Secret<const N: usize>([u8; N]);

impl<const N: usize> Secret<N> {
    pub(crate) fn from_bytes(bytes: [u8; N]) -> Self {
        Self(bytes)
    }

    pub(crate) fn as_bytes(&self) -> &[u8; N] {
        &self.0
    }
}

impl<const N: usize> PartialEq for Secret<N> {
    fn eq(&self, other: &Self) -> bool {
        self.0.ct_eq(&other.0).into()
    }
}

impl<const N: usize> fmt::Debug for Secret<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Secret<{N}>(***)")
    }
}
