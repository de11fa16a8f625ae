//! Repeating-key XOR stream cipher.

use crate::key::Keystream;

/// XORs `data` with the keystream, cycling it as needed.
///
/// The transform is its own inverse.
#[must_use]
pub fn xor_with_keystream(keystream: &Keystream, data: &[u8]) -> Vec<u8> {
    let mut out = data.to_vec();
    xor_in_place(keystream, &mut out);
    out
}

/// In-place variant of [`xor_with_keystream`].
pub fn xor_in_place(keystream: &Keystream, data: &mut [u8]) {
    for (byte, k) in data.iter_mut().zip(keystream.as_bytes().iter().cycle()) {
        *byte ^= k;
    }
}
