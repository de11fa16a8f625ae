//! Keystream derivation from the key material embedded in each archive.
//!
//! The 128-byte key material is read as one little-endian integer, i.e. an
//! array of little-endian 32-bit words with word 0 least significant. The
//! keystream is the low 128 bytes of `key^17 mod M`, encoded the same way.

use num_bigint::BigUint;

/// Offset of the key material in the archive.
pub const KEY_OFFSET: usize = 0x88;

/// Length of the key material and of the derived keystream.
pub const KEY_LEN: usize = 0x80;

/// Width of the buffer the derived value is encoded into before truncation.
const ENCODED_LEN: usize = 140;

/// Public exponent.
const EXPONENT: u32 = 17;

/// Modulus words, least significant first. The two top words are zero.
const MODULUS_WORDS: [u32; 34] = [
    0x2300_905D, 0x1B6C_06DF, 0xE4D0_D140, 0xED8B_47C4, 0x9397_0C42, 0x920C_45E6, 0x22C9_0AFB,
    0x37B6_7A10, 0x0F67_F0F6, 0x4237_AB4F, 0x9FA3_0B14, 0x916B_3CA6, 0xD48F_A715, 0x689F_CCA6,
    0xD3DB_E628, 0x5200_D9B3, 0x732F_7BBC, 0xDC59_2279, 0x3986_1B5F, 0x0A00_7CBA, 0xBF31_1219,
    0xD346_1CB2, 0x519A_4042, 0xDE59_FBB0, 0xDD66_62ED, 0xE9D7_BAFC, 0x878F_5459, 0x6329_4CBF,
    0x1032_06C9, 0xD2FA_9C90, 0x4983_2FEF, 0xADEA_AD39, 0x0000_0000, 0x0000_0000,
];

/// 128-byte keystream used to decrypt an archive body.
#[derive(Clone, PartialEq, Eq)]
pub struct Keystream([u8; KEY_LEN]);

impl Keystream {
    /// Returns the keystream bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }
}

impl std::fmt::Debug for Keystream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Keystream")
            .field(&hex::encode(&self.0[..8]))
            .finish_non_exhaustive()
    }
}

/// Returns the fixed modulus `M`.
fn modulus() -> BigUint {
    BigUint::from_slice(&MODULUS_WORDS)
}

/// Derives the keystream from 128 bytes of key material.
///
/// Deterministic and total: identical key material always yields the same
/// keystream.
#[must_use]
pub fn derive_keystream(key_material: &[u8; KEY_LEN]) -> Keystream {
    let key = BigUint::from_bytes_le(key_material);
    let derived = key.modpow(&BigUint::from(EXPONENT), &modulus());

    let mut encoded = [0u8; ENCODED_LEN];
    let le = derived.to_bytes_le();
    // derived < M < 2^1024, so it always fits
    let len = le.len().min(ENCODED_LEN);
    encoded[..len].copy_from_slice(&le[..len]);

    let mut stream = [0u8; KEY_LEN];
    stream.copy_from_slice(&encoded[..KEY_LEN]);
    Keystream(stream)
}
