//! Cryptographic helpers for CIA containers.
//!
//! ## Key scrambler
//!
//! The 3DS AES engine never exposes normal keys directly for the common key
//! slot (0x3D). Software supplies a KeyX/KeyY pair and the hardware derives
//! the normal key as `ROL128((ROL128(KeyX, 2) ^ KeyY) + C, 87)` with the
//! constant [`SCRAMBLER_C`]. All values are big-endian 128-bit integers.
//!
//! ## AES-128-CBC - title key unwrapping
//!
//! The ticket stores the title key encrypted with the common key selected by
//! its `common_key_index`. The IV is the big-endian title ID followed by
//! eight zero bytes. The key is a single block, so CBC reduces to one ECB
//! decryption XORed with the IV.
//!
//! ## AES-128-CTR - content keystream
//!
//! Content data is addressed at arbitrary byte offsets, so the keystream is
//! generated starting at the block that contains the requested offset: the
//! initial counter is advanced by `offset / 16` as a big-endian 128-bit
//! integer and the first `offset % 16` keystream bytes are discarded.

use aes::Aes128;
use aes::cipher::generic_array::GenericArray;
use aes::cipher::{BlockDecrypt, BlockEncrypt, KeyInit};

/// Keyslot used for title keys by the 3DS AES engine.
pub const KEYSLOT_TITLEKEY: u8 = 0x11;

/// Constant added by the hardware key scrambler.
pub const SCRAMBLER_C: u128 = 0x1FF9_E9AA_C5FE_0408_0245_91DC_5D52_768A;

const BLOCK: usize = 16;

/// Derive a normal key from a KeyX/KeyY pair.
pub fn scramble(key_x: &[u8; 16], key_y: &[u8; 16]) -> [u8; 16] {
    let x = u128::from_be_bytes(*key_x);
    let y = u128::from_be_bytes(*key_y);
    (x.rotate_left(2) ^ y)
        .wrapping_add(SCRAMBLER_C)
        .rotate_left(87)
        .to_be_bytes()
}

/// Decrypt a single-block AES-128-CBC message (the encrypted title key).
pub fn decrypt_block_cbc(block: &[u8; 16], key: &[u8; 16], iv: &[u8; 16]) -> [u8; 16] {
    let cipher = Aes128::new(GenericArray::from_slice(key));
    let mut b = GenericArray::clone_from_slice(block);
    cipher.decrypt_block(&mut b);
    let mut out = [0u8; 16];
    for (o, (p, v)) in out.iter_mut().zip(b.iter().zip(iv)) {
        *o = p ^ v;
    }
    out
}

/// Build the initial counter for a content chunk.
///
/// The content index is stored little-endian in the first two bytes; the
/// remaining bytes are zero.
pub fn content_ctr(index: u16) -> [u8; 16] {
    let mut ctr = [0u8; 16];
    ctr[..2].copy_from_slice(&index.to_le_bytes());
    ctr
}

/// XOR `data` in place with the AES-128-CTR keystream starting at byte
/// `offset` of the stream defined by `key` and the initial `ctr`.
///
/// Encryption and decryption are the same operation.
pub fn ctr_xor_at(data: &mut [u8], key: &[u8; 16], ctr: &[u8; 16], offset: u64) {
    let cipher = Aes128::new(GenericArray::from_slice(key));
    let mut counter = u128::from_be_bytes(*ctr).wrapping_add(u128::from(offset / BLOCK as u64));
    let mut ks_pos = (offset % BLOCK as u64) as usize;
    let mut keystream = GenericArray::from([0u8; BLOCK]);
    let mut fresh = false;

    for byte in data.iter_mut() {
        if !fresh || ks_pos == BLOCK {
            if fresh {
                counter = counter.wrapping_add(1);
                ks_pos = 0;
            }
            keystream = GenericArray::from(counter.to_be_bytes());
            cipher.encrypt_block(&mut keystream);
            fresh = true;
        }
        *byte ^= keystream[ks_pos];
        ks_pos += 1;
    }
}
