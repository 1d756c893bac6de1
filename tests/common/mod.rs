//! Synthetic CIA images for end-to-end tests.

#![allow(dead_code)]

use aes::Aes128;
use aes::cipher::generic_array::GenericArray;
use aes::cipher::{BlockEncrypt, KeyInit};

use vdrive::crypto::cia::{content_ctr, ctr_xor_at};
use vdrive::keys::KeySet;

pub const TITLE_ID: u64 = 0x0004_0000_0012_3400;
pub const COMMON_KEY: [u8; 16] = [0xC0; 16];
pub const TITLE_KEY: [u8; 16] = *b"plain title key!";
pub const CERT_SIZE: usize = 0xA00;
pub const TICKET_SIZE: usize = 0x350;
pub const META_SIZE: usize = 0x3AC0;

pub struct Content {
    pub index: u16,
    pub id: u32,
    pub data: Vec<u8>,
    pub encrypted: bool,
}

impl Content {
    pub fn plain(index: u16, id: u32, len: usize) -> Self {
        Self {
            index,
            id,
            data: pattern(index, len),
            encrypted: false,
        }
    }

    pub fn encrypted(index: u16, id: u32, len: usize) -> Self {
        Self {
            encrypted: true,
            ..Self::plain(index, id, len)
        }
    }
}

/// Recognizable bytes for content `index`.
pub fn pattern(index: u16, len: usize) -> Vec<u8> {
    (0..len)
        .map(|i| (i as u8).wrapping_mul(31).wrapping_add(index as u8))
        .collect()
}

pub struct Options {
    pub meta: bool,
    /// Override the TMD size written to the header.
    pub declared_tmd_size: Option<u32>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            meta: true,
            declared_tmd_size: None,
        }
    }
}

fn pad(buf: &mut Vec<u8>) {
    buf.resize(buf.len().next_multiple_of(0x40), 0);
}

fn encrypted_title_key() -> [u8; 16] {
    let mut iv = [0u8; 16];
    iv[..8].copy_from_slice(&TITLE_ID.to_be_bytes());
    let mut block = TITLE_KEY;
    for (b, v) in block.iter_mut().zip(iv) {
        *b ^= v;
    }
    let mut block = GenericArray::from(block);
    Aes128::new(GenericArray::from_slice(&COMMON_KEY)).encrypt_block(&mut block);
    block.as_slice().try_into().unwrap()
}

fn ticket() -> Vec<u8> {
    let mut t = vec![0u8; TICKET_SIZE];
    t[..4].copy_from_slice(&0x010004u32.to_be_bytes());
    let body = &mut t[0x140..];
    body[..26].copy_from_slice(b"Root-CA00000003-XS0000000c");
    body[0x7C] = 1;
    body[0x7F..0x8F].copy_from_slice(&encrypted_title_key());
    body[0x9C..0xA4].copy_from_slice(&TITLE_ID.to_be_bytes());
    body[0xB1] = 0;
    t
}

fn tmd(contents: &[Content]) -> Vec<u8> {
    let mut t = vec![0u8; 0xB04];
    t[..4].copy_from_slice(&0x010004u32.to_be_bytes());
    let body = &mut t[0x140..];
    body[..26].copy_from_slice(b"Root-CA00000003-CP0000000b");
    body[0x4C..0x54].copy_from_slice(&TITLE_ID.to_be_bytes());
    body[0x9E..0xA0].copy_from_slice(&(contents.len() as u16).to_be_bytes());
    for c in contents {
        t.extend_from_slice(&c.id.to_be_bytes());
        t.extend_from_slice(&c.index.to_be_bytes());
        t.extend_from_slice(&u16::from(c.encrypted).to_be_bytes());
        t.extend_from_slice(&(c.data.len() as u64).to_be_bytes());
        t.extend_from_slice(&[0u8; 32]);
    }
    t
}

/// Assemble a CIA image. Encrypted contents are stored CTR-encrypted with
/// [`TITLE_KEY`]; the `Content` values keep the plaintext.
pub fn build_cia(contents: &[Content], opts: &Options) -> Vec<u8> {
    let tmd = tmd(contents);
    let content_size: u64 = contents.iter().map(|c| c.data.len() as u64).sum();

    let mut out = Vec::new();
    out.extend_from_slice(&0x2020u32.to_le_bytes());
    out.extend_from_slice(&0u16.to_le_bytes());
    out.extend_from_slice(&0u16.to_le_bytes());
    out.extend_from_slice(&(CERT_SIZE as u32).to_le_bytes());
    out.extend_from_slice(&(TICKET_SIZE as u32).to_le_bytes());
    let tmd_size = opts.declared_tmd_size.unwrap_or(tmd.len() as u32);
    out.extend_from_slice(&tmd_size.to_le_bytes());
    let meta_size = if opts.meta { META_SIZE as u32 } else { 0 };
    out.extend_from_slice(&meta_size.to_le_bytes());
    out.extend_from_slice(&content_size.to_le_bytes());
    let mut bitmap = [0u8; 0x2000];
    for c in contents {
        bitmap[usize::from(c.index / 8)] |= 0x80 >> (c.index % 8);
    }
    out.extend_from_slice(&bitmap);
    pad(&mut out);

    out.extend(std::iter::repeat_n(0xCE, CERT_SIZE));
    pad(&mut out);
    out.extend_from_slice(&ticket());
    pad(&mut out);
    out.extend_from_slice(&tmd);
    pad(&mut out);

    for c in contents {
        let mut data = c.data.clone();
        if c.encrypted {
            ctr_xor_at(&mut data, &TITLE_KEY, &content_ctr(c.index), 0);
        }
        out.extend_from_slice(&data);
    }
    if opts.meta {
        pad(&mut out);
        out.extend(std::iter::repeat_n(0x3E, META_SIZE));
    }
    out
}

/// Keys able to unwrap the ticket written by [`build_cia`].
pub fn keys() -> KeySet {
    let mut keys = KeySet::new();
    let file = format!("common0 = {}\n", hex::encode(COMMON_KEY));
    keys.load_key_file(file.as_bytes()).unwrap();
    keys
}

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}
