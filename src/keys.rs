//! Key management for 3DS title keys.
//!
//! Titles distributed as CIA carry their content key (the *title key*)
//! inside the ticket, encrypted with one of six *common keys*. A common key
//! is either supplied directly as a normal key or derived by the hardware
//! key scrambler from the shared `slot0x3DKeyX` and a per-index
//! `slot0x3DKeyY{n}`.
//!
//! This module is a plain data container plus the unwrap step; the AES
//! primitives live in [`crate::crypto::cia`].
//!
//! ## Key file format
//! Simple `name = hex_value` text, one entry per line. Lines starting with
//! `#` or `;` are comments. Recognized names:
//!
//! | Name | Meaning |
//! |------|---------|
//! | `slot0x3DKeyX` | common KeyX |
//! | `slot0x3DKeyY0` .. `slot0x3DKeyY5` | common KeyY for each common key index |
//! | `common0` .. `common5` | already-scrambled common normal keys (take precedence) |

use std::io::{BufRead, BufReader, Read};

use log::debug;

use crate::crypto::cia::{decrypt_block_cbc, scramble};
use crate::formats::ticket::Ticket;
use crate::{Error, Result};

/// Number of common key indices a ticket may select.
pub const COMMON_KEY_COUNT: usize = 6;

/// All key material needed to unwrap title keys.
#[derive(Debug, Default, Clone)]
pub struct KeySet {
    /// Common KeyX (keyslot 0x3D).
    pub common_key_x: Option<[u8; 16]>,
    /// Common KeyY per common key index.
    pub common_key_y: [Option<[u8; 16]>; COMMON_KEY_COUNT],
    /// Pre-scrambled common normal keys per index.
    pub common_normal: [Option<[u8; 16]>; COMMON_KEY_COUNT],
}

impl KeySet {
    /// Create an empty key set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load keys from a key-file reader.
    ///
    /// Unknown names and malformed values are skipped so that one key file
    /// can be shared with other tools.
    pub fn load_key_file<R: Read>(&mut self, reader: R) -> Result<()> {
        for line in BufReader::new(reader).lines() {
            let line = line.map_err(Error::Io)?;
            let line = line.trim();
            if line.is_empty() || line.starts_with(';') || line.starts_with('#') {
                continue;
            }
            let Some((name, value)) = line.split_once('=') else {
                continue;
            };
            let (name, value) = (name.trim(), value.trim());
            let Some(key) = decode_key(value) else {
                debug!("skipping key {name}: not 16 hex bytes");
                continue;
            };

            if name.eq_ignore_ascii_case("slot0x3DKeyX") {
                self.common_key_x = Some(key);
            } else if let Some(idx) = indexed(name, "slot0x3DKeyY") {
                self.common_key_y[idx] = Some(key);
            } else if let Some(idx) = indexed(name, "common") {
                self.common_normal[idx] = Some(key);
            }
        }
        Ok(())
    }

    /// Return the common normal key for `index`.
    pub fn common_key(&self, index: u8) -> Result<[u8; 16]> {
        let idx = usize::from(index);
        if idx >= COMMON_KEY_COUNT {
            return Err(Error::MalformedContainer("common key index out of range"));
        }
        if let Some(key) = self.common_normal[idx] {
            return Ok(key);
        }
        let x = self
            .common_key_x
            .as_ref()
            .ok_or(Error::MissingKey("slot0x3DKeyX"))?;
        let y = self.common_key_y[idx]
            .as_ref()
            .ok_or(Error::MissingKey("slot0x3DKeyY"))?;
        Ok(scramble(x, y))
    }

    /// Unwrap the title key stored in `ticket`.
    pub fn title_key(&self, ticket: &Ticket) -> Result<[u8; 16]> {
        let common = self.common_key(ticket.common_key_index)?;
        let mut iv = [0u8; 16];
        iv[..8].copy_from_slice(&ticket.title_id.to_be_bytes());
        Ok(decrypt_block_cbc(&ticket.title_key, &common, &iv))
    }
}

fn indexed(name: &str, prefix: &str) -> Option<usize> {
    let head = name.get(..prefix.len())?;
    if !head.eq_ignore_ascii_case(prefix) {
        return None;
    }
    let idx: usize = name[prefix.len()..].parse().ok()?;
    (idx < COMMON_KEY_COUNT).then_some(idx)
}

fn decode_key(s: &str) -> Option<[u8; 16]> {
    let mut out = [0u8; 16];
    hex::decode_to_slice(s, &mut out).ok()?;
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY_FILE: &str = "\
; shared key file
# another comment
slot0x3DKeyX = 000102030405060708090A0B0C0D0E0F
slot0x3DKeyY1 = 101112131415161718191A1B1C1D1E1F
common2 = 202122232425262728292A2B2C2D2E2F
slot0x3DKeyY9 = 303132333435363738393A3B3C3D3E3F
slot0x2CKeyX = 404142434445464748494A4B4C4D4E4F
broken = 1234
";

    fn loaded() -> KeySet {
        let mut keys = KeySet::new();
        keys.load_key_file(KEY_FILE.as_bytes()).unwrap();
        keys
    }

    #[test]
    fn parses_known_names_and_skips_the_rest() {
        let keys = loaded();
        assert_eq!(keys.common_key_x.unwrap()[15], 0x0F);
        assert_eq!(keys.common_key_y[1].unwrap()[0], 0x10);
        assert_eq!(keys.common_normal[2].unwrap()[0], 0x20);
        assert!(keys.common_key_y.iter().enumerate().all(|(i, k)| k.is_some() == (i == 1)));
    }

    #[test]
    fn common_key_prefers_normal_then_scrambles() {
        let keys = loaded();
        assert_eq!(keys.common_key(2).unwrap(), keys.common_normal[2].unwrap());
        assert_eq!(
            keys.common_key(1).unwrap(),
            scramble(&keys.common_key_x.unwrap(), &keys.common_key_y[1].unwrap())
        );
        assert!(matches!(keys.common_key(0), Err(Error::MissingKey(_))));
        assert!(matches!(
            keys.common_key(6),
            Err(Error::MalformedContainer(_))
        ));
    }
}
