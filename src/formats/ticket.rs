//! Ticket - signed license blob carrying the encrypted title key.
//!
//! ## Body layout (after the signature prefix, see [`super::sig`])
//! ```text
//! [0x000] Issuer                    (0x40 bytes, NUL padded)
//! [0x040] ECC public key            (0x3C bytes)
//! [0x07C] Version                   (u8)
//! [0x07D] CaCrlVersion              (u8)
//! [0x07E] SignerCrlVersion          (u8)
//! [0x07F] TitleKey (encrypted)      (0x10 bytes)
//! [0x08F] Reserved                  (1 byte)
//! [0x090] TicketId                  (u64 BE)
//! [0x098] ConsoleId                 (u32 BE)
//! [0x09C] TitleId                   (u64 BE)
//! [0x0A4] Reserved                  (2 bytes)
//! [0x0A6] TicketTitleVersion        (u16 BE)
//! [0x0A8] Reserved                  (8 bytes)
//! [0x0B0] LicenseType               (u8)
//! [0x0B1] CommonKeyIndex            (u8)
//! [0x0B2] ...                       (limits, content index; not parsed)
//! ```

use std::io::{Read, Seek};

use super::sig::{SignatureType, skip_signature};
use crate::Result;
use crate::utils::{be_u16, be_u32, be_u64, bytesa, skip, u8};

/// Parsed ticket (fixed fields only).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticket {
    pub signature: SignatureType,
    /// Issuer string, e.g. `Root-CA00000003-XS0000000c`.
    pub issuer: String,
    pub version: u8,
    /// Title key encrypted with the common key at [`Self::common_key_index`].
    pub title_key: [u8; 16],
    pub ticket_id: u64,
    pub console_id: u32,
    pub title_id: u64,
    pub title_version: u16,
    pub license_type: u8,
    pub common_key_index: u8,
}

impl Ticket {
    /// Parse a ticket starting at its signature type field.
    pub fn parse<R: Read + Seek>(r: &mut R) -> Result<Self> {
        let signature = skip_signature(r)?;

        let issuer_raw = bytesa::<0x40>(r)?;
        let issuer = issuer_string(&issuer_raw);
        let _ecc_public_key = bytesa::<0x3C>(r)?;
        let version = u8(r)?;
        let _ca_crl_version = u8(r)?;
        let _signer_crl_version = u8(r)?;
        let title_key = bytesa::<16>(r)?;
        skip(r, 1)?;
        let ticket_id = be_u64(r)?;
        let console_id = be_u32(r)?;
        let title_id = be_u64(r)?;
        skip(r, 2)?;
        let title_version = be_u16(r)?;
        skip(r, 8)?;
        let license_type = u8(r)?;
        let common_key_index = u8(r)?;

        Ok(Self {
            signature,
            issuer,
            version,
            title_key,
            ticket_id,
            console_id,
            title_id,
            title_version,
            license_type,
            common_key_index,
        })
    }
}

pub(crate) fn issuer_string(raw: &[u8]) -> String {
    let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
    String::from_utf8_lossy(&raw[..end]).into_owned()
}
