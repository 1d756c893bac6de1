//! TMD (Title MetaData) - signed title description and content list.
//!
//! ## Body layout (after the signature prefix, see [`super::sig`])
//! ```text
//! [0x000] Issuer                    (0x40 bytes, NUL padded)
//! [0x040] Version / CaCrl / SignerCrl / Reserved (4 × u8)
//! [0x044] SystemVersion             (u64 BE)
//! [0x04C] TitleId                   (u64 BE)
//! [0x054] TitleType                 (u32 BE)
//! [0x058] GroupId                   (u16 BE)
//! [0x05A] SaveDataSize              (u32 LE)
//! [0x05E] SrlPrivateSaveDataSize    (u32 LE)
//! [0x062] Reserved                  (4 bytes)
//! [0x066] SrlFlag                   (u8)
//! [0x067] Reserved                  (0x31 bytes)
//! [0x098] AccessRights              (u32 BE)
//! [0x09C] TitleVersion              (u16 BE)
//! [0x09E] ContentCount              (u16 BE)
//! [0x0A0] BootContent               (u16 BE)
//! [0x0A2] Padding                   (2 bytes)
//! [0x0A4] SHA-256 of ContentInfoRecords (0x20 bytes)
//! [0x0C4] ContentInfoRecords        (64 × 0x24 bytes)
//! [0x9C4] ContentChunkRecords       (ContentCount × 0x30 bytes)
//! ```
//!
//! ## Content chunk record (0x30 bytes)
//! ```text
//! [0x00] ContentId     (u32 BE)
//! [0x04] ContentIndex  (u16 BE)
//! [0x06] ContentType   (u16 BE; bit 0 = encrypted)
//! [0x08] ContentSize   (u64 BE)
//! [0x10] SHA-256 hash  (0x20 bytes)
//! ```

use std::io::{Read, Seek};

use log::warn;

use super::sig::{SignatureType, skip_signature};
use super::ticket::issuer_string;
use crate::Result;
use crate::utils::{be_u16, be_u32, be_u64, bytesa, le_u32, skip, u8};

/// Size of the fixed TMD part (RSA-2048 signature prefix, header and
/// content info records) that precedes the content chunk records.
pub const TMD_BODY_SIZE: u64 = 0xB04;

/// Size of one content chunk record.
pub const CHUNK_RECORD_SIZE: u64 = 0x30;

/// Content chunk records handled per title; further records are ignored.
pub const CIA_MAX_CONTENTS: usize = 100 + 1;

const CONTENT_INFO_RECORDS_SIZE: u64 = 64 * 0x24;

/// One content chunk record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContentChunk {
    pub id: u32,
    pub index: u16,
    /// Raw content type flags.
    pub kind: u16,
    pub size: u64,
    pub hash: [u8; 32],
}

impl ContentChunk {
    /// Content type bit 0: the content is encrypted with the title key.
    pub const FLAG_ENCRYPTED: u16 = 0x0001;

    pub fn parse<R: Read>(r: &mut R) -> Result<Self> {
        Ok(Self {
            id: be_u32(r)?,
            index: be_u16(r)?,
            kind: be_u16(r)?,
            size: be_u64(r)?,
            hash: bytesa::<32>(r)?,
        })
    }

    pub fn is_encrypted(&self) -> bool {
        self.kind & Self::FLAG_ENCRYPTED != 0
    }
}

/// Parsed TMD with its content chunk records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tmd {
    pub signature: SignatureType,
    pub issuer: String,
    pub system_version: u64,
    pub title_id: u64,
    pub title_type: u32,
    pub save_size: u32,
    pub title_version: u16,
    /// Number of content records the TMD declares.
    pub content_count: u16,
    pub boot_content: u16,
    /// Parsed records, at most [`CIA_MAX_CONTENTS`].
    pub chunks: Vec<ContentChunk>,
}

impl Tmd {
    /// Parse a TMD starting at its signature type field.
    pub fn parse<R: Read + Seek>(r: &mut R) -> Result<Self> {
        let signature = skip_signature(r)?;

        let issuer = issuer_string(&bytesa::<0x40>(r)?);
        let _version = u8(r)?;
        skip(r, 3)?;
        let system_version = be_u64(r)?;
        let title_id = be_u64(r)?;
        let title_type = be_u32(r)?;
        let _group_id = be_u16(r)?;
        let save_size = le_u32(r)?;
        skip(r, 0x98 - 0x5E)?;
        let _access_rights = be_u32(r)?;
        let title_version = be_u16(r)?;
        let content_count = be_u16(r)?;
        let boot_content = be_u16(r)?;
        skip(r, 2 + 0x20 + CONTENT_INFO_RECORDS_SIZE)?;

        let count = usize::from(content_count);
        if count > CIA_MAX_CONTENTS {
            warn!(
                "title {title_id:016X} declares {count} contents, \
                 only the first {CIA_MAX_CONTENTS} are used"
            );
        }
        let count = count.min(CIA_MAX_CONTENTS);
        let mut chunks = Vec::with_capacity(count);
        for _ in 0..count {
            chunks.push(ContentChunk::parse(r)?);
        }

        Ok(Self {
            signature,
            issuer,
            system_version,
            title_id,
            title_type,
            save_size,
            title_version,
            content_count,
            boot_content,
            chunks,
        })
    }
}
