//! Virtual directory construction.
//!
//! A mounted CIA is presented as a flat directory of virtual files, one per
//! present section followed by one per content chunk:
//!
//! | Name | Region |
//! |------|--------|
//! | `header.bin`    | CIA header |
//! | `cert.bin`      | certificate chain |
//! | `ticket.bin`    | ticket |
//! | `tmd.bin`       | whole TMD |
//! | `tmdchunks.bin` | content chunk records inside the TMD |
//! | `meta.bin`      | meta section |
//! | `IIII.CCCCCCCC.app` | content with index `IIII` and id `CCCCCCCC` (hex) |

use log::debug;

use crate::formats::cia::CiaInfo;
use crate::formats::tmd::{CIA_MAX_CONTENTS, ContentChunk};
use crate::{Error, Result};

/// Upper bound on entries in one virtual directory.
pub const MAX_VFILES: usize = 2048;

/// Maximum length of a virtual file name in bytes.
pub const MAX_NAME_LEN: usize = 32;

/// Keyslot value meaning "read as stored, no decryption".
pub const KEYSLOT_NONE: u8 = 0xFF;

pub const NAME_CIA_HEADER: &str = "header.bin";
pub const NAME_CIA_CERT: &str = "cert.bin";
pub const NAME_CIA_TICKET: &str = "ticket.bin";
pub const NAME_CIA_TMD: &str = "tmd.bin";
pub const NAME_CIA_TMDCHUNK: &str = "tmdchunks.bin";
pub const NAME_CIA_META: &str = "meta.bin";

/// A named byte range of the mounted physical file.
///
/// Descriptors are plain values; copies stay valid after the directory is
/// rebuilt. `offset + size` is checked against the physical file only when
/// the range is read.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VirtualFile {
    pub name: String,
    /// Absolute offset in the physical file.
    pub offset: u32,
    pub size: u32,
    /// Key selector; [`KEYSLOT_NONE`] for plain data.
    pub keyslot: u8,
    /// Reserved, always 0.
    pub flags: u8,
    /// Content index for content chunks, 0 for sections.
    pub index: u16,
}

impl VirtualFile {
    fn section(name: &str, offset: u64, size: u64) -> Result<Self> {
        Ok(Self {
            name: name.to_owned(),
            offset: narrow(offset)?,
            size: narrow(size)?,
            keyslot: KEYSLOT_NONE,
            flags: 0,
            index: 0,
        })
    }

    fn content(chunk: &ContentChunk, offset: u64) -> Result<Self> {
        let name = format!("{:04X}.{:08X}.app", chunk.index, chunk.id);
        debug_assert!(name.len() < MAX_NAME_LEN);
        Ok(Self {
            name,
            offset: narrow(offset)?,
            size: narrow(chunk.size)?,
            // encrypted or not, contents are exposed as stored
            keyslot: KEYSLOT_NONE,
            flags: 0,
            index: chunk.index,
        })
    }

    /// Copy of this descriptor tagged with another keyslot.
    pub fn with_keyslot(&self, keyslot: u8) -> Self {
        Self {
            keyslot,
            ..self.clone()
        }
    }

    /// End of the range in the physical file.
    pub fn end(&self) -> u64 {
        u64::from(self.offset) + u64::from(self.size)
    }
}

fn narrow(v: u64) -> Result<u32> {
    u32::try_from(v).map_err(|_| Error::OffsetOverflow)
}

fn push(table: &mut Vec<VirtualFile>, vfile: VirtualFile) -> Result<()> {
    if table.len() >= MAX_VFILES {
        return Err(Error::CapacityExceeded);
    }
    table.push(vfile);
    Ok(())
}

/// Build the virtual directory of a CIA from its layout and content chunk
/// records.
///
/// `chunks` are the TMD's records in index order; at most `content_count`
/// (and never more than [`CIA_MAX_CONTENTS`]) are used. Contents are laid
/// out back to back from `info.offset_content`.
pub fn build_cia_vdir(
    info: &CiaInfo,
    chunks: &[ContentChunk],
    content_count: u16,
) -> Result<Vec<VirtualFile>> {
    let mut table = Vec::new();

    let sections = [
        (NAME_CIA_HEADER, 0, info.size_header),
        (NAME_CIA_CERT, info.offset_cert, info.size_cert),
        (NAME_CIA_TICKET, info.offset_ticket, info.size_ticket),
        (NAME_CIA_TMD, info.offset_tmd, info.size_tmd),
        (NAME_CIA_TMDCHUNK, info.offset_content_list, info.size_content_list),
        (NAME_CIA_META, info.offset_meta, info.size_meta),
    ];
    for (name, offset, size) in sections {
        if size != 0 {
            push(&mut table, VirtualFile::section(name, offset, size)?)?;
        }
    }

    if info.size_content != 0 {
        let count = usize::from(content_count).min(CIA_MAX_CONTENTS);
        let mut next_offset = info.offset_content;
        for chunk in chunks.iter().take(count) {
            push(&mut table, VirtualFile::content(chunk, next_offset)?)?;
            next_offset = next_offset
                .checked_add(chunk.size)
                .ok_or(Error::OffsetOverflow)?;
        }
    }

    debug!("built virtual directory with {} entries", table.len());
    Ok(table)
}
