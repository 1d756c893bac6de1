//! CIA (CTR Importable Archive) - title-install container.
//!
//! ## Layout
//! ```text
//! [0x0000] Header                  (HeaderSize bytes, 0x2020)
//! [align]  Certificate chain       (CertSize bytes)
//! [align]  Ticket                  (TicketSize bytes)
//! [align]  TMD                     (TmdSize bytes; content chunk records at +0xB04)
//! [align]  Contents                (ContentSize bytes, back to back in record order)
//! [align]  Meta                    (MetaSize bytes, optional)
//! ```
//! Every section starts on a 0x40-byte boundary.
//!
//! ## Header (0x2020 bytes, little-endian)
//! ```text
//! [0x00] HeaderSize                (u32)
//! [0x04] Type                      (u16, always 0)
//! [0x06] Version                   (u16, always 0)
//! [0x08] CertSize                  (u32)
//! [0x0C] TicketSize                (u32)
//! [0x10] TmdSize                   (u32)
//! [0x14] MetaSize                  (u32)
//! [0x18] ContentSize               (u64)
//! [0x20] ContentIndex              (0x2000 bytes; bit per present content, MSB first)
//! ```

use std::io::{Read, Seek, SeekFrom};

use super::ticket::Ticket;
use super::tmd::{CHUNK_RECORD_SIZE, TMD_BODY_SIZE, Tmd};
use crate::utils::{CIA_ALIGN, align_up, bytesa, le_u16, le_u32, le_u64};
use crate::{Error, Result};

/// Declared size of a CIA header.
pub const CIA_HEADER_SIZE: u32 = 0x2020;

/// Raw CIA header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CiaHeader {
    pub header_size: u32,
    pub kind: u16,
    pub version: u16,
    pub cert_size: u32,
    pub ticket_size: u32,
    pub tmd_size: u32,
    pub meta_size: u32,
    pub content_size: u64,
    /// Bitmap of contents present in this archive.
    pub content_index: Box<[u8; 0x2000]>,
}

impl CiaHeader {
    /// Parse a header. The reader must be positioned at the start of the CIA.
    pub fn parse<R: Read>(r: &mut R) -> Result<Self> {
        let header_size = le_u32(r)?;
        let kind = le_u16(r)?;
        let version = le_u16(r)?;
        let cert_size = le_u32(r)?;
        let ticket_size = le_u32(r)?;
        let tmd_size = le_u32(r)?;
        let meta_size = le_u32(r)?;
        let content_size = le_u64(r)?;
        let content_index = Box::new(bytesa::<0x2000>(r)?);
        Ok(Self {
            header_size,
            kind,
            version,
            cert_size,
            ticket_size,
            tmd_size,
            meta_size,
            content_size,
            content_index,
        })
    }

    /// Whether the content with TMD index `index` is present.
    pub fn has_content(&self, index: u16) -> bool {
        let byte = self.content_index[usize::from(index / 8)];
        byte & (0x80 >> (index % 8)) != 0
    }
}

/// Absolute offsets and sizes of every section of a CIA.
///
/// A size of zero means the section is absent; its offset is then
/// meaningless.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CiaInfo {
    pub size_header: u64,
    pub offset_cert: u64,
    pub size_cert: u64,
    pub offset_ticket: u64,
    pub size_ticket: u64,
    pub offset_tmd: u64,
    pub size_tmd: u64,
    /// Content chunk records inside the TMD.
    pub offset_content_list: u64,
    pub size_content_list: u64,
    pub offset_content: u64,
    pub size_content: u64,
    pub offset_meta: u64,
    pub size_meta: u64,
    /// End of the last section.
    pub size_cia: u64,
}

impl CiaInfo {
    /// Compute the section layout from a header.
    ///
    /// Returns [`Error::MalformedContainer`] when the declared sizes cannot
    /// describe a valid archive.
    pub fn from_header(header: &CiaHeader) -> Result<Self> {
        if header.header_size < CIA_HEADER_SIZE {
            return Err(Error::MalformedContainer("header too small"));
        }
        let size_tmd = u64::from(header.tmd_size);
        if size_tmd < TMD_BODY_SIZE {
            return Err(Error::MalformedContainer("TMD too small"));
        }
        let size_content_list = size_tmd - TMD_BODY_SIZE;
        if size_content_list % CHUNK_RECORD_SIZE != 0 {
            return Err(Error::MalformedContainer("TMD content list misaligned"));
        }

        let size_header = u64::from(header.header_size);
        let size_cert = u64::from(header.cert_size);
        let size_ticket = u64::from(header.ticket_size);
        let size_meta = u64::from(header.meta_size);
        let size_content = header.content_size;

        let offset_cert = align_up(size_header)?;
        let offset_ticket = add(offset_cert, align_up(size_cert)?)?;
        let offset_tmd = add(offset_ticket, align_up(size_ticket)?)?;
        let offset_content = add(offset_tmd, align_up(size_tmd)?)?;
        let offset_meta = if size_meta != 0 {
            add(offset_content, align_up(size_content)?)?
        } else {
            0
        };
        let size_cia = if size_meta != 0 {
            add(offset_meta, size_meta)?
        } else {
            add(offset_content, size_content)?
        };

        Ok(Self {
            size_header,
            offset_cert,
            size_cert,
            offset_ticket,
            size_ticket,
            offset_tmd,
            size_tmd,
            offset_content_list: offset_tmd + TMD_BODY_SIZE,
            size_content_list,
            offset_content,
            size_content,
            offset_meta,
            size_meta,
            size_cia,
        })
    }

    /// Number of content chunk records the TMD region can hold.
    pub fn content_list_capacity(&self) -> u64 {
        self.size_content_list / CHUNK_RECORD_SIZE
    }
}

fn add(a: u64, b: u64) -> Result<u64> {
    a.checked_add(b)
        .ok_or(Error::MalformedContainer("section offset overflows"))
}

/// The metadata part of a CIA kept in memory while it is mounted.
#[derive(Debug, Clone)]
pub struct CiaStub {
    pub header: CiaHeader,
    pub ticket: Ticket,
    pub tmd: Tmd,
}

impl CiaStub {
    /// Parse header, ticket and TMD. The reader may be positioned anywhere.
    ///
    /// Only the ticket and TMD positions are derived here; whether the
    /// declared sizes form a consistent layout is checked by [`Self::info`].
    pub fn parse<R: Read + Seek>(r: &mut R) -> Result<Self> {
        r.seek(SeekFrom::Start(0))?;
        let header = CiaHeader::parse(r)?;

        // u32 sizes aligned to 0x40 cannot overflow u64
        let offset_ticket = u64::from(header.header_size).next_multiple_of(CIA_ALIGN)
            + u64::from(header.cert_size).next_multiple_of(CIA_ALIGN);
        let offset_tmd = offset_ticket + u64::from(header.ticket_size).next_multiple_of(CIA_ALIGN);

        r.seek(SeekFrom::Start(offset_ticket))?;
        let ticket = Ticket::parse(r)?;
        r.seek(SeekFrom::Start(offset_tmd))?;
        let tmd = Tmd::parse(r)?;

        Ok(Self {
            header,
            ticket,
            tmd,
        })
    }

    /// Recompute and validate the layout against the parsed TMD.
    pub fn info(&self) -> Result<CiaInfo> {
        let info = CiaInfo::from_header(&self.header)?;
        if u64::from(self.tmd.content_count) > info.content_list_capacity() {
            return Err(Error::MalformedContainer(
                "TMD declares more contents than it holds",
            ));
        }
        Ok(info)
    }
}
