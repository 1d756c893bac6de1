//! Parsers for 3DS title containers.
//!
//! All parsers follow the same conventions:
//!
//! * **Generic over** [`std::io::Read`] + [`std::io::Seek`] - pass a
//!   [`std::fs::File`], a [`std::io::Cursor`], or any [`crate::store::PhysicalFile`].
//! * **Metadata only** - `parse` reads headers and builds an in-memory
//!   description of the container. Content data is never loaded.
//! * **Crypto is separate** - the title key stays encrypted in the parsed
//!   [`ticket::Ticket`]; unwrap it with [`crate::keys::KeySet`].
//!
//! ## Format overview
//!
//! | Module     | Format | Description |
//! |------------|--------|-------------|
//! | [`cia`]    | CIA    | Title-install archive: header, certificate chain, ticket, TMD, contents, meta |
//! | [`ticket`] | Ticket | Signed blob carrying the encrypted title key |
//! | [`tmd`]    | TMD    | Title metadata; lists content chunk records |
//! | [`sig`]    | -      | Signature prefix shared by tickets and TMDs |

pub mod cia;
pub mod sig;
pub mod ticket;
pub mod tmd;

use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

use crate::store::Storage;
use crate::utils::{bytesa, le_u16, le_u32};

/// Container families the classifier recognizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GameKind {
    /// CTR Importable Archive (title install).
    Cia,
    /// CTR Cart Image (NCSD).
    Ncsd,
    /// Single NCCH partition (CXI/CFA).
    Ncch,
}

impl GameKind {
    /// Whether the virtual drive can mount this kind.
    pub fn is_mountable(self) -> bool {
        matches!(self, GameKind::Cia)
    }
}

/// Classify a container by sniffing its leading bytes.
///
/// Returns [`None`] for anything unrecognized, including unreadable paths.
pub fn identify<S: Storage>(storage: &S, path: &Path) -> Option<GameKind> {
    let mut file = storage.open(path).ok()?;
    sniff(&mut file)
}

/// Classify a container from a reader positioned anywhere.
pub fn sniff<R: Read + Seek>(r: &mut R) -> Option<GameKind> {
    r.seek(SeekFrom::Start(0)).ok()?;
    let header_size = le_u32(r).ok()?;
    let kind = le_u16(r).ok()?;
    let version = le_u16(r).ok()?;
    if header_size == cia::CIA_HEADER_SIZE && kind == 0 && version == 0 {
        return Some(GameKind::Cia);
    }

    r.seek(SeekFrom::Start(0x100)).ok()?;
    match &bytesa::<4>(r).ok()? {
        b"NCSD" => Some(GameKind::Ncsd),
        b"NCCH" => Some(GameKind::Ncch),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn sniffs_each_family() {
        let mut cia = vec![0u8; 0x200];
        cia[..4].copy_from_slice(&0x2020u32.to_le_bytes());
        assert_eq!(sniff(&mut Cursor::new(&cia)), Some(GameKind::Cia));

        let mut ncsd = vec![0u8; 0x200];
        ncsd[0x100..0x104].copy_from_slice(b"NCSD");
        assert_eq!(sniff(&mut Cursor::new(&ncsd)), Some(GameKind::Ncsd));

        let mut ncch = vec![0u8; 0x200];
        ncch[0x100..0x104].copy_from_slice(b"NCCH");
        assert_eq!(sniff(&mut Cursor::new(&ncch)), Some(GameKind::Ncch));
    }

    #[test]
    fn rejects_short_or_unknown_data() {
        assert_eq!(sniff(&mut Cursor::new(b"tiny")), None);
        assert_eq!(sniff(&mut Cursor::new(vec![0xAAu8; 0x400])), None);

        // Right header size but a non-zero type field.
        let mut odd = vec![0u8; 0x200];
        odd[..4].copy_from_slice(&0x2020u32.to_le_bytes());
        odd[4] = 1;
        assert_eq!(sniff(&mut Cursor::new(&odd)), None);
    }

    #[test]
    fn only_cia_is_mountable() {
        assert!(GameKind::Cia.is_mountable());
        assert!(!GameKind::Ncsd.is_mountable());
        assert!(!GameKind::Ncch.is_mountable());
    }
}
