//! Pluggable transforms applied to bytes read from keyed virtual files.
//!
//! The drive exposes every region as stored, so by default nothing runs
//! here. A transform only sees reads of descriptors whose keyslot is not
//! [`KEYSLOT_NONE`](super::dir::KEYSLOT_NONE), and only once installed with
//! [`VGame::set_transform`](super::VGame::set_transform).

use crate::Result;
use crate::crypto::cia::{KEYSLOT_TITLEKEY, content_ctr, ctr_xor_at};

use super::dir::VirtualFile;

/// In-place transform over freshly read bytes.
pub trait ContentTransform: Send {
    /// Transform `data`, which holds the bytes of `vfile` starting at
    /// relative `offset`.
    fn apply(&self, vfile: &VirtualFile, data: &mut [u8], offset: u64) -> Result<()>;
}

/// AES-128-CTR with the title key.
///
/// The counter for a content is its index stored little-endian in the first
/// two bytes, zero elsewhere; `offset` selects the position in the
/// keystream. Only descriptors tagged with [`KEYSLOT_TITLEKEY`] are touched.
#[derive(Clone)]
pub struct CtrTransform {
    key: [u8; 16],
}

impl CtrTransform {
    pub fn new(key: [u8; 16]) -> Self {
        Self { key }
    }
}

impl std::fmt::Debug for CtrTransform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CtrTransform").finish_non_exhaustive()
    }
}

impl ContentTransform for CtrTransform {
    fn apply(&self, vfile: &VirtualFile, data: &mut [u8], offset: u64) -> Result<()> {
        if vfile.keyslot == KEYSLOT_TITLEKEY {
            ctr_xor_at(data, &self.key, &content_ctr(vfile.index), offset);
        }
        Ok(())
    }
}
