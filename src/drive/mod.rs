//! The virtual game drive: one mounted container exposed as a directory of
//! read-only virtual files.
//!
//! A [`VGame`] session owns everything: the storage it opens containers
//! from, the key set, the active mount, the directory table and the
//! enumeration cursor. Nothing is global; callers serialize access through
//! `&mut`.
//!
//! ```no_run
//! use vdrive::drive::VGame;
//! use vdrive::store::FsStorage;
//!
//! # fn main() -> vdrive::Result<()> {
//! let mut drive = VGame::new(FsStorage);
//! drive.mount("title.cia")?;
//! drive.rewind_dir()?;
//! while let Some(vfile) = drive.next_entry() {
//!     let mut buf = vec![0u8; vfile.size as usize];
//!     if !buf.is_empty() {
//!         drive.read_file(&vfile, &mut buf, 0)?;
//!     }
//!     println!("{} {:#x} {:#x}", vfile.name, vfile.offset, vfile.size);
//! }
//! # Ok(())
//! # }
//! ```

pub mod dir;
mod read;
pub mod transform;

use std::io::{Seek, SeekFrom};
use std::path::Path;

use log::debug;

use self::dir::{VirtualFile, build_cia_vdir};
use self::transform::{ContentTransform, CtrTransform};
use crate::formats::cia::CiaStub;
use crate::formats::{GameKind, identify};
use crate::keys::KeySet;
use crate::store::{PhysicalFile, Storage};
use crate::{Error, Result};

struct Mount<F> {
    kind: GameKind,
    stub: CiaStub,
    title_key: Option<[u8; 16]>,
    file: F,
}

/// A virtual drive session.
pub struct VGame<S: Storage> {
    storage: S,
    keys: KeySet,
    mount: Option<Mount<S::File>>,
    entries: Vec<VirtualFile>,
    /// Index of the last entry handed out; `None` before the first.
    cursor: Option<usize>,
    transform: Option<Box<dyn ContentTransform>>,
}

impl<S: Storage> VGame<S> {
    /// Create an unmounted session without key material.
    pub fn new(storage: S) -> Self {
        Self::with_keys(storage, KeySet::default())
    }

    /// Create an unmounted session that derives title keys from `keys`.
    pub fn with_keys(storage: S, keys: KeySet) -> Self {
        Self {
            storage,
            keys,
            mount: None,
            entries: Vec::new(),
            cursor: None,
            transform: None,
        }
    }

    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    /// Mount the container at `path`, replacing any current mount.
    ///
    /// The previous mount is torn down first, even when the new one fails;
    /// a failed mount leaves the session unmounted.
    pub fn mount(&mut self, path: impl AsRef<Path>) -> Result<GameKind> {
        self.unmount();

        let path = path.as_ref();
        if path.as_os_str().is_empty() {
            return Err(Error::UnsupportedType);
        }
        let kind = identify(&self.storage, path).ok_or(Error::UnsupportedType)?;
        if !kind.is_mountable() {
            debug!("{}: {kind:?} containers cannot be mounted", path.display());
            return Err(Error::UnsupportedType);
        }

        let mut file = self.storage.open(path)?;
        let stub = CiaStub::parse(&mut file)?;
        let title_key = match self.keys.title_key(&stub.ticket) {
            Ok(key) => Some(key),
            Err(e) => {
                debug!("no title key for {:016X}: {e}", stub.ticket.title_id);
                None
            }
        };
        file.seek(SeekFrom::Start(0))?;
        file.sync()?;

        debug!(
            "mounted {} as {kind:?}, title {:016X}, {} contents",
            path.display(),
            stub.tmd.title_id,
            stub.tmd.content_count
        );
        self.mount = Some(Mount {
            kind,
            stub,
            title_key,
            file,
        });
        Ok(kind)
    }

    /// Close the physical file and forget the mount. Idempotent.
    ///
    /// The directory table, cursor and any installed transform go with it.
    pub fn unmount(&mut self) {
        if self.mount.take().is_some() {
            debug!("unmounted");
        }
        self.entries.clear();
        self.cursor = None;
        self.transform = None;
    }

    /// Kind of the active mount, if any.
    pub fn mounted_kind(&self) -> Option<GameKind> {
        self.mount.as_ref().map(|m| m.kind)
    }

    /// Parsed metadata of the active mount.
    pub fn stub(&self) -> Option<&CiaStub> {
        self.mount.as_ref().map(|m| &m.stub)
    }

    /// Title key derived at mount time, if key material was available.
    pub fn title_key(&self) -> Option<&[u8; 16]> {
        self.mount.as_ref().and_then(|m| m.title_key.as_ref())
    }

    /// Clear the directory, reset the cursor and rebuild from the mount.
    ///
    /// On error the directory stays empty.
    pub fn rewind_dir(&mut self) -> Result<()> {
        self.entries.clear();
        self.cursor = None;
        self.entries = self.build()?;
        Ok(())
    }

    fn build(&self) -> Result<Vec<VirtualFile>> {
        let mount = self.mount.as_ref().ok_or(Error::NotMounted)?;
        if mount.kind != GameKind::Cia {
            return Err(Error::UnsupportedType);
        }
        let info = mount.stub.info()?;
        let tmd = &mount.stub.tmd;
        build_cia_vdir(&info, &tmd.chunks, tmd.content_count)
    }

    /// Hand out the next directory entry, or `None` once exhausted.
    pub fn next_entry(&mut self) -> Option<VirtualFile> {
        let next = self.cursor.map_or(0, |c| c + 1);
        let vfile = self.entries.get(next)?.clone();
        self.cursor = Some(next);
        Some(vfile)
    }

    /// The directory as built by the last [`Self::rewind_dir`].
    pub fn entries(&self) -> &[VirtualFile] {
        &self.entries
    }

    /// Install a transform for keyed reads.
    pub fn set_transform(&mut self, transform: Box<dyn ContentTransform>) {
        self.transform = Some(transform);
    }

    /// Remove any installed transform; reads return stored bytes.
    pub fn clear_transform(&mut self) {
        self.transform = None;
    }

    /// Install AES-CTR decryption with the mounted title's key.
    pub fn enable_title_key_ctr(&mut self) -> Result<()> {
        let mount = self.mount.as_ref().ok_or(Error::NotMounted)?;
        let key = mount.title_key.ok_or(Error::MissingKey("title key"))?;
        self.set_transform(Box::new(CtrTransform::new(key)));
        Ok(())
    }
}
