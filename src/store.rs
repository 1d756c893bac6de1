//! Physical storage backing a mounted container.
//!
//! [`Storage`] opens a handle by path; the handle is a [`PhysicalFile`]:
//! plain blocking [`Read`] + [`Seek`] (`tell` is
//! [`Seek::stream_position`]) plus `size` and `sync`. Closing is dropping
//! the handle.

use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::{self, Cursor, Read, Seek};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// An open handle on one backing file.
pub trait PhysicalFile: Read + Seek {
    /// Total size of the file in bytes.
    fn size(&mut self) -> io::Result<u64>;

    /// Flush pending state to the medium.
    fn sync(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl PhysicalFile for File {
    fn size(&mut self) -> io::Result<u64> {
        Ok(self.metadata()?.len())
    }

    fn sync(&mut self) -> io::Result<()> {
        self.sync_all()
    }
}

impl<T: AsRef<[u8]>> PhysicalFile for Cursor<T> {
    fn size(&mut self) -> io::Result<u64> {
        Ok(self.get_ref().as_ref().len() as u64)
    }
}

/// Opens physical files by path.
pub trait Storage {
    type File: PhysicalFile;

    fn open(&self, path: &Path) -> io::Result<Self::File>;
}

/// The host filesystem.
///
/// Files are opened read/write and must already exist, matching how the
/// drive holds its mount handle; the drive itself never writes.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsStorage;

impl Storage for FsStorage {
    type File = File;

    fn open(&self, path: &Path) -> io::Result<File> {
        OpenOptions::new().read(true).write(true).open(path)
    }
}

/// Container images held in memory, keyed by path.
#[derive(Debug, Default, Clone)]
pub struct MemStorage {
    images: HashMap<PathBuf, Arc<[u8]>>,
}

impl MemStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the image served for `path`.
    pub fn insert(&mut self, path: impl Into<PathBuf>, data: impl Into<Arc<[u8]>>) {
        self.images.insert(path.into(), data.into());
    }
}

impl Storage for MemStorage {
    type File = Cursor<Arc<[u8]>>;

    fn open(&self, path: &Path) -> io::Result<Self::File> {
        self.images
            .get(path)
            .map(|data| Cursor::new(Arc::clone(data)))
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, path.display().to_string()))
    }
}
