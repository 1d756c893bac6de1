//! Offset-translating reads from virtual files.

use std::io::{self, Seek, SeekFrom};

use log::trace;

use super::VGame;
use super::dir::{KEYSLOT_NONE, VirtualFile};
use crate::store::{PhysicalFile, Storage};
use crate::{Error, Result};

impl<S: Storage> VGame<S> {
    /// Read `buf.len()` bytes of `vfile` starting at relative `offset`.
    ///
    /// The request is translated to the absolute range
    /// `vfile.offset + offset ..` of the physical file and must lie inside
    /// it. Returns the number of bytes transferred, which always equals
    /// `buf.len()`; anything less is [`Error::ShortRead`]. Errors never
    /// affect the mount.
    pub fn read_file(&mut self, vfile: &VirtualFile, buf: &mut [u8], offset: u64) -> Result<usize> {
        if buf.is_empty() {
            return Err(Error::InvalidArgument);
        }
        let mount = self.mount.as_mut().ok_or(Error::NotMounted)?;
        let file = &mut mount.file;

        let absolute = u64::from(vfile.offset)
            .checked_add(offset)
            .ok_or(Error::OutOfRange)?;
        let end = absolute
            .checked_add(buf.len() as u64)
            .ok_or(Error::OutOfRange)?;
        if end > file.size().map_err(Error::Io)? {
            return Err(Error::OutOfRange);
        }
        if file.stream_position().map_err(Error::Io)? != absolute {
            file.seek(SeekFrom::Start(absolute)).map_err(Error::Io)?;
        }
        trace!("{}: {:#x} bytes at {absolute:#x}", vfile.name, buf.len());

        let actual = read_full(file, buf)?;

        if vfile.keyslot != KEYSLOT_NONE
            && let Some(transform) = &self.transform
        {
            transform.apply(vfile, &mut buf[..actual], offset)?;
        }

        if actual != buf.len() {
            return Err(Error::ShortRead {
                expected: buf.len(),
                actual,
            });
        }
        Ok(actual)
    }
}

/// Read until `buf` is full or the file ends.
fn read_full<F: PhysicalFile>(file: &mut F, buf: &mut [u8]) -> Result<usize> {
    let mut done = 0;
    while done < buf.len() {
        match file.read(&mut buf[done..]) {
            Ok(0) => break,
            Ok(n) => done += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(Error::Io(e)),
        }
    }
    Ok(done)
}
