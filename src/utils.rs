//! Low-level I/O primitives shared by the format parsers.
//!
//! Each function reads exactly the bytes it promises or returns an error.
//! CIA headers are little-endian; everything inside the signed blobs
//! (ticket, TMD) is big-endian.

use std::io::{Read, Seek, SeekFrom};

use crate::{Error, Result};

/// Section alignment inside a CIA.
pub(crate) const CIA_ALIGN: u64 = 0x40;

/// Read one byte.
#[inline]
pub(crate) fn u8<R: Read>(r: &mut R) -> Result<u8> {
    Ok(bytesa::<1>(r)?[0])
}

#[inline]
pub(crate) fn le_u16<R: Read>(r: &mut R) -> Result<u16> {
    Ok(u16::from_le_bytes(bytesa(r)?))
}

#[inline]
pub(crate) fn le_u32<R: Read>(r: &mut R) -> Result<u32> {
    Ok(u32::from_le_bytes(bytesa(r)?))
}

#[inline]
pub(crate) fn le_u64<R: Read>(r: &mut R) -> Result<u64> {
    Ok(u64::from_le_bytes(bytesa(r)?))
}

#[inline]
pub(crate) fn be_u16<R: Read>(r: &mut R) -> Result<u16> {
    Ok(u16::from_be_bytes(bytesa(r)?))
}

#[inline]
pub(crate) fn be_u32<R: Read>(r: &mut R) -> Result<u32> {
    Ok(u32::from_be_bytes(bytesa(r)?))
}

#[inline]
pub(crate) fn be_u64<R: Read>(r: &mut R) -> Result<u64> {
    Ok(u64::from_be_bytes(bytesa(r)?))
}

/// Read exactly `N` bytes into a fixed-size array.
#[inline]
pub(crate) fn bytesa<const N: usize>(r: &mut impl Read) -> Result<[u8; N]> {
    let mut b = [0u8; N];
    r.read_exact(&mut b)?;
    Ok(b)
}

/// Skip `n` bytes relative to the current position.
#[inline]
pub(crate) fn skip<R: Seek>(r: &mut R, n: u64) -> Result<()> {
    let n = i64::try_from(n).map_err(|_| Error::OffsetOverflow)?;
    r.seek(SeekFrom::Current(n))?;
    Ok(())
}

/// Round `v` up to the next multiple of [`CIA_ALIGN`], failing on overflow.
#[inline]
pub(crate) fn align_up(v: u64) -> Result<u64> {
    v.checked_next_multiple_of(CIA_ALIGN)
        .ok_or(Error::MalformedContainer("section size overflows"))
}
