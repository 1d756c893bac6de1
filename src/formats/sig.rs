//! Signature prefix of signed 3DS blobs (tickets, TMDs, certificates).
//!
//! ## Layout
//! ```text
//! [0x00] SignatureType             (u32 BE)
//! [0x04] Signature                 (length depends on type)
//! [....] Padding                   (aligns the body to 0x40)
//! [....] Body
//! ```
//!
//! | Type | Algorithm | Signature | Padding |
//! |------|-----------|-----------|---------|
//! | 0x010000 / 0x010003 | RSA-4096 SHA-1 / SHA-256 | 0x200 | 0x3C |
//! | 0x010001 / 0x010004 | RSA-2048 SHA-1 / SHA-256 | 0x100 | 0x3C |
//! | 0x010002 / 0x010005 | ECDSA SHA-1 / SHA-256    | 0x03C | 0x40 |

use std::io::{Read, Seek};

use crate::utils::{be_u32, skip};
use crate::{Error, Result};

/// Signature algorithms that may prefix a signed blob.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureType {
    Rsa4096Sha1,
    Rsa2048Sha1,
    EcdsaSha1,
    Rsa4096Sha256,
    Rsa2048Sha256,
    EcdsaSha256,
}

impl SignatureType {
    /// Bytes occupied by type, signature and padding.
    pub fn prefix_size(self) -> u64 {
        match self {
            Self::Rsa4096Sha1 | Self::Rsa4096Sha256 => 4 + 0x200 + 0x3C,
            Self::Rsa2048Sha1 | Self::Rsa2048Sha256 => 4 + 0x100 + 0x3C,
            Self::EcdsaSha1 | Self::EcdsaSha256 => 4 + 0x3C + 0x40,
        }
    }
}

impl TryFrom<u32> for SignatureType {
    type Error = Error;
    fn try_from(v: u32) -> Result<Self> {
        match v {
            0x010000 => Ok(Self::Rsa4096Sha1),
            0x010001 => Ok(Self::Rsa2048Sha1),
            0x010002 => Ok(Self::EcdsaSha1),
            0x010003 => Ok(Self::Rsa4096Sha256),
            0x010004 => Ok(Self::Rsa2048Sha256),
            0x010005 => Ok(Self::EcdsaSha256),
            _ => Err(Error::MalformedContainer("unknown signature type")),
        }
    }
}

/// Read the signature type and skip past signature and padding, leaving the
/// reader at the start of the signed body.
pub(crate) fn skip_signature<R: Read + Seek>(r: &mut R) -> Result<SignatureType> {
    let sig = SignatureType::try_from(be_u32(r)?)?;
    skip(r, sig.prefix_size() - 4)?;
    Ok(sig)
}
