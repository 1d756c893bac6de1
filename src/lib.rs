//! **vdrive** - a read-only virtual drive over 3DS CIA title-install archives.
//!
//! A mounted CIA is exposed as a flat directory of named byte ranges
//! ("virtual files"): its header, certificate chain, ticket, TMD, content
//! chunk records, meta section and every content. Reads of a virtual file
//! are translated to reads of the one backing physical file; nothing is
//! copied or extracted.
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`drive`]   | Mount session, directory builder and reader, read translation |
//! | [`formats`] | CIA, ticket and TMD parsers; container classification |
//! | [`keys`]    | Key-file loading and title key unwrapping |
//! | [`crypto`]  | AES helpers (key scrambler, CBC, CTR at byte offsets) |
//! | [`store`]   | Physical storage abstraction (filesystem and in-memory) |

pub mod crypto;
pub mod drive;
pub mod error;
pub mod formats;
pub mod keys;
pub mod store;
pub(crate) mod utils;

pub use drive::VGame;
pub use drive::dir::VirtualFile;
pub use error::{Error, Result};
pub use formats::GameKind;
