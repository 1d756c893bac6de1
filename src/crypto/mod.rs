//! Cryptographic operations for 3DS title content.
//!
//! All functions accept already-loaded key material; key-file loading and
//! the choice of common key are handled by [`crate::keys::KeySet`]. The
//! block cipher itself comes from the `aes` crate.
//!
//! ## Submodules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`cia`] | Key scrambler, AES-128-CBC title key unwrapping, AES-128-CTR content keystream at arbitrary byte offsets |
//!
//! ## Key hierarchy (brief)
//!
//! ```text
//! key file
//!   └── slot0x3DKeyX + slot0x3DKeyY{n}
//!         └── scrambler → common key n
//!               └── AES-CBC unwrap ticket title key (IV = title ID)
//!                     └── title key → AES-CTR over content n (counter = content index)
//! ```

pub mod cia;
