//! # Cranea Core
//!
//! Pure primitives for Cranea: keys, key derivation, and command text handling.
//!
//! This crate contains no I/O. Every function here is deterministic except
//! key and IV generation, which draw from the thread-local CSPRNG.
//!
//! ## Key Types
//!
//! - [`Key`] - 128-bit symmetric secret; one per sealed object
//! - [`KeyHash`] - 160-bit one-way digest of a key, safe to store in lookup tables
//! - [`Iv`] - per-encryption initialization vector
//! - [`Gid`] - container-local object identifier
//!
//! ## Key Derivation
//!
//! See the [`crypto`] module: [`hash_key`], [`command_key`] and
//! [`conjunction_key`] are the only ways keys relate to each other.

pub mod action;
pub mod command;
pub mod crypto;
pub mod error;
pub mod types;

pub use action::{ActionKind, Path};
pub use command::{clean_filename, is_valid_filename, join, normalize, tokenize, Hook};
pub use crypto::{command_key, conjunction_key, hash_key, title_hash};
pub use error::{CoreError, Result};
pub use types::{Gid, Iv, Key, KeyHash, IV_LEN, KEY_HASH_LEN, KEY_LEN};
