//! # Cranea Seal
//!
//! The object codec: every node of a container is sealed under its own key.
//!
//! ## Envelope
//!
//! ```text
//! IV (16 bytes, clear) || AES-128-CFB(key, IV)[ MAGIC || fields... ]
//! ```
//!
//! CFB is self-synchronizing and byte-granular, so a reader can decrypt
//! exactly as many bytes as it needs. [`SealReader`] pulls ciphertext from
//! its source in chunks whenever its plaintext buffer runs dry; callers ask
//! for "the next N bytes" without knowing the object's size.
//!
//! A wrong key is detected by the magic tag and reported as
//! [`SealError::BadMagic`].
//!
//! ## Key Blocks
//!
//! - [`SealedKey`] - one key encrypted under another (an action's dokey
//!   under a conjunction key)
//! - [`ActionSlot`] - an action's gid, key and exactness flag encrypted
//!   under a command key
//!
//! ## Records
//!
//! [`objects`] defines the payload layout of each sealed node type.

pub mod codec;
pub mod error;
pub mod keys;
pub mod objects;

pub use codec::{SealReader, SealWriter, MAGIC};
pub use error::{Result, SealError};
pub use keys::{ActionSlot, SealedKey, SlotTarget, ACTION_SLOT_LEN, SEALED_KEY_LEN};
pub use objects::{
    ActionEntry, ActionLock, ActionRecord, ChildEntry, Conjunction, FileLaunch, FileRecord,
    ItemRecord, LocationRecord, SealedFile, TakeEntry,
};
