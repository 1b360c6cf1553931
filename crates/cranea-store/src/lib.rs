//! # Cranea Store
//!
//! The container: one file holding every sealed node of a story.
//!
//! ## Layout
//!
//! ```text
//! prefix (free text) || 0x00
//! header:  offset-table pos (u64) || location-map pos (u64)
//!          || item-map pos (u64) || file-map pos (u64) || initial key (16)
//! objects: sealed envelopes, pre-order depth-first
//! offset table: count (u32) || (gid u32, pos u64)*
//! location map, item map, file map: count (u32) || (key hash, gid u32)*
//! ```
//!
//! Integers are little-endian. Maps only translate keys a player can learn
//! from outside a location (root locations, items, files) into gids; actions
//! are reached through location action tables and never mapped.
//!
//! ## Key Types
//!
//! - [`ContainerWriter`] - emits objects and backpatches the header
//! - [`Container`] - random access to sealed objects by gid
//! - [`Category`] - which lookup map a key belongs to

pub mod error;
pub mod layout;
pub mod reader;
pub mod writer;

pub use error::{Result, StoreError};
pub use layout::{Category, HEADER_LEN};
pub use reader::Container;
pub use writer::ContainerWriter;
