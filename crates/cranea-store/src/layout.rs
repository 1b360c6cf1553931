//! Fixed sizes and the lookup-map categories.

use cranea_core::{KEY_HASH_LEN, KEY_LEN};

/// Header: four `u64` positions and the initial location key.
pub const HEADER_LEN: usize = 4 * 8 + KEY_LEN;

/// Offset-table entry: gid and file position.
pub(crate) const OFFSET_ENTRY_LEN: usize = 4 + 8;

/// Lookup-map entry: key hash and gid.
pub(crate) const MAP_ENTRY_LEN: usize = KEY_HASH_LEN + 4;

/// Node categories that have a key-to-gid lookup map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Location,
    Item,
    File,
}

impl Category {
    /// Header order.
    pub const ALL: [Category; 3] = [Category::Location, Category::Item, Category::File];

    pub(crate) const fn index(self) -> usize {
        match self {
            Category::Location => 0,
            Category::Item => 1,
            Category::File => 2,
        }
    }
}
