//! Container emission.

use std::collections::HashSet;
use std::io::{Seek, SeekFrom, Write};

use bytes::{BufMut, BytesMut};
use cranea_core::{hash_key, Gid, Key, KeyHash};
use tracing::debug;

use crate::error::{Result, StoreError};
use crate::layout::{Category, HEADER_LEN, MAP_ENTRY_LEN, OFFSET_ENTRY_LEN};

/// Writes a container in one pass, backpatching the header at the end.
///
/// ```text
/// new()          prefix, NUL, zeroed header
/// begin_object() records the position; caller seals into the sink
/// map()          registers key hash -> gid in a category map
/// finish()       tables, then the real header over the placeholder
/// ```
pub struct ContainerWriter<W: Write + Seek> {
    sink: W,
    header_pos: u64,
    offsets: Vec<(Gid, u64)>,
    recorded: HashSet<Gid>,
    maps: [Vec<(KeyHash, Gid)>; 3],
}

impl<W: Write + Seek> ContainerWriter<W> {
    /// Write the prefix and a placeholder header.
    pub fn new(mut sink: W, prefix: &str) -> Result<Self> {
        if prefix.as_bytes().contains(&0) {
            return Err(StoreError::NulInPrefix);
        }
        sink.write_all(prefix.as_bytes())?;
        sink.write_all(&[0])?;
        let header_pos = sink.stream_position()?;
        sink.write_all(&[0u8; HEADER_LEN])?;
        Ok(Self {
            sink,
            header_pos,
            offsets: Vec::new(),
            recorded: HashSet::new(),
            maps: Default::default(),
        })
    }

    /// Whether `gid` has already been emitted.
    pub fn is_recorded(&self, gid: Gid) -> bool {
        self.recorded.contains(&gid)
    }

    /// Record the current position as `gid`'s object and hand out the sink
    /// to seal it into.
    pub fn begin_object(&mut self, gid: Gid) -> Result<&mut W> {
        if !self.recorded.insert(gid) {
            return Err(StoreError::DuplicateGid(gid));
        }
        let pos = self.sink.stream_position()?;
        self.offsets.push((gid, pos));
        Ok(&mut self.sink)
    }

    /// Make `key` resolvable to `gid` in a category map.
    pub fn map(&mut self, category: Category, key: &Key, gid: Gid) {
        self.maps[category.index()].push((hash_key(key), gid));
    }

    /// Number of objects emitted so far.
    pub fn object_count(&self) -> usize {
        self.offsets.len()
    }

    /// Write the tables and the header; returns the sink positioned at the end.
    pub fn finish(mut self, initial: &Key) -> Result<W> {
        let table_pos = self.sink.stream_position()?;
        let mut buf = BytesMut::with_capacity(4 + self.offsets.len() * OFFSET_ENTRY_LEN);
        buf.put_u32_le(count(self.offsets.len())?);
        for (gid, pos) in &self.offsets {
            buf.put_u32_le(gid.get());
            buf.put_u64_le(*pos);
        }
        self.sink.write_all(&buf)?;

        let mut map_pos = [0u64; 3];
        for category in Category::ALL {
            let entries = &self.maps[category.index()];
            map_pos[category.index()] = self.sink.stream_position()?;
            let mut buf = BytesMut::with_capacity(4 + entries.len() * MAP_ENTRY_LEN);
            buf.put_u32_le(count(entries.len())?);
            for (hash, gid) in entries {
                buf.put_slice(hash.as_bytes());
                buf.put_u32_le(gid.get());
            }
            self.sink.write_all(&buf)?;
        }

        let mut header = BytesMut::with_capacity(HEADER_LEN);
        header.put_u64_le(table_pos);
        for pos in map_pos {
            header.put_u64_le(pos);
        }
        header.put_slice(initial.as_bytes());
        self.sink.seek(SeekFrom::Start(self.header_pos))?;
        self.sink.write_all(&header)?;
        self.sink.seek(SeekFrom::End(0))?;
        self.sink.flush()?;

        debug!(
            objects = self.offsets.len(),
            locations = self.maps[0].len(),
            items = self.maps[1].len(),
            files = self.maps[2].len(),
            "container written"
        );
        Ok(self.sink)
    }
}

fn count(len: usize) -> Result<u32> {
    u32::try_from(len).map_err(|_| StoreError::Corrupt(format!("table of {len} entries")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_nul_in_prefix_rejected() {
        let err = ContainerWriter::new(Cursor::new(Vec::new()), "bad\0prefix").err().unwrap();
        assert!(matches!(err, StoreError::NulInPrefix));
    }

    #[test]
    fn test_duplicate_gid_rejected() {
        let mut w = ContainerWriter::new(Cursor::new(Vec::new()), "").unwrap();
        w.begin_object(Gid(0)).unwrap();
        assert!(w.is_recorded(Gid(0)));
        assert!(matches!(w.begin_object(Gid(0)), Err(StoreError::DuplicateGid(Gid(0)))));
    }

    #[test]
    fn test_header_backpatched() {
        let initial = Key::from_bytes([5; 16]);
        let w = ContainerWriter::new(Cursor::new(Vec::new()), "hi").unwrap();
        let bytes = w.finish(&initial).unwrap().into_inner();

        assert_eq!(&bytes[..3], b"hi\0");
        let header = &bytes[3..3 + HEADER_LEN];
        let table_pos = u64::from_le_bytes(header[..8].try_into().unwrap());
        assert_eq!(table_pos as usize, 3 + HEADER_LEN);
        assert_eq!(&header[32..], initial.as_bytes());
        // empty offset table plus three empty maps
        assert_eq!(bytes.len(), 3 + HEADER_LEN + 4 * 4);
    }
}
