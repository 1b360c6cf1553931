//! Random-access container reading.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader, Cursor, Read, Seek, SeekFrom};
use std::path::Path;

use bytes::Buf;
use cranea_core::{hash_key, Gid, Key, KeyHash, KEY_HASH_LEN, KEY_LEN};
use tracing::debug;

use crate::error::{Result, StoreError};
use crate::layout::{Category, HEADER_LEN, MAP_ENTRY_LEN, OFFSET_ENTRY_LEN};

/// An opened container.
///
/// Tables are loaded at open; object bytes stay in the source until asked
/// for. Only one object stream is in flight at a time: [`Container::seek_object`]
/// borrows the source mutably.
pub struct Container<R> {
    source: R,
    prefix: String,
    initial: Key,
    offsets: HashMap<Gid, u64>,
    maps: [HashMap<KeyHash, Gid>; 3],
}

impl Container<BufReader<File>> {
    /// Open a container file.
    pub fn open_path(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        Self::open(BufReader::new(file))
    }
}

impl Container<Cursor<Vec<u8>>> {
    /// Open an in-memory container.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        Self::open(Cursor::new(bytes))
    }
}

impl<R: BufRead + Seek> Container<R> {
    /// Parse prefix, header and tables.
    pub fn open(mut source: R) -> Result<Self> {
        let mut prefix = Vec::new();
        source.read_until(0, &mut prefix)?;
        if prefix.pop() != Some(0) {
            return Err(StoreError::Corrupt("prefix is not NUL-terminated".into()));
        }
        let prefix = String::from_utf8_lossy(&prefix).into_owned();

        let mut header = [0u8; HEADER_LEN];
        source
            .read_exact(&mut header)
            .map_err(|_| StoreError::Corrupt("header truncated".into()))?;
        let mut h = &header[..];
        let table_pos = h.get_u64_le();
        let map_pos = [h.get_u64_le(), h.get_u64_le(), h.get_u64_le()];
        let mut initial = [0u8; KEY_LEN];
        h.copy_to_slice(&mut initial);

        let end = source.seek(SeekFrom::End(0))?;

        let raw = read_table(&mut source, table_pos, OFFSET_ENTRY_LEN, end)?;
        let mut t = &raw[..];
        let mut offsets = HashMap::with_capacity(raw.len() / OFFSET_ENTRY_LEN);
        while t.has_remaining() {
            let gid = Gid(t.get_u32_le());
            let pos = t.get_u64_le();
            if pos >= end {
                return Err(StoreError::Corrupt(format!("object {gid} past end of file")));
            }
            offsets.insert(gid, pos);
        }

        let mut maps: [HashMap<KeyHash, Gid>; 3] = Default::default();
        for category in Category::ALL {
            let raw = read_table(&mut source, map_pos[category.index()], MAP_ENTRY_LEN, end)?;
            let mut t = &raw[..];
            let map = &mut maps[category.index()];
            while t.has_remaining() {
                let mut hash = [0u8; KEY_HASH_LEN];
                t.copy_to_slice(&mut hash);
                map.insert(KeyHash(hash), Gid(t.get_u32_le()));
            }
        }

        debug!(
            objects = offsets.len(),
            roots = maps[0].len(),
            items = maps[1].len(),
            files = maps[2].len(),
            "container opened"
        );

        Ok(Self {
            source,
            prefix,
            initial: Key(initial),
            offsets,
            maps,
        })
    }

    /// Position the source at `gid`'s envelope.
    pub fn seek_object(&mut self, gid: Gid) -> Result<&mut R> {
        let pos = *self.offsets.get(&gid).ok_or(StoreError::UnknownGid(gid))?;
        self.source.seek(SeekFrom::Start(pos))?;
        Ok(&mut self.source)
    }
}

impl<R> Container<R> {
    /// The free-text prefix.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Key of the location play starts in.
    pub fn initial_key(&self) -> &Key {
        &self.initial
    }

    /// Number of objects in the offset table.
    pub fn object_count(&self) -> usize {
        self.offsets.len()
    }

    /// Whether the offset table lists `gid`.
    pub fn contains(&self, gid: Gid) -> bool {
        self.offsets.contains_key(&gid)
    }

    /// Translate a known key into its gid.
    pub fn gid_for(&self, category: Category, key: &Key) -> Option<Gid> {
        self.gid_for_hash(category, &hash_key(key))
    }

    /// Translate a key hash into its gid.
    pub fn gid_for_hash(&self, category: Category, hash: &KeyHash) -> Option<Gid> {
        self.maps[category.index()].get(hash).copied()
    }
}

fn read_table<R: Read + Seek>(source: &mut R, pos: u64, entry_len: usize, end: u64) -> Result<Vec<u8>> {
    if pos.checked_add(4).map_or(true, |p| p > end) {
        return Err(StoreError::Corrupt(format!("table at {pos} past end of file")));
    }
    source.seek(SeekFrom::Start(pos))?;
    let mut n = [0u8; 4];
    source.read_exact(&mut n)?;
    let n = u32::from_le_bytes(n) as u64;
    let len = n * entry_len as u64;
    if len > end - pos - 4 {
        return Err(StoreError::Corrupt(format!("table at {pos} claims {n} entries")));
    }
    let mut raw = vec![0u8; len as usize];
    source.read_exact(&mut raw)?;
    Ok(raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::writer::ContainerWriter;
    use bytes::Bytes;
    use cranea_seal::{FileRecord, ItemRecord};
    use std::io::Write;

    struct Built {
        bytes: Vec<u8>,
        root: Key,
        item: Key,
        file: Key,
    }

    fn build() -> Built {
        let (root, item, file) = (Key::generate(), Key::generate(), Key::generate());
        let mut w = ContainerWriter::new(Cursor::new(Vec::new()), "A test story.\n").unwrap();

        let record = ItemRecord {
            visible: true,
            title: "lamp".into(),
            ..Default::default()
        };
        record.seal(w.begin_object(Gid(1)).unwrap(), &item).unwrap();
        w.map(Category::Item, &item, Gid(1));

        let payload = FileRecord {
            dest: "note.txt".into(),
            payload: Bytes::from_static(b"hello"),
        };
        payload.seal(w.begin_object(Gid(2)).unwrap(), &file).unwrap();
        w.map(Category::File, &file, Gid(2));

        w.begin_object(Gid(0)).unwrap().write_all(b"not a real envelope").unwrap();
        w.map(Category::Location, &root, Gid(0));

        let bytes = w.finish(&root).unwrap().into_inner();
        Built { bytes, root, item, file }
    }

    #[test]
    fn test_open_reads_header_and_maps() {
        let built = build();
        let c = Container::from_bytes(built.bytes).unwrap();

        assert_eq!(c.prefix(), "A test story.\n");
        assert_eq!(c.initial_key(), &built.root);
        assert_eq!(c.object_count(), 3);
        assert_eq!(c.gid_for(Category::Location, &built.root), Some(Gid(0)));
        assert_eq!(c.gid_for(Category::Item, &built.item), Some(Gid(1)));
        assert_eq!(c.gid_for(Category::File, &built.file), Some(Gid(2)));
        // maps are per category
        assert_eq!(c.gid_for(Category::Location, &built.item), None);
    }

    #[test]
    fn test_seek_object_decodes() {
        let built = build();
        let mut c = Container::from_bytes(built.bytes).unwrap();

        let item = ItemRecord::open(c.seek_object(Gid(1)).unwrap(), &built.item).unwrap();
        assert_eq!(item.title, "lamp");

        let file = cranea_seal::SealedFile::open(c.seek_object(Gid(2)).unwrap(), &built.file)
            .unwrap()
            .into_record()
            .unwrap();
        assert_eq!(&file.payload[..], b"hello");

        // random access in any order
        let again = ItemRecord::open(c.seek_object(Gid(1)).unwrap(), &built.item).unwrap();
        assert_eq!(again, item);
    }

    #[test]
    fn test_unknown_gid() {
        let mut c = Container::from_bytes(build().bytes).unwrap();
        assert!(matches!(c.seek_object(Gid(99)), Err(StoreError::UnknownGid(Gid(99)))));
        assert!(!c.contains(Gid(99)));
    }

    #[test]
    fn test_wrong_key_is_seal_error() {
        let mut c = Container::from_bytes(build().bytes).unwrap();
        let err = ItemRecord::open(c.seek_object(Gid(1)).unwrap(), &Key::generate()).unwrap_err();
        assert!(err.is_wrong_key());
    }

    #[test]
    fn test_truncated_container_is_corrupt() {
        let mut bytes = build().bytes;
        bytes.truncate(bytes.len() - 10);
        assert!(matches!(Container::from_bytes(bytes), Err(StoreError::Corrupt(_))));
    }

    #[test]
    fn test_missing_terminator_is_corrupt() {
        assert!(matches!(
            Container::from_bytes(b"no terminator here".to_vec()),
            Err(StoreError::Corrupt(_))
        ));
    }

    #[test]
    fn test_open_path() {
        let built = build();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("story.cra");
        std::fs::write(&path, &built.bytes).unwrap();

        let mut c = Container::open_path(&path).unwrap();
        let item = ItemRecord::open(c.seek_object(Gid(1)).unwrap(), &built.item).unwrap();
        assert_eq!(item.title, "lamp");
    }
}
