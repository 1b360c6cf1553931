//! Payload layouts of the four sealed node types.
//!
//! Each record seals itself into a fresh envelope under its node key and
//! opens from a stream positioned at the envelope's IV. Lists are `u32`
//! counts followed by their elements; optional fields carry a flag byte.

use std::collections::BTreeMap;
use std::io::{self, Read, Write};

use bytes::Bytes;
use cranea_core::{title_hash, ActionKind, Gid, Key, KeyHash, Path};

use crate::codec::{SealReader, SealWriter};
use crate::error::{Result, SealError};
use crate::keys::{ActionSlot, SealedKey, ACTION_SLOT_LEN, SEALED_KEY_LEN};

fn get_list<R: Read, T>(
    r: &mut SealReader<R>,
    mut each: impl FnMut(&mut SealReader<R>) -> Result<T>,
) -> Result<Vec<T>> {
    let n = r.get_len()?;
    let mut out = Vec::new();
    for _ in 0..n {
        out.push(each(r)?);
    }
    Ok(out)
}

fn put_path<W: Write>(w: &mut SealWriter<W>, path: &Path) -> Result<()> {
    w.put_u32(path.levels_up)?;
    w.put_len(path.down.len())?;
    for key in &path.down {
        w.put_key(key)?;
    }
    Ok(())
}

fn get_path<R: Read>(r: &mut SealReader<R>) -> Result<Path> {
    let levels_up = r.get_u32()?;
    let down = get_list(r, |r| r.get_key())?;
    Ok(Path { levels_up, down })
}

// ─────────────────────────────────────────────────────────────────────────────
// Location
// ─────────────────────────────────────────────────────────────────────────────

/// A child-location table entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChildEntry {
    pub hash: KeyHash,
    pub gid: Gid,
}

/// An action-table entry: command hash and the slot it unlocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActionEntry {
    pub command: KeyHash,
    pub slot: ActionSlot,
}

/// Decrypted location payload.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LocationRecord {
    /// Key of the child entered automatically on arrival.
    pub start: Option<Key>,
    pub title: String,
    pub desc: String,
    pub prompt: String,
    pub ignored: Vec<String>,
    pub children: Vec<ChildEntry>,
    /// Keys of the items initially present.
    pub items: Vec<Key>,
    /// Entries sharing a command hash keep their relative order.
    pub actions: Vec<ActionEntry>,
}

impl LocationRecord {
    pub fn seal<W: Write>(&self, sink: W, key: &Key) -> Result<W> {
        let mut w = SealWriter::begin(sink, key)?;
        match &self.start {
            Some(start) => {
                w.put_bool(true)?;
                w.put_key(start)?;
            }
            None => w.put_bool(false)?,
        }
        w.put_str(&self.title)?;
        w.put_str(&self.desc)?;
        w.put_str(&self.prompt)?;
        w.put_len(self.ignored.len())?;
        for word in &self.ignored {
            w.put_str(word)?;
        }
        w.put_len(self.children.len())?;
        for child in &self.children {
            w.put_key_hash(&child.hash)?;
            w.put_gid(child.gid)?;
        }
        w.put_len(self.items.len())?;
        for item in &self.items {
            w.put_key(item)?;
        }
        w.put_len(self.actions.len())?;
        for entry in &self.actions {
            w.put_key_hash(&entry.command)?;
            w.put_bytes(entry.slot.as_bytes())?;
        }
        w.finish()
    }

    pub fn open<R: Read>(source: R, key: &Key) -> Result<Self> {
        let mut r = SealReader::open(source, key)?;
        let start = if r.get_bool()? { Some(r.get_key()?) } else { None };
        let title = r.get_str()?;
        let desc = r.get_str()?;
        let prompt = r.get_str()?;
        let ignored = get_list(&mut r, |r| r.get_str())?;
        let children = get_list(&mut r, |r| {
            Ok(ChildEntry {
                hash: r.get_key_hash()?,
                gid: r.get_gid()?,
            })
        })?;
        let items = get_list(&mut r, |r| r.get_key())?;
        let actions = get_list(&mut r, |r| {
            Ok(ActionEntry {
                command: r.get_key_hash()?,
                slot: ActionSlot::from_bytes(r.get_array::<ACTION_SLOT_LEN>()?),
            })
        })?;
        Ok(Self {
            start,
            title,
            desc,
            prompt,
            ignored,
            children,
            items,
            actions,
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Item
// ─────────────────────────────────────────────────────────────────────────────

/// Decrypted item payload.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ItemRecord {
    pub visible: bool,
    pub title: String,
    /// Hashes of every name the item answers to, synonyms expanded.
    pub title_hashes: Vec<KeyHash>,
    pub desc: String,
    /// Present when taking is unrestricted; otherwise only an action's
    /// take-list carries it.
    pub take_key: Option<Key>,
}

impl ItemRecord {
    /// Whether `title` (already normalized) names this item.
    pub fn has_title(&self, title: &str) -> bool {
        let hash = title_hash(title);
        self.title_hashes.contains(&hash)
    }

    pub fn seal<W: Write>(&self, sink: W, key: &Key) -> Result<W> {
        let mut w = SealWriter::begin(sink, key)?;
        w.put_bool(self.visible)?;
        w.put_str(&self.title)?;
        w.put_len(self.title_hashes.len())?;
        for hash in &self.title_hashes {
            w.put_key_hash(hash)?;
        }
        w.put_str(&self.desc)?;
        w.put_bool(self.take_key.is_none())?;
        if let Some(take_key) = &self.take_key {
            w.put_key(take_key)?;
        }
        w.finish()
    }

    pub fn open<R: Read>(source: R, key: &Key) -> Result<Self> {
        let mut r = SealReader::open(source, key)?;
        let visible = r.get_bool()?;
        let title = r.get_str()?;
        let title_hashes = get_list(&mut r, |r| r.get_key_hash())?;
        let desc = r.get_str()?;
        let restricted = r.get_bool()?;
        let take_key = if restricted { None } else { Some(r.get_key()?) };
        Ok(Self {
            visible,
            title,
            title_hashes,
            desc,
            take_key,
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// File
// ─────────────────────────────────────────────────────────────────────────────

/// A file payload to seal.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FileRecord {
    /// Relative destination, sanitized again on extraction.
    pub dest: String,
    pub payload: Bytes,
}

impl FileRecord {
    pub fn seal<W: Write>(&self, sink: W, key: &Key) -> Result<W> {
        let mut w = SealWriter::begin(sink, key)?;
        w.put_str(&self.dest)?;
        w.put_u64(self.payload.len() as u64)?;
        w.put_bytes(&self.payload)?;
        w.finish()
    }
}

/// An opened file whose payload has not been read yet.
///
/// Payloads may be large, so they are streamed out rather than decoded
/// into memory.
pub struct SealedFile<R: Read> {
    pub dest: String,
    pub len: u64,
    body: SealReader<R>,
}

impl<R: Read> SealedFile<R> {
    pub fn open(source: R, key: &Key) -> Result<Self> {
        let mut body = SealReader::open(source, key)?;
        let dest = body.get_str()?;
        let len = body.get_u64()?;
        Ok(Self { dest, len, body })
    }

    /// Stream the payload into `sink`.
    pub fn copy_to<W: Write>(&mut self, sink: &mut W) -> Result<u64> {
        let copied = io::copy(&mut (&mut self.body).take(self.len), sink)?;
        if copied != self.len {
            return Err(SealError::Truncated((self.len - copied) as usize));
        }
        Ok(copied)
    }

    /// Read the whole payload into memory.
    pub fn into_record(mut self) -> Result<FileRecord> {
        let len = usize::try_from(self.len).map_err(|_| SealError::TooLong(usize::MAX))?;
        let payload = self.body.get_bytes(len)?;
        Ok(FileRecord {
            dest: self.dest,
            payload: Bytes::from(payload),
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Action
// ─────────────────────────────────────────────────────────────────────────────

/// A file the action extracts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileLaunch {
    pub key: Key,
    /// Hand the extracted file to the launcher.
    pub launch: bool,
}

/// An item the action puts in the inventory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TakeEntry {
    pub item: Key,
    pub take_key: Key,
    /// Route from the action's location to where the item lies.
    pub path: Path,
}

/// One AND-clause of a predicate, as stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conjunction {
    /// Take-key hashes of the required items.
    pub items: Vec<KeyHash>,
    /// XOR of the required take-keys; never written to the wire.
    pub key: Key,
}

/// The outer layer of an action: how its dokey is revealed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionLock {
    pub dokey: Key,
    /// Empty means no predicate: the dokey is stored directly.
    pub conjunctions: Vec<Conjunction>,
}

/// Decrypted action payload.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ActionRecord {
    pub kind: ActionKind,
    pub desc: String,
    pub files: Vec<FileLaunch>,
    pub takes: Vec<TakeEntry>,
    /// Take-key hashes of inventory items to drop here.
    pub drops: Vec<KeyHash>,
    pub destination: Option<Path>,
    pub aux: BTreeMap<String, String>,
}

impl ActionRecord {
    /// Auxiliary text by name; empty when absent.
    pub fn aux(&self, name: &str) -> &str {
        self.aux.get(name).map(String::as_str).unwrap_or("")
    }

    /// Seal under the action key, with the payload nested under the dokey.
    pub fn seal<W: Write>(&self, sink: W, key: &Key, lock: &ActionLock) -> Result<W> {
        let mut outer = SealWriter::begin(sink, key)?;
        outer.put_len(lock.conjunctions.len())?;
        if lock.conjunctions.is_empty() {
            outer.put_key(&lock.dokey)?;
        }
        for conj in &lock.conjunctions {
            outer.put_len(conj.items.len())?;
            for hash in &conj.items {
                outer.put_key_hash(hash)?;
            }
            outer.put_bytes(SealedKey::seal(&conj.key, &lock.dokey).as_bytes())?;
        }

        let mut inner = SealWriter::begin(&mut outer, &lock.dokey)?;
        inner.put_u32(self.kind.code())?;
        inner.put_str(&self.desc)?;
        inner.put_len(self.files.len())?;
        for file in &self.files {
            inner.put_key(&file.key)?;
            inner.put_bool(file.launch)?;
        }
        inner.put_len(self.takes.len())?;
        for take in &self.takes {
            inner.put_key(&take.item)?;
            inner.put_key(&take.take_key)?;
            put_path(&mut inner, &take.path)?;
        }
        inner.put_len(self.drops.len())?;
        for hash in &self.drops {
            inner.put_key_hash(hash)?;
        }
        match &self.destination {
            Some(path) => {
                inner.put_bool(true)?;
                put_path(&mut inner, path)?;
            }
            None => inner.put_bool(false)?,
        }
        inner.put_len(self.aux.len())?;
        for (name, text) in &self.aux {
            inner.put_str(name)?;
            inner.put_str(text)?;
        }
        inner.finish()?;
        outer.finish()
    }

    /// Open an action.
    ///
    /// `unlock` is asked, per conjunction in stored order, for the
    /// conjunction key given the required take-key hashes; it returns
    /// `None` unless every item is held. `Ok(None)` means no conjunction
    /// was satisfied, which callers treat exactly like a missing action.
    pub fn open<R, F>(source: R, key: &Key, mut unlock: F) -> Result<Option<Self>>
    where
        R: Read,
        F: FnMut(&[KeyHash]) -> Option<Key>,
    {
        let mut outer = SealReader::open(source, key)?;
        let conjunctions = outer.get_len()?;
        let dokey = if conjunctions == 0 {
            Some(outer.get_key()?)
        } else {
            let mut found = None;
            for _ in 0..conjunctions {
                let items = get_list(&mut outer, |r| r.get_key_hash())?;
                let sealed = SealedKey::from_bytes(outer.get_array::<SEALED_KEY_LEN>()?);
                if found.is_none() {
                    found = unlock(&items).map(|ck| sealed.open(&ck));
                }
            }
            found
        };
        let Some(dokey) = dokey else {
            return Ok(None);
        };

        let mut inner = SealReader::open(&mut outer, &dokey)?;
        let kind = ActionKind::from_code(inner.get_u32()?)?;
        let desc = inner.get_str()?;
        let files = get_list(&mut inner, |r| {
            Ok(FileLaunch {
                key: r.get_key()?,
                launch: r.get_bool()?,
            })
        })?;
        let takes = get_list(&mut inner, |r| {
            Ok(TakeEntry {
                item: r.get_key()?,
                take_key: r.get_key()?,
                path: get_path(r)?,
            })
        })?;
        let drops = get_list(&mut inner, |r| r.get_key_hash())?;
        let destination = if inner.get_bool()? {
            Some(get_path(&mut inner)?)
        } else {
            None
        };
        let mut aux = BTreeMap::new();
        for _ in 0..inner.get_len()? {
            let name = inner.get_str()?;
            let text = inner.get_str()?;
            aux.insert(name, text);
        }
        Ok(Some(Self {
            kind,
            desc,
            files,
            takes,
            drops,
            destination,
            aux,
        }))
    }
}
