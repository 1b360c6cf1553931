//! Save files.
//!
//! A save records every location the player could need again as its full
//! root-first (gid, key) chain, since a location can only be decrypted by
//! walking down from its root. Layout, all integers little-endian:
//!
//! ```text
//! magic      8 bytes  "craneasv"
//! game      20 bytes  hash of the container's initial key
//! frames     u32 n, then n chains
//! inventory  u32 n, then n held items
//! dropped    u32 n, then n (held item, chain where it lies)
//!
//! chain      u32 n, then n (u32 gid, 16-byte key)
//! held item  u32 gid, item key, take-key, chain it was taken from
//! ```
//!
//! Restoring decodes and verifies everything into a staging [`Progress`]
//! first; live state is replaced only when the whole file checks out.

use std::io::{BufRead, Read, Seek, Write};

use bytes::{Buf, BufMut, BytesMut};
use cranea_core::{hash_key, Gid, Key, KeyHash, KEY_HASH_LEN, KEY_LEN};
use tracing::{debug, warn};

use crate::error::{EngineError, Result};
use crate::navigator::{Dropped, Navigator, Progress};

/// Magic tag at the head of a save file.
pub const SAVE_MAGIC: [u8; 8] = *b"craneasv";

/// Root-first (gid, key) chain of locations.
pub type Chain = Vec<(Gid, Key)>;

/// An item in the inventory, with what is needed to decrypt it again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeldItem {
    pub gid: Gid,
    pub key: Key,
    pub take_key: Key,
    /// Where the item was first taken from.
    pub origin: Chain,
}

/// An item lying away from where it was taken.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DroppedItem {
    pub item: HeldItem,
    pub at: Chain,
}

/// Serializable play progress.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    pub frames: Vec<Chain>,
    pub inventory: Vec<HeldItem>,
    pub dropped: Vec<DroppedItem>,
}

fn put_count(buf: &mut BytesMut, n: usize) -> Result<()> {
    let n = u32::try_from(n).map_err(|_| EngineError::BadSave(format!("{n} entries")))?;
    buf.put_u32_le(n);
    Ok(())
}

fn put_chain(buf: &mut BytesMut, chain: &[(Gid, Key)]) -> Result<()> {
    put_count(buf, chain.len())?;
    for (gid, key) in chain {
        buf.put_u32_le(gid.get());
        buf.put_slice(key.as_bytes());
    }
    Ok(())
}

fn put_held(buf: &mut BytesMut, held: &HeldItem) -> Result<()> {
    buf.put_u32_le(held.gid.get());
    buf.put_slice(held.key.as_bytes());
    buf.put_slice(held.take_key.as_bytes());
    put_chain(buf, &held.origin)
}

/// Bounds-checked reads over a save body.
struct Fields<'a>(&'a [u8]);

impl Fields<'_> {
    fn need(&self, n: usize) -> Result<()> {
        if self.0.remaining() < n {
            return Err(EngineError::BadSave("truncated".into()));
        }
        Ok(())
    }

    fn u32(&mut self) -> Result<u32> {
        self.need(4)?;
        Ok(self.0.get_u32_le())
    }

    fn gid(&mut self) -> Result<Gid> {
        Ok(Gid(self.u32()?))
    }

    fn key(&mut self) -> Result<Key> {
        self.need(KEY_LEN)?;
        let mut key = [0u8; KEY_LEN];
        self.0.copy_to_slice(&mut key);
        Ok(Key::from_bytes(key))
    }

    /// A count whose entries take at least `min` bytes each.
    fn count(&mut self, min: usize) -> Result<usize> {
        let n = self.u32()? as usize;
        if n.saturating_mul(min) > self.0.remaining() {
            return Err(EngineError::BadSave(format!("count {n} exceeds file")));
        }
        Ok(n)
    }

    fn chain(&mut self) -> Result<Chain> {
        let n = self.count(4 + KEY_LEN)?;
        let mut chain = Vec::with_capacity(n);
        for _ in 0..n {
            chain.push((self.gid()?, self.key()?));
        }
        Ok(chain)
    }

    fn held(&mut self) -> Result<HeldItem> {
        Ok(HeldItem {
            gid: self.gid()?,
            key: self.key()?,
            take_key: self.key()?,
            origin: self.chain()?,
        })
    }
}

impl Snapshot {
    /// Serialize for the story identified by `game`.
    pub fn encode(&self, game: &KeyHash) -> Result<Vec<u8>> {
        let mut buf = BytesMut::with_capacity(256);
        buf.put_slice(&SAVE_MAGIC);
        buf.put_slice(game.as_bytes());
        put_count(&mut buf, self.frames.len())?;
        for frame in &self.frames {
            put_chain(&mut buf, frame)?;
        }
        put_count(&mut buf, self.inventory.len())?;
        for held in &self.inventory {
            put_held(&mut buf, held)?;
        }
        put_count(&mut buf, self.dropped.len())?;
        for dropped in &self.dropped {
            put_held(&mut buf, &dropped.item)?;
            put_chain(&mut buf, &dropped.at)?;
        }
        Ok(buf.to_vec())
    }

    /// Parse a save written for the story identified by `game`.
    pub fn decode(bytes: &[u8], game: &KeyHash) -> Result<Self> {
        let mut f = Fields(bytes);
        f.need(SAVE_MAGIC.len() + KEY_HASH_LEN)?;
        if f.0[..SAVE_MAGIC.len()] != SAVE_MAGIC {
            return Err(EngineError::BadSave("not a save file".into()));
        }
        f.0.advance(SAVE_MAGIC.len());
        if &f.0[..KEY_HASH_LEN] != game.as_bytes() {
            return Err(EngineError::BadSave("saved from another story".into()));
        }
        f.0.advance(KEY_HASH_LEN);

        let n = f.count(4)?;
        let mut frames = Vec::with_capacity(n);
        for _ in 0..n {
            frames.push(f.chain()?);
        }
        let n = f.count(4 + 2 * KEY_LEN + 4)?;
        let mut inventory = Vec::with_capacity(n);
        for _ in 0..n {
            inventory.push(f.held()?);
        }
        let n = f.count(4 + 2 * KEY_LEN + 8)?;
        let mut dropped = Vec::with_capacity(n);
        for _ in 0..n {
            dropped.push(DroppedItem {
                item: f.held()?,
                at: f.chain()?,
            });
        }
        if f.0.has_remaining() {
            return Err(EngineError::BadSave("trailing bytes".into()));
        }
        Ok(Self {
            frames,
            inventory,
            dropped,
        })
    }
}

impl<R: BufRead + Seek> Navigator<R> {
    fn held_item(&self, gid: Gid) -> Result<HeldItem> {
        let item = self.cached_item(gid)?;
        let take_key = self
            .progress
            .take_keys
            .get(&gid)
            .copied()
            .ok_or_else(|| EngineError::Corrupt(format!("no take-key for item {gid}")))?;
        let origin = self
            .progress
            .origins
            .get(&gid)
            .copied()
            .ok_or_else(|| EngineError::Corrupt(format!("no origin for item {gid}")))?;
        Ok(HeldItem {
            gid,
            key: item.key,
            take_key,
            origin: self.ancestry(origin)?,
        })
    }

    /// Capture current progress.
    pub fn snapshot(&self) -> Result<Snapshot> {
        let mut frames = Vec::with_capacity(self.progress.frames.len());
        for frame in &self.progress.frames {
            let chain = frame
                .iter()
                .map(|gid| Ok((*gid, self.cached_location(*gid)?.key)))
                .collect::<Result<Chain>>()?;
            frames.push(chain);
        }
        let inventory = self
            .progress
            .inventory
            .iter()
            .map(|gid| self.held_item(*gid))
            .collect::<Result<Vec<_>>>()?;
        let dropped = self
            .progress
            .dropped
            .iter()
            .map(|d| {
                Ok(DroppedItem {
                    item: self.held_item(d.item)?,
                    at: self.ancestry(d.at)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Snapshot {
            frames,
            inventory,
            dropped,
        })
    }

    /// Decrypt a chain from its root, checking every gid; returns the gids.
    fn walk(&mut self, chain: &[(Gid, Key)]) -> Result<Vec<Gid>> {
        let Some(((root_gid, root_key), rest)) = chain.split_first() else {
            return Err(EngineError::BadSave("empty location chain".into()));
        };
        let mut here = self.root(root_key)?;
        if here.gid != *root_gid {
            return Err(EngineError::BadSave(format!("chain root {root_gid} is location {}", here.gid)));
        }
        let mut gids = vec![here.gid];
        for (gid, key) in rest {
            here = self.child(&here, key)?;
            if here.gid != *gid {
                return Err(EngineError::BadSave(format!("chain names {gid}, key opens {}", here.gid)));
            }
            gids.push(here.gid);
        }
        Ok(gids)
    }

    fn stage_item(&mut self, staged: &mut Progress, held: &HeldItem) -> Result<()> {
        if staged.take_keys.contains_key(&held.gid) {
            return Err(EngineError::BadSave(format!("item {} saved twice", held.gid)));
        }
        if self.item_gid(&held.key) != Some(held.gid) {
            return Err(EngineError::BadSave(format!("item {} has a foreign key", held.gid)));
        }
        self.item(held.gid, &held.key)?;
        let origin = self.walk(&held.origin)?;
        staged.take_keys.insert(held.gid, held.take_key);
        if let Some(origin) = origin.last() {
            staged.origins.insert(held.gid, *origin);
        }
        Ok(())
    }

    /// Replace progress with a snapshot. On any error nothing changes.
    pub fn restore(&mut self, snapshot: &Snapshot) -> Result<()> {
        if snapshot.frames.is_empty() {
            return Err(EngineError::BadSave("no traversal frames".into()));
        }
        let mut staged = Progress::default();
        for chain in &snapshot.frames {
            let frame = self.walk(chain)?;
            staged.frames.push(frame);
        }
        for held in &snapshot.inventory {
            self.stage_item(&mut staged, held)?;
            staged.inventory.push(held.gid);
            staged.held.insert(hash_key(&held.take_key), held.gid);
        }
        for dropped in &snapshot.dropped {
            self.stage_item(&mut staged, &dropped.item)?;
            let at = self.walk(&dropped.at)?;
            if let Some(at) = at.last() {
                staged.dropped.push(Dropped {
                    item: dropped.item.gid,
                    at: *at,
                });
            }
        }

        // visits are session memory, not progress
        staged.visited = std::mem::take(&mut self.progress.visited);
        self.progress = staged;
        debug!(
            frames = self.progress.frames.len(),
            held = self.progress.inventory.len(),
            dropped = self.progress.dropped.len(),
            "progress restored"
        );
        Ok(())
    }

    /// Write a save file.
    pub fn save<W: Write>(&self, mut sink: W) -> Result<()> {
        let bytes = self.snapshot()?.encode(&self.game_hash())?;
        sink.write_all(&bytes)?;
        Ok(())
    }

    /// Read and apply a save file. On any error nothing changes.
    pub fn load<S: Read>(&mut self, mut source: S) -> Result<()> {
        let mut bytes = Vec::new();
        source.read_to_end(&mut bytes)?;
        let applied = Snapshot::decode(&bytes, &self.game_hash()).and_then(|snapshot| self.restore(&snapshot));
        if let Err(e) = &applied {
            warn!(error = %e, "restore rolled back");
        }
        applied
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::navigator::tests::open;
    use cranea_build::{BuildGraph, ItemSpec, LocationSpec};

    fn story() -> (BuildGraph, cranea_build::LocationRef, cranea_build::LocationRef) {
        let mut g = BuildGraph::new();
        let hall = g.add_location(None, LocationSpec::new("Hall")).unwrap();
        let cellar = g.add_location(Some(hall), LocationSpec::new("Cellar")).unwrap();
        g.add_item(hall, ItemSpec::new("lamp")).unwrap();
        g.add_item(hall, ItemSpec::new("rope")).unwrap();
        (g, hall, cellar)
    }

    #[test]
    fn test_save_load_reproduces_progress() {
        let (g, hall, cellar) = story();
        let mut nav = open(&g);
        let items = nav.items_here().unwrap();
        for item in &items {
            let take_key = nav.take_key(item).unwrap();
            nav.take(item, take_key).unwrap();
        }
        nav.call();
        nav.push_child(&g.key_of(cellar.gid()).unwrap()).unwrap();
        let rope_take = nav.take_key(&items[1]).unwrap();
        nav.drop_held(&hash_key(&rope_take)).unwrap();

        let mut bytes = Vec::new();
        nav.save(&mut bytes).unwrap();

        let mut fresh = open(&g);
        fresh.load(&bytes[..]).unwrap();
        assert_eq!(fresh.depth(), 2);
        assert_eq!(fresh.current_gid().unwrap(), cellar.gid());
        let held: Vec<_> = fresh.inventory().unwrap().iter().map(|i| i.title().to_string()).collect();
        assert_eq!(held, vec!["lamp"]);
        assert_eq!(fresh.dropped_at(items[1].gid), Some(cellar.gid()));
        assert_eq!(fresh.snapshot().unwrap(), nav.snapshot().unwrap());

        fresh.ret();
        assert_eq!(fresh.current_gid().unwrap(), hall.gid());
        assert!(fresh.items_here().unwrap().is_empty());
    }

    #[test]
    fn test_retake_after_load() {
        let (g, _, _) = story();
        let mut nav = open(&g);
        let lamp = nav.items_here().unwrap().remove(0);
        let take_key = nav.take_key(&lamp).unwrap();
        nav.take(&lamp, take_key).unwrap();
        nav.drop_held(&hash_key(&take_key)).unwrap();

        let mut bytes = Vec::new();
        nav.save(&mut bytes).unwrap();
        let mut fresh = open(&g);
        fresh.load(&bytes[..]).unwrap();
        assert!(fresh.retake(lamp.gid));
        assert!(fresh.holds(lamp.gid));
    }

    #[test]
    fn test_save_from_other_story_rejected() {
        let (g, _, _) = story();
        let (other, _, _) = story();
        let mut bytes = Vec::new();
        open(&g).save(&mut bytes).unwrap();

        let mut nav = open(&other);
        let err = nav.load(&bytes[..]).unwrap_err();
        assert!(matches!(err, EngineError::BadSave(_)));
    }

    #[test]
    fn test_truncated_save_rejected() {
        let (g, _, _) = story();
        let mut nav = open(&g);
        let mut bytes = Vec::new();
        nav.save(&mut bytes).unwrap();
        for len in [0, 7, 28, bytes.len() - 1] {
            assert!(matches!(nav.load(&bytes[..len]), Err(EngineError::BadSave(_))));
        }
    }

    #[test]
    fn test_failed_restore_leaves_progress() {
        let (g, _, cellar) = story();
        let mut nav = open(&g);
        nav.push_child(&g.key_of(cellar.gid()).unwrap()).unwrap();
        let before = nav.snapshot().unwrap();

        let mut bad = before.clone();
        bad.frames.push(vec![(Gid(77), Key::generate())]);
        assert!(nav.restore(&bad).is_err());
        assert_eq!(nav.snapshot().unwrap(), before);

        let mut wrong_gid = before.clone();
        wrong_gid.frames[0][1].0 = Gid(0);
        assert!(matches!(nav.restore(&wrong_gid), Err(EngineError::BadSave(_))));
        assert_eq!(nav.snapshot().unwrap(), before);
    }

    #[test]
    fn test_empty_snapshot_rejected() {
        let (g, _, _) = story();
        let mut nav = open(&g);
        assert!(matches!(nav.restore(&Snapshot::default()), Err(EngineError::BadSave(_))));
    }
}
