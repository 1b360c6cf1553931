//! Read-side traversal.
//!
//! The navigator owns the opened container and everything decrypted from
//! it. Decrypted locations, items and actions are cached by gid for the
//! rest of the session; play progress lives separately in [`Progress`] so
//! a restore can replace it wholesale without touching the caches. A
//! cached action behind a predicate is only served while the inventory
//! still holds the conjunction that unlocked it.
//!
//! Traversal is a stack of frames. Each frame is a root-first chain of
//! location gids whose last element is where the player stands. `call`
//! duplicates the top frame and `ret` discards it, so a called scene can
//! wander freely and still return to where it was entered from.

use std::collections::{HashMap, HashSet};
use std::io::{BufRead, Seek};
use std::rc::Rc;

use cranea_core::{conjunction_key, hash_key, Gid, Key, KeyHash, Path};
use cranea_seal::{ActionRecord, ActionSlot, ItemRecord, LocationRecord, SealedFile, SlotTarget, TakeEntry};
use cranea_store::{Category, Container, StoreError};
use tracing::{debug, trace};

use crate::error::{EngineError, Result};

// ─────────────────────────────────────────────────────────────────────────────
// Decrypted objects
// ─────────────────────────────────────────────────────────────────────────────

/// A decrypted location.
#[derive(Debug)]
pub struct Location {
    pub gid: Gid,
    pub key: Key,
    pub parent: Option<Gid>,
    /// Child entered automatically on arrival.
    pub start: Option<Key>,
    pub title: String,
    pub desc: String,
    /// Empty inherits from the nearest ancestor.
    pub prompt: String,
    ignored: HashSet<String>,
    children: HashMap<KeyHash, Gid>,
    actions: HashMap<KeyHash, Vec<ActionSlot>>,
    items: Vec<(Gid, Key)>,
}

impl Location {
    fn new(gid: Gid, key: Key, parent: Option<Gid>, record: LocationRecord, items: Vec<(Gid, Key)>) -> Self {
        let mut actions: HashMap<KeyHash, Vec<ActionSlot>> = HashMap::new();
        for entry in record.actions {
            actions.entry(entry.command).or_default().push(entry.slot);
        }
        Self {
            gid,
            key,
            parent,
            start: record.start,
            title: record.title,
            desc: record.desc,
            prompt: record.prompt,
            ignored: record.ignored.into_iter().collect(),
            children: record.children.into_iter().map(|c| (c.hash, c.gid)).collect(),
            actions,
            items,
        }
    }

    /// Whether this location drops `token` from commands.
    pub fn ignores(&self, token: &str) -> bool {
        self.ignored.contains(token)
    }

    /// Gid of the child whose key hashes to `hash`.
    pub fn child(&self, hash: &KeyHash) -> Option<Gid> {
        self.children.get(hash).copied()
    }

    /// Candidate slots for a command hash, in stored order.
    pub fn slots(&self, command: &KeyHash) -> &[ActionSlot] {
        self.actions.get(command).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Items placed here at build time, as (gid, key).
    pub fn initial_items(&self) -> &[(Gid, Key)] {
        &self.items
    }
}

/// A decrypted item.
#[derive(Debug)]
pub struct Item {
    pub gid: Gid,
    pub key: Key,
    pub record: ItemRecord,
}

impl Item {
    pub fn title(&self) -> &str {
        &self.record.title
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Progress
// ─────────────────────────────────────────────────────────────────────────────

/// An item lying somewhere other than where it started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Dropped {
    pub item: Gid,
    pub at: Gid,
}

/// Everything a save file captures, plus the visit record.
#[derive(Debug, Clone, Default)]
pub(crate) struct Progress {
    pub frames: Vec<Vec<Gid>>,
    pub visited: HashSet<Gid>,
    /// Held items in acquisition order.
    pub inventory: Vec<Gid>,
    /// Take-key hash to held item.
    pub held: HashMap<KeyHash, Gid>,
    /// Every take-key earned, kept after the item is dropped.
    pub take_keys: HashMap<Gid, Key>,
    /// Location each item was first taken from.
    pub origins: HashMap<Gid, Gid>,
    pub dropped: Vec<Dropped>,
}

impl Progress {
    /// Whether an item has left its build-time location.
    pub fn is_moved(&self, item: Gid) -> bool {
        self.inventory.contains(&item) || self.dropped.iter().any(|d| d.item == item)
    }

    /// Conjunction key for the given take-key hashes, if all are held.
    pub fn conjunction_key(&self, hashes: &[KeyHash]) -> Option<Key> {
        let mut keys = Vec::with_capacity(hashes.len());
        for hash in hashes {
            let gid = self.held.get(hash)?;
            keys.push(*self.take_keys.get(gid)?);
        }
        Some(conjunction_key(&keys))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Navigator
// ─────────────────────────────────────────────────────────────────────────────

/// A decrypted action and the conjunction that revealed its dokey.
struct OpenedAction {
    record: Rc<ActionRecord>,
    /// `None` for actions without a predicate.
    unlocked_by: Option<Vec<KeyHash>>,
}

/// On-demand decryption and traversal over one container.
pub struct Navigator<R> {
    container: Container<R>,
    locations: HashMap<Gid, Rc<Location>>,
    items: HashMap<Gid, Rc<Item>>,
    actions: HashMap<Gid, OpenedAction>,
    pub(crate) progress: Progress,
}

impl<R: BufRead + Seek> Navigator<R> {
    /// Start at the container's initial location.
    pub fn open(container: Container<R>) -> Result<Self> {
        let mut nav = Self {
            container,
            locations: HashMap::new(),
            items: HashMap::new(),
            actions: HashMap::new(),
            progress: Progress::default(),
        };
        let initial = *nav.container.initial_key();
        let root = nav.root(&initial)?;
        nav.progress.frames.push(vec![root.gid]);
        debug!(initial = %root.gid, title = %root.title, "navigator ready");
        Ok(nav)
    }

    pub fn container(&self) -> &Container<R> {
        &self.container
    }

    /// Identifies the story a save file belongs to.
    pub fn game_hash(&self) -> KeyHash {
        hash_key(self.container.initial_key())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Decryption
    // ─────────────────────────────────────────────────────────────────────────

    fn load_location(&mut self, gid: Gid, key: &Key, parent: Option<Gid>) -> Result<Rc<Location>> {
        if let Some(loc) = self.locations.get(&gid) {
            if loc.key != *key || loc.parent != parent {
                return Err(EngineError::Mismatch(gid));
            }
            return Ok(Rc::clone(loc));
        }

        let record = LocationRecord::open(self.container.seek_object(gid)?, key)?;
        let mut items = Vec::with_capacity(record.items.len());
        for item_key in &record.items {
            let item = self
                .container
                .gid_for(Category::Item, item_key)
                .ok_or_else(|| EngineError::Corrupt(format!("location {gid} lists an unmapped item")))?;
            items.push((item, *item_key));
        }
        trace!(%gid, title = %record.title, "decrypted location");

        let loc = Rc::new(Location::new(gid, *key, parent, record, items));
        self.locations.insert(gid, Rc::clone(&loc));
        Ok(loc)
    }

    /// Decrypt the root location `key` unlocks.
    pub fn root(&mut self, key: &Key) -> Result<Rc<Location>> {
        let gid = self
            .container
            .gid_for(Category::Location, key)
            .ok_or_else(|| EngineError::UnknownLocation(hash_key(key).to_string()))?;
        self.load_location(gid, key, None)
    }

    /// Decrypt the child of `parent` that `key` unlocks.
    pub fn child(&mut self, parent: &Location, key: &Key) -> Result<Rc<Location>> {
        let gid = parent
            .child(&hash_key(key))
            .ok_or_else(|| EngineError::UnknownLocation(hash_key(key).to_string()))?;
        self.load_location(gid, key, Some(parent.gid))
    }

    /// Decrypt an item.
    pub fn item(&mut self, gid: Gid, key: &Key) -> Result<Rc<Item>> {
        if let Some(item) = self.items.get(&gid) {
            if item.key != *key {
                return Err(EngineError::Mismatch(gid));
            }
            return Ok(Rc::clone(item));
        }
        let record = ItemRecord::open(self.container.seek_object(gid)?, key)?;
        trace!(%gid, title = %record.title, "decrypted item");
        let item = Rc::new(Item { gid, key: *key, record });
        self.items.insert(gid, Rc::clone(&item));
        Ok(item)
    }

    /// Gid an item key maps to.
    pub fn item_gid(&self, key: &Key) -> Option<Gid> {
        self.container.gid_for(Category::Item, key)
    }

    /// Decrypt the action a slot points at.
    ///
    /// `Ok(None)` when the candidate is not an object, fails the magic
    /// check, or has a predicate the inventory does not satisfy. The
    /// predicate is evaluated against the current inventory on every
    /// lookup, cached or not.
    pub fn action(&mut self, target: &SlotTarget) -> Result<Option<Rc<ActionRecord>>> {
        if let Some(opened) = self.actions.get(&target.gid) {
            let still_held = match &opened.unlocked_by {
                None => true,
                Some(hashes) => self.progress.conjunction_key(hashes).is_some(),
            };
            if still_held {
                return Ok(Some(Rc::clone(&opened.record)));
            }
        }

        let source = match self.container.seek_object(target.gid) {
            Ok(source) => source,
            Err(StoreError::UnknownGid(gid)) => {
                trace!(%gid, "candidate names no object");
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };
        let progress = &self.progress;
        let mut unlocked_by = None;
        let opened = ActionRecord::open(source, &target.key, |hashes| {
            let key = progress.conjunction_key(hashes);
            if key.is_some() {
                unlocked_by = Some(hashes.to_vec());
            }
            key
        });
        match opened {
            Ok(Some(record)) => {
                let record = Rc::new(record);
                let opened = OpenedAction {
                    record: Rc::clone(&record),
                    unlocked_by,
                };
                self.actions.insert(target.gid, opened);
                Ok(Some(record))
            }
            Ok(None) => {
                trace!(gid = %target.gid, "predicate unsatisfied");
                Ok(None)
            }
            Err(e) if e.is_wrong_key() => {
                trace!(gid = %target.gid, "candidate rejected");
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Open a file for extraction.
    pub fn open_file(&mut self, key: &Key) -> Result<SealedFile<&mut R>> {
        let gid = self
            .container
            .gid_for(Category::File, key)
            .ok_or_else(|| EngineError::Corrupt("action names an unmapped file".into()))?;
        Ok(SealedFile::open(self.container.seek_object(gid)?, key)?)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Frames
    // ─────────────────────────────────────────────────────────────────────────

    fn frame(&self) -> Result<&Vec<Gid>> {
        self.progress.frames.last().ok_or(EngineError::NoLocation)
    }

    fn frame_mut(&mut self) -> Result<&mut Vec<Gid>> {
        self.progress.frames.last_mut().ok_or(EngineError::NoLocation)
    }

    pub(crate) fn cached_location(&self, gid: Gid) -> Result<Rc<Location>> {
        self.locations
            .get(&gid)
            .cloned()
            .ok_or_else(|| EngineError::Corrupt(format!("location {gid} was never decrypted")))
    }

    pub(crate) fn cached_item(&self, gid: Gid) -> Result<Rc<Item>> {
        self.items
            .get(&gid)
            .cloned()
            .ok_or_else(|| EngineError::Corrupt(format!("item {gid} was never decrypted")))
    }

    pub fn current_gid(&self) -> Result<Gid> {
        self.frame()?.last().copied().ok_or(EngineError::NoLocation)
    }

    /// Where the player stands.
    pub fn current(&self) -> Result<Rc<Location>> {
        self.cached_location(self.current_gid()?)
    }

    /// The current location followed by its ancestors.
    pub fn chain(&self) -> Result<Vec<Rc<Location>>> {
        self.frame()?.iter().rev().map(|gid| self.cached_location(*gid)).collect()
    }

    /// Root-first (gid, key) chain of any decrypted location.
    pub fn ancestry(&self, gid: Gid) -> Result<Vec<(Gid, Key)>> {
        let mut chain = Vec::new();
        let mut cur = Some(gid);
        while let Some(gid) = cur {
            let loc = self.cached_location(gid)?;
            chain.push((gid, loc.key));
            cur = loc.parent;
        }
        chain.reverse();
        Ok(chain)
    }

    /// Number of frames on the stack.
    pub fn depth(&self) -> usize {
        self.progress.frames.len()
    }

    /// Duplicate the top frame.
    pub fn call(&mut self) {
        if let Some(top) = self.progress.frames.last().cloned() {
            self.progress.frames.push(top);
        }
    }

    /// Discard the top frame. The last frame is never discarded.
    pub fn ret(&mut self) -> bool {
        if self.progress.frames.len() > 1 {
            self.progress.frames.pop();
            true
        } else {
            false
        }
    }

    /// Step into a child of the current location.
    pub fn push_child(&mut self, key: &Key) -> Result<Rc<Location>> {
        let parent = self.current()?;
        let child = self.child(&parent, key)?;
        self.frame_mut()?.push(child.gid);
        Ok(child)
    }

    /// Unwind the top frame until `gid` is current. No-op if it is not on it.
    pub fn pop_until(&mut self, gid: Gid) {
        if let Some(frame) = self.progress.frames.last_mut() {
            if let Some(i) = frame.iter().rposition(|g| *g == gid) {
                frame.truncate(i + 1);
            }
        }
    }

    /// Move along a path relative to `owner`.
    pub fn follow_path(&mut self, owner: Gid, path: &Path) -> Result<()> {
        self.pop_until(owner);
        {
            let frame = self.frame_mut()?;
            let keep = frame.len().saturating_sub(path.levels_up as usize);
            frame.truncate(keep);
        }
        for key in &path.down {
            let top = self.frame()?.last().copied();
            let next = match top {
                Some(gid) => {
                    let parent = self.cached_location(gid)?;
                    self.child(&parent, key)?
                }
                None => self.root(key)?,
            };
            self.frame_mut()?.push(next.gid);
        }
        if self.frame()?.is_empty() {
            return Err(EngineError::Corrupt("path leaves no current location".into()));
        }
        Ok(())
    }

    /// Record a visit; true the first time.
    pub fn mark_visited(&mut self, gid: Gid) -> bool {
        self.progress.visited.insert(gid)
    }

    /// Prompt of the nearest location on the chain that sets one.
    pub fn prompt(&self) -> Result<String> {
        Ok(self
            .chain()?
            .iter()
            .find(|l| !l.prompt.is_empty())
            .map(|l| l.prompt.clone())
            .unwrap_or_default())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Items
    // ─────────────────────────────────────────────────────────────────────────

    /// Items lying at `location` now.
    pub fn items_at(&mut self, location: &Location) -> Result<Vec<Rc<Item>>> {
        let mut out = Vec::new();
        for (gid, key) in &location.items {
            if !self.progress.is_moved(*gid) {
                out.push(self.item(*gid, key)?);
            }
        }
        for dropped in &self.progress.dropped {
            if dropped.at == location.gid {
                out.push(self.cached_item(dropped.item)?);
            }
        }
        Ok(out)
    }

    pub fn items_here(&mut self) -> Result<Vec<Rc<Item>>> {
        let here = self.current()?;
        self.items_at(&here)
    }

    /// Held items in acquisition order.
    pub fn inventory(&self) -> Result<Vec<Rc<Item>>> {
        self.progress.inventory.iter().map(|gid| self.cached_item(*gid)).collect()
    }

    pub fn holds(&self, item: Gid) -> bool {
        self.progress.inventory.contains(&item)
    }

    /// Where a dropped item lies.
    pub fn dropped_at(&self, item: Gid) -> Option<Gid> {
        self.progress.dropped.iter().find(|d| d.item == item).map(|d| d.at)
    }

    /// The item's take-key, if stored openly or earned earlier.
    pub fn take_key(&self, item: &Item) -> Option<Key> {
        item.record
            .take_key
            .or_else(|| self.progress.take_keys.get(&item.gid).copied())
    }

    /// Conjunction key for the given take-key hashes, if all are held.
    pub fn conjunction_for(&self, hashes: &[KeyHash]) -> Option<Key> {
        self.progress.conjunction_key(hashes)
    }

    fn acquire(&mut self, item: &Item, take_key: Key, origin: Gid) {
        let p = &mut self.progress;
        p.inventory.push(item.gid);
        p.held.insert(hash_key(&take_key), item.gid);
        p.take_keys.insert(item.gid, take_key);
        p.origins.entry(item.gid).or_insert(origin);
        debug!(item = %item.gid, title = %item.record.title, "taken");
    }

    /// Put a dropped item back in the inventory. The drop record carries
    /// the right to hold it, so nothing is re-checked.
    pub fn retake(&mut self, item: Gid) -> bool {
        let Some(i) = self.progress.dropped.iter().position(|d| d.item == item) else {
            return false;
        };
        let Some(take_key) = self.progress.take_keys.get(&item).copied() else {
            return false;
        };
        self.progress.dropped.remove(i);
        self.progress.inventory.push(item);
        self.progress.held.insert(hash_key(&take_key), item);
        debug!(%item, "retaken");
        true
    }

    /// Take an item lying at the current location.
    pub fn take(&mut self, item: &Item, take_key: Key) -> Result<()> {
        if self.holds(item.gid) || self.retake(item.gid) {
            return Ok(());
        }
        let origin = self.current_gid()?;
        self.acquire(item, take_key, origin);
        Ok(())
    }

    /// Apply one take-list entry of an action owned by `owner`.
    ///
    /// A dropped item is retaken wherever it lies. Otherwise the item must
    /// still be at the location the entry's path leads to.
    pub fn take_entry(&mut self, owner: Gid, entry: &TakeEntry) -> Result<bool> {
        let gid = self
            .item_gid(&entry.item)
            .ok_or_else(|| EngineError::Corrupt("take-list names an unmapped item".into()))?;
        if self.holds(gid) {
            return Ok(false);
        }
        if self.retake(gid) {
            return Ok(true);
        }

        self.call();
        let found = self.follow_path(owner, &entry.path).and_then(|()| self.current());
        self.ret();
        let origin = found?;

        let lying = origin.items.iter().any(|(g, _)| *g == gid) && !self.progress.is_moved(gid);
        if !lying {
            return Ok(false);
        }
        let item = self.item(gid, &entry.item)?;
        self.acquire(&item, entry.take_key, origin.gid);
        Ok(true)
    }

    /// Drop the held item with this take-key hash at the current location.
    pub fn drop_held(&mut self, take_hash: &KeyHash) -> Result<bool> {
        let at = self.current_gid()?;
        let Some(item) = self.progress.held.remove(take_hash) else {
            return Ok(false);
        };
        self.progress.inventory.retain(|g| *g != item);
        self.progress.dropped.push(Dropped { item, at });
        debug!(%item, location = %at, "dropped");
        Ok(true)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use cranea_build::{ActionSpec, BuildGraph, ItemRef, ItemSpec, LocationRef, LocationSpec};
    use cranea_core::ActionKind;
    use std::io::Cursor;

    pub(crate) type MemNavigator = Navigator<Cursor<Vec<u8>>>;

    pub(crate) fn open(graph: &BuildGraph) -> MemNavigator {
        Navigator::open(Container::from_bytes(graph.to_bytes().unwrap()).unwrap()).unwrap()
    }

    struct House {
        graph: BuildGraph,
        hall: LocationRef,
        attic: LocationRef,
        chest: LocationRef,
        yard: LocationRef,
        lamp: ItemRef,
        coin: ItemRef,
    }

    fn house() -> House {
        let mut graph = BuildGraph::new();
        let hall = graph.add_location(None, LocationSpec::new("Hall").prompt("> ")).unwrap();
        let attic = graph.add_location(Some(hall), LocationSpec::new("Attic")).unwrap();
        let chest = graph.add_location(Some(attic), LocationSpec::new("Chest").prompt("chest> ")).unwrap();
        let yard = graph.add_location(None, LocationSpec::new("Yard")).unwrap();
        let lamp = graph.add_item(hall, ItemSpec::new("lamp")).unwrap();
        let coin = graph.add_item(chest, ItemSpec::new("coin").restricted()).unwrap();
        graph
            .add_action(hall, ActionSpec::new(ActionKind::Default).command("loot chest").takes(coin))
            .unwrap();
        House {
            graph,
            hall,
            attic,
            chest,
            yard,
            lamp,
            coin,
        }
    }

    fn key(g: &BuildGraph, l: LocationRef) -> Key {
        g.key_of(l.gid()).unwrap()
    }

    #[test]
    fn test_open_starts_at_initial() {
        let h = house();
        let nav = open(&h.graph);
        assert_eq!(nav.current_gid().unwrap(), h.hall.gid());
        assert_eq!(nav.current().unwrap().title, "Hall");
        assert_eq!(nav.depth(), 1);
        assert_eq!(nav.game_hash(), hash_key(&key(&h.graph, h.hall)));
    }

    #[test]
    fn test_push_child_and_chain() {
        let h = house();
        let mut nav = open(&h.graph);
        nav.push_child(&key(&h.graph, h.attic)).unwrap();
        nav.push_child(&key(&h.graph, h.chest)).unwrap();

        let titles: Vec<_> = nav.chain().unwrap().iter().map(|l| l.title.clone()).collect();
        assert_eq!(titles, vec!["Chest", "Attic", "Hall"]);
        assert_eq!(
            nav.ancestry(h.chest.gid()).unwrap(),
            vec![
                (h.hall.gid(), key(&h.graph, h.hall)),
                (h.attic.gid(), key(&h.graph, h.attic)),
                (h.chest.gid(), key(&h.graph, h.chest)),
            ]
        );
    }

    #[test]
    fn test_unknown_child_key() {
        let h = house();
        let mut nav = open(&h.graph);
        // the yard is a root, not a child of the hall
        let err = nav.push_child(&key(&h.graph, h.yard)).unwrap_err();
        assert!(matches!(err, EngineError::UnknownLocation(_)));
        assert_eq!(nav.current_gid().unwrap(), h.hall.gid());
    }

    #[test]
    fn test_call_and_ret() {
        let h = house();
        let mut nav = open(&h.graph);
        assert!(!nav.ret());

        nav.call();
        nav.push_child(&key(&h.graph, h.attic)).unwrap();
        assert_eq!(nav.depth(), 2);
        assert!(nav.ret());
        assert_eq!(nav.current_gid().unwrap(), h.hall.gid());
    }

    #[test]
    fn test_follow_path_across_roots() {
        let h = house();
        let mut nav = open(&h.graph);
        nav.push_child(&key(&h.graph, h.attic)).unwrap();

        let to_yard = Path {
            levels_up: 2,
            down: vec![key(&h.graph, h.yard)],
        };
        nav.follow_path(h.attic.gid(), &to_yard).unwrap();
        assert_eq!(nav.current_gid().unwrap(), h.yard.gid());
        assert_eq!(nav.chain().unwrap().len(), 1);
    }

    #[test]
    fn test_follow_path_pops_to_owner() {
        let h = house();
        let mut nav = open(&h.graph);
        nav.push_child(&key(&h.graph, h.attic)).unwrap();
        nav.push_child(&key(&h.graph, h.chest)).unwrap();

        // an action owned by the hall, fired from the chest
        nav.follow_path(h.hall.gid(), &Path::here()).unwrap();
        assert_eq!(nav.current_gid().unwrap(), h.hall.gid());
    }

    #[test]
    fn test_prompt_inherits() {
        let h = house();
        let mut nav = open(&h.graph);
        nav.push_child(&key(&h.graph, h.attic)).unwrap();
        assert_eq!(nav.prompt().unwrap(), "> ");
        nav.push_child(&key(&h.graph, h.chest)).unwrap();
        assert_eq!(nav.prompt().unwrap(), "chest> ");
    }

    #[test]
    fn test_take_drop_retake() {
        let h = house();
        let mut nav = open(&h.graph);
        let lamp = nav.items_here().unwrap().pop().unwrap();
        assert_eq!(lamp.gid, h.lamp.gid());

        let take_key = nav.take_key(&lamp).unwrap();
        nav.take(&lamp, take_key).unwrap();
        assert!(nav.holds(lamp.gid));
        assert!(nav.items_here().unwrap().is_empty());

        nav.push_child(&key(&h.graph, h.attic)).unwrap();
        assert!(nav.drop_held(&hash_key(&take_key)).unwrap());
        assert!(!nav.holds(lamp.gid));
        assert_eq!(nav.dropped_at(lamp.gid), Some(h.attic.gid()));
        assert_eq!(nav.items_here().unwrap().len(), 1);
        assert!(!nav.drop_held(&hash_key(&take_key)).unwrap());

        assert!(nav.retake(lamp.gid));
        assert!(nav.holds(lamp.gid));
        assert_eq!(nav.dropped_at(lamp.gid), None);
        assert_eq!(nav.progress.origins[&lamp.gid], h.hall.gid());
    }

    #[test]
    fn test_take_entry_reaches_restricted_item() {
        let h = house();
        let mut nav = open(&h.graph);
        let entry = TakeEntry {
            item: h.graph.key_of(h.coin.gid()).unwrap(),
            take_key: h.graph.take_key_of(h.coin).unwrap(),
            path: Path {
                levels_up: 0,
                down: vec![key(&h.graph, h.attic), key(&h.graph, h.chest)],
            },
        };

        assert!(nav.take_entry(h.hall.gid(), &entry).unwrap());
        assert!(nav.holds(h.coin.gid()));
        // the temporary frame is gone
        assert_eq!(nav.depth(), 1);
        assert_eq!(nav.current_gid().unwrap(), h.hall.gid());
        assert_eq!(nav.progress.origins[&h.coin.gid()], h.chest.gid());

        // already held
        assert!(!nav.take_entry(h.hall.gid(), &entry).unwrap());
    }

    #[test]
    fn test_restricted_take_key_hidden_until_earned() {
        let h = house();
        let mut nav = open(&h.graph);
        nav.push_child(&key(&h.graph, h.attic)).unwrap();
        nav.push_child(&key(&h.graph, h.chest)).unwrap();
        let coin = nav.items_here().unwrap().pop().unwrap();
        assert_eq!(nav.take_key(&coin), None);
    }

    #[test]
    fn test_conjunction_for_requires_all() {
        let h = house();
        let mut nav = open(&h.graph);
        let lamp = nav.items_here().unwrap().pop().unwrap();
        let take_key = nav.take_key(&lamp).unwrap();
        let coin_hash = hash_key(&h.graph.take_key_of(h.coin).unwrap());

        assert_eq!(nav.conjunction_for(&[hash_key(&take_key)]), None);
        nav.take(&lamp, take_key).unwrap();
        assert_eq!(nav.conjunction_for(&[hash_key(&take_key)]), Some(take_key));
        assert_eq!(nav.conjunction_for(&[hash_key(&take_key), coin_hash]), None);
    }

    #[test]
    fn test_action_with_unknown_gid_is_none() {
        let h = house();
        let mut nav = open(&h.graph);
        let target = SlotTarget {
            gid: Gid(999),
            key: Key::generate(),
            exact: false,
        };
        assert!(nav.action(&target).unwrap().is_none());
    }

    #[test]
    fn test_action_with_wrong_key_is_none() {
        let h = house();
        let mut nav = open(&h.graph);
        let target = SlotTarget {
            gid: h.lamp.gid(),
            key: Key::generate(),
            exact: false,
        };
        assert!(nav.action(&target).unwrap().is_none());
    }

    #[test]
    fn test_gated_action_follows_inventory() {
        let mut graph = BuildGraph::new();
        let hall = graph.add_location(None, LocationSpec::new("Hall")).unwrap();
        let lamp = graph.add_item(hall, ItemSpec::new("lamp")).unwrap();
        graph
            .add_action(hall, ActionSpec::new(ActionKind::Default).command("light").requires([lamp]))
            .unwrap();
        let mut nav = open(&graph);
        let mut empty_handed = Vec::new();
        nav.save(&mut empty_handed).unwrap();
        assert!(nav.resolve("light").unwrap().is_none());

        let item = nav.items_here().unwrap().pop().unwrap();
        let take_key = nav.take_key(&item).unwrap();
        nav.take(&item, take_key).unwrap();
        assert!(nav.resolve("light").unwrap().is_some());

        assert!(nav.drop_held(&hash_key(&take_key)).unwrap());
        assert!(nav.resolve("light").unwrap().is_none());

        assert!(nav.retake(item.gid));
        assert!(nav.resolve("light").unwrap().is_some());

        nav.load(empty_handed.as_slice()).unwrap();
        assert!(!nav.holds(item.gid));
        assert!(nav.resolve("light").unwrap().is_none());
    }
}
