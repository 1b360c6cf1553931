//! Validation and depth-first emission into a container.

use std::collections::BTreeSet;
use std::fs::File;
use std::io::{BufWriter, Cursor, Seek, Write};
use std::path::Path as FsPath;

use cranea_core::{command_key, conjunction_key, hash_key, title_hash, Gid, Hook, Key, Path};
use cranea_seal::{
    ActionEntry, ActionLock, ActionRecord, ActionSlot, ChildEntry, Conjunction, FileLaunch,
    ItemRecord, LocationRecord, SlotTarget, TakeEntry,
};
use cranea_store::{Category, ContainerWriter};
use tracing::{debug, trace, warn};

use crate::error::{BuildError, Result};
use crate::graph::{ActionRef, BuildGraph, FileRef, ItemRef, LocationRef, NodeBody};

impl BuildGraph {
    /// Check structural rules that emission relies on.
    pub fn validate(&self) -> Result<()> {
        if self.config.prefix.as_bytes().contains(&0) {
            return Err(BuildError::NulInPrefix);
        }
        let initial = self.initial().ok_or(BuildError::NoLocations)?;
        if self.location(initial)?.parent.is_some() {
            return Err(BuildError::InitialNotRoot(initial.gid()));
        }

        for (i, node) in self.nodes.iter().enumerate() {
            let gid = Gid(i as u32);
            match &node.body {
                NodeBody::Location(loc) => {
                    if let Some(start) = loc.start {
                        if !loc.children.contains(&start) {
                            return Err(BuildError::StartNotChild {
                                location: gid,
                                start: start.gid(),
                            });
                        }
                    }
                }
                NodeBody::Action(action) => {
                    if action.spec.commands.is_empty() && action.spec.hooks.is_empty() {
                        return Err(BuildError::UnreachableAction(gid));
                    }
                    for item in action.spec.predicate.iter().flatten() {
                        self.item(*item)?;
                    }
                    for item in action.spec.takes.iter().chain(&action.spec.drops) {
                        self.item(*item)?;
                    }
                    for (file, _) in &action.spec.files {
                        self.file(*file)?;
                    }
                    if let Some(dest) = action.spec.destination {
                        self.location(dest)?;
                    }
                }
                NodeBody::Item(_) | NodeBody::File(_) => {}
            }
        }
        Ok(())
    }

    /// Emit the whole story into `sink`.
    pub fn write_to<W: Write + Seek>(&self, sink: W) -> Result<W> {
        self.validate()?;
        let initial = self.initial().ok_or(BuildError::NoLocations)?;

        let mut emitter = Emitter {
            graph: self,
            out: ContainerWriter::new(sink, &self.config.prefix)?,
        };
        for root in self.roots() {
            emitter.out.map(Category::Location, &self.key_of(root.gid())?, root.gid());
            emitter.location(root)?;
        }
        for (i, node) in self.nodes.iter().enumerate() {
            let gid = Gid(i as u32);
            match &node.body {
                NodeBody::Item(_) => emitter.out.map(Category::Item, &self.key_of(gid)?, gid),
                NodeBody::File(_) => {
                    emitter.out.map(Category::File, &self.key_of(gid)?, gid);
                    // files no action extracts are still carried
                    emitter.file(FileRef(gid))?;
                }
                _ => {}
            }
        }

        debug!(nodes = self.nodes.len(), initial = %initial.gid(), "story emitted");
        Ok(emitter.out.finish(&self.key_of(initial.gid())?)?)
    }

    /// Emit into memory.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(self.write_to(Cursor::new(Vec::new()))?.into_inner())
    }

    /// Emit into a new file at `path`.
    pub fn write_to_path(&self, path: impl AsRef<FsPath>) -> Result<()> {
        let file = File::create(path.as_ref())?;
        let mut out = self.write_to(BufWriter::new(file))?;
        out.flush()?;
        Ok(())
    }

    /// Route from `from` to `to` through their lowest common ancestor.
    pub(crate) fn path(&self, from: LocationRef, to: LocationRef) -> Result<Path> {
        let up = self.ancestors(from)?;
        let down = self.ancestors(to)?;
        let (levels_up, below) = match up.iter().position(|l| down.contains(l)) {
            Some(i) => {
                let common = up[i];
                let j = down.iter().position(|l| *l == common).unwrap_or(down.len());
                (i, &down[..j])
            }
            None => (up.len(), &down[..]),
        };
        let down = below
            .iter()
            .rev()
            .map(|l| self.key_of(l.gid()))
            .collect::<Result<Vec<Key>>>()?;
        Ok(Path {
            levels_up: levels_up as u32,
            down,
        })
    }
}

struct Emitter<'g, W: Write + Seek> {
    graph: &'g BuildGraph,
    out: ContainerWriter<W>,
}

impl<'g, W: Write + Seek> Emitter<'g, W> {
    fn location(&mut self, r: LocationRef) -> Result<()> {
        if self.out.is_recorded(r.gid()) {
            return Ok(());
        }
        let g = self.graph;
        let loc = g.location(r)?;

        let mut record = LocationRecord {
            start: loc.start.map(|s| g.key_of(s.gid())).transpose()?,
            title: loc.spec.title.clone(),
            desc: loc.spec.desc.clone(),
            prompt: loc.spec.prompt.clone(),
            ignored: loc.scope.ignored.iter().cloned().collect(),
            ..Default::default()
        };
        for child in &loc.children {
            record.children.push(ChildEntry {
                hash: hash_key(&g.key_of(child.gid())?),
                gid: child.gid(),
            });
        }
        for item in &loc.items {
            record.items.push(g.key_of(item.gid())?);
        }
        for action in &loc.actions {
            self.slots(*action, &mut record.actions)?;
        }

        let key = g.key_of(r.gid())?;
        record.seal(self.out.begin_object(r.gid())?, &key)?;
        trace!(gid = %r.gid(), title = %loc.spec.title, "sealed location");

        for child in &loc.children {
            self.location(*child)?;
        }
        for item in &loc.items {
            self.item(*item)?;
        }
        for action in &loc.actions {
            self.action(*action)?;
        }
        Ok(())
    }

    /// Action-table entries for every command spelling and hook.
    fn slots(&self, r: ActionRef, entries: &mut Vec<ActionEntry>) -> Result<()> {
        let g = self.graph;
        let action = g.action(r)?;
        let target = SlotTarget {
            gid: r.gid(),
            key: g.key_of(r.gid())?,
            exact: action.spec.exact,
        };

        let mut spellings = BTreeSet::new();
        for command in &action.spec.commands {
            spellings.extend(g.spellings(action.owner, command)?);
        }
        let mut keys: Vec<Key> = spellings.iter().map(|s| command_key(s)).collect();
        keys.extend(action.spec.hooks.iter().map(|h: &Hook| h.key()));

        for ck in keys {
            entries.push(ActionEntry {
                command: hash_key(&ck),
                slot: ActionSlot::seal(&ck, &target),
            });
        }
        Ok(())
    }

    fn item(&mut self, r: ItemRef) -> Result<()> {
        if self.out.is_recorded(r.gid()) {
            return Ok(());
        }
        let g = self.graph;
        let item = g.item(r)?;

        let mut hashes = Vec::new();
        for title in std::iter::once(&item.spec.title).chain(&item.spec.aliases) {
            for spelling in g.spellings(item.home, title)? {
                let hash = title_hash(&spelling);
                if !hashes.contains(&hash) {
                    hashes.push(hash);
                }
            }
        }
        let record = ItemRecord {
            visible: item.spec.visible,
            title: item.spec.title.clone(),
            title_hashes: hashes,
            desc: item.spec.desc.clone(),
            take_key: if item.spec.restrict_take {
                None
            } else {
                Some(g.take_key_of(r)?)
            },
        };
        record.seal(self.out.begin_object(r.gid())?, &g.key_of(r.gid())?)?;
        trace!(gid = %r.gid(), title = %item.spec.title, "sealed item");
        Ok(())
    }

    fn action(&mut self, r: ActionRef) -> Result<()> {
        if self.out.is_recorded(r.gid()) {
            return Ok(());
        }
        let g = self.graph;
        let action = g.action(r)?;
        let spec = &action.spec;

        let mut conjunctions = Vec::with_capacity(spec.predicate.len());
        for conj in &spec.predicate {
            let mut seen = BTreeSet::new();
            if !conj.iter().all(|i| seen.insert(*i)) {
                warn!(action = %r.gid(), "item listed twice in one conjunction; its take-key cancels out");
            }
            let take_keys = conj
                .iter()
                .map(|i| g.take_key_of(*i))
                .collect::<Result<Vec<Key>>>()?;
            conjunctions.push(Conjunction {
                items: take_keys.iter().map(hash_key).collect(),
                key: conjunction_key(&take_keys),
            });
        }
        let lock = ActionLock {
            dokey: g.dokey_of(r)?,
            conjunctions,
        };

        let mut record = ActionRecord {
            kind: spec.kind,
            desc: spec.desc.clone(),
            destination: spec.destination.map(|d| g.path(action.owner, d)).transpose()?,
            aux: spec.aux.clone(),
            ..Default::default()
        };
        for (file, launch) in &spec.files {
            record.files.push(FileLaunch {
                key: g.key_of(file.gid())?,
                launch: *launch,
            });
        }
        for item in &spec.takes {
            record.takes.push(TakeEntry {
                item: g.key_of(item.gid())?,
                take_key: g.take_key_of(*item)?,
                path: g.path(action.owner, g.item(*item)?.home)?,
            });
        }
        for item in &spec.drops {
            record.drops.push(hash_key(&g.take_key_of(*item)?));
        }

        record.seal(self.out.begin_object(r.gid())?, &g.key_of(r.gid())?, &lock)?;
        trace!(gid = %r.gid(), kind = ?spec.kind, "sealed action");

        for (file, _) in &spec.files {
            self.file(*file)?;
        }
        Ok(())
    }

    fn file(&mut self, r: FileRef) -> Result<()> {
        if self.out.is_recorded(r.gid()) {
            return Ok(());
        }
        let g = self.graph;
        g.file(r)?.seal(self.out.begin_object(r.gid())?, &g.key_of(r.gid())?)?;
        trace!(gid = %r.gid(), "sealed file");
        Ok(())
    }
}
