//! The authored story arena.

use std::cell::OnceCell;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use bytes::Bytes;
use cranea_core::{join, tokenize, ActionKind, Gid, Hook, Key};
use cranea_seal::FileRecord;

use crate::config::BuildConfig;
use crate::error::{BuildError, Result};
use crate::synonyms::{self, SynonymGroup};

// ─────────────────────────────────────────────────────────────────────────────
// Handles
// ─────────────────────────────────────────────────────────────────────────────

macro_rules! node_ref {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub(crate) Gid);

        impl $name {
            /// The node's gid.
            pub const fn gid(self) -> Gid {
                self.0
            }
        }
    };
}

node_ref!(
    /// Handle to a location node.
    LocationRef
);
node_ref!(
    /// Handle to an item node.
    ItemRef
);
node_ref!(
    /// Handle to an action node.
    ActionRef
);
node_ref!(
    /// Handle to a file node.
    FileRef
);

// ─────────────────────────────────────────────────────────────────────────────
// Authored content
// ─────────────────────────────────────────────────────────────────────────────

/// Text of a location.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocationSpec {
    pub title: String,
    pub desc: String,
    /// Empty inherits the parent's prompt at run time.
    pub prompt: String,
}

impl LocationSpec {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn desc(mut self, desc: impl Into<String>) -> Self {
        self.desc = desc.into();
        self
    }

    pub fn prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = prompt.into();
        self
    }
}

/// Content of an item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemSpec {
    /// Shown in listings; an untitled item is never listed.
    pub title: String,
    /// Further names the item answers to.
    pub aliases: Vec<String>,
    pub desc: String,
    pub visible: bool,
    /// Only obtainable through an action's take-list.
    pub restrict_take: bool,
}

impl ItemSpec {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            aliases: Vec::new(),
            desc: String::new(),
            visible: true,
            restrict_take: false,
        }
    }

    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    pub fn desc(mut self, desc: impl Into<String>) -> Self {
        self.desc = desc.into();
        self
    }

    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    pub fn restricted(mut self) -> Self {
        self.restrict_take = true;
        self
    }
}

/// Content and wiring of an action.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionSpec {
    pub kind: ActionKind,
    /// Command phrasings, normalized and synonym-expanded at emission.
    pub commands: Vec<String>,
    pub hooks: Vec<Hook>,
    /// Only matches when the player's whole input is the command.
    pub exact: bool,
    pub desc: String,
    /// OR of AND-conjunctions. Empty means unconditional.
    pub predicate: Vec<Vec<ItemRef>>,
    pub takes: Vec<ItemRef>,
    pub drops: Vec<ItemRef>,
    pub destination: Option<LocationRef>,
    /// Files to extract, and whether to launch each.
    pub files: Vec<(FileRef, bool)>,
    pub aux: BTreeMap<String, String>,
}

impl ActionSpec {
    pub fn new(kind: ActionKind) -> Self {
        Self {
            kind,
            ..Default::default()
        }
    }

    pub fn command(mut self, command: impl Into<String>) -> Self {
        self.commands.push(command.into());
        self
    }

    pub fn on(mut self, hook: Hook) -> Self {
        self.hooks.push(hook);
        self
    }

    pub fn exact(mut self) -> Self {
        self.exact = true;
        self
    }

    pub fn desc(mut self, desc: impl Into<String>) -> Self {
        self.desc = desc.into();
        self
    }

    /// Add one conjunction to the predicate.
    pub fn requires(mut self, items: impl IntoIterator<Item = ItemRef>) -> Self {
        self.predicate.push(items.into_iter().collect());
        self
    }

    pub fn takes(mut self, item: ItemRef) -> Self {
        self.takes.push(item);
        self
    }

    pub fn drops(mut self, item: ItemRef) -> Self {
        self.drops.push(item);
        self
    }

    pub fn goes_to(mut self, location: LocationRef) -> Self {
        self.destination = Some(location);
        self
    }

    pub fn extracts(mut self, file: FileRef, launch: bool) -> Self {
        self.files.push((file, launch));
        self
    }

    pub fn aux(mut self, name: impl Into<String>, text: impl Into<String>) -> Self {
        self.aux.insert(name.into(), text.into());
        self
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Nodes
// ─────────────────────────────────────────────────────────────────────────────

/// Tokenization context a location contributes to itself and descendants.
#[derive(Debug, Default)]
pub(crate) struct Scope {
    pub ignored: BTreeSet<String>,
    pub synonyms: Vec<SynonymGroup>,
}

#[derive(Debug)]
pub(crate) struct LocationNode {
    pub parent: Option<LocationRef>,
    pub start: Option<LocationRef>,
    pub spec: LocationSpec,
    pub scope: Scope,
    pub children: Vec<LocationRef>,
    pub items: Vec<ItemRef>,
    pub actions: Vec<ActionRef>,
}

#[derive(Debug)]
pub(crate) struct ItemNode {
    pub home: LocationRef,
    pub spec: ItemSpec,
    pub take_key: OnceCell<Key>,
}

#[derive(Debug)]
pub(crate) struct ActionNode {
    pub owner: LocationRef,
    pub spec: ActionSpec,
    pub dokey: OnceCell<Key>,
}

#[derive(Debug)]
pub(crate) enum NodeBody {
    Location(LocationNode),
    Item(ItemNode),
    Action(ActionNode),
    File(FileRecord),
}

/// The capability every sealed node shares: a gid and a lazily made key.
#[derive(Debug)]
pub(crate) struct Node {
    pub key: OnceCell<Key>,
    pub body: NodeBody,
}

// ─────────────────────────────────────────────────────────────────────────────
// Graph
// ─────────────────────────────────────────────────────────────────────────────

/// An authored story, ready to emit.
#[derive(Debug, Default)]
pub struct BuildGraph {
    pub(crate) nodes: Vec<Node>,
    pub(crate) initial: Option<LocationRef>,
    pub(crate) config: BuildConfig,
}

impl BuildGraph {
    /// Create an empty graph with the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty graph.
    pub fn with_config(config: BuildConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    /// Number of nodes, which is also the next gid.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn push(&mut self, body: NodeBody) -> Result<Gid> {
        let gid = u32::try_from(self.nodes.len()).map_err(|_| BuildError::TooManyNodes)?;
        self.nodes.push(Node {
            key: OnceCell::new(),
            body,
        });
        Ok(Gid(gid))
    }

    /// Add a location under `parent`, or a root location.
    pub fn add_location(&mut self, parent: Option<LocationRef>, spec: LocationSpec) -> Result<LocationRef> {
        if let Some(parent) = parent {
            self.location(parent)?;
        }
        let loc = LocationRef(self.push(NodeBody::Location(LocationNode {
            parent,
            start: None,
            spec,
            scope: Scope::default(),
            children: Vec::new(),
            items: Vec::new(),
            actions: Vec::new(),
        }))?);
        if let Some(parent) = parent {
            self.location_mut(parent)?.children.push(loc);
        }
        Ok(loc)
    }

    /// Make entering `location` descend straight into `child`.
    pub fn set_start(&mut self, location: LocationRef, child: LocationRef) -> Result<()> {
        self.location(child)?;
        self.location_mut(location)?.start = Some(child);
        Ok(())
    }

    /// Location play begins in. Defaults to the first root location.
    pub fn set_initial(&mut self, location: LocationRef) -> Result<()> {
        self.location(location)?;
        self.initial = Some(location);
        Ok(())
    }

    /// Words dropped from commands typed here or in any descendant.
    pub fn add_ignored<I, S>(&mut self, location: LocationRef, words: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let scope = &mut self.location_mut(location)?.scope;
        for word in words {
            for token in tokenize(word.as_ref(), |_| false) {
                scope.ignored.insert(token);
            }
        }
        Ok(())
    }

    /// Interchangeable phrases for commands and titles here and below.
    pub fn add_synonyms<I, S>(&mut self, location: LocationRef, phrases: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let group: SynonymGroup = phrases
            .into_iter()
            .map(|p| tokenize(p.as_ref(), |_| false))
            .filter(|p| !p.is_empty())
            .collect();
        if group.len() > 1 {
            self.location_mut(location)?.scope.synonyms.push(group);
        }
        Ok(())
    }

    /// Add an item lying at `location`.
    pub fn add_item(&mut self, location: LocationRef, spec: ItemSpec) -> Result<ItemRef> {
        self.location(location)?;
        let item = ItemRef(self.push(NodeBody::Item(ItemNode {
            home: location,
            spec,
            take_key: OnceCell::new(),
        }))?);
        self.location_mut(location)?.items.push(item);
        Ok(item)
    }

    /// Add an action owned by `location`.
    pub fn add_action(&mut self, location: LocationRef, spec: ActionSpec) -> Result<ActionRef> {
        self.location(location)?;
        let action = ActionRef(self.push(NodeBody::Action(ActionNode {
            owner: location,
            spec,
            dokey: OnceCell::new(),
        }))?);
        self.location_mut(location)?.actions.push(action);
        Ok(action)
    }

    /// Add a file with its payload.
    pub fn add_file(&mut self, dest: impl Into<String>, payload: impl Into<Bytes>) -> Result<FileRef> {
        Ok(FileRef(self.push(NodeBody::File(FileRecord {
            dest: dest.into(),
            payload: payload.into(),
        }))?))
    }

    /// Add a file, reading its payload from disk.
    pub fn add_file_from_path(&mut self, dest: impl Into<String>, source: impl AsRef<Path>) -> Result<FileRef> {
        let payload = std::fs::read(source.as_ref())?;
        self.add_file(dest, payload)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Keys
    // ─────────────────────────────────────────────────────────────────────────

    fn node(&self, gid: Gid) -> Result<&Node> {
        self.nodes.get(gid.index()).ok_or(BuildError::UnknownNode(gid))
    }

    /// The node's key, generated on first call.
    pub fn key_of(&self, gid: Gid) -> Result<Key> {
        Ok(*self.node(gid)?.key.get_or_init(Key::generate))
    }

    /// The item's take-key, generated on first call.
    pub fn take_key_of(&self, item: ItemRef) -> Result<Key> {
        Ok(*self.item(item)?.take_key.get_or_init(Key::generate))
    }

    pub(crate) fn dokey_of(&self, action: ActionRef) -> Result<Key> {
        Ok(*self.action(action)?.dokey.get_or_init(Key::generate))
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Typed access
    // ─────────────────────────────────────────────────────────────────────────

    pub(crate) fn location(&self, r: LocationRef) -> Result<&LocationNode> {
        match &self.node(r.0)?.body {
            NodeBody::Location(l) => Ok(l),
            _ => Err(BuildError::WrongKind { gid: r.0, expected: "location" }),
        }
    }

    fn location_mut(&mut self, r: LocationRef) -> Result<&mut LocationNode> {
        match self.nodes.get_mut(r.0.index()).map(|n| &mut n.body) {
            Some(NodeBody::Location(l)) => Ok(l),
            Some(_) => Err(BuildError::WrongKind { gid: r.0, expected: "location" }),
            None => Err(BuildError::UnknownNode(r.0)),
        }
    }

    pub(crate) fn item(&self, r: ItemRef) -> Result<&ItemNode> {
        match &self.node(r.0)?.body {
            NodeBody::Item(i) => Ok(i),
            _ => Err(BuildError::WrongKind { gid: r.0, expected: "item" }),
        }
    }

    pub(crate) fn action(&self, r: ActionRef) -> Result<&ActionNode> {
        match &self.node(r.0)?.body {
            NodeBody::Action(a) => Ok(a),
            _ => Err(BuildError::WrongKind { gid: r.0, expected: "action" }),
        }
    }

    pub(crate) fn file(&self, r: FileRef) -> Result<&FileRecord> {
        match &self.node(r.0)?.body {
            NodeBody::File(f) => Ok(f),
            _ => Err(BuildError::WrongKind { gid: r.0, expected: "file" }),
        }
    }

    /// Root locations in creation order.
    pub fn roots(&self) -> Vec<LocationRef> {
        self.nodes
            .iter()
            .enumerate()
            .filter_map(|(i, n)| match &n.body {
                NodeBody::Location(l) if l.parent.is_none() => Some(LocationRef(Gid(i as u32))),
                _ => None,
            })
            .collect()
    }

    /// The location play begins in.
    pub fn initial(&self) -> Option<LocationRef> {
        self.initial.or_else(|| self.roots().into_iter().next())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Scope
    // ─────────────────────────────────────────────────────────────────────────

    /// `location` followed by each ancestor up to its root.
    pub(crate) fn ancestors(&self, location: LocationRef) -> Result<Vec<LocationRef>> {
        let mut chain = vec![location];
        let mut cur = self.location(location)?.parent;
        while let Some(parent) = cur {
            chain.push(parent);
            cur = self.location(parent)?.parent;
        }
        Ok(chain)
    }

    fn is_ignored(chain: &[&LocationNode], token: &str) -> bool {
        chain.iter().any(|l| l.scope.ignored.contains(token))
    }

    /// Every normalized spelling of `text` as seen from `location`.
    pub(crate) fn spellings(&self, location: LocationRef, text: &str) -> Result<BTreeSet<String>> {
        let chain = self
            .ancestors(location)?
            .into_iter()
            .map(|l| self.location(l))
            .collect::<Result<Vec<_>>>()?;
        let groups: Vec<&SynonymGroup> = chain.iter().flat_map(|l| l.scope.synonyms.iter()).collect();

        let tokens = tokenize(text, |t| Self::is_ignored(&chain, t));
        Ok(synonyms::expand(&tokens, &groups)
            .into_iter()
            .map(|spelling| {
                let respelled = tokenize(&join(&spelling), |t| Self::is_ignored(&chain, t));
                join(&respelled)
            })
            .collect())
    }
}
