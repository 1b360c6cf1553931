//! # Cranea
//!
//! Encrypted interactive-fiction containers.
//!
//! ## Overview
//!
//! A story is a tree of locations holding items and actions. Every node is
//! sealed under its own key, and a key is only ever stored inside the
//! objects that lead to it: a child's key in its parent, an action's key in
//! a slot that only the typed command opens, an item's take-key in the
//! action that hands it over. A player can learn the story only by playing
//! it; the container alone reveals no commands and no text.
//!
//! - **Build**: author a [`BuildGraph`] and write it with [`build_story`]
//! - **Play**: open the file as a [`Game`] and feed it commands
//! - **Save**: progress is a chain of earned keys, written per story
//!
//! ## Usage
//!
//! ```rust,no_run
//! use cranea::{build_story, ActionKind, ActionSpec, BuildGraph, EngineConfig, Game, ItemSpec, LocationSpec};
//!
//! let mut graph = BuildGraph::new();
//! let field = graph.add_location(None, LocationSpec::new("Field").prompt("> ")).unwrap();
//! let rock = graph.add_item(field, ItemSpec::new("rock")).unwrap();
//! graph
//!     .add_action(field, ActionSpec::new(ActionKind::Default).command("take rock").takes(rock))
//!     .unwrap();
//! graph
//!     .add_action(field, ActionSpec::new(ActionKind::Quit).command("quit"))
//!     .unwrap();
//! build_story(&graph, "field.cra").unwrap();
//!
//! let mut game = Game::open("field.cra", EngineConfig::default()).unwrap();
//! game.play().unwrap();
//! ```
//!
//! ## Re-exports
//!
//! - `cranea::core` - keys, hashes, gids, command tokenizer
//! - `cranea::seal` - the per-object envelope and record layouts
//! - `cranea::store` - the container file
//! - `cranea::build` - the authored graph and emitter
//! - `cranea::engine` - navigator, resolver, save files, interaction loop

pub mod error;
pub mod game;

// Re-export component crates
pub use cranea_build as build;
pub use cranea_core as core;
pub use cranea_engine as engine;
pub use cranea_seal as seal;
pub use cranea_store as store;

pub use error::{CraneaError, Result};
pub use game::{build_story, FileSession, Game};

// Re-export commonly used types
pub use cranea_build::{ActionSpec, BuildConfig, BuildGraph, ItemSpec, LocationSpec};
pub use cranea_core::{ActionKind, Gid, Hook, Key, KeyHash};
pub use cranea_engine::{Console, EngineConfig, Flow, Launcher, MemoryConsole, Session, StdConsole};
