//! # Cranea Build
//!
//! The write path: an authored story tree, held as an arena, serialized
//! into a sealed container.
//!
//! ## Overview
//!
//! Every node gets a [`Gid`](cranea_core::Gid) when it is added, in
//! creation order. Keys are generated lazily on first use and never change
//! afterwards, so references can be wired in any order before emission.
//!
//! Emission is a pre-order depth-first walk from each root location: a
//! location is sealed, then its child locations, items and actions, each
//! followed immediately by its own subtree. A node reachable twice is
//! written once.
//!
//! ## Key Types
//!
//! - [`BuildGraph`] - the arena and its emitter
//! - [`LocationSpec`], [`ItemSpec`], [`ActionSpec`] - authored node content
//! - [`LocationRef`], [`ItemRef`], [`ActionRef`], [`FileRef`] - typed handles
//!
//! ## Usage
//!
//! ```rust,no_run
//! use cranea_build::{ActionSpec, BuildGraph, ItemSpec, LocationSpec};
//! use cranea_core::ActionKind;
//!
//! let mut graph = BuildGraph::new();
//! let field = graph.add_location(None, LocationSpec::new("Field")).unwrap();
//! let rock = graph.add_item(field, ItemSpec::new("rock")).unwrap();
//! graph
//!     .add_action(field, ActionSpec::new(ActionKind::Default).command("take rock").takes(rock))
//!     .unwrap();
//! graph.write_to_path("field.cra").unwrap();
//! ```

pub mod config;
pub mod emit;
pub mod error;
pub mod graph;
pub mod synonyms;

pub use config::BuildConfig;
pub use error::{BuildError, Result};
pub use graph::{
    ActionRef, ActionSpec, BuildGraph, FileRef, ItemRef, ItemSpec, LocationRef, LocationSpec,
};
