//! # Cranea Engine
//!
//! The read path: playing a sealed container.
//!
//! ## Overview
//!
//! A [`Navigator`] decrypts objects on demand as the player earns their
//! keys. It keeps a stack of traversal frames, where each frame is a
//! root-first chain of location gids, plus the inventory and the record of
//! dropped items. Nothing is decrypted up front except the initial root.
//!
//! Commands are resolved against the current location's action table and
//! then each ancestor's. A table entry is a sealed slot: only the exact
//! command key opens it, so a container reveals nothing about which
//! commands exist.
//!
//! A [`Session`] puts a navigator behind a [`Console`] and gives each
//! action kind its behavior.
//!
//! ## Key Types
//!
//! - [`Navigator`] - decryption cache, traversal and inventory
//! - [`Resolution`] - a matched command with its arguments
//! - [`Session`] - the interaction loop and text expansion
//! - [`Snapshot`] - the portable form of progress in a save file
//! - [`Console`], [`Launcher`] - seams to the terminal and the OS
//!
//! ## Usage
//!
//! ```rust,no_run
//! use cranea_engine::{EngineConfig, Navigator, Session, StdConsole};
//! use cranea_store::Container;
//!
//! let container = Container::open_path("story.cra").unwrap();
//! let navigator = Navigator::open(container).unwrap();
//! let mut session = Session::new(navigator, StdConsole, EngineConfig::default());
//! session.run().unwrap();
//! ```

pub mod config;
pub mod console;
pub mod error;
pub mod expand;
pub mod navigator;
pub mod resolver;
pub mod session;
pub mod snapshot;

pub use config::EngineConfig;
pub use console::{memory::MemoryConsole, Console, Flow, Launcher, NoLaunch, StdConsole};
pub use error::{EngineError, Result};
pub use expand::{segments, Segment};
pub use navigator::{Item, Location, Navigator};
pub use resolver::Resolution;
pub use session::Session;
pub use snapshot::{Chain, DroppedItem, HeldItem, Snapshot, SAVE_MAGIC};
