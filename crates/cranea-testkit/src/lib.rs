//! # Cranea Testkit
//!
//! Testing utilities for Cranea.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Fixtures**: ready-made stories, and helpers to open them in memory
//! - **Generators**: proptest strategies for keys, commands and predicates
//! - **Scripted play**: a session over an in-memory console
//!
//! ## Scripted Play
//!
//! ```rust
//! use cranea_engine::EngineConfig;
//! use cranea_testkit::fixtures::{play, session, RockStory};
//!
//! let story = RockStory::new();
//! let mut s = session(&story.graph, EngineConfig::default()).unwrap();
//! assert_eq!(play(&mut s, "take rock").unwrap(), "You take the rock.\n");
//! ```
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use cranea_testkit::generators::{predicate_story, PredicateParams};
//!
//! proptest! {
//!     #[test]
//!     fn predicate_story_builds(params: PredicateParams) {
//!         let story = predicate_story(&params).unwrap();
//!         prop_assert!(story.graph.to_bytes().is_ok());
//!     }
//! }
//! ```

pub mod fixtures;
pub mod generators;

pub use cranea_engine::MemoryConsole as ScriptedConsole;
pub use fixtures::{navigator, play, session, CaveStory, MemNavigator, MemSession, RockStory};
