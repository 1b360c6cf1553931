//! Proptest generators for property-based testing.

use std::collections::BTreeSet;

use proptest::prelude::*;

use cranea_build::{ActionSpec, BuildGraph, ItemRef, ItemSpec, LocationRef, LocationSpec};
use cranea_core::{ActionKind, Key, KEY_LEN};

/// Generate a random key.
pub fn key() -> impl Strategy<Value = Key> {
    any::<[u8; KEY_LEN]>().prop_map(Key::from_bytes)
}

/// Generate a lowercase command word.
pub fn word() -> impl Strategy<Value = String> {
    "[a-z]{1,8}".prop_map(String::from)
}

/// Generate a command of one to four words.
pub fn command() -> impl Strategy<Value = String> {
    prop::collection::vec(word(), 1..=4).prop_map(|words| words.join(" "))
}

/// Commands that are meaningful somewhere in the cave fixture.
pub fn cave_command() -> impl Strategy<Value = &'static str> {
    prop::sample::select(vec![
        "look",
        "inventory",
        "take lamp",
        "get lantern",
        "drop lamp",
        "enter cave",
        "take key",
        "drop key",
        "go deeper",
        "take crowbar",
        "drop crowbar",
        "open vault",
        "pry gem",
        "drop gem",
        "leave",
        "go back",
        "climb out",
        "sleep",
        "wake",
        "wait",
    ])
}

/// An action gated by an OR of conjunctions over a set of items, and
/// which of those items the player holds.
#[derive(Debug, Clone)]
pub struct PredicateParams {
    pub items: usize,
    /// Each conjunction is a non-empty set of item indices.
    pub conjunctions: Vec<BTreeSet<usize>>,
    pub held: BTreeSet<usize>,
}

impl PredicateParams {
    /// Whether holding `held` should make the action resolvable.
    pub fn satisfied(&self) -> bool {
        self.conjunctions.iter().any(|c| c.is_subset(&self.held))
    }
}

impl Arbitrary for PredicateParams {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        (1usize..=5)
            .prop_flat_map(|items| {
                let all: Vec<usize> = (0..items).collect();
                (
                    Just(items),
                    prop::collection::vec(prop::sample::subsequence(all.clone(), 1..=items), 1..=3),
                    prop::sample::subsequence(all, 0..=items),
                )
            })
            .prop_map(|(items, conjunctions, held)| PredicateParams {
                items,
                conjunctions: conjunctions.into_iter().map(|c| c.into_iter().collect()).collect(),
                held: held.into_iter().collect(),
            })
            .boxed()
    }
}

/// A one-room story for [`PredicateParams`].
pub struct PredicateStory {
    pub graph: BuildGraph,
    pub room: LocationRef,
    pub items: Vec<ItemRef>,
}

/// Build the story: items `item0..`, an action `use` gated by the
/// conjunctions, and `take itemN`/`drop itemN` for each item.
pub fn predicate_story(params: &PredicateParams) -> cranea::Result<PredicateStory> {
    let mut graph = BuildGraph::new();
    let room = graph.add_location(None, LocationSpec::new("Room"))?;
    let mut items = Vec::with_capacity(params.items);
    for i in 0..params.items {
        let item = graph.add_item(room, ItemSpec::new(format!("item{i}")))?;
        graph.add_action(
            room,
            ActionSpec::new(ActionKind::Default)
                .command(format!("take item{i}"))
                .takes(item),
        )?;
        graph.add_action(
            room,
            ActionSpec::new(ActionKind::Default)
                .command(format!("drop item{i}"))
                .drops(item),
        )?;
        items.push(item);
    }

    let mut gated = ActionSpec::new(ActionKind::Default).command("use").desc("It works.");
    for conjunction in &params.conjunctions {
        gated = gated.requires(conjunction.iter().map(|&i| items[i]));
    }
    graph.add_action(room, gated)?;

    Ok(PredicateStory { graph, room, items })
}
