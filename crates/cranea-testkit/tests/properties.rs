//! Properties that hold across building and playing.

use std::collections::BTreeSet;

use proptest::prelude::*;

use cranea_build::{ActionSpec, BuildGraph, LocationSpec};
use cranea_core::{conjunction_key, tokenize, ActionKind, Key};
use cranea_engine::EngineConfig;
use cranea_testkit::fixtures::{navigator, play, session, CaveStory};
use cranea_testkit::generators::{cave_command, key, predicate_story, word, PredicateParams};

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn prop_or_predicate_resolvable_iff_a_conjunction_is_held(params: PredicateParams) {
        let story = predicate_story(&params).unwrap();
        let mut s = session(&story.graph, EngineConfig::default()).unwrap();
        for i in &params.held {
            s.command(&format!("take item{i}")).unwrap();
        }
        let held = s.navigator().inventory().unwrap().len();
        prop_assert_eq!(held, params.held.len());

        let expected = if params.satisfied() { "It works.\n" } else { "" };
        prop_assert_eq!(play(&mut s, "use").unwrap(), expected);
    }

    #[test]
    fn prop_or_predicate_tracks_inventory_changes(params: PredicateParams) {
        let story = predicate_story(&params).unwrap();
        let mut s = session(&story.graph, EngineConfig::default()).unwrap();
        let mut empty_handed = Vec::new();
        s.navigator().save(&mut empty_handed).unwrap();

        let all: BTreeSet<usize> = (0..params.items).collect();
        for i in &all {
            s.command(&format!("take item{i}")).unwrap();
        }
        prop_assert_eq!(play(&mut s, "use").unwrap(), "It works.\n");

        // break every conjunction by dropping one of its items
        let mut held = all.clone();
        for conjunction in &params.conjunctions {
            if let Some(&i) = conjunction.iter().next().filter(|_| conjunction.is_subset(&held)) {
                s.command(&format!("drop item{i}")).unwrap();
                held.remove(&i);
            }
        }
        prop_assert_eq!(s.navigator().inventory().unwrap().len(), held.len());
        prop_assert_eq!(play(&mut s, "use").unwrap(), "");

        for i in &all {
            s.command(&format!("take item{i}")).unwrap();
        }
        prop_assert_eq!(play(&mut s, "use").unwrap(), "It works.\n");

        s.navigator_mut().load(empty_handed.as_slice()).unwrap();
        prop_assert!(s.navigator().inventory().unwrap().is_empty());
        prop_assert_eq!(play(&mut s, "use").unwrap(), "");
    }

    #[test]
    fn prop_conjunction_key_is_order_independent(a in key(), b in key(), c in key()) {
        prop_assert_eq!(conjunction_key([&a, &b, &c]), conjunction_key([&c, &a, &b]));
        prop_assert_eq!(conjunction_key([&a, &b]), conjunction_key([&b, &a]));
    }

    #[test]
    fn prop_conjunction_key_self_cancels(a in key(), b in key()) {
        prop_assert_eq!(conjunction_key([&a, &a]), conjunction_key(Vec::<&Key>::new()));
        prop_assert_eq!(conjunction_key([&a, &b, &b]), conjunction_key([&a]));
    }

    #[test]
    fn prop_resolution_is_deterministic(
        verb in prop::sample::select(vec!["look", "take", "drop", "inventory", "wait"]),
        rest in prop::collection::vec(word(), 0..4),
    ) {
        let story = CaveStory::new();
        let mut nav = navigator(&story.graph).unwrap();
        let input = format!("{verb} {}", rest.join(" "));

        let a = nav.resolve(&input).unwrap().map(|r| (r.action, r.command, r.args));
        let b = nav.resolve(&input).unwrap().map(|r| (r.action, r.command, r.args));
        prop_assert_eq!(&a, &b);

        if let Some((_, command, args)) = a {
            // the split keeps every surviving token, left to right
            let mut rebuilt = tokenize(&command, |_| false);
            rebuilt.extend(args);
            prop_assert_eq!(rebuilt, tokenize(&input, |t| t == "the" || t == "a"));
        }
    }

    #[test]
    fn prop_ignored_words_scope_to_descendants(ignored in "[b-z]{3,8}") {
        prop_assume!(ignored != "open" && ignored != "jar");

        let mut g = BuildGraph::new();
        let house = g.add_location(None, LocationSpec::new("House")).unwrap();
        let kitchen = g.add_location(Some(house), LocationSpec::new("Kitchen")).unwrap();
        let pantry = g.add_location(Some(kitchen), LocationSpec::new("Pantry")).unwrap();
        let garden = g.add_location(Some(house), LocationSpec::new("Garden")).unwrap();
        g.add_ignored(kitchen, [ignored.as_str()]).unwrap();
        for at in [pantry, garden] {
            g.add_action(at, ActionSpec::new(ActionKind::Default).command("open jar")).unwrap();
        }
        let input = format!("open {ignored} jar");

        let mut nav = navigator(&g).unwrap();
        nav.push_child(&g.key_of(kitchen.gid()).unwrap()).unwrap();
        nav.push_child(&g.key_of(pantry.gid()).unwrap()).unwrap();
        let r = nav.resolve(&input).unwrap();
        prop_assert!(r.as_ref().is_some_and(|r| r.args.is_empty()));

        let mut nav = navigator(&g).unwrap();
        nav.push_child(&g.key_of(garden.gid()).unwrap()).unwrap();
        prop_assert!(nav.resolve(&input).unwrap().is_none());
        prop_assert!(nav.resolve("open jar").unwrap().is_some());
    }

    #[test]
    fn prop_save_load_reproduces_progress(commands in prop::collection::vec(cave_command(), 0..24)) {
        let story = CaveStory::new();
        let mut a = session(&story.graph, EngineConfig::default()).unwrap();
        a.start().unwrap();
        for input in &commands {
            a.command(input).unwrap();
        }
        let mut saved = Vec::new();
        a.navigator().save(&mut saved).unwrap();

        let mut b = session(&story.graph, EngineConfig::default()).unwrap();
        b.navigator_mut().load(saved.as_slice()).unwrap();

        let (a, b) = (a.navigator(), b.navigator());
        prop_assert_eq!(a.snapshot().unwrap(), b.snapshot().unwrap());
        prop_assert_eq!(a.current_gid().unwrap(), b.current_gid().unwrap());
        prop_assert_eq!(a.depth(), b.depth());
        for item in [story.lamp, story.key, story.crowbar, story.gem] {
            prop_assert_eq!(a.holds(item.gid()), b.holds(item.gid()));
            prop_assert_eq!(a.dropped_at(item.gid()), b.dropped_at(item.gid()));
        }
    }
}
