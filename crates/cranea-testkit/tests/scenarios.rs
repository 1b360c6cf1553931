//! End-to-end play through fixture stories.

use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use cranea_build::{ActionSpec, BuildGraph, ItemSpec, LocationSpec};
use cranea_core::ActionKind;
use cranea_engine::{EngineConfig, Flow};
use cranea_testkit::fixtures::{navigator, play, session, CaveStory, MemSession, RockStory};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

fn cave_session(story: &CaveStory, dir: &Path) -> MemSession {
    let mut s = session(&story.graph, EngineConfig::rooted_at(dir)).unwrap();
    s.start().unwrap();
    s
}

fn gids(items: Vec<Rc<cranea_engine::Item>>) -> Vec<cranea_core::Gid> {
    items.iter().map(|i| i.gid).collect()
}

#[test]
fn test_rock_take_drop_retake() {
    let story = RockStory::new();
    let rock = story.rock.gid();
    let mut s = session(&story.graph, EngineConfig::default()).unwrap();
    s.start().unwrap();

    assert_eq!(play(&mut s, "take rock").unwrap(), "You take the rock.\n");
    let nav = s.navigator_mut();
    assert_eq!(gids(nav.inventory().unwrap()), vec![rock]);
    assert!(nav.items_here().unwrap().is_empty());

    assert_eq!(play(&mut s, "drop rock").unwrap(), "You drop the rock.\n");
    let nav = s.navigator_mut();
    assert!(nav.inventory().unwrap().is_empty());
    assert_eq!(nav.dropped_at(rock), Some(story.field.gid()));
    assert_eq!(gids(nav.items_here().unwrap()), vec![rock]);

    assert_eq!(play(&mut s, "take rock").unwrap(), "You take the rock.\n");
    let nav = s.navigator_mut();
    assert_eq!(gids(nav.inventory().unwrap()), vec![rock]);
    assert_eq!(nav.dropped_at(rock), None);
    assert!(nav.items_here().unwrap().is_empty());
}

#[test]
fn test_unlock_needs_key_in_hand() {
    let mut g = BuildGraph::new();
    let hall = g.add_location(None, LocationSpec::new("Hall")).unwrap();
    let key = g.add_item(hall, ItemSpec::new("key")).unwrap();
    for spec in [
        ActionSpec::new(ActionKind::Default).command("take key").takes(key),
        ActionSpec::new(ActionKind::Default).command("drop key").drops(key),
        ActionSpec::new(ActionKind::Default)
            .command("unlock door")
            .requires([key])
            .desc("Unlocked."),
    ] {
        g.add_action(hall, spec).unwrap();
    }
    let mut s = session(&g, EngineConfig::default()).unwrap();

    assert_eq!(play(&mut s, "unlock door").unwrap(), "");
    play(&mut s, "take key").unwrap();
    assert_eq!(play(&mut s, "unlock door").unwrap(), "Unlocked.\n");
    play(&mut s, "drop key").unwrap();
    assert!(s.navigator().inventory().unwrap().is_empty());
    assert_eq!(play(&mut s, "unlock door").unwrap(), "");
    play(&mut s, "take key").unwrap();
    assert_eq!(play(&mut s, "unlock door").unwrap(), "Unlocked.\n");
}

#[test]
fn test_cave_walkthrough() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let story = CaveStory::new();
    let mut s = session(&story.graph, EngineConfig::rooted_at(dir.path())).unwrap();

    assert_eq!(s.start().unwrap(), Flow::Continue);
    assert_eq!(s.console_mut().take_output(), "A windswept hill. A cave yawns below.\n");

    let steps = [
        ("look", "You see:\n  lamp\n"),
        ("get the lantern", "Taken.\n"),
        ("enter cave", "Daylight fades behind you.\n"),
        ("take key", "Taken.\n"),
        ("go deeper", "A narrow tunnel ends at a vault door.\n"),
        ("open vault", "The vault door swings open.\nA small vault.\nGold glitters.\n"),
        ("take gem", "You can't take that.\n"),
        ("pry gem", ""),
        ("leave", "Tunnel.\n"),
        ("take crowbar", "Taken.\n"),
        ("drop the key", "Dropped.\n"),
        ("open vault", "The vault door swings open.\nVault.\nGold glitters.\n"),
        ("pry gem", "You pry the gem loose.\n"),
        ("read inscription", "The inscription is a map.\n"),
        ("i", "You carry:\n  lamp\n  crowbar\n  gem\n"),
        ("leave", "Tunnel.\n"),
        ("l", "You see:\n  brass key\n"),
        ("wait", "Time passes.\n"),
        ("wait a while", ""),
    ];
    for (input, expected) in steps {
        assert_eq!(play(&mut s, input).unwrap(), expected, "after {input:?}");
    }

    let extracted = dir.path().join("extracted/maps/vault.txt");
    assert_eq!(std::fs::read(extracted).unwrap(), b"The gem was never the treasure.");
    assert_eq!(s.navigator().current_gid().unwrap(), story.tunnel.gid());
    assert_eq!(s.navigator().dropped_at(story.key.gid()), Some(story.tunnel.gid()));
}

#[test]
fn test_call_and_return() {
    let dir = tempfile::tempdir().unwrap();
    let story = CaveStory::new();
    let mut s = cave_session(&story, dir.path());
    s.console_mut().take_output();

    play(&mut s, "enter cave").unwrap();
    assert_eq!(play(&mut s, "sleep").unwrap(), "You doze off.\nYou are dreaming.\n");
    assert_eq!(s.navigator().depth(), 2);
    assert_eq!(s.navigator().prompt().unwrap(), "z> ");

    // nothing from the hilltop reaches the dream
    assert_eq!(play(&mut s, "look").unwrap(), "");

    assert_eq!(play(&mut s, "wake").unwrap(), "You wake up.\nCave Mouth.\n");
    assert_eq!(s.navigator().depth(), 1);
    assert_eq!(s.navigator().current_gid().unwrap(), story.mouth.gid());

    // waking only makes sense in the dream
    assert_eq!(play(&mut s, "wake").unwrap(), "");
}

#[test]
fn test_quit() {
    let dir = tempfile::tempdir().unwrap();
    let story = CaveStory::new();
    let mut s = cave_session(&story, dir.path());
    assert_eq!(s.command("quit").unwrap(), Flow::Quit);
}

#[test]
fn test_scripted_run_stops_at_quit() {
    let dir = tempfile::tempdir().unwrap();
    let story = CaveStory::new();
    let mut s = session(&story.graph, EngineConfig::rooted_at(dir.path())).unwrap();
    for line in ["take lamp", "quit", "look"] {
        s.console_mut().push_line(line);
    }
    s.run().unwrap();
    assert_eq!(
        s.console().output(),
        "A windswept hill. A cave yawns below.\n> Taken.\n> Goodbye.\n"
    );
    assert_eq!(s.console().remaining(), 1);
}

#[test]
fn test_save_and_load_across_sessions() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let story = CaveStory::new();

    let mut a = cave_session(&story, dir.path());
    for input in ["take lamp", "enter cave", "take key", "go deeper", "drop lamp", "go back"] {
        a.command(input).unwrap();
    }
    a.console_mut().take_output();
    assert_eq!(play(&mut a, "save first").unwrap(), "Saved.\n");
    assert!(dir.path().join("first.crs").exists());

    let mut b = cave_session(&story, dir.path());
    b.console_mut().take_output();
    assert_eq!(play(&mut b, "load first").unwrap(), "Loaded.\n");

    assert_eq!(b.navigator().snapshot().unwrap(), a.navigator().snapshot().unwrap());
    assert_eq!(b.navigator().current_gid().unwrap(), story.mouth.gid());
    assert!(b.navigator().holds(story.key.gid()));
    assert!(!b.navigator().holds(story.lamp.gid()));
    assert_eq!(b.navigator().dropped_at(story.lamp.gid()), Some(story.tunnel.gid()));

    // the dropped lamp is waiting in the tunnel
    play(&mut b, "go deeper").unwrap();
    assert_eq!(play(&mut b, "look").unwrap(), "You see:\n  crowbar\n  lamp\n");
    assert_eq!(play(&mut b, "take lamp").unwrap(), "Taken.\n");
}

#[test]
fn test_save_names() {
    let dir = tempfile::tempdir().unwrap();
    let story = CaveStory::new();
    let mut s = cave_session(&story, dir.path());
    s.console_mut().take_output();

    assert_eq!(play(&mut s, "save bad|name").unwrap(), "That name won't do.\n");
    s.console_mut().push_line("");
    assert_eq!(play(&mut s, "save").unwrap(), "Save name: Never mind.\n");
    s.console_mut().push_line("  second  ");
    assert_eq!(play(&mut s, "save").unwrap(), "Save name: Saved.\n");
    assert!(dir.path().join("second.crs").exists());
    assert_eq!(play(&mut s, "load nothing").unwrap(), "Could not load.\n");
}

#[test]
fn test_load_rejects_other_story() {
    let dir = tempfile::tempdir().unwrap();
    let cave = CaveStory::new();
    let mut a = cave_session(&cave, dir.path());
    play(&mut a, "save shared").unwrap();

    let rock = RockStory::new();
    let mut b = session(&rock.graph, EngineConfig::rooted_at(dir.path())).unwrap();
    let err = b.load_from_path(&dir.path().join("shared.crs")).unwrap_err();
    assert!(matches!(err, cranea_engine::EngineError::BadSave(_)));
    assert_eq!(b.navigator().current_gid().unwrap(), rock.field.gid());
}

#[test]
fn test_launcher_sees_extracted_file() {
    let dir = tempfile::tempdir().unwrap();
    let story = CaveStory::new();
    let launched: Rc<RefCell<Vec<PathBuf>>> = Rc::default();
    let seen = Rc::clone(&launched);

    let mut s = cave_session(&story, dir.path()).with_launcher(move |path: &Path| {
        seen.borrow_mut().push(path.to_path_buf());
        Ok::<(), std::io::Error>(())
    });
    for input in ["enter cave", "go deeper", "take crowbar", "open vault", "read inscription"] {
        s.command(input).unwrap();
    }
    assert_eq!(*launched.borrow(), vec![dir.path().join("extracted/maps/vault.txt")]);
}

#[test]
fn test_navigator_without_session() {
    let story = CaveStory::new();
    let mut nav = navigator(&story.graph).unwrap();
    assert_eq!(nav.current_gid().unwrap(), story.hilltop.gid());
    let r = nav.resolve("take the lantern").unwrap().unwrap();
    assert_eq!(r.command, "take");
    assert_eq!(r.args, vec!["lantern"]);
    assert!(nav.resolve("pry gem").unwrap().is_none());
}
