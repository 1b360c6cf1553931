//! Fixture stories and helpers for scripted play.
//!
//! Every fixture keeps its [`BuildGraph`] so tests can open it as many
//! times as they like; keys are fixed once generated, so every container
//! built from the same graph accepts the same save files.

use std::io::Cursor;

use cranea::Result;
use cranea_build::{ActionSpec, BuildGraph, FileRef, ItemRef, ItemSpec, LocationRef, LocationSpec};
use cranea_core::{ActionKind, Hook};
use cranea_engine::{EngineConfig, MemoryConsole, Navigator, Session};
use cranea_store::Container;

/// Navigator over an in-memory container.
pub type MemNavigator = Navigator<Cursor<Vec<u8>>>;

/// Session over an in-memory container with a scripted console.
pub type MemSession = Session<Cursor<Vec<u8>>, MemoryConsole>;

/// Emit a graph and open the result for navigation.
pub fn navigator(graph: &BuildGraph) -> Result<MemNavigator> {
    let container = Container::from_bytes(graph.to_bytes()?)?;
    Ok(Navigator::open(container)?)
}

/// Emit a graph and open a session on it with no queued input.
pub fn session(graph: &BuildGraph, config: EngineConfig) -> Result<MemSession> {
    Ok(Session::new(navigator(graph)?, MemoryConsole::default(), config))
}

/// Run one command and return everything it printed.
pub fn play(session: &mut MemSession, input: &str) -> Result<String> {
    session.command(input)?;
    Ok(session.console_mut().take_output())
}

// ─────────────────────────────────────────────────────────────────────────────
// Rock
// ─────────────────────────────────────────────────────────────────────────────

/// One location, one rock, and commands to take and drop it.
pub struct RockStory {
    pub graph: BuildGraph,
    pub field: LocationRef,
    pub rock: ItemRef,
}

impl RockStory {
    pub fn new() -> Self {
        let mut graph = BuildGraph::new();
        let field = add_location(&mut graph, None, LocationSpec::new("Field"));
        let rock = add_item(&mut graph, field, ItemSpec::new("rock"));
        add_action(
            &mut graph,
            field,
            ActionSpec::new(ActionKind::Default)
                .command("take rock")
                .takes(rock)
                .desc("You take the rock."),
        );
        add_action(
            &mut graph,
            field,
            ActionSpec::new(ActionKind::Default)
                .command("drop rock")
                .drops(rock)
                .desc("You drop the rock."),
        );
        Self { graph, field, rock }
    }
}

impl Default for RockStory {
    fn default() -> Self {
        Self::new()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Cave
// ─────────────────────────────────────────────────────────────────────────────

/// A small adventure that touches every action kind.
///
/// ```text
/// Hilltop (lamp)                      global commands, hooks, synonyms
/// └── Cave  --start-->  Cave Mouth (brass key)
///                       Tunnel (crowbar)
///                       Vault (gem, restricted)
/// Dream                               reached by "sleep", left by "wake"
/// ```
///
/// The vault opens with the key and the lamp, or with the crowbar alone.
/// The gem can only be pried loose with the crowbar.
pub struct CaveStory {
    pub graph: BuildGraph,
    pub hilltop: LocationRef,
    pub cave: LocationRef,
    pub mouth: LocationRef,
    pub tunnel: LocationRef,
    pub vault: LocationRef,
    pub dream: LocationRef,
    pub lamp: ItemRef,
    pub key: ItemRef,
    pub crowbar: ItemRef,
    pub gem: ItemRef,
    pub map: FileRef,
}

impl CaveStory {
    pub fn new() -> Self {
        let mut g = BuildGraph::new();

        let hilltop = add_location(
            &mut g,
            None,
            LocationSpec::new("Hilltop")
                .desc("A windswept hill. A cave yawns below.")
                .prompt("> "),
        );
        let cave = add_location(&mut g, Some(hilltop), LocationSpec::new("Cave"));
        let mouth = add_location(
            &mut g,
            Some(cave),
            LocationSpec::new("Cave Mouth").desc("Daylight fades behind you."),
        );
        let tunnel = add_location(
            &mut g,
            Some(cave),
            LocationSpec::new("Tunnel").desc("A narrow tunnel ends at a vault door."),
        );
        let vault = add_location(&mut g, Some(cave), LocationSpec::new("Vault").desc("A small vault."));
        let dream = add_location(&mut g, None, LocationSpec::new("Dream").prompt("z> "));
        expect(g.set_start(cave, mouth));
        expect(g.set_initial(hilltop));
        expect(g.add_ignored(hilltop, ["the", "a"]));
        expect(g.add_synonyms(hilltop, ["take", "get"]));
        expect(g.add_synonyms(hilltop, ["lamp", "lantern"]));

        let lamp = add_item(&mut g, hilltop, ItemSpec::new("lamp").desc("An oil lamp."));
        let key = add_item(&mut g, mouth, ItemSpec::new("brass key").alias("key"));
        let crowbar = add_item(&mut g, tunnel, ItemSpec::new("crowbar"));
        let gem = add_item(&mut g, vault, ItemSpec::new("gem").restricted());
        let map = expect(g.add_file("maps/vault.txt", &b"The gem was never the treasure."[..]));

        Self::global_actions(&mut g, hilltop, cave, dream);

        add_action(&mut g, mouth, go("go deeper", tunnel));
        add_action(&mut g, mouth, go("climb out", hilltop));

        add_action(&mut g, tunnel, go("go back", mouth));
        add_action(
            &mut g,
            tunnel,
            go("open vault", vault)
                .requires([key, lamp])
                .requires([crowbar])
                .desc("The vault door swings open."),
        );

        add_action(
            &mut g,
            vault,
            ActionSpec::new(ActionKind::Default).on(Hook::Forced).desc("Gold glitters."),
        );
        add_action(
            &mut g,
            vault,
            ActionSpec::new(ActionKind::Default)
                .command("pry gem")
                .requires([crowbar])
                .takes(gem)
                .desc("You pry the gem loose."),
        );
        add_action(
            &mut g,
            vault,
            ActionSpec::new(ActionKind::Default)
                .command("read inscription")
                .extracts(map, true)
                .desc("The inscription is a map."),
        );
        add_action(&mut g, vault, go("leave", tunnel));

        add_action(
            &mut g,
            dream,
            ActionSpec::new(ActionKind::Default).on(Hook::Forced).desc("You are dreaming."),
        );
        add_action(
            &mut g,
            dream,
            ActionSpec::new(ActionKind::Return).command("wake").desc("You wake up."),
        );

        Self {
            graph: g,
            hilltop,
            cave,
            mouth,
            tunnel,
            vault,
            dream,
            lamp,
            key,
            crowbar,
            gem,
            map,
        }
    }

    /// Commands and hooks every location under the hilltop inherits.
    fn global_actions(g: &mut BuildGraph, hilltop: LocationRef, cave: LocationRef, dream: LocationRef) {
        let listing = |kind, empty: &str, nonempty: &str| {
            ActionSpec::new(kind)
                .aux("empty", empty)
                .aux("nonempty", nonempty)
                .aux("prefix", "  ")
        };
        let saving = |kind, success: &str, failure: &str| {
            ActionSpec::new(kind)
                .aux("prompt", "Save name: ")
                .aux("empty", "Never mind.")
                .aux("invalid", "That name won't do.")
                .aux("success", success)
                .aux("failure", failure)
        };

        add_action(
            g,
            hilltop,
            ActionSpec::new(ActionKind::Default).on(Hook::FirstVisit).desc("{location.desc}"),
        );
        add_action(
            g,
            hilltop,
            ActionSpec::new(ActionKind::Default).on(Hook::ReturnVisit).desc("{title}."),
        );
        add_action(
            g,
            hilltop,
            listing(ActionKind::Look, "Nothing here.", "You see:").command("look").command("l"),
        );
        add_action(
            g,
            hilltop,
            listing(ActionKind::Inventory, "You carry nothing.", "You carry:")
                .command("inventory")
                .command("i"),
        );
        add_action(
            g,
            hilltop,
            ActionSpec::new(ActionKind::Take)
                .command("take")
                .aux("success", "Taken.")
                .aux("failure", "You can't take that."),
        );
        add_action(
            g,
            hilltop,
            ActionSpec::new(ActionKind::Drop)
                .command("drop")
                .aux("success", "Dropped.")
                .aux("failure", "You don't have that."),
        );
        add_action(g, hilltop, saving(ActionKind::Save, "Saved.", "Could not save.").command("save"));
        add_action(g, hilltop, saving(ActionKind::Load, "Loaded.", "Could not load.").command("load"));
        add_action(
            g,
            hilltop,
            ActionSpec::new(ActionKind::Default).command("wait").exact().desc("Time passes."),
        );
        add_action(
            g,
            hilltop,
            ActionSpec::new(ActionKind::Call).command("sleep").goes_to(dream).desc("You doze off."),
        );
        add_action(g, hilltop, go("enter cave", cave));
        add_action(g, hilltop, ActionSpec::new(ActionKind::Quit).command("quit").desc("Goodbye."));
    }
}

impl Default for CaveStory {
    fn default() -> Self {
        Self::new()
    }
}

fn go(command: &str, to: LocationRef) -> ActionSpec {
    ActionSpec::new(ActionKind::Default).command(command).goes_to(to)
}

// Fixtures are static; a failure here is a bug in the fixture itself.
fn expect<T, E: std::fmt::Debug>(result: std::result::Result<T, E>) -> T {
    match result {
        Ok(value) => value,
        Err(e) => panic!("fixture story is malformed: {e:?}"),
    }
}

fn add_location(g: &mut BuildGraph, parent: Option<LocationRef>, spec: LocationSpec) -> LocationRef {
    expect(g.add_location(parent, spec))
}

fn add_item(g: &mut BuildGraph, at: LocationRef, spec: ItemSpec) -> ItemRef {
    expect(g.add_item(at, spec))
}

fn add_action(g: &mut BuildGraph, at: LocationRef, spec: ActionSpec) {
    expect(g.add_action(at, spec));
}
