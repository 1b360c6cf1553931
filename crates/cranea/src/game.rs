//! A story file opened for play.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use cranea_build::BuildGraph;
use cranea_engine::{Console, EngineConfig, Flow, Launcher, Navigator, NoLaunch, Session, StdConsole};
use cranea_store::Container;
use tracing::debug;

use crate::error::Result;

/// Session over a container file.
pub type FileSession<C, L = NoLaunch> = Session<BufReader<File>, C, L>;

/// A container file with a session on top.
///
/// Defaults to the process's terminal. Use [`Game::with_console`] to script
/// input, and [`Game::with_launcher`] to open extracted files.
pub struct Game<C = StdConsole, L = NoLaunch> {
    session: FileSession<C, L>,
}

impl Game {
    /// Open a story for play on stdin/stdout.
    pub fn open(path: impl AsRef<Path>, config: EngineConfig) -> Result<Self> {
        Self::with_console(path, StdConsole, config)
    }
}

impl<C: Console> Game<C> {
    /// Open a story for play on the given console.
    pub fn with_console(path: impl AsRef<Path>, console: C, config: EngineConfig) -> Result<Self> {
        let path = path.as_ref();
        let container = Container::open_path(path)?;
        debug!(
            path = %path.display(),
            prefix = container.prefix(),
            objects = container.object_count(),
            "opened story"
        );
        let navigator = Navigator::open(container)?;
        Ok(Self {
            session: Session::new(navigator, console, config),
        })
    }
}

impl<C, L> Game<C, L> {
    /// Replace the launcher that receives extracted files.
    pub fn with_launcher<L2: Launcher>(self, launcher: L2) -> Game<C, L2> {
        Game {
            session: self.session.with_launcher(launcher),
        }
    }

    /// The free text stored ahead of the sealed objects.
    pub fn prefix(&self) -> &str {
        self.session.navigator().container().prefix()
    }

    pub fn session(&self) -> &FileSession<C, L> {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut FileSession<C, L> {
        &mut self.session
    }

    pub fn into_session(self) -> FileSession<C, L> {
        self.session
    }
}

impl<C: Console, L: Launcher> Game<C, L> {
    /// Play until the player quits or input ends.
    pub fn play(&mut self) -> Result<()> {
        Ok(self.session.run()?)
    }

    /// Enter the initial location without reading input.
    pub fn start(&mut self) -> Result<Flow> {
        Ok(self.session.start()?)
    }

    /// Process one line of input.
    pub fn command(&mut self, input: &str) -> Result<Flow> {
        Ok(self.session.command(input)?)
    }

    /// Write a save file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        Ok(self.session.save_to_path(path.as_ref())?)
    }

    /// Restore a save file. On error progress is unchanged.
    pub fn load(&mut self, path: impl AsRef<Path>) -> Result<()> {
        Ok(self.session.load_from_path(path.as_ref())?)
    }
}

/// Validate a story graph and write it as a container file.
pub fn build_story(graph: &BuildGraph, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    graph.write_to_path(path)?;
    debug!(path = %path.display(), nodes = graph.len(), "built story");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CraneaError;
    use cranea_build::{ActionSpec, BuildConfig, BuildError, ItemSpec, LocationSpec};
    use cranea_core::ActionKind;
    use cranea_engine::{EngineError, MemoryConsole};

    fn lantern_story(path: &Path) {
        let mut g = BuildGraph::with_config(BuildConfig {
            prefix: "Lantern v1".into(),
        });
        let cellar = g.add_location(None, LocationSpec::new("Cellar").prompt("> ")).unwrap();
        let lantern = g.add_item(cellar, ItemSpec::new("lantern")).unwrap();
        g.add_action(
            cellar,
            ActionSpec::new(ActionKind::Default)
                .command("take lantern")
                .takes(lantern)
                .desc("You pick up the lantern."),
        )
        .unwrap();
        g.add_action(
            cellar,
            ActionSpec::new(ActionKind::Default)
                .command("light lantern")
                .requires([lantern])
                .desc("It glows."),
        )
        .unwrap();
        g.add_action(cellar, ActionSpec::new(ActionKind::Quit).command("quit")).unwrap();
        build_story(&g, path).unwrap();
    }

    #[test]
    fn test_play_scripted_game() {
        let dir = tempfile::tempdir().unwrap();
        let story = dir.path().join("lantern.cra");
        lantern_story(&story);

        let console = MemoryConsole::new(["light lantern", "take lantern", "light lantern", "quit"]);
        let mut game = Game::with_console(&story, console, EngineConfig::rooted_at(dir.path())).unwrap();
        assert_eq!(game.prefix(), "Lantern v1");
        game.play().unwrap();
        assert_eq!(
            game.session().console().output(),
            "> > You pick up the lantern.\n> It glows.\n> "
        );
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let story = dir.path().join("lantern.cra");
        let save = dir.path().join("slot.crs");
        lantern_story(&story);

        let config = EngineConfig::rooted_at(dir.path());
        let mut game = Game::with_console(&story, MemoryConsole::default(), config.clone()).unwrap();
        game.command("take lantern").unwrap();
        game.save(&save).unwrap();

        let mut fresh = Game::with_console(&story, MemoryConsole::default(), config).unwrap();
        fresh.load(&save).unwrap();
        fresh.command("light lantern").unwrap();
        assert_eq!(fresh.session().console().output(), "It glows.\n");
    }

    #[test]
    fn test_missing_story() {
        let dir = tempfile::tempdir().unwrap();
        let result = Game::with_console(dir.path().join("none.cra"), MemoryConsole::default(), EngineConfig::default());
        assert!(matches!(result, Err(CraneaError::Store(_))));
    }

    #[test]
    fn test_invalid_story_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let err = build_story(&BuildGraph::new(), dir.path().join("empty.cra")).unwrap_err();
        assert!(matches!(err, CraneaError::Build(BuildError::NoLocations)));
    }

    #[test]
    fn test_load_failure_is_engine_error() {
        let dir = tempfile::tempdir().unwrap();
        let story = dir.path().join("lantern.cra");
        lantern_story(&story);
        let bogus = dir.path().join("bogus.crs");
        std::fs::write(&bogus, b"not a save").unwrap();

        let mut game = Game::with_console(&story, MemoryConsole::default(), EngineConfig::default()).unwrap();
        let err = game.load(&bogus).unwrap_err();
        assert!(matches!(err, CraneaError::Engine(EngineError::BadSave(_))));
    }
}
