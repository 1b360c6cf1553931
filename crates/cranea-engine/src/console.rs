//! Seams to the outside world: the text console and the file launcher.

use std::io::{self, BufRead, Write};
use std::path::Path;
use std::time::Duration;

/// Outcome of processing one command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Keep reading commands.
    Continue,
    /// The player asked to quit.
    Quit,
}

/// Line-oriented text console.
pub trait Console {
    /// Write text as-is; no newline is added.
    fn write(&mut self, text: &str) -> io::Result<()>;

    /// Block for the next line, without its terminator. `None` at end of input.
    fn read_line(&mut self) -> io::Result<Option<String>>;

    /// Wait before continuing output.
    fn pause(&mut self, duration: Duration);
}

/// Console over the process's stdin and stdout.
#[derive(Debug, Default)]
pub struct StdConsole;

impl Console for StdConsole {
    fn write(&mut self, text: &str) -> io::Result<()> {
        let mut out = io::stdout().lock();
        out.write_all(text.as_bytes())?;
        out.flush()
    }

    fn read_line(&mut self) -> io::Result<Option<String>> {
        let mut line = String::new();
        if io::stdin().lock().read_line(&mut line)? == 0 {
            return Ok(None);
        }
        let trimmed = line.trim_end_matches(['\r', '\n']).len();
        line.truncate(trimmed);
        Ok(Some(line))
    }

    fn pause(&mut self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Receives extracted files flagged for launch.
pub trait Launcher {
    fn launch(&mut self, path: &Path) -> io::Result<()>;
}

impl<F> Launcher for F
where
    F: FnMut(&Path) -> io::Result<()>,
{
    fn launch(&mut self, path: &Path) -> io::Result<()> {
        self(path)
    }
}

/// Launcher that does nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoLaunch;

impl Launcher for NoLaunch {
    fn launch(&mut self, _path: &Path) -> io::Result<()> {
        Ok(())
    }
}

/// An in-memory console for tests and scripted play.
pub mod memory {
    use super::*;
    use std::collections::VecDeque;

    /// Feeds queued lines as input and collects all output.
    #[derive(Debug, Default)]
    pub struct MemoryConsole {
        input: VecDeque<String>,
        output: String,
        paused: Duration,
    }

    impl MemoryConsole {
        /// Create a console that will answer reads with `lines`, in order.
        pub fn new<I, S>(lines: I) -> Self
        where
            I: IntoIterator<Item = S>,
            S: Into<String>,
        {
            Self {
                input: lines.into_iter().map(Into::into).collect(),
                ..Default::default()
            }
        }

        /// Queue another input line.
        pub fn push_line(&mut self, line: impl Into<String>) {
            self.input.push_back(line.into());
        }

        /// Everything written so far.
        pub fn output(&self) -> &str {
            &self.output
        }

        /// Return and clear the output.
        pub fn take_output(&mut self) -> String {
            std::mem::take(&mut self.output)
        }

        /// Total time spent in pauses.
        pub fn paused(&self) -> Duration {
            self.paused
        }

        /// Lines not yet read.
        pub fn remaining(&self) -> usize {
            self.input.len()
        }
    }

    impl Console for MemoryConsole {
        fn write(&mut self, text: &str) -> io::Result<()> {
            self.output.push_str(text);
            Ok(())
        }

        fn read_line(&mut self) -> io::Result<Option<String>> {
            Ok(self.input.pop_front())
        }

        fn pause(&mut self, duration: Duration) {
            self.paused += duration;
        }
    }
}
