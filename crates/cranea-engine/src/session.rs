//! The interaction loop.
//!
//! A [`Session`] ties a [`Navigator`] to a console and a launcher and gives
//! each action kind its behavior. Every kind shares one effect sequence:
//!
//! ```text
//! 1. print the description
//! 2. takes     (retake if dropped, else fetch along the entry's path)
//! 3. drops     (by take-key hash, at the current location)
//! 4. files     (extract all, then launch the flagged ones)
//! 5. destination, then enter it
//! ```
//!
//! `Call` pushes a frame before the sequence. `Take`, `Drop`, `Save` and
//! `Load` do their own work first; `Look`, `Inventory`, `Quit` and
//! `Return` do it after.

use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Seek, Write};
use std::path::{Path, PathBuf};
use std::rc::Rc;

use cranea_core::{clean_filename, hash_key, is_valid_filename, join, ActionKind, Gid, Hook, Key};
use cranea_seal::{ActionRecord, FileLaunch};
use tracing::{debug, trace, warn};

use crate::config::EngineConfig;
use crate::console::{Console, Flow, Launcher, NoLaunch};
use crate::error::{EngineError, Result};
use crate::expand::{segments, Segment};
use crate::navigator::{Item, Navigator};
use crate::resolver::Resolution;

/// A play session over one container.
pub struct Session<R, C, L = NoLaunch> {
    nav: Navigator<R>,
    console: C,
    launcher: L,
    config: EngineConfig,
    last_command: String,
    last_args: Vec<String>,
}

impl<R: BufRead + Seek, C: Console> Session<R, C, NoLaunch> {
    pub fn new(navigator: Navigator<R>, console: C, config: EngineConfig) -> Self {
        Self {
            nav: navigator,
            console,
            launcher: NoLaunch,
            config,
            last_command: String::new(),
            last_args: Vec::new(),
        }
    }
}

impl<R, C, L> Session<R, C, L> {
    /// Replace the launcher that receives extracted files.
    pub fn with_launcher<L2: Launcher>(self, launcher: L2) -> Session<R, C, L2> {
        Session {
            nav: self.nav,
            console: self.console,
            launcher,
            config: self.config,
            last_command: self.last_command,
            last_args: self.last_args,
        }
    }

    pub fn navigator(&self) -> &Navigator<R> {
        &self.nav
    }

    pub fn navigator_mut(&mut self) -> &mut Navigator<R> {
        &mut self.nav
    }

    pub fn console(&self) -> &C {
        &self.console
    }

    pub fn console_mut(&mut self) -> &mut C {
        &mut self.console
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn into_parts(self) -> (Navigator<R>, C) {
        (self.nav, self.console)
    }
}

impl<R: BufRead + Seek, C: Console, L: Launcher> Session<R, C, L> {
    // ─────────────────────────────────────────────────────────────────────────
    // Loop
    // ─────────────────────────────────────────────────────────────────────────

    /// Enter the initial location.
    pub fn start(&mut self) -> Result<Flow> {
        self.enter()
    }

    /// Play until quit or end of input.
    pub fn run(&mut self) -> Result<()> {
        if self.start()? == Flow::Quit {
            return Ok(());
        }
        loop {
            let prompt = self.nav.prompt()?;
            let prompt = self.expand(&prompt)?;
            self.console.write(&prompt)?;
            let Some(line) = self.console.read_line()? else {
                break;
            };
            if self.command(&line)? == Flow::Quit {
                break;
            }
        }
        debug!("session ended");
        Ok(())
    }

    /// Process one line of player input. Unrecognized input does nothing
    /// beyond becoming `{cmd}`.
    pub fn command(&mut self, input: &str) -> Result<Flow> {
        self.last_command = input.to_string();
        match self.nav.resolve(input)? {
            Some(resolution) => {
                self.last_args = resolution.args.clone();
                self.perform(resolution)
            }
            None => Ok(Flow::Continue),
        }
    }

    /// Descend through start children, then fire the entry hooks.
    pub fn enter(&mut self) -> Result<Flow> {
        while let Some(start) = self.nav.current()?.start {
            self.nav.push_child(&start)?;
        }
        let here = self.nav.current()?;
        debug!(location = %here.gid, title = %here.title, "entered");

        let visit = if self.nav.mark_visited(here.gid) {
            Hook::FirstVisit
        } else {
            Hook::ReturnVisit
        };
        if let Some(resolution) = self.nav.resolve_hook(visit)? {
            if self.perform(resolution)? == Flow::Quit {
                return Ok(Flow::Quit);
            }
            // the visit hook moved on and the nested entry fired its own hooks
            if self.nav.current_gid()? != here.gid {
                return Ok(Flow::Continue);
            }
        }
        match self.nav.resolve_hook(Hook::Forced)? {
            Some(resolution) => self.perform(resolution),
            None => Ok(Flow::Continue),
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Actions
    // ─────────────────────────────────────────────────────────────────────────

    /// Run a resolved action.
    pub fn perform(&mut self, resolution: Resolution) -> Result<Flow> {
        let Resolution {
            owner,
            action,
            record,
            args,
            ..
        } = resolution;
        debug!(%action, kind = ?record.kind, "performing");

        match record.kind {
            ActionKind::Default => self.effects(owner, &record),
            ActionKind::Look => {
                if self.effects(owner, &record)? == Flow::Quit {
                    return Ok(Flow::Quit);
                }
                let items: Vec<_> = self.nav.items_here()?.into_iter().filter(|i| i.record.visible).collect();
                self.list(&items, &record)?;
                Ok(Flow::Continue)
            }
            ActionKind::Inventory => {
                if self.effects(owner, &record)? == Flow::Quit {
                    return Ok(Flow::Quit);
                }
                let items = self.nav.inventory()?;
                self.list(&items, &record)?;
                Ok(Flow::Continue)
            }
            ActionKind::Quit => {
                self.effects(owner, &record)?;
                Ok(Flow::Quit)
            }
            ActionKind::Return => {
                if self.effects(owner, &record)? == Flow::Quit {
                    return Ok(Flow::Quit);
                }
                if self.nav.ret() {
                    self.enter()
                } else {
                    Ok(Flow::Continue)
                }
            }
            ActionKind::Call => {
                self.nav.call();
                self.effects(owner, &record)
            }
            ActionKind::Take => {
                self.take_named(&record, &args)?;
                self.effects(owner, &record)
            }
            ActionKind::Drop => {
                self.drop_named(&record, &args)?;
                self.effects(owner, &record)
            }
            ActionKind::Save => {
                self.save_named(&record, &args)?;
                self.effects(owner, &record)
            }
            ActionKind::Load => {
                self.load_named(&record, &args)?;
                self.effects(owner, &record)
            }
        }
    }

    fn effects(&mut self, owner: Gid, record: &ActionRecord) -> Result<Flow> {
        self.print(&record.desc)?;
        for take in &record.takes {
            self.nav.take_entry(owner, take)?;
        }
        for hash in &record.drops {
            self.nav.drop_held(hash)?;
        }
        self.extract_files(&record.files)?;
        match &record.destination {
            Some(path) => {
                self.nav.follow_path(owner, path)?;
                self.enter()
            }
            None => Ok(Flow::Continue),
        }
    }

    fn list(&mut self, items: &[Rc<Item>], record: &ActionRecord) -> Result<()> {
        let titled: Vec<&Rc<Item>> = items.iter().filter(|i| !i.title().is_empty()).collect();
        if titled.is_empty() {
            return self.print(record.aux("empty"));
        }
        self.print(record.aux("nonempty"))?;
        for item in titled {
            let prefix = self.expand(record.aux("prefix"))?;
            let suffix = self.expand(record.aux("suffix"))?;
            self.console.write(&format!("{prefix}{}{suffix}\n", item.title()))?;
        }
        Ok(())
    }

    fn take_named(&mut self, record: &ActionRecord, args: &[String]) -> Result<()> {
        let name = join(args);
        let mut taken = false;
        for item in self.nav.items_here()? {
            if !item.record.has_title(&name) {
                continue;
            }
            if let Some(take_key) = self.nav.take_key(&item) {
                self.nav.take(&item, take_key)?;
                taken = true;
                break;
            }
        }
        self.print(record.aux(if taken { "success" } else { "failure" }))
    }

    fn drop_named(&mut self, record: &ActionRecord, args: &[String]) -> Result<()> {
        let name = join(args);
        let mut dropped = false;
        for item in self.nav.inventory()? {
            if !item.record.has_title(&name) {
                continue;
            }
            if let Some(take_key) = self.nav.take_key(&item) {
                dropped = self.nav.drop_held(&hash_key(&take_key))?;
                break;
            }
        }
        self.print(record.aux(if dropped { "success" } else { "failure" }))
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Text
    // ─────────────────────────────────────────────────────────────────────────

    /// Expand placeholders with the configured depth.
    pub fn expand(&mut self, text: &str) -> Result<String> {
        self.expand_at(text, self.config.expansion_depth)
    }

    fn expand_at(&mut self, text: &str, depth: u32) -> Result<String> {
        let mut out = String::with_capacity(text.len());
        for segment in segments(text) {
            match segment {
                Segment::Text(t) => out.push_str(t),
                Segment::Var(_) if depth == 0 => {}
                Segment::Var(name) => {
                    let value = self.variable(&name, depth - 1)?;
                    out.push_str(&value);
                }
            }
        }
        Ok(out)
    }

    fn variable(&mut self, name: &str, depth: u32) -> Result<String> {
        if let Some(field) = name.strip_prefix("location.") {
            return self.location_variable(field, depth);
        }
        Ok(match name {
            "d" => {
                self.console.pause(self.config.pause);
                String::new()
            }
            "p" => {
                self.console.read_line()?;
                String::new()
            }
            "cmd" => self.last_command.clone(),
            "args" => join(&self.last_args),
            "s" => " ".to_string(),
            "br" => "\n".to_string(),
            _ => return self.location_variable(name, depth),
        })
    }

    fn location_variable(&mut self, field: &str, depth: u32) -> Result<String> {
        let here = self.nav.current()?;
        match field {
            "title" => self.expand_at(&here.title, depth),
            "desc" => self.expand_at(&here.desc, depth),
            "gid" => Ok(here.gid.to_string()),
            "prompt" => {
                let prompt = self.nav.prompt()?;
                self.expand_at(&prompt, depth)
            }
            other => {
                trace!(variable = other, "unknown variable");
                Ok(String::new())
            }
        }
    }

    /// Expand and print a line. Nothing is printed for empty text.
    pub fn print(&mut self, text: &str) -> Result<()> {
        let expanded = self.expand(text)?;
        if !expanded.is_empty() {
            self.console.write(&expanded)?;
            self.console.write("\n")?;
        }
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Files
    // ─────────────────────────────────────────────────────────────────────────

    fn extract_files(&mut self, files: &[FileLaunch]) -> Result<()> {
        let mut launch = Vec::new();
        for file in files {
            if let Some(path) = self.extract_file(&file.key)? {
                if file.launch {
                    launch.push(path);
                }
            }
        }
        for path in launch {
            if let Err(e) = self.launcher.launch(&path) {
                warn!(path = %path.display(), error = %e, "launch failed");
            }
        }
        Ok(())
    }

    /// Write a file into the extraction directory, unless already there.
    ///
    /// Returns where it lies, or `None` when it could not be written.
    pub fn extract_file(&mut self, key: &Key) -> Result<Option<PathBuf>> {
        let dir = self.config.extract_dir.clone();
        let mut file = self.nav.open_file(key)?;
        let dest = clean_filename(&file.dest, true);
        if dest.is_empty() {
            warn!(dest = %file.dest, "file has no usable name");
            return Ok(None);
        }
        let path = dir.join(&dest);
        if path.exists() {
            trace!(path = %path.display(), "already extracted");
            return Ok(Some(path));
        }

        if let Some(parent) = path.parent() {
            if let Err(e) = fs::create_dir_all(parent) {
                warn!(path = %path.display(), error = %e, "extraction failed");
                return Ok(None);
            }
        }
        let out = match File::create(&path) {
            Ok(out) => out,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "extraction failed");
                return Ok(None);
            }
        };
        let mut out = BufWriter::new(out);
        let copied = file
            .copy_to(&mut out)
            .map_err(EngineError::from)
            .and_then(|n| out.flush().map(|()| n).map_err(EngineError::from));
        match copied {
            Ok(n) => {
                debug!(path = %path.display(), bytes = n, "extracted");
                Ok(Some(path))
            }
            Err(e) => {
                drop(out);
                let _ = fs::remove_file(&path);
                Err(e)
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Saves
    // ─────────────────────────────────────────────────────────────────────────

    /// Path of a save called `name`, or `None` if the name is unusable.
    pub fn save_path(&self, name: &str) -> Option<PathBuf> {
        let name = name.trim();
        if !is_valid_filename(name) {
            return None;
        }
        Some(
            self.config
                .save_dir
                .join(format!("{name}.{}", self.config.save_extension)),
        )
    }

    /// Write progress to `path`.
    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        let mut out = BufWriter::new(File::create(path)?);
        self.nav.save(&mut out)?;
        out.flush()?;
        debug!(path = %path.display(), "saved");
        Ok(())
    }

    /// Replace progress with the save at `path`. On error nothing changes.
    pub fn load_from_path(&mut self, path: &Path) -> Result<()> {
        let source = BufReader::new(File::open(path)?);
        self.nav.load(source)?;
        debug!(path = %path.display(), "loaded");
        Ok(())
    }

    /// Pick the save name for a `Save`/`Load` action, reporting bad names.
    fn chosen_save(&mut self, record: &ActionRecord, args: &[String]) -> Result<Option<PathBuf>> {
        let name = if !record.aux("savename").is_empty() {
            self.expand(record.aux("savename"))?
        } else if let Some(first) = args.first() {
            first.clone()
        } else {
            let prompt = self.expand(record.aux("prompt"))?;
            self.console.write(&prompt)?;
            self.console.read_line()?.unwrap_or_default()
        };

        if name.trim().is_empty() {
            self.print(record.aux("empty"))?;
            return Ok(None);
        }
        match self.save_path(&name) {
            Some(path) => Ok(Some(path)),
            None => {
                self.print(record.aux("invalid"))?;
                Ok(None)
            }
        }
    }

    fn save_named(&mut self, record: &ActionRecord, args: &[String]) -> Result<()> {
        let Some(path) = self.chosen_save(record, args)? else {
            return Ok(());
        };
        match self.save_to_path(&path) {
            Ok(()) => self.print(record.aux("success")),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "save failed");
                self.print(record.aux("failure"))
            }
        }
    }

    fn load_named(&mut self, record: &ActionRecord, args: &[String]) -> Result<()> {
        let Some(path) = self.chosen_save(record, args)? else {
            return Ok(());
        };
        match self.load_from_path(&path) {
            Ok(()) => self.print(record.aux("success")),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "load failed");
                self.print(record.aux("failure"))
            }
        }
    }
}
