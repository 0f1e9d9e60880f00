//! Seams to the parts of the front-end the session drives but does not own.

use std::collections::{BTreeMap, HashMap};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use derive_more::{Display, Error};
use strum::{Display as StrumDisplay, EnumString};
use tokio::sync::mpsc;
use tracing::{debug, info, instrument, warn};

use crate::games::{Coord, PieceKind, Variant};
use crate::oracle::GameStats;

/// A boolean preference kept per variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, StrumDisplay, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum Preference {
    /// Play sound cues.
    Sound,
    /// Animate while waiting for the oracle.
    Animations,
}

/// Persistent per-variant preferences.
pub trait PreferencesStore: Send {
    /// Reads a flag. Unset flags are on.
    fn get(&self, variant: Variant, preference: Preference) -> bool;

    /// Writes a flag.
    fn set(
        &mut self,
        variant: Variant,
        preference: Preference,
        value: bool,
    ) -> Result<(), PreferencesError>;
}

/// Preferences error.
#[derive(Debug, Clone, Display, Error)]
#[display("Preferences error: {} at {}:{}", message, file, line)]
pub struct PreferencesError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl PreferencesError {
    /// Creates a new preferences error.
    #[track_caller]
    #[instrument(skip(message))]
    pub fn new(message: String) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message,
            line: loc.line(),
            file: loc.file(),
        }
    }
}

/// Preferences stored as one TOML table per variant.
///
/// ```toml
/// [checkers]
/// sound = false
/// ```
#[derive(Debug, Clone)]
pub struct TomlPreferences {
    path: PathBuf,
    tables: BTreeMap<String, BTreeMap<String, bool>>,
}

impl TomlPreferences {
    /// Loads preferences from `path`. A missing file means all defaults.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn load(path: impl AsRef<Path>) -> Result<Self, PreferencesError> {
        let path = path.as_ref().to_path_buf();
        if !path.exists() {
            debug!("No preferences file, using defaults");
            return Ok(Self {
                path,
                tables: BTreeMap::new(),
            });
        }
        let content = std::fs::read_to_string(&path)
            .map_err(|e| PreferencesError::new(format!("Failed to read preferences: {}", e)))?;
        let tables = toml::from_str(&content)
            .map_err(|e| PreferencesError::new(format!("Failed to parse preferences: {}", e)))?;
        info!("Preferences loaded");
        Ok(Self { path, tables })
    }

    fn save(&self) -> Result<(), PreferencesError> {
        let content = toml::to_string(&self.tables)
            .map_err(|e| PreferencesError::new(format!("Failed to encode preferences: {}", e)))?;
        std::fs::write(&self.path, content)
            .map_err(|e| PreferencesError::new(format!("Failed to write preferences: {}", e)))
    }
}

impl PreferencesStore for TomlPreferences {
    fn get(&self, variant: Variant, preference: Preference) -> bool {
        self.tables
            .get(variant.namespace())
            .and_then(|table| table.get(&preference.to_string()))
            .copied()
            .unwrap_or(true)
    }

    #[instrument(skip(self))]
    fn set(
        &mut self,
        variant: Variant,
        preference: Preference,
        value: bool,
    ) -> Result<(), PreferencesError> {
        self.tables
            .entry(variant.namespace().to_string())
            .or_default()
            .insert(preference.to_string(), value);
        self.save()
    }
}

/// A short cue played on game events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, StrumDisplay)]
#[strum(serialize_all = "lowercase")]
pub enum SoundCue {
    /// A piece was selected.
    Select,
    /// A move was applied.
    Move,
    /// A move captured.
    Capture,
    /// The player won.
    Win,
    /// The player lost.
    Lose,
    /// A call failed.
    Error,
}

/// Fire-and-forget sound playback. Failures are swallowed.
pub trait SoundPlayer: Send {
    /// Plays a cue.
    fn play(&self, cue: SoundCue);
}

/// Rings the terminal bell for cues worth hearing.
#[derive(Debug, Clone, Copy, Default)]
pub struct TerminalBell;

impl SoundPlayer for TerminalBell {
    fn play(&self, cue: SoundCue) {
        if matches!(cue, SoundCue::Select) {
            return;
        }
        let mut out = std::io::stdout();
        if let Err(e) = out.write_all(b"\x07").and_then(|_| out.flush()) {
            debug!(%cue, error = %e, "Bell failed");
        }
    }
}

/// Plays nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct Silent;

impl SoundPlayer for Silent {
    fn play(&self, _cue: SoundCue) {}
}

/// Receives statistics payloads verbatim.
pub trait StatsDisplay: Send {
    /// Shows the counters for a variant.
    fn show(&self, variant: Variant, stats: GameStats);
}

/// Stats shared with the terminal UI.
#[derive(Debug, Clone, Default)]
pub struct SharedStats(Arc<Mutex<HashMap<Variant, GameStats>>>);

impl SharedStats {
    /// Returns the latest counters for a variant.
    pub fn get(&self, variant: Variant) -> Option<GameStats> {
        self.0.lock().ok().and_then(|map| map.get(&variant).copied())
    }
}

impl StatsDisplay for SharedStats {
    fn show(&self, variant: Variant, stats: GameStats) {
        match self.0.lock() {
            Ok(mut map) => {
                map.insert(variant, stats);
            }
            Err(e) => warn!(error = %e, "Stats lock poisoned"),
        }
    }
}

/// Discards statistics.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoStats;

impl StatsDisplay for NoStats {
    fn show(&self, _variant: Variant, _stats: GameStats) {}
}

/// A choice made at the promotion prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptCommand {
    /// Promote to this piece.
    Promote(PieceKind),
    /// Dismiss the prompt.
    Cancel,
}

/// Answers one promotion prompt. Consumed on use, so it fires at most once.
#[derive(Debug)]
pub struct PromotionReply {
    tx: mpsc::UnboundedSender<PromptCommand>,
}

impl PromotionReply {
    pub(crate) fn new(tx: mpsc::UnboundedSender<PromptCommand>) -> Self {
        Self { tx }
    }

    /// Promotes to `piece`.
    #[instrument(skip(self))]
    pub fn choose(self, piece: PieceKind) {
        if self.tx.send(PromptCommand::Promote(piece)).is_err() {
            debug!("Session closed before the promotion choice arrived");
        }
    }

    /// Dismisses the prompt.
    #[instrument(skip(self))]
    pub fn cancel(self) {
        if self.tx.send(PromptCommand::Cancel).is_err() {
            debug!("Session closed before the prompt was dismissed");
        }
    }
}

/// Asks the user which piece a pawn promotes to.
pub trait PromotionPrompt: Send {
    /// Opens the prompt. The answer goes through `reply`.
    fn request(&self, origin: Coord, destination: Coord, reply: PromotionReply);
}

/// Promotion prompt whose reply is picked up by the terminal UI.
#[derive(Debug, Clone, Default)]
pub struct SharedPrompt(Arc<Mutex<Option<PromotionReply>>>);

impl SharedPrompt {
    /// Takes the open reply handle, if any.
    pub fn take(&self) -> Option<PromotionReply> {
        self.0.lock().ok().and_then(|mut slot| slot.take())
    }

    /// Returns true while a prompt is open.
    pub fn is_open(&self) -> bool {
        self.0.lock().map(|slot| slot.is_some()).unwrap_or(false)
    }
}

impl PromotionPrompt for SharedPrompt {
    fn request(&self, origin: Coord, destination: Coord, reply: PromotionReply) {
        debug!(%origin, %destination, "Opening promotion prompt");
        if let Ok(mut slot) = self.0.lock() {
            *slot = Some(reply);
        }
    }
}

/// Leaves the game screen.
pub trait Navigator: Send {
    /// Returns to the variant menu.
    fn return_to_menu(&self);
}

/// Navigation flag polled by the terminal UI.
#[derive(Debug, Clone, Default)]
pub struct MenuFlag(Arc<Mutex<bool>>);

impl MenuFlag {
    /// Returns and clears the flag.
    pub fn take(&self) -> bool {
        self.0
            .lock()
            .map(|mut flag| std::mem::take(&mut *flag))
            .unwrap_or(false)
    }
}

impl Navigator for MenuFlag {
    fn return_to_menu(&self) {
        if let Ok(mut flag) = self.0.lock() {
            *flag = true;
        }
    }
}

/// The full set of collaborators a session drives.
pub struct Collaborators {
    /// Sound and animation flags.
    pub preferences: Box<dyn PreferencesStore>,
    /// Sound output.
    pub sound: Box<dyn SoundPlayer>,
    /// Statistics output.
    pub stats: Box<dyn StatsDisplay>,
    /// Promotion prompt.
    pub promotion: Box<dyn PromotionPrompt>,
    /// Menu navigation.
    pub navigator: Box<dyn Navigator>,
}

impl std::fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collaborators").finish_non_exhaustive()
    }
}

/// Preferences held only in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryPreferences(HashMap<(Variant, Preference), bool>);

impl PreferencesStore for MemoryPreferences {
    fn get(&self, variant: Variant, preference: Preference) -> bool {
        self.0.get(&(variant, preference)).copied().unwrap_or(true)
    }

    fn set(
        &mut self,
        variant: Variant,
        preference: Preference,
        value: bool,
    ) -> Result<(), PreferencesError> {
        self.0.insert((variant, preference), value);
        Ok(())
    }
}

impl Collaborators {
    /// Collaborators that do nothing, with in-memory preferences.
    pub fn headless() -> Self {
        Self {
            preferences: Box::new(MemoryPreferences::default()),
            sound: Box::new(Silent),
            stats: Box::new(NoStats),
            promotion: Box::new(SharedPrompt::default()),
            navigator: Box::new(MenuFlag::default()),
        }
    }
}
