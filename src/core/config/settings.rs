//=========================================================================
// User Settings
//=========================================================================
//
// Per-user play options edited by the options stage and persisted as
// TOML.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use log::{debug, info};
use serde::{Deserialize, Serialize};

//=== Internal Dependencies ===============================================

use super::ConfigError;

//=== Option Enums ========================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScreenMode {
    #[default]
    Window,
    Fullscreen,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayMode {
    #[default]
    Basic,
    Expert,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LaneSide {
    #[default]
    Left,
    Right,
}

/// Display side of the lanes that can sit on either edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LaneSides {
    pub ride: LaneSide,
    pub china: LaneSide,
    pub splash: LaneSide,
}

impl Default for LaneSides {
    fn default() -> Self {
        Self {
            ride: LaneSide::Right,
            china: LaneSide::Left,
            splash: LaneSide::Left,
        }
    }
}

//=== AutoPlay ============================================================

/// Drum pads that can be played automatically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AutoPlayPad {
    LeftCymbal,
    HiHat,
    LeftPedal,
    Snare,
    Bass,
    HighTom,
    LowTom,
    FloorTom,
    RightCymbal,
}

impl AutoPlayPad {
    pub const ALL: [AutoPlayPad; 9] = [
        AutoPlayPad::LeftCymbal,
        AutoPlayPad::HiHat,
        AutoPlayPad::LeftPedal,
        AutoPlayPad::Snare,
        AutoPlayPad::Bass,
        AutoPlayPad::HighTom,
        AutoPlayPad::LowTom,
        AutoPlayPad::FloorTom,
        AutoPlayPad::RightCymbal,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::LeftCymbal => "LeftCymbal",
            Self::HiHat => "HiHat",
            Self::LeftPedal => "LeftPedal",
            Self::Snare => "Snare",
            Self::Bass => "Bass",
            Self::HighTom => "HighTom",
            Self::LowTom => "LowTom",
            Self::FloorTom => "FloorTom",
            Self::RightCymbal => "RightCymbal",
        }
    }
}

/// Per-pad auto-play switches. Everything is off by default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutoPlay {
    pub left_cymbal: bool,
    pub hi_hat: bool,
    pub left_pedal: bool,
    pub snare: bool,
    pub bass: bool,
    pub high_tom: bool,
    pub low_tom: bool,
    pub floor_tom: bool,
    pub right_cymbal: bool,
}

impl AutoPlay {
    fn slot(&mut self, pad: AutoPlayPad) -> &mut bool {
        match pad {
            AutoPlayPad::LeftCymbal => &mut self.left_cymbal,
            AutoPlayPad::HiHat => &mut self.hi_hat,
            AutoPlayPad::LeftPedal => &mut self.left_pedal,
            AutoPlayPad::Snare => &mut self.snare,
            AutoPlayPad::Bass => &mut self.bass,
            AutoPlayPad::HighTom => &mut self.high_tom,
            AutoPlayPad::LowTom => &mut self.low_tom,
            AutoPlayPad::FloorTom => &mut self.floor_tom,
            AutoPlayPad::RightCymbal => &mut self.right_cymbal,
        }
    }

    pub fn get(&self, pad: AutoPlayPad) -> bool {
        let mut copy = *self;
        *copy.slot(pad)
    }

    pub fn set(&mut self, pad: AutoPlayPad, on: bool) {
        *self.slot(pad) = on;
    }

    pub fn set_all(&mut self, on: bool) {
        for pad in AutoPlayPad::ALL {
            self.set(pad, on);
        }
    }

    pub fn all_on(&self) -> bool {
        AutoPlayPad::ALL.iter().all(|pad| self.get(*pad))
    }
}

//=== Settings ============================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub screen_mode: ScreenMode,
    pub play_mode: PlayMode,
    /// Chart scroll speed multiplier.
    pub scroll_speed: f64,
    /// Show background video during play.
    pub video: bool,
    pub cymbal_free: bool,
    pub drum_sound: bool,
    pub lane_sides: LaneSides,
    pub auto_play: AutoPlay,
}

impl Settings {
    pub const SCROLL_SPEED_MIN: f64 = 0.5;
    pub const SCROLL_SPEED_MAX: f64 = 8.0;
    pub const SCROLL_SPEED_STEP: f64 = 0.5;

    /// Snaps `speed` into range and onto the 0.5 grid.
    pub fn clamp_scroll_speed(speed: f64) -> f64 {
        if !speed.is_finite() {
            return 1.0;
        }
        let snapped = (speed / Self::SCROLL_SPEED_STEP).round() * Self::SCROLL_SPEED_STEP;
        snapped.clamp(Self::SCROLL_SPEED_MIN, Self::SCROLL_SPEED_MAX)
    }

    pub fn is_fullscreen(&self) -> bool {
        self.screen_mode == ScreenMode::Fullscreen
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            screen_mode: ScreenMode::Window,
            play_mode: PlayMode::Basic,
            scroll_speed: 1.0,
            video: true,
            cymbal_free: false,
            drum_sound: true,
            lane_sides: LaneSides::default(),
            auto_play: AutoPlay::default(),
        }
    }
}

//=== SettingsStore =======================================================

/// Persistence backend for [`Settings`].
pub trait SettingsStore: Send {
    fn load(&self) -> Result<Settings, ConfigError>;

    fn save(&self, settings: &Settings) -> Result<(), ConfigError>;
}

//--- TOML file ------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct TomlSettingsStore {
    path: PathBuf,
}

impl TomlSettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SettingsStore for TomlSettingsStore {
    /// A missing file loads as defaults.
    fn load(&self) -> Result<Settings, ConfigError> {
        if !self.path.exists() {
            debug!(target: "config", "{} not found, using default settings", self.path.display());
            return Ok(Settings::default());
        }

        let content = std::fs::read_to_string(&self.path).map_err(|source| ConfigError::Read {
            path: self.path.clone(),
            source,
        })?;

        let mut settings: Settings = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: self.path.clone(),
            source,
        })?;
        settings.scroll_speed = Settings::clamp_scroll_speed(settings.scroll_speed);
        Ok(settings)
    }

    fn save(&self, settings: &Settings) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(settings)?;
        std::fs::write(&self.path, content).map_err(|source| ConfigError::Write {
            path: self.path.clone(),
            source,
        })?;
        info!(target: "config", "Saved settings to {}", self.path.display());
        Ok(())
    }
}

//--- In-memory ------------------------------------------------------------

/// Store kept in memory. Clones share the same slot.
#[derive(Debug, Clone, Default)]
pub struct MemorySettingsStore {
    slot: Arc<Mutex<Settings>>,
}

impl MemorySettingsStore {
    pub fn new(initial: Settings) -> Self {
        Self {
            slot: Arc::new(Mutex::new(initial)),
        }
    }

    pub fn snapshot(&self) -> Settings {
        match self.slot.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl SettingsStore for MemorySettingsStore {
    fn load(&self) -> Result<Settings, ConfigError> {
        Ok(self.snapshot())
    }

    fn save(&self, settings: &Settings) -> Result<(), ConfigError> {
        let mut guard = match self.slot.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *guard = settings.clone();
        Ok(())
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
