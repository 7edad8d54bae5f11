//=========================================================================
// Configuration
//=========================================================================
//
// Engine configuration (`engine.toml`) and persisted user settings
// (`settings.toml`).
//
// Both files are optional: missing keys fall back to defaults through
// `#[serde(default)]`, and a missing file yields the default value.
//
//=========================================================================

//=== Module Declarations =================================================

mod settings;

//=== Public API ==========================================================

pub use settings::{
    AutoPlay, AutoPlayPad, LaneSide, LaneSides, MemorySettingsStore, PlayMode, ScreenMode,
    Settings, SettingsStore, TomlSettingsStore,
};

//=== External Dependencies ===============================================

use std::io;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;

//=== Internal Dependencies ===============================================

use crate::core::render::DesignSize;

//=== ConfigError =========================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("failed to serialize settings: {0}")]
    Serialize(#[from] toml::ser::Error),
}

//=== EngineConfig ========================================================

/// Start-up configuration for the engine and its render loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Target frames per second of the render loop.
    pub frame_rate: f64,
    /// Capacity of the platform → render channel.
    pub channel_capacity: usize,
    /// Logical canvas width used for all layout.
    pub design_width: f32,
    /// Logical canvas height used for all layout.
    pub design_height: f32,
    /// Where user settings are persisted.
    pub settings_path: PathBuf,
    /// Connection attempts before a viewer instance becomes primary.
    pub viewer_connect_attempts: u32,
    /// Pause between viewer connection attempts.
    pub viewer_connect_backoff_ms: u64,
    /// Loopback port the primary instance listens on for viewer commands.
    pub viewer_port: u16,
    /// Output latency of the sound device, reported to viewer clients.
    pub sound_delay_ms: f32,
    pub window_title: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            frame_rate: 60.0,
            channel_capacity: 128,
            design_width: 1920.0,
            design_height: 1080.0,
            settings_path: PathBuf::from("settings.toml"),
            viewer_connect_attempts: 2,
            viewer_connect_backoff_ms: 500,
            viewer_port: 47_231,
            sound_delay_ms: 0.0,
            window_title: "Aetheric Stage".to_string(),
        }
    }
}

impl EngineConfig {
    pub const DEFAULT_PATH: &'static str = "engine.toml";

    /// Loads configuration from a TOML file.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let config = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(target: "config", "Loaded engine config from {}", path.display());
        Ok(config)
    }

    /// Loads `path`, or returns defaults if it is missing or unreadable.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        if !path.exists() {
            debug!(target: "config", "{} not found, using defaults", path.display());
            return Self::default();
        }

        Self::load_from_file(path).unwrap_or_else(|e| {
            warn!(target: "config", "{}; using defaults", e);
            Self::default()
        })
    }

    pub fn design_size(&self) -> DesignSize {
        DesignSize::new(self.design_width, self.design_height)
    }

    /// Loopback address of the viewer command listener.
    pub fn viewer_addr(&self) -> SocketAddr {
        SocketAddr::from(([127, 0, 0, 1], self.viewer_port))
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
