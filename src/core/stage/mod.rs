//=========================================================================
// Stage System
//=========================================================================
//
// Screens ("stages") and the manager that swaps between them.
//
// Architecture:
//   StageManager
//     ├─ registry: StageRegistry<S>   (key → factory)
//     ├─ current: (S, LifecycleNode<Box<dyn Stage<S>>>)
//     ├─ eyecatch: EyecatchDeck
//     └─ requests: RequestQueue<S>
//
// Flow:
//   update() → viewer commands → Stage::progress_and_draw()
//            → drain RequestQueue → swap / host signals
//
// Only one stage exists at a time. Swapping disposes the old stage and
// builds the next one from its factory.
//
//=========================================================================

//=== Module Declarations =================================================

pub mod options;
mod phase;
mod request_queue;
mod stage_manager;

//=== Public API ==========================================================

pub use phase::{Phase, PhaseMachine};
pub use request_queue::{RequestQueue, StageRequest};
pub use stage_manager::{StageFactory, StageManager, StageRegistry};

//=== External Dependencies ===============================================

use std::fmt::Debug;
use std::hash::Hash;

use log::{debug, warn};

//=== Internal Dependencies ===============================================

use crate::core::animation::SharedClock;
use crate::core::config::{Settings, SettingsStore};
use crate::core::eyecatch::EyecatchDeck;
use crate::core::input::FrameInput;
use crate::core::lifecycle::Activity;
use crate::core::render::{DesignSize, DrawContext};
use crate::core::viewer::{SoundDelay, ViewerPlayRequest};

//=== Stage Key Trait =====================================================

/// Marker trait for stage identifiers.
///
/// Typically implemented by an application enum.
pub trait StageKey: Clone + Copy + Eq + Hash + Debug + Send + Sync + 'static {}

//=== HostSignal ==========================================================

/// Requests from the render thread that only the UI thread can carry out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostSignal {
    /// Tear down and rebuild the render loop.
    RestartRequested,

    ExitRequested,

    /// `true` for fullscreen.
    ScreenModeChanged(bool),

    /// The render loop hit an unrecoverable error and has exited.
    RenderFailed(String),
}

//=== StageContext ========================================================

/// Services shared by every stage, owned by the render loop.
pub struct StageContext {
    pub settings: Settings,
    pub clock: SharedClock,
    pub design_size: DesignSize,
    /// Song requested by the most recent viewer Play command.
    pub viewer_request: Option<ViewerPlayRequest>,
    pub sound_delay: SoundDelay,
    settings_store: Box<dyn SettingsStore>,
    signals: Vec<HostSignal>,
}

impl StageContext {
    pub fn new(
        settings_store: Box<dyn SettingsStore>,
        clock: SharedClock,
        design_size: DesignSize,
        sound_delay: SoundDelay,
    ) -> Self {
        Self {
            settings: Settings::default(),
            clock,
            design_size,
            viewer_request: None,
            sound_delay,
            settings_store,
            signals: Vec::new(),
        }
    }

    /// Current time of the shared clock, in seconds.
    pub fn now(&self) -> f64 {
        self.clock.now()
    }

    /// Reloads settings from the store. Keeps the current values on error.
    pub fn load_settings(&mut self) {
        match self.settings_store.load() {
            Ok(settings) => {
                debug!(target: "config", "Settings loaded");
                self.settings = settings;
            }
            Err(e) => warn!(target: "config", "Could not load settings: {}", e),
        }
    }

    pub fn save_settings(&mut self) {
        if let Err(e) = self.settings_store.save(&self.settings) {
            warn!(target: "config", "Could not save settings: {}", e);
        }
    }

    pub fn notify_host(&mut self, signal: HostSignal) {
        debug!(target: "stage", "Host signal queued: {:?}", signal);
        self.signals.push(signal);
    }

    pub fn take_host_signals(&mut self) -> Vec<HostSignal> {
        std::mem::take(&mut self.signals)
    }
}

//=== FrameContext ========================================================

/// Everything a stage may touch during one frame.
pub struct FrameContext<'a, S: StageKey> {
    pub ctx: &'a mut StageContext,
    pub dc: &'a mut dyn DrawContext,
    pub input: &'a FrameInput,
    pub eyecatch: &'a mut EyecatchDeck,
    pub requests: &'a mut RequestQueue<S>,
}

//=== Stage Trait =========================================================

/// A full-screen stage.
///
/// Lifecycle hooks come from [`Activity`] and all default to no-ops; only
/// `name` and `progress_and_draw` are required.
///
/// ```rust
/// # use aetheric_stage::prelude::*;
/// # #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// # enum Screen { Title }
/// # impl StageKey for Screen {}
/// struct TitleStage;
///
/// impl Activity<StageContext> for TitleStage {}
///
/// impl Stage<Screen> for TitleStage {
///     fn name(&self) -> &'static str {
///         "title"
///     }
///
///     fn progress_and_draw(&mut self, frame: &mut FrameContext<'_, Screen>) {
///         let _ = frame.input;
///     }
/// }
/// ```
pub trait Stage<S: StageKey>: Activity<StageContext> + Send {
    fn name(&self) -> &'static str;

    /// Advances the stage by one frame and draws it.
    fn progress_and_draw(&mut self, frame: &mut FrameContext<'_, S>);
}
