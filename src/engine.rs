//=========================================================================
// Aetheric Stage Engine
//
// Main entry point: wires stages, eye-catches, settings and the graphics
// backend into a render thread supervised by the platform.
//
// Architecture:
// ```text
//     EngineBuilder  ──build()──>  Engine  ──run()──>  [Runtime]
//         │                          │
//         ├─ with_frame_rate()       ├─ viewer_channel()
//         ├─ register_stage()        └─ run(): window + render thread,
//         ├─ with_eyecatch()                   blocks until exit
//         └─ with_backend()
// ```
//
//=========================================================================

//=== External Dependencies ===============================================

use std::sync::Arc;

use crossbeam_channel::{bounded, Receiver, Sender};
use log::{info, warn};

//=== Internal Dependencies ===============================================

use crate::core::animation::{SharedClock, SystemClock};
use crate::core::config::{EngineConfig, SettingsStore, TomlSettingsStore};
use crate::core::coordinator::{RenderLoop, RenderThreadCoordinator};
use crate::core::eyecatch::{Eyecatch, EyecatchDeck};
use crate::core::input::{KeyBindings, KeyCode, MenuInput};
use crate::core::platform_bridge::{PlatformError, PlatformEvent};
use crate::core::render::{DesignSize, GraphicsBackend, HeadlessBackend};
use crate::core::stage::{Stage, StageContext, StageKey, StageManager, StageRegistry};
use crate::core::viewer::{SoundDelay, ViewerChannel};
use crate::platform::{Platform, RenderSpawner, WindowOptions};

//=== Factories ===========================================================

type EyecatchFactory = Arc<dyn Fn(DesignSize, SharedClock) -> Box<dyn Eyecatch> + Send + Sync>;
type StoreFactory = Arc<dyn Fn() -> Box<dyn SettingsStore> + Send + Sync>;
type BackendFactory = Arc<dyn Fn() -> Box<dyn GraphicsBackend> + Send + Sync>;

//=== EngineBuilder =======================================================

/// Builder for configuring and constructing an [`Engine`].
///
/// # Default Values
///
/// - **Frame rate**: 60.0
/// - **Channel capacity**: 128 events
/// - **Design size**: 1920×1080
/// - **Settings**: `settings.toml` in the working directory
/// - **Backend**: [`HeadlessBackend`]
///
/// # Examples
///
/// ```no_run
/// use aetheric_stage::prelude::*;
///
/// #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// enum Screen { Title, Options }
/// impl StageKey for Screen {}
///
/// EngineBuilder::<Screen>::new()
///     .with_frame_rate(120.0)
///     .register_stage(Screen::Options, |_ctx| Box::new(OptionsStage::new(Screen::Title)))
///     .initial_stage(Screen::Options)
///     .build()
///     .run()
///     .unwrap();
/// ```
pub struct EngineBuilder<S: StageKey> {
    frame_rate: f64,
    channel_capacity: usize,
    design: DesignSize,
    window_title: String,
    registry: StageRegistry<S>,
    eyecatches: Vec<EyecatchFactory>,
    settings_store: StoreFactory,
    backend: BackendFactory,
    bindings: KeyBindings,
    sound_delay_ms: f32,
}

impl<S: StageKey> EngineBuilder<S> {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::from_config(&EngineConfig::default())
    }

    /// Creates a builder from a loaded [`EngineConfig`].
    ///
    /// # Panics
    ///
    /// Panics if the config's frame rate or channel capacity is not
    /// positive.
    pub fn from_config(config: &EngineConfig) -> Self {
        let settings_path = config.settings_path.clone();
        Self {
            frame_rate: 60.0,
            channel_capacity: 128,
            design: DesignSize::default(),
            window_title: config.window_title.clone(),
            registry: StageRegistry::new(),
            eyecatches: Vec::new(),
            settings_store: Arc::new(move || -> Box<dyn SettingsStore> {
                Box::new(TomlSettingsStore::new(settings_path.clone()))
            }),
            backend: Arc::new(|| -> Box<dyn GraphicsBackend> { Box::new(HeadlessBackend::new()) }),
            bindings: KeyBindings::default(),
            sound_delay_ms: 0.0,
        }
        .with_frame_rate(config.frame_rate)
        .with_channel_capacity(config.channel_capacity)
        .with_design_size(config.design_size())
        .with_sound_delay_ms(config.sound_delay_ms)
    }

    //--- Loop Parameters --------------------------------------------------

    /// Sets the target frames per second of the render loop.
    ///
    /// # Panics
    ///
    /// Panics if `frame_rate <= 0.0`.
    pub fn with_frame_rate(mut self, frame_rate: f64) -> Self {
        assert!(frame_rate > 0.0, "Frame rate must be positive, got {}", frame_rate);
        self.frame_rate = frame_rate;
        self
    }

    /// Sets the channel capacity for platform → render communication.
    ///
    /// # Panics
    ///
    /// Panics if `capacity == 0`.
    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        assert!(capacity > 0, "Channel capacity must be positive");
        self.channel_capacity = capacity;
        self
    }

    /// Sets the logical canvas all layout is done in.
    ///
    /// # Panics
    ///
    /// Panics if either dimension is not positive.
    pub fn with_design_size(mut self, design: DesignSize) -> Self {
        assert!(
            design.width > 0.0 && design.height > 0.0,
            "Design size must be positive, got {}x{}",
            design.width,
            design.height
        );
        self.design = design;
        self
    }

    /// Sound output latency reported to viewer clients and stages.
    ///
    /// # Panics
    ///
    /// Panics if `ms` is negative or not finite.
    pub fn with_sound_delay_ms(mut self, ms: f32) -> Self {
        assert!(ms.is_finite() && ms >= 0.0, "Sound delay must be non-negative, got {}", ms);
        self.sound_delay_ms = ms;
        self
    }

    pub fn with_window_title(mut self, title: impl Into<String>) -> Self {
        self.window_title = title.into();
        self
    }

    //--- Stages -----------------------------------------------------------

    /// Registers the factory that builds `key` on every swap into it.
    pub fn register_stage<F>(mut self, key: S, factory: F) -> Self
    where
        F: Fn(&StageContext) -> Box<dyn Stage<S>> + Send + Sync + 'static,
    {
        self.registry.register(key, factory);
        self
    }

    pub fn initial_stage(mut self, key: S) -> Self {
        self.registry.set_initial(key);
        self
    }

    /// Stages entered on viewer Play and Stop.
    pub fn viewer_stages(mut self, play: S, idle: S) -> Self {
        self.registry.set_viewer_stages(play, idle);
        self
    }

    /// Adds an eye-catch next to the built-in ones. Built fresh for every
    /// render loop.
    pub fn with_eyecatch<F>(mut self, factory: F) -> Self
    where
        F: Fn(DesignSize, SharedClock) -> Box<dyn Eyecatch> + Send + Sync + 'static,
    {
        self.eyecatches.push(Arc::new(factory));
        self
    }

    //--- Collaborators ----------------------------------------------------

    /// Replaces the settings store. Each render loop gets its own clone.
    pub fn with_settings_store<T>(mut self, store: T) -> Self
    where
        T: SettingsStore + Clone + Sync + 'static,
    {
        self.settings_store = Arc::new(move || -> Box<dyn SettingsStore> { Box::new(store.clone()) });
        self
    }

    /// Replaces the graphics backend factory.
    pub fn with_backend<F>(mut self, factory: F) -> Self
    where
        F: Fn() -> Box<dyn GraphicsBackend> + Send + Sync + 'static,
    {
        self.backend = Arc::new(factory);
        self
    }

    pub fn with_key_binding(mut self, key: KeyCode, input: MenuInput) -> Self {
        self.bindings.bind(key, input);
        self
    }

    //--- Build ------------------------------------------------------------

    /// Builds the engine instance.
    ///
    /// # Panics
    ///
    /// Panics if no initial stage is set or it has no registered factory.
    pub fn build(self) -> Engine<S> {
        let initial = self.registry.initial();
        assert!(
            initial.is_some_and(|key| self.registry.contains(key)),
            "Initial stage must be registered, got {:?}",
            initial
        );

        info!(
            "Building engine ({} stages, {} fps, channel: {})",
            self.registry.len(),
            self.frame_rate,
            self.channel_capacity
        );

        let (event_sender, event_receiver) = bounded(self.channel_capacity);
        let sound_delay = SoundDelay::default();
        sound_delay.set_ms(self.sound_delay_ms);
        Engine {
            frame_rate: self.frame_rate,
            design: self.design,
            window_title: self.window_title,
            registry: Arc::new(self.registry),
            eyecatches: self.eyecatches,
            settings_store: self.settings_store,
            backend: self.backend,
            bindings: self.bindings,
            sound_delay,
            event_sender,
            event_receiver,
        }
    }
}

impl<S: StageKey> Default for EngineBuilder<S> {
    fn default() -> Self {
        Self::new()
    }
}

//=== Engine ==============================================================

/// Aetheric Stage runtime.
///
/// # Architecture
///
/// ```text
/// Engine (UI Thread)
///   └─► Platform (Winit event loop)
///         ├─► Window, key bindings
///         └─► RenderThreadCoordinator
///               └─► RenderLoop ("render" thread @ frame rate)
///                     └─► StageManager, EyecatchDeck, backend
///
/// Communication: PlatformEvent channel (input, viewer commands),
///                Envelope channel (start/stop/resize),
///                HostSignal channel (restart, exit, screen mode)
/// ```
pub struct Engine<S: StageKey> {
    frame_rate: f64,
    design: DesignSize,
    window_title: String,
    registry: Arc<StageRegistry<S>>,
    eyecatches: Vec<EyecatchFactory>,
    settings_store: StoreFactory,
    backend: BackendFactory,
    bindings: KeyBindings,
    sound_delay: SoundDelay,
    event_sender: Sender<PlatformEvent>,
    event_receiver: Receiver<PlatformEvent>,
}

impl<S: StageKey> Engine<S> {
    /// In-process viewer sink. Commands sent before `run` are handled on
    /// the first frame.
    pub fn viewer_channel(&self) -> ViewerChannel {
        ViewerChannel::new(self.event_sender.clone(), self.sound_delay.clone())
    }

    //--- Execution --------------------------------------------------------

    /// Opens the window, starts rendering, and blocks until the
    /// application exits.
    ///
    /// # Lifecycle
    ///
    /// 1. Reads the saved screen mode for the initial window
    /// 2. Runs the platform event loop (blocks here)
    /// 3. The platform spawns a render thread on resume and again on
    ///    every restart request
    /// 4. On exit the render thread is stopped and joined
    ///
    /// # Errors
    ///
    /// Returns [`PlatformError`] if the event loop fails.
    pub fn run(self) -> Result<(), PlatformError> {
        info!("Starting engine runtime ({} fps)", self.frame_rate);

        let fullscreen = match (self.settings_store)().load() {
            Ok(settings) => settings.is_fullscreen(),
            Err(e) => {
                warn!(target: "config", "Could not read saved screen mode: {}", e);
                false
            }
        };

        let options = WindowOptions {
            title: self.window_title.clone(),
            design: self.design,
            fullscreen,
        };
        let spawner = self.spawner();
        let platform = Platform::new(
            self.event_sender,
            self.event_receiver,
            spawner,
            options,
            self.bindings,
        );

        let result = platform.run();
        info!("Engine shutdown complete");
        result
    }

    //--- Internal Helpers -------------------------------------------------

    /// Builds the closure that spawns one fully wired render thread.
    fn spawner(&self) -> RenderSpawner {
        let registry = self.registry.clone();
        let eyecatches = self.eyecatches.clone();
        let settings_store = self.settings_store.clone();
        let backend = self.backend.clone();
        let sound_delay = self.sound_delay.clone();
        let design = self.design;
        let frame_rate = self.frame_rate;

        Box::new(move |events, signals| {
            let registry = registry.clone();
            let eyecatches = eyecatches.clone();
            let settings_store = settings_store.clone();
            let backend = backend.clone();
            let sound_delay = sound_delay.clone();

            RenderThreadCoordinator::spawn(move |commands| {
                let clock = SystemClock::shared();
                let mut deck = EyecatchDeck::with_builtin(design, clock.clone());
                for factory in &eyecatches {
                    deck.register(factory(design, clock.clone()));
                }

                let ctx = StageContext::new(settings_store(), clock, design, sound_delay);
                let stages = StageManager::new(registry, deck);
                RenderLoop::new(commands, events, backend(), stages, ctx, signals, frame_rate).run();
            })
        })
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use crossbeam_channel::unbounded;

    use super::*;
    use crate::core::config::MemorySettingsStore;
    use crate::core::lifecycle::Activity;
    use crate::core::render::{HostHandle, SurfaceSize};
    use crate::core::stage::{FrameContext, HostSignal};
    use crate::core::viewer::{ViewerCommand, ViewerCommandSink, ViewerPlayRequest};

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    enum TestStage {
        Main,
    }

    impl StageKey for TestStage {}

    struct Noted {
        log: Arc<Mutex<Vec<&'static str>>>,
    }

    impl Activity<StageContext> for Noted {
        fn on_activate(&mut self, _ctx: &mut StageContext) {
            self.log.lock().unwrap().push("activate");
        }
        fn on_dispose(&mut self, _ctx: &mut StageContext) {
            self.log.lock().unwrap().push("dispose");
        }
    }

    impl Stage<TestStage> for Noted {
        fn name(&self) -> &'static str {
            "noted"
        }
        fn progress_and_draw(&mut self, _frame: &mut FrameContext<'_, TestStage>) {}
    }

    fn builder() -> EngineBuilder<TestStage> {
        EngineBuilder::new()
            .register_stage(TestStage::Main, |_ctx| {
                Box::new(Noted {
                    log: Arc::default(),
                })
            })
            .initial_stage(TestStage::Main)
    }

    //=====================================================================
    // EngineBuilder Tests
    //=====================================================================

    #[test]
    fn builder_defaults() {
        let builder = EngineBuilder::<TestStage>::new();
        assert_eq!(builder.frame_rate, 60.0);
        assert_eq!(builder.channel_capacity, 128);
        assert_eq!(builder.design, DesignSize::default());
    }

    #[test]
    fn builder_from_config() {
        let config = EngineConfig {
            frame_rate: 144.0,
            channel_capacity: 32,
            design_width: 1280.0,
            design_height: 720.0,
            window_title: "Preview".to_string(),
            ..EngineConfig::default()
        };
        let builder = EngineBuilder::<TestStage>::from_config(&config);
        assert_eq!(builder.frame_rate, 144.0);
        assert_eq!(builder.channel_capacity, 32);
        assert_eq!(builder.design, DesignSize::new(1280.0, 720.0));
        assert_eq!(builder.window_title, "Preview");
    }

    #[test]
    #[should_panic(expected = "Frame rate must be positive")]
    fn builder_with_frame_rate_panics_on_zero() {
        EngineBuilder::<TestStage>::new().with_frame_rate(0.0);
    }

    #[test]
    #[should_panic(expected = "Channel capacity must be positive")]
    fn builder_with_channel_capacity_panics_on_zero() {
        EngineBuilder::<TestStage>::new().with_channel_capacity(0);
    }

    #[test]
    #[should_panic(expected = "Initial stage must be registered")]
    fn build_requires_initial_stage() {
        EngineBuilder::<TestStage>::new().build();
    }

    #[test]
    #[should_panic(expected = "Sound delay must be non-negative")]
    fn builder_rejects_negative_sound_delay() {
        EngineBuilder::<TestStage>::new().with_sound_delay_ms(-1.0);
    }

    #[test]
    fn stage_registry_crosses_threads_for_any_key() {
        fn assert_send_sync<T: Send + Sync>() {}
        fn registry_for<S: StageKey>() {
            assert_send_sync::<Arc<StageRegistry<S>>>();
        }
        registry_for::<TestStage>();
    }

    #[test]
    fn custom_key_binding_is_added() {
        let builder = builder().with_key_binding(KeyCode::KeyJ, MenuInput::Down);
        assert_eq!(builder.bindings.resolve(KeyCode::KeyJ), Some(MenuInput::Down));
    }

    //=====================================================================
    // Engine Tests
    //=====================================================================

    #[test]
    fn viewer_channel_feeds_render_queue() {
        let engine = builder().build();
        let sink = engine.viewer_channel();

        sink.viewer_play(ViewerPlayRequest::new("song.dtx")).unwrap();
        match engine.event_receiver.try_recv() {
            Ok(PlatformEvent::Viewer(ViewerCommand::Play(request))) => {
                assert_eq!(request.path.to_str(), Some("song.dtx"));
            }
            other => panic!("Expected viewer Play, got {:?}", other),
        }
    }

    #[test]
    fn configured_sound_delay_reaches_viewer_sink() {
        let config = EngineConfig {
            sound_delay_ms: 18.5,
            ..EngineConfig::default()
        };
        let engine = EngineBuilder::<TestStage>::from_config(&config)
            .register_stage(TestStage::Main, |_ctx| Box::new(Noted { log: Arc::default() }))
            .initial_stage(TestStage::Main)
            .build();

        assert_eq!(engine.viewer_channel().sound_delay_ms(), 18.5);
    }

    #[test]
    fn spawner_runs_registered_stages_with_configured_store() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let stage_log = log.clone();
        let engine = EngineBuilder::<TestStage>::new()
            .with_frame_rate(240.0)
            .with_settings_store(MemorySettingsStore::default())
            .register_stage(TestStage::Main, move |_ctx| {
                Box::new(Noted {
                    log: stage_log.clone(),
                })
            })
            .initial_stage(TestStage::Main)
            .build();

        let (signal_tx, _signal_rx) = unbounded::<HostSignal>();
        let coordinator = (engine.spawner())(engine.event_receiver.clone(), signal_tx).unwrap();
        coordinator
            .start(HostHandle(3), SurfaceSize::new(960, 540), DesignSize::default())
            .unwrap();
        coordinator.stop().unwrap();

        assert_eq!(*log.lock().unwrap(), vec!["activate", "dispose"]);
    }
}
