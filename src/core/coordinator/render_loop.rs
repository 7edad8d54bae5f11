//=========================================================================
// Render Loop
//=========================================================================
//
// Body of the render thread.
//
// Each frame:
//  1. Executes every pending coordinator command (blocks while idle)
//  2. Collects platform input and viewer commands
//  3. Runs the current stage through the StageManager
//  4. Forwards host signals and presents
//  5. Sleeps to keep the frame rate
//
// The loop owns the graphics backend, the stages, and the StageContext;
// nothing here is shared with the UI thread.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, Sender, TryRecvError};
use log::{debug, error, info, trace, warn};

//=== Internal Dependencies ===============================================

use super::{Envelope, RenderCommand};
use crate::core::platform_bridge::{EventCollector, PlatformEvent, TickControl};
use crate::core::render::{GraphicsBackend, HostHandle, RenderError, SurfaceSize};
use crate::core::stage::{HostSignal, StageContext, StageKey, StageManager};

//=== RenderLoop ==========================================================

pub struct RenderLoop<S: StageKey> {
    commands: Receiver<Envelope>,
    events: EventCollector,
    backend: Box<dyn GraphicsBackend>,
    stages: StageManager<S>,
    ctx: StageContext,
    signals: Sender<HostSignal>,
    frame_duration: Duration,
    host: Option<HostHandle>,
    surface: Option<SurfaceSize>,
    running: bool,
}

impl<S: StageKey> RenderLoop<S> {
    pub fn new(
        commands: Receiver<Envelope>,
        events: Receiver<PlatformEvent>,
        backend: Box<dyn GraphicsBackend>,
        stages: StageManager<S>,
        ctx: StageContext,
        signals: Sender<HostSignal>,
        frame_rate: f64,
    ) -> Self {
        Self {
            commands,
            events: EventCollector::new(events),
            backend,
            stages,
            ctx,
            signals,
            frame_duration: Duration::from_secs_f64(1.0 / frame_rate),
            host: None,
            surface: None,
            running: false,
        }
    }

    /// Runs until Stop, a fatal error, or the coordinator going away.
    pub fn run(mut self) {
        debug!(target: "render", "Render loop waiting for Start");

        loop {
            let frame_start = Instant::now();

            //--- Step 1: Coordinator commands -----------------------------
            if let TickControl::Exit = self.drain_commands() {
                break;
            }

            //--- Step 2: Platform events ----------------------------------
            if let TickControl::Exit = self.events.collect_frame() {
                info!(target: "render", "Platform disconnected");
                self.shutdown();
                break;
            }

            //--- Step 3 & 4: Stages, signals, present ---------------------
            if let TickControl::Exit = self.frame() {
                break;
            }

            //--- Step 5: Frame pacing -------------------------------------
            let elapsed = frame_start.elapsed();
            if elapsed < self.frame_duration {
                thread::sleep(self.frame_duration - elapsed);
            }
        }

        info!(target: "render", "Render loop exited");
    }

    //--- Commands ---------------------------------------------------------

    fn drain_commands(&mut self) -> TickControl {
        while !self.running {
            match self.commands.recv() {
                Ok(envelope) => {
                    if let TickControl::Exit = self.handle(envelope) {
                        return TickControl::Exit;
                    }
                }
                Err(_) => return TickControl::Exit,
            }
        }

        loop {
            match self.commands.try_recv() {
                Ok(envelope) => {
                    if let TickControl::Exit = self.handle(envelope) {
                        return TickControl::Exit;
                    }
                }
                Err(TryRecvError::Empty) => return TickControl::Continue,
                Err(TryRecvError::Disconnected) => {
                    warn!(target: "render", "Coordinator dropped without Stop");
                    self.shutdown();
                    return TickControl::Exit;
                }
            }
        }
    }

    fn handle(&mut self, envelope: Envelope) -> TickControl {
        let Envelope { command, completion } = envelope;
        debug!(target: "render", "Handling {:?}", command);

        match command {
            RenderCommand::Start {
                host,
                client_size,
                design_size,
            } => {
                if self.running {
                    warn!(target: "render", "Start received while running; ignored");
                    completion.complete(Ok(()));
                    return TickControl::Continue;
                }
                if let Err(e) = self.backend.create_surface(host, client_size, design_size) {
                    error!(target: "render", "Surface creation failed: {}", e);
                    completion.complete(Err(e));
                    return TickControl::Exit;
                }

                self.host = Some(host);
                self.surface = Some(client_size);
                self.ctx.design_size = design_size;
                self.ctx.load_settings();
                self.stages.start(&mut self.ctx);
                self.running = true;
                completion.complete(Ok(()));
                TickControl::Continue
            }

            RenderCommand::Stop => {
                self.shutdown();
                completion.complete(Ok(()));
                TickControl::Exit
            }

            RenderCommand::Resize(size) => {
                if !self.running {
                    completion.complete(Err(RenderError::NoSurface));
                    return TickControl::Continue;
                }
                match self.resize(size) {
                    Ok(()) => {
                        completion.complete(Ok(()));
                        TickControl::Continue
                    }
                    Err(e) => {
                        error!(target: "render", "Resize to {}x{} failed: {}", size.width, size.height, e);
                        self.shutdown();
                        completion.complete(Err(e));
                        TickControl::Exit
                    }
                }
            }
        }
    }

    fn resize(&mut self, size: SurfaceSize) -> Result<(), RenderError> {
        self.stages.release_swapchain_resources(&mut self.ctx);
        self.backend.resize_surface(size)?;
        self.surface = Some(size);
        self.stages.restore_swapchain_resources(&mut self.ctx);
        debug!(target: "render", "Resized to {}x{}", size.width, size.height);
        Ok(())
    }

    /// Releases resources, disposes every stage, and destroys the surface.
    fn shutdown(&mut self) {
        if !self.running {
            self.backend.destroy_surface();
            return;
        }

        self.stages.release_swapchain_resources(&mut self.ctx);
        self.stages.shutdown(&mut self.ctx);
        self.backend.destroy_surface();
        self.running = false;
        self.surface = None;
        info!(target: "render", "Render resources torn down");
    }

    //--- Frame ------------------------------------------------------------

    fn frame(&mut self) -> TickControl {
        let viewer = self.events.take_viewer_commands();
        let dc = self.backend.begin_frame();
        self.stages.update(dc, self.events.input(), viewer, &mut self.ctx);

        for signal in self.ctx.take_host_signals() {
            self.send_signal(signal);
        }

        match self.backend.present() {
            Ok(()) => TickControl::Continue,
            Err(RenderError::SurfaceLost) => {
                warn!(target: "render", "Surface lost; recreating");
                self.recover()
            }
            Err(e) => self.fail(e),
        }
    }

    /// Rebuilds the surface at the last known size after a device loss.
    fn recover(&mut self) -> TickControl {
        let (Some(host), Some(size)) = (self.host, self.surface) else {
            return self.fail(RenderError::NoSurface);
        };

        self.stages.release_swapchain_resources(&mut self.ctx);
        self.backend.destroy_surface();
        if let Err(e) = self.backend.create_surface(host, size, self.ctx.design_size) {
            return self.fail(e);
        }
        self.stages.restore_swapchain_resources(&mut self.ctx);
        info!(target: "render", "Surface recreated at {}x{}", size.width, size.height);
        TickControl::Continue
    }

    fn fail(&mut self, e: RenderError) -> TickControl {
        error!(target: "render", "Fatal render error: {}", e);
        self.send_signal(HostSignal::RenderFailed(e.to_string()));
        self.shutdown();
        TickControl::Exit
    }

    fn send_signal(&self, signal: HostSignal) {
        if self.signals.send(signal).is_err() {
            trace!(target: "render", "Host is no longer listening for signals");
        }
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use crossbeam_channel::{bounded, unbounded};

    use super::*;
    use crate::core::animation::SystemClock;
    use crate::core::config::MemorySettingsStore;
    use crate::core::coordinator::{
        CoordinatorError, RenderThreadCoordinator, ResizeOutcome, ResizeRejection,
    };
    use crate::core::eyecatch::EyecatchDeck;
    use crate::core::input::MenuInput;
    use crate::core::lifecycle::Activity;
    use crate::core::render::{DesignSize, DrawContext, HeadlessBackend};
    use crate::core::stage::{FrameContext, Stage, StageRegistry, StageRequest};
    use crate::core::viewer::SoundDelay;

    //--- Test Helpers -----------------------------------------------------

    type Log = Arc<Mutex<Vec<String>>>;

    fn push(log: &Log, entry: &str) {
        log.lock().unwrap().push(entry.to_string());
    }

    #[derive(Default, Clone)]
    struct Faults {
        fail_create: bool,
        lose_surface: Arc<AtomicBool>,
        break_device: Arc<AtomicBool>,
    }

    struct RecordingBackend {
        log: Log,
        faults: Faults,
        target: HeadlessBackend,
    }

    impl GraphicsBackend for RecordingBackend {
        fn create_surface(
            &mut self,
            host: HostHandle,
            size: SurfaceSize,
            design: DesignSize,
        ) -> Result<(), RenderError> {
            if self.faults.fail_create {
                return Err(RenderError::SurfaceCreation("no adapter".into()));
            }
            push(&self.log, "backend:create");
            self.target.create_surface(host, size, design)
        }

        fn resize_surface(&mut self, size: SurfaceSize) -> Result<(), RenderError> {
            push(&self.log, &format!("backend:resize {}x{}", size.width, size.height));
            self.target.resize_surface(size)
        }

        fn destroy_surface(&mut self) {
            push(&self.log, "backend:destroy");
            self.target.destroy_surface();
        }

        fn begin_frame(&mut self) -> &mut dyn DrawContext {
            self.target.begin_frame()
        }

        fn present(&mut self) -> Result<(), RenderError> {
            if self.faults.lose_surface.swap(false, Ordering::AcqRel) {
                return Err(RenderError::SurfaceLost);
            }
            if self.faults.break_device.load(Ordering::Acquire) {
                return Err(RenderError::Device("removed".into()));
            }
            self.target.present()
        }
    }

    #[derive(Clone, Copy, Eq, PartialEq, Hash, Debug)]
    enum TestStage {
        Main,
    }

    impl StageKey for TestStage {}

    struct RecordingStage {
        log: Log,
    }

    impl Activity<StageContext> for RecordingStage {
        fn on_activate(&mut self, _ctx: &mut StageContext) {
            push(&self.log, "stage:activate");
        }
        fn on_deactivate(&mut self, _ctx: &mut StageContext) {
            push(&self.log, "stage:deactivate");
        }
        fn on_release_swapchain_resources(&mut self, _ctx: &mut StageContext) {
            push(&self.log, "stage:release");
        }
        fn on_restore_swapchain_resources(&mut self, _ctx: &mut StageContext) {
            push(&self.log, "stage:restore");
        }
        fn on_dispose(&mut self, _ctx: &mut StageContext) {
            push(&self.log, "stage:dispose");
        }
    }

    impl Stage<TestStage> for RecordingStage {
        fn name(&self) -> &'static str {
            "recording"
        }

        fn progress_and_draw(&mut self, frame: &mut FrameContext<'_, TestStage>) {
            if frame.input.was_pressed(MenuInput::Cancel) {
                frame.requests.push(StageRequest::Exit);
            }
        }
    }

    struct Rig {
        coordinator: RenderThreadCoordinator,
        log: Log,
        input: Sender<PlatformEvent>,
        signals: Receiver<HostSignal>,
    }

    fn rig(faults: Faults) -> Rig {
        let log = Log::default();
        let (input_tx, input_rx) = bounded(16);
        let (signal_tx, signal_rx) = unbounded();

        let backend_log = log.clone();
        let stage_log = log.clone();
        let coordinator = RenderThreadCoordinator::spawn(move |commands| {
            let mut registry = StageRegistry::new();
            registry.register(TestStage::Main, move |_ctx: &StageContext| -> Box<dyn Stage<TestStage>> {
                Box::new(RecordingStage { log: stage_log.clone() })
            });
            registry.set_initial(TestStage::Main);

            let ctx = StageContext::new(
                Box::new(MemorySettingsStore::default()),
                SystemClock::shared(),
                DesignSize::default(),
                SoundDelay::default(),
            );
            let backend = RecordingBackend {
                log: backend_log,
                faults,
                target: HeadlessBackend::new(),
            };
            RenderLoop::new(
                commands,
                input_rx,
                Box::new(backend),
                StageManager::new(Arc::new(registry), EyecatchDeck::new()),
                ctx,
                signal_tx,
                500.0,
            )
            .run();
        })
        .unwrap();

        Rig {
            coordinator,
            log,
            input: input_tx,
            signals: signal_rx,
        }
    }

    fn start(rig: &Rig) -> Result<(), CoordinatorError> {
        rig.coordinator
            .start(HostHandle(1), SurfaceSize::new(1280, 720), DesignSize::default())
    }

    fn entries(log: &Log) -> Vec<String> {
        log.lock().unwrap().clone()
    }

    fn wait_for(log: &Log, entry: &str) -> bool {
        for _ in 0..200 {
            if entries(log).iter().any(|e| e == entry) {
                return true;
            }
            thread::sleep(Duration::from_millis(5));
        }
        false
    }

    //=====================================================================
    // Start / Stop Tests
    //=====================================================================

    #[test]
    fn start_returns_after_initial_stage_is_active() {
        let rig = rig(Faults::default());
        start(&rig).unwrap();

        assert_eq!(entries(&rig.log), vec!["backend:create", "stage:activate"]);
        rig.coordinator.stop().unwrap();
    }

    #[test]
    fn stop_tears_down_in_order() {
        let rig = rig(Faults::default());
        start(&rig).unwrap();
        rig.coordinator.stop().unwrap();

        assert_eq!(
            entries(&rig.log),
            vec![
                "backend:create",
                "stage:activate",
                "stage:release",
                "stage:deactivate",
                "stage:dispose",
                "backend:destroy",
            ]
        );
    }

    #[test]
    fn start_failure_is_reported_and_loop_exits() {
        let rig = rig(Faults {
            fail_create: true,
            ..Faults::default()
        });

        let result = start(&rig);
        assert!(matches!(
            result,
            Err(CoordinatorError::Render(RenderError::SurfaceCreation(_)))
        ));
        assert!(!rig.coordinator.is_running());
        assert!(rig.coordinator.stop().is_ok());
        assert!(!entries(&rig.log).iter().any(|e| e == "stage:activate"));
    }

    //=====================================================================
    // Resize Tests
    //=====================================================================

    #[test]
    fn resize_releases_then_restores() {
        let rig = rig(Faults::default());
        start(&rig).unwrap();

        let outcome = rig.coordinator.resize(SurfaceSize::new(1920, 1080)).unwrap();
        assert_eq!(outcome, ResizeOutcome::Applied);
        rig.coordinator.stop().unwrap();

        assert_eq!(
            entries(&rig.log)[2..5],
            ["stage:release", "backend:resize 1920x1080", "stage:restore"]
        );
    }

    #[test]
    fn zero_area_resize_touches_nothing() {
        let rig = rig(Faults::default());
        start(&rig).unwrap();

        let outcome = rig.coordinator.resize(SurfaceSize::new(0, 0)).unwrap();
        assert_eq!(outcome, ResizeOutcome::Rejected(ResizeRejection::EmptyClientArea));
        assert_eq!(entries(&rig.log), vec!["backend:create", "stage:activate"]);

        rig.coordinator.stop().unwrap();
    }

    #[test]
    fn concurrent_resizes_never_interleave() {
        let rig = Arc::new(rig(Faults::default()));
        start(&rig).unwrap();

        let workers: Vec<_> = (1..=4u32)
            .map(|i| {
                let rig = rig.clone();
                thread::spawn(move || {
                    for j in 0..3u32 {
                        let size = SurfaceSize::new(100 * i + j, 100);
                        assert_eq!(rig.coordinator.resize(size).unwrap(), ResizeOutcome::Applied);
                    }
                })
            })
            .collect();
        for worker in workers {
            worker.join().unwrap();
        }
        rig.coordinator.stop().unwrap();

        let resize_entries: Vec<String> = entries(&rig.log)
            .into_iter()
            .skip(2)
            .take(12 * 3)
            .collect();
        assert_eq!(resize_entries.len(), 36);
        for triple in resize_entries.chunks(3) {
            assert_eq!(triple[0], "stage:release");
            assert!(triple[1].starts_with("backend:resize"));
            assert_eq!(triple[2], "stage:restore");
        }
    }

    //=====================================================================
    // Frame Tests
    //=====================================================================

    #[test]
    fn surface_loss_is_recovered() {
        let faults = Faults::default();
        let rig = rig(faults.clone());
        start(&rig).unwrap();

        faults.lose_surface.store(true, Ordering::Release);
        assert!(wait_for(&rig.log, "stage:restore"));
        assert!(rig.coordinator.is_running());
        rig.coordinator.stop().unwrap();

        let log = entries(&rig.log);
        assert_eq!(
            log[2..6],
            ["stage:release", "backend:destroy", "backend:create", "stage:restore"]
        );
    }

    #[test]
    fn device_failure_signals_host() {
        let faults = Faults::default();
        let rig = rig(faults.clone());
        start(&rig).unwrap();

        faults.break_device.store(true, Ordering::Release);
        let signal = rig.signals.recv_timeout(Duration::from_secs(2)).unwrap();
        assert!(matches!(signal, HostSignal::RenderFailed(_)));
        assert!(wait_for(&rig.log, "stage:dispose"));
        assert!(rig.coordinator.stop().is_ok());
    }

    #[test]
    fn stage_exit_request_reaches_host() {
        let rig = rig(Faults::default());
        start(&rig).unwrap();

        rig.input.send(PlatformEvent::Inputs(vec![MenuInput::Cancel])).unwrap();
        let signal = rig.signals.recv_timeout(Duration::from_secs(2)).unwrap();
        assert_eq!(signal, HostSignal::ExitRequested);
        rig.coordinator.stop().unwrap();
    }
}
