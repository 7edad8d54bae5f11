//=========================================================================
// Platform Subsystem
//
// Bridges Winit (OS-level events) with the render thread.
//
// Architecture:
// ```text
//  UI Thread:                          Render Thread:
//  ┌─────────────────────────────┐    ┌──────────────────────┐
//  │  Winit Event Loop           │    │  RenderLoop          │
//  │   ↓                         │    │   ├─ EventCollector  │
//  │  InputProcessor             │    │   ├─ StageManager    │
//  │   └─ KeyCode → MenuInput    │    │   └─ GraphicsBackend │
//  │   ↓                         │    │          ↑           │
//  │  InputBuffer                │    └──────────┼───────────┘
//  │   ↓ RedrawRequested (flush) │               │
//  │  PlatformEvent channel ─────┼───────────────┤
//  │                             │               │
//  │  RenderThreadCoordinator ───┼── Start/Stop/Resize (blocking)
//  │                             │               │
//  │  about_to_wait ◄────────────┼── HostSignal ─┘
//  └─────────────────────────────┘
// ```
//
// Key Design Decisions:
// - **RedrawRequested = frame boundary**: all presses since the previous
//   redraw are sent as one batch
// - **Blocking commands**: start/stop/resize return only once the render
//   thread has finished them, so the UI never races graphics objects
// - **Graceful channel disconnect**: if the render thread dies, the
//   platform logs a warning and keeps running so the window can close
// - **Main thread requirement**: Winit mandates main thread on macOS/iOS,
//   so this runs on the thread that called `Engine::run()`
//
//=========================================================================

//=== Submodules ==========================================================

mod input_buffer;
mod input_processor;

//=== External Crates =====================================================

use crossbeam_channel::{unbounded, Receiver, Sender};
use log::*;
use winit::{
    application::ApplicationHandler,
    dpi::LogicalSize,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, EventLoop},
    window::{Fullscreen, Window, WindowAttributes, WindowId},
};

//=== Internal Imports ====================================================

use crate::core::coordinator::{CoordinatorError, RenderThreadCoordinator, ResizeOutcome};
use crate::core::input::KeyBindings;
use crate::core::platform_bridge::{PlatformError, PlatformEvent, TickControl};
use crate::core::render::{DesignSize, HostHandle, SurfaceSize};
use crate::core::stage::HostSignal;
use input_buffer::InputBuffer;
use input_processor::InputProcessor;

//=== RenderSpawner =======================================================

/// Spawns a fresh render thread wired to the given event and signal
/// channels. Called on first resume and on every restart.
pub(crate) type RenderSpawner = Box<
    dyn Fn(Receiver<PlatformEvent>, Sender<HostSignal>) -> Result<RenderThreadCoordinator, CoordinatorError>,
>;

//=== WindowOptions =======================================================

#[derive(Debug, Clone)]
pub(crate) struct WindowOptions {
    pub title: String,
    pub design: DesignSize,
    pub fullscreen: bool,
}

//=== Platform ============================================================

/// Window owner, input aggregator and render-thread supervisor.
///
/// # Lifecycle
///
/// 1. **Construction**: `Platform::new(..)` - no window yet
/// 2. **Resume**: window created, render thread spawned and started
/// 3. **Events**: resizes and key presses forwarded to the render thread
/// 4. **Shutdown**: close request or host signal stops the render thread,
///    then exits the event loop
///
/// This type is NOT Send - it stays on the UI thread.
pub(crate) struct Platform {
    /// OS window handle (None until `resumed()` called).
    window: Option<Window>,
    options: WindowOptions,

    buffer: InputBuffer,
    input_processor: InputProcessor,

    /// Platform → render channel. The receiver is handed to each new
    /// render loop.
    event_sender: Sender<PlatformEvent>,
    event_receiver: Receiver<PlatformEvent>,

    signal_sender: Sender<HostSignal>,
    signals: Receiver<HostSignal>,

    spawner: RenderSpawner,
    coordinator: Option<RenderThreadCoordinator>,
}

impl Platform {
    //--- Construction -----------------------------------------------------

    pub fn new(
        event_sender: Sender<PlatformEvent>,
        event_receiver: Receiver<PlatformEvent>,
        spawner: RenderSpawner,
        options: WindowOptions,
        bindings: KeyBindings,
    ) -> Self {
        let (signal_sender, signals) = unbounded();
        info!(target: "platform", "Platform subsystem initialized");
        Self {
            window: None,
            options,
            buffer: InputBuffer::new(),
            input_processor: InputProcessor::new(bindings),
            event_sender,
            event_receiver,
            signal_sender,
            signals,
            spawner,
            coordinator: None,
        }
    }

    //--- Execution --------------------------------------------------------

    /// Runs the Winit event loop until the application exits.
    ///
    /// # Errors
    ///
    /// Returns [`PlatformError`] if the event loop cannot be created or
    /// fails while running.
    pub fn run(mut self) -> Result<(), PlatformError> {
        debug!(target: "platform", "Starting Winit event loop");

        let event_loop = EventLoop::new().map_err(PlatformError::EventLoopCreation)?;
        let result = event_loop
            .run_app(&mut self)
            .map_err(PlatformError::EventLoopExecution);

        self.stop_render();
        result
    }

    //--- Render Thread ----------------------------------------------------

    /// Spawns and starts a render loop for the current window.
    fn start_render(&mut self) -> bool {
        let Some(window) = &self.window else {
            warn!(target: "platform", "Cannot start rendering without a window");
            return false;
        };
        let host = HostHandle::from(window.id());
        let client = SurfaceSize::from(window.inner_size());

        let coordinator = match (self.spawner)(self.event_receiver.clone(), self.signal_sender.clone()) {
            Ok(coordinator) => coordinator,
            Err(e) => {
                error!(target: "platform", "Render thread spawn failed: {}", e);
                return false;
            }
        };

        match coordinator.start(host, client, self.options.design) {
            Ok(()) => {
                self.coordinator = Some(coordinator);
                true
            }
            Err(e) => {
                error!(target: "platform", "Render loop failed to start: {}", e);
                false
            }
        }
    }

    fn stop_render(&mut self) {
        if let Some(coordinator) = self.coordinator.take() {
            if let Err(e) = coordinator.stop() {
                warn!(target: "platform", "Render loop did not stop cleanly: {}", e);
            }
        }
    }

    fn resize_render(&mut self, size: SurfaceSize) {
        let Some(coordinator) = &self.coordinator else {
            return;
        };
        let minimized = self
            .window
            .as_ref()
            .and_then(Window::is_minimized)
            .unwrap_or(false);
        coordinator.set_minimized(minimized);

        match coordinator.resize(size) {
            Ok(ResizeOutcome::Applied) => {}
            Ok(ResizeOutcome::Rejected(reason)) => {
                trace!(target: "platform", "Resize {}x{} skipped: {:?}", size.width, size.height, reason);
            }
            Err(e) => error!(target: "platform", "Resize failed: {}", e),
        }
    }

    //--- Host Signals -----------------------------------------------------

    /// Applies one signal from the render thread.
    fn handle_signal(&mut self, signal: HostSignal) -> TickControl {
        debug!(target: "platform", "Host signal: {:?}", signal);
        match signal {
            HostSignal::ExitRequested => {
                self.stop_render();
                TickControl::Exit
            }
            HostSignal::RenderFailed(reason) => {
                error!(target: "platform", "Rendering failed: {}", reason);
                self.stop_render();
                TickControl::Exit
            }
            HostSignal::RestartRequested => {
                info!(target: "platform", "Restarting render loop");
                self.stop_render();
                self.buffer.clear();
                self.discard_stale_input();
                if self.start_render() {
                    TickControl::Continue
                } else {
                    TickControl::Exit
                }
            }
            HostSignal::ScreenModeChanged(fullscreen) => {
                self.apply_screen_mode(fullscreen);
                TickControl::Continue
            }
        }
    }

    /// Drops input batches the stopped loop never consumed. Viewer
    /// commands are queued again for the next loop.
    fn discard_stale_input(&mut self) {
        let pending: Vec<PlatformEvent> = self.event_receiver.try_iter().collect();
        let mut dropped = 0;
        for event in pending {
            match event {
                PlatformEvent::Inputs(_) => dropped += 1,
                viewer @ PlatformEvent::Viewer(_) => {
                    if self.event_sender.try_send(viewer).is_err() {
                        warn!(target: "platform", "Viewer command lost during restart");
                    }
                }
            }
        }
        if dropped > 0 {
            debug!(target: "platform", "Discarded {} stale input batches", dropped);
        }
    }

    fn apply_screen_mode(&mut self, fullscreen: bool) {
        self.options.fullscreen = fullscreen;
        if let Some(window) = &self.window {
            window.set_fullscreen(fullscreen.then_some(Fullscreen::Borderless(None)));
            info!(target: "platform", "Screen mode: {}", if fullscreen { "fullscreen" } else { "window" });
        }
    }

    //--- Internal Helpers -------------------------------------------------

    /// Sends the presses buffered since the previous redraw.
    ///
    /// A disconnected channel (render thread gone) drops the batch with a
    /// warning.
    fn flush_input_buffer(&mut self) {
        if let Some(batch) = self.buffer.drain() {
            let count = batch.len();
            trace!(target: "platform::input", "Flushing {} inputs", count);

            if self.event_sender.send(PlatformEvent::Inputs(batch)).is_err() {
                warn!(target: "platform::input", "Channel disconnected, dropping {} inputs", count);
            }
        }
    }

    //--- Test Accessors ---------------------------------------------------

    #[cfg(test)]
    pub(crate) fn window(&self) -> Option<&Window> {
        self.window.as_ref()
    }
}

//=== Winit Integration ===================================================

impl ApplicationHandler for Platform {
    /// Creates the window and starts rendering. On mobile, this may be
    /// called multiple times (suspend/resume cycle).
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            debug!(target: "platform", "Window already exists (mobile resume?)");
            return;
        }

        let design = self.options.design;
        let mut attrs = WindowAttributes::default()
            .with_title(self.options.title.clone())
            .with_inner_size(LogicalSize::new(design.width / 2.0, design.height / 2.0));
        if self.options.fullscreen {
            attrs = attrs.with_fullscreen(Some(Fullscreen::Borderless(None)));
        }

        match event_loop.create_window(attrs) {
            Ok(window) => {
                info!(
                    target: "platform",
                    "Window created: {}x{} @ {}x DPI",
                    window.inner_size().width,
                    window.inner_size().height,
                    window.scale_factor()
                );
                window.request_redraw();
                self.window = Some(window);
            }
            Err(e) => {
                error!(target: "platform", "Window creation failed: {}", e);
                event_loop.exit();
                return;
            }
        }

        if !self.start_render() {
            event_loop.exit();
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        match &event {
            WindowEvent::CloseRequested => {
                info!(target: "platform", "Window close requested");
                self.stop_render();
                event_loop.exit();
            }

            WindowEvent::Resized(size) => {
                self.resize_render(SurfaceSize::from(*size));
            }

            WindowEvent::KeyboardInput { event: key_event, .. } => {
                if let Some(input) = self.input_processor.process_key_event(key_event) {
                    self.buffer.push(input);
                }
            }

            WindowEvent::RedrawRequested => {
                // Frame boundary: flush all buffered input
                self.flush_input_buffer();

                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }

            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        while let Ok(signal) = self.signals.try_recv() {
            if let TickControl::Exit = self.handle_signal(signal) {
                event_loop.exit();
                return;
            }
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        self.stop_render();
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
