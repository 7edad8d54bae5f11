//=========================================================================
// Render Thread Coordinator
//=========================================================================
//
// Lets the UI thread start, stop, and resize a render loop running on its
// own thread without ever touching graphics objects.
//
// Architecture:
// ```text
//   UI thread                                  "render" thread
//   ─────────                                  ───────────────
//   RenderThreadCoordinator                    RenderLoop
//     start()  ──Envelope(Start)──►             create surface, start stages
//     resize() ──Envelope(Resize)─►             release → resize → restore
//     stop()   ──Envelope(Stop)───►             dispose stages, destroy surface
//        │                                         │
//        └──── CommandTicket::wait() ◄── Completion::complete()
// ```
//
// Every command blocks its issuer until the render thread has finished
// it. Commands travel over one channel, so they are executed in issue
// order and never overlap.
//
//=========================================================================

//=== Module Declarations =================================================

mod command;
mod render_loop;

//=== Public API ==========================================================

pub use command::{envelope, CommandTicket, Completion, Envelope, RenderCommand};
pub use render_loop::RenderLoop;

//=== External Dependencies ===============================================

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};
use std::thread::{self, JoinHandle};

use crossbeam_channel::{unbounded, Receiver, Sender};
use log::{debug, info, warn};
use thiserror::Error;

//=== Internal Dependencies ===============================================

use crate::core::render::{DesignSize, HostHandle, RenderError, SurfaceSize};

//=== Errors ==============================================================

#[derive(Debug, Error)]
pub enum CoordinatorError {
    #[error("render loop has already been started")]
    AlreadyStarted,

    #[error("render thread is no longer running")]
    RenderThreadGone,

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error("failed to spawn render thread: {0}")]
    Spawn(#[from] io::Error),

    #[error("render thread panicked")]
    ThreadPanicked,
}

//=== ResizeOutcome =======================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizeRejection {
    NotStarted,
    EmptyClientArea,
    Minimized,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizeOutcome {
    /// The render thread has recreated the swap chain.
    Applied,

    /// Nothing was sent to the render thread.
    Rejected(ResizeRejection),
}

//=== RenderThreadCoordinator =============================================

pub struct RenderThreadCoordinator {
    commands: Sender<Envelope>,
    handle: Mutex<Option<JoinHandle<()>>>,
    started: AtomicBool,
    stopped: AtomicBool,
    minimized: AtomicBool,
}

impl RenderThreadCoordinator {
    //--- Construction -----------------------------------------------------

    /// Spawns the `render` thread running `body`.
    ///
    /// `body` receives the command channel and must answer every envelope.
    pub fn spawn<F>(body: F) -> Result<Self, CoordinatorError>
    where
        F: FnOnce(Receiver<Envelope>) + Send + 'static,
    {
        let (tx, rx) = unbounded();
        let handle = thread::Builder::new()
            .name("render".to_string())
            .spawn(move || body(rx))?;
        info!(target: "render", "Render thread spawned");

        Ok(Self {
            commands: tx,
            handle: Mutex::new(Some(handle)),
            started: AtomicBool::new(false),
            stopped: AtomicBool::new(false),
            minimized: AtomicBool::new(false),
        })
    }

    //--- Queries ----------------------------------------------------------

    pub fn is_running(&self) -> bool {
        self.started.load(Ordering::Acquire) && !self.stopped.load(Ordering::Acquire)
    }

    pub fn set_minimized(&self, minimized: bool) {
        if self.minimized.swap(minimized, Ordering::AcqRel) != minimized {
            debug!(target: "render", "Host minimized: {}", minimized);
        }
    }

    //--- Commands ---------------------------------------------------------

    /// Creates the surface and activates the initial stage. Blocks until
    /// both are done.
    pub fn start(
        &self,
        host: HostHandle,
        client_size: SurfaceSize,
        design_size: DesignSize,
    ) -> Result<(), CoordinatorError> {
        if self.stopped.load(Ordering::Acquire) {
            return Err(CoordinatorError::RenderThreadGone);
        }
        if self.started.swap(true, Ordering::AcqRel) {
            return Err(CoordinatorError::AlreadyStarted);
        }

        let result = self.issue(RenderCommand::Start {
            host,
            client_size,
            design_size,
        });
        match &result {
            Ok(()) => info!(target: "render", "Render loop started at {}x{}", client_size.width, client_size.height),
            Err(e) => {
                warn!(target: "render", "Render loop failed to start: {}", e);
                self.started.store(false, Ordering::Release);
            }
        }
        result
    }

    /// Disposes every stage, destroys the surface, and joins the render
    /// thread. Idempotent.
    pub fn stop(&self) -> Result<(), CoordinatorError> {
        if self.stopped.swap(true, Ordering::AcqRel) {
            return Ok(());
        }

        let result = match self.issue(RenderCommand::Stop) {
            Err(CoordinatorError::RenderThreadGone) => Ok(()),
            other => other,
        };
        self.started.store(false, Ordering::Release);
        self.join()?;
        info!(target: "render", "Render loop stopped");
        result
    }

    /// Recreates the swap chain at `size`. Blocks until resources are
    /// restored.
    ///
    /// Rejected without touching the render thread when the loop is not
    /// running, the client area is empty, or the host is minimized.
    pub fn resize(&self, size: SurfaceSize) -> Result<ResizeOutcome, CoordinatorError> {
        let rejection = if !self.is_running() {
            Some(ResizeRejection::NotStarted)
        } else if size.is_empty() {
            Some(ResizeRejection::EmptyClientArea)
        } else if self.minimized.load(Ordering::Acquire) {
            Some(ResizeRejection::Minimized)
        } else {
            None
        };

        if let Some(reason) = rejection {
            debug!(target: "render", "Resize to {}x{} rejected: {:?}", size.width, size.height, reason);
            return Ok(ResizeOutcome::Rejected(reason));
        }

        self.issue(RenderCommand::Resize(size))?;
        Ok(ResizeOutcome::Applied)
    }

    //--- Internal Helpers -------------------------------------------------

    fn issue(&self, command: RenderCommand) -> Result<(), CoordinatorError> {
        let (envelope, ticket) = envelope(command);
        self.commands
            .send(envelope)
            .map_err(|_| CoordinatorError::RenderThreadGone)?;
        ticket.wait()
    }

    fn join(&self) -> Result<(), CoordinatorError> {
        let handle = self
            .handle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        match handle {
            Some(handle) if handle.thread().id() != thread::current().id() => {
                handle.join().map_err(|_| CoordinatorError::ThreadPanicked)
            }
            _ => Ok(()),
        }
    }
}

impl Drop for RenderThreadCoordinator {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            warn!(target: "render", "Render loop did not stop cleanly: {}", e);
        }
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
