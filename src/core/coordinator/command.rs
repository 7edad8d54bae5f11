//=========================================================================
// Render Commands
//=========================================================================
//
// Commands sent from the UI thread to the render thread, each paired with
// a single-slot completion the issuer blocks on.
//
//   UI thread                      render thread
//   ─────────                      ─────────────
//   envelope(cmd) ──Envelope──►    handle(cmd)
//   ticket.wait() ◄──Result────    completion.complete(result)
//
//=========================================================================

//=== External Dependencies ===============================================

use crossbeam_channel::{bounded, Receiver, Sender};
use log::trace;

//=== Internal Dependencies ===============================================

use super::CoordinatorError;
use crate::core::render::{DesignSize, HostHandle, RenderError, SurfaceSize};

//=== RenderCommand =======================================================

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RenderCommand {
    /// Create the surface and activate the initial stage.
    Start {
        host: HostHandle,
        client_size: SurfaceSize,
        design_size: DesignSize,
    },

    /// Dispose every stage, destroy the surface, and end the loop.
    Stop,

    /// Recreate the swap chain at a new client size.
    Resize(SurfaceSize),
}

//=== Completion ==========================================================

/// Render-side half of a command rendezvous. Consumed on completion, so
/// every command is answered exactly once.
#[derive(Debug)]
pub struct Completion {
    slot: Sender<Result<(), RenderError>>,
}

impl Completion {
    pub fn complete(self, result: Result<(), RenderError>) {
        // The issuer may have given up waiting.
        if self.slot.send(result).is_err() {
            trace!(target: "render", "Command issuer is no longer waiting");
        }
    }
}

//=== CommandTicket =======================================================

/// Issuer-side half of a command rendezvous.
#[derive(Debug)]
pub struct CommandTicket {
    slot: Receiver<Result<(), RenderError>>,
}

impl CommandTicket {
    /// Blocks until the render thread has finished the command.
    ///
    /// Fails with `RenderThreadGone` if the render thread dropped the
    /// completion without answering.
    pub fn wait(self) -> Result<(), CoordinatorError> {
        match self.slot.recv() {
            Ok(result) => result.map_err(CoordinatorError::from),
            Err(_) => Err(CoordinatorError::RenderThreadGone),
        }
    }
}

//=== Envelope ============================================================

#[derive(Debug)]
pub struct Envelope {
    pub command: RenderCommand,
    pub completion: Completion,
}

/// Wraps `command` for sending and returns the ticket to wait on.
pub fn envelope(command: RenderCommand) -> (Envelope, CommandTicket) {
    let (tx, rx) = bounded(1);
    (
        Envelope {
            command,
            completion: Completion { slot: tx },
        },
        CommandTicket { slot: rx },
    )
}

//=========================================================================
// Unit Tests
//=========================================================================
