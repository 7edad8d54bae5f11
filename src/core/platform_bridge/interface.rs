//=========================================================================
// Platform Bridge Interface
//=========================================================================
//
// Platform-to-render-thread interface types (events and errors).
//
// Defines the contract for communication between the platform thread
// and the render loop.
//
//=========================================================================

//=== External Dependencies ===============================================

use thiserror::Error;

//=== Internal Dependencies ===============================================

use crate::core::input::MenuInput;
use crate::core::viewer::ViewerCommand;

//=== PlatformEvent =======================================================

/// Events sent from the platform thread to the render loop.
#[derive(Debug, Clone, PartialEq)]
pub enum PlatformEvent {
    /// Menu inputs buffered since the previous redraw.
    Inputs(Vec<MenuInput>),

    /// Viewer-mode command from the command line or a remote peer.
    Viewer(ViewerCommand),
}

//=== PlatformError =======================================================

/// Platform initialization and runtime errors.
#[derive(Debug, Error)]
pub enum PlatformError {
    /// Event loop creation failed (OS-level issue).
    #[error("event loop creation failed: {0}")]
    EventLoopCreation(#[source] winit::error::EventLoopError),

    /// Event loop execution error.
    #[error("event loop error: {0}")]
    EventLoopExecution(#[source] winit::error::EventLoopError),
}
