//=========================================================================
// Eye-catch Transitions
//=========================================================================
//
// Full-screen transitions that cover the swap between two stages.
//
// Architecture:
// ```text
//   EyecatchDeck
//     ├─ entries: Vec<Box<dyn Eyecatch>>   (registered by name)
//     └─ current: index of the selected eye-catch
//
//   Eyecatch (HalfTurnFade, Shutter)
//     └─ Sequencer
//          ├─ phase: Undefined → Close → CloseComplete → Open → OpenComplete
//          └─ storyboard: rebuilt on every open() / close()
// ```
//
// A closing stage selects an eye-catch and closes it; the next stage
// finds it CloseComplete and opens it again.
//
//=========================================================================

//=== Module Declarations =================================================

mod deck;
mod half_turn_fade;
mod sequencer;
mod shutter;

//=== Public API ==========================================================

pub use deck::{EyecatchDeck, EyecatchError};
pub use half_turn_fade::HalfTurnFade;
pub use sequencer::Sequencer;
pub use shutter::Shutter;

//=== Internal Dependencies ===============================================

use crate::core::animation::{AnimationError, StoryboardStatus};
use crate::core::render::DrawContext;

//=== EyecatchPhase =======================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EyecatchPhase {
    /// Never opened or closed.
    #[default]
    Undefined,

    /// Uncovering the screen.
    Open,

    /// Screen fully uncovered.
    OpenComplete,

    /// Covering the screen.
    Close,

    /// Screen fully covered.
    CloseComplete,
}

//=== Eyecatch Trait ======================================================

/// A timed, completion-gated transition effect.
pub trait Eyecatch: Send {
    /// Registry name used by [`EyecatchDeck::select`].
    fn name(&self) -> &'static str;

    fn phase(&self) -> EyecatchPhase;

    /// Rebuilds the storyboard for uncovering and enters `Open`.
    ///
    /// `speed > 1` plays faster. Invalid speeds are rejected and leave the
    /// current animation untouched.
    fn open(&mut self, speed: f64) -> Result<(), AnimationError>;

    /// Rebuilds the storyboard for covering and enters `Close`.
    fn close(&mut self, speed: f64) -> Result<(), AnimationError>;

    /// Samples the storyboard at the current time, composites the effect
    /// unless the status equals `suppress_if`, and completes the phase once
    /// the storyboard is Ready.
    fn advance_and_render(&mut self, dc: &mut dyn DrawContext, suppress_if: Option<StoryboardStatus>);
}
