//=========================================================================
// Animation System
//=========================================================================
//
// Time-based scalar animation used by eye-catches and panel fades.
//
// Architecture:
//   StoryboardBuilder
//     ├─ add_variable(name, initial) → VariableId
//     ├─ add_transition(id, Transition)   (segments queue per variable)
//     └─ schedule(t0) → Storyboard
//
//   Storyboard::update(now) → StoryboardStatus
//     └─ AnimationVariable::update(now - t0) per variable
//
// Time is supplied by a `Clock` (seconds as f64). The render loop uses
// `SystemClock`; tests drive a `ManualClock`.
//
//=========================================================================

//=== Module Declarations =================================================

mod clock;
mod storyboard;
mod transition;
mod variable;

//=== Public API ==========================================================

pub use clock::{Clock, ManualClock, SharedClock, SystemClock};
pub use storyboard::{Storyboard, StoryboardBuilder, StoryboardStatus, VariableId};
pub use transition::{accelerate_decelerate, Transition, TransitionKind};
pub use variable::AnimationVariable;

//=== External Dependencies ===============================================

use thiserror::Error;

//=== AnimationError ======================================================

/// Contract violations detected while building animations.
///
/// These are programming errors in the caller; they are reported
/// immediately and never clamped into range.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum AnimationError {
    /// Segment duration was zero, negative, or not finite.
    #[error("transition duration must be positive and finite, got {0}")]
    InvalidDuration(f64),

    /// Acceleration/deceleration ratios outside `[0, 1]` or summing above 1.
    #[error(
        "easing ratios must lie in [0, 1] and sum to at most 1, \
         got acceleration {acceleration} and deceleration {deceleration}"
    )]
    InvalidEasingRatios { acceleration: f64, deceleration: f64 },

    /// Target or initial value was NaN or infinite.
    #[error("animation value must be finite, got {0}")]
    NonFiniteValue(f64),

    /// Eye-catch speed multiplier was zero, negative, or not finite.
    #[error("speed multiplier must be positive and finite, got {0}")]
    InvalidSpeedMultiplier(f64),
}

/// Converts a nominal duration into a playback duration for `speed`.
///
/// `speed > 1` plays faster. Rejects non-positive or non-finite speeds.
pub fn scaled_duration(seconds: f64, speed: f64) -> Result<f64, AnimationError> {
    if !speed.is_finite() || speed <= 0.0 {
        return Err(AnimationError::InvalidSpeedMultiplier(speed));
    }
    Ok(seconds / speed)
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scaled_duration_divides_by_speed() {
        assert_eq!(scaled_duration(0.4, 2.0), Ok(0.2));
        assert_eq!(scaled_duration(0.6, 0.5), Ok(1.2));
    }

    #[test]
    fn scaled_duration_rejects_bad_speed() {
        assert_eq!(
            scaled_duration(0.4, 0.0),
            Err(AnimationError::InvalidSpeedMultiplier(0.0))
        );
        assert!(scaled_duration(0.4, -1.0).is_err());
        assert!(scaled_duration(0.4, f64::NAN).is_err());
        assert!(scaled_duration(0.4, f64::INFINITY).is_err());
    }

    #[test]
    fn error_messages_name_the_offending_value() {
        let msg = AnimationError::InvalidDuration(-0.5).to_string();
        assert!(msg.contains("-0.5"));
    }
}
