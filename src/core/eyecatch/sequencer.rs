//=========================================================================
// Sequencer
//=========================================================================
//
// Phase bookkeeping shared by every eye-catch: owns the active
// storyboard, samples it against the clock, and fires the
// Open → OpenComplete / Close → CloseComplete edge exactly once.
//
//=========================================================================

//=== External Dependencies ===============================================

use log::debug;

//=== Internal Dependencies ===============================================

use super::EyecatchPhase;
use crate::core::animation::{SharedClock, Storyboard, StoryboardBuilder, StoryboardStatus};

//=== Sequencer ===========================================================

pub struct Sequencer {
    name: &'static str,
    clock: SharedClock,
    phase: EyecatchPhase,
    storyboard: Option<Storyboard>,
}

impl Sequencer {
    pub fn new(name: &'static str, clock: SharedClock) -> Self {
        Self {
            name,
            clock,
            phase: EyecatchPhase::Undefined,
            storyboard: None,
        }
    }

    pub fn phase(&self) -> EyecatchPhase {
        self.phase
    }

    pub fn storyboard(&self) -> Option<&Storyboard> {
        self.storyboard.as_ref()
    }

    /// True while covering or covered; a further close is a no-op.
    pub fn is_closing(&self) -> bool {
        matches!(self.phase, EyecatchPhase::Close | EyecatchPhase::CloseComplete)
    }

    /// Discards the previous storyboard and schedules `builder` now.
    ///
    /// `phase` must be `Open` or `Close`.
    pub fn begin(&mut self, phase: EyecatchPhase, builder: StoryboardBuilder) {
        debug_assert!(matches!(phase, EyecatchPhase::Open | EyecatchPhase::Close));

        let now = self.clock.now();
        self.storyboard = Some(builder.schedule(now));
        self.phase = phase;
        debug!(target: "eyecatch", "{} -> {:?} at t={:.3}", self.name, phase, now);
    }

    /// Samples the storyboard and advances the phase when it is Ready.
    ///
    /// Returns the storyboard status, or `None` when nothing has been
    /// scheduled yet.
    pub fn advance(&mut self) -> Option<StoryboardStatus> {
        let now = self.clock.now();
        let status = self.storyboard.as_mut()?.update(now);

        if status == StoryboardStatus::Ready {
            let completed = match self.phase {
                EyecatchPhase::Open => Some(EyecatchPhase::OpenComplete),
                EyecatchPhase::Close => Some(EyecatchPhase::CloseComplete),
                _ => None,
            };
            if let Some(next) = completed {
                debug!(target: "eyecatch", "{} -> {:?}", self.name, next);
                self.phase = next;
            }
        }

        Some(status)
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::core::animation::{ManualClock, Transition};

    fn board(duration: f64) -> StoryboardBuilder {
        let mut builder = StoryboardBuilder::new();
        let v = builder.add_variable("v", 0.0);
        builder.add_transition(v, Transition::linear(duration, 1.0).unwrap());
        builder
    }

    #[test]
    fn closing_tracks_close_phases_only() {
        let clock = Arc::new(ManualClock::new(0.0));
        let mut seq = Sequencer::new("test", clock.clone());
        assert!(!seq.is_closing());

        seq.begin(EyecatchPhase::Close, board(0.4));
        assert!(seq.is_closing());
        clock.set(1.0);
        seq.advance();
        assert_eq!(seq.phase(), EyecatchPhase::CloseComplete);
        assert!(seq.is_closing());

        seq.begin(EyecatchPhase::Open, board(0.4));
        assert!(!seq.is_closing());
    }

    #[test]
    fn advance_without_storyboard_is_none() {
        let mut seq = Sequencer::new("test", Arc::new(ManualClock::new(0.0)));
        assert_eq!(seq.advance(), None);
        assert_eq!(seq.phase(), EyecatchPhase::Undefined);
    }

    #[test]
    fn close_completes_once_ready() {
        let clock = Arc::new(ManualClock::new(0.0));
        let mut seq = Sequencer::new("test", clock.clone());
        seq.begin(EyecatchPhase::Close, board(0.4));

        clock.set(0.2);
        assert_eq!(seq.advance(), Some(StoryboardStatus::Playing));
        assert_eq!(seq.phase(), EyecatchPhase::Close);

        clock.set(0.5);
        assert_eq!(seq.advance(), Some(StoryboardStatus::Ready));
        assert_eq!(seq.phase(), EyecatchPhase::CloseComplete);

        clock.set(2.0);
        seq.advance();
        assert_eq!(seq.phase(), EyecatchPhase::CloseComplete);
    }

    #[test]
    fn begin_replaces_storyboard() {
        let clock = Arc::new(ManualClock::new(0.0));
        let mut seq = Sequencer::new("test", clock.clone());
        seq.begin(EyecatchPhase::Close, board(1.0));

        clock.set(0.5);
        seq.begin(EyecatchPhase::Open, board(1.0));

        let start = seq.storyboard().map(Storyboard::start_time);
        assert_eq!(start, Some(0.5));
        assert_eq!(seq.phase(), EyecatchPhase::Open);
    }
}
