//=========================================================================
// Phase Machine
//=========================================================================
//
// Explicit (phase, event) → (next phase, effect) tables for stages.
//
// Each stage declares its phases as an enum implementing `Phase`. The
// machine applies the table and refuses to leave terminal phases; the
// stage then acts on the returned effect.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::fmt::Debug;

use log::{debug, trace};

//=== Phase Trait =========================================================

pub trait Phase: Copy + Eq + Debug {
    type Event: Debug;
    type Effect;

    /// Phases that are never left once entered.
    fn is_terminal(self) -> bool;

    /// Transition table. `None` means the event is ignored in this phase.
    fn on_event(self, event: &Self::Event) -> Option<(Self, Self::Effect)>;
}

//=== PhaseMachine ========================================================

#[derive(Debug)]
pub struct PhaseMachine<P: Phase> {
    name: &'static str,
    initial: P,
    current: P,
}

impl<P: Phase> PhaseMachine<P> {
    pub fn new(name: &'static str, initial: P) -> Self {
        Self {
            name,
            initial,
            current: initial,
        }
    }

    pub fn current(&self) -> P {
        self.current
    }

    pub fn is_terminal(&self) -> bool {
        self.current.is_terminal()
    }

    /// Feeds `event` through the table and returns the effect to perform.
    pub fn fire(&mut self, event: P::Event) -> Option<P::Effect> {
        if self.current.is_terminal() {
            trace!(target: "stage", "{}: {:?} ignored in terminal {:?}", self.name, event, self.current);
            return None;
        }

        let (next, effect) = self.current.on_event(&event)?;
        if next != self.current {
            debug!(target: "stage", "{}: {:?} --{:?}--> {:?}", self.name, self.current, event, next);
        }
        self.current = next;
        Some(effect)
    }

    /// Returns to the initial phase, for reactivation.
    pub fn reset(&mut self) {
        self.current = self.initial;
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
