//=========================================================================
// Eye-catch Deck
//=========================================================================
//
// Registry of eye-catches by name with a single current selection.
//
//=========================================================================

//=== External Dependencies ===============================================

use log::{debug, warn};
use thiserror::Error;

//=== Internal Dependencies ===============================================

use super::{Eyecatch, HalfTurnFade, Shutter};
use crate::core::animation::{AnimationError, SharedClock};
use crate::core::render::DesignSize;

//=== EyecatchError =======================================================

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EyecatchError {
    #[error("no eye-catch registered as '{0}'")]
    Unknown(String),

    #[error(transparent)]
    Animation(#[from] AnimationError),
}

//=== EyecatchDeck ========================================================

#[derive(Default)]
pub struct EyecatchDeck {
    entries: Vec<Box<dyn Eyecatch>>,
    current: Option<usize>,
}

impl EyecatchDeck {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deck holding the built-in transitions.
    pub fn with_builtin(design: DesignSize, clock: SharedClock) -> Self {
        let mut deck = Self::new();
        deck.register(Box::new(HalfTurnFade::new(design, clock.clone())));
        deck.register(Box::new(Shutter::new(design, clock)));
        deck
    }

    /// Adds `eyecatch`, replacing any entry with the same name.
    pub fn register(&mut self, eyecatch: Box<dyn Eyecatch>) {
        let name = eyecatch.name();
        match self.position(name) {
            Some(index) => {
                warn!(target: "eyecatch", "Eye-catch '{}' was already registered and has been replaced", name);
                self.entries[index] = eyecatch;
            }
            None => self.entries.push(eyecatch),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Makes `name` the current eye-catch.
    pub fn select(&mut self, name: &str) -> Result<&mut dyn Eyecatch, EyecatchError> {
        let index = self
            .position(name)
            .ok_or_else(|| EyecatchError::Unknown(name.to_owned()))?;

        if self.current != Some(index) {
            debug!(target: "eyecatch", "Selected eye-catch '{}'", name);
        }
        self.current = Some(index);
        Ok(self.entries[index].as_mut())
    }

    /// Selects `name` and starts closing it.
    pub fn select_and_close(&mut self, name: &str, speed: f64) -> Result<(), EyecatchError> {
        self.select(name)?.close(speed)?;
        Ok(())
    }

    pub fn current(&self) -> Option<&dyn Eyecatch> {
        self.current.map(|i| self.entries[i].as_ref())
    }

    pub fn current_mut(&mut self) -> Option<&mut dyn Eyecatch> {
        match self.current {
            Some(i) => Some(self.entries[i].as_mut()),
            None => None,
        }
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.entries.iter().position(|e| e.name() == name)
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::core::animation::ManualClock;
    use crate::core::eyecatch::EyecatchPhase;

    fn deck() -> EyecatchDeck {
        EyecatchDeck::with_builtin(DesignSize::default(), Arc::new(ManualClock::new(0.0)))
    }

    #[test]
    fn builtin_deck_has_both_transitions() {
        let deck = deck();
        assert!(deck.contains(HalfTurnFade::NAME));
        assert!(deck.contains(Shutter::NAME));
        assert!(deck.current().is_none());
    }

    #[test]
    fn select_and_close_updates_current() {
        let mut deck = deck();
        deck.select_and_close(Shutter::NAME, 1.0).unwrap();

        let current = deck.current().unwrap();
        assert_eq!(current.name(), Shutter::NAME);
        assert_eq!(current.phase(), EyecatchPhase::Close);
    }

    #[test]
    fn unknown_name_keeps_selection() {
        let mut deck = deck();
        deck.select(HalfTurnFade::NAME).unwrap();

        let err = deck.select_and_close("iris", 1.0).unwrap_err();
        assert_eq!(err, EyecatchError::Unknown("iris".into()));
        assert_eq!(deck.current().map(|e| e.name()), Some(HalfTurnFade::NAME));
    }

    #[test]
    fn bad_speed_surfaces_as_animation_error() {
        let mut deck = deck();
        let err = deck.select_and_close(HalfTurnFade::NAME, 0.0).unwrap_err();
        assert!(matches!(err, EyecatchError::Animation(AnimationError::InvalidSpeedMultiplier(_))));
    }

    #[test]
    fn register_replaces_same_name() {
        let mut deck = deck();
        let clock = Arc::new(ManualClock::new(0.0));
        deck.register(Box::new(Shutter::new(DesignSize::default(), clock)));
        assert_eq!(deck.entries.len(), 2);
    }
}
