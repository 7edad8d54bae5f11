//=========================================================================
// Storyboard
//=========================================================================
//
// A set of animation variables that start together at a scheduled time.
// Status becomes Ready only when every variable has exhausted its
// segments; an empty storyboard is Ready immediately.
//
//=========================================================================

//=== External Dependencies ===============================================

use log::trace;

//=== Internal Dependencies ===============================================

use super::transition::Transition;
use super::variable::AnimationVariable;

//=== StoryboardStatus ====================================================

/// Playback status reported by [`Storyboard::update`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoryboardStatus {
    /// Scheduled start time has not been reached.
    Scheduled,

    /// At least one variable is still moving.
    Playing,

    /// All variables have reached their final values.
    Ready,
}

/// Handle to a variable inside one storyboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VariableId(usize);

//=== StoryboardBuilder ===================================================

/// Collects variables and their segments before scheduling.
#[derive(Debug, Default)]
pub struct StoryboardBuilder {
    variables: Vec<AnimationVariable>,
}

impl StoryboardBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_variable(&mut self, name: impl Into<String>, initial: f64) -> VariableId {
        self.variables.push(AnimationVariable::new(name, initial));
        VariableId(self.variables.len() - 1)
    }

    /// Appends `segment` to the variable's queue.
    ///
    /// # Panics
    ///
    /// If `id` came from a different builder.
    pub fn add_transition(&mut self, id: VariableId, segment: Transition) -> &mut Self {
        self.variables[id.0].push(segment);
        self
    }

    /// Fixes the start time and produces a playable storyboard.
    pub fn schedule(self, start_time: f64) -> Storyboard {
        let mut board = Storyboard {
            start_time,
            variables: self.variables,
            status: StoryboardStatus::Scheduled,
        };
        board.seek(0.0);
        board
    }
}

//=== Storyboard ==========================================================

/// Group of variables animated against a common start time.
#[derive(Debug, Clone)]
pub struct Storyboard {
    start_time: f64,
    variables: Vec<AnimationVariable>,
    status: StoryboardStatus,
}

impl Storyboard {
    /// Advances every variable to `now` and returns the resulting status.
    pub fn update(&mut self, now: f64) -> StoryboardStatus {
        let elapsed = now - self.start_time;
        if elapsed < 0.0 && !self.variables.is_empty() {
            self.seek(0.0);
            self.status = StoryboardStatus::Scheduled;
            return self.status;
        }

        let before = self.status;
        self.status = if self.seek(elapsed.max(0.0)) {
            StoryboardStatus::Ready
        } else {
            StoryboardStatus::Playing
        };

        if before != self.status {
            trace!("storyboard {:?} -> {:?}", before, self.status);
        }
        self.status
    }

    pub fn status(&self) -> StoryboardStatus {
        self.status
    }

    /// Current value of `id` as of the last update.
    pub fn value(&self, id: VariableId) -> f64 {
        self.variables[id.0].value()
    }

    pub fn variable(&self, id: VariableId) -> &AnimationVariable {
        &self.variables[id.0]
    }

    pub fn start_time(&self) -> f64 {
        self.start_time
    }

    /// Length of the longest variable.
    pub fn duration(&self) -> f64 {
        self.variables
            .iter()
            .map(AnimationVariable::duration)
            .fold(0.0, f64::max)
    }

    fn seek(&mut self, elapsed: f64) -> bool {
        let mut all_done = true;
        for var in &mut self.variables {
            all_done &= var.update(elapsed);
        }
        all_done
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn linear_fade_reaches_target_and_ready() {
        let mut builder = StoryboardBuilder::new();
        let opacity = builder.add_variable("opacity", 0.0);
        builder.add_transition(opacity, Transition::linear(0.4, 0.7).unwrap());
        let mut board = builder.schedule(10.0);

        assert_eq!(board.update(10.2), StoryboardStatus::Playing);
        assert!((board.value(opacity) - 0.35).abs() < EPS);

        assert_eq!(board.update(10.5), StoryboardStatus::Ready);
        assert!((board.value(opacity) - 0.7).abs() < EPS);
    }

    #[test]
    fn before_start_is_scheduled_at_initial_values() {
        let mut builder = StoryboardBuilder::new();
        let x = builder.add_variable("x", 3.0);
        builder.add_transition(x, Transition::linear(1.0, 9.0).unwrap());
        let mut board = builder.schedule(5.0);

        assert_eq!(board.update(4.0), StoryboardStatus::Scheduled);
        assert_eq!(board.value(x), 3.0);
    }

    #[test]
    fn ready_waits_for_longest_variable() {
        let mut builder = StoryboardBuilder::new();
        let short = builder.add_variable("short", 0.0);
        let long = builder.add_variable("long", 0.0);
        builder
            .add_transition(short, Transition::linear(0.2, 1.0).unwrap())
            .add_transition(long, Transition::linear(0.4, 1.0).unwrap())
            .add_transition(long, Transition::constant(0.5).unwrap());
        let mut board = builder.schedule(0.0);

        assert_eq!(board.update(0.3), StoryboardStatus::Playing);
        assert_eq!(board.value(short), 1.0);
        assert_eq!(board.update(0.8), StoryboardStatus::Playing);
        assert_eq!(board.update(0.95), StoryboardStatus::Ready);
        assert!((board.duration() - 0.9).abs() < EPS);
    }

    #[test]
    fn empty_storyboard_is_ready_immediately() {
        let mut board = StoryboardBuilder::new().schedule(100.0);
        assert_eq!(board.update(0.0), StoryboardStatus::Ready);
    }

    #[test]
    fn variables_without_segments_hold_initial_value() {
        let mut builder = StoryboardBuilder::new();
        let bg = builder.add_variable("background", 0.0);
        let mut board = builder.schedule(0.0);
        assert_eq!(board.update(1.0), StoryboardStatus::Ready);
        assert_eq!(board.value(bg), 0.0);
    }

    #[test]
    fn time_can_be_sampled_out_of_order() {
        let mut builder = StoryboardBuilder::new();
        let x = builder.add_variable("x", 0.0);
        builder.add_transition(x, Transition::linear(1.0, 10.0).unwrap());
        let mut board = builder.schedule(0.0);

        board.update(1.5);
        assert_eq!(board.status(), StoryboardStatus::Ready);
        board.update(0.5);
        assert!((board.value(x) - 5.0).abs() < EPS);
        assert_eq!(board.status(), StoryboardStatus::Playing);
    }
}
