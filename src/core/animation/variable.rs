//=========================================================================
// Animation Variable
//=========================================================================

//=== Internal Dependencies ===============================================

use super::transition::Transition;

//=== AnimationVariable ===================================================

/// Scalar whose value over time is a queue of [`Transition`] segments.
///
/// Each segment starts from the value the previous one ended on. The
/// variable is exhausted once elapsed time passes the sum of durations.
#[derive(Debug, Clone)]
pub struct AnimationVariable {
    name: String,
    initial: f64,
    value: f64,
    segments: Vec<Transition>,
}

impl AnimationVariable {
    pub fn new(name: impl Into<String>, initial: f64) -> Self {
        Self {
            name: name.into(),
            initial,
            value: initial,
            segments: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn initial(&self) -> f64 {
        self.initial
    }

    pub fn push(&mut self, segment: Transition) {
        self.segments.push(segment);
    }

    /// Sum of all segment durations.
    pub fn duration(&self) -> f64 {
        self.segments.iter().map(Transition::duration).sum()
    }

    /// Value after every segment has completed.
    pub fn final_value(&self) -> f64 {
        self.segments
            .iter()
            .fold(self.initial, |start, seg| seg.end_value(start))
    }

    /// Recomputes the value for `elapsed` seconds since scheduling.
    ///
    /// Returns `true` when the variable has no more motion to do.
    pub fn update(&mut self, elapsed: f64) -> bool {
        let elapsed = elapsed.max(0.0);
        let mut start = self.initial;
        let mut offset = 0.0;

        for seg in &self.segments {
            let local = elapsed - offset;
            if local < seg.duration() {
                self.value = seg.sample(start, local);
                return false;
            }
            start = seg.end_value(start);
            offset += seg.duration();
        }

        self.value = start;
        true
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
