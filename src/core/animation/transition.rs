//=========================================================================
// Transitions
//=========================================================================
//
// One timed segment of an animation variable.
//
// Kinds:
//   Linear                → lerp(start, final, p)
//   AccelerateDecelerate  → lerp(start, final, ease(p, a, d))
//   Constant              → start (pause / hold)
//
//=========================================================================

//=== Internal Dependencies ===============================================

use super::AnimationError;

//=== TransitionKind ======================================================

/// Interpolation law of a [`Transition`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TransitionKind {
    /// Constant velocity from the incoming value to `final_value`.
    Linear { final_value: f64 },

    /// Constant acceleration for `acceleration_ratio` of the duration,
    /// constant velocity, then constant deceleration for
    /// `deceleration_ratio` of the duration.
    AccelerateDecelerate {
        final_value: f64,
        acceleration_ratio: f64,
        deceleration_ratio: f64,
    },

    /// Holds the incoming value.
    Constant,
}

//=== Transition ==========================================================

/// A validated animation segment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transition {
    duration: f64,
    kind: TransitionKind,
}

impl Transition {
    //--- Construction -----------------------------------------------------

    pub fn linear(duration: f64, final_value: f64) -> Result<Self, AnimationError> {
        check_duration(duration)?;
        check_finite(final_value)?;
        Ok(Self {
            duration,
            kind: TransitionKind::Linear { final_value },
        })
    }

    pub fn accelerate_decelerate(
        duration: f64,
        final_value: f64,
        acceleration_ratio: f64,
        deceleration_ratio: f64,
    ) -> Result<Self, AnimationError> {
        check_duration(duration)?;
        check_finite(final_value)?;

        let in_unit = |r: f64| r.is_finite() && (0.0..=1.0).contains(&r);
        if !in_unit(acceleration_ratio)
            || !in_unit(deceleration_ratio)
            || acceleration_ratio + deceleration_ratio > 1.0
        {
            return Err(AnimationError::InvalidEasingRatios {
                acceleration: acceleration_ratio,
                deceleration: deceleration_ratio,
            });
        }

        Ok(Self {
            duration,
            kind: TransitionKind::AccelerateDecelerate {
                final_value,
                acceleration_ratio,
                deceleration_ratio,
            },
        })
    }

    pub fn constant(duration: f64) -> Result<Self, AnimationError> {
        check_duration(duration)?;
        Ok(Self {
            duration,
            kind: TransitionKind::Constant,
        })
    }

    //--- Queries ----------------------------------------------------------

    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn kind(&self) -> TransitionKind {
        self.kind
    }

    /// Value once the segment has run to completion.
    pub fn end_value(&self, start: f64) -> f64 {
        match self.kind {
            TransitionKind::Linear { final_value }
            | TransitionKind::AccelerateDecelerate { final_value, .. } => final_value,
            TransitionKind::Constant => start,
        }
    }

    /// Value `local` seconds into the segment, starting from `start`.
    pub fn sample(&self, start: f64, local: f64) -> f64 {
        let progress = (local / self.duration).clamp(0.0, 1.0);

        match self.kind {
            TransitionKind::Linear { final_value } => lerp(start, final_value, progress),
            TransitionKind::AccelerateDecelerate {
                final_value,
                acceleration_ratio,
                deceleration_ratio,
            } => lerp(
                start,
                final_value,
                accelerate_decelerate(progress, acceleration_ratio, deceleration_ratio),
            ),
            TransitionKind::Constant => start,
        }
    }
}

//=== Easing ==============================================================

/// Maps linear progress through a trapezoidal velocity profile.
///
/// The curve accelerates uniformly over `[0, a]`, coasts over
/// `[a, 1 - d]`, and decelerates uniformly over `[1 - d, 1]`. Output is
/// monotonic, starts at 0 and ends at 1.
pub fn accelerate_decelerate(progress: f64, a: f64, d: f64) -> f64 {
    let x = progress.clamp(0.0, 1.0);

    // Peak velocity so the area under the profile equals 1.
    let v = 1.0 / (1.0 - a / 2.0 - d / 2.0);

    if x < a {
        v * x * x / (2.0 * a)
    } else if x <= 1.0 - d {
        v * (a / 2.0) + v * (x - a)
    } else {
        let r = 1.0 - x;
        1.0 - v * r * r / (2.0 * d)
    }
}

//=== Helpers =============================================================

fn lerp(from: f64, to: f64, t: f64) -> f64 {
    from + (to - from) * t
}

fn check_duration(duration: f64) -> Result<(), AnimationError> {
    if duration.is_finite() && duration > 0.0 {
        Ok(())
    } else {
        Err(AnimationError::InvalidDuration(duration))
    }
}

fn check_finite(value: f64) -> Result<(), AnimationError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(AnimationError::NonFiniteValue(value))
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    //--- Validation -------------------------------------------------------

    #[test]
    fn rejects_non_positive_durations() {
        assert_eq!(
            Transition::linear(0.0, 1.0),
            Err(AnimationError::InvalidDuration(0.0))
        );
        assert!(Transition::linear(-0.1, 1.0).is_err());
        assert!(Transition::constant(f64::NAN).is_err());
        assert!(Transition::accelerate_decelerate(-1.0, 1.0, 0.5, 0.5).is_err());
    }

    #[test]
    fn rejects_non_finite_target() {
        assert!(matches!(
            Transition::linear(1.0, f64::INFINITY),
            Err(AnimationError::NonFiniteValue(_))
        ));
    }

    #[test]
    fn rejects_bad_easing_ratios() {
        assert!(Transition::accelerate_decelerate(1.0, 1.0, 0.7, 0.7).is_err());
        assert!(Transition::accelerate_decelerate(1.0, 1.0, -0.1, 0.2).is_err());
        assert!(Transition::accelerate_decelerate(1.0, 1.0, 1.5, 0.0).is_err());
        assert!(Transition::accelerate_decelerate(1.0, 1.0, 0.9, 0.1).is_ok());
    }

    //--- Sampling ---------------------------------------------------------

    #[test]
    fn linear_interpolates_from_incoming_value() {
        let t = Transition::linear(0.4, 0.7).unwrap();
        assert!((t.sample(0.0, 0.2) - 0.35).abs() < EPS);
        assert!((t.sample(0.0, 0.4) - 0.7).abs() < EPS);
        assert!((t.sample(0.0, 9.0) - 0.7).abs() < EPS);
    }

    #[test]
    fn constant_holds_incoming_value() {
        let t = Transition::constant(0.5).unwrap();
        assert_eq!(t.sample(42.0, 0.25), 42.0);
        assert_eq!(t.end_value(42.0), 42.0);
    }

    #[test]
    fn easing_hits_endpoints() {
        for &(a, d) in &[(0.1, 0.9), (0.9, 0.1), (0.0, 0.0), (0.5, 0.5), (0.0, 1.0)] {
            assert!(accelerate_decelerate(0.0, a, d).abs() < EPS, "a={a} d={d}");
            assert!((accelerate_decelerate(1.0, a, d) - 1.0).abs() < EPS, "a={a} d={d}");
        }
    }

    #[test]
    fn easing_without_ratios_is_linear() {
        for i in 0..=10 {
            let x = i as f64 / 10.0;
            assert!((accelerate_decelerate(x, 0.0, 0.0) - x).abs() < EPS);
        }
    }

    #[test]
    fn eased_segment_is_monotonic_for_increasing_target() {
        let t = Transition::accelerate_decelerate(0.6, 1222.0, 0.9, 0.1).unwrap();
        let mut last = f64::NEG_INFINITY;
        for i in 0..=600 {
            let v = t.sample(1072.0, i as f64 * 0.001);
            assert!(v >= last - EPS, "value decreased at step {i}: {last} -> {v}");
            last = v;
        }
        assert!((last - 1222.0).abs() < EPS);
    }

    #[test]
    fn linear_segment_is_monotonic_for_increasing_target() {
        let t = Transition::linear(1.0, 10.0).unwrap();
        let mut last = f64::NEG_INFINITY;
        for i in 0..=100 {
            let v = t.sample(0.0, i as f64 * 0.01);
            assert!(v >= last);
            last = v;
        }
    }

    #[test]
    fn acceleration_phase_starts_slow() {
        // With heavy acceleration the first tenth covers far less than a tenth.
        assert!(accelerate_decelerate(0.1, 0.9, 0.1) < 0.05);
    }
}
