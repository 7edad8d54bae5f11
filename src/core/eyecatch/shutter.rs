//=========================================================================
// Shutter
//=========================================================================
//
// Two black slabs slide in from the top and bottom edges and meet at the
// horizontal centre line. Used when leaving a stage through "Finish".
//
//=========================================================================

//=== External Dependencies ===============================================

use glam::Affine2;

//=== Internal Dependencies ===============================================

use super::{Eyecatch, EyecatchPhase, Sequencer};
use crate::core::animation::{
    scaled_duration, AnimationError, SharedClock, StoryboardBuilder, StoryboardStatus, Transition,
    VariableId,
};
use crate::core::render::{Color, DesignSize, DrawContext, Rect};

const CLOSE_PERIOD: f64 = 0.3;
const CLOSE_HOLD: f64 = 0.2;
const OPEN_PERIOD: f64 = 0.3;

#[derive(Debug, Clone, Copy)]
struct Vars {
    upper_y: VariableId,
    lower_y: VariableId,
}

pub struct Shutter {
    design: DesignSize,
    sequencer: Sequencer,
    vars: Option<Vars>,
}

impl Shutter {
    pub const NAME: &'static str = "shutter";

    pub fn new(design: DesignSize, clock: SharedClock) -> Self {
        Self {
            design,
            sequencer: Sequencer::new(Self::NAME, clock),
            vars: None,
        }
    }

    fn half_height(&self) -> f64 {
        f64::from(self.design.height) / 2.0
    }

    fn draw(&self, dc: &mut dyn DrawContext, vars: Vars) {
        let Some(board) = self.sequencer.storyboard() else {
            return;
        };
        let width = self.design.width;
        let half = self.design.height / 2.0;

        let upper = Rect::new(0.0, board.value(vars.upper_y) as f32, width, half);
        let lower = Rect::new(0.0, board.value(vars.lower_y) as f32, width, half);
        dc.fill_rect(upper, Affine2::IDENTITY, Color::BLACK);
        dc.fill_rect(lower, Affine2::IDENTITY, Color::BLACK);
    }
}

impl Eyecatch for Shutter {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn phase(&self) -> EyecatchPhase {
        self.sequencer.phase()
    }

    fn open(&mut self, speed: f64) -> Result<(), AnimationError> {
        let p = scaled_duration(OPEN_PERIOD, speed)?;
        let half = self.half_height();

        let mut b = StoryboardBuilder::new();
        let vars = Vars {
            upper_y: b.add_variable("upper_y", 0.0),
            lower_y: b.add_variable("lower_y", half),
        };
        b.add_transition(vars.upper_y, Transition::accelerate_decelerate(p, -half, 0.9, 0.1)?)
            .add_transition(vars.lower_y, Transition::accelerate_decelerate(p, half * 2.0, 0.9, 0.1)?);

        self.vars = Some(vars);
        self.sequencer.begin(EyecatchPhase::Open, b);
        Ok(())
    }

    fn close(&mut self, speed: f64) -> Result<(), AnimationError> {
        let p = scaled_duration(CLOSE_PERIOD, speed)?;
        let hold = scaled_duration(CLOSE_HOLD, speed)?;
        if self.sequencer.is_closing() {
            return Ok(());
        }
        let half = self.half_height();

        let mut b = StoryboardBuilder::new();
        let vars = Vars {
            upper_y: b.add_variable("upper_y", -half),
            lower_y: b.add_variable("lower_y", half * 2.0),
        };
        b.add_transition(vars.upper_y, Transition::accelerate_decelerate(p, 0.0, 0.1, 0.9)?)
            .add_transition(vars.upper_y, Transition::constant(hold)?)
            .add_transition(vars.lower_y, Transition::accelerate_decelerate(p, half, 0.1, 0.9)?);

        self.vars = Some(vars);
        self.sequencer.begin(EyecatchPhase::Close, b);
        Ok(())
    }

    fn advance_and_render(&mut self, dc: &mut dyn DrawContext, suppress_if: Option<StoryboardStatus>) {
        let Some(status) = self.sequencer.advance() else {
            return;
        };
        if self.phase() == EyecatchPhase::OpenComplete || Some(status) == suppress_if {
            return;
        }
        if let Some(vars) = self.vars {
            self.draw(dc, vars);
        }
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
