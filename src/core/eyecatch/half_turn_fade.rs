//=========================================================================
// Half-Turn Fade
//=========================================================================
//
// Two oversized black panels swing in from the lower-left and upper-right
// corners with a half turn and meet in the middle while the backdrop dims
// and the title logo slides in.
//
// Close (0.4 s):
//   backdrop     0 → 0.7                       linear
//   panel 1 x   -500 → 0 → W/2                 20% / 80%, linear
//   panel 2 x   W+500 → W → W/2                20% / 80%, linear
//   rotations   0.75π → 0                      linear
//   logo x      1072 → 1222 (+0.5 s hold)      eased (0.1, 0.9)
//   logo alpha  0 → 1                          linear
//
// Open (0.6 s) runs the motion in reverse with the backdrop held at 0.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::f64::consts::PI;

use glam::{Affine2, Vec2};

//=== Internal Dependencies ===============================================

use super::{Eyecatch, EyecatchPhase, Sequencer};
use crate::core::animation::{
    scaled_duration, AnimationError, SharedClock, StoryboardBuilder, StoryboardStatus, Transition,
    VariableId,
};
use crate::core::render::{Color, DesignSize, DrawContext, ImageId, Rect};

//=== Constants ===========================================================

const CLOSE_PERIOD: f64 = 0.4;
const OPEN_PERIOD: f64 = 0.6;
const CLOSE_HOLD: f64 = 0.5;

const PANEL_OFFSCREEN: f64 = 500.0;
const PANEL_TILT: f64 = PI * 0.75;
const BACKDROP_ALPHA: f64 = 0.7;

const LOGO: ImageId = ImageId("eyecatch.title_logo_shadow");
const LOGO_REST_X: f64 = 1222.0;
const LOGO_TRAVEL: f64 = 150.0;
const LOGO_Y: f32 = 771.0;
const LOGO_WIDTH: f32 = 639.0;
const LOGO_HEIGHT: f32 = 262.0;

//=== Variables ===========================================================

#[derive(Debug, Clone, Copy)]
struct Vars {
    backdrop_alpha: VariableId,
    panel1_x: VariableId,
    panel1_angle: VariableId,
    panel2_x: VariableId,
    panel2_angle: VariableId,
    logo_x: VariableId,
    logo_alpha: VariableId,
}

//=== HalfTurnFade ========================================================

pub struct HalfTurnFade {
    design: DesignSize,
    sequencer: Sequencer,
    vars: Option<Vars>,
}

impl HalfTurnFade {
    pub const NAME: &'static str = "half_turn_fade";

    pub fn new(design: DesignSize, clock: SharedClock) -> Self {
        Self {
            design,
            sequencer: Sequencer::new(Self::NAME, clock),
            vars: None,
        }
    }

    fn build_close(&self, speed: f64) -> Result<(StoryboardBuilder, Vars), AnimationError> {
        let w = f64::from(self.design.width);
        let p = scaled_duration(CLOSE_PERIOD, speed)?;
        let hold = scaled_duration(CLOSE_HOLD, speed)?;

        let mut b = StoryboardBuilder::new();
        let vars = Vars {
            backdrop_alpha: b.add_variable("backdrop_alpha", 0.0),
            panel1_x: b.add_variable("panel1_x", -PANEL_OFFSCREEN),
            panel1_angle: b.add_variable("panel1_angle", PANEL_TILT),
            panel2_x: b.add_variable("panel2_x", w + PANEL_OFFSCREEN),
            panel2_angle: b.add_variable("panel2_angle", PANEL_TILT),
            logo_x: b.add_variable("logo_x", LOGO_REST_X - LOGO_TRAVEL),
            logo_alpha: b.add_variable("logo_alpha", 0.0),
        };

        b.add_transition(vars.backdrop_alpha, Transition::linear(p, BACKDROP_ALPHA)?)
            .add_transition(vars.panel1_x, Transition::linear(p * 0.2, 0.0)?)
            .add_transition(vars.panel1_x, Transition::linear(p * 0.8, w / 2.0)?)
            .add_transition(vars.panel1_angle, Transition::linear(p, 0.0)?)
            .add_transition(vars.panel2_x, Transition::linear(p * 0.2, w)?)
            .add_transition(vars.panel2_x, Transition::linear(p * 0.8, w / 2.0)?)
            .add_transition(vars.panel2_angle, Transition::linear(p, 0.0)?)
            .add_transition(
                vars.logo_x,
                Transition::accelerate_decelerate(p, LOGO_REST_X, 0.1, 0.9)?,
            )
            .add_transition(vars.logo_x, Transition::constant(hold)?)
            .add_transition(vars.logo_alpha, Transition::linear(p, 1.0)?);

        Ok((b, vars))
    }

    fn build_open(&self, speed: f64) -> Result<(StoryboardBuilder, Vars), AnimationError> {
        let w = f64::from(self.design.width);
        let p = scaled_duration(OPEN_PERIOD, speed)?;

        let mut b = StoryboardBuilder::new();
        let vars = Vars {
            backdrop_alpha: b.add_variable("backdrop_alpha", 0.0),
            panel1_x: b.add_variable("panel1_x", w / 2.0),
            panel1_angle: b.add_variable("panel1_angle", 0.0),
            panel2_x: b.add_variable("panel2_x", w / 2.0),
            panel2_angle: b.add_variable("panel2_angle", 0.0),
            logo_x: b.add_variable("logo_x", LOGO_REST_X),
            logo_alpha: b.add_variable("logo_alpha", 1.0),
        };

        b.add_transition(vars.backdrop_alpha, Transition::constant(p)?)
            .add_transition(vars.panel1_x, Transition::linear(p * 0.8, 0.0)?)
            .add_transition(
                vars.panel1_x,
                Transition::accelerate_decelerate(p * 0.2, -PANEL_OFFSCREEN, 0.9, 0.1)?,
            )
            .add_transition(vars.panel1_angle, Transition::linear(p, PANEL_TILT)?)
            .add_transition(vars.panel2_x, Transition::linear(p * 0.8, w)?)
            .add_transition(
                vars.panel2_x,
                Transition::accelerate_decelerate(p * 0.2, w + PANEL_OFFSCREEN, 0.9, 0.1)?,
            )
            .add_transition(vars.panel2_angle, Transition::linear(p, PANEL_TILT)?)
            .add_transition(
                vars.logo_x,
                Transition::accelerate_decelerate(p, LOGO_REST_X - LOGO_TRAVEL, 0.9, 0.1)?,
            )
            .add_transition(vars.logo_alpha, Transition::linear(p, 0.0)?);

        Ok((b, vars))
    }

    fn draw(&self, dc: &mut dyn DrawContext, vars: Vars) {
        let Some(board) = self.sequencer.storyboard() else {
            return;
        };
        let value = |id: VariableId| board.value(id) as f32;

        let DesignSize { width, height } = self.design;

        //--- Backdrop ---------------------------------------------------
        dc.fill_rect(
            Rect::new(0.0, 0.0, width, height),
            Affine2::IDENTITY,
            Color::BLACK.with_alpha(value(vars.backdrop_alpha)),
        );

        //--- Panels -----------------------------------------------------
        let panel = Rect::centered(width * 1.5, height);

        // Panel 1 pivots on its top edge midpoint, anchored at the bottom.
        let top_mid = Vec2::new(0.0, -panel.height / 2.0);
        dc.fill_rect(
            panel,
            swing(top_mid, value(vars.panel1_angle), Vec2::new(value(vars.panel1_x), height)),
            Color::BLACK,
        );

        // Panel 2 pivots on its bottom edge midpoint, anchored at the top.
        let bottom_mid = Vec2::new(0.0, panel.height / 2.0);
        dc.fill_rect(
            panel,
            swing(bottom_mid, value(vars.panel2_angle), Vec2::new(value(vars.panel2_x), 0.0)),
            Color::BLACK,
        );

        //--- Logo -------------------------------------------------------
        dc.draw_image(
            LOGO,
            Rect::new(value(vars.logo_x), LOGO_Y, LOGO_WIDTH, LOGO_HEIGHT),
            Affine2::IDENTITY,
            value(vars.logo_alpha),
        );
    }
}

/// Rotation by `angle` about `pivot`, then translation to `position`.
fn swing(pivot: Vec2, angle: f32, position: Vec2) -> Affine2 {
    Affine2::from_translation(position)
        * Affine2::from_translation(pivot)
        * Affine2::from_angle(angle)
        * Affine2::from_translation(-pivot)
}

impl Eyecatch for HalfTurnFade {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn phase(&self) -> EyecatchPhase {
        self.sequencer.phase()
    }

    fn open(&mut self, speed: f64) -> Result<(), AnimationError> {
        let (builder, vars) = self.build_open(speed)?;
        self.vars = Some(vars);
        self.sequencer.begin(EyecatchPhase::Open, builder);
        Ok(())
    }

    fn close(&mut self, speed: f64) -> Result<(), AnimationError> {
        let (builder, vars) = self.build_close(speed)?;
        if self.sequencer.is_closing() {
            return Ok(());
        }
        self.vars = Some(vars);
        self.sequencer.begin(EyecatchPhase::Close, builder);
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
