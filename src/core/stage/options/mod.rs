//=========================================================================
// Options Stage
//=========================================================================
//
// Settings menu: a panel tree navigated with menu inputs, left through an
// eye-catch.
//
// Phases:
// ```text
//   FadeIn ──frame──► Display ──Cancel at root──► FadeOut(Cancelled) ─┐
//                        │    ──Finish─────────► FadeOut(Confirmed) ─┤
//                        │                                eye-catch  │
//                        │                                closed     ▼
//                        └──Reset settings──► Restart     Confirmed | Cancelled
// ```
//
// Settings are loaded on activation and saved on deactivation.
//
//=========================================================================

//=== Module Declarations =================================================

mod panel;
mod panel_list;

//=== Public API ==========================================================

pub use panel::{ButtonAction, Panel, PanelId, PanelKind, PanelTree, SettingKey};
pub use panel_list::PanelList;

//=== External Dependencies ===============================================

use glam::Affine2;
use log::{debug, info, warn};

//=== Internal Dependencies ===============================================

use super::{FrameContext, HostSignal, Phase, PhaseMachine, Stage, StageContext, StageKey, StageRequest};
use crate::core::config::Settings;
use crate::core::eyecatch::{EyecatchPhase, HalfTurnFade, Shutter};
use crate::core::input::MenuInput;
use crate::core::lifecycle::Activity;
use crate::core::render::{Color, DrawContext, Rect};

//=== Phases ==============================================================

/// How the stage is being left.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitKind {
    Confirmed,
    Cancelled,
}

impl ExitKind {
    fn terminal(self) -> OptionsPhase {
        match self {
            Self::Confirmed => OptionsPhase::Confirmed,
            Self::Cancelled => OptionsPhase::Cancelled,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionsPhase {
    FadeIn,
    Display,
    /// Settings were reset; the host restarts the application.
    Restart,
    /// Waiting for the eye-catch to cover the screen.
    FadeOut(ExitKind),
    Confirmed,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionsEvent {
    FrameElapsed,
    CancelAtRoot,
    CancelInFolder,
    FinishRequested,
    ResetRequested,
    EyecatchClosed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionsEffect {
    StartPanelFadeIn,
    ReturnToParent,
    /// Fade the panels out and close the named eye-catch.
    BeginExit { eyecatch: &'static str },
    ResetAndRestart,
    Leave(ExitKind),
}

impl Phase for OptionsPhase {
    type Event = OptionsEvent;
    type Effect = OptionsEffect;

    fn is_terminal(self) -> bool {
        matches!(self, Self::Restart | Self::Confirmed | Self::Cancelled)
    }

    fn on_event(self, event: &OptionsEvent) -> Option<(Self, OptionsEffect)> {
        use OptionsEffect as Fx;
        use OptionsEvent as Ev;

        match (self, event) {
            (Self::FadeIn, Ev::FrameElapsed) => Some((Self::Display, Fx::StartPanelFadeIn)),
            (Self::Display, Ev::CancelAtRoot) => Some((
                Self::FadeOut(ExitKind::Cancelled),
                Fx::BeginExit {
                    eyecatch: HalfTurnFade::NAME,
                },
            )),
            (Self::Display, Ev::CancelInFolder) => Some((Self::Display, Fx::ReturnToParent)),
            (Self::Display, Ev::FinishRequested) => Some((
                Self::FadeOut(ExitKind::Confirmed),
                Fx::BeginExit {
                    eyecatch: Shutter::NAME,
                },
            )),
            (Self::Display, Ev::ResetRequested) => Some((Self::Restart, Fx::ResetAndRestart)),
            (Self::FadeOut(kind), Ev::EyecatchClosed) => Some((kind.terminal(), Fx::Leave(kind))),
            _ => None,
        }
    }
}

//=== OptionsStage ========================================================

const BACKDROP_DIM: Color = Color::rgba(0.0, 0.0, 0.0, 0.5);

pub struct OptionsStage<S: StageKey> {
    phase: PhaseMachine<OptionsPhase>,
    panels: Option<PanelList>,
    return_to: S,
}

impl<S: StageKey> OptionsStage<S> {
    /// `return_to` is entered once the stage has been left.
    pub fn new(return_to: S) -> Self {
        Self {
            phase: PhaseMachine::new("options", OptionsPhase::FadeIn),
            panels: None,
            return_to,
        }
    }

    pub fn phase(&self) -> OptionsPhase {
        self.phase.current()
    }

    pub fn panels(&self) -> Option<&PanelList> {
        self.panels.as_ref()
    }

    //--- Input ------------------------------------------------------------

    /// Handles at most one input per frame, in priority order.
    fn handle_input(&mut self, frame: &mut FrameContext<'_, S>) {
        let input = frame.input;
        let Some(pressed) = [
            MenuInput::Cancel,
            MenuInput::Up,
            MenuInput::Down,
            MenuInput::Left,
            MenuInput::Right,
            MenuInput::Confirm,
        ]
        .into_iter()
        .find(|candidate| input.was_pressed(*candidate)) else {
            return;
        };
        let Some(panels) = self.panels.as_mut() else {
            return;
        };

        match pressed {
            MenuInput::Cancel => {
                let event = if panels.is_at_root() {
                    OptionsEvent::CancelAtRoot
                } else {
                    OptionsEvent::CancelInFolder
                };
                self.fire(event, frame);
            }
            MenuInput::Up => {
                panels.select_previous();
            }
            MenuInput::Down => {
                panels.select_next();
            }
            MenuInput::Left => self.step_selected(-1, frame.ctx),
            MenuInput::Right => self.step_selected(1, frame.ctx),
            MenuInput::Confirm => self.confirm_selected(frame),
        }
    }

    fn step_selected(&mut self, direction: i32, ctx: &mut StageContext) {
        let Some(panels) = self.panels.as_mut() else {
            return;
        };
        let Some(id) = panels.selected() else {
            return;
        };
        if panels.tree_mut().get_mut(id).step(direction).is_some() {
            Self::commit(panels.tree().get(id), ctx);
        }
    }

    fn confirm_selected(&mut self, frame: &mut FrameContext<'_, S>) {
        let Some(panels) = self.panels.as_mut() else {
            return;
        };
        let Some(id) = panels.selected() else {
            return;
        };

        let kind = panels.tree().get(id).kind().clone();
        match kind {
            PanelKind::Folder { .. } => {
                panels.select_child();
                panels.start_fade_in();
            }
            PanelKind::Button(ButtonAction::Back) => {
                self.fire(OptionsEvent::CancelInFolder, frame);
            }
            PanelKind::Button(ButtonAction::Finish) => {
                self.fire(OptionsEvent::FinishRequested, frame);
            }
            PanelKind::Button(ButtonAction::ResetSettings) => {
                self.fire(OptionsEvent::ResetRequested, frame);
            }
            PanelKind::Button(ButtonAction::ToggleAllAutoPlay) => {
                let folder = panels.current_folder();
                let on = !frame.ctx.settings.auto_play.all_on();
                for toggle in panels.tree_mut().set_auto_play_toggles(folder, on) {
                    panels.tree().get(toggle).apply_to(&mut frame.ctx.settings);
                }
            }
            PanelKind::Toggle { .. } | PanelKind::Choice { .. } | PanelKind::Ratio { .. } => {
                self.step_selected(1, frame.ctx);
            }
        }
    }

    /// Writes a changed panel into the settings.
    fn commit(panel: &Panel, ctx: &mut StageContext) {
        let was_fullscreen = ctx.settings.is_fullscreen();
        panel.apply_to(&mut ctx.settings);
        debug!(target: "stage", "Option '{}' set to {}", panel.name(), panel.value_label());

        let fullscreen = ctx.settings.is_fullscreen();
        if fullscreen != was_fullscreen {
            ctx.notify_host(HostSignal::ScreenModeChanged(fullscreen));
        }
    }

    //--- Phase Effects ----------------------------------------------------

    fn fire(&mut self, event: OptionsEvent, frame: &mut FrameContext<'_, S>) {
        if let Some(effect) = self.phase.fire(event) {
            self.apply(effect, frame);
        }
    }

    fn apply(&mut self, effect: OptionsEffect, frame: &mut FrameContext<'_, S>) {
        match effect {
            OptionsEffect::StartPanelFadeIn => {
                if let Some(panels) = self.panels.as_mut() {
                    panels.start_fade_in();
                }
            }
            OptionsEffect::ReturnToParent => {
                if let Some(panels) = self.panels.as_mut() {
                    panels.select_parent();
                    panels.start_fade_in();
                }
            }
            OptionsEffect::BeginExit { eyecatch } => {
                if let Some(panels) = self.panels.as_mut() {
                    panels.start_fade_out();
                }
                if let Err(e) = frame.eyecatch.select_and_close(eyecatch, 1.0) {
                    warn!(target: "stage", "Leaving options without eye-catch: {}", e);
                }
            }
            OptionsEffect::ResetAndRestart => {
                info!(target: "stage", "Resetting settings to defaults");
                frame.ctx.settings = Settings::default();
                frame.ctx.save_settings();
                frame.requests.push(StageRequest::RestartApplication);
            }
            OptionsEffect::Leave(kind) => {
                info!(target: "stage", "Options {:?}", kind);
                frame.requests.swap_to(self.return_to);
            }
        }
    }

    /// Renders the closing eye-catch and reports when it has covered the
    /// screen. Without an eye-catch the stage leaves at once.
    fn advance_eyecatch(&mut self, frame: &mut FrameContext<'_, S>) {
        let closed = match frame.eyecatch.current_mut() {
            Some(eyecatch) => {
                eyecatch.advance_and_render(&mut *frame.dc, None);
                eyecatch.phase() == EyecatchPhase::CloseComplete
            }
            None => true,
        };
        if closed {
            self.fire(OptionsEvent::EyecatchClosed, frame);
        }
    }

    fn draw_backdrop(dc: &mut dyn DrawContext) {
        let design = dc.design_size();
        let rect = Rect::new(0.0, 0.0, design.width, design.height);
        dc.fill_rect(rect, Affine2::IDENTITY, BACKDROP_DIM);
    }
}

impl<S: StageKey> Activity<StageContext> for OptionsStage<S> {
    fn on_activate(&mut self, ctx: &mut StageContext) {
        ctx.load_settings();
        let mut tree = PanelTree::from_settings(&ctx.settings);
        tree.activate(PanelTree::ROOT);
        self.panels = Some(PanelList::new(tree, ctx.clock.clone()));
        self.phase.reset();
    }

    fn on_deactivate(&mut self, ctx: &mut StageContext) {
        ctx.save_settings();
        if let Some(panels) = self.panels.as_mut() {
            panels.tree_mut().deactivate(PanelTree::ROOT);
        }
    }

    fn on_release_swapchain_resources(&mut self, _ctx: &mut StageContext) {
        if let Some(panels) = self.panels.as_mut() {
            panels.tree_mut().release_swapchain_resources(PanelTree::ROOT);
        }
    }

    fn on_restore_swapchain_resources(&mut self, _ctx: &mut StageContext) {
        if let Some(panels) = self.panels.as_mut() {
            panels.tree_mut().restore_swapchain_resources(PanelTree::ROOT);
        }
    }

    fn on_dispose(&mut self, _ctx: &mut StageContext) {
        if let Some(mut panels) = self.panels.take() {
            panels.tree_mut().dispose(PanelTree::ROOT);
        }
    }
}

impl<S: StageKey> Stage<S> for OptionsStage<S> {
    fn name(&self) -> &'static str {
        "options"
    }

    fn progress_and_draw(&mut self, frame: &mut FrameContext<'_, S>) {
        Self::draw_backdrop(&mut *frame.dc);
        if let Some(panels) = self.panels.as_mut() {
            panels.draw(&mut *frame.dc);
        }

        match self.phase.current() {
            OptionsPhase::FadeIn => self.fire(OptionsEvent::FrameElapsed, frame),
            OptionsPhase::Display => self.handle_input(frame),
            OptionsPhase::FadeOut(_) => self.advance_eyecatch(frame),
            OptionsPhase::Restart | OptionsPhase::Confirmed | OptionsPhase::Cancelled => {}
        }
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
    use crate::core::config::{MemorySettingsStore, ScreenMode};
    use crate::core::eyecatch::EyecatchDeck;
    use crate::core::input::FrameInput;
    use crate::core::render::{DesignSize, HeadlessBackend};
    use crate::core::stage::RequestQueue;
    use crate::core::viewer::SoundDelay;

    //--- Test Helpers -----------------------------------------------------

    #[derive(Clone, Copy, Eq, PartialEq, Hash, Debug)]
    enum TestStage {
        Title,
    }

    impl StageKey for TestStage {}

    struct Harness {
        clock: Arc<ManualClock>,
        store: MemorySettingsStore,
        ctx: StageContext,
        deck: EyecatchDeck,
        requests: RequestQueue<TestStage>,
        dc: HeadlessBackend,
        stage: OptionsStage<TestStage>,
    }

    impl Harness {
        fn new() -> Self {
            let clock = Arc::new(ManualClock::new(0.0));
            let store = MemorySettingsStore::default();
            let mut ctx = StageContext::new(
                Box::new(store.clone()),
                clock.clone(),
                DesignSize::default(),
                SoundDelay::default(),
            );
            let deck = EyecatchDeck::with_builtin(DesignSize::default(), clock.clone());
            let mut stage = OptionsStage::new(TestStage::Title);
            stage.on_activate(&mut ctx);
            Self {
                clock,
                store,
                ctx,
                deck,
                requests: RequestQueue::new(),
                dc: HeadlessBackend::new(),
                stage,
            }
        }

        fn frame(&mut self, inputs: &[MenuInput]) {
            let input = FrameInput::from_inputs(inputs.iter().copied());
            let mut frame = FrameContext {
                ctx: &mut self.ctx,
                dc: &mut self.dc,
                input: &input,
                eyecatch: &mut self.deck,
                requests: &mut self.requests,
            };
            self.stage.progress_and_draw(&mut frame);
        }

        fn select(&mut self, name: &str) {
            let panels = self.stage.panels.as_mut().unwrap();
            let id = panels.tree().find(name).unwrap();
            panels.tree_mut().select(id);
        }
    }

    //=====================================================================
    // Phase Table Tests
    //=====================================================================

    const ALL_PHASES: [OptionsPhase; 7] = [
        OptionsPhase::FadeIn,
        OptionsPhase::Display,
        OptionsPhase::Restart,
        OptionsPhase::FadeOut(ExitKind::Confirmed),
        OptionsPhase::FadeOut(ExitKind::Cancelled),
        OptionsPhase::Confirmed,
        OptionsPhase::Cancelled,
    ];

    const ALL_EVENTS: [OptionsEvent; 6] = [
        OptionsEvent::FrameElapsed,
        OptionsEvent::CancelAtRoot,
        OptionsEvent::CancelInFolder,
        OptionsEvent::FinishRequested,
        OptionsEvent::ResetRequested,
        OptionsEvent::EyecatchClosed,
    ];

    fn expected(phase: OptionsPhase, event: OptionsEvent) -> Option<(OptionsPhase, OptionsEffect)> {
        use ExitKind::*;
        use OptionsEvent::*;
        use OptionsPhase as P;
        match (phase, event) {
            (P::FadeIn, FrameElapsed) => Some((P::Display, OptionsEffect::StartPanelFadeIn)),
            (P::Display, CancelAtRoot) => Some((
                P::FadeOut(Cancelled),
                OptionsEffect::BeginExit { eyecatch: "half_turn_fade" },
            )),
            (P::Display, CancelInFolder) => Some((P::Display, OptionsEffect::ReturnToParent)),
            (P::Display, FinishRequested) => Some((
                P::FadeOut(Confirmed),
                OptionsEffect::BeginExit { eyecatch: "shutter" },
            )),
            (P::Display, ResetRequested) => Some((P::Restart, OptionsEffect::ResetAndRestart)),
            (P::FadeOut(Confirmed), EyecatchClosed) => {
                Some((P::Confirmed, OptionsEffect::Leave(Confirmed)))
            }
            (P::FadeOut(Cancelled), EyecatchClosed) => {
                Some((P::Cancelled, OptionsEffect::Leave(Cancelled)))
            }
            _ => None,
        }
    }

    #[test]
    fn transition_table_is_exhaustive() {
        for phase in ALL_PHASES {
            for event in ALL_EVENTS {
                assert_eq!(
                    phase.on_event(&event),
                    expected(phase, event),
                    "{:?} + {:?}",
                    phase,
                    event
                );
            }
        }
    }

    #[test]
    fn terminal_phases_ignore_every_event() {
        for phase in [OptionsPhase::Restart, OptionsPhase::Confirmed, OptionsPhase::Cancelled] {
            assert!(phase.is_terminal());
            for event in ALL_EVENTS {
                let mut machine = PhaseMachine::new("options", phase);
                assert_eq!(machine.fire(event), None);
                assert_eq!(machine.current(), phase);
            }
        }
    }

    //=====================================================================
    // Stage Tests
    //=====================================================================

    #[test]
    fn first_frame_enters_display() {
        let mut h = Harness::new();
        assert_eq!(h.stage.phase(), OptionsPhase::FadeIn);
        h.frame(&[]);
        assert_eq!(h.stage.phase(), OptionsPhase::Display);
    }

    #[test]
    fn root_cancel_waits_for_eyecatch_before_leaving() {
        let mut h = Harness::new();
        h.frame(&[]);

        h.frame(&[MenuInput::Cancel]);
        assert_eq!(h.stage.phase(), OptionsPhase::FadeOut(ExitKind::Cancelled));
        assert_eq!(h.deck.current().map(|e| e.name()), Some(HalfTurnFade::NAME));

        h.clock.set(0.3);
        h.frame(&[]);
        assert_eq!(h.stage.phase(), OptionsPhase::FadeOut(ExitKind::Cancelled));
        assert!(h.requests.is_empty());

        // Close takes 0.4 s plus a 0.5 s hold at speed 1.
        h.clock.set(1.0);
        h.frame(&[]);
        assert_eq!(h.stage.phase(), OptionsPhase::Cancelled);
        assert_eq!(h.requests.take(), vec![StageRequest::Swap(TestStage::Title)]);

        h.clock.set(2.0);
        h.frame(&[MenuInput::Cancel]);
        assert_eq!(h.stage.phase(), OptionsPhase::Cancelled);
        assert!(h.requests.is_empty());
    }

    #[test]
    fn finish_closes_shutter_and_confirms() {
        let mut h = Harness::new();
        h.frame(&[]);

        // Finish is selected by default.
        h.frame(&[MenuInput::Confirm]);
        assert_eq!(h.stage.phase(), OptionsPhase::FadeOut(ExitKind::Confirmed));
        assert_eq!(h.deck.current().map(|e| e.name()), Some(Shutter::NAME));

        h.clock.set(1.0);
        h.frame(&[]);
        assert_eq!(h.stage.phase(), OptionsPhase::Confirmed);
    }

    #[test]
    fn cancel_inside_folder_returns_to_parent() {
        let mut h = Harness::new();
        h.frame(&[]);
        h.select("Auto Play");
        h.frame(&[MenuInput::Confirm]);
        assert!(!h.stage.panels().unwrap().is_at_root());

        h.frame(&[MenuInput::Cancel]);
        assert_eq!(h.stage.phase(), OptionsPhase::Display);
        assert!(h.stage.panels().unwrap().is_at_root());
    }

    #[test]
    fn only_one_input_is_handled_per_frame() {
        let mut h = Harness::new();
        h.frame(&[]);
        let before = h.stage.panels().unwrap().tree().selected_index(PanelTree::ROOT);

        h.frame(&[MenuInput::Up, MenuInput::Up]);
        let after = h.stage.panels().unwrap().tree().selected_index(PanelTree::ROOT);
        assert_eq!(after, before - 1);
    }

    #[test]
    fn screen_mode_change_notifies_host_and_saves_on_deactivate() {
        let mut h = Harness::new();
        h.frame(&[]);
        h.select("Screen Mode");

        h.frame(&[MenuInput::Right]);
        assert_eq!(h.ctx.settings.screen_mode, ScreenMode::Fullscreen);
        assert_eq!(h.ctx.take_host_signals(), vec![HostSignal::ScreenModeChanged(true)]);

        h.stage.on_deactivate(&mut h.ctx);
        assert_eq!(h.store.snapshot().screen_mode, ScreenMode::Fullscreen);
    }

    #[test]
    fn reset_settings_requests_restart() {
        let mut h = Harness::new();
        h.ctx.settings.video = false;
        h.frame(&[]);
        h.select("Reset");
        h.frame(&[MenuInput::Confirm]);
        h.select("Reset Settings");

        h.frame(&[MenuInput::Confirm]);
        assert_eq!(h.stage.phase(), OptionsPhase::Restart);
        assert_eq!(h.requests.take(), vec![StageRequest::RestartApplication]);
        assert_eq!(h.store.snapshot(), Settings::default());
    }

    #[test]
    fn toggle_all_auto_play_flips_every_pad() {
        let mut h = Harness::new();
        h.frame(&[]);
        h.select("Auto Play");
        h.frame(&[MenuInput::Confirm]);
        h.select("All ON/OFF");

        h.frame(&[MenuInput::Confirm]);
        assert!(h.ctx.settings.auto_play.all_on());
    }
}
