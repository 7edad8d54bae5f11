//=========================================================================
// Panel List
//=========================================================================
//
// Shows one folder of the panel tree at a time and fades it in or out
// with a storyboard.
//
//=========================================================================

//=== External Dependencies ===============================================

use glam::{Affine2, Vec2};
use log::{debug, warn};

//=== Internal Dependencies ===============================================

use super::panel::{PanelId, PanelTree};
use crate::core::animation::{SharedClock, Storyboard, StoryboardBuilder, Transition, VariableId};
use crate::core::render::{Color, DrawContext, ImageId, Rect};

//=== Layout ==============================================================

const LEFT: f32 = 613.0;
const TOP: f32 = 40.0;
const PANEL_WIDTH: f32 = 642.0;
const PANEL_HEIGHT: f32 = 96.0;
const PANEL_GAP: f32 = 8.0;
/// Selected panel pops out to the left by this much.
const SELECTED_SHIFT: f32 = 24.0;

const FADE_SECONDS: f64 = 0.15;

const PANEL_COLOR: Color = Color::rgba(0.1, 0.12, 0.2, 0.85);
const SELECTED_COLOR: Color = Color::rgba(0.25, 0.35, 0.6, 0.95);
const FOLDER_MARKER: ImageId = ImageId("options.folder_marker");

//=== PanelList ===========================================================

pub struct PanelList {
    tree: PanelTree,
    folder: PanelId,
    clock: SharedClock,
    fade: Option<(Storyboard, VariableId)>,
}

impl PanelList {
    pub fn new(tree: PanelTree, clock: SharedClock) -> Self {
        Self {
            tree,
            folder: PanelTree::ROOT,
            clock,
            fade: None,
        }
    }

    //--- Queries ----------------------------------------------------------

    pub fn tree(&self) -> &PanelTree {
        &self.tree
    }

    pub fn tree_mut(&mut self) -> &mut PanelTree {
        &mut self.tree
    }

    pub fn current_folder(&self) -> PanelId {
        self.folder
    }

    pub fn is_at_root(&self) -> bool {
        self.tree.get(self.folder).parent().is_none()
    }

    pub fn selected(&self) -> Option<PanelId> {
        self.tree.selected_child(self.folder)
    }

    /// Current opacity of the list. Fully opaque when no fade has run.
    pub fn opacity(&self) -> f64 {
        self.fade
            .as_ref()
            .map(|(board, id)| board.value(*id))
            .unwrap_or(1.0)
    }

    //--- Navigation -------------------------------------------------------

    pub fn select_previous(&mut self) -> bool {
        self.tree.move_selection(self.folder, -1)
    }

    pub fn select_next(&mut self) -> bool {
        self.tree.move_selection(self.folder, 1)
    }

    /// Enters the selected folder.
    pub fn select_child(&mut self) -> bool {
        match self.selected() {
            Some(child) if self.tree.get(child).is_folder() => {
                debug!(target: "stage", "Entering folder '{}'", self.tree.get(child).name());
                self.folder = child;
                true
            }
            _ => false,
        }
    }

    /// Returns to the parent folder, keeping the folder we came from
    /// selected.
    pub fn select_parent(&mut self) -> bool {
        let Some(parent) = self.tree.get(self.folder).parent() else {
            return false;
        };
        let child = self.folder;
        self.folder = parent;
        self.tree.select(child);
        debug!(target: "stage", "Back to folder '{}'", self.tree.get(parent).name());
        true
    }

    //--- Fade -------------------------------------------------------------

    pub fn start_fade_in(&mut self) {
        self.start_fade(0.0, 1.0);
    }

    pub fn start_fade_out(&mut self) {
        self.start_fade(self.opacity(), 0.0);
    }

    fn start_fade(&mut self, from: f64, to: f64) {
        let mut builder = StoryboardBuilder::new();
        let opacity = builder.add_variable("panel_list_opacity", from);
        match Transition::linear(FADE_SECONDS, to) {
            Ok(segment) => {
                builder.add_transition(opacity, segment);
            }
            Err(e) => warn!(target: "stage", "Panel fade rejected: {}", e),
        }
        self.fade = Some((builder.schedule(self.clock.now()), opacity));
    }

    //--- Drawing ----------------------------------------------------------

    pub fn draw(&mut self, dc: &mut dyn DrawContext) {
        let now = self.clock.now();
        if let Some((board, _)) = self.fade.as_mut() {
            board.update(now);
        }
        let opacity = self.opacity() as f32;
        if opacity <= 0.0 {
            return;
        }

        let selected = self.selected();
        for (row, id) in self.tree.children(self.folder).iter().enumerate() {
            let is_selected = Some(*id) == selected;
            let x = if is_selected { LEFT - SELECTED_SHIFT } else { LEFT };
            let y = TOP + row as f32 * (PANEL_HEIGHT + PANEL_GAP);
            let rect = Rect::new(0.0, 0.0, PANEL_WIDTH, PANEL_HEIGHT);
            let place = Affine2::from_translation(Vec2::new(x, y));

            let base = if is_selected { SELECTED_COLOR } else { PANEL_COLOR };
            dc.fill_rect(rect, place, base.with_alpha(base.a * opacity));

            if self.tree.get(*id).is_folder() {
                let marker = Rect::new(PANEL_WIDTH - PANEL_HEIGHT, 0.0, PANEL_HEIGHT, PANEL_HEIGHT);
                dc.draw_image(FOLDER_MARKER, marker, place, opacity);
            }
        }
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
