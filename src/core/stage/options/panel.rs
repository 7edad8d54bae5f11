//=========================================================================
// Option Panels
//=========================================================================
//
// Arena-backed tree of option panels.
//
// Architecture:
//   PanelTree
//     └─ nodes: Vec<LifecycleNode<Panel>>   (PanelId indexes this)
//          ├─ Folder { children, selected }
//          └─ leaves: Toggle, Choice, Ratio, Button
//
// Leaves name the setting they edit through `SettingKey`, so the tree
// holds no closures and can be rebuilt from `Settings` at any time.
// Lifecycle operations cascade from a folder to all of its descendants.
//
//=========================================================================

//=== External Dependencies ===============================================

use log::trace;

//=== Internal Dependencies ===============================================

use crate::core::config::{AutoPlayPad, LaneSide, PlayMode, ScreenMode, Settings};
use crate::core::lifecycle::{Activity, LifecycleNode};

//=== Identifiers =========================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PanelId(usize);

/// The setting a leaf panel edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingKey {
    ScreenMode,
    PlayMode,
    ScrollSpeed,
    Video,
    CymbalFree,
    DrumSound,
    RideSide,
    ChinaSide,
    SplashSide,
    AutoPlay(AutoPlayPad),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonAction {
    /// Return to the parent folder.
    Back,
    /// Leave the options stage, keeping changes.
    Finish,
    /// Restore default settings and restart.
    ResetSettings,
    /// Turn every auto-play pad on, or all off when all are already on.
    ToggleAllAutoPlay,
}

//=== Panel ===============================================================

#[derive(Debug, Clone, PartialEq)]
pub enum PanelKind {
    Folder {
        children: Vec<PanelId>,
        selected: usize,
    },
    Toggle {
        setting: SettingKey,
        on: bool,
    },
    Choice {
        setting: SettingKey,
        options: Vec<&'static str>,
        selected: usize,
    },
    Ratio {
        setting: SettingKey,
        value: f64,
        min: f64,
        max: f64,
        step: f64,
    },
    Button(ButtonAction),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Panel {
    name: String,
    parent: Option<PanelId>,
    kind: PanelKind,
}

impl Panel {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent(&self) -> Option<PanelId> {
        self.parent
    }

    pub fn kind(&self) -> &PanelKind {
        &self.kind
    }

    pub fn is_folder(&self) -> bool {
        matches!(self.kind, PanelKind::Folder { .. })
    }

    /// Text shown on the right side of the panel.
    pub fn value_label(&self) -> String {
        match &self.kind {
            PanelKind::Folder { .. } | PanelKind::Button(_) => String::new(),
            PanelKind::Toggle { on, .. } => (if *on { "ON" } else { "OFF" }).to_string(),
            PanelKind::Choice { options, selected, .. } => {
                options.get(*selected).copied().unwrap_or_default().to_string()
            }
            PanelKind::Ratio { value, .. } => format!("x{:.1}", value),
        }
    }

    /// Applies a left (`-1`) or right (`+1`) step. Returns the edited
    /// setting, if the value changed.
    pub fn step(&mut self, direction: i32) -> Option<SettingKey> {
        match &mut self.kind {
            PanelKind::Toggle { setting, on } => {
                *on = !*on;
                Some(*setting)
            }
            PanelKind::Choice { setting, options, selected } => {
                let len = options.len();
                if len == 0 {
                    return None;
                }
                *selected = if direction < 0 {
                    (*selected + len - 1) % len
                } else {
                    (*selected + 1) % len
                };
                Some(*setting)
            }
            PanelKind::Ratio { setting, value, min, max, step } => {
                let next = (*value + f64::from(direction.signum()) * *step).clamp(*min, *max);
                if next == *value {
                    return None;
                }
                *value = next;
                Some(*setting)
            }
            PanelKind::Folder { .. } | PanelKind::Button(_) => None,
        }
    }

    /// Writes this panel's value into `settings`.
    pub fn apply_to(&self, settings: &mut Settings) {
        match &self.kind {
            PanelKind::Toggle { setting, on } => match setting {
                SettingKey::Video => settings.video = *on,
                SettingKey::CymbalFree => settings.cymbal_free = *on,
                SettingKey::DrumSound => settings.drum_sound = *on,
                SettingKey::AutoPlay(pad) => settings.auto_play.set(*pad, *on),
                _ => {}
            },
            PanelKind::Choice { setting, selected, .. } => {
                let side = if *selected == 0 { LaneSide::Left } else { LaneSide::Right };
                match setting {
                    SettingKey::ScreenMode => {
                        settings.screen_mode =
                            if *selected == 1 { ScreenMode::Fullscreen } else { ScreenMode::Window };
                    }
                    SettingKey::PlayMode => {
                        settings.play_mode = if *selected == 1 { PlayMode::Expert } else { PlayMode::Basic };
                    }
                    SettingKey::RideSide => settings.lane_sides.ride = side,
                    SettingKey::ChinaSide => settings.lane_sides.china = side,
                    SettingKey::SplashSide => settings.lane_sides.splash = side,
                    _ => {}
                }
            }
            PanelKind::Ratio { setting: SettingKey::ScrollSpeed, value, .. } => {
                settings.scroll_speed = Settings::clamp_scroll_speed(*value);
            }
            _ => {}
        }
    }

    fn set_toggle(&mut self, value: bool) {
        if let PanelKind::Toggle { on, .. } = &mut self.kind {
            *on = value;
        }
    }
}

impl Activity for Panel {
    fn on_activate(&mut self, _ctx: &mut ()) {
        trace!(target: "stage", "panel '{}' activated", self.name);
    }

    fn on_deactivate(&mut self, _ctx: &mut ()) {
        trace!(target: "stage", "panel '{}' deactivated", self.name);
    }
}

//=== PanelTree ===========================================================

#[derive(Debug)]
pub struct PanelTree {
    nodes: Vec<LifecycleNode<Panel>>,
}

impl PanelTree {
    pub const ROOT: PanelId = PanelId(0);

    /// Creates a tree holding only the root folder.
    pub fn new(root_name: impl Into<String>) -> Self {
        Self {
            nodes: vec![LifecycleNode::new(Panel {
                name: root_name.into(),
                parent: None,
                kind: PanelKind::Folder {
                    children: Vec::new(),
                    selected: 0,
                },
            })],
        }
    }

    //--- Construction -----------------------------------------------------

    /// Appends a panel to the folder `parent`.
    pub fn add(&mut self, parent: PanelId, name: impl Into<String>, kind: PanelKind) -> PanelId {
        let id = PanelId(self.nodes.len());
        self.nodes.push(LifecycleNode::new(Panel {
            name: name.into(),
            parent: Some(parent),
            kind,
        }));
        if let PanelKind::Folder { children, .. } = &mut self.nodes[parent.0].kind {
            children.push(id);
        }
        id
    }

    pub fn add_folder(&mut self, parent: PanelId, name: impl Into<String>) -> PanelId {
        self.add(
            parent,
            name,
            PanelKind::Folder {
                children: Vec::new(),
                selected: 0,
            },
        )
    }

    /// Builds the options menu from the current settings.
    pub fn from_settings(settings: &Settings) -> Self {
        let mut tree = Self::new("Root");
        let root = Self::ROOT;
        let side_index = |side: LaneSide| if side == LaneSide::Left { 0 } else { 1 };

        let auto = tree.add_folder(root, "Auto Play");
        tree.add(auto, "All ON/OFF", PanelKind::Button(ButtonAction::ToggleAllAutoPlay));
        for pad in AutoPlayPad::ALL {
            tree.add(
                auto,
                pad.label(),
                PanelKind::Toggle {
                    setting: SettingKey::AutoPlay(pad),
                    on: settings.auto_play.get(pad),
                },
            );
        }
        tree.add(auto, "Done (Back)", PanelKind::Button(ButtonAction::Back));

        let choice = |setting, options: &[&'static str], selected| PanelKind::Choice {
            setting,
            options: options.to_vec(),
            selected,
        };
        tree.add(
            root,
            "Screen Mode",
            choice(SettingKey::ScreenMode, &["Window", "Fullscreen"], usize::from(settings.is_fullscreen())),
        );
        tree.add(
            root,
            "Play Mode",
            choice(
                SettingKey::PlayMode,
                &["BASIC", "EXPERT"],
                usize::from(settings.play_mode == PlayMode::Expert),
            ),
        );
        tree.add(
            root,
            "Scroll Speed",
            PanelKind::Ratio {
                setting: SettingKey::ScrollSpeed,
                value: settings.scroll_speed,
                min: Settings::SCROLL_SPEED_MIN,
                max: Settings::SCROLL_SPEED_MAX,
                step: Settings::SCROLL_SPEED_STEP,
            },
        );
        for (name, setting, on) in [
            ("Show Video", SettingKey::Video, settings.video),
            ("Cymbal Free", SettingKey::CymbalFree, settings.cymbal_free),
            ("Drum Sound", SettingKey::DrumSound, settings.drum_sound),
        ] {
            tree.add(root, name, PanelKind::Toggle { setting, on });
        }
        let sides = settings.lane_sides;
        for (name, setting, side) in [
            ("Ride Position", SettingKey::RideSide, sides.ride),
            ("China Position", SettingKey::ChinaSide, sides.china),
            ("Splash Position", SettingKey::SplashSide, sides.splash),
        ] {
            tree.add(root, name, choice(setting, &["Left", "Right"], side_index(side)));
        }

        let reset = tree.add_folder(root, "Reset");
        tree.add(reset, "Back", PanelKind::Button(ButtonAction::Back));
        tree.add(reset, "Reset Settings", PanelKind::Button(ButtonAction::ResetSettings));

        tree.add(root, "Finish", PanelKind::Button(ButtonAction::Finish));
        tree.select_last(root);
        tree
    }

    //--- Queries ----------------------------------------------------------

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, id: PanelId) -> &LifecycleNode<Panel> {
        &self.nodes[id.0]
    }

    pub fn get_mut(&mut self, id: PanelId) -> &mut LifecycleNode<Panel> {
        &mut self.nodes[id.0]
    }

    pub fn children(&self, folder: PanelId) -> &[PanelId] {
        match &self.nodes[folder.0].kind {
            PanelKind::Folder { children, .. } => children,
            _ => &[],
        }
    }

    /// Index of the selected child within `folder`.
    pub fn selected_index(&self, folder: PanelId) -> usize {
        match &self.nodes[folder.0].kind {
            PanelKind::Folder { selected, .. } => *selected,
            _ => 0,
        }
    }

    pub fn selected_child(&self, folder: PanelId) -> Option<PanelId> {
        self.children(folder).get(self.selected_index(folder)).copied()
    }

    /// Finds a panel by name, depth first from the root.
    pub fn find(&self, name: &str) -> Option<PanelId> {
        let mut stack = vec![Self::ROOT];
        while let Some(id) = stack.pop() {
            if self.nodes[id.0].name == name {
                return Some(id);
            }
            stack.extend(self.children(id).iter().rev().copied());
        }
        None
    }

    //--- Selection --------------------------------------------------------

    /// Moves the selection in `folder` by `delta`, clamped to its children.
    pub fn move_selection(&mut self, folder: PanelId, delta: isize) -> bool {
        let PanelKind::Folder { children, selected } = &mut self.nodes[folder.0].kind else {
            return false;
        };
        if children.is_empty() {
            return false;
        }
        let last = children.len() - 1;
        let next = selected.saturating_add_signed(delta).min(last);
        let moved = next != *selected;
        *selected = next;
        moved
    }

    pub fn select_last(&mut self, folder: PanelId) {
        if let PanelKind::Folder { children, selected } = &mut self.nodes[folder.0].kind {
            *selected = children.len().saturating_sub(1);
        }
    }

    /// Selects `child` within its parent folder.
    pub fn select(&mut self, child: PanelId) -> bool {
        let Some(parent) = self.nodes[child.0].parent else {
            return false;
        };
        let Some(index) = self.children(parent).iter().position(|c| *c == child) else {
            return false;
        };
        if let PanelKind::Folder { selected, .. } = &mut self.nodes[parent.0].kind {
            *selected = index;
        }
        true
    }

    //--- Settings ---------------------------------------------------------

    /// Sets every auto-play toggle under `folder` to `on`.
    pub fn set_auto_play_toggles(&mut self, folder: PanelId, on: bool) -> Vec<PanelId> {
        let toggles: Vec<PanelId> = self
            .children(folder)
            .iter()
            .copied()
            .filter(|id| {
                matches!(
                    self.nodes[id.0].kind,
                    PanelKind::Toggle { setting: SettingKey::AutoPlay(_), .. }
                )
            })
            .collect();
        for id in &toggles {
            self.nodes[id.0].set_toggle(on);
        }
        toggles
    }

    //--- Lifecycle --------------------------------------------------------

    /// Activates `id` and, for folders, every descendant.
    pub fn activate(&mut self, id: PanelId) {
        self.cascade(id, &mut |node: &mut LifecycleNode<Panel>| node.activate(&mut ()));
    }

    pub fn deactivate(&mut self, id: PanelId) {
        self.cascade(id, &mut |node: &mut LifecycleNode<Panel>| node.deactivate(&mut ()));
    }

    pub fn release_swapchain_resources(&mut self, id: PanelId) {
        self.cascade(id, &mut |node: &mut LifecycleNode<Panel>| node.release_swapchain_resources(&mut ()));
    }

    pub fn restore_swapchain_resources(&mut self, id: PanelId) {
        self.cascade(id, &mut |node: &mut LifecycleNode<Panel>| node.restore_swapchain_resources(&mut ()));
    }

    pub fn dispose(&mut self, id: PanelId) {
        self.cascade(id, &mut |node: &mut LifecycleNode<Panel>| node.dispose(&mut ()));
    }

    fn cascade(&mut self, id: PanelId, op: &mut dyn FnMut(&mut LifecycleNode<Panel>)) {
        op(&mut self.nodes[id.0]);
        let children = self.children(id).to_vec();
        for child in children {
            self.cascade(child, op);
        }
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
