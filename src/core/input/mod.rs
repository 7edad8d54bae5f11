//=========================================================================
// Input System
//
// Key-to-menu bindings (platform thread) and the per-frame input snapshot
// stages poll (render thread).
//
// Responsibilities:
// - Map physical keys to `MenuInput` through `KeyBindings`
// - Carry one frame's worth of presses as `FrameInput`
//
// Notes:
// Bindings are resolved on the platform thread so that only menu-level
// inputs cross the channel.
//
//=========================================================================

//=== Submodules ==========================================================

pub mod event;

//=== Public API ==========================================================

pub use event::{KeyCode, MenuInput};

//=== External Dependencies ===============================================

use std::collections::HashMap;

use log::{debug, warn};

//=== KeyBindings =========================================================

/// Physical key → menu input table.
///
/// Defaults: arrow keys navigate, Enter/Space confirm, Escape/Backspace
/// cancel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyBindings {
    map: HashMap<KeyCode, MenuInput>,
}

impl KeyBindings {
    /// Creates an empty binding table.
    pub fn empty() -> Self {
        Self { map: HashMap::new() }
    }

    /// Binds `key` to `input`, replacing any previous binding of `key`.
    pub fn bind(&mut self, key: KeyCode, input: MenuInput) -> &mut Self {
        if key == KeyCode::Unidentified {
            warn!(target: "platform::input", "Refusing to bind Unidentified key");
            return self;
        }
        if let Some(previous) = self.map.insert(key, input) {
            if previous != input {
                debug!(target: "platform::input", "Rebound {:?}: {:?} -> {:?}", key, previous, input);
            }
        }
        self
    }

    pub fn unbind(&mut self, key: KeyCode) -> Option<MenuInput> {
        self.map.remove(&key)
    }

    pub fn resolve(&self, key: KeyCode) -> Option<MenuInput> {
        self.map.get(&key).copied()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

impl Default for KeyBindings {
    fn default() -> Self {
        let mut bindings = Self::empty();
        bindings
            .bind(KeyCode::ArrowUp, MenuInput::Up)
            .bind(KeyCode::ArrowDown, MenuInput::Down)
            .bind(KeyCode::ArrowLeft, MenuInput::Left)
            .bind(KeyCode::ArrowRight, MenuInput::Right)
            .bind(KeyCode::Enter, MenuInput::Confirm)
            .bind(KeyCode::Space, MenuInput::Confirm)
            .bind(KeyCode::Escape, MenuInput::Cancel)
            .bind(KeyCode::Backspace, MenuInput::Cancel);
        bindings
    }
}

//=== FrameInput ==========================================================

/// Presses received since the previous frame, in arrival order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrameInput {
    pressed: Vec<MenuInput>,
}

impl FrameInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_inputs(inputs: impl IntoIterator<Item = MenuInput>) -> Self {
        Self {
            pressed: inputs.into_iter().collect(),
        }
    }

    pub fn extend(&mut self, inputs: impl IntoIterator<Item = MenuInput>) {
        self.pressed.extend(inputs);
    }

    pub fn was_pressed(&self, input: MenuInput) -> bool {
        self.pressed.contains(&input)
    }

    pub fn iter(&self) -> impl Iterator<Item = MenuInput> + '_ {
        self.pressed.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.pressed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pressed.is_empty()
    }

    pub fn clear(&mut self) {
        self.pressed.clear();
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    //=====================================================================
    // KeyBindings Tests
    //=====================================================================

    #[test]
    fn default_bindings_cover_every_menu_input() {
        let bindings = KeyBindings::default();
        for input in MenuInput::ALL {
            assert!(
                bindings.map.values().any(|bound| *bound == input),
                "{:?} has no default key",
                input
            );
        }
    }

    #[test]
    fn default_bindings_resolve() {
        let bindings = KeyBindings::default();
        assert_eq!(bindings.resolve(KeyCode::Escape), Some(MenuInput::Cancel));
        assert_eq!(bindings.resolve(KeyCode::Space), Some(MenuInput::Confirm));
        assert_eq!(bindings.resolve(KeyCode::KeyQ), None);
    }

    #[test]
    fn rebinding_replaces_previous() {
        let mut bindings = KeyBindings::default();
        bindings.bind(KeyCode::Space, MenuInput::Cancel);
        assert_eq!(bindings.resolve(KeyCode::Space), Some(MenuInput::Cancel));
    }

    #[test]
    fn unidentified_key_cannot_be_bound() {
        let mut bindings = KeyBindings::empty();
        bindings.bind(KeyCode::Unidentified, MenuInput::Confirm);
        assert!(bindings.is_empty());
    }

    #[test]
    fn unbind_removes_key() {
        let mut bindings = KeyBindings::default();
        assert_eq!(bindings.unbind(KeyCode::Backspace), Some(MenuInput::Cancel));
        assert_eq!(bindings.resolve(KeyCode::Backspace), None);
    }

    //=====================================================================
    // FrameInput Tests
    //=====================================================================

    #[test]
    fn frame_input_preserves_order() {
        let input = FrameInput::from_inputs([MenuInput::Down, MenuInput::Down, MenuInput::Confirm]);
        let seen: Vec<_> = input.iter().collect();
        assert_eq!(seen, vec![MenuInput::Down, MenuInput::Down, MenuInput::Confirm]);
        assert!(input.was_pressed(MenuInput::Confirm));
        assert!(!input.was_pressed(MenuInput::Cancel));
    }

    #[test]
    fn frame_input_clear() {
        let mut input = FrameInput::from_inputs([MenuInput::Up]);
        input.clear();
        assert!(input.is_empty());
    }
}
