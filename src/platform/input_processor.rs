//=========================================================================
// Input Processor
//=========================================================================
//
// Converts Winit keyboard events into menu inputs.
//
// Architecture:
//   Winit KeyEvent → InputProcessor → KeyCode → KeyBindings → MenuInput
//
// Only fresh presses count: releases and OS auto-repeat are dropped, and
// keys with no binding are filtered (returns None).
//
//=========================================================================

//=== External Dependencies ===============================================

use winit::{
    event::{ElementState, KeyEvent},
    keyboard::{KeyCode as WinitKeyCode, PhysicalKey},
};

//=== Internal Dependencies ===============================================

use crate::core::input::{KeyBindings, KeyCode, MenuInput};

//=== InputProcessor ======================================================

pub(crate) struct InputProcessor {
    bindings: KeyBindings,
}

impl InputProcessor {
    //--- Construction -----------------------------------------------------

    pub(crate) fn new(bindings: KeyBindings) -> Self {
        Self { bindings }
    }

    //--- Event Processing -------------------------------------------------

    /// Converts a Winit key event into the bound menu input.
    pub(crate) fn process_key_event(&self, key_event: &KeyEvent) -> Option<MenuInput> {
        let key_code = match key_event.physical_key {
            PhysicalKey::Code(code) => KeyCode::from(code),
            _ => return None,
        };
        self.resolve(key_code, key_event.state, key_event.repeat)
    }

    //--- Internal Helpers -------------------------------------------------

    fn resolve(&self, key: KeyCode, state: ElementState, repeat: bool) -> Option<MenuInput> {
        if state != ElementState::Pressed || repeat || key == KeyCode::Unidentified {
            return None;
        }
        self.bindings.resolve(key)
    }
}

//=========================================================================
// Winit Conversions
//=========================================================================

/// Converts Winit physical key codes to engine key codes.
///
/// Maps A-Z, arrows, and common special keys. Anything else returns
/// `KeyCode::Unidentified`.
impl From<WinitKeyCode> for KeyCode {
    fn from(code: WinitKeyCode) -> Self {
        use WinitKeyCode::*;
        match code {
            //--- Letters ------------------------------------------------------

            KeyA => KeyCode::KeyA,
            KeyB => KeyCode::KeyB,
            KeyC => KeyCode::KeyC,
            KeyD => KeyCode::KeyD,
            KeyE => KeyCode::KeyE,
            KeyF => KeyCode::KeyF,
            KeyG => KeyCode::KeyG,
            KeyH => KeyCode::KeyH,
            KeyI => KeyCode::KeyI,
            KeyJ => KeyCode::KeyJ,
            KeyK => KeyCode::KeyK,
            KeyL => KeyCode::KeyL,
            KeyM => KeyCode::KeyM,
            KeyN => KeyCode::KeyN,
            KeyO => KeyCode::KeyO,
            KeyP => KeyCode::KeyP,
            KeyQ => KeyCode::KeyQ,
            KeyR => KeyCode::KeyR,
            KeyS => KeyCode::KeyS,
            KeyT => KeyCode::KeyT,
            KeyU => KeyCode::KeyU,
            KeyV => KeyCode::KeyV,
            KeyW => KeyCode::KeyW,
            KeyX => KeyCode::KeyX,
            KeyY => KeyCode::KeyY,
            KeyZ => KeyCode::KeyZ,

            //--- Arrows -------------------------------------------------------

            ArrowUp => KeyCode::ArrowUp,
            ArrowDown => KeyCode::ArrowDown,
            ArrowLeft => KeyCode::ArrowLeft,
            ArrowRight => KeyCode::ArrowRight,

            //--- Special ------------------------------------------------------

            Space => KeyCode::Space,
            Enter => KeyCode::Enter,
            Escape => KeyCode::Escape,
            Tab => KeyCode::Tab,
            Backspace => KeyCode::Backspace,
            Delete => KeyCode::Delete,

            _ => KeyCode::Unidentified,
        }
    }
}

//=========================================================================
// Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn processor() -> InputProcessor {
        InputProcessor::new(KeyBindings::default())
    }

    #[test]
    fn press_resolves_through_bindings() {
        let p = processor();
        assert_eq!(
            p.resolve(KeyCode::ArrowDown, ElementState::Pressed, false),
            Some(MenuInput::Down)
        );
        assert_eq!(
            p.resolve(KeyCode::Escape, ElementState::Pressed, false),
            Some(MenuInput::Cancel)
        );
    }

    #[test]
    fn release_and_repeat_are_dropped() {
        let p = processor();
        assert_eq!(p.resolve(KeyCode::Enter, ElementState::Released, false), None);
        assert_eq!(p.resolve(KeyCode::Enter, ElementState::Pressed, true), None);
    }

    #[test]
    fn unbound_and_unidentified_keys_are_filtered() {
        let p = processor();
        assert_eq!(p.resolve(KeyCode::KeyQ, ElementState::Pressed, false), None);
        assert_eq!(p.resolve(KeyCode::Unidentified, ElementState::Pressed, false), None);
    }

    #[test]
    fn custom_binding_is_honoured() {
        let mut bindings = KeyBindings::empty();
        bindings.bind(KeyCode::KeyJ, MenuInput::Down);
        let p = InputProcessor::new(bindings);

        assert_eq!(p.resolve(KeyCode::KeyJ, ElementState::Pressed, false), Some(MenuInput::Down));
        assert_eq!(p.resolve(KeyCode::ArrowDown, ElementState::Pressed, false), None);
    }

    #[test]
    fn keycode_conversion() {
        assert_eq!(KeyCode::from(WinitKeyCode::KeyA), KeyCode::KeyA);
        assert_eq!(KeyCode::from(WinitKeyCode::ArrowUp), KeyCode::ArrowUp);
        assert_eq!(KeyCode::from(WinitKeyCode::Enter), KeyCode::Enter);
        assert_eq!(KeyCode::from(WinitKeyCode::F13), KeyCode::Unidentified);
    }
}
