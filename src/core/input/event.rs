//=========================================================================
// Input Event Types
//
// Platform-neutral key identifiers and the menu-level inputs stages react
// to.
//
// Event Flow:
// ```text
// Platform Layer (Winit)
//         ↓  KeyCode (pressed, non-repeat)
//    KeyBindings
//         ↓  MenuInput
//    FrameInput (render thread, one per frame)
//         ↓
//    Stage phase logic
// ```
//
//=========================================================================

//=== KeyCode =============================================================

/// Physical keyboard key identifier.
///
/// Represents the physical key location, not the character produced.
/// For example, `KeyA` is always the same physical key regardless of
/// keyboard layout (QWERTY vs AZERTY).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    //--- Alphabetic Keys --------------------------------------------------

    /// Letter keys: A-Z (physical location, not character)
    KeyA, KeyB, KeyC, KeyD, KeyE, KeyF, KeyG, KeyH, KeyI,
    KeyJ, KeyK, KeyL, KeyM, KeyN, KeyO, KeyP, KeyQ, KeyR,
    KeyS, KeyT, KeyU, KeyV, KeyW, KeyX, KeyY, KeyZ,

    //--- Arrow Keys -------------------------------------------------------

    ArrowDown,
    ArrowLeft,
    ArrowRight,
    ArrowUp,

    //--- Special Keys -----------------------------------------------------

    Space,
    Enter,
    Escape,
    Tab,
    Backspace,
    Delete,

    /// Fallback for keys not explicitly mapped by the input layer.
    Unidentified,
}

//=== MenuInput ===========================================================

/// Edge-triggered menu input delivered once per press.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MenuInput {
    Cancel,
    Up,
    Down,
    Left,
    Right,
    Confirm,
}

impl MenuInput {
    pub const ALL: [MenuInput; 6] = [
        MenuInput::Cancel,
        MenuInput::Up,
        MenuInput::Down,
        MenuInput::Left,
        MenuInput::Right,
        MenuInput::Confirm,
    ];
}
