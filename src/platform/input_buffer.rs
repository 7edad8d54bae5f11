//=========================================================================
// Input Buffer
//
// Collects menu inputs between two redraws. Acts as a transient
// aggregator between the Platform and the render loop.
//
// Responsibilities:
// - Store resolved menu inputs in arrival order
// - Hand the whole batch over at the frame boundary via `drain()`
//
// Notes:
// Consecutive identical presses are kept; two taps of Down within one
// frame move the cursor twice.
//=========================================================================

//=== Internal Modules ====================================================
use crate::core::input::MenuInput;

//=== InputBuffer Struct ==================================================

pub struct InputBuffer {
    pending: Vec<MenuInput>,
}

impl InputBuffer {
    //--- Construction -----------------------------------------------------
    //
    // Preallocates for a typical frame so pushes rarely reallocate.
    //
    pub fn new() -> Self {
        const BASE_CAPACITY: usize = 32;

        Self {
            pending: Vec::with_capacity(BASE_CAPACITY),
        }
    }

    pub fn push(&mut self, input: MenuInput) {
        self.pending.push(input);
    }

    //--- Drain ------------------------------------------------------------
    //
    // Returns the batch for this frame, or None when nothing was pressed.
    //
    pub fn drain(&mut self) -> Option<Vec<MenuInput>> {
        if self.pending.is_empty() {
            return None;
        }
        Some(std::mem::take(&mut self.pending))
    }

    //--- Utilities --------------------------------------------------------
    pub fn clear(&mut self) {
        self.pending.clear();
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
