//=========================================================================
// Platform Bridge
//=========================================================================
//
// Bridges the platform layer (winit) with the render loop.
//
// Components:
// - `interface`: Event types and error definitions (the contract)
// - `event_collector`: Render-side event collection and buffering
//
//=========================================================================

//=== Module Declarations =================================================

pub(crate) mod event_collector;
pub(crate) mod interface;

//=== Public API ==========================================================

pub(crate) use event_collector::{EventCollector, TickControl};
pub use interface::{PlatformError, PlatformEvent};
