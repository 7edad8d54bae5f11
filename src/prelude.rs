//=========================================================================
// Prelude
//=========================================================================
//
// Convenience module that re-exports commonly used types and traits.
//
// Usage:
//   use aetheric_stage::prelude::*;
//
//=========================================================================

//=== Public API ==========================================================

// Engine core
pub use crate::engine::{Engine, EngineBuilder};
pub use crate::core::config::EngineConfig;
pub use crate::core::platform_bridge::PlatformError;

// Lifecycle
pub use crate::core::lifecycle::{Activity, LifecycleNode};

// Stage system
pub use crate::core::stage::options::OptionsStage;
pub use crate::core::stage::{
    FrameContext, HostSignal, Phase, PhaseMachine, Stage, StageContext, StageKey, StageRequest,
};

// Animation
pub use crate::core::animation::{Clock, SharedClock, Storyboard, StoryboardBuilder, Transition};

// Eye-catches
pub use crate::core::eyecatch::{Eyecatch, EyecatchPhase};

// Input and drawing
pub use crate::core::input::{KeyCode, MenuInput};
pub use crate::core::render::{Color, DesignSize, DrawContext, GraphicsBackend, ImageId, Rect};

// Viewer
pub use crate::core::viewer::{ViewerCommandSink, ViewerPlayRequest};
