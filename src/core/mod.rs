//=========================================================================
// Core Systems
//
// Everything that runs on the render thread, plus the types the UI thread
// uses to talk to it.
//
// Responsibilities:
// - Lifecycle contract shared by stages, panels and eye-catches
// - Time-driven animation (variables, storyboards, clocks)
// - Stage swapping and the options stage
// - Eye-catch transitions between stages
// - Render-thread coordination (start / stop / resize)
//
// Notes:
// Nothing in `core` touches Winit windows directly. The UI thread only
// reaches in through `coordinator`, `platform_bridge` and `viewer`.
//
//=========================================================================

//=== Public Modules ======================================================

pub mod animation;
pub mod config;
pub mod coordinator;
pub mod eyecatch;
pub mod input;
pub mod lifecycle;
pub mod platform_bridge;
pub mod render;
pub mod stage;
pub mod viewer;
