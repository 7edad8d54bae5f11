//=========================================================================
// Aetheric Stage Library Root
//
// Presentation core for a rhythm game front end: stage lifecycle,
// eye-catch transitions and a dedicated render thread.
//
// Responsibilities:
// - Expose the engine facade (`EngineBuilder`, `Engine`)
// - Expose `core` for stage, eye-catch and backend implementors
// - Keep Winit integration (`platform`) private
//
// Typical usage:
// ```no_run
// use aetheric_stage::prelude::*;
//
// #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
// enum Screen { Options }
// impl StageKey for Screen {}
//
// fn main() -> Result<(), PlatformError> {
//     EngineBuilder::<Screen>::new()
//         .register_stage(Screen::Options, |_ctx| Box::new(OptionsStage::new(Screen::Options)))
//         .initial_stage(Screen::Options)
//         .build()
//         .run()
// }
// ```
//
//=========================================================================

//--- Public Modules ------------------------------------------------------
//
// `core` holds the render-thread systems. It is public so applications
// can implement their own stages, eye-catches and graphics backends.
//
pub mod core;
pub mod prelude;

//--- Internal Modules ----------------------------------------------------
//
// `platform` owns the Winit window and event loop and is not part of the
// public API surface.
//
mod engine;
mod platform;

//--- Public Exports ------------------------------------------------------

pub use engine::{Engine, EngineBuilder};
