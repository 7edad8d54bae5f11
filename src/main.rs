//=========================================================================
// Aetheric Stage Demo Front End
//
// Title screen → options stage → back, plus viewer-mode preview stages
// driven from the command line. A viewer command is first offered to an
// already running instance; only when none answers does this process
// open its own window.
//
// Usage:
//   aetheric_stage [--config engine.toml]
//   aetheric_stage --play song.dtx --start-bar 12 --no-drum-sound
//   aetheric_stage --stop
//
//=========================================================================

//=== External Dependencies ===============================================

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use glam::{Affine2, Vec2};
use log::{info, warn};

//=== Internal Dependencies ===============================================

use aetheric_stage::core::viewer::{forward_to_running, RemoteViewer, ViewerCommand, ViewerServer};
use aetheric_stage::prelude::*;

//=== Constants ===========================================================

const VIEWER_CONNECT_TIMEOUT: Duration = Duration::from_millis(500);

//=== Command Line ========================================================

#[derive(Parser, Debug)]
#[command(name = "aetheric_stage")]
#[command(about = "Rhythm game front end: options menu, eye-catches and viewer preview")]
struct Cli {
    /// Engine configuration file
    #[arg(short, long, default_value = EngineConfig::DEFAULT_PATH)]
    config: PathBuf,

    /// Preview a chart in viewer mode
    #[arg(long, value_name = "CHART")]
    play: Option<PathBuf>,

    /// Bar the preview starts from
    #[arg(long, default_value_t = 0, requires = "play")]
    start_bar: u32,

    /// Mute drum hits during the preview
    #[arg(long, requires = "play")]
    no_drum_sound: bool,

    /// Stop the running preview
    #[arg(long, conflicts_with = "play")]
    stop: bool,
}

impl Cli {
    fn viewer_command(&self) -> Option<ViewerCommand> {
        if self.stop {
            return Some(ViewerCommand::Stop);
        }
        self.play.as_ref().map(|path| {
            let mut request = ViewerPlayRequest::new(path.clone());
            request.start_bar = self.start_bar;
            request.drum_sound = !self.no_drum_sound;
            ViewerCommand::Play(request)
        })
    }
}

//=== Screens =============================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Screen {
    Title,
    Options,
    ViewerPlay,
    ViewerIdle,
}

impl StageKey for Screen {}

//--- Title ---------------------------------------------------------------

/// Uncovers a pending eye-catch, then waits for Confirm (options) or
/// Cancel (quit).
#[derive(Default)]
struct TitleStage {
    uncovering: bool,
}

impl Activity<StageContext> for TitleStage {
    fn on_activate(&mut self, _ctx: &mut StageContext) {
        self.uncovering = false;
    }
}

impl Stage<Screen> for TitleStage {
    fn name(&self) -> &'static str {
        "title"
    }

    fn progress_and_draw(&mut self, frame: &mut FrameContext<'_, Screen>) {
        let design = frame.dc.design_size();
        frame.dc.fill_rect(
            Rect::new(0.0, 0.0, design.width, design.height),
            Affine2::IDENTITY,
            Color::rgba(0.05, 0.05, 0.12, 1.0),
        );
        frame.dc.fill_rect(
            Rect::centered(design.width * 0.4, 96.0),
            Affine2::from_translation(Vec2::new(design.width / 2.0, design.height * 0.6)),
            Color::rgba(0.25, 0.35, 0.6, 0.95),
        );

        if let Some(eyecatch) = frame.eyecatch.current_mut() {
            if !self.uncovering && eyecatch.phase() == EyecatchPhase::CloseComplete {
                match eyecatch.open(1.0) {
                    Ok(()) => self.uncovering = true,
                    Err(e) => warn!(target: "stage", "Eye-catch open rejected: {}", e),
                }
            }
            if eyecatch.phase() == EyecatchPhase::Open {
                eyecatch.advance_and_render(&mut *frame.dc, None);
                return;
            }
        }

        if frame.input.was_pressed(MenuInput::Confirm) {
            frame.requests.swap_to(Screen::Options);
        } else if frame.input.was_pressed(MenuInput::Cancel) {
            frame.requests.push(StageRequest::Exit);
        }
    }
}

//--- Viewer --------------------------------------------------------------

/// Placeholder preview: a bar showing the requested chart is loaded.
struct ViewerPlayStage {
    chart: Option<ViewerPlayRequest>,
}

impl Activity<StageContext> for ViewerPlayStage {
    fn on_activate(&mut self, ctx: &mut StageContext) {
        self.chart = ctx.viewer_request.clone();
        if let Some(chart) = &self.chart {
            info!(
                target: "viewer",
                "Previewing {} from bar {} (drums {}, delay {} ms)",
                chart.path.display(),
                chart.start_bar,
                if chart.drum_sound { "on" } else { "off" },
                ctx.sound_delay.get_ms()
            );
        }
    }
}

impl Stage<Screen> for ViewerPlayStage {
    fn name(&self) -> &'static str {
        "viewer_play"
    }

    fn progress_and_draw(&mut self, frame: &mut FrameContext<'_, Screen>) {
        let design = frame.dc.design_size();
        let color = match self.chart {
            Some(_) => Color::rgba(0.1, 0.5, 0.2, 1.0),
            None => Color::rgba(0.5, 0.1, 0.1, 1.0),
        };
        frame.dc.fill_rect(Rect::new(0.0, design.height - 24.0, design.width, 24.0), Affine2::IDENTITY, color);
    }
}

struct ViewerIdleStage;

impl Activity<StageContext> for ViewerIdleStage {}

impl Stage<Screen> for ViewerIdleStage {
    fn name(&self) -> &'static str {
        "viewer_idle"
    }

    fn progress_and_draw(&mut self, frame: &mut FrameContext<'_, Screen>) {
        let design = frame.dc.design_size();
        frame.dc.fill_rect(
            Rect::new(0.0, 0.0, design.width, design.height),
            Affine2::IDENTITY,
            Color::BLACK,
        );
        if frame.input.was_pressed(MenuInput::Cancel) {
            frame.requests.swap_to(Screen::Title);
        }
    }
}

//=== Entry Point =========================================================

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = EngineConfig::load_or_default(&cli.config);
    info!("Loaded configuration from {}", cli.config.display());

    let viewer_addr = config.viewer_addr();
    let pending = match cli.viewer_command() {
        Some(command) => {
            let kept = forward_to_running(
                command,
                config.viewer_connect_attempts,
                Duration::from_millis(config.viewer_connect_backoff_ms),
                |_| RemoteViewer::connect(viewer_addr, VIEWER_CONNECT_TIMEOUT),
            )?;
            if kept.is_none() {
                info!(target: "viewer", "Command handed to the running instance");
                return Ok(());
            }
            kept
        }
        None => None,
    };

    let engine = EngineBuilder::<Screen>::from_config(&config)
        .register_stage(Screen::Title, |_ctx| Box::new(TitleStage::default()))
        .register_stage(Screen::Options, |_ctx| Box::new(OptionsStage::new(Screen::Title)))
        .register_stage(Screen::ViewerPlay, |_ctx| Box::new(ViewerPlayStage { chart: None }))
        .register_stage(Screen::ViewerIdle, |_ctx| Box::new(ViewerIdleStage))
        .initial_stage(Screen::Title)
        .viewer_stages(Screen::ViewerPlay, Screen::ViewerIdle)
        .build();

    let viewer = engine.viewer_channel();
    if let Err(e) = ViewerServer::spawn(viewer_addr, viewer.clone()) {
        warn!(target: "viewer", "Viewer listener unavailable on {}: {}", viewer_addr, e);
    }
    if let Some(command) = pending {
        command.apply_to(&viewer)?;
    }

    engine.run()?;
    Ok(())
}
