//=========================================================================
// Viewer Mode
//=========================================================================
//
// Remote-control surface used by chart editors to preview a song.
//
// Architecture:
// ```text
//   Secondary process                     Primary process
//   ─────────────────                     ───────────────
//   connect_with_retry ── Remote(sink) ─► ViewerCommandSink
//        │                                  └─ ViewerChannel
//        └─ Primary (no peer answered)           └─ PlatformEvent::Viewer
//                                                    └─ render thread
//                                                       StageManager swap
// ```
//
// `remote` carries commands between processes over a loopback socket;
// this module defines the command set, the in-process sink, and the
// connection policy.
//
//=========================================================================

//=== Module Declarations =================================================

mod remote;

//=== Public API ==========================================================

pub use remote::{RemoteViewer, ViewerServer};

//=== External Dependencies ===============================================

use std::fmt::Display;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam_channel::Sender;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;

//=== Internal Dependencies ===============================================

use crate::core::platform_bridge::PlatformEvent;

//=== Commands ============================================================

/// Request to start previewing a chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewerPlayRequest {
    pub path: PathBuf,
    /// Bar number playback starts from.
    pub start_bar: u32,
    /// Whether drum hits are sounded.
    pub drum_sound: bool,
}

impl ViewerPlayRequest {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            start_bar: 0,
            drum_sound: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewerCommand {
    Play(ViewerPlayRequest),
    Stop,
}

impl ViewerCommand {
    /// Forwards the command to whichever endpoint is acting as primary.
    pub fn apply_to<K: ViewerCommandSink + ?Sized>(self, sink: &K) -> Result<(), ViewerError> {
        match self {
            Self::Play(request) => sink.viewer_play(request),
            Self::Stop => sink.viewer_stop(),
        }
    }
}

//=== ViewerCommandSink ===================================================

/// Endpoint accepting viewer commands.
pub trait ViewerCommandSink {
    fn viewer_play(&self, request: ViewerPlayRequest) -> Result<(), ViewerError>;

    fn viewer_stop(&self) -> Result<(), ViewerError>;

    /// Output latency of the sound device in milliseconds.
    fn sound_delay_ms(&self) -> f32;
}

impl<K: ViewerCommandSink + ?Sized> ViewerCommandSink for &K {
    fn viewer_play(&self, request: ViewerPlayRequest) -> Result<(), ViewerError> {
        (**self).viewer_play(request)
    }

    fn viewer_stop(&self) -> Result<(), ViewerError> {
        (**self).viewer_stop()
    }

    fn sound_delay_ms(&self) -> f32 {
        (**self).sound_delay_ms()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ViewerError {
    #[error("viewer endpoint is no longer running")]
    Disconnected,

    #[error("viewer transport failed: {0}")]
    Transport(String),

    /// The primary received the command but could not deliver it.
    #[error("viewer command rejected: {0}")]
    Rejected(String),
}

//=== SoundDelay ==========================================================

/// Sound latency shared between the render thread and viewer sinks.
#[derive(Debug, Clone, Default)]
pub struct SoundDelay(Arc<AtomicU32>);

impl SoundDelay {
    pub fn get_ms(&self) -> f32 {
        f32::from_bits(self.0.load(Ordering::Acquire))
    }

    pub fn set_ms(&self, ms: f32) {
        self.0.store(ms.to_bits(), Ordering::Release);
    }
}

//=== ViewerChannel =======================================================

/// In-process sink that forwards commands to the render thread.
#[derive(Debug, Clone)]
pub struct ViewerChannel {
    events: Sender<PlatformEvent>,
    delay: SoundDelay,
}

impl ViewerChannel {
    pub fn new(events: Sender<PlatformEvent>, delay: SoundDelay) -> Self {
        Self { events, delay }
    }

    fn send(&self, command: ViewerCommand) -> Result<(), ViewerError> {
        debug!(target: "viewer", "Queueing {:?}", command);
        self.events
            .send(PlatformEvent::Viewer(command))
            .map_err(|_| ViewerError::Disconnected)
    }
}

impl ViewerCommandSink for ViewerChannel {
    fn viewer_play(&self, request: ViewerPlayRequest) -> Result<(), ViewerError> {
        self.send(ViewerCommand::Play(request))
    }

    fn viewer_stop(&self) -> Result<(), ViewerError> {
        self.send(ViewerCommand::Stop)
    }

    fn sound_delay_ms(&self) -> f32 {
        self.delay.get_ms()
    }
}

//=== Connection Policy ===================================================

/// Outcome of looking for an already running primary instance.
#[derive(Debug)]
pub enum ViewerLink<T> {
    /// Another instance answered; forward commands to it and exit.
    Remote(T),

    /// Nobody answered; this process becomes the primary.
    Primary,
}

impl<T> ViewerLink<T> {
    pub fn is_primary(&self) -> bool {
        matches!(self, Self::Primary)
    }
}

/// Tries `connect` up to `attempts` times, sleeping `backoff` between
/// failures, then falls back to [`ViewerLink::Primary`].
///
/// `connect` receives the 1-based attempt number.
pub fn connect_with_retry<T, E, F>(attempts: u32, backoff: Duration, mut connect: F) -> ViewerLink<T>
where
    E: Display,
    F: FnMut(u32) -> Result<T, E>,
{
    for attempt in 1..=attempts {
        match connect(attempt) {
            Ok(remote) => {
                info!(target: "viewer", "Connected to running instance (attempt {})", attempt);
                return ViewerLink::Remote(remote);
            }
            Err(e) => {
                warn!(target: "viewer", "Viewer connect attempt {}/{} failed: {}", attempt, attempts, e);
                if attempt < attempts {
                    thread::sleep(backoff);
                }
            }
        }
    }

    info!(target: "viewer", "No running instance found, acting as primary");
    ViewerLink::Primary
}

/// Hands `command` to an already running instance if one answers.
///
/// Returns the command back when this process has to act as primary and
/// run it itself.
pub fn forward_to_running<T, E, F>(
    command: ViewerCommand,
    attempts: u32,
    backoff: Duration,
    connect: F,
) -> Result<Option<ViewerCommand>, ViewerError>
where
    T: ViewerCommandSink,
    E: Display,
    F: FnMut(u32) -> Result<T, E>,
{
    match connect_with_retry(attempts, backoff, connect) {
        ViewerLink::Remote(remote) => {
            command.apply_to(&remote)?;
            Ok(None)
        }
        ViewerLink::Primary => Ok(Some(command)),
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::time::Instant;

    use crossbeam_channel::unbounded;

    use super::*;

    //--- Test Helpers -----------------------------------------------------

    #[derive(Default)]
    struct RecordingSink {
        calls: RefCell<Vec<String>>,
    }

    impl ViewerCommandSink for RecordingSink {
        fn viewer_play(&self, request: ViewerPlayRequest) -> Result<(), ViewerError> {
            self.calls.borrow_mut().push(format!("play {}", request.path.display()));
            Ok(())
        }

        fn viewer_stop(&self) -> Result<(), ViewerError> {
            self.calls.borrow_mut().push("stop".into());
            Ok(())
        }

        fn sound_delay_ms(&self) -> f32 {
            0.0
        }
    }

    //=====================================================================
    // Command Tests
    //=====================================================================

    #[test]
    fn apply_to_dispatches_by_variant() {
        let sink = RecordingSink::default();
        ViewerCommand::Play(ViewerPlayRequest::new("song.dtx")).apply_to(&sink).unwrap();
        ViewerCommand::Stop.apply_to(&sink).unwrap();
        assert_eq!(*sink.calls.borrow(), vec!["play song.dtx", "stop"]);
    }

    #[test]
    fn play_request_defaults() {
        let request = ViewerPlayRequest::new("a.dtx");
        assert_eq!(request.start_bar, 0);
        assert!(request.drum_sound);
    }

    //=====================================================================
    // ViewerChannel Tests
    //=====================================================================

    #[test]
    fn channel_forwards_to_platform_events() {
        let (tx, rx) = unbounded();
        let channel = ViewerChannel::new(tx, SoundDelay::default());
        channel.viewer_stop().unwrap();

        match rx.try_recv() {
            Ok(PlatformEvent::Viewer(ViewerCommand::Stop)) => {}
            other => panic!("Expected viewer stop, got {:?}", other),
        }
    }

    #[test]
    fn channel_reports_disconnect() {
        let (tx, rx) = unbounded();
        drop(rx);
        let channel = ViewerChannel::new(tx, SoundDelay::default());
        assert_eq!(channel.viewer_stop(), Err(ViewerError::Disconnected));
    }

    #[test]
    fn channel_reads_shared_delay() {
        let (tx, _rx) = unbounded();
        let delay = SoundDelay::default();
        let channel = ViewerChannel::new(tx, delay.clone());
        delay.set_ms(12.5);
        assert_eq!(channel.sound_delay_ms(), 12.5);
    }

    //=====================================================================
    // Retry Tests
    //=====================================================================

    #[test]
    fn retry_returns_remote_on_later_success() {
        let mut seen = Vec::new();
        let link = connect_with_retry(3, Duration::from_millis(1), |attempt| {
            seen.push(attempt);
            if attempt == 2 { Ok("remote") } else { Err("busy") }
        });

        assert!(matches!(link, ViewerLink::Remote("remote")));
        assert_eq!(seen, vec![1, 2]);
    }

    #[test]
    fn retry_falls_back_to_primary() {
        let mut calls = 0;
        let started = Instant::now();
        let link: ViewerLink<()> = connect_with_retry(2, Duration::from_millis(20), |_| {
            calls += 1;
            Err("no pipe")
        });

        assert!(link.is_primary());
        assert_eq!(calls, 2);
        assert!(started.elapsed() >= Duration::from_millis(20), "one backoff between attempts");
    }

    #[test]
    fn unanswered_command_is_kept_for_primary() {
        let mut calls = 0;
        let kept = forward_to_running::<RecordingSink, _, _>(
            ViewerCommand::Stop,
            2,
            Duration::from_millis(1),
            |_| {
                calls += 1;
                Err("connection refused")
            },
        )
        .unwrap();

        assert_eq!(kept, Some(ViewerCommand::Stop));
        assert_eq!(calls, 2);
    }

    #[test]
    fn answered_command_is_forwarded() {
        let sink = RecordingSink::default();
        let kept = forward_to_running(
            ViewerCommand::Play(ViewerPlayRequest::new("song.dtx")),
            2,
            Duration::from_millis(1),
            |_| Ok::<_, &str>(&sink),
        )
        .unwrap();

        assert_eq!(kept, None);
        assert_eq!(*sink.calls.borrow(), vec!["play song.dtx"]);
    }

    #[test]
    fn forwarding_reaches_a_live_server() {
        let (tx, rx) = unbounded();
        let server = ViewerServer::spawn(
            std::net::SocketAddr::from(([127, 0, 0, 1], 0)),
            ViewerChannel::new(tx, SoundDelay::default()),
        )
        .unwrap();
        let addr = server.local_addr();

        let kept = forward_to_running(ViewerCommand::Stop, 2, Duration::from_millis(1), |_| {
            RemoteViewer::connect(addr, Duration::from_secs(1))
        })
        .unwrap();

        assert_eq!(kept, None);
        assert!(matches!(
            rx.recv_timeout(Duration::from_secs(2)),
            Ok(PlatformEvent::Viewer(ViewerCommand::Stop))
        ));
    }

    #[test]
    fn zero_attempts_is_primary() {
        let link: ViewerLink<()> = connect_with_retry(0, Duration::from_secs(5), |_| Ok::<(), &str>(()));
        assert!(link.is_primary());
    }
}
