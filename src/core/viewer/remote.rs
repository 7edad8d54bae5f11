//=========================================================================
// Loopback Viewer Transport
//=========================================================================
//
// Carries viewer commands from a secondary process to the primary over a
// localhost TCP socket, one JSON line per request and one per reply.
//
// ```text
//   RemoteViewer ── {"Play":{..}}\n ──►  ViewerServer ──► sink
//                ◄────── "Done"\n ─────  ("viewer-listener" thread)
// ```
//
//=========================================================================

//=== External Dependencies ===============================================

use std::io::{self, BufRead, BufReader, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::Mutex;
use std::thread;
use std::time::Duration;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

//=== Internal Dependencies ===============================================

use super::{ViewerCommandSink, ViewerError, ViewerPlayRequest};

//=== Constants ===========================================================

const REPLY_TIMEOUT: Duration = Duration::from_secs(5);

//=== Wire Messages =======================================================

#[derive(Debug, Serialize, Deserialize)]
enum Request {
    Play(ViewerPlayRequest),
    Stop,
    SoundDelay,
}

#[derive(Debug, PartialEq, Serialize, Deserialize)]
enum Reply {
    Done,
    SoundDelay(f32),
    Failed(String),
}

fn write_line<T: Serialize>(writer: &mut impl Write, message: &T) -> io::Result<()> {
    let mut line = serde_json::to_string(message).map_err(io::Error::other)?;
    line.push('\n');
    writer.write_all(line.as_bytes())?;
    writer.flush()
}

//=== ViewerServer ========================================================

/// Accepts viewer commands from other processes and forwards them to a
/// local sink.
#[derive(Debug)]
pub struct ViewerServer {
    addr: SocketAddr,
}

impl ViewerServer {
    /// Binds `addr` and serves clients one at a time on a background
    /// thread for the rest of the process lifetime.
    ///
    /// # Errors
    ///
    /// Fails if the address is taken or the thread cannot be spawned.
    pub fn spawn<K>(addr: SocketAddr, sink: K) -> io::Result<Self>
    where
        K: ViewerCommandSink + Send + 'static,
    {
        let listener = TcpListener::bind(addr)?;
        let addr = listener.local_addr()?;

        thread::Builder::new()
            .name("viewer-listener".to_string())
            .spawn(move || serve(listener, sink))?;

        info!(target: "viewer", "Listening for viewer commands on {}", addr);
        Ok(Self { addr })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }
}

fn serve<K: ViewerCommandSink>(listener: TcpListener, sink: K) {
    for stream in listener.incoming() {
        match stream {
            Ok(stream) => {
                if let Err(e) = handle_client(stream, &sink) {
                    warn!(target: "viewer", "Viewer client dropped: {}", e);
                }
            }
            Err(e) => warn!(target: "viewer", "Viewer accept failed: {}", e),
        }
    }
}

fn handle_client<K: ViewerCommandSink>(stream: TcpStream, sink: &K) -> io::Result<()> {
    debug!(target: "viewer", "Viewer client connected from {}", stream.peer_addr()?);
    let mut writer = stream.try_clone()?;

    for line in BufReader::new(stream).lines() {
        let line = line?;
        let reply = match serde_json::from_str::<Request>(&line) {
            Ok(request) => dispatch(request, sink),
            Err(e) => Reply::Failed(format!("malformed request: {}", e)),
        };
        write_line(&mut writer, &reply)?;
    }
    Ok(())
}

fn dispatch<K: ViewerCommandSink>(request: Request, sink: &K) -> Reply {
    let result = match request {
        Request::Play(play) => sink.viewer_play(play),
        Request::Stop => sink.viewer_stop(),
        Request::SoundDelay => return Reply::SoundDelay(sink.sound_delay_ms()),
    };
    match result {
        Ok(()) => Reply::Done,
        Err(e) => Reply::Failed(e.to_string()),
    }
}

//=== RemoteViewer ========================================================

struct Connection {
    reader: BufReader<TcpStream>,
    writer: TcpStream,
}

/// Client side of the loopback transport, held by a secondary process.
pub struct RemoteViewer {
    connection: Mutex<Connection>,
}

impl RemoteViewer {
    /// Connects to a running primary at `addr`.
    pub fn connect(addr: SocketAddr, timeout: Duration) -> io::Result<Self> {
        let writer = TcpStream::connect_timeout(&addr, timeout)?;
        writer.set_read_timeout(Some(REPLY_TIMEOUT))?;
        let reader = BufReader::new(writer.try_clone()?);
        Ok(Self {
            connection: Mutex::new(Connection { reader, writer }),
        })
    }

    fn call(&self, request: &Request) -> Result<Reply, ViewerError> {
        let mut connection = self
            .connection
            .lock()
            .map_err(|_| ViewerError::Transport("connection lock poisoned".to_string()))?;

        write_line(&mut connection.writer, request).map_err(|e| ViewerError::Transport(e.to_string()))?;

        let mut line = String::new();
        let read = connection
            .reader
            .read_line(&mut line)
            .map_err(|e| ViewerError::Transport(e.to_string()))?;
        if read == 0 {
            return Err(ViewerError::Disconnected);
        }
        serde_json::from_str(line.trim_end()).map_err(|e| ViewerError::Transport(e.to_string()))
    }

    fn expect_done(&self, request: &Request) -> Result<(), ViewerError> {
        match self.call(request)? {
            Reply::Done => Ok(()),
            Reply::Failed(reason) => Err(ViewerError::Rejected(reason)),
            other => Err(ViewerError::Transport(format!("unexpected reply {:?}", other))),
        }
    }
}

impl ViewerCommandSink for RemoteViewer {
    fn viewer_play(&self, request: ViewerPlayRequest) -> Result<(), ViewerError> {
        self.expect_done(&Request::Play(request))
    }

    fn viewer_stop(&self) -> Result<(), ViewerError> {
        self.expect_done(&Request::Stop)
    }

    fn sound_delay_ms(&self) -> f32 {
        match self.call(&Request::SoundDelay) {
            Ok(Reply::SoundDelay(ms)) => ms,
            Ok(other) => {
                warn!(target: "viewer", "Unexpected sound delay reply {:?}", other);
                0.0
            }
            Err(e) => {
                warn!(target: "viewer", "Sound delay query failed: {}", e);
                0.0
            }
        }
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use crossbeam_channel::{unbounded, Receiver};

    use super::*;
    use crate::core::platform_bridge::PlatformEvent;
    use crate::core::viewer::{SoundDelay, ViewerChannel, ViewerCommand};

    const TIMEOUT: Duration = Duration::from_secs(2);

    fn server(delay: SoundDelay) -> (ViewerServer, Receiver<PlatformEvent>) {
        let (tx, rx) = unbounded();
        let loopback = SocketAddr::from(([127, 0, 0, 1], 0));
        let server = ViewerServer::spawn(loopback, ViewerChannel::new(tx, delay)).unwrap();
        (server, rx)
    }

    #[test]
    fn play_reaches_primary_channel() {
        let (server, rx) = server(SoundDelay::default());
        let remote = RemoteViewer::connect(server.local_addr(), TIMEOUT).unwrap();

        let mut request = ViewerPlayRequest::new("charts/song.dtx");
        request.start_bar = 12;
        request.drum_sound = false;
        remote.viewer_play(request.clone()).unwrap();

        match rx.recv_timeout(TIMEOUT) {
            Ok(PlatformEvent::Viewer(ViewerCommand::Play(received))) => assert_eq!(received, request),
            other => panic!("Expected viewer play, got {:?}", other),
        }
    }

    #[test]
    fn stop_and_sound_delay_share_one_connection() {
        let delay = SoundDelay::default();
        delay.set_ms(42.5);
        let (server, rx) = server(delay);
        let remote = RemoteViewer::connect(server.local_addr(), TIMEOUT).unwrap();

        remote.viewer_stop().unwrap();
        assert_eq!(remote.sound_delay_ms(), 42.5);
        assert!(matches!(
            rx.recv_timeout(TIMEOUT),
            Ok(PlatformEvent::Viewer(ViewerCommand::Stop))
        ));
    }

    #[test]
    fn closed_primary_channel_is_reported_as_rejection() {
        let (server, rx) = server(SoundDelay::default());
        drop(rx);
        let remote = RemoteViewer::connect(server.local_addr(), TIMEOUT).unwrap();

        match remote.viewer_stop() {
            Err(ViewerError::Rejected(reason)) => assert!(reason.contains("no longer running")),
            other => panic!("Expected rejection, got {:?}", other),
        }
    }

    #[test]
    fn malformed_request_gets_failure_reply() {
        let (server, _rx) = server(SoundDelay::default());
        let mut stream = TcpStream::connect_timeout(&server.local_addr(), TIMEOUT).unwrap();
        stream.write_all(b"not json\n").unwrap();

        let mut line = String::new();
        BufReader::new(stream).read_line(&mut line).unwrap();
        match serde_json::from_str::<Reply>(line.trim_end()).unwrap() {
            Reply::Failed(reason) => assert!(reason.starts_with("malformed request")),
            other => panic!("Expected failure reply, got {:?}", other),
        }
    }

    #[test]
    fn connect_without_listener_fails() {
        let listener = TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0))).unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        assert!(RemoteViewer::connect(addr, Duration::from_millis(200)).is_err());
    }
}
