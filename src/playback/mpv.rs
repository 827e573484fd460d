//! Audio output through an mpv process driven over its JSON IPC socket.
//!
//! One idle mpv instance is started on the first `load` and kept running.
//! Commands go out as JSON lines on the socket; a reader thread forwards
//! everything mpv sends back, and [`EventTracker`] turns those messages into
//! [`OutputEvent`]s.

use std::{
    io::{self, BufRead, BufReader, Read, Write},
    path::Path,
    process::{Child, Command, Stdio},
    sync::mpsc::{self, Receiver, Sender, TryRecvError},
    thread,
    time::{Duration, Instant},
};

use serde_json::{Value, json};
use tempfile::TempDir;

use crate::{
    config::PlayerConfig,
    playback::{
        error::PlaybackError,
        output::{AudioOutput, OutputEvent},
    },
};

/// observe_property id for `core-idle`, false while audio is actually playing
pub(crate) const OBS_CORE_IDLE: u64 = 1;

const SOCKET_POLL: Duration = Duration::from_millis(50);

/// Follows mpv's event stream for the most recently loaded file.
///
/// A start is only confirmed once mpv has begun the file *and* `core-idle`
/// turned false, i.e. audio is coming out. Events belonging to a file that
/// was replaced are dropped.
#[derive(Debug, Default)]
pub(crate) struct EventTracker {
    awaiting_start: bool,
    file_started: bool,
    entry: Option<u64>,
}

fn entry_id(message: &Value) -> Option<u64> {
    message.get("playlist_entry_id").and_then(Value::as_u64)
}

impl EventTracker {
    /// A new file was requested; forget everything about the previous one.
    pub(crate) fn loading(&mut self) {
        self.awaiting_start = true;
        self.file_started = false;
        self.entry = None;
    }

    pub(crate) fn translate(&mut self, message: &Value) -> Option<OutputEvent> {
        match message.get("event")?.as_str()? {
            "start-file" => {
                self.file_started = true;
                self.entry = entry_id(message);
                None
            }
            "property-change" => {
                let id = message.get("id")?.as_u64()?;
                let idle = message.get("data")?.as_bool()?;
                if id == OBS_CORE_IDLE && !idle && self.awaiting_start && self.file_started {
                    self.awaiting_start = false;
                    Some(OutputEvent::Started)
                } else {
                    None
                }
            }
            "end-file" => {
                if !self.file_started {
                    return None;
                }
                if let (Some(current), Some(ended)) = (self.entry, entry_id(message)) {
                    if current != ended {
                        return None;
                    }
                }
                let event = match message.get("reason").and_then(Value::as_str) {
                    Some("eof") => OutputEvent::Ended,
                    Some("error") => {
                        let detail = message
                            .get("file_error")
                            .and_then(Value::as_str)
                            .unwrap_or("unknown error");
                        OutputEvent::Failed(format!("mpv could not play the file: {detail}"))
                    }
                    // stop, quit, redirect: replaced or shut down by us
                    _ => return None,
                };
                self.awaiting_start = false;
                self.file_started = false;
                self.entry = None;
                Some(event)
            }
            _ => None,
        }
    }
}

/// Error text of a command reply, None for events and successful replies.
pub(crate) fn response_error(message: &Value) -> Option<&str> {
    message.get("request_id")?;
    match message.get("error")?.as_str()? {
        "success" => None,
        error => Some(error),
    }
}

pub(crate) fn encode_command(request_id: u64, command: Value) -> Result<Vec<u8>, serde_json::Error> {
    let mut line = serde_json::to_vec(&json!({ "command": command, "request_id": request_id }))?;
    line.push(b'\n');
    Ok(line)
}

fn spawn_reader<R: Read + Send + 'static>(stream: R, tx: Sender<Value>) {
    thread::spawn(move || {
        for line in BufReader::new(stream).lines() {
            let Ok(line) = line else { break };
            match serde_json::from_str::<Value>(&line) {
                Ok(message) => {
                    if tx.send(message).is_err() {
                        break;
                    }
                }
                Err(e) => log::debug!("mpv: unreadable message {line}: {e}"),
            }
        }
        log::debug!("mpv: reader exiting");
    });
}

#[cfg(unix)]
fn connect(socket: &Path) -> io::Result<(Box<dyn Write + Send>, Receiver<Value>)> {
    let stream = std::os::unix::net::UnixStream::connect(socket)?;
    let (tx, rx) = mpsc::channel();
    spawn_reader(stream.try_clone()?, tx);
    Ok((Box::new(stream), rx))
}

#[cfg(not(unix))]
fn connect(_socket: &Path) -> io::Result<(Box<dyn Write + Send>, Receiver<Value>)> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "mpv IPC needs unix domain sockets",
    ))
}

fn stop_child(child: &mut Child) {
    if let Err(e) = child.kill() {
        log::debug!("player process already gone: {e}");
    }
    if let Err(e) = child.wait() {
        log::debug!("could not reap player process: {e}");
    }
}

/// A running mpv process plus its IPC connection.
struct MpvSession {
    child: Child,
    writer: Box<dyn Write + Send>,
    messages: Receiver<Value>,
    next_request: u64,
    _socket_dir: TempDir,
}

impl MpvSession {
    fn start(config: &PlayerConfig) -> Result<Self, PlaybackError> {
        let socket_dir = tempfile::Builder::new()
            .prefix("rolodex-mpv-")
            .tempdir()
            .map_err(PlaybackError::Spawn)?;
        let socket = socket_dir.path().join("ipc.sock");

        log::info!(
            "starting {} with IPC socket {}",
            config.command,
            socket.to_string_lossy()
        );
        let mut child = Command::new(&config.command)
            .args(&config.args)
            .arg("--idle=yes")
            .arg(format!("--input-ipc-server={}", socket.to_string_lossy()))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(PlaybackError::Spawn)?;

        let deadline = Instant::now() + config.startup_timeout();
        while !socket.exists() {
            if let Some(status) = child.try_wait().map_err(PlaybackError::Spawn)? {
                return Err(PlaybackError::PlayerExited(status.to_string()));
            }
            if Instant::now() >= deadline {
                stop_child(&mut child);
                return Err(PlaybackError::Ipc(io::Error::new(
                    io::ErrorKind::TimedOut,
                    "mpv IPC socket did not appear",
                )));
            }
            thread::sleep(SOCKET_POLL);
        }

        let (writer, messages) = match connect(&socket) {
            Ok(connection) => connection,
            Err(e) => {
                stop_child(&mut child);
                return Err(PlaybackError::Ipc(e));
            }
        };
        log::debug!("mpv: connected (pid {})", child.id());

        let mut session = Self {
            child,
            writer,
            messages,
            next_request: 0,
            _socket_dir: socket_dir,
        };
        session.send(json!(["observe_property", OBS_CORE_IDLE, "core-idle"]))?;
        Ok(session)
    }

    fn send(&mut self, command: Value) -> Result<(), PlaybackError> {
        self.next_request += 1;
        let line = encode_command(self.next_request, command)?;
        log::trace!("mpv <- {}", String::from_utf8_lossy(&line).trim_end());
        self.writer
            .write_all(&line)
            .and_then(|()| self.writer.flush())
            .map_err(PlaybackError::Ipc)
    }

    fn exit_reason(&mut self) -> String {
        match self.child.try_wait() {
            Ok(Some(status)) => format!("player exited with {status}"),
            _ => "player connection closed".to_string(),
        }
    }
}

impl Drop for MpvSession {
    fn drop(&mut self) {
        if let Err(e) = self.send(json!(["quit"])) {
            log::debug!("mpv: quit not delivered: {e}");
        }
        stop_child(&mut self.child);
    }
}

/// [`AudioOutput`] backed by mpv. Pause, resume and rewind are property
/// changes and seeks on the loaded file, so the position survives a pause.
pub struct MpvOutput {
    config: PlayerConfig,
    session: Option<MpvSession>,
    tracker: EventTracker,
    loaded: bool,
    playing: bool,
    paused: bool,
}

impl MpvOutput {
    pub fn new(config: PlayerConfig) -> Self {
        Self {
            config,
            session: None,
            tracker: EventTracker::default(),
            loaded: false,
            playing: false,
            paused: false,
        }
    }

    fn session(&mut self) -> Result<&mut MpvSession, PlaybackError> {
        if self.session.is_none() {
            self.session = Some(MpvSession::start(&self.config)?);
        }
        self.session
            .as_mut()
            .ok_or_else(|| PlaybackError::StartRejected("player is not running".into()))
    }

    /// For transport commands that have no way to report failure.
    fn send_quietly(&mut self, command: Value) {
        if let Some(session) = self.session.as_mut() {
            if let Err(e) = session.send(command) {
                log::warn!("mpv command failed: {e}");
            }
        }
    }
}

impl AudioOutput for MpvOutput {
    fn load(&mut self, source: &Path, mime: &str) -> Result<(), PlaybackError> {
        log::debug!("loading {} ({mime})", source.to_string_lossy());
        let path = source.to_string_lossy().into_owned();
        let session = self.session()?;
        // held until `play`, so the start signal belongs to the play request
        session.send(json!(["set_property", "pause", true]))?;
        session.send(json!(["loadfile", path, "replace"]))?;
        self.tracker.loading();
        self.loaded = true;
        self.playing = false;
        self.paused = false;
        Ok(())
    }

    fn play(&mut self) -> Result<(), PlaybackError> {
        if !self.loaded {
            return Err(PlaybackError::StartRejected("no audio loaded".into()));
        }
        self.session()?.send(json!(["set_property", "pause", false]))?;
        self.playing = true;
        self.paused = false;
        Ok(())
    }

    fn pause(&mut self) {
        self.send_quietly(json!(["set_property", "pause", true]));
        self.playing = false;
        self.paused = self.loaded;
    }

    fn rewind(&mut self) {
        self.send_quietly(json!(["seek", 0, "absolute"]));
    }

    fn is_playing(&self) -> bool {
        self.playing
    }

    fn is_paused_on_source(&self) -> bool {
        self.paused && self.loaded
    }

    fn poll_event(&mut self) -> Option<OutputEvent> {
        let session = self.session.as_mut()?;
        loop {
            match session.messages.try_recv() {
                Ok(message) => {
                    if let Some(error) = response_error(&message) {
                        log::warn!("mpv rejected a command: {error}");
                        continue;
                    }
                    let Some(event) = self.tracker.translate(&message) else {
                        continue;
                    };
                    if event != OutputEvent::Started {
                        // idle mpv drops the file once it ended or failed
                        self.loaded = false;
                        self.playing = false;
                        self.paused = false;
                    }
                    return Some(event);
                }
                Err(TryRecvError::Empty) => return None,
                Err(TryRecvError::Disconnected) => {
                    let reason = session.exit_reason();
                    log::warn!("mpv went away: {reason}");
                    self.session = None;
                    let was_loaded = self.loaded;
                    self.loaded = false;
                    self.playing = false;
                    self.paused = false;
                    return was_loaded.then_some(OutputEvent::Failed(reason));
                }
            }
        }
    }
}
