use std::net::{TcpStream, ToSocketAddrs};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use shelfdeck_core::BackendEvent;
use tungstenite::handshake::HandshakeError;
use tungstenite::http::Uri;
use tungstenite::{Message, WebSocket};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(3);
const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(5);
const IO_TIMEOUT: Duration = Duration::from_millis(500);
const RECONNECT_DELAY: Duration = Duration::from_secs(3);
const STOP_GRACE: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, PartialEq)]
pub enum StreamMessage {
    Connected,
    Disconnected(String),
    Event(BackendEvent),
}

/// Background listener for the backend push channel. Dropping it stops the thread.
#[derive(Debug)]
pub struct EventStream {
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl EventStream {
    pub fn spawn<F>(url: String, mut on_message: F) -> Self
    where
        F: FnMut(StreamMessage) + Send + 'static,
    {
        let stop = Arc::new(AtomicBool::new(false));
        let stop_flag = Arc::clone(&stop);
        let handle = thread::Builder::new()
            .name("backend-events".to_string())
            .spawn(move || run(&url, &stop_flag, &mut on_message))
            .map_err(|err| tracing::warn!(error = %err, "failed to spawn event listener"))
            .ok();
        Self { stop, handle }
    }
}

impl Drop for EventStream {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        let Some(handle) = self.handle.take() else {
            return;
        };
        // Name resolution cannot be interrupted; a thread stuck there is detached.
        let deadline = Instant::now() + STOP_GRACE;
        while !handle.is_finished() && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(10));
        }
        if handle.is_finished() {
            let _ = handle.join();
        } else {
            tracing::warn!("event listener still blocked, detaching");
        }
    }
}

fn run(url: &str, stop: &AtomicBool, on_message: &mut dyn FnMut(StreamMessage)) {
    let mut connected = false;
    while !stop.load(Ordering::Relaxed) {
        match open(url, stop) {
            Ok(mut socket) => {
                tracing::info!(url, "event channel connected");
                connected = true;
                on_message(StreamMessage::Connected);
                let reason = read_until_closed(&mut socket, stop, on_message);
                let _ = socket.close(None);
                if stop.load(Ordering::Relaxed) {
                    return;
                }
                tracing::warn!(url, reason = %reason, "event channel closed");
                on_message(StreamMessage::Disconnected(reason));
            }
            Err(err) => {
                if stop.load(Ordering::Relaxed) {
                    return;
                }
                tracing::debug!(url, error = %err, "event channel connect failed");
                if connected {
                    connected = false;
                    on_message(StreamMessage::Disconnected(err));
                }
            }
        }
        sleep_unless_stopped(RECONNECT_DELAY, stop);
    }
}

/// Connects and upgrades with every blocking step bounded.
fn open(url: &str, stop: &AtomicBool) -> Result<WebSocket<TcpStream>, String> {
    let uri: Uri = url.parse().map_err(|err| format!("invalid url {url}: {err}"))?;
    if uri.scheme_str() != Some("ws") {
        return Err(format!("unsupported scheme in {url}"));
    }
    let host = uri
        .host()
        .map(|host| host.trim_start_matches('[').trim_end_matches(']'))
        .ok_or_else(|| format!("missing host in {url}"))?;
    let port = uri.port_u16().unwrap_or(80);
    let addrs = (host, port)
        .to_socket_addrs()
        .map_err(|err| format!("cannot resolve {host}: {err}"))?;

    let mut last_error = format!("no address for {host}");
    let mut stream = None;
    for addr in addrs {
        if stop.load(Ordering::Relaxed) {
            return Err("stopped".to_string());
        }
        match TcpStream::connect_timeout(&addr, CONNECT_TIMEOUT) {
            Ok(connected) => {
                stream = Some(connected);
                break;
            }
            Err(err) => last_error = err.to_string(),
        }
    }
    let stream = stream.ok_or(last_error)?;
    stream
        .set_read_timeout(Some(IO_TIMEOUT))
        .and_then(|()| stream.set_write_timeout(Some(IO_TIMEOUT)))
        .map_err(|err| err.to_string())?;

    let deadline = Instant::now() + HANDSHAKE_TIMEOUT;
    let mut handshake = tungstenite::client(url, stream);
    loop {
        match handshake {
            Ok((socket, _)) => return Ok(socket),
            Err(HandshakeError::Interrupted(mid)) => {
                if stop.load(Ordering::Relaxed) {
                    return Err("stopped".to_string());
                }
                if Instant::now() >= deadline {
                    return Err("handshake timed out".to_string());
                }
                handshake = mid.handshake();
            }
            Err(HandshakeError::Failure(err)) => return Err(err.to_string()),
        }
    }
}

fn read_until_closed(
    socket: &mut WebSocket<TcpStream>,
    stop: &AtomicBool,
    on_message: &mut dyn FnMut(StreamMessage),
) -> String {
    while !stop.load(Ordering::Relaxed) {
        match socket.read() {
            Ok(Message::Text(text)) => match BackendEvent::parse(text.as_str()) {
                Some(event) => on_message(StreamMessage::Event(event)),
                None => tracing::debug!(payload = text.as_str(), "ignoring unknown event"),
            },
            Ok(Message::Close(_)) => return "closed by backend".to_string(),
            Ok(_) => {}
            Err(tungstenite::Error::Io(err))
                if matches!(
                    err.kind(),
                    std::io::ErrorKind::WouldBlock | std::io::ErrorKind::TimedOut
                ) => {}
            Err(err) => return err.to_string(),
        }
    }
    "stopped".to_string()
}

fn sleep_unless_stopped(total: Duration, stop: &AtomicBool) {
    let deadline = Instant::now() + total;
    while !stop.load(Ordering::Relaxed) {
        let now = Instant::now();
        if now >= deadline {
            return;
        }
        thread::sleep((deadline - now).min(Duration::from_millis(100)));
    }
}
