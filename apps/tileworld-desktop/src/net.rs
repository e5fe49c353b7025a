use std::io::ErrorKind;
use std::net::TcpStream;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::thread;
use std::time::Duration;
use tileworld_session::{Transport, TransportError};
use tungstenite::stream::MaybeTlsStream;
use tungstenite::{Message, WebSocket};

const IDLE_SLEEP: Duration = Duration::from_millis(2);

enum Incoming {
    Frame(String),
    Closed(Option<String>),
}

/// Websocket transport. A network thread owns the socket; frames cross to
/// the render thread over channels and are drained once per frame.
pub struct WsTransport {
    outgoing: Sender<String>,
    incoming: Receiver<Incoming>,
}

impl WsTransport {
    pub fn connect(url: &str) -> anyhow::Result<Self> {
        let (mut socket, response) = tungstenite::connect(url)?;
        tracing::info!(url, status = %response.status(), "connected");
        if let MaybeTlsStream::Plain(stream) = socket.get_mut() {
            stream.set_nonblocking(true)?;
        }

        let (outgoing, outbox) = mpsc::channel();
        let (inbox, incoming) = mpsc::channel();
        thread::Builder::new()
            .name("tileworld-net".into())
            .spawn(move || pump_socket(socket, outbox, inbox))?;
        Ok(Self { outgoing, incoming })
    }
}

impl Transport for WsTransport {
    fn send(&mut self, frame: &str) -> Result<(), TransportError> {
        self.outgoing
            .send(frame.to_owned())
            .map_err(|_| TransportError::Closed)
    }

    fn poll(&mut self) -> Result<Option<String>, TransportError> {
        match self.incoming.try_recv() {
            Ok(Incoming::Frame(text)) => Ok(Some(text)),
            Ok(Incoming::Closed(None)) | Err(TryRecvError::Disconnected) => {
                Err(TransportError::Closed)
            }
            Ok(Incoming::Closed(Some(reason))) => Err(TransportError::Failed(reason)),
            Err(TryRecvError::Empty) => Ok(None),
        }
    }
}

fn would_block(err: &tungstenite::Error) -> bool {
    matches!(err, tungstenite::Error::Io(e) if e.kind() == ErrorKind::WouldBlock)
}

fn pump_socket(
    mut socket: WebSocket<MaybeTlsStream<TcpStream>>,
    outbox: Receiver<String>,
    inbox: Sender<Incoming>,
) {
    let reason = loop {
        let mut idle = true;

        match outbox.try_recv() {
            Ok(text) => {
                idle = false;
                if let Err(err) = socket.send(Message::Text(text.into())) {
                    if !would_block(&err) {
                        break Some(err.to_string());
                    }
                }
            }
            Err(TryRecvError::Empty) => {
                if let Err(err) = socket.flush() {
                    if !would_block(&err) {
                        break Some(err.to_string());
                    }
                }
            }
            Err(TryRecvError::Disconnected) => {
                let _ = socket.close(None);
                let _ = socket.flush();
                break None;
            }
        }

        match socket.read() {
            Ok(Message::Text(text)) => {
                idle = false;
                if inbox.send(Incoming::Frame(text.to_string())).is_err() {
                    break None;
                }
            }
            Ok(Message::Close(frame)) => {
                tracing::info!(?frame, "server closed connection");
                break None;
            }
            Ok(_) => idle = false,
            Err(err) if would_block(&err) => {}
            Err(tungstenite::Error::ConnectionClosed) => break None,
            Err(err) => break Some(err.to_string()),
        }

        if idle {
            thread::sleep(IDLE_SLEEP);
        }
    };

    if let Some(reason) = &reason {
        tracing::warn!(%reason, "connection failed");
    }
    let _ = inbox.send(Incoming::Closed(reason));
}
