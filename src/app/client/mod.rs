use std::sync::mpsc::TryRecvError;

use tokio::io::{
    AsyncBufReadExt,
    AsyncWriteExt
};

use crate::{
    requests::{RelayEvent, RelayRequest},
    session::{
        messages::MessageKind,
        transport::{Transport, TransportEvent},
        ParticipantId
    }
};

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("IoError, reason='{0}'")]
    IoError(#[from] tokio::io::Error),
}

/// Session transport talking to a `RelayServer`.
///
/// Socket IO runs on tokio tasks; the session loop only touches channels, so
/// `poll_events` never blocks.
pub struct TcpTransport {
    local_id: Option<ParticipantId>,
    connected: bool,
    last_pong: Option<Option<String>>,
    requests_tx: tokio::sync::mpsc::UnboundedSender<RelayRequest>,
    events_rx: std::sync::mpsc::Receiver<RelayEvent>,
    reader_task: tokio::task::JoinHandle<()>,
    writer_task: tokio::task::JoinHandle<()>,
}

impl TcpTransport {
    /// Must be called from within a tokio runtime.
    pub async fn connect<A: tokio::net::ToSocketAddrs + std::fmt::Debug>(addr: A) -> Result<Self, TransportError> {
        log::info!("Participant attempts to connect to relay {addr:?}...");

        let socket = tokio::net::TcpStream::connect(addr).await?;
        let client_address = socket.local_addr()?;
        log::info!("Participant {client_address} connected!");

        let (read_half, write_half) = socket.into_split();
        let (requests_tx, requests_rx) = tokio::sync::mpsc::unbounded_channel();
        let (events_tx, events_rx) = std::sync::mpsc::channel();

        let reader_task = tokio::spawn(Self::read_events(read_half, events_tx));
        let writer_task = tokio::spawn(Self::write_requests(write_half, requests_rx));

        Ok(Self {
            local_id: None,
            connected: false,
            last_pong: None,
            requests_tx,
            events_rx,
            reader_task,
            writer_task,
        })
    }

    async fn read_events(
        read_half: tokio::net::tcp::OwnedReadHalf,
        events_tx: std::sync::mpsc::Sender<RelayEvent>
    ) {
        let mut buf_reader = tokio::io::BufReader::new(read_half);
        let mut line_buff = String::new();

        loop {
            match buf_reader.read_line(&mut line_buff).await {
                Ok(0) => {
                    log::debug!("Relay closed the connection");
                    break;
                },
                Ok(_) => {
                    match serde_json::from_str::<RelayEvent>(line_buff.trim()) {
                        Ok(event) => {
                            if events_tx.send(event).is_err() {
                                log::debug!("Transport dropped, stop reading");
                                break;
                            }
                        },
                        Err(e) => log::warn!("Unparsable relay line '{}': {e}", line_buff.trim()),
                    }
                },
                Err(e) => {
                    log::error!("Relay connection failed, reason = {e}");
                    break;
                }
            }
            line_buff.clear();
        }
    }

    async fn write_requests(
        mut write_half: tokio::net::tcp::OwnedWriteHalf,
        mut requests_rx: tokio::sync::mpsc::UnboundedReceiver<RelayRequest>
    ) {
        while let Some(request) = requests_rx.recv().await {
            let mut line = match serde_json::to_string(&request) {
                Ok(line) => line,
                Err(e) => {
                    log::error!("Could not serialize request {request:?}: {e}");
                    continue;
                }
            };
            line.push('\n');

            if let Err(e) = write_half.write_all(line.as_bytes()).await {
                log::error!("Could not send request, reason: {e}");
                break;
            }
            if let Err(e) = write_half.flush().await {
                log::error!("Could not flush, reason: {e}");
                break;
            }
        }
        let _ = write_half.shutdown().await;
    }

    /// Liveness check; the reply shows up in `last_pong` after a later `poll_events`.
    pub fn ping(&self, payload: Option<String>) {
        if self.requests_tx.send(RelayRequest::Ping { payload }).is_err() {
            log::warn!("Relay connection closed, ping not sent");
        }
    }

    /// Payload of the most recent pong, `None` until one arrived.
    pub fn last_pong(&self) -> Option<&Option<String>> {
        self.last_pong.as_ref()
    }

    /// Closes the connection; the relay announces our departure.
    pub async fn disconnect(self) {
        let Self { requests_tx, reader_task, writer_task, .. } = self;
        drop(requests_tx);
        if let Err(e) = writer_task.await {
            log::warn!("Writer task failed: {e}");
        }
        reader_task.abort();
    }

    fn translate(&mut self, event: RelayEvent) -> Option<TransportEvent> {
        match event {
            RelayEvent::Welcome { participant_id } => {
                log::info!("Joined session as participant {participant_id}");
                self.local_id = Some(participant_id);
                self.connected = true;
                Some(TransportEvent::Connected)
            },
            RelayEvent::ParticipantJoined { participant_id } => Some(TransportEvent::ParticipantJoined(participant_id)),
            RelayEvent::ParticipantLeft { participant_id } => Some(TransportEvent::ParticipantLeft(participant_id)),
            RelayEvent::Message { kind, payload } => Some(TransportEvent::Message { kind, payload }),
            RelayEvent::Pong { payload } => {
                log::debug!("Relay pong {payload:?}");
                self.last_pong = Some(payload);
                None
            },
            RelayEvent::BadRequest { err } => {
                log::warn!("Relay rejected a request: {err}");
                None
            },
        }
    }
}

impl Transport for TcpTransport {
    fn local_participant_id(&self) -> Option<ParticipantId> {
        self.local_id
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn send(&mut self, kind: MessageKind, payload: Vec<u8>) {
        if !self.connected {
            log::trace!("Not connected, dropping {kind:?}");
            return;
        }
        if self.requests_tx.send(RelayRequest::Send { kind, payload }).is_err() {
            log::warn!("Relay connection closed, dropping {kind:?}");
            self.connected = false;
        }
    }

    fn poll_events(&mut self) -> Vec<TransportEvent> {
        let mut events = vec![];
        loop {
            match self.events_rx.try_recv() {
                Ok(event) => events.extend(self.translate(event)),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    if self.connected {
                        log::warn!("Lost connection to relay");
                        self.connected = false;
                    }
                    break;
                },
            }
        }
        events
    }
}
