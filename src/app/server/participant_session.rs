use tokio::io::{
    AsyncBufReadExt,
    AsyncWriteExt
};

use crate::{
    requests::RelayEvent,
    session::ParticipantId
};

use super::roster::{lock_roster, SharedRoster};

#[derive(Debug)]
pub struct ParticipantSession {
    id: ParticipantId,
    socket: tokio::net::TcpStream,
    address: std::net::SocketAddr,
}

#[derive(Debug)]
pub struct ParticipantSessionHandler {
    pub id: ParticipantId,
    pub task_handler: tokio::task::JoinHandle<()>
}

#[derive(Debug)]
pub struct ParticipantDisconnectEvent {
    pub id: ParticipantId
}

impl ParticipantSession {
    pub fn new(connection: (tokio::net::TcpStream, std::net::SocketAddr), new_id: ParticipantId) -> Self {
        let (socket, address) = connection;
        Self {
            id: new_id,
            socket,
            address
        }
    }

    async fn forward_events(
        participant_id: ParticipantId,
        mut writer: tokio::net::tcp::OwnedWriteHalf,
        mut events_rx: tokio::sync::mpsc::UnboundedReceiver<RelayEvent>
    ) {
        while let Some(event) = events_rx.recv().await {
            let mut line = match serde_json::to_string(&event) {
                Ok(line) => line,
                Err(e) => {
                    log::error!("Could not serialize {event:?} for {participant_id}, reason: {e}");
                    continue;
                }
            };
            line.push('\n');

            if let Err(e) = writer.write_all(line.as_bytes()).await {
                log::debug!("Participant {participant_id} could not receive event, reason: {e}");
                break;
            }
            if let Err(e) = writer.flush().await {
                log::debug!("Participant {participant_id} could not flush, reason: {e}");
                break;
            }
        }
    }

    async fn process_participant_connection(
        self,
        roster: SharedRoster,
        disconnect_tx: tokio::sync::mpsc::Sender<ParticipantDisconnectEvent>
    ) {
        let participant_id = self.id;
        log::info!("Processing participant id={participant_id} connection: {:?}", self.address);

        let (reader, writer) = self.socket.into_split();
        let (events_tx, events_rx) = tokio::sync::mpsc::unbounded_channel();
        let writer_task = tokio::spawn(Self::forward_events(participant_id, writer, events_rx));

        lock_roster(&roster).join(participant_id, events_tx);

        let mut buf_reader = tokio::io::BufReader::new(reader);
        let mut line_buff = String::new();

        loop {
            match buf_reader.read_line(&mut line_buff).await {
                Ok(0) => {
                    log::debug!("Participant {participant_id} finished connection");
                    break;
                },
                Ok(_) => {
                    let line = line_buff.trim();
                    log::trace!("Participant {participant_id} sent line: '{line}'");

                    if let Some(reply) = super::routes::route_relay_request(participant_id, line, &roster) {
                        lock_roster(&roster).send_to(participant_id, reply);
                    }
                },
                Err(e) => {
                    log::error!("Participant {participant_id} failed, reason = {e}, finished connection");
                    break;
                }
            }
            line_buff.clear();
        }

        // Dropping the roster entry closes the outbound queue and ends the writer
        lock_roster(&roster).leave(participant_id);
        if let Err(e) = writer_task.await {
            log::warn!("Participant {participant_id} writer task failed: {e}");
        }

        if let Err(e) = disconnect_tx.send(ParticipantDisconnectEvent { id: participant_id }).await {
            log::warn!("Failed to send disconnect event for participant {participant_id}: {e}");
        }
    }

    pub fn run(
        self,
        roster: SharedRoster,
        disconnect_tx: tokio::sync::mpsc::Sender<ParticipantDisconnectEvent>
    ) -> ParticipantSessionHandler {
        let id = self.id;
        let task_handler = tokio::spawn(async move {
            self.process_participant_connection(roster, disconnect_tx).await
        });

        ParticipantSessionHandler {
            id,
            task_handler
        }
    }
}
