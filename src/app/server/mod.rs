pub mod participant_session;
pub mod roster;
pub mod routes;

use std::{
    collections::HashMap,
    sync::{
        Arc,
        Mutex
    },
    time::Duration
};

use participant_session::{ParticipantDisconnectEvent, ParticipantSession, ParticipantSessionHandler};
use roster::{lock_roster, SessionRoster, SharedRoster};

use crate::session::ParticipantId;

#[derive(Debug, thiserror::Error)]
pub enum RelayServerError {
    #[error("IoError, reason='{0}'")]
    IoError(#[from] tokio::io::Error),

    #[error("Failed to shutdown server")]
    ShutdownError,

    #[error("Could not join task, reason='{0}'")]
    TaskJoinError(#[from] tokio::task::JoinError),
}

type SessionHandlers = Arc<Mutex<HashMap<ParticipantId, ParticipantSessionHandler>>>;

pub struct RelayServerHandler {
    roster: SharedRoster,
    connection_task_handler: tokio::task::JoinHandle<()>,
    participant_sessions_handlers: SessionHandlers,
    shutdown_sender: tokio::sync::oneshot::Sender<()>,
    notify_no_connection: Arc<tokio::sync::Notify>,
    notify_any_connection: Arc<tokio::sync::Notify>,
}

/// Relays session broadcasts between participants connected over TCP.
pub struct RelayServer {
    listener: tokio::net::TcpListener,
}

impl RelayServer {
    const IDLE_LOG_INTERVAL: Duration = Duration::from_secs(5);

    pub async fn bind_any_local() -> Result<Self, RelayServerError> {
        Self::bind("127.0.0.1:0").await
    }

    pub async fn bind<A: tokio::net::ToSocketAddrs>(addr: A) -> Result<Self, RelayServerError> {
        Ok(Self {
            listener: tokio::net::TcpListener::bind(addr).await?,
        })
    }

    pub fn get_local_address(&self) -> Result<std::net::SocketAddr, std::io::Error> {
        self.listener.local_addr()
    }

    pub async fn run(self) -> Result<RelayServerHandler, RelayServerError> {
        let roster: SharedRoster = Arc::new(Mutex::new(SessionRoster::new()));
        let roster_shared = roster.clone();

        let (shutdown_sender, mut shutdown_receiver) = tokio::sync::oneshot::channel();

        let participant_sessions_handlers: SessionHandlers = Arc::new(Mutex::new(HashMap::new()));
        let (disconnect_tx, mut disconnect_rx) = tokio::sync::mpsc::channel::<ParticipantDisconnectEvent>(32);

        let participant_sessions_handlers_shared = participant_sessions_handlers.clone();

        let notify_no_connection = Arc::new(tokio::sync::Notify::new());
        let notify_no_connection_shared = notify_no_connection.clone();

        let notify_any_connection = Arc::new(tokio::sync::Notify::new());
        let notify_any_connection_shared = notify_any_connection.clone();

        let connection_task_handler = tokio::spawn(async move {
            // Participant IDs start at 1, 0 is never handed out
            let mut new_participant_id: ParticipantId = 1;
            loop {
                tokio::select! {
                    _ = &mut shutdown_receiver => {
                        log::debug!("Received relay shut down signal...");
                        break;
                    },
                    disconnect_event = disconnect_rx.recv() => {
                        let Some(disconnect_event) = disconnect_event else {
                            log::warn!("Received None from disconnect_rx collector!");
                            continue;
                        };
                        log::debug!("Participant session got disconnected {}", disconnect_event.id);

                        let (session_handler, no_more_participants) = {
                            let mut handlers_guard = participant_sessions_handlers
                                .lock()
                                .unwrap_or_else(|poisoned| poisoned.into_inner());
                            let removed = handlers_guard.remove(&disconnect_event.id);
                            (removed, handlers_guard.is_empty())
                        };

                        if no_more_participants {
                            notify_no_connection_shared.notify_one();
                        }

                        match session_handler {
                            Some(session_handler) => {
                                if let Err(e) = session_handler.task_handler.await {
                                    log::error!("Participant session {} ended abnormally: {e}", disconnect_event.id);
                                }
                            },
                            None => log::warn!("Attempt to remove not existing participant session {}", disconnect_event.id),
                        }
                    },
                    incoming_connection = self.listener.accept() => {
                        match incoming_connection {
                            Ok(connection) => {
                                let assigned_id = new_participant_id;
                                new_participant_id += 1;

                                let session = ParticipantSession::new(connection, assigned_id);
                                let handler = session.run(roster_shared.clone(), disconnect_tx.clone());

                                let sessions_count = {
                                    let mut handlers_guard = participant_sessions_handlers
                                        .lock()
                                        .unwrap_or_else(|poisoned| poisoned.into_inner());
                                    handlers_guard.insert(handler.id, handler);
                                    handlers_guard.len()
                                };
                                notify_any_connection_shared.notify_one();
                                log::debug!("Appending participant session, count={sessions_count}");
                            },
                            Err(e) => {
                                log::error!("Failed to accept connection: {e}");
                            },
                        }
                    },
                    _ = tokio::time::sleep(Self::IDLE_LOG_INTERVAL) => {
                        log::trace!("Relay idle");
                    },
                }
            }

            // Close whatever is still connected
            let remaining: Vec<_> = participant_sessions_handlers
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner())
                .drain()
                .collect();
            for (participant_id, handler) in remaining {
                log::debug!("Aborting participant session {participant_id}");
                handler.task_handler.abort();
            }
        });

        Ok(RelayServerHandler {
            roster,
            connection_task_handler,
            participant_sessions_handlers: participant_sessions_handlers_shared,
            shutdown_sender,
            notify_no_connection,
            notify_any_connection
        })
    }
}

impl RelayServerHandler {
    pub async fn shutdown(self) -> Result<(), RelayServerError> {
        log::debug!("Gracefully shutting down relay...");
        self.shutdown_sender.send(()).map_err(|_| RelayServerError::ShutdownError)?;
        self.connection_task_handler.await?;
        log::debug!("Relay shut down successfully!");
        Ok(())
    }

    pub async fn await_any_connection(&self) {
        self.notify_any_connection.notified().await
    }

    pub async fn await_all_disconnect(&self) {
        self.notify_no_connection.notified().await
    }

    pub fn connections_count(&self) -> usize {
        self.participant_sessions_handlers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    /// Participants currently announced to the session.
    pub fn participants_count(&self) -> usize {
        lock_roster(&self.roster).len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_relay_creation() {
        let server = RelayServer::bind_any_local().await.unwrap();
        let server_address = server.get_local_address().unwrap();
        assert!(server_address.port() > 0);
        let server_handler = server.run().await.unwrap();
        assert_eq!(server_handler.connections_count(), 0);
        tokio::time::sleep(Duration::from_millis(50)).await;
        server_handler.shutdown().await.unwrap();
    }
}
