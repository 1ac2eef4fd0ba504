use std::{
    collections::BTreeMap,
    sync::{Arc, Mutex, MutexGuard}
};

use tokio::sync::mpsc::UnboundedSender;

use crate::{
    requests::RelayEvent,
    session::ParticipantId
};

/// Outbound queues of every participant connected to the relay.
#[derive(Debug, Default)]
pub struct SessionRoster {
    participants: BTreeMap<ParticipantId, UnboundedSender<RelayEvent>>,
}

pub type SharedRoster = Arc<Mutex<SessionRoster>>;

/// Poisoning only means another session task panicked mid-update; the map itself stays usable.
pub fn lock_roster(roster: &SharedRoster) -> MutexGuard<'_, SessionRoster> {
    roster.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl SessionRoster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Greets the newcomer with its ID and the current members, then announces it to everyone.
    pub fn join(&mut self, participant_id: ParticipantId, events_tx: UnboundedSender<RelayEvent>) {
        let _ = events_tx.send(RelayEvent::Welcome { participant_id });
        for existing in self.participants.keys() {
            let _ = events_tx.send(RelayEvent::ParticipantJoined { participant_id: *existing });
        }

        self.participants.insert(participant_id, events_tx);
        self.broadcast(RelayEvent::ParticipantJoined { participant_id });
        log::info!("Participant {participant_id} joined, count={}", self.participants.len());
    }

    pub fn leave(&mut self, participant_id: ParticipantId) {
        if self.participants.remove(&participant_id).is_none() {
            log::warn!("Attempt to remove not existing participant {participant_id}");
            return;
        }
        self.broadcast(RelayEvent::ParticipantLeft { participant_id });
        log::info!("Participant {participant_id} left, count={}", self.participants.len());
    }

    pub fn send_to(&self, participant_id: ParticipantId, event: RelayEvent) {
        if let Some(events_tx) = self.participants.get(&participant_id) {
            if events_tx.send(event).is_err() {
                log::debug!("Participant {participant_id} outbound queue already closed");
            }
        }
    }

    pub fn broadcast(&self, event: RelayEvent) {
        for (participant_id, events_tx) in self.participants.iter() {
            if events_tx.send(event.clone()).is_err() {
                log::debug!("Participant {participant_id} outbound queue already closed");
            }
        }
    }

    pub fn broadcast_except(&self, sender: ParticipantId, event: RelayEvent) {
        for (participant_id, events_tx) in self.participants.iter() {
            if *participant_id == sender {
                continue;
            }
            if events_tx.send(event.clone()).is_err() {
                log::debug!("Participant {participant_id} outbound queue already closed");
            }
        }
    }

    pub fn len(&self) -> usize {
        self.participants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }

    pub fn contains(&self, participant_id: ParticipantId) -> bool {
        self.participants.contains_key(&participant_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::messages::MessageKind;

    #[test]
    fn test_join_greets_and_announces() {
        let mut roster = SessionRoster::new();
        let (a_tx, mut a_rx) = tokio::sync::mpsc::unbounded_channel();
        let (b_tx, mut b_rx) = tokio::sync::mpsc::unbounded_channel();

        roster.join(1, a_tx);
        roster.join(2, b_tx);

        assert_eq!(a_rx.try_recv().unwrap(), RelayEvent::Welcome { participant_id: 1 });
        assert_eq!(a_rx.try_recv().unwrap(), RelayEvent::ParticipantJoined { participant_id: 1 });
        assert_eq!(a_rx.try_recv().unwrap(), RelayEvent::ParticipantJoined { participant_id: 2 });

        assert_eq!(b_rx.try_recv().unwrap(), RelayEvent::Welcome { participant_id: 2 });
        assert_eq!(b_rx.try_recv().unwrap(), RelayEvent::ParticipantJoined { participant_id: 1 });
        assert_eq!(b_rx.try_recv().unwrap(), RelayEvent::ParticipantJoined { participant_id: 2 });
    }

    #[test]
    fn test_broadcast_except_skips_sender() {
        let mut roster = SessionRoster::new();
        let (a_tx, mut a_rx) = tokio::sync::mpsc::unbounded_channel();
        let (b_tx, mut b_rx) = tokio::sync::mpsc::unbounded_channel();
        roster.join(1, a_tx);
        roster.join(2, b_tx);
        while a_rx.try_recv().is_ok() {}
        while b_rx.try_recv().is_ok() {}

        let event = RelayEvent::Message { kind: MessageKind::HeadTransform, payload: vec![9] };
        roster.broadcast_except(1, event.clone());
        assert!(a_rx.try_recv().is_err());
        assert_eq!(b_rx.try_recv().unwrap(), event);
    }

    #[test]
    fn test_leave_twice_is_harmless() {
        let mut roster = SessionRoster::new();
        let (a_tx, _a_rx) = tokio::sync::mpsc::unbounded_channel();
        let (b_tx, mut b_rx) = tokio::sync::mpsc::unbounded_channel();
        roster.join(1, a_tx);
        roster.join(2, b_tx);
        while b_rx.try_recv().is_ok() {}

        roster.leave(1);
        roster.leave(1);
        assert_eq!(b_rx.try_recv().unwrap(), RelayEvent::ParticipantLeft { participant_id: 1 });
        assert!(b_rx.try_recv().is_err());
        assert_eq!(roster.len(), 1);
    }
}
