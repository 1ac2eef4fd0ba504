use std::{
    cell::RefCell,
    collections::{HashMap, HashSet, VecDeque},
    rc::Rc
};

use super::{messages::MessageKind, ParticipantId};

/// Something that happened on the session since the last poll.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    Connected,
    ParticipantJoined(ParticipantId),
    ParticipantLeft(ParticipantId),
    Message {
        kind: MessageKind,
        payload: Vec<u8>,
    },
}

/// Connection to a shared session.
///
/// Sends are best-effort broadcasts to every other participant. Incoming
/// traffic is pulled with `poll_events` from the single update loop, in the
/// order the transport received it.
pub trait Transport {
    fn local_participant_id(&self) -> Option<ParticipantId>;

    fn is_connected(&self) -> bool;

    fn send(&mut self, kind: MessageKind, payload: Vec<u8>);

    fn poll_events(&mut self) -> Vec<TransportEvent>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionHook {
    Connected,
    ParticipantJoined,
    ParticipantLeft,
}

/// Which session notifications a component currently listens to.
#[derive(Debug, Default, Clone)]
pub struct Subscriptions(HashSet<SessionHook>);

impl Subscriptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false when already subscribed.
    pub fn subscribe(&mut self, hook: SessionHook) -> bool {
        self.0.insert(hook)
    }

    /// Returns false when there was nothing to remove.
    pub fn unsubscribe(&mut self, hook: SessionHook) -> bool {
        self.0.remove(&hook)
    }

    pub fn is_subscribed(&self, hook: SessionHook) -> bool {
        self.0.contains(&hook)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Debug, Default)]
struct HubState {
    new_participant_id: ParticipantId,
    members: Vec<ParticipantId>,
    inboxes: HashMap<ParticipantId, VecDeque<TransportEvent>>,
}

/// In-process session shared by several `LoopbackTransport`s on one thread.
#[derive(Debug, Clone, Default)]
pub struct LoopbackHub(Rc<RefCell<HubState>>);

#[derive(Debug)]
pub struct LoopbackTransport {
    hub: LoopbackHub,
    id: ParticipantId,
}

impl LoopbackHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates a participant that is not connected yet, see `complete_join`.
    pub fn join_pending(&self) -> LoopbackTransport {
        let mut state = self.0.borrow_mut();
        state.new_participant_id += 1;
        let id = state.new_participant_id;
        state.inboxes.insert(id, VecDeque::new());
        log::debug!("Loopback participant {id} allocated");

        LoopbackTransport {
            hub: self.clone(),
            id,
        }
    }

    /// Connects a pending participant and announces it to everyone.
    pub fn complete_join(&self, id: ParticipantId) {
        let mut state = self.0.borrow_mut();
        if state.members.contains(&id) || !state.inboxes.contains_key(&id) {
            log::warn!("Loopback participant {id} cannot join twice");
            return;
        }

        let existing = state.members.clone();
        state.members.push(id);

        if let Some(inbox) = state.inboxes.get_mut(&id) {
            inbox.push_back(TransportEvent::Connected);
            inbox.extend(existing.iter().map(|other| TransportEvent::ParticipantJoined(*other)));
        }

        for member in state.members.clone() {
            if let Some(inbox) = state.inboxes.get_mut(&member) {
                inbox.push_back(TransportEvent::ParticipantJoined(id));
            }
        }
        log::info!("Loopback participant {id} joined, count={}", state.members.len());
    }

    pub fn join(&self) -> LoopbackTransport {
        let transport = self.join_pending();
        self.complete_join(transport.id);
        transport
    }

    pub fn leave(&self, id: ParticipantId) {
        let mut state = self.0.borrow_mut();
        let Some(position) = state.members.iter().position(|member| *member == id) else {
            return;
        };
        state.members.remove(position);
        state.inboxes.remove(&id);

        for member in state.members.clone() {
            if let Some(inbox) = state.inboxes.get_mut(&member) {
                inbox.push_back(TransportEvent::ParticipantLeft(id));
            }
        }
        log::info!("Loopback participant {id} left, count={}", state.members.len());
    }

    /// Queues an arbitrary event for one participant, bypassing the session.
    pub fn inject(&self, to: ParticipantId, event: TransportEvent) {
        if let Some(inbox) = self.0.borrow_mut().inboxes.get_mut(&to) {
            inbox.push_back(event);
        }
    }

    pub fn members(&self) -> Vec<ParticipantId> {
        self.0.borrow().members.clone()
    }

    fn is_member(&self, id: ParticipantId) -> bool {
        self.0.borrow().members.contains(&id)
    }

    fn broadcast_from(&self, sender: ParticipantId, kind: MessageKind, payload: Vec<u8>) {
        let mut state = self.0.borrow_mut();
        for member in state.members.clone() {
            if member == sender {
                continue;
            }
            if let Some(inbox) = state.inboxes.get_mut(&member) {
                inbox.push_back(TransportEvent::Message { kind, payload: payload.clone() });
            }
        }
    }

    fn drain(&self, id: ParticipantId) -> Vec<TransportEvent> {
        self.0.borrow_mut()
            .inboxes
            .get_mut(&id)
            .map(|inbox| inbox.drain(..).collect())
            .unwrap_or_default()
    }
}

impl LoopbackTransport {
    pub fn id(&self) -> ParticipantId {
        self.id
    }

    pub fn disconnect(&self) {
        self.hub.leave(self.id);
    }
}

impl Transport for LoopbackTransport {
    fn local_participant_id(&self) -> Option<ParticipantId> {
        Some(self.id)
    }

    fn is_connected(&self) -> bool {
        self.hub.is_member(self.id)
    }

    fn send(&mut self, kind: MessageKind, payload: Vec<u8>) {
        if !self.is_connected() {
            log::trace!("Loopback participant {} not connected, dropping {kind:?}", self.id);
            return;
        }
        self.hub.broadcast_from(self.id, kind, payload);
    }

    fn poll_events(&mut self) -> Vec<TransportEvent> {
        self.hub.drain(self.id)
    }
}

impl Drop for LoopbackTransport {
    fn drop(&mut self) {
        self.hub.leave(self.id);
    }
}
