use crate::math::Transform;

use super::{
    messages::{DecodeError, HeadTransformMessage, PresenterIdMessage},
    presenter::{self, Billboard, LookAtTarget},
    registry::ParticipantRegistry,
    transport::{SessionHook, Subscriptions, Transport},
    ParticipantId
};

/// Keeps one head proxy per remote participant in sync with the session.
#[derive(Debug)]
pub struct HeadManager {
    anchor: Transform,
    registry: ParticipantRegistry,
    billboards: Vec<Billboard>,
    subscriptions: Subscriptions,
}

impl HeadManager {
    /// `anchor` is the world pose of the shared frame head poses are exchanged in.
    pub fn new(anchor: Transform, billboards: Vec<Billboard>) -> Self {
        Self {
            anchor,
            registry: ParticipantRegistry::default(),
            billboards,
            subscriptions: Subscriptions::new(),
        }
    }

    /// Hooks membership notifications now, or once the transport connects.
    pub fn start(&mut self, transport: &dyn Transport) {
        self.registry.set_local_id(transport.local_participant_id());

        if transport.is_connected() {
            self.subscribe_membership(transport);
        } else {
            log::debug!("Session not connected yet, deferring membership hooks");
            self.subscriptions.subscribe(SessionHook::Connected);
        }
    }

    pub fn on_connected(&mut self, transport: &dyn Transport) {
        if !self.subscriptions.unsubscribe(SessionHook::Connected) {
            log::trace!("Connected notification ignored, not waiting for one");
            return;
        }
        self.subscribe_membership(transport);
    }

    fn subscribe_membership(&mut self, transport: &dyn Transport) {
        self.registry.set_local_id(transport.local_participant_id());
        let joined = self.subscriptions.subscribe(SessionHook::ParticipantJoined);
        let left = self.subscriptions.subscribe(SessionHook::ParticipantLeft);
        if joined || left {
            log::debug!("Listening to session membership as {:?}", self.registry.local_id());
        }
    }

    pub fn on_participant_joined(&mut self, user_id: ParticipantId) {
        if !self.subscriptions.is_subscribed(SessionHook::ParticipantJoined) {
            return;
        }
        if !self.registry.is_local(user_id) {
            self.registry.get_or_create(user_id);
        }
    }

    pub fn on_participant_left(&mut self, user_id: ParticipantId) {
        if !self.subscriptions.is_subscribed(SessionHook::ParticipantLeft) {
            return;
        }
        if !self.registry.is_local(user_id) {
            self.registry.remove(user_id);
        }
    }

    /// Receive side of the head pose broadcast.
    pub fn handle_head_transform(&mut self, payload: &[u8]) -> Result<(), DecodeError> {
        let msg = HeadTransformMessage::decode(payload)?;
        self.registry.update_pose(msg.sender_id, msg.position, msg.rotation);
        Ok(())
    }

    pub fn handle_presenter_id(&mut self, payload: &[u8]) -> Result<LookAtTarget, DecodeError> {
        let msg = PresenterIdMessage::decode(payload)?;
        Ok(self.apply_presenter(msg.presenter_id))
    }

    fn apply_presenter(&mut self, presenter_id: ParticipantId) -> LookAtTarget {
        let target = presenter::resolve_presenter(&self.registry, presenter_id);
        presenter::assign_target(&mut self.billboards, target);
        target
    }

    /// Announces a presenter to the session and applies it locally.
    pub fn send_presenter(&mut self, transport: &mut dyn Transport, presenter_id: ParticipantId) -> LookAtTarget {
        if let Some(sender_id) = transport.local_participant_id() {
            let msg = PresenterIdMessage { sender_id, presenter_id };
            transport.send(PresenterIdMessage::KIND, msg.encode());
        }
        self.apply_presenter(presenter_id)
    }

    /// Sends the local viewpoint, expressed in the anchor frame, to everyone else.
    pub fn broadcast_local_pose(&self, transport: &mut dyn Transport, viewpoint: &Transform) {
        if !transport.is_connected() {
            return;
        }
        let Some(sender_id) = transport.local_participant_id() else {
            return;
        };

        let local = self.anchor.to_local(viewpoint);
        let msg = HeadTransformMessage {
            sender_id,
            position: local.position,
            rotation: local.rotation,
        };
        transport.send(HeadTransformMessage::KIND, msg.encode());
    }

    /// Drops every hook, connected or not, and releases all proxies.
    pub fn shutdown(&mut self) {
        self.subscriptions.unsubscribe(SessionHook::Connected);
        self.subscriptions.unsubscribe(SessionHook::ParticipantJoined);
        self.subscriptions.unsubscribe(SessionHook::ParticipantLeft);
        self.registry.clear();
        log::debug!("Head manager shut down");
    }

    pub fn registry(&self) -> &ParticipantRegistry {
        &self.registry
    }

    pub fn subscriptions(&self) -> &Subscriptions {
        &self.subscriptions
    }

    pub fn anchor(&self) -> &Transform {
        &self.anchor
    }

    pub fn billboards(&self) -> &[Billboard] {
        &self.billboards
    }

    /// World pose each billboard should face right now.
    pub fn billboard_targets(&self, local_viewpoint: &Transform) -> Vec<(String, Transform)> {
        self.billboards
            .iter()
            .map(|billboard| (
                billboard.name.clone(),
                billboard.target_transform(&self.registry, &self.anchor, local_viewpoint)
            ))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        math::{Quaternion, Vector3F},
        session::{
            messages::MessageKind,
            transport::{LoopbackHub, TransportEvent}
        }
    };

    #[test]
    fn test_start_connected_subscribes_membership() {
        let hub = LoopbackHub::new();
        let transport = hub.join();
        let mut heads = HeadManager::new(Transform::identity(), vec![]);
        heads.start(&transport);

        assert!(heads.subscriptions().is_subscribed(SessionHook::ParticipantJoined));
        assert!(heads.subscriptions().is_subscribed(SessionHook::ParticipantLeft));
        assert!(!heads.subscriptions().is_subscribed(SessionHook::Connected));
    }

    #[test]
    fn test_start_disconnected_defers_until_connected() {
        let hub = LoopbackHub::new();
        let transport = hub.join_pending();
        let mut heads = HeadManager::new(Transform::identity(), vec![]);
        heads.start(&transport);

        assert!(heads.subscriptions().is_subscribed(SessionHook::Connected));
        heads.on_participant_joined(7);
        assert!(heads.registry().is_empty(), "joins before connecting are not observed");

        hub.complete_join(transport.id());
        heads.on_connected(&transport);
        heads.on_connected(&transport);
        assert!(!heads.subscriptions().is_subscribed(SessionHook::Connected));
        assert!(heads.subscriptions().is_subscribed(SessionHook::ParticipantJoined));

        heads.on_participant_joined(7);
        assert!(heads.registry().contains(7));
    }

    #[test]
    fn test_shutdown_without_connection_unsubscribes() {
        let hub = LoopbackHub::new();
        let transport = hub.join_pending();
        let mut heads = HeadManager::new(Transform::identity(), vec![]);
        heads.start(&transport);
        heads.shutdown();
        assert!(heads.subscriptions().is_empty());
    }

    #[test]
    fn test_local_join_and_leave_are_ignored() {
        let hub = LoopbackHub::new();
        let transport = hub.join();
        let mut heads = HeadManager::new(Transform::identity(), vec![]);
        heads.start(&transport);

        heads.on_participant_joined(transport.id());
        assert!(heads.registry().is_empty());
        heads.on_participant_left(transport.id());
        heads.on_participant_left(99);
        assert!(heads.registry().is_empty());
    }

    #[test]
    fn test_broadcast_uses_anchor_frame() {
        let hub = LoopbackHub::new();
        let mut a = hub.join();
        let mut b = hub.join();
        b.poll_events();

        let anchor = Transform::identity().with_position(Vector3F::new(0.0, 0.0, 2.0));
        let mut heads = HeadManager::new(anchor, vec![]);
        heads.start(&a);

        let viewpoint = Transform::identity().with_position(Vector3F::new(1.0, 1.5, 2.0));
        heads.broadcast_local_pose(&mut a, &viewpoint);

        let events = b.poll_events();
        let [TransportEvent::Message { kind: MessageKind::HeadTransform, payload }] = events.as_slice() else {
            panic!("unexpected events {events:?}");
        };
        let msg = HeadTransformMessage::decode(payload).unwrap();
        assert_eq!(msg.sender_id, a.id());
        assert_eq!(msg.position, Vector3F::new(1.0, 1.5, 0.0));
        assert_eq!(msg.rotation, Quaternion::IDENTITY);
    }

    #[test]
    fn test_broadcast_skipped_while_disconnected() {
        let hub = LoopbackHub::new();
        let mut pending = hub.join_pending();
        let heads = HeadManager::new(Transform::identity(), vec![]);
        heads.broadcast_local_pose(&mut pending, &Transform::identity());
        hub.complete_join(pending.id());
        assert_eq!(pending.poll_events()[0], TransportEvent::Connected);
    }

    #[test]
    fn test_presenter_message_retargets_billboards() {
        let hub = LoopbackHub::new();
        let transport = hub.join();
        let mut heads = HeadManager::new(Transform::identity(), vec![Billboard::new("Info"), Billboard::new("Enrich")]);
        heads.start(&transport);

        let payload = PresenterIdMessage { sender_id: 5, presenter_id: 5 }.encode();
        assert_eq!(heads.handle_presenter_id(&payload).unwrap(), LookAtTarget::RemoteHead(5));
        assert!(heads.billboards().iter().all(|b| b.target == LookAtTarget::RemoteHead(5)));

        assert!(heads.registry().is_empty(), "announcing a presenter adds no proxy");

        let payload = PresenterIdMessage { sender_id: 5, presenter_id: transport.id() }.encode();
        assert_eq!(heads.handle_presenter_id(&payload).unwrap(), LookAtTarget::LocalViewpoint);
        assert!(heads.billboards().iter().all(|b| b.target == LookAtTarget::LocalViewpoint));
    }
}
