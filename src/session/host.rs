use std::collections::HashMap;

use crate::{
    math::Transform,
    menu::{actions::DispatchError, MenuController}
};

use super::{
    head_manager::HeadManager,
    messages::MessageKind,
    presenter::LookAtTarget,
    transport::{Transport, TransportEvent},
    ParticipantId,
    SessionError
};

pub type MessageHandler<T> = fn(&mut SessionHost<T>, &[u8]) -> Result<(), SessionError>;

/// Drives the session components from a single update loop.
///
/// The owner calls `initialize` once, `tick` once per frame and `shutdown`
/// before dropping the host.
pub struct SessionHost<T: Transport> {
    transport: T,
    heads: HeadManager,
    menu: Option<MenuController>,
    handlers: HashMap<MessageKind, MessageHandler<T>>,
}

fn on_head_transform<T: Transport>(host: &mut SessionHost<T>, payload: &[u8]) -> Result<(), SessionError> {
    host.heads.handle_head_transform(payload)?;
    Ok(())
}

fn on_presenter_id<T: Transport>(host: &mut SessionHost<T>, payload: &[u8]) -> Result<(), SessionError> {
    host.heads.handle_presenter_id(payload)?;
    Ok(())
}

fn on_menu_action<T: Transport>(host: &mut SessionHost<T>, payload: &[u8]) -> Result<(), SessionError> {
    match host.menu.as_mut() {
        Some(menu) => menu.handle_network_message(payload),
        None => Ok(()),
    }
}

impl<T: Transport> SessionHost<T> {
    pub fn new(transport: T, heads: HeadManager) -> Self {
        Self {
            transport,
            heads,
            menu: None,
            handlers: HashMap::new(),
        }
    }

    pub fn with_menu(mut self, menu: MenuController) -> Self {
        self.menu = Some(menu);
        self
    }

    /// Replaces any handler previously registered for `kind`.
    pub fn register_handler(&mut self, kind: MessageKind, handler: MessageHandler<T>) {
        if self.handlers.insert(kind, handler).is_some() {
            log::debug!("Replaced handler for {kind:?}");
        }
    }

    pub fn initialize(&mut self) {
        self.register_handler(MessageKind::HeadTransform, on_head_transform::<T>);
        self.register_handler(MessageKind::PresenterId, on_presenter_id::<T>);
        if self.menu.is_some() {
            self.register_handler(MessageKind::MenuAction, on_menu_action::<T>);
        }
        self.heads.start(&self.transport);
        log::debug!("Session host initialized, connected={}", self.transport.is_connected());
    }

    /// Processes everything the transport received, then broadcasts the local head pose.
    /// Returns the number of events handled.
    pub fn tick(&mut self, local_viewpoint: &Transform) -> usize {
        let events = self.transport.poll_events();
        let count = events.len();
        for event in events {
            self.handle_event(event);
        }

        self.heads.broadcast_local_pose(&mut self.transport, local_viewpoint);
        log::trace!("Tick handled {count} events");
        count
    }

    pub fn handle_event(&mut self, event: TransportEvent) {
        match event {
            TransportEvent::Connected => self.heads.on_connected(&self.transport),
            TransportEvent::ParticipantJoined(user_id) => self.heads.on_participant_joined(user_id),
            TransportEvent::ParticipantLeft(user_id) => self.heads.on_participant_left(user_id),
            TransportEvent::Message { kind, payload } => {
                if let Err(e) = self.handle_message(kind, &payload) {
                    log::warn!("Dropped {kind:?} message: {e}");
                }
            },
        }
    }

    pub fn handle_message(&mut self, kind: MessageKind, payload: &[u8]) -> Result<(), SessionError> {
        let handler = *self.handlers.get(&kind).ok_or(SessionError::NoHandler(kind))?;
        handler(self, payload)
    }

    /// Clicks a menu button locally and mirrors it to the session.
    pub fn click_menu_button(&mut self, index: usize) -> Result<(), DispatchError> {
        match self.menu.as_mut() {
            Some(menu) => menu.click_button(index, &mut self.transport),
            None => Err(DispatchError::NoSuchButton(index)),
        }
    }

    pub fn announce_presenter(&mut self, presenter_id: ParticipantId) -> LookAtTarget {
        self.heads.send_presenter(&mut self.transport, presenter_id)
    }

    pub fn shutdown(&mut self) {
        self.heads.shutdown();
        self.handlers.clear();
        log::debug!("Session host shut down");
    }

    pub fn into_transport(self) -> T {
        self.transport
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn heads(&self) -> &HeadManager {
        &self.heads
    }

    pub fn heads_mut(&mut self) -> &mut HeadManager {
        &mut self.heads
    }

    pub fn menu(&self) -> Option<&MenuController> {
        self.menu.as_ref()
    }

}
