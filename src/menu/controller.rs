use std::{
    cell::RefCell,
    collections::BTreeMap,
    rc::Rc
};

use serde::{
    Deserialize,
    Serialize
};

use crate::session::{
    messages::MenuActionMessage,
    transport::Transport,
    SessionError
};

use super::{
    actions::{ActionTable, DispatchError},
    config::{ConfigError, MenuConfig},
    nodes::{Node, NodeHandle},
    panels::{PanelId, PanelSet}
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StoryAction {
    ListInfo,
    Expand,
    ResetStory,
}

/// Advances the shared story, usually by broadcasting it to the session as well.
pub trait StoryTrigger: std::fmt::Debug {
    fn trigger_story(&mut self, action: StoryAction, node: Option<NodeHandle>);
}

/// Story trigger that only records what was requested.
#[derive(Debug, Default, Clone)]
pub struct StoryLog(Rc<RefCell<Vec<(StoryAction, Option<NodeHandle>)>>>);

impl StoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<(StoryAction, Option<NodeHandle>)> {
        self.0.borrow().clone()
    }
}

impl StoryTrigger for StoryLog {
    fn trigger_story(&mut self, action: StoryAction, node: Option<NodeHandle>) {
        log::info!("Story action {action:?} on {node:?}");
        self.0.borrow_mut().push((action, node));
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuButton {
    pub label: String,
    pub action_name: String,
}

/// Hexagonal radial menu attached to one graph node.
#[derive(Debug)]
pub struct MenuController {
    node: Node,
    active: bool,
    panels: PanelSet,
    buttons: Vec<MenuButton>,
    actions: ActionTable<MenuController>,
    dispatch_counts: BTreeMap<String, usize>,
    story: Box<dyn StoryTrigger>,
}

impl MenuController {
    /// Lays out the buttons from `config`. Every button must name a registered action.
    pub fn new(config: &MenuConfig, node: &Node, story: Box<dyn StoryTrigger>) -> Result<Self, ConfigError> {
        let actions = Self::action_table();

        let buttons = config.node_menu_items
            .iter()
            .map(|item| {
                if actions.contains(&item.method_name) {
                    Ok(MenuButton {
                        label: item.name.clone(),
                        action_name: item.method_name.clone(),
                    })
                } else {
                    Err(ConfigError::UnknownAction {
                        item: item.name.clone(),
                        action: item.method_name.clone(),
                    })
                }
            })
            .collect::<Result<Vec<_>, _>>()?;

        log::debug!("Menu for node {:?} laid out with {} buttons", node.handle, buttons.len());

        Ok(Self {
            node: node.clone(),
            active: true,
            panels: PanelSet::new(),
            buttons,
            actions,
            dispatch_counts: BTreeMap::new(),
            story,
        })
    }

    fn action_table() -> ActionTable<MenuController> {
        let mut actions = ActionTable::<MenuController>::new();
        actions
            .register("Back", Self::back)
            .register("CloseAllPanels", Self::close_all_panels)
            .register("Enrich", Self::enrich)
            .register("Expand", Self::expand)
            .register("ListInfo", Self::list_info)
            .register("Mitigate", Self::mitigate)
            .register("ResetStory", Self::reset_story)
            .register("TogglesMenu", Self::toggles_menu);
        actions
    }

    /// Runs a registered action by name.
    pub fn dispatch(&mut self, name: &str) -> Result<(), DispatchError> {
        let action = self.actions.resolve(name)?;
        log::debug!("Menu action '{name}'");
        *self.dispatch_counts.entry(name.to_string()).or_default() += 1;
        action(self);
        Ok(())
    }

    /// Mirrors a button click made by another participant.
    pub fn handle_network_message(&mut self, payload: &[u8]) -> Result<(), SessionError> {
        let msg = MenuActionMessage::decode(payload)?;
        log::debug!("Participant {} clicked '{}'", msg.sender_id, msg.action_name);
        self.dispatch(&msg.action_name)?;
        Ok(())
    }

    /// Local click: runs the action and lets everyone else mirror it.
    pub fn click_button(&mut self, index: usize, transport: &mut dyn Transport) -> Result<(), DispatchError> {
        let action_name = self.buttons
            .get(index)
            .map(|button| button.action_name.clone())
            .ok_or(DispatchError::NoSuchButton(index))?;

        self.dispatch(&action_name)?;

        if let Some(sender_id) = transport.local_participant_id() {
            let msg = MenuActionMessage { sender_id, action_name };
            transport.send(MenuActionMessage::KIND, msg.encode());
        }
        Ok(())
    }

    pub fn back(&mut self) {
        log::info!("Back button pushed");
    }

    pub fn close_all_panels(&mut self) {
        self.panels.close_all();
    }

    pub fn set_menu_active(&mut self, on: bool) {
        self.close_all_panels();
        self.active = on;
    }

    pub fn toggles_menu(&mut self) {
        self.set_menu_active(!self.active);
    }

    pub fn enrich(&mut self) {
        self.panels.toggle(PanelId::Enrich);
        self.story.trigger_story(StoryAction::ListInfo, Some(self.node.handle));
    }

    pub fn expand(&mut self) {
        self.set_menu_active(false);
        self.story.trigger_story(StoryAction::Expand, Some(self.node.handle));
    }

    pub fn list_info(&mut self) {
        if self.panels.is_shown(PanelId::Info) {
            self.panels.hide(PanelId::Info);
        } else {
            self.panels.show_with(PanelId::Info, self.node.info.clone());
        }
    }

    pub fn mitigate(&mut self) {
        self.panels.toggle(PanelId::Mitigate);
    }

    pub fn reset_story(&mut self) {
        self.story.trigger_story(StoryAction::ResetStory, None);
    }

    pub fn panels(&self) -> &PanelSet {
        &self.panels
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn buttons(&self) -> &[MenuButton] {
        &self.buttons
    }

    pub fn node(&self) -> &Node {
        &self.node
    }

    /// How many times `name` ran, local clicks and mirrored ones alike.
    pub fn dispatch_count(&self, name: &str) -> usize {
        self.dispatch_counts.get(name).copied().unwrap_or(0)
    }
}
