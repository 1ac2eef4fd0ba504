use std::collections::BTreeMap;

use super::nodes::NodeInfo;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PanelId {
    Info,
    Enrich,
    Mitigate,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    #[default]
    Hidden,
    Shown,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct PanelState {
    pub visibility: Visibility,
    pub content: Option<NodeInfo>,
}

/// Visibility of the fixed set of panels hanging off a radial menu.
#[derive(Debug, Clone, PartialEq)]
pub struct PanelSet {
    panels: BTreeMap<PanelId, PanelState>,
}

impl PanelId {
    pub const ALL: [PanelId; 3] = [PanelId::Info, PanelId::Enrich, PanelId::Mitigate];
}

impl Default for PanelSet {
    fn default() -> Self {
        Self::new()
    }
}

impl PanelSet {
    pub fn new() -> Self {
        Self {
            panels: PanelId::ALL.iter().map(|id| (*id, PanelState::default())).collect(),
        }
    }

    pub fn visibility(&self, panel: PanelId) -> Visibility {
        self.panels.get(&panel).map(|state| state.visibility).unwrap_or_default()
    }

    pub fn is_shown(&self, panel: PanelId) -> bool {
        self.visibility(panel) == Visibility::Shown
    }

    pub fn content(&self, panel: PanelId) -> Option<&NodeInfo> {
        self.panels.get(&panel).and_then(|state| state.content.as_ref())
    }

    fn state_mut(&mut self, panel: PanelId) -> &mut PanelState {
        self.panels.entry(panel).or_default()
    }

    pub fn show(&mut self, panel: PanelId) {
        self.state_mut(panel).visibility = Visibility::Shown;
    }

    /// Fills the panel before making it visible, never the other way round.
    pub fn show_with(&mut self, panel: PanelId, content: NodeInfo) {
        let state = self.state_mut(panel);
        state.content = Some(content);
        state.visibility = Visibility::Shown;
    }

    pub fn hide(&mut self, panel: PanelId) {
        self.state_mut(panel).visibility = Visibility::Hidden;
    }

    /// Returns the new visibility.
    pub fn toggle(&mut self, panel: PanelId) -> Visibility {
        let state = self.state_mut(panel);
        state.visibility = match state.visibility {
            Visibility::Hidden => Visibility::Shown,
            Visibility::Shown => Visibility::Hidden,
        };
        state.visibility
    }

    pub fn close_all(&mut self) {
        for state in self.panels.values_mut() {
            state.visibility = Visibility::Hidden;
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (PanelId, Visibility)> + '_ {
        self.panels.iter().map(|(id, state)| (*id, state.visibility))
    }
}
