use super::InputHandler;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LightSource {
    pub name: String,
    pub active: bool,
}

/// Clickable switch flipping one light on release.
#[derive(Debug)]
pub struct LightSwitch {
    light: LightSource,
}

impl LightSwitch {
    pub fn new(light: LightSource) -> Self {
        Self { light }
    }

    pub fn light(&self) -> &LightSource {
        &self.light
    }
}

impl InputHandler for LightSwitch {
    fn on_input_up(&mut self) {
        self.light.active = !self.light.active;
        log::debug!("Light '{}' switched {}", self.light.name, if self.light.active { "on" } else { "off" });
    }
}

#[test]
fn test_release_toggles_light() {
    let mut switch = LightSwitch::new(LightSource { name: "Lamp".to_string(), active: true });
    switch.on_input_down();
    assert!(switch.light().active, "press alone does nothing");
    switch.on_input_up();
    assert!(!switch.light().active);
    switch.on_input_up();
    assert!(switch.light().active);
}
