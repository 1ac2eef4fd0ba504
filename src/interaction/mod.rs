pub mod light_switch;
pub mod slideout;

/// Receives pointer/tap presses routed to a component by the host.
pub trait InputHandler {
    fn on_input_down(&mut self) {}

    fn on_input_up(&mut self);
}
