//! Strip that slides out sideways after a tap.
//!
//! Superseded by the radial menu; kept for scenes that still place it.

use crate::math::Vector3F;

use super::InputHandler;

const STRIP_LEFT: f32 = 0.5;
const STRIP_TOP: f32 = 0.5;
const STRIP_BOTTOM: f32 = -0.5;

#[deprecated(note = "use the radial menu instead")]
#[derive(Debug, Clone, PartialEq)]
pub struct SlideoutMenu {
    pub menu_length: f32,
    pub sliding_speed_percentage: f32,
    current_length: f32,
    progress: f32,
}

#[allow(deprecated)]
impl SlideoutMenu {
    /// Starts collapsed and slides out on the first updates; a tap restarts the slide.
    pub fn new(menu_length: f32, sliding_speed_percentage: f32) -> Self {
        Self {
            menu_length,
            sliding_speed_percentage,
            current_length: 0.0,
            progress: 0.0,
        }
    }

    pub fn current_length(&self) -> f32 {
        self.current_length
    }

    pub fn is_sliding(&self) -> bool {
        self.progress < 1.0
    }

    /// Advances the slide by `dt` seconds.
    pub fn update(&mut self, dt: f32) {
        if !self.is_sliding() {
            return;
        }
        let speed = self.menu_length * self.sliding_speed_percentage;
        // Advance before applying and clamp, so the last step lands exactly on `menu_length`
        self.progress = (self.progress + speed * dt).min(1.0);
        self.current_length = self.menu_length * self.progress.max(0.0);
    }

    /// Corners of the strip in the owner's local space, clockwise from top left.
    pub fn quad(&self) -> [Vector3F; 4] {
        let right = STRIP_LEFT + self.current_length;
        [
            Vector3F::new(STRIP_LEFT, STRIP_TOP, 0.0),
            Vector3F::new(right, STRIP_TOP, 0.0),
            Vector3F::new(right, STRIP_BOTTOM, 0.0),
            Vector3F::new(STRIP_LEFT, STRIP_BOTTOM, 0.0),
        ]
    }
}

#[allow(deprecated)]
impl InputHandler for SlideoutMenu {
    fn on_input_up(&mut self) {
        self.progress = 0.0;
    }
}
