pub mod actions;
pub mod config;
pub mod controller;
pub mod nodes;
pub mod panels;

pub use controller::{MenuController, StoryAction, StoryLog, StoryTrigger};
