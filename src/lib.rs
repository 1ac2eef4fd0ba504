pub mod app;
pub mod interaction;
pub mod math;
pub mod menu;
pub mod requests;
pub mod session;

pub const DEFAULT_SERVER_ADRESS: &str = "127.0.0.1:8080";
