#![forbid(unsafe_code)]

mod autostart;
mod commands;
mod picker;

pub use autostart::{Autostart, AutostartToggle};
pub use commands::CommandGateway;
pub use picker::DirectoryPicker;
