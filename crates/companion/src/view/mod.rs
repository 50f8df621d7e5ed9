#![forbid(unsafe_code)]

mod navigation;
mod presentation;

pub use config::View;
pub use navigation::Navigation;
pub use presentation::UpdatePresentation;
