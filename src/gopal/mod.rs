mod commands_handler;
mod playback_history;
mod player;
mod settings;

pub use commands_handler::*;
pub use playback_history::*;
pub use player::*;
pub use settings::*;

pub(super) const NEW_LINE: &'static str = "\n";
pub(super) const SPACE: &'static str = " ";
