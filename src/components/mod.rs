mod audio_pipe;
mod discord_chat;
mod discord_voice;
mod localization;
mod track_search;

pub use audio_pipe::*;
pub use discord_chat::*;
pub use discord_voice::*;
pub use localization::*;
pub use track_search::*;
