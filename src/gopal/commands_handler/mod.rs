mod help_command_factory;
mod history_command;
mod leave_command;
mod on_ready;
mod play_command;

use help_command_factory::*;
use history_command::*;
use leave_command::*;
use on_ready::*;
use play_command::*;

use super::super::components::*;
use super::*;
use std::sync::Arc;
use tokio::sync::Mutex;

pub type DiscordPlayer = GopalPlayer<YoutubeSearch, SongbirdTransport>;

pub struct GopalCommandsHandlerConstructor {
    pub player: Arc<DiscordPlayer>,
    pub history_size: usize,
    pub l10n: L10n,
}

impl GopalCommandsHandlerConstructor {
    pub fn build(self) -> Handler {
        let playback_history = Arc::new(Mutex::new(PlaybackHistory::with_limit(
            self.history_size,
        )));
        Handler {
            help_command_factory: Box::new(GopalHelpCommandFactory {
                l10n: self.l10n.clone(),
            }),
            on_ready: Box::new(GopalOnReady {
                l10n: self.l10n.clone(),
            }),
            commands: vec![
                Box::new(PlayCommand {
                    player: self.player.clone(),
                    playback_history: playback_history.clone(),
                    l10n: self.l10n.clone(),
                }),
                Box::new(LeaveCommand {
                    player: self.player.clone(),
                    l10n: self.l10n.clone(),
                }),
                Box::new(PlaybackHistoryCommand {
                    playback_history: playback_history.clone(),
                    l10n: self.l10n.clone(),
                }),
            ],
        }
    }
}
