use super::*;
use serenity::model::id::GuildId;
use serenity::prelude::Context;

pub(super) struct LeaveCommand {
    pub(super) player: Arc<DiscordPlayer>,
    pub(super) l10n: L10n,
}

pub enum LeaveError {
    SongbirdMissing,
    DisconnectingError,
    NoSession,
}

pub async fn leave(
    player: &DiscordPlayer,
    ctx: &Context,
    guild_id: GuildId,
) -> Result<(), LeaveError> {
    let Some(manager) = songbird::get(ctx).await else {
        return Err(LeaveError::SongbirdMissing);
    };
    let session = player.leave(guild_id).await;
    if manager.get(guild_id).is_none() {
        return match session {
            Some(_) => Ok(()),
            None => Err(LeaveError::NoSession),
        };
    }
    if manager.remove(guild_id).await.is_err() {
        return Err(LeaveError::DisconnectingError);
    }
    Ok(())
}

#[async_trait]
impl Command for LeaveCommand {
    fn prefix_anchor(&self) -> String {
        self.l10n
            .string("leave-command-prefix-anchor", fluent_args![])
    }
    fn help_info(&self) -> Option<HelpInfo> {
        Some(HelpInfo {
            header_suffix: None,
            description: self
                .l10n
                .string("leave-command-help-description", fluent_args![]),
        })
    }
    async fn process<'a>(&'a self, ctx: Context, params: CommandParams<'a>) {
        let Some(guild_id) = params.guild_id else {
            return;
        };
        let answer_msg = match leave(&self.player, &ctx, guild_id).await {
            Ok(_) => {
                info!("Left voice in {} on request of {}.", guild_id, params.author.name);
                self.l10n.string("leave-command-success", fluent_args![])
            }
            Err(LeaveError::DisconnectingError) => self
                .l10n
                .string("leave-command-disconnect-error", fluent_args![]),
            Err(LeaveError::SongbirdMissing) => {
                self.l10n.string("leave-command-lib-error", fluent_args![])
            }
            Err(LeaveError::NoSession) => self
                .l10n
                .string("leave-command-no-channel", fluent_args![]),
        };
        _ = params.channel_id.say(&ctx, answer_msg).await;
    }
}
