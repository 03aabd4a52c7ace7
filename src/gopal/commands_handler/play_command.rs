use super::*;
use serenity::model::id::{ChannelId, GuildId, UserId};
use serenity::prelude::{Context, Mentionable};
use uuid::Uuid;

pub(super) struct PlayCommand {
    pub(super) player: Arc<DiscordPlayer>,
    pub(super) playback_history: Arc<Mutex<PlaybackHistory>>,
    pub(super) l10n: L10n,
}

pub async fn join_voice(
    ctx: &Context,
    guild_id: GuildId,
    channel_id: ChannelId,
) -> Result<Arc<SongbirdTransport>, JoinError> {
    let Some(manager) = songbird::get(ctx).await else {
        return Err(JoinError::SongbirdMissing);
    };
    let (call, connection_result) = manager.join(guild_id, channel_id).await;
    if let Err(error) = connection_result {
        warn!("Failed to join {} in {}: {}.", channel_id, guild_id, error);
        return Err(JoinError::ConnectingError);
    }
    _ = call.lock().await.deafen(true).await;
    Ok(Arc::new(SongbirdTransport::attach(call).await))
}

fn author_voice_channel(ctx: &Context, guild_id: GuildId, author_id: UserId) -> Option<ChannelId> {
    let guild = ctx.cache.guild(guild_id)?;
    guild.voice_states.get(&author_id)?.channel_id
}

impl PlayCommand {
    fn prepare_error_message(&self, error: PlayError) -> String {
        match error {
            PlayError::MissingTitle => self
                .l10n
                .string("play-command-missed-title", fluent_args![]),
            PlayError::OtherChannel(channel_id) => self.l10n.string(
                "play-command-other-channel",
                fluent_args![
                    "channel-name" => channel_id.mention().to_string()
                ],
            ),
            PlayError::Busy => self.l10n.string("play-command-busy", fluent_args![]),
            PlayError::NotFound => self.l10n.string("play-command-not-found", fluent_args![]),
            PlayError::Search(error) => {
                warn!("Track search failed: {}.", error);
                self.l10n.string("play-command-search-error", fluent_args![])
            }
            PlayError::Join(JoinError::ConnectingError) => self
                .l10n
                .string("play-command-connect-error", fluent_args![]),
            PlayError::Join(JoinError::SongbirdMissing) => {
                self.l10n.string("play-command-lib-error", fluent_args![])
            }
        }
    }

    fn stream_result_message(
        &self,
        url: &str,
        result: &Result<StreamReport, StreamError>,
    ) -> String {
        let url = url.to_string();
        match result {
            Ok(StreamReport {
                end: StreamEnd::Finished,
                ..
            }) => self.l10n.string(
                "play-command-finished",
                fluent_args![
                    "url" => url
                ],
            ),
            Ok(StreamReport {
                end: StreamEnd::Stopped,
                ..
            }) => self.l10n.string(
                "play-command-stopped",
                fluent_args![
                    "url" => url
                ],
            ),
            Err(StreamError::Busy) => self.l10n.string("play-command-busy", fluent_args![]),
            Err(StreamError::Closed) => self.l10n.string("play-command-closed", fluent_args![]),
            Err(StreamError::InvalidSource) => {
                self.l10n.string("play-command-not-found", fluent_args![])
            }
            Err(StreamError::PipelineStart(_)) => self.l10n.string(
                "play-command-pipeline-error",
                fluent_args![
                    "url" => url
                ],
            ),
            Err(StreamError::Read(_)) => self.l10n.string(
                "play-command-read-error",
                fluent_args![
                    "url" => url
                ],
            ),
            Err(StreamError::Transport(_)) => self.l10n.string(
                "play-command-voice-lost",
                fluent_args![
                    "url" => url
                ],
            ),
        }
    }
}

fn playback_outcome(result: &Result<StreamReport, StreamError>) -> Option<PlaybackOutcome> {
    match result {
        Ok(report) => Some(match report.end {
            StreamEnd::Finished => PlaybackOutcome::Finished,
            StreamEnd::Stopped => PlaybackOutcome::Stopped,
        }),
        Err(StreamError::Busy) => None,
        Err(error) => Some(PlaybackOutcome::Failed(error.to_string())),
    }
}

#[async_trait]
impl Command for PlayCommand {
    fn prefix_anchor(&self) -> String {
        self.l10n.string("play-command-prefix-anchor", fluent_args![])
    }
    fn help_info(&self) -> Option<HelpInfo> {
        Some(HelpInfo {
            header_suffix: Some(
                self.l10n
                    .string("play-command-header-suffix", fluent_args![]),
            ),
            description: self
                .l10n
                .string("play-command-help-description", fluent_args![]),
        })
    }
    async fn process<'a>(&'a self, ctx: Context, params: CommandParams<'a>) {
        let Some(guild_id) = params.guild_id else {
            return;
        };
        let id = Uuid::new_v4();
        debug!("ENTER: Play command in {} [{}].", guild_id, id);
        let title = params.args.join(SPACE);
        let Some(channel_id) = author_voice_channel(&ctx, guild_id, params.author.id) else {
            let answer_msg = self
                .l10n
                .string("play-command-missed-voice-channel", fluent_args![]);
            _ = params.channel_id.say(&ctx, answer_msg).await;
            debug!("EXIT: Play command in {} [{}].", guild_id, id);
            return;
        };
        let prepared = match self
            .player
            .prepare(guild_id, channel_id, &title, || {
                join_voice(&ctx, guild_id, channel_id)
            })
            .await
        {
            Ok(prepared) => prepared,
            Err(error) => {
                _ = params
                    .channel_id
                    .say(&ctx, self.prepare_error_message(error))
                    .await;
                debug!("EXIT: Play command in {} [{}].", guild_id, id);
                return;
            }
        };
        info!(
            "{} requested \"{}\" in {}: {} [{}].",
            params.author.name, title, guild_id, prepared.url, id
        );
        _ = params.channel_id.say(&ctx, &prepared.url).await;

        let result = self.player.play(&prepared).await;
        if let Err(error) = &result {
            warn!("Stream of {} in {} failed: {} [{}].", prepared.url, guild_id, error, id);
        }
        if let Some(outcome) = playback_outcome(&result) {
            self.playback_history.lock().await.log_history(
                guild_id,
                params.author.id,
                title,
                prepared.url.clone(),
                outcome,
            );
        }
        _ = params
            .channel_id
            .say(&ctx, self.stream_result_message(&prepared.url, &result))
            .await;
        if prepared.session.state() == VoiceSessionState::Closed {
            if let Some(manager) = songbird::get(&ctx).await {
                _ = manager.remove(guild_id).await;
            }
        }
        debug!("EXIT: Play command in {} [{}].", guild_id, id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn busy_stream_is_not_recorded() {
        assert_eq!(playback_outcome(&Err(StreamError::Busy)), None);
        assert_eq!(
            playback_outcome(&Err(StreamError::Closed)),
            Some(PlaybackOutcome::Failed("session is closed".to_string()))
        );
    }
}
