use super::*;
use serenity::prelude::{Context, Mentionable};

pub(super) struct PlaybackHistoryCommand {
    pub(super) playback_history: Arc<Mutex<PlaybackHistory>>,
    pub(super) l10n: L10n,
}

impl PlaybackHistoryCommand {
    fn outcome_text(&self, outcome: &PlaybackOutcome) -> String {
        match outcome {
            PlaybackOutcome::Finished => self
                .l10n
                .string("history-command-status-finished", fluent_args![]),
            PlaybackOutcome::Stopped => self
                .l10n
                .string("history-command-status-stopped", fluent_args![]),
            PlaybackOutcome::Failed(reason) => self.l10n.string(
                "history-command-status-failed",
                fluent_args![
                    "reason" => reason.to_owned()
                ],
            ),
        }
    }
}

#[async_trait]
impl Command for PlaybackHistoryCommand {
    fn prefix_anchor(&self) -> String {
        self.l10n
            .string("history-command-prefix-anchor", fluent_args![])
    }
    fn help_info(&self) -> Option<HelpInfo> {
        Some(HelpInfo {
            header_suffix: None,
            description: self
                .l10n
                .string("history-command-help-description", fluent_args![]),
        })
    }
    async fn process<'a>(&'a self, ctx: Context, params: CommandParams<'a>) {
        let Some(guild_id) = params.guild_id else {
            return;
        };
        let records = self.playback_history.lock().await.recent(&guild_id);
        let answer_msg = if records.is_empty() {
            self.l10n
                .string("history-command-empty-list", fluent_args![])
        } else {
            let time_format = self
                .l10n
                .string("history-command-record-time-format", fluent_args![]);
            let mut result_strings = vec![self
                .l10n
                .string("history-command-list-header", fluent_args![])];
            for (index, record) in records.iter().enumerate() {
                result_strings.push(self.l10n.string(
                    "history-command-record",
                    fluent_args![
                        "record-number" => index + 1,
                        "time" => record.time.format(&time_format).to_string(),
                        "author-name" => record.author_id.mention().to_string(),
                        "title" => record.title.to_owned(),
                        "url" => record.url.to_owned(),
                        "status" => self.outcome_text(&record.outcome)
                    ],
                ));
            }
            result_strings.join(NEW_LINE)
        };
        _ = params.channel_id.say(&ctx, answer_msg).await;
    }
}
