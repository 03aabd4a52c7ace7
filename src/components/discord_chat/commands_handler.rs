use super::*;
use serenity::model::id::GuildId;
use serenity::model::prelude::ChannelId;
use serenity::model::prelude::{Message, Ready};
use serenity::model::user::User;
use serenity::prelude::{Context, EventHandler};

#[async_trait]
pub trait OnReady {
    async fn process(&self, ctx: Context, ready: Ready);
}

pub struct CommandParams<'a> {
    pub guild_id: Option<GuildId>,
    pub channel_id: ChannelId,
    pub author: User,
    pub args: &'a [String],
}

#[derive(Clone)]
pub struct HelpInfo {
    pub header_suffix: Option<String>,
    pub description: String,
}

#[async_trait]
pub trait Command {
    fn prefix_anchor(&self) -> String;
    fn help_info(&self) -> Option<HelpInfo>;
    async fn process<'a>(&'a self, ctx: Context, params: CommandParams<'a>);
}

pub trait HelpCommandFactory {
    fn help_command(
        &self,
        commands_info: Vec<(String, HelpInfo)>,
    ) -> Box<dyn Command + Send + Sync + 'static>;
}

pub struct Handler {
    pub help_command_factory: Box<dyn HelpCommandFactory + Send + Sync + 'static>,
    pub on_ready: Box<dyn OnReady + Send + Sync + 'static>,
    pub commands: Vec<Box<dyn Command + Send + Sync + 'static>>,
}

fn words(string: &str) -> Vec<String> {
    string.split_whitespace().map(str::to_string).collect()
}

/// Matches anchors case-insensitively; the remaining args keep their case.
fn strip_anchor<'a>(content_words: &'a [String], anchor_words: &[String]) -> Option<&'a [String]> {
    if anchor_words.is_empty() || content_words.len() < anchor_words.len() {
        return None;
    }
    let matches = content_words
        .iter()
        .zip(anchor_words)
        .all(|(content_word, anchor_word)| content_word.to_lowercase() == anchor_word.to_lowercase());
    if !matches {
        return None;
    }
    Some(&content_words[anchor_words.len()..])
}

#[async_trait]
impl EventHandler for Handler {
    async fn message(&self, ctx: Context, msg: Message) {
        if msg.author.bot {
            return;
        };
        let help_command = self.help_command_factory.help_command(
            self.commands
                .iter()
                .filter_map(|command| {
                    command
                        .help_info()
                        .map(|help_info| (command.prefix_anchor(), help_info))
                })
                .collect(),
        );
        let args_commands = {
            let mut commands = self
                .commands
                .iter()
                .collect::<Vec<&Box<dyn Command + Send + Sync + 'static>>>();
            commands.push(&help_command);
            let mut args_commands: Vec<(Vec<String>, &Box<dyn Command + Send + Sync + 'static>)> =
                vec![];
            for command in commands {
                args_commands.push((words(&command.prefix_anchor()), command))
            }
            args_commands.sort_by(|f, s| s.0.len().cmp(&f.0.len()));
            args_commands
        };
        let content_words = words(&msg.content);
        for (command_words, command) in args_commands {
            let Some(args) = strip_anchor(&content_words, &command_words) else {
                continue;
            };
            let params = CommandParams {
                guild_id: msg.guild_id,
                channel_id: msg.channel_id,
                author: msg.author,
                args,
            };
            command.process(ctx, params).await;
            break;
        }
    }
    async fn ready(&self, ctx: Context, ready: Ready) {
        self.on_ready.process(ctx, ready).await;
    }
}
