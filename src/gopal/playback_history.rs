use chrono::{offset, DateTime, Utc};
use serenity::model::id::GuildId;
use serenity::model::prelude::UserId;
use std::collections::{HashMap, VecDeque};

#[derive(Debug, Clone, PartialEq)]
pub enum PlaybackOutcome {
    Finished,
    Stopped,
    Failed(String),
}

#[derive(Debug, Clone)]
pub struct PlaybackRecord {
    pub time: DateTime<Utc>,
    pub author_id: UserId,
    pub title: String,
    pub url: String,
    pub outcome: PlaybackOutcome,
}

pub struct PlaybackHistory {
    limit: usize,
    guilds: HashMap<GuildId, VecDeque<PlaybackRecord>>,
}

impl PlaybackHistory {
    pub fn with_limit(limit: usize) -> Self {
        Self {
            limit: limit.max(1),
            guilds: HashMap::new(),
        }
    }

    pub fn log_history(
        &mut self,
        guild_id: GuildId,
        author_id: UserId,
        title: String,
        url: String,
        outcome: PlaybackOutcome,
    ) {
        let record = PlaybackRecord {
            time: offset::Utc::now(),
            author_id,
            title,
            url,
            outcome,
        };
        let guild_history = self.guilds.entry(guild_id).or_default();
        guild_history.push_back(record);
        while guild_history.len() > self.limit {
            guild_history.pop_front();
        }
    }

    pub fn recent(&self, guild_id: &GuildId) -> Vec<PlaybackRecord> {
        self.guilds
            .get(guild_id)
            .map(|history| history.iter().cloned().collect())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_latest_records_per_guild() {
        let mut history = PlaybackHistory::with_limit(2);
        for title in ["a", "b", "c"] {
            history.log_history(
                GuildId(1),
                UserId(5),
                title.to_string(),
                format!("https://example.com/{}", title),
                PlaybackOutcome::Finished,
            );
        }
        history.log_history(
            GuildId(2),
            UserId(6),
            "x".to_string(),
            "https://example.com/x".to_string(),
            PlaybackOutcome::Failed("read".to_string()),
        );
        let titles: Vec<String> = history
            .recent(&GuildId(1))
            .into_iter()
            .map(|r| r.title)
            .collect();
        assert_eq!(titles, vec!["b", "c"]);
        assert_eq!(history.recent(&GuildId(2)).len(), 1);
        assert!(history.recent(&GuildId(3)).is_empty());
    }
}
