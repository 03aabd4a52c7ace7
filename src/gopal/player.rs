use super::super::components::*;
use serenity::model::id::{ChannelId, GuildId};
use std::future::Future;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinError {
    SongbirdMissing,
    ConnectingError,
}

#[derive(Debug)]
pub enum PlayError {
    MissingTitle,
    OtherChannel(ChannelId),
    Busy,
    NotFound,
    Search(SearchError),
    Join(JoinError),
}

pub struct PreparedPlay<T: VoiceTransport> {
    pub url: String,
    pub session: Arc<VoiceSession<T>>,
}

/// Resolves titles and owns the guild sessions registry.
pub struct GopalPlayer<S: TrackSearch, T: VoiceTransport> {
    search: S,
    sessions: GuildsVoiceSessions<VoiceSession<T>>,
    configuration: Arc<VoiceSessionConfiguration>,
}

impl<S: TrackSearch, T: VoiceTransport> GopalPlayer<S, T> {
    pub fn new(search: S, configuration: VoiceSessionConfiguration) -> Self {
        Self {
            search,
            sessions: Default::default(),
            configuration: Arc::new(configuration),
        }
    }

    pub fn sessions(&self) -> &GuildsVoiceSessions<VoiceSession<T>> {
        &self.sessions
    }

    /// The title is resolved before `connect` runs, so an unknown title
    /// never joins a channel nor touches the registry. A streaming session
    /// refuses the request before any search.
    pub async fn prepare<F, Fut>(
        &self,
        guild_id: GuildId,
        channel_id: ChannelId,
        title: &str,
        connect: F,
    ) -> Result<PreparedPlay<T>, PlayError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Arc<T>, JoinError>>,
    {
        let title = title.trim();
        if title.is_empty() {
            return Err(PlayError::MissingTitle);
        }
        let existing = self
            .sessions
            .get(&guild_id)
            .await
            .filter(|session| session.state() != VoiceSessionState::Closed);
        if let Some(session) = &existing {
            if session.channel_id() != channel_id {
                return Err(PlayError::OtherChannel(session.channel_id()));
            }
            if session.state() == VoiceSessionState::Streaming {
                return Err(PlayError::Busy);
            }
        }
        let url = match self.search.resolve(title).await {
            Ok(url) => url,
            Err(SearchError::NotFound) => return Err(PlayError::NotFound),
            Err(error) => return Err(PlayError::Search(error)),
        };
        let session = match existing {
            Some(session) => session,
            None => {
                let transport = connect().await.map_err(PlayError::Join)?;
                self.register(Arc::new(VoiceSession::new(
                    guild_id,
                    channel_id,
                    transport,
                    self.configuration.clone(),
                )))
                .await
            }
        };
        Ok(PreparedPlay { url, session })
    }

    async fn register(&self, session: Arc<VoiceSession<T>>) -> Arc<VoiceSession<T>> {
        let guild_id = session.guild_id();
        let registered = self
            .sessions
            .insert_if_absent(guild_id, session.clone())
            .await;
        if registered.state() != VoiceSessionState::Closed {
            return registered;
        }
        self.sessions.put(guild_id, session.clone()).await;
        session
    }

    /// Closed sessions are dropped from the registry once the stream returns.
    pub async fn play(&self, prepared: &PreparedPlay<T>) -> Result<StreamReport, StreamError> {
        let result = prepared.session.stream(&prepared.url).await;
        if prepared.session.state() == VoiceSessionState::Closed {
            self.sessions
                .remove_exact(&prepared.session.guild_id(), &prepared.session)
                .await;
        }
        result
    }

    pub async fn leave(&self, guild_id: GuildId) -> Option<Arc<VoiceSession<T>>> {
        let session = self.sessions.remove(&guild_id).await?;
        session.close();
        Some(session)
    }

    pub async fn shutdown(&self) -> Vec<GuildId> {
        self.sessions
            .drain()
            .await
            .into_iter()
            .map(|session| {
                session.close();
                session.guild_id()
            })
            .collect()
    }
}
