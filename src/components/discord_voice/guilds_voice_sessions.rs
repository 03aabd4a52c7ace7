use serenity::model::id::GuildId;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Guild to session directory. Locks are held only for the map access itself.
pub struct GuildsVoiceSessions<S>(Arc<RwLock<HashMap<GuildId, Arc<S>>>>);

impl<S> Clone for GuildsVoiceSessions<S> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<S> Default for GuildsVoiceSessions<S> {
    fn default() -> Self {
        Self(Arc::new(RwLock::new(HashMap::new())))
    }
}

impl<S> GuildsVoiceSessions<S> {
    pub async fn get(&self, guild_id: &GuildId) -> Option<Arc<S>> {
        self.0.read().await.get(guild_id).cloned()
    }

    pub async fn put(&self, guild_id: GuildId, session: Arc<S>) -> Option<Arc<S>> {
        self.0.write().await.insert(guild_id, session)
    }

    pub async fn remove(&self, guild_id: &GuildId) -> Option<Arc<S>> {
        self.0.write().await.remove(guild_id)
    }

    /// Keeps the session already registered for the guild, if any.
    pub async fn insert_if_absent(&self, guild_id: GuildId, session: Arc<S>) -> Arc<S> {
        self.0
            .write()
            .await
            .entry(guild_id)
            .or_insert(session)
            .clone()
    }

    /// Removes the guild entry only while it still is `session`.
    pub async fn remove_exact(&self, guild_id: &GuildId, session: &Arc<S>) -> bool {
        let mut sessions = self.0.write().await;
        let Some(registered) = sessions.get(guild_id) else {
            return false;
        };
        if !Arc::ptr_eq(registered, session) {
            return false;
        }
        sessions.remove(guild_id);
        true
    }

    pub async fn drain(&self) -> Vec<Arc<S>> {
        self.0.write().await.drain().map(|(_, s)| s).collect()
    }

    pub async fn len(&self) -> usize {
        self.0.read().await.len()
    }
}
