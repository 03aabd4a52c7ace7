use super::*;
use serenity::model::gateway::Activity;
use serenity::model::prelude::{OnlineStatus, Ready};
use serenity::prelude::Context;

pub(super) struct GopalOnReady {
    pub(super) l10n: L10n,
}

#[async_trait]
impl OnReady for GopalOnReady {
    async fn process(&self, ctx: Context, ready: Ready) {
        info!(
            "{} is connected to {} guilds!",
            ready.user.name,
            ready.guilds.len()
        );
        ctx.set_presence(
            Some(Activity::listening(
                self.l10n.string("listening-text", fluent_args![]),
            )),
            OnlineStatus::Online,
        )
        .await;
    }
}
