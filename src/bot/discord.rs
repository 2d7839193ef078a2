use async_trait::async_trait;
use log::{debug, info, warn};
use serenity::all::{
    ActivityData, ChannelId, ChannelType, Context, CreateAttachment, CreateMessage, EventHandler,
    GuildId, Permissions, Ready,
};
use std::sync::{Arc, Mutex};

use super::{
    Alert, AlertChannels, AssetSource, ChannelPermissions, ChannelRef, ChatError, GuildRef,
    StatusSink,
};
use crate::blockchain::FetchError;
use crate::scheduler::Scheduler;

/// Presence shown as a "Playing ..." activity.
pub struct DiscordPresence {
    ctx: Context,
}

impl DiscordPresence {
    pub fn new(ctx: Context) -> Self {
        Self { ctx }
    }
}

impl StatusSink for DiscordPresence {
    fn set_status(&self, text: &str) {
        self.ctx.set_activity(Some(ActivityData::playing(text)));
    }
}

/// Guilds from the gateway cache, channels over HTTP.
pub struct DiscordChannels {
    ctx: Context,
}

impl DiscordChannels {
    pub fn new(ctx: Context) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl AlertChannels for DiscordChannels {
    async fn guilds(&self) -> Vec<GuildRef> {
        self.ctx
            .cache
            .guilds()
            .into_iter()
            .map(|id| GuildRef {
                id: id.get(),
                name: self
                    .ctx
                    .cache
                    .guild(id)
                    .map(|g| g.name.clone())
                    .unwrap_or_else(|| id.to_string()),
            })
            .collect()
    }

    async fn text_channels(&self, guild: &GuildRef) -> Result<Vec<ChannelRef>, ChatError> {
        let guild_id = GuildId::new(guild.id);
        // Permissions resolve from the cached guild, which arrives after `ready`.
        if self.ctx.cache.guild(guild_id).is_none() {
            return Err(ChatError::Rejected(format!(
                "guild {} is not cached yet",
                guild.name
            )));
        }
        let mut channels: Vec<_> = guild_id
            .channels(&self.ctx.http)
            .await?
            .into_values()
            .filter(|c| takes_messages(c.kind))
            .collect();
        channels.sort_by_key(|c| c.position);

        let me = self.ctx.cache.current_user().id;
        Ok(channels
            .into_iter()
            .map(|c| {
                let perms = c
                    .permissions_for_user(&self.ctx.cache, me)
                    .unwrap_or_else(|e| {
                        warn!("BOT - could not resolve permissions for #{}: {}", c.name, e);
                        Permissions::empty()
                    });
                ChannelRef {
                    id: c.id.get(),
                    name: c.name.clone(),
                    permissions: ChannelPermissions {
                        send_messages: perms.send_messages(),
                        attach_files: perms.attach_files(),
                    },
                }
            })
            .collect())
    }

    async fn post(&self, channel: &ChannelRef, alert: &Alert) -> Result<(), ChatError> {
        let attachment = CreateAttachment::bytes(alert.file.clone(), alert.file_name.clone());
        let message = CreateMessage::new()
            .content(alert.content.clone())
            .add_file(attachment);
        ChannelId::new(channel.id)
            .send_message(&self.ctx, message)
            .await?;
        Ok(())
    }
}

/// Guild channel kinds that accept regular messages with attachments.
fn takes_messages(kind: ChannelType) -> bool {
    matches!(kind, ChannelType::Text | ChannelType::News)
}

/// Attachment downloads over plain HTTP.
#[derive(Debug, Clone)]
pub struct HttpAssets {
    http: reqwest::Client,
}

impl HttpAssets {
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }
}

#[async_trait]
impl AssetSource for HttpAssets {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let response = self.http.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }
        Ok(response.bytes().await?.to_vec())
    }
}

/// Starts the scheduler on the first `ready` event. Later `ready` events
/// (gateway reconnects) leave the running tasks alone.
pub struct Handler {
    scheduler: Mutex<Option<Scheduler>>,
}

impl Handler {
    pub fn new(scheduler: Scheduler) -> Self {
        Self {
            scheduler: Mutex::new(Some(scheduler)),
        }
    }
}

#[async_trait]
impl EventHandler for Handler {
    async fn ready(&self, ctx: Context, ready: Ready) {
        info!("BOT - connected as {}", ready.user.name);
        let scheduler = match self.scheduler.lock() {
            Ok(mut slot) => slot.take(),
            Err(_) => {
                warn!("BOT - scheduler slot poisoned");
                None
            }
        };
        let Some(scheduler) = scheduler else {
            debug!("BOT - reconnected, tasks already running");
            return;
        };

        let presence = Arc::new(DiscordPresence::new(ctx.clone()));
        let channels = Arc::new(DiscordChannels::new(ctx));
        tokio::spawn(scheduler.start(presence, channels));
    }
}

#[cfg(test)]
mod tests {
    use super::takes_messages;
    use serenity::all::ChannelType;

    #[test]
    fn text_and_announcement_channels_take_messages() {
        assert!(takes_messages(ChannelType::Text));
        assert!(takes_messages(ChannelType::News));
        assert!(!takes_messages(ChannelType::Voice));
        assert!(!takes_messages(ChannelType::Category));
        assert!(!takes_messages(ChannelType::Forum));
        assert!(!takes_messages(ChannelType::Stage));
    }
}
