//! Chat-facing tasks and the seams they talk through.
//!
//! The presenter and dispatcher only see the traits below; `discord` adapts
//! them to serenity.

pub mod alert;
pub mod discord;
pub mod status;

pub use alert::{AlertDispatcher, AlertOutcome};
pub use discord::{DiscordChannels, DiscordPresence, Handler, HttpAssets};
pub use status::StatusPresenter;

use async_trait::async_trait;
use thiserror::Error;

use crate::blockchain::FetchError;

#[derive(Debug, Error)]
pub enum ChatError {
    #[error(transparent)]
    Platform(#[from] serenity::Error),
    #[error("rejected: {0}")]
    Rejected(String),
}

/// Where the bot shows its one-line status.
pub trait StatusSink: Send + Sync {
    fn set_status(&self, text: &str);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuildRef {
    pub id: u64,
    pub name: String,
}

/// What the bot may do in a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ChannelPermissions {
    pub send_messages: bool,
    pub attach_files: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelRef {
    pub id: u64,
    pub name: String,
    pub permissions: ChannelPermissions,
}

impl ChannelRef {
    /// The alert needs both a message and an attachment.
    pub fn can_post_alert(&self) -> bool {
        self.permissions.send_messages && self.permissions.attach_files
    }
}

/// A broadcast message with one attached file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    pub content: String,
    pub file_name: String,
    pub file: Vec<u8>,
}

/// The servers and text channels the bot can reach.
#[async_trait]
pub trait AlertChannels: Send + Sync {
    async fn guilds(&self) -> Vec<GuildRef>;

    /// Text channels of `guild`, with the bot's permissions resolved.
    async fn text_channels(&self, guild: &GuildRef) -> Result<Vec<ChannelRef>, ChatError>;

    async fn post(&self, channel: &ChannelRef, alert: &Alert) -> Result<(), ChatError>;
}

/// Downloads the files attached to alerts.
#[async_trait]
pub trait AssetSource: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}
