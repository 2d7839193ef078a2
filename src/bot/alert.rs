use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{MissedTickBehavior, interval};

use super::{Alert, AlertChannels, AssetSource, ChannelRef, GuildRef};
use crate::blockchain::BlockStore;
use crate::halving::{HalvingEstimate, HalvingParams};

/// Fixed content of the halving alert.
#[derive(Debug, Clone)]
pub struct AlertSettings {
    pub threshold_secs: i64,
    pub message: String,
    pub image_url: String,
}

impl AlertSettings {
    /// File name the image is attached under, taken from the URL path.
    pub fn file_name(&self) -> String {
        self.image_url
            .split(['?', '#'])
            .next()
            .and_then(|path| path.rsplit('/').next())
            .filter(|name| !name.is_empty())
            .unwrap_or("halving.png")
            .to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AlertOutcome {
    /// The alert was posted earlier in this process.
    AlreadySent,
    NoData,
    /// The halving is further away than the threshold.
    NotYet { remaining_secs: i64 },
    NoEligibleChannel,
    /// Fetching the image or posting failed; retried next cycle.
    Failed,
    Sent { guild: String, channel: String },
}

/// Posts one broadcast, once per process, when the halving is close.
pub struct AlertDispatcher {
    store: Arc<BlockStore>,
    channels: Arc<dyn AlertChannels>,
    assets: Arc<dyn AssetSource>,
    params: HalvingParams,
    settings: AlertSettings,
    fired: bool,
}

impl AlertDispatcher {
    pub fn new(
        store: Arc<BlockStore>,
        channels: Arc<dyn AlertChannels>,
        assets: Arc<dyn AssetSource>,
        params: HalvingParams,
        settings: AlertSettings,
    ) -> Self {
        Self {
            store,
            channels,
            assets,
            params,
            settings,
            fired: false,
        }
    }

    pub fn fired(&self) -> bool {
        self.fired
    }

    pub async fn check(&mut self, now: DateTime<Utc>) -> AlertOutcome {
        if self.fired {
            return AlertOutcome::AlreadySent;
        }
        let records = self.store.load();
        let Some(estimate) = HalvingEstimate::observed(&records, now, &self.params) else {
            debug!("ALERT - no block data available");
            return AlertOutcome::NoData;
        };
        let remaining_secs = estimate.remaining_seconds();
        if remaining_secs > self.settings.threshold_secs {
            debug!("ALERT - halving still {}s away", remaining_secs);
            return AlertOutcome::NotYet { remaining_secs };
        }

        let Some((guild, channel)) = self.find_channel().await else {
            warn!("ALERT - no channel allows sending messages with attachments");
            return AlertOutcome::NoEligibleChannel;
        };

        let file = match self.assets.fetch(&self.settings.image_url).await {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("ALERT - could not fetch {}: {}", self.settings.image_url, e);
                return AlertOutcome::Failed;
            }
        };
        let alert = Alert {
            content: self.settings.message.clone(),
            file_name: self.settings.file_name(),
            file,
        };

        match self.channels.post(&channel, &alert).await {
            Ok(()) => {
                self.fired = true;
                info!("ALERT - sent to #{} in {}", channel.name, guild.name);
                AlertOutcome::Sent {
                    guild: guild.name,
                    channel: channel.name,
                }
            }
            Err(e) => {
                warn!("ALERT - posting to #{} in {} failed: {}", channel.name, guild.name, e);
                AlertOutcome::Failed
            }
        }
    }

    /// First text channel, across all guilds, that takes messages with files.
    async fn find_channel(&self) -> Option<(GuildRef, ChannelRef)> {
        for guild in self.channels.guilds().await {
            let channels = match self.channels.text_channels(&guild).await {
                Ok(c) => c,
                Err(e) => {
                    warn!("ALERT - could not list channels of {}: {}", guild.name, e);
                    continue;
                }
            };
            match channels.into_iter().find(|c| c.can_post_alert()) {
                Some(channel) => return Some((guild, channel)),
                None => debug!("ALERT - no postable channel in {}", guild.name),
            }
        }
        None
    }

    /// Check every `period` until the alert has been sent.
    pub async fn run(mut self, period: Duration) {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        while !self.fired {
            ticker.tick().await;
            self.check(Utc::now()).await;
        }
    }
}
