use chrono::Utc;
use log::{info, warn};
use std::sync::Arc;
use tokio::task::JoinHandle;

use crate::blockchain::{Backoff, BlockStore, ChainPoller, ChainSource};
use crate::bot::alert::AlertSettings;
use crate::bot::{AlertChannels, AlertDispatcher, AssetSource, StatusPresenter, StatusSink};
use crate::config::BotConfig;
use crate::halving::HalvingEstimate;

/// Handles to the three periodic tasks.
#[derive(Debug)]
pub struct Running {
    pub poller: JoinHandle<()>,
    pub status: JoinHandle<()>,
    pub alert: JoinHandle<()>,
}

/// Everything the periodic tasks share. Each task owns its own state
/// (presence mode, alert flag); nothing lives in globals.
pub struct Scheduler {
    config: Arc<BotConfig>,
    store: Arc<BlockStore>,
    source: Arc<dyn ChainSource>,
    assets: Arc<dyn AssetSource>,
}

impl Scheduler {
    pub fn new(
        config: Arc<BotConfig>,
        store: Arc<BlockStore>,
        source: Arc<dyn ChainSource>,
        assets: Arc<dyn AssetSource>,
    ) -> Self {
        Self {
            config,
            store,
            source,
            assets,
        }
    }

    fn poller(&self) -> ChainPoller {
        ChainPoller::new(self.source.clone(), self.store.clone(), self.config.store_window)
    }

    /// Backfill the store once, then spawn the poll, status and alert loops.
    pub async fn start(self, sink: Arc<dyn StatusSink>, channels: Arc<dyn AlertChannels>) -> Running {
        let poller = self.poller();
        if let Err(e) = poller.backfill().await {
            warn!("SCHED - initial backfill failed: {}", e);
        }

        let params = self.config.halving_params();
        if let Some(cold) = HalvingEstimate::cold(&self.store.load(), Utc::now(), &params) {
            info!(
                "SCHED - block #{}: {} blocks to the halving, about {}",
                cold.height,
                cold.blocks_remaining,
                cold.eta.format("%d-%m-%Y %H:%M UTC")
            );
        }

        let backoff = Backoff::new(self.config.fetch_interval(), self.config.poll_max_backoff);
        let presenter = StatusPresenter::new(self.store.clone(), sink, params);
        let dispatcher = AlertDispatcher::new(
            self.store.clone(),
            channels,
            self.assets.clone(),
            params,
            AlertSettings {
                threshold_secs: self.config.alert_threshold_secs,
                message: self.config.alert_message.clone(),
                image_url: self.config.alert_image_url.clone(),
            },
        );

        info!(
            "SCHED - polling every {}s, status every {}s, alert check every {}s",
            self.config.fetch_interval().as_secs(),
            self.config.status_interval.as_secs(),
            self.config.alert_interval.as_secs()
        );
        Running {
            poller: tokio::spawn(async move { poller.run(backoff).await }),
            status: tokio::spawn(presenter.run(self.config.status_interval)),
            alert: tokio::spawn(dispatcher.run(self.config.alert_interval)),
        }
    }
}
