use chrono::{DateTime, Utc};
use log::info;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{MissedTickBehavior, interval};

use super::StatusSink;
use crate::blockchain::BlockStore;
use crate::halving::{HalvingEstimate, HalvingParams, StatusMode, render_status};

/// Pushes the halving estimate to the bot's presence, alternating between
/// the date and a countdown on every successful update.
pub struct StatusPresenter {
    store: Arc<BlockStore>,
    sink: Arc<dyn StatusSink>,
    params: HalvingParams,
    mode: StatusMode,
}

impl StatusPresenter {
    pub fn new(store: Arc<BlockStore>, sink: Arc<dyn StatusSink>, params: HalvingParams) -> Self {
        Self {
            store,
            sink,
            params,
            mode: StatusMode::default(),
        }
    }

    /// Mode the next update will render.
    pub fn mode(&self) -> StatusMode {
        self.mode
    }

    /// Recompute and push the status. Returns the text pushed, or `None`
    /// when the store has no blocks.
    pub fn update(&mut self, now: DateTime<Utc>) -> Option<String> {
        let records = self.store.load();
        let Some(estimate) = HalvingEstimate::observed(&records, now, &self.params) else {
            info!("STATUS - no block data available to estimate the halving");
            return None;
        };
        let text = render_status(self.mode, &estimate, now);
        self.sink.set_status(&text);
        info!("STATUS - presence set to {:?}", text);
        self.mode = self.mode.next();
        Some(text)
    }

    pub async fn run(mut self, period: Duration) {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            self.update(Utc::now());
        }
    }
}
