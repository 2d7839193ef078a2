use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;

use crate::blockchain::{BlockRecord, BlockStore};
use crate::halving::HalvingParams;

/// Read-only view of the bot's data for the status API.
pub struct AppState {
    pub store: Arc<BlockStore>,
    pub params: HalvingParams,
}

#[derive(Serialize)]
pub struct HalvingResponse {
    pub height: u64,
    pub blocks_remaining: u64,
    pub average_block_time_secs: i64,
    pub halving_date: DateTime<Utc>,
    pub remaining_secs: i64,
    pub countdown: String,
}

#[derive(Serialize)]
pub struct BlocksResponse {
    pub length: usize,
    pub blocks: Vec<BlockRecord>,
}
