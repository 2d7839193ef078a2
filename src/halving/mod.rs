pub mod estimate;
pub mod render;

pub use estimate::{HalvingEstimate, average_block_time, blocks_remaining};
pub use render::{Countdown, StatusMode, render_status};

use chrono::TimeDelta;

/// Blocks between two halvings on Bitcoin.
pub const BLOCKS_PER_HALVING: u64 = 210_000;

/// Assumed seconds per block when the store cannot tell us.
pub const AVERAGE_BLOCK_TIME_SECS: i64 = 10 * 60;

/// Inputs to the halving projection that do not come from the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HalvingParams {
    pub blocks_per_halving: u64,
    pub fallback_block_time: TimeDelta,
}

impl Default for HalvingParams {
    fn default() -> Self {
        Self {
            blocks_per_halving: BLOCKS_PER_HALVING,
            fallback_block_time: TimeDelta::seconds(AVERAGE_BLOCK_TIME_SECS),
        }
    }
}
