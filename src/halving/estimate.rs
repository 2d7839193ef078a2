use chrono::{DateTime, TimeDelta, Utc};

use super::HalvingParams;
use crate::blockchain::BlockRecord;

/// Blocks left until the next multiple of `blocks_per_halving`.
///
/// A height sitting exactly on a boundary has a whole epoch ahead of it.
pub fn blocks_remaining(height: u64, blocks_per_halving: u64) -> u64 {
    let epoch = blocks_per_halving.max(1);
    epoch - (height % epoch)
}

/// Time between the last two records, or `fallback` with fewer than two
/// records or an unparseable timestamp. Not validated: out-of-order records
/// give a zero or negative value.
pub fn average_block_time(records: &[BlockRecord], fallback: TimeDelta) -> TimeDelta {
    let [.., prev, last] = records else {
        return fallback;
    };
    match (prev.parsed_time(), last.parsed_time()) {
        (Some(prev), Some(last)) => last - prev,
        _ => fallback,
    }
}

/// Projected time of the next halving, computed from the stored blocks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HalvingEstimate {
    pub height: u64,
    pub blocks_remaining: u64,
    pub average_block_time: TimeDelta,
    pub computed_at: DateTime<Utc>,
    pub eta: DateTime<Utc>,
}

impl HalvingEstimate {
    /// Estimate using the observed gap between the two newest records.
    /// `None` when there are no records.
    pub fn observed(
        records: &[BlockRecord],
        now: DateTime<Utc>,
        params: &HalvingParams,
    ) -> Option<Self> {
        let block_time = average_block_time(records, params.fallback_block_time);
        Self::project(records, now, params, block_time)
    }

    /// Estimate assuming the fixed fallback block time.
    pub fn cold(records: &[BlockRecord], now: DateTime<Utc>, params: &HalvingParams) -> Option<Self> {
        Self::project(records, now, params, params.fallback_block_time)
    }

    fn project(
        records: &[BlockRecord],
        now: DateTime<Utc>,
        params: &HalvingParams,
        block_time: TimeDelta,
    ) -> Option<Self> {
        let latest = records.last()?;
        let remaining = blocks_remaining(latest.height, params.blocks_per_halving);
        let millis = block_time
            .num_milliseconds()
            .checked_mul(i64::try_from(remaining).ok()?)?;
        let eta = now.checked_add_signed(TimeDelta::try_milliseconds(millis)?)?;
        Some(Self {
            height: latest.height,
            blocks_remaining: remaining,
            average_block_time: block_time,
            computed_at: now,
            eta,
        })
    }

    /// Seconds from `computed_at` to `eta`; negative if the estimate is in the past.
    pub fn remaining_seconds(&self) -> i64 {
        (self.eta - self.computed_at).num_seconds()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn params() -> HalvingParams {
        HalvingParams::default()
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 4, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn remaining_blocks_at_and_around_boundaries() {
        assert_eq!(blocks_remaining(209_999, 210_000), 1);
        assert_eq!(blocks_remaining(210_000, 210_000), 210_000);
        assert_eq!(blocks_remaining(0, 210_000), 210_000);
        assert_eq!(blocks_remaining(839_500, 210_000), 500);
    }

    #[test]
    fn average_uses_last_two_records() {
        let records = vec![
            BlockRecord::new(1, "2024-04-01T10:00:00Z"),
            BlockRecord::new(2, "2024-04-01T10:07:00Z"),
            BlockRecord::new(3, "2024-04-01T10:19:30Z"),
        ];
        let avg = average_block_time(&records, TimeDelta::minutes(10));
        assert_eq!(avg, TimeDelta::seconds(750));
        assert!(avg > TimeDelta::zero());
    }

    #[test]
    fn average_falls_back_with_one_record_or_bad_time() {
        let fallback = TimeDelta::minutes(10);
        assert_eq!(
            average_block_time(&[BlockRecord::new(1, "2024-04-01T10:00:00Z")], fallback),
            fallback
        );
        assert_eq!(average_block_time(&[], fallback), fallback);
        let bad = vec![
            BlockRecord::new(1, "2024-04-01T10:00:00Z"),
            BlockRecord::new(2, "not a time"),
        ];
        assert_eq!(average_block_time(&bad, fallback), fallback);
    }

    #[test]
    fn out_of_order_records_give_non_positive_average() {
        let records = vec![
            BlockRecord::new(2, "2024-04-01T10:10:00Z"),
            BlockRecord::new(3, "2024-04-01T10:05:00Z"),
        ];
        let avg = average_block_time(&records, TimeDelta::minutes(10));
        assert_eq!(avg, TimeDelta::minutes(-5));

        let est = HalvingEstimate::observed(&records, now(), &params()).unwrap();
        assert!(est.eta < now());
        assert!(est.remaining_seconds() < 0);
    }

    #[test]
    fn empty_store_has_no_estimate() {
        assert_eq!(HalvingEstimate::observed(&[], now(), &params()), None);
        assert_eq!(HalvingEstimate::cold(&[], now(), &params()), None);
    }

    #[test]
    fn observed_estimate_projects_linearly() {
        let records = vec![
            BlockRecord::new(839_998, "2024-04-01T11:50:00Z"),
            BlockRecord::new(839_999, "2024-04-01T11:58:00Z"),
        ];
        let est = HalvingEstimate::observed(&records, now(), &params()).unwrap();
        assert_eq!(est.height, 839_999);
        assert_eq!(est.blocks_remaining, 1);
        assert_eq!(est.average_block_time, TimeDelta::minutes(8));
        assert_eq!(est.eta, now() + TimeDelta::minutes(8));
        assert_eq!(est.remaining_seconds(), 480);
    }

    #[test]
    fn cold_estimate_ignores_observed_gap() {
        let records = vec![
            BlockRecord::new(839_998, "2024-04-01T11:50:00Z"),
            BlockRecord::new(839_999, "2024-04-01T11:58:00Z"),
        ];
        let est = HalvingEstimate::cold(&records, now(), &params()).unwrap();
        assert_eq!(est.average_block_time, TimeDelta::minutes(10));
        assert_eq!(est.eta, now() + TimeDelta::minutes(10));
    }
}
