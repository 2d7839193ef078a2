use chrono::{DateTime, Datelike, Months, Utc};
use std::fmt;

use super::HalvingEstimate;

/// Which rendering the presence text uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusMode {
    /// `📅20-04-2024 📆`
    #[default]
    Date,
    /// `⏳10 days, 3 hours, 20 minutes ⌛`
    Countdown,
}

impl StatusMode {
    pub fn next(self) -> Self {
        match self {
            Self::Date => Self::Countdown,
            Self::Countdown => Self::Date,
        }
    }
}

/// Time left until a target, with years and months folded into days
/// (a year counts 365 days, a month 30).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Countdown {
    pub days: i64,
    pub hours: i64,
    pub minutes: i64,
}

impl Countdown {
    /// Calendar difference between `from` and `to`: whole months first, then
    /// whatever is left as days, hours and minutes. A target at or before
    /// `from` is a zero countdown.
    pub fn between(from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        if to <= from {
            return Self::default();
        }

        let mut months = (to.year() - from.year()) * 12 + to.month() as i32 - from.month() as i32;
        let mut anchor = add_months(from, months);
        while months > 0 && anchor.is_none_or(|a| a > to) {
            months -= 1;
            anchor = add_months(from, months);
        }
        let anchor = anchor.unwrap_or(from);

        let rest = to - anchor;
        let years = i64::from(months / 12);
        let months = i64::from(months % 12);
        Self {
            days: years * 365 + months * 30 + rest.num_days(),
            hours: rest.num_hours() % 24,
            minutes: rest.num_minutes() % 60,
        }
    }
}

fn add_months(from: DateTime<Utc>, months: i32) -> Option<DateTime<Utc>> {
    let months = u32::try_from(months).ok()?;
    from.checked_add_months(Months::new(months))
}

impl fmt::Display for Countdown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} days, {} hours, {} minutes",
            self.days, self.hours, self.minutes
        )
    }
}

/// Presence text for `estimate` in the given mode.
pub fn render_status(mode: StatusMode, estimate: &HalvingEstimate, now: DateTime<Utc>) -> String {
    match mode {
        StatusMode::Date => format!("📅{} 📆", estimate.eta.format("%d-%m-%Y")),
        StatusMode::Countdown => format!("⏳{} ⌛", Countdown::between(now, estimate.eta)),
    }
}
