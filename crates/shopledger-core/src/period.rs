//! # Reporting Windows
//!
//! Time-window computation for the analytics reports.
//!
//! ## Two Windowing Policies
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  CALENDAR-ALIGNED (ReportPeriod)        TRAILING (trailing_days)    │
//! │                                                                     │
//! │  daily   = midnight today → now         now − N×86400s → now        │
//! │  weekly  = Monday 00:00  → now                                      │
//! │  monthly = 1st 00:00     → now                                      │
//! │                                                                     │
//! │  Used by: summary, top products,        Used by: the recent-sales   │
//! │  location/customer performance          "since" feed                │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The two policies are deliberately kept in separate constructors. A report
//! uses one policy, consistently; mixing them inside a single report is a
//! bug.
//!
//! All boundaries are half-open: `from <= t < to`. All arithmetic is UTC;
//! tenant-local calendars are a presentation concern.

use chrono::{DateTime, Datelike, Duration, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// Period
// =============================================================================

/// A report period selector as it arrives from the boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "period")]
pub enum ReportPeriod {
    /// Midnight today (UTC) to now.
    Daily,
    /// Monday 00:00 of the current week to now.
    Weekly,
    /// First of the current month 00:00 to now.
    Monthly,
    /// An explicit half-open range.
    Custom {
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    },
}

impl ReportPeriod {
    /// Resolves the period to a concrete window, anchored at `now`.
    ///
    /// Taking `now` as a parameter keeps this pure and lets tests pin the
    /// clock; callers pass `Utc::now()`.
    pub fn window_at(&self, now: DateTime<Utc>) -> Window {
        let today = now.date_naive();
        let from = match *self {
            ReportPeriod::Daily => today.and_time(NaiveTime::MIN).and_utc(),
            ReportPeriod::Weekly => {
                let monday = today - Duration::days(today.weekday().num_days_from_monday() as i64);
                monday.and_time(NaiveTime::MIN).and_utc()
            }
            ReportPeriod::Monthly => {
                let first = today.with_day(1).unwrap_or(today);
                first.and_time(NaiveTime::MIN).and_utc()
            }
            ReportPeriod::Custom { from, to } => return Window { from, to },
        };
        Window { from, to: now }
    }
}

// =============================================================================
// Window
// =============================================================================

/// A concrete half-open time window `[from, to)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Window {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

impl Window {
    /// Trailing window of `days × 86400` seconds ending at `now`.
    ///
    /// This is the OTHER windowing policy: not calendar-aligned. It backs
    /// the recent-sales feed and must not be substituted for a
    /// calendar-aligned report window (or vice versa).
    pub fn trailing_days(now: DateTime<Utc>, days: i64) -> Window {
        Window {
            from: now - Duration::days(days.max(0)),
            to: now,
        }
    }

    /// Checks whether an instant falls inside the window.
    #[inline]
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.from <= at && at < self.to
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
