//! Hub records and the due-time rule

use crate::model::ParseStatus;
use chrono::{DateTime, Duration, Utc};

/// A listing page that is re-scraped on a fixed interval
#[derive(Debug, Clone, PartialEq)]
pub struct Hub {
    pub id: i64,
    pub name: String,
    pub url: String,
    pub last_parsed: Option<DateTime<Utc>>,
    pub last_status: Option<ParseStatus>,
    pub parse_interval: Duration,
    pub is_active: bool,
}

impl Hub {
    /// Time at which the hub becomes due again
    ///
    /// `None` means the hub has never been parsed and is due immediately.
    /// An interval reaching past the representable calendar saturates, so
    /// a huge interval means the hub is never due again.
    pub fn next_due(&self) -> Option<DateTime<Utc>> {
        let last = self.last_parsed?;

        Some(last.checked_add_signed(self.parse_interval).unwrap_or_else(|| {
            tracing::warn!(
                hub = %self.name,
                interval_minutes = self.parse_interval.num_minutes(),
                "Parse interval overflows the calendar"
            );
            if self.parse_interval < Duration::zero() {
                DateTime::<Utc>::MIN_UTC
            } else {
                DateTime::<Utc>::MAX_UTC
            }
        }))
    }

    /// Returns true if the hub should be parsed at `now`
    ///
    /// A hub is due iff it is active and either has never been parsed or
    /// `now` has reached `last_parsed + parse_interval` (inclusive).
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        if !self.is_active {
            return false;
        }

        match self.next_due() {
            None => true,
            Some(next_due) => now >= next_due,
        }
    }
}
