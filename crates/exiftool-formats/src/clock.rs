//! Wall-clock and time-zone collaborators.
//!
//! The coordinator needs "now" and "the local UTC offset" to stamp dates and
//! convert them to the local ISO-8601 form callers expect. Both are
//! injected rather than read from the OS directly, so tests can pin a
//! fixed moment and zone instead of depending on whatever machine runs them.

use chrono::{FixedOffset, Local, Utc};

/// Supplies the current instant.
pub trait Clock: Send + Sync {
    /// Milliseconds since the Unix epoch.
    fn now_millis(&self) -> i64;
}

/// Supplies the UTC offset to localize a timestamp into.
pub trait ZoneProvider: Send + Sync {
    fn offset(&self) -> FixedOffset;
}

/// Reads the real system clock and the host's local time zone.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        Utc::now().timestamp_millis()
    }
}

impl ZoneProvider for SystemClock {
    fn offset(&self) -> FixedOffset {
        *Local::now().offset()
    }
}

/// Test double: a clock and zone pinned to fixed values, so date-conversion
/// assertions don't depend on the machine running them.
#[derive(Debug, Clone, Copy)]
pub struct FixedZoneClock {
    millis: i64,
    offset: FixedOffset,
}

impl FixedZoneClock {
    pub fn new(millis: i64, offset: FixedOffset) -> Self {
        Self { millis, offset }
    }

    /// `GMT+02:00`, the zone used by this engine's own test fixtures.
    pub fn gmt_plus_2(millis: i64) -> Self {
        Self::new(millis, FixedOffset::east_opt(2 * 3600).expect("valid offset"))
    }
}

impl Clock for FixedZoneClock {
    fn now_millis(&self) -> i64 {
        self.millis
    }
}

impl ZoneProvider for FixedZoneClock {
    fn offset(&self) -> FixedOffset {
        self.offset
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_clock_reports_pinned_millis() {
        let clock = FixedZoneClock::gmt_plus_2(1_689_173_325_401);
        assert_eq!(clock.now_millis(), 1_689_173_325_401);
    }

    #[test]
    fn gmt_plus_2_offset_is_two_hours_east() {
        let clock = FixedZoneClock::gmt_plus_2(0);
        assert_eq!(clock.offset().local_minus_utc(), 2 * 3600);
    }
}
