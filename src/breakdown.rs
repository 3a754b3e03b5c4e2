//! Remaining-time breakdown calculation
//!
//! Pure functions mapping a target instant and "now" to the days, hours,
//! minutes and seconds left. Nothing here reads the clock; callers pass both
//! instants in.

use chrono::{DateTime, TimeZone};
use serde::{Deserialize, Serialize};

const SECONDS_PER_MINUTE: u64 = 60;
const SECONDS_PER_HOUR: u64 = 3_600;

/// Decomposed remaining time handed to rendering collaborators
///
/// `hours`, `minutes` and `seconds` are derived from `total_seconds`. `days`
/// is the local-calendar day difference to the target, so it is not always
/// `total_seconds / 86400`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Breakdown {
    pub days: u64,
    pub hours: u8,
    pub minutes: u8,
    pub seconds: u8,
    pub total_seconds: u64,
}

impl Breakdown {
    /// Nothing left
    pub const ZERO: Breakdown = Breakdown {
        days: 0,
        hours: 0,
        minutes: 0,
        seconds: 0,
        total_seconds: 0,
    };

    pub fn is_zero(&self) -> bool {
        self.total_seconds == 0
    }
}

/// Whole seconds from `now` until `target`, floored at zero
pub fn remaining_seconds<Tz: TimeZone>(target: &DateTime<Tz>, now: &DateTime<Tz>) -> u64 {
    let delta = target.clone().signed_duration_since(now.clone());
    delta.num_seconds().max(0) as u64
}

/// Number of whole days between the local wall-clock readings of `now` and
/// `target`.
///
/// Comparing local wall-clock times rather than absolute instants makes a
/// day across a DST change count as one day even though it lasts 23 or 25
/// hours.
pub fn calendar_days<Tz: TimeZone>(target: &DateTime<Tz>, now: &DateTime<Tz>) -> u64 {
    let local = target.naive_local() - now.naive_local();
    local.num_days().max(0) as u64
}

/// Breakdown of the time left between `now` and `target`
///
/// Returns [`Breakdown::ZERO`] once the target has been reached.
pub fn compute_breakdown<Tz: TimeZone>(target: &DateTime<Tz>, now: &DateTime<Tz>) -> Breakdown {
    breakdown_from_seconds(remaining_seconds(target, now), target, now)
}

/// Breakdown for a counter value on the tick path
///
/// Hours, minutes and seconds come from `total_seconds`; days are still the
/// calendar difference between `now` and `target`, so the result matches
/// what [`compute_breakdown`] would produce for the same inputs.
pub fn breakdown_from_seconds<Tz: TimeZone>(
    total_seconds: u64,
    target: &DateTime<Tz>,
    now: &DateTime<Tz>,
) -> Breakdown {
    if total_seconds == 0 {
        return Breakdown::ZERO;
    }

    Breakdown {
        days: calendar_days(target, now),
        hours: ((total_seconds / SECONDS_PER_HOUR) % 24) as u8,
        minutes: ((total_seconds / SECONDS_PER_MINUTE) % 60) as u8,
        seconds: (total_seconds % SECONDS_PER_MINUTE) as u8,
        total_seconds,
    }
}
