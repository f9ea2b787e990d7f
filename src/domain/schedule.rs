//! Watering schedule calculator.
//!
//! A plant's `next_watering_at` is a cached projection of a reference time
//! plus the watering frequency. Recording a watering uses that watering's
//! event time. Deleting a watering or changing the frequency goes through
//! [`recompute_due`], which falls back to now when no watering is left.

use chrono::{DateTime, Days, Local, TimeZone, Utc};

/// Largest accepted watering frequency.
pub const MAX_FREQUENCY_DAYS: u32 = 365;

/// Adds `frequency_days` calendar days to `reference`, keeping the wall-clock
/// time in the reference's time zone.
///
/// When the resulting local time falls into a DST gap or overlap the fixed
/// 24h-per-day duration is used instead, so the result always exists.
/// A frequency of zero is treated as one day.
///
/// ```rust
/// use chrono::{TimeZone, Utc};
/// use plantcare::domain::next_watering_in;
///
/// let t = Utc.with_ymd_and_hms(2024, 1, 30, 8, 0, 0).unwrap();
/// assert_eq!(
///     next_watering_in(&t, 3),
///     Utc.with_ymd_and_hms(2024, 2, 2, 8, 0, 0).unwrap()
/// );
/// ```
#[must_use]
pub fn next_watering_in<Tz: TimeZone>(reference: &DateTime<Tz>, frequency_days: u32) -> DateTime<Tz> {
    let days = frequency_days.max(1);

    reference
        .clone()
        .checked_add_days(Days::new(u64::from(days)))
        .unwrap_or_else(|| reference.clone() + chrono::Duration::days(i64::from(days)))
}

/// Calendar-day arithmetic in the server's local time zone, returned as UTC.
#[must_use]
pub fn next_watering(reference: DateTime<Utc>, frequency_days: u32) -> DateTime<Utc> {
    let local = reference.with_timezone(&Local);
    next_watering_in(&local, frequency_days).with_timezone(&Utc)
}

/// Due-time from the latest watering if there is one, otherwise from `now`.
#[must_use]
pub fn recompute_due(
    latest_watering: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    frequency_days: u32,
) -> DateTime<Utc> {
    next_watering(latest_watering.unwrap_or(now), frequency_days)
}

/// Converts a stored frequency column to the calculator's input.
#[must_use]
pub fn frequency_from_db(days: i32) -> u32 {
    u32::try_from(days).unwrap_or(1).max(1)
}
