//! Time-zone policy for the scan window.
//!
//! A single observer zone decides what "today" is, where local midnight
//! falls for both window bounds, and (in `filter`/`aggregate`) which hour a
//! culmination belongs to and how it is printed.

use chrono::{DateTime, Days, NaiveDate, NaiveTime, TimeDelta, TimeZone, Utc};
use pass_core::{InvalidInput, PredictionWindow};

const MINUTES_PER_DAY: i64 = 24 * 60;

/// Effective scan start: the current instant when `start_date` is the
/// observer's current local date, otherwise local midnight of that date.
pub fn resolve_start<Tz: TimeZone>(
    start_date: NaiveDate,
    now: DateTime<Utc>,
    zone: &Tz,
) -> Result<DateTime<Utc>, InvalidInput> {
    let today = now.with_timezone(zone).date_naive();
    if start_date == today {
        Ok(now)
    } else {
        local_midnight(start_date, zone, "start date")
    }
}

/// Window from `start` to local midnight `horizon_days` after start's local date.
pub fn prediction_window<Tz: TimeZone>(
    start: DateTime<Utc>,
    horizon_days: u32,
    zone: &Tz,
) -> Result<PredictionWindow, InvalidInput> {
    let start_date = start.with_timezone(zone).date_naive();
    let end_date = start_date
        .checked_add_days(Days::new(u64::from(horizon_days)))
        .ok_or_else(|| {
            InvalidInput::new("horizon", format!("{horizon_days} days overflows the calendar"))
        })?;
    Ok(PredictionWindow {
        start,
        end: local_midnight(end_date, zone, "horizon")?,
    })
}

/// First instant of `date` in `zone`. When a transition skips midnight this
/// is the first local minute of the day that exists. `field` names the
/// request input blamed if the zone has no such minute at all.
pub fn local_midnight<Tz: TimeZone>(
    date: NaiveDate,
    zone: &Tz,
    field: &'static str,
) -> Result<DateTime<Utc>, InvalidInput> {
    let midnight = date.and_time(NaiveTime::MIN);
    (0..MINUTES_PER_DAY)
        .find_map(|minute| {
            zone.from_local_datetime(&(midnight + TimeDelta::minutes(minute)))
                .earliest()
        })
        .map(|local| local.with_timezone(&Utc))
        .ok_or_else(|| {
            InvalidInput::new(
                field,
                format!("no local time on {date} exists in the observer zone"),
            )
        })
}
