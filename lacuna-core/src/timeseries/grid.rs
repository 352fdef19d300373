use chrono::offset::{LocalResult, Offset};
use chrono::{DateTime, NaiveDateTime, TimeDelta, TimeZone, Timelike, Utc};
use chrono_tz::Tz;

use crate::Resolution;

// DST gaps are at most a couple of hours; probe a little beyond that.
const GAP_PROBE_MINUTES: i64 = 180;

/// Resolve a wall-clock time in `tz` to an absolute instant.
///
/// Ambiguous times (fall back) resolve to the earlier instant. Times inside
/// a spring-forward gap resolve to the first valid wall-clock minute after
/// the gap.
#[must_use]
pub fn local_to_utc(tz: Tz, naive: NaiveDateTime) -> Option<DateTime<Utc>> {
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) | LocalResult::Ambiguous(dt, _) => Some(dt.with_timezone(&Utc)),
        LocalResult::None => (1..=GAP_PROBE_MINUTES).find_map(|m| {
            tz.from_local_datetime(&(naive + TimeDelta::minutes(m)))
                .earliest()
                .map(|dt| dt.with_timezone(&Utc))
        }),
    }
}

fn local_midnight(tz: Tz, date: chrono::NaiveDate) -> Option<DateTime<Utc>> {
    local_to_utc(tz, date.and_hms_opt(0, 0, 0)?)
}

fn floor_sub_daily(t: DateTime<Utc>, step: i64, tz: Tz) -> Option<DateTime<Utc>> {
    let local = t.with_timezone(&tz);
    let seconds_since_midnight = i64::from(local.num_seconds_from_midnight());
    let bucket_sec = seconds_since_midnight - seconds_since_midnight.rem_euclid(step);
    let naive = local.date_naive().and_hms_opt(0, 0, 0)? + TimeDelta::seconds(bucket_sec);
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => Some(dt.with_timezone(&Utc)),
        LocalResult::Ambiguous(dt1, dt2) => {
            // Keep the side of the overlap `t` itself is on, so the repeated
            // wall-clock hour maps to two distinct boundaries.
            let local_offset = local.offset().fix().local_minus_utc();
            if dt1.offset().fix().local_minus_utc() == local_offset {
                Some(dt1.with_timezone(&Utc))
            } else {
                Some(dt2.with_timezone(&Utc))
            }
        }
        LocalResult::None => {
            let ts = t.timestamp();
            DateTime::from_timestamp(ts - ts.rem_euclid(step), 0)
        }
    }
}

/// Latest grid boundary of `resolution` at or before `t`, aligned in `tz`.
///
/// Daily boundaries are local midnights; sub-daily boundaries are multiples
/// of the span counted from local midnight. Ticks have no grid and return
/// `t` unchanged.
#[must_use]
pub fn floor_to_boundary(t: DateTime<Utc>, resolution: Resolution, tz: Tz) -> Option<DateTime<Utc>> {
    match resolution {
        Resolution::Tick => Some(t),
        Resolution::Daily => {
            let date = t.with_timezone(&tz).date_naive();
            let midnight = local_midnight(tz, date)?;
            // a missing midnight resolves forward and may land after `t`
            if midnight <= t {
                Some(midnight)
            } else {
                local_midnight(tz, date.pred_opt()?)
            }
        }
        Resolution::Second | Resolution::Minute | Resolution::Hour => {
            let step = resolution.span()?.num_seconds();
            floor_sub_daily(t, step, tz)
        }
    }
}

/// Earliest grid boundary of `resolution` strictly after `t`.
///
/// Arithmetic runs on absolute instants and is re-aligned to the local grid
/// afterwards, so a spring-forward day loses no hour and a fall-back day
/// yields no duplicate boundary. Returns `None` for ticks.
#[must_use]
pub fn next_boundary(t: DateTime<Utc>, resolution: Resolution, tz: Tz) -> Option<DateTime<Utc>> {
    match resolution {
        Resolution::Tick => None,
        Resolution::Daily => {
            let mut date = t.with_timezone(&tz).date_naive();
            // two days suffice even when today's midnight was skipped
            for _ in 0..2 {
                date = date.succ_opt()?;
                let midnight = local_midnight(tz, date)?;
                if midnight > t {
                    return Some(midnight);
                }
            }
            None
        }
        Resolution::Second | Resolution::Minute | Resolution::Hour => {
            let span = resolution.span()?;
            let candidate = t.checked_add_signed(span)?;
            let floored = floor_to_boundary(candidate, resolution, tz)?;
            if floored > t {
                Some(floored)
            } else {
                Some(candidate)
            }
        }
    }
}

/// Latest grid boundary strictly before `t`.
#[must_use]
pub fn previous_boundary(t: DateTime<Utc>, resolution: Resolution, tz: Tz) -> Option<DateTime<Utc>> {
    let just_before = t.checked_sub_signed(TimeDelta::nanoseconds(1))?;
    floor_to_boundary(just_before, resolution, tz)
}

/// `t` if it lies on the grid, otherwise the next boundary after it.
#[must_use]
pub fn ceil_to_boundary(t: DateTime<Utc>, resolution: Resolution, tz: Tz) -> Option<DateTime<Utc>> {
    let floored = floor_to_boundary(t, resolution, tz)?;
    if floored == t {
        Some(t)
    } else {
        next_boundary(t, resolution, tz)
    }
}
