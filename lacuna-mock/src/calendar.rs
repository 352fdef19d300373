use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, TimeDelta, Utc, Weekday};
use chrono_tz::Tz;
use lacuna_core::timeseries::grid::local_to_utc;
use lacuna_core::{DEFAULT_LOOKAHEAD_DAYS, ExchangeCalendar, Session};

/// One open segment of a trading day in exchange-local wall-clock time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    /// Local opening time.
    pub start: NaiveTime,
    /// Local closing time; `None` means midnight at the end of the day.
    pub end: Option<NaiveTime>,
}

impl Segment {
    /// Segment from `start` to `end` (both `HH:MM`).
    ///
    /// # Panics
    /// On malformed times; fixtures are static.
    #[must_use]
    pub fn new(start: &str, end: &str) -> Self {
        Self {
            start: hm(start),
            end: Some(hm(end)),
        }
    }

    /// Segment from `start` until the end of the day.
    #[must_use]
    pub fn until_midnight(start: &str) -> Self {
        Self {
            start: hm(start),
            end: None,
        }
    }

    /// The whole day.
    #[must_use]
    pub fn all_day() -> Self {
        Self::until_midnight("00:00")
    }
}

fn hm(s: &str) -> NaiveTime {
    NaiveTime::parse_from_str(s, "%H:%M").expect("HH:MM")
}

const WEEKDAYS: [Weekday; 5] = [Weekday::Mon, Weekday::Tue, Weekday::Wed, Weekday::Thu, Weekday::Fri];
const ALL_DAYS: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

/// Weekly exchange-hours table with per-date overrides.
///
/// Answers the `ExchangeCalendar` queries by walking per-day open segments,
/// converted to absolute instants through the exchange time zone and merged
/// where they touch. Searches stop after `lookahead_days`.
#[derive(Debug, Clone)]
pub struct SessionCalendar {
    tz: Tz,
    regular: [Vec<Segment>; 7],
    extended: [Vec<Segment>; 7],
    holidays: BTreeSet<NaiveDate>,
    early_closes: BTreeMap<NaiveDate, NaiveTime>,
    late_opens: BTreeMap<NaiveDate, NaiveTime>,
    lookahead_days: u32,
}

impl SessionCalendar {
    /// A calendar that is never open.
    #[must_use]
    pub fn new(tz: Tz) -> Self {
        Self {
            tz,
            regular: Default::default(),
            extended: Default::default(),
            holidays: BTreeSet::new(),
            early_closes: BTreeMap::new(),
            late_opens: BTreeMap::new(),
            lookahead_days: DEFAULT_LOOKAHEAD_DAYS,
        }
    }

    /// Add a regular-hours segment on each of `days`.
    #[must_use]
    pub fn with_regular(mut self, days: &[Weekday], segment: Segment) -> Self {
        for d in days {
            let slot = &mut self.regular[d.num_days_from_monday() as usize];
            slot.push(segment);
            slot.sort_by_key(|s| s.start);
        }
        self
    }

    /// Add an extended-hours segment on each of `days`.
    #[must_use]
    pub fn with_extended(mut self, days: &[Weekday], segment: Segment) -> Self {
        for d in days {
            let slot = &mut self.extended[d.num_days_from_monday() as usize];
            slot.push(segment);
            slot.sort_by_key(|s| s.start);
        }
        self
    }

    /// Close the market for the whole of `date`.
    #[must_use]
    pub fn with_holiday(mut self, date: NaiveDate) -> Self {
        self.holidays.insert(date);
        self
    }

    /// End regular trading on `date` at `close`.
    #[must_use]
    pub fn with_early_close(mut self, date: NaiveDate, close: NaiveTime) -> Self {
        self.early_closes.insert(date, close);
        self
    }

    /// Start regular trading on `date` at `open`.
    #[must_use]
    pub fn with_late_open(mut self, date: NaiveDate, open: NaiveTime) -> Self {
        self.late_opens.insert(date, open);
        self
    }

    /// Override the search horizon.
    #[must_use]
    pub const fn with_lookahead_days(mut self, days: u32) -> Self {
        self.lookahead_days = days;
        self
    }

    /// Every day, all day.
    #[must_use]
    pub fn always_open(tz: Tz) -> Self {
        Self::new(tz).with_regular(&ALL_DAYS, Segment::all_day())
    }

    /// Monday through Friday, all day.
    #[must_use]
    pub fn weekdays_always_open(tz: Tz) -> Self {
        Self::new(tz).with_regular(&WEEKDAYS, Segment::all_day())
    }

    /// Regular segments of `date` after holiday and override adjustments,
    /// as local `(start, end)` pairs.
    fn regular_segments(&self, date: NaiveDate) -> Vec<(NaiveTime, Option<NaiveTime>)> {
        if self.holidays.contains(&date) {
            return Vec::new();
        }
        let late = self.late_opens.get(&date).copied();
        let early = self.early_closes.get(&date).copied();
        self.regular[date.weekday().num_days_from_monday() as usize]
            .iter()
            .filter_map(|seg| {
                let start = late.map_or(seg.start, |l| l.max(seg.start));
                let end = match (seg.end, early) {
                    (Some(e), Some(c)) => Some(e.min(c)),
                    (None, Some(c)) => Some(c),
                    (e, None) => e,
                };
                match end {
                    Some(e) if e <= start => None,
                    _ => Some((start, end)),
                }
            })
            .collect()
    }

    fn to_instants(&self, date: NaiveDate, start: NaiveTime, end: Option<NaiveTime>) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        let s = local_to_utc(self.tz, date.and_time(start))?;
        let e = match end {
            Some(e) => local_to_utc(self.tz, date.and_time(e))?,
            None => local_to_utc(self.tz, date.succ_opt()?.and_hms_opt(0, 0, 0)?)?,
        };
        (e > s).then_some((s, e))
    }

    /// Open intervals of one local date, sorted by start.
    fn day_intervals(&self, date: NaiveDate, extended_hours: bool) -> Vec<(DateTime<Utc>, DateTime<Utc>)> {
        let mut out: Vec<_> = self
            .regular_segments(date)
            .into_iter()
            .filter_map(|(s, e)| self.to_instants(date, s, e))
            .collect();
        if extended_hours && !self.holidays.contains(&date) {
            out.extend(
                self.extended[date.weekday().num_days_from_monday() as usize]
                    .iter()
                    .filter_map(|seg| self.to_instants(date, seg.start, seg.end)),
            );
        }
        out.sort();
        out
    }

    fn local_date(&self, at: DateTime<Utc>) -> NaiveDate {
        at.with_timezone(&self.tz).date_naive()
    }

    /// Raw per-day intervals in order, from the day before `at` through the
    /// lookahead horizon.
    fn raw_from(&self, at: DateTime<Utc>, extended_hours: bool) -> impl Iterator<Item = (DateTime<Utc>, DateTime<Utc>)> + '_ {
        let first = self.local_date(at).pred_opt().unwrap_or(NaiveDate::MIN);
        let days = u64::from(self.lookahead_days) + 2;
        first
            .iter_days()
            .take(usize::try_from(days).unwrap_or(usize::MAX))
            .flat_map(move |d| self.day_intervals(d, extended_hours))
    }

    /// Merged open intervals from the day before `at` through the horizon.
    fn merged_from(&self, at: DateTime<Utc>, extended_hours: bool) -> Merged<impl Iterator<Item = (DateTime<Utc>, DateTime<Utc>)> + '_> {
        Merged {
            raw: self.raw_from(at, extended_hours),
            pending: None,
        }
    }

    fn horizon(&self, at: DateTime<Utc>) -> DateTime<Utc> {
        at + TimeDelta::days(i64::from(self.lookahead_days))
    }
}

struct Merged<I> {
    raw: I,
    pending: Option<(DateTime<Utc>, DateTime<Utc>)>,
}

impl<I: Iterator<Item = (DateTime<Utc>, DateTime<Utc>)>> Iterator for Merged<I> {
    type Item = (DateTime<Utc>, DateTime<Utc>);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match (self.raw.next(), self.pending) {
                (Some((s, e)), Some((ps, pe))) if s <= pe => self.pending = Some((ps, pe.max(e))),
                (Some(next), Some(done)) => {
                    self.pending = Some(next);
                    return Some(done);
                }
                (Some(next), None) => self.pending = Some(next),
                (None, pending) => {
                    self.pending = None;
                    return pending;
                }
            }
        }
    }
}

impl ExchangeCalendar for SessionCalendar {
    fn time_zone(&self) -> Tz {
        self.tz
    }

    fn lookahead_days(&self) -> u32 {
        self.lookahead_days
    }

    fn is_open(&self, at: DateTime<Utc>, extended_hours: bool) -> bool {
        let date = self.local_date(at);
        [date.pred_opt(), Some(date)]
            .into_iter()
            .flatten()
            .flat_map(|d| self.day_intervals(d, extended_hours))
            .any(|(s, e)| s <= at && at < e)
    }

    fn next_open(&self, after: DateTime<Utc>, extended_hours: bool) -> Option<DateTime<Utc>> {
        let horizon = self.horizon(after);
        self.merged_from(after, extended_hours)
            .map(|(s, _)| s)
            .take_while(|s| *s <= horizon)
            .find(|s| *s > after)
    }

    fn next_close(&self, after: DateTime<Utc>, extended_hours: bool) -> Option<DateTime<Utc>> {
        self.merged_from(after, extended_hours)
            .map(|(_, e)| e)
            .find(|e| *e > after)
    }

    fn next_session(&self, after: DateTime<Utc>) -> Option<Session> {
        let horizon = self.horizon(after);
        let first = self.local_date(after).pred_opt().unwrap_or(NaiveDate::MIN);
        first
            .iter_days()
            .take(usize::try_from(self.lookahead_days).unwrap_or(usize::MAX).saturating_add(2))
            .filter_map(|d| {
                let segs = self.regular_segments(d);
                let (open, _) = *segs.first()?;
                let (_, close) = *segs.last()?;
                let (open, close) = self.to_instants(d, open, close)?;
                Some(Session { open, close })
            })
            .take_while(|s| s.open <= horizon)
            .find(|s| s.open >= after)
    }

    fn is_open_during(&self, start: DateTime<Utc>, end: DateTime<Utc>, extended_hours: bool) -> bool {
        start < end
            && self
                .raw_from(start, extended_hours)
                .take_while(|(s, _)| *s < end)
                .any(|(_, e)| e > start)
    }

    fn is_open_for_entire(&self, start: DateTime<Utc>, end: DateTime<Utc>, extended_hours: bool) -> bool {
        if start >= end {
            return false;
        }
        let mut covered = start;
        for (s, e) in self.raw_from(start, extended_hours) {
            if s > covered {
                return false;
            }
            if e > covered {
                covered = e;
            }
            if covered >= end {
                return true;
            }
        }
        false
    }
}
