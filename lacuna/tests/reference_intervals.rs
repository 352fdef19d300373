use chrono::{DateTime, TimeDelta, Utc};
use chrono_tz::America::New_York;
use chrono_tz::Tz;
use lacuna::{
    ExchangeCalendar, FillForwardResolution, FillStep, LacunaError, MarketContext, ReferenceIntervals, Resolution,
    reference_intervals,
};
use lacuna_mock::SessionCalendar;
use lacuna_mock::fixtures::calendars::us_equity;
use lacuna_mock::fixtures::{local, utc};

fn ny(s: &str) -> DateTime<Utc> {
    local(New_York, s)
}

fn ny_ctx() -> MarketContext {
    MarketContext::new(New_York, New_York)
}

fn steps(
    cal: &dyn ExchangeCalendar,
    prev: DateTime<Utc>,
    next: DateTime<Utc>,
    data: Resolution,
    cadence: Resolution,
    ctx: MarketContext,
) -> Vec<FillStep> {
    reference_intervals(cal, prev, next, data, FillForwardResolution::new(cadence), ctx)
        .collect::<Result<_, _>>()
        .unwrap()
}

#[test]
fn empty_when_previous_end_is_not_before_next() {
    let cal = us_equity();
    let t = ny("2024-01-02 10:00");
    assert!(steps(&cal, t, t, Resolution::Minute, Resolution::Minute, ny_ctx()).is_empty());
    assert!(steps(&cal, t, t - TimeDelta::minutes(5), Resolution::Minute, Resolution::Minute, ny_ctx()).is_empty());
}

#[test]
fn hourly_steps_across_spring_forward_skip_no_hour() {
    let cal = SessionCalendar::always_open(New_York);
    // 00:00 EST to 05:00 EDT is four absolute hours; 02:00 local never exists
    let out = steps(
        &cal,
        utc("2024-03-10T05:00:00Z"),
        utc("2024-03-10T09:00:00Z"),
        Resolution::Hour,
        Resolution::Hour,
        ny_ctx(),
    );
    let ends: Vec<_> = out.iter().map(|s| s.end).collect();
    assert_eq!(
        ends,
        vec![
            utc("2024-03-10T06:00:00Z"),
            utc("2024-03-10T07:00:00Z"),
            utc("2024-03-10T08:00:00Z"),
        ]
    );
    assert!(out.iter().all(|s| s.end - s.start == TimeDelta::hours(1)));
}

#[test]
fn hourly_steps_across_fall_back_visit_the_repeated_hour_once_each() {
    let cal = SessionCalendar::always_open(New_York);
    let out = steps(
        &cal,
        utc("2024-11-03T04:00:00Z"),
        utc("2024-11-03T08:00:00Z"),
        Resolution::Hour,
        Resolution::Hour,
        ny_ctx(),
    );
    let ends: Vec<_> = out.iter().map(|s| s.end).collect();
    // 01:00 EDT, 01:00 EST, 02:00 EST
    assert_eq!(
        ends,
        vec![
            utc("2024-11-03T05:00:00Z"),
            utc("2024-11-03T06:00:00Z"),
            utc("2024-11-03T07:00:00Z"),
        ]
    );
}

#[test]
fn daily_steps_follow_local_midnight_across_dst() {
    let cal = SessionCalendar::always_open(New_York);
    let out = steps(
        &cal,
        ny("2024-03-09 00:00"),
        ny("2024-03-12 00:00"),
        Resolution::Daily,
        Resolution::Daily,
        ny_ctx(),
    );
    assert_eq!(out.len(), 2);
    assert_eq!(out[0].end, ny("2024-03-10 00:00"));
    assert_eq!(out[1].start, ny("2024-03-10 00:00"));
    assert_eq!(out[1].end, ny("2024-03-11 00:00"));
    // the spring-forward day is 23 hours long
    assert_eq!(out[1].end - out[1].start, TimeDelta::hours(23));
}

#[test]
fn daily_bars_align_to_the_data_time_zone() {
    let cal = SessionCalendar::always_open(New_York);
    let ctx = MarketContext::new(New_York, Tz::UTC);
    let out = steps(
        &cal,
        utc("2024-01-02T00:00:00Z"),
        utc("2024-01-04T00:00:00Z"),
        Resolution::Daily,
        Resolution::Daily,
        ctx,
    );
    assert_eq!(out, vec![FillStep {
        start: utc("2024-01-02T00:00:00Z"),
        end: utc("2024-01-03T00:00:00Z"),
    }]);
}

#[test]
fn coarse_cadence_realigns_after_the_close() {
    let cal = us_equity();
    let out = steps(
        &cal,
        ny("2024-01-02 15:30"),
        ny("2024-01-03 11:01"),
        Resolution::Minute,
        Resolution::Hour,
        ny_ctx(),
    );
    let ends: Vec<_> = out.iter().map(|s| s.end).collect();
    assert_eq!(
        ends,
        vec![
            ny("2024-01-02 16:00"),
            // first minute after the open, then back on the hourly grid
            ny("2024-01-03 09:31"),
            ny("2024-01-03 10:00"),
            ny("2024-01-03 11:00"),
        ]
    );
    // bars keep the data resolution's width
    assert!(out.iter().all(|s| s.end - s.start == TimeDelta::minutes(1)));
}

#[test]
fn fine_cadence_subdivides_a_coarse_gap() {
    let cal = us_equity();
    let out = steps(
        &cal,
        ny("2024-01-02 10:00"),
        ny("2024-01-02 12:00"),
        Resolution::Hour,
        Resolution::Minute,
        ny_ctx(),
    );
    // 10:01 through 11:59
    assert_eq!(out.len(), 119);
    assert!(out.iter().all(|s| s.end - s.start == TimeDelta::minutes(1)));
}

#[test]
fn strict_sessions_clip_to_the_calendar() {
    let cal = us_equity();
    let ctx = ny_ctx().with_strict_daily_sessions(true);
    let out = steps(
        &cal,
        ny("2024-07-02 16:00"),
        ny("2024-07-08 16:00"),
        Resolution::Daily,
        Resolution::Daily,
        ctx,
    );
    let spans: Vec<_> = out.iter().map(|s| (s.start, s.end)).collect();
    assert_eq!(
        spans,
        vec![
            (ny("2024-07-03 09:30"), ny("2024-07-03 13:00")),
            (ny("2024-07-05 09:30"), ny("2024-07-05 16:00")),
        ]
    );
}

#[test]
fn through_bound_is_inclusive() {
    let cal = us_equity();
    let mut ri = ReferenceIntervals::through(
        ny("2024-01-02 09:31"),
        ny("2024-01-02 09:33"),
        Resolution::Minute,
        FillForwardResolution::new(Resolution::Minute),
        ny_ctx(),
    );
    let peeked = ri.peek_step(&cal).unwrap();
    assert_eq!(ri.cursor(), ny("2024-01-02 09:31"));
    assert_eq!(ri.next_step(&cal).unwrap(), peeked);
    assert_eq!(ri.next_step(&cal).unwrap().map(|s| s.end), Some(ny("2024-01-02 09:33")));
    assert_eq!(ri.next_step(&cal).unwrap(), None);
    assert_eq!(ri.cursor(), ny("2024-01-02 09:33"));
}

#[test]
fn tick_cadence_produces_nothing() {
    let cal = us_equity();
    let out = steps(
        &cal,
        ny("2024-01-02 10:00"),
        ny("2024-01-02 10:05"),
        Resolution::Minute,
        Resolution::Tick,
        ny_ctx(),
    );
    assert!(out.is_empty());
}

#[test]
fn exhausted_calendar_yields_one_error() {
    let cal = SessionCalendar::new(Tz::UTC).with_lookahead_days(3);
    let ctx = MarketContext::new(Tz::UTC, Tz::UTC);
    let mut it = reference_intervals(
        &cal,
        utc("2024-01-02T10:00:00Z"),
        utc("2024-01-09T10:00:00Z"),
        Resolution::Minute,
        FillForwardResolution::new(Resolution::Minute),
        ctx,
    );
    assert!(matches!(it.next(), Some(Err(LacunaError::CalendarExhausted { .. }))));
    assert!(it.next().is_none());
}
