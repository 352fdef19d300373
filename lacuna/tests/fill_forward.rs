use std::sync::Arc;

use chrono::{DateTime, Utc};
use chrono_tz::America::New_York;
use chrono_tz::Tz;
use lacuna::{
    DataPoint, DelistingKind, EnumeratorState, FillForward, FillForwardBuilder, FillForwardResolution,
    LacunaError, Payload, Resolution,
};
use lacuna_mock::SessionCalendar;
use lacuna_mock::fixtures::bars::{delisting, dividend, quote_bar, symbol_changed, trade_bar};
use lacuna_mock::fixtures::calendars::us_equity;
use lacuna_mock::fixtures::local;
use rust_decimal::Decimal;

fn ny(s: &str) -> DateTime<Utc> {
    local(New_York, s)
}

fn minute_bar(start: &str, end: &str, close: i64) -> DataPoint {
    trade_bar("SPY", ny(start), ny(end), Decimal::from(close), 100)
}

fn replay<I>(res: Resolution, bars: I) -> Vec<DataPoint>
where
    I: IntoIterator<Item = DataPoint>,
{
    FillForwardBuilder::new(res)
        .calendar(Arc::new(us_equity()))
        .build_bounded(bars)
        .unwrap()
        .collect::<Result<Vec<_>, _>>()
        .unwrap()
}

fn ends(points: &[DataPoint]) -> Vec<DateTime<Utc>> {
    points.iter().map(|p| p.end_time).collect()
}

fn volume(p: &DataPoint) -> Decimal {
    match &p.payload {
        Payload::Trade(bar) => bar.volume,
        other => panic!("expected trade bar, got {other:?}"),
    }
}

#[test]
fn daily_gap_on_weekday_calendar_fills_each_missing_day() {
    let cal = SessionCalendar::weekdays_always_open(New_York);
    let mon = trade_bar("SPY", ny("2025-01-06 00:00"), ny("2025-01-07 00:00"), Decimal::from(470), 5_000);
    let sat = trade_bar("SPY", ny("2025-01-11 00:00"), ny("2025-01-12 00:00"), Decimal::from(480), 5_000);

    let out: Vec<_> = FillForwardBuilder::new(Resolution::Daily)
        .calendar(Arc::new(cal))
        .build_bounded(vec![mon.clone(), sat.clone()])
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();

    assert_eq!(out.len(), 6);
    assert_eq!(out[0], mon);
    assert_eq!(out[5], sat);
    let fills = &out[1..5];
    assert_eq!(
        ends(fills),
        vec![
            ny("2025-01-08 00:00"),
            ny("2025-01-09 00:00"),
            ny("2025-01-10 00:00"),
            ny("2025-01-11 00:00"),
        ]
    );
    for f in fills {
        assert!(f.is_fill_forward);
        assert_eq!(f.value, Decimal::from(470));
        assert_eq!(volume(f), Decimal::ZERO);
        assert_eq!(f.period(), chrono::TimeDelta::days(1));
    }
}

#[test]
fn one_missing_minute_yields_exactly_one_fill() {
    let out = replay(
        Resolution::Minute,
        vec![
            minute_bar("2024-01-02 09:30", "2024-01-02 09:31", 470),
            minute_bar("2024-01-02 09:32", "2024-01-02 09:33", 471),
        ],
    );
    assert_eq!(out.len(), 3);
    let fill = &out[1];
    assert!(fill.is_fill_forward);
    assert_eq!(fill.time, ny("2024-01-02 09:31"));
    assert_eq!(fill.end_time, ny("2024-01-02 09:32"));
    assert_eq!(fill.value, Decimal::from(470));
    assert_eq!(volume(fill), Decimal::ZERO);
    assert!(!out[2].is_fill_forward);
}

#[test]
fn adjacent_bars_need_no_fill() {
    let out = replay(
        Resolution::Minute,
        vec![
            minute_bar("2024-01-02 09:30", "2024-01-02 09:31", 1),
            minute_bar("2024-01-02 09:31", "2024-01-02 09:32", 2),
        ],
    );
    assert!(out.iter().all(|p| !p.is_fill_forward));
}

#[test]
fn overnight_gap_resumes_at_the_open() {
    let out = replay(
        Resolution::Minute,
        vec![
            minute_bar("2024-01-02 15:59", "2024-01-02 16:00", 10),
            minute_bar("2024-01-03 09:31", "2024-01-03 09:32", 11),
        ],
    );
    assert_eq!(out.len(), 3);
    assert_eq!(out[1].time, ny("2024-01-03 09:30"));
    assert_eq!(out[1].end_time, ny("2024-01-03 09:31"));
}

#[test]
fn extended_hours_fill_after_the_regular_close() {
    let out: Vec<_> = FillForwardBuilder::new(Resolution::Minute)
        .calendar(Arc::new(us_equity()))
        .extended_market_hours(true)
        .build_bounded(vec![
            minute_bar("2024-01-02 15:59", "2024-01-02 16:00", 10),
            minute_bar("2024-01-02 16:03", "2024-01-02 16:04", 11),
        ])
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(
        ends(&out),
        vec![
            ny("2024-01-02 16:00"),
            ny("2024-01-02 16:01"),
            ny("2024-01-02 16:02"),
            ny("2024-01-02 16:03"),
            ny("2024-01-02 16:04"),
        ]
    );
}

#[test]
fn daily_fill_skips_holiday_and_weekend() {
    let out = replay(
        Resolution::Daily,
        vec![
            trade_bar("SPY", ny("2024-11-27 00:00"), ny("2024-11-28 00:00"), Decimal::from(600), 1),
            trade_bar("SPY", ny("2024-12-02 00:00"), ny("2024-12-03 00:00"), Decimal::from(601), 1),
        ],
    );
    // Thanksgiving is closed; the early-close Friday still trades
    assert_eq!(out.len(), 3);
    assert_eq!(out[1].time, ny("2024-11-29 00:00"));
    assert_eq!(out[1].end_time, ny("2024-11-30 00:00"));
}

#[test]
fn strict_daily_fills_span_each_session() {
    let out: Vec<_> = FillForwardBuilder::new(Resolution::Daily)
        .calendar(Arc::new(us_equity()))
        .strict_daily_sessions(true)
        .build_bounded(vec![
            trade_bar("SPY", ny("2024-11-26 09:30"), ny("2024-11-26 16:00"), Decimal::from(600), 1),
            trade_bar("SPY", ny("2024-12-02 09:30"), ny("2024-12-02 16:00"), Decimal::from(601), 1),
        ])
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();

    assert_eq!(out.len(), 4);
    assert_eq!((out[1].time, out[1].end_time), (ny("2024-11-27 09:30"), ny("2024-11-27 16:00")));
    // early close
    assert_eq!((out[2].time, out[2].end_time), (ny("2024-11-29 09:30"), ny("2024-11-29 13:00")));
    assert!(out[1].is_fill_forward && out[2].is_fill_forward);
}

#[test]
fn final_delisting_ends_the_stream() {
    let mut ff = FillForwardBuilder::new(Resolution::Minute)
        .calendar(Arc::new(us_equity()))
        .subscription_end(ny("2024-01-02 16:00"))
        .build_bounded(vec![
            minute_bar("2024-01-02 09:30", "2024-01-02 09:31", 5),
            delisting("SPY", ny("2024-01-02 09:31"), DelistingKind::Delisted),
            minute_bar("2024-01-02 09:35", "2024-01-02 09:36", 6),
        ])
        .unwrap();

    assert!(!ff.next().unwrap().unwrap().is_fill_forward);
    let last = ff.next().unwrap().unwrap();
    assert!(last.is_terminal());
    assert_eq!(ff.state(), EnumeratorState::Exhausted);
    assert!(ff.next().is_none());
    assert!(ff.next().is_none());
}

#[test]
fn delisting_warning_and_rename_do_not_interrupt_synthesis() {
    let out = replay(
        Resolution::Minute,
        vec![
            minute_bar("2024-01-02 09:30", "2024-01-02 09:31", 5),
            delisting("SPY", ny("2024-01-02 09:31"), DelistingKind::Warning),
            symbol_changed("SPY", ny("2024-01-02 09:33"), "SPYX"),
            minute_bar("2024-01-02 09:35", "2024-01-02 09:36", 6),
        ],
    );

    let kinds: Vec<_> = out
        .iter()
        .map(|p| match (&p.payload, p.is_fill_forward) {
            (Payload::Auxiliary(_), _) => "aux",
            (_, true) => "fill",
            (_, false) => "real",
        })
        .collect();
    assert_eq!(kinds, vec!["real", "aux", "fill", "fill", "aux", "fill", "fill", "real"]);
    assert_eq!(
        ends(&out),
        vec![
            ny("2024-01-02 09:31"),
            ny("2024-01-02 09:31"),
            ny("2024-01-02 09:32"),
            ny("2024-01-02 09:33"),
            ny("2024-01-02 09:33"),
            ny("2024-01-02 09:34"),
            ny("2024-01-02 09:35"),
            ny("2024-01-02 09:36"),
        ]
    );
    // auxiliary events never become the price baseline
    assert!(out.iter().filter(|p| p.is_fill_forward).all(|p| p.value == Decimal::from(5)));
}

#[test]
fn events_before_the_first_bar_pass_through() {
    let div = dividend("SPY", ny("2024-01-02 09:00"), Decimal::new(5, 1));
    let out = replay(
        Resolution::Minute,
        vec![div.clone(), minute_bar("2024-01-02 09:30", "2024-01-02 09:31", 5)],
    );
    assert_eq!(out.len(), 2);
    assert_eq!(out[0], div);
}

#[test]
fn subscription_end_fills_the_tail_and_drops_later_points() {
    let mut ff = FillForwardBuilder::new(Resolution::Minute)
        .calendar(Arc::new(us_equity()))
        .subscription_end(ny("2024-01-02 09:34"))
        .build_bounded(vec![
            minute_bar("2024-01-02 09:30", "2024-01-02 09:31", 5),
            minute_bar("2024-01-02 09:39", "2024-01-02 09:40", 6),
        ])
        .unwrap();
    let out: Vec<_> = ff.by_ref().collect::<Result<_, _>>().unwrap();

    assert_eq!(
        ends(&out),
        vec![
            ny("2024-01-02 09:31"),
            ny("2024-01-02 09:32"),
            ny("2024-01-02 09:33"),
            ny("2024-01-02 09:34"),
        ]
    );
    assert!(out[1..].iter().all(|p| p.is_fill_forward));
    assert_eq!(ff.state(), EnumeratorState::Exhausted);
}

#[test]
fn without_subscription_end_the_stream_stops_with_its_input() {
    let out = replay(Resolution::Minute, vec![minute_bar("2024-01-02 09:30", "2024-01-02 09:31", 5)]);
    assert_eq!(out.len(), 1);
}

#[test]
fn cadence_change_takes_effect_on_the_next_step() {
    let cadence = FillForwardResolution::new(Resolution::Minute);
    let mut ff = FillForwardBuilder::new(Resolution::Minute)
        .calendar(Arc::new(us_equity()))
        .fill_forward(cadence.clone())
        .build_bounded(vec![
            minute_bar("2024-01-02 09:30", "2024-01-02 09:31", 5),
            minute_bar("2024-01-02 10:30", "2024-01-02 10:31", 6),
        ])
        .unwrap();

    let mut next_end = || ff.next().unwrap().unwrap().end_time;
    assert_eq!(next_end(), ny("2024-01-02 09:31"));
    assert_eq!(next_end(), ny("2024-01-02 09:32"));
    assert_eq!(next_end(), ny("2024-01-02 09:33"));
    cadence.set(Resolution::Hour);
    assert_eq!(next_end(), ny("2024-01-02 10:00"));
    assert_eq!(next_end(), ny("2024-01-02 10:31"));
}

#[test]
fn calendar_that_never_opens_surfaces_one_error() {
    let cal = SessionCalendar::new(Tz::UTC).with_lookahead_days(5);
    let mut ff = FillForwardBuilder::new(Resolution::Minute)
        .calendar(Arc::new(cal))
        .build_bounded(vec![
            trade_bar("X", local(Tz::UTC, "2024-01-02 10:00"), local(Tz::UTC, "2024-01-02 10:01"), Decimal::ONE, 1),
            trade_bar("X", local(Tz::UTC, "2024-01-02 10:05"), local(Tz::UTC, "2024-01-02 10:06"), Decimal::ONE, 1),
        ])
        .unwrap();

    assert!(ff.next().unwrap().is_ok());
    let err = ff.next().unwrap().unwrap_err();
    assert!(matches!(err, LacunaError::CalendarExhausted { lookahead_days: 5, .. }));
    assert!(err.is_calendar());
    assert!(ff.next().is_none());
    assert_eq!(ff.state(), EnumeratorState::Exhausted);
}

#[test]
fn out_of_order_point_is_emitted_without_fill() {
    let out = replay(
        Resolution::Minute,
        vec![
            minute_bar("2024-01-02 09:32", "2024-01-02 09:33", 1),
            minute_bar("2024-01-02 09:31", "2024-01-02 09:32", 2),
            minute_bar("2024-01-02 09:34", "2024-01-02 09:35", 3),
        ],
    );
    assert_eq!(
        ends(&out),
        vec![
            ny("2024-01-02 09:33"),
            ny("2024-01-02 09:32"),
            ny("2024-01-02 09:34"),
            ny("2024-01-02 09:35"),
        ]
    );
    // the late point still becomes the baseline
    assert_eq!(out[2].value, Decimal::from(2));
}

#[test]
fn backwards_point_is_a_data_error() {
    let mut bad = minute_bar("2024-01-02 09:31", "2024-01-02 09:32", 2);
    bad.end_time = ny("2024-01-02 09:30");
    let mut ff = FillForwardBuilder::new(Resolution::Minute)
        .calendar(Arc::new(us_equity()))
        .build_bounded(vec![minute_bar("2024-01-02 09:29", "2024-01-02 09:30", 1), bad])
        .unwrap();

    assert!(ff.next().unwrap().is_ok());
    assert!(matches!(ff.next(), Some(Err(LacunaError::Data(_)))));
    assert!(ff.next().is_none());
}

#[test]
fn quote_fills_zero_sizes_and_keep_sides() {
    let out = replay(
        Resolution::Minute,
        vec![
            quote_bar("EURUSD", ny("2024-01-02 09:30"), ny("2024-01-02 09:31"), Some(Decimal::ONE), Some(Decimal::TWO)),
            quote_bar("EURUSD", ny("2024-01-02 09:32"), ny("2024-01-02 09:33"), Some(Decimal::ONE), Some(Decimal::TWO)),
        ],
    );
    let Payload::Quote(fill) = &out[1].payload else {
        panic!("expected quote fill");
    };
    assert_eq!(fill.last_bid_size, Decimal::ZERO);
    assert_eq!(fill.last_ask_size, Decimal::ZERO);
    assert_eq!(fill.bid.as_deref().map(|s| s.close), Some(Decimal::ONE));
    assert_eq!(out[1].value, Decimal::new(15, 1));
}

#[test]
fn close_is_idempotent() {
    let mut ff: FillForward<_> = FillForwardBuilder::new(Resolution::Minute)
        .calendar(Arc::new(us_equity()))
        .build_bounded(vec![minute_bar("2024-01-02 09:30", "2024-01-02 09:31", 1)])
        .unwrap();
    ff.close();
    ff.close();
    assert!(ff.next().is_none());
    assert_eq!(ff.last_end(), None);
}
