use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use chrono_tz::America::New_York;
use lacuna::{DataPoint, ExchangeCalendar, FillForwardBuilder, Payload, Resolution};
use lacuna_mock::SessionCalendar;
use lacuna_mock::fixtures::bars::trade_bar;
use lacuna_mock::fixtures::calendars::us_equity;
use lacuna_mock::fixtures::local;
use proptest::prelude::*;
use rust_decimal::Decimal;

const SESSION_MINUTES: usize = 390;
// Tuesday through Friday, 2024-01-02..05
const DAYS: [&str; 4] = ["2024-01-02", "2024-01-03", "2024-01-04", "2024-01-05"];

fn open_minute(idx: usize) -> DateTime<Utc> {
    let day = DAYS[idx / SESSION_MINUTES];
    let open = local(New_York, &format!("{day} 09:30"));
    open + TimeDelta::minutes(i64::try_from(idx % SESSION_MINUTES).unwrap())
}

fn bars_at(indices: &BTreeSet<usize>) -> Vec<DataPoint> {
    indices
        .iter()
        .map(|&i| {
            let start = open_minute(i);
            let price = Decimal::from(100 + i64::try_from(i).unwrap());
            trade_bar("SPY", start, start + TimeDelta::minutes(1), price, 10)
        })
        .collect()
}

fn volume(p: &DataPoint) -> Decimal {
    match &p.payload {
        Payload::Trade(bar) => bar.volume,
        _ => Decimal::ONE,
    }
}

fn minute_indices() -> impl Strategy<Value = BTreeSet<usize>> {
    prop::collection::btree_set(0..SESSION_MINUTES * DAYS.len(), 1..40)
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]

    #[test]
    fn output_is_monotonic_and_bounded(indices in minute_indices(), tail in 0i64..600) {
        let input = bars_at(&indices);
        let last_end = input.last().map(|p| p.end_time).unwrap();
        let sub_end = last_end + TimeDelta::minutes(tail);
        let out: Vec<_> = FillForwardBuilder::new(Resolution::Minute)
            .calendar(Arc::new(us_equity()))
            .subscription_end(sub_end)
            .build_bounded(input.clone())
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();

        for pair in out.windows(2) {
            prop_assert!(pair[0].end_time <= pair[1].end_time);
        }
        prop_assert!(out.iter().all(|p| p.end_time <= sub_end));
        // every real bar exactly once, unmodified
        let real: Vec<_> = out.iter().filter(|p| !p.is_fill_forward).cloned().collect();
        prop_assert_eq!(real, input);
    }

    #[test]
    fn fills_carry_the_last_real_price(indices in minute_indices()) {
        let out: Vec<_> = FillForwardBuilder::new(Resolution::Minute)
            .calendar(Arc::new(us_equity()))
            .build_bounded(bars_at(&indices))
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();

        let mut last_real: Option<&DataPoint> = None;
        for p in &out {
            if p.is_fill_forward {
                let base = last_real.unwrap();
                prop_assert_eq!(p.value, base.value);
                prop_assert_eq!(volume(p), Decimal::ZERO);
                let (Payload::Trade(fill), Payload::Trade(real)) = (&p.payload, &base.payload) else {
                    panic!("trade bars expected");
                };
                prop_assert_eq!(fill.ohlc, real.ohlc);
            } else {
                last_real = Some(p);
            }
        }
    }

    #[test]
    fn fills_never_touch_closed_time(indices in minute_indices(), tail in 0i64..2_000) {
        let cal = us_equity();
        let input = bars_at(&indices);
        let sub_end = input.last().map(|p| p.end_time).unwrap() + TimeDelta::minutes(tail);
        let out: Vec<_> = FillForwardBuilder::new(Resolution::Minute)
            .calendar(Arc::new(cal.clone()))
            .subscription_end(sub_end)
            .build_bounded(input)
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();

        for p in out.iter().filter(|p| p.is_fill_forward) {
            prop_assert!(cal.is_open_for_entire(p.time, p.end_time, false), "fill {:?}..{:?} outside session", p.time, p.end_time);
        }
    }

    #[test]
    fn gap_of_n_steps_yields_n_minus_one_fills(start in 0i64..300, n in 1i64..300) {
        let cal = SessionCalendar::weekdays_always_open(New_York);
        let t0 = local(New_York, "2024-01-03 00:00") + TimeDelta::minutes(start);
        let first = trade_bar("SPY", t0, t0 + TimeDelta::minutes(1), Decimal::ONE, 1);
        let t1 = t0 + TimeDelta::minutes(n);
        let second = trade_bar("SPY", t1, t1 + TimeDelta::minutes(1), Decimal::TWO, 1);

        let fills = FillForwardBuilder::new(Resolution::Minute)
            .calendar(Arc::new(cal))
            .build_bounded(vec![first, second])
            .unwrap()
            .filter(|p| p.as_ref().is_ok_and(|p| p.is_fill_forward))
            .count();
        prop_assert_eq!(i64::try_from(fills).unwrap(), n - 1);
    }

    #[test]
    fn hourly_fills_across_dst_neither_skip_nor_repeat(
        anchor in prop::sample::select(vec!["2024-03-09 12:00", "2024-11-02 12:00", "2025-03-08 12:00", "2025-11-01 12:00"]),
        offset in 0i64..24,
        n in 2i64..48,
    ) {
        let cal = SessionCalendar::always_open(New_York);
        let t0 = local(New_York, anchor) + TimeDelta::hours(offset);
        let first = trade_bar("SPY", t0, t0 + TimeDelta::hours(1), Decimal::ONE, 1);
        let t1 = t0 + TimeDelta::hours(n);
        let second = trade_bar("SPY", t1, t1 + TimeDelta::hours(1), Decimal::TWO, 1);

        let out: Vec<_> = FillForwardBuilder::new(Resolution::Hour)
            .calendar(Arc::new(cal))
            .build_bounded(vec![first, second])
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();

        prop_assert_eq!(i64::try_from(out.len()).unwrap(), n + 1);
        for pair in out.windows(2) {
            prop_assert_eq!(pair[1].end_time - pair[0].end_time, TimeDelta::hours(1));
        }
    }
}
