use std::sync::Arc;

use chrono_tz::America::New_York;
use lacuna::{DelistingKind, FillForwardBuilder, Resolution};
use lacuna_mock::fixtures::bars::{delisting, dividend, trade_bar};
use lacuna_mock::fixtures::calendars::us_equity;
use lacuna_mock::fixtures::local;
use rust_decimal::Decimal;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Suggested: RUST_LOG=lacuna=debug (build with --features tracing)
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();

    let ny = |s: &str| local(New_York, s);

    // Thanksgiving week 2024: no bars after Tuesday until the next Monday.
    let bars = vec![
        trade_bar("ACME", ny("2024-11-25 00:00"), ny("2024-11-26 00:00"), Decimal::new(10_125, 2), 1_200),
        trade_bar("ACME", ny("2024-11-26 00:00"), ny("2024-11-27 00:00"), Decimal::new(10_210, 2), 900),
        dividend("ACME", ny("2024-11-29 00:00"), Decimal::new(25, 2)),
        trade_bar("ACME", ny("2024-12-02 00:00"), ny("2024-12-03 00:00"), Decimal::new(10_080, 2), 1_500),
        delisting("ACME", ny("2024-12-04 00:00"), DelistingKind::Delisted),
        trade_bar("ACME", ny("2024-12-05 00:00"), ny("2024-12-06 00:00"), Decimal::new(99, 0), 10),
    ];

    let filled = FillForwardBuilder::new(Resolution::Daily)
        .calendar(Arc::new(us_equity()))
        .build_bounded(bars)?;

    for point in filled {
        let point = point?;
        let tag = if point.is_fill_forward { "fill" } else { "real" };
        println!(
            "{tag} {:?} {} -> {} value={}",
            point.kind(),
            point.local_time(New_York).format("%a %Y-%m-%d"),
            point.end_time.with_timezone(&New_York).format("%a %Y-%m-%d %H:%M"),
            point.value
        );
    }
    println!("stream ended after delisting");

    Ok(())
}
