use std::sync::Arc;

use chrono::TimeDelta;
use lacuna::{FillForwardBuilder, LivePoll, LiveSource, Resolution, feed_queue};
use lacuna_mock::fixtures::bars::trade_bar;
use lacuna_mock::fixtures::calendars::us_equity;
use lacuna_mock::fixtures::utc;
use lacuna_mock::{ManualClock, ScheduledFeed};
use rust_decimal::Decimal;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Suggested: RUST_LOG=lacuna=trace (build with --features tracing)
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();

    // Friday 2024-01-05, 15:57 New York; the market closes at 16:00.
    let clock = ManualClock::new(utc("2024-01-05T20:57:00Z"));
    let (producer, consumer) = feed_queue();
    let mut feed = ScheduledFeed::new(producer);

    // one real bar, then silence over the weekend until Monday's open
    feed.push_at(
        utc("2024-01-05T20:57:00Z"),
        trade_bar("ACME", utc("2024-01-05T20:56:00Z"), utc("2024-01-05T20:57:00Z"), Decimal::new(4_210, 2), 300),
    );
    feed.push_at(
        utc("2024-01-08T14:31:02Z"),
        trade_bar("ACME", utc("2024-01-08T14:30:00Z"), utc("2024-01-08T14:31:00Z"), Decimal::new(4_250, 2), 800),
    );

    let mut live = FillForwardBuilder::new(Resolution::Minute)
        .calendar(Arc::new(us_equity()))
        .clock(Arc::new(clock.clone()))
        .build_live(consumer)?;

    let steps = [
        TimeDelta::zero(),
        TimeDelta::seconds(64),
        TimeDelta::seconds(60),
        TimeDelta::seconds(60),
        // jump across the weekend in one go
        TimeDelta::hours(65) + TimeDelta::minutes(34),
        TimeDelta::seconds(2),
        TimeDelta::seconds(65),
    ];
    for by in steps {
        let now = clock.advance(by);
        feed.release_due(now)?;
        loop {
            match live.advance()? {
                LivePoll::Data(p) => println!(
                    "{now}: {} [{} -> {}] value={}",
                    if p.is_fill_forward { "fill" } else { "real" },
                    p.time,
                    p.end_time,
                    p.value
                ),
                LivePoll::Empty => break,
                LivePoll::Ended => return Ok(()),
            }
        }
    }
    live.stop();
    println!("stopped: {:?}", live.advance()?);

    Ok(())
}
