use chrono::{NaiveDate, NaiveTime, Weekday};
use chrono_tz::America::New_York;

use crate::{Segment, SessionCalendar};

const WEEKDAYS: [Weekday; 5] = [Weekday::Mon, Weekday::Tue, Weekday::Wed, Weekday::Thu, Weekday::Fri];

// NYSE full-day closures
const US_HOLIDAYS: [(i32, u32, u32); 21] = [
    (2024, 1, 1),
    (2024, 1, 15),
    (2024, 2, 19),
    (2024, 3, 29),
    (2024, 5, 27),
    (2024, 6, 19),
    (2024, 7, 4),
    (2024, 9, 2),
    (2024, 11, 28),
    (2024, 12, 25),
    (2025, 1, 1),
    (2025, 1, 9),
    (2025, 1, 20),
    (2025, 2, 17),
    (2025, 4, 18),
    (2025, 5, 26),
    (2025, 6, 19),
    (2025, 7, 4),
    (2025, 9, 1),
    (2025, 11, 27),
    (2025, 12, 25),
];

// 13:00 closes
const US_EARLY_CLOSES: [(i32, u32, u32); 6] = [
    (2024, 7, 3),
    (2024, 11, 29),
    (2024, 12, 24),
    (2025, 7, 3),
    (2025, 11, 28),
    (2025, 12, 24),
];

fn date((y, m, d): (i32, u32, u32)) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid fixture date")
}

/// US equities in New York time: regular 09:30-16:00, pre-market
/// 04:00-09:30, after-hours 16:00-20:00, with the 2024-2025 exchange
/// holidays and 13:00 early closes.
#[must_use]
pub fn us_equity() -> SessionCalendar {
    let early = NaiveTime::from_hms_opt(13, 0, 0).expect("13:00");
    let cal = SessionCalendar::new(New_York)
        .with_regular(&WEEKDAYS, Segment::new("09:30", "16:00"))
        .with_extended(&WEEKDAYS, Segment::new("04:00", "09:30"))
        .with_extended(&WEEKDAYS, Segment::new("16:00", "20:00"));
    let cal = US_HOLIDAYS.into_iter().fold(cal, |c, d| c.with_holiday(date(d)));
    US_EARLY_CLOSES
        .into_iter()
        .fold(cal, |c, d| c.with_early_close(date(d), early))
}

/// Spot FX in New York time: opens Sunday 17:00, trades around the clock,
/// closes Friday 17:00.
#[must_use]
pub fn forex() -> SessionCalendar {
    SessionCalendar::new(New_York)
        .with_regular(&[Weekday::Sun], Segment::until_midnight("17:00"))
        .with_regular(&[Weekday::Mon, Weekday::Tue, Weekday::Wed, Weekday::Thu], Segment::all_day())
        .with_regular(&[Weekday::Fri], Segment::new("00:00", "17:00"))
}
