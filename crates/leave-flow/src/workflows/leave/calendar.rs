use chrono::{Datelike, NaiveDate, Weekday};

/// Monday to Friday days in the inclusive range `start..=end`, never less than one.
///
/// An all-weekend range still costs a day. The caller guarantees `start <= end`; a reversed
/// range counts as empty and therefore also yields one.
pub fn working_days(start: NaiveDate, end: NaiveDate) -> u32 {
    let count = start
        .iter_days()
        .take_while(|day| *day <= end)
        .filter(|day| !matches!(day.weekday(), Weekday::Sat | Weekday::Sun))
        .count();

    u32::try_from(count).unwrap_or(u32::MAX).max(1)
}
