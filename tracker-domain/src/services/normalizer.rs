// Timestamp normalization
// Turns year-less log timestamps into absolute instants

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};

use crate::errors::TimestampError;
use crate::value_objects::TimestampFormat;

/// Backward steps larger than this within one source mean the year turned over.
pub const ROLLOVER_THRESHOLD_DAYS: i64 = 182;

const MONTHS: [&str; 12] = [
    "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PartialTimestamp {
    month: u32,
    day: u32,
    time: NaiveTime,
}

impl PartialTimestamp {
    fn at_year(&self, year: i32) -> Option<NaiveDateTime> {
        NaiveDate::from_ymd_opt(year, self.month, self.day).map(|date| date.and_time(self.time))
    }
}

/// Stateful per-source normalizer. The year only ever moves forward.
#[derive(Debug, Clone)]
pub struct TimestampNormalizer {
    format: TimestampFormat,
    year: i32,
    last: Option<NaiveDateTime>,
    latest_line_at: Option<NaiveDateTime>,
}

impl TimestampNormalizer {
    pub fn new(format: TimestampFormat, reference_year: i32) -> Self {
        Self {
            format,
            year: reference_year,
            last: None,
            latest_line_at: None,
        }
    }

    /// Dates the first line in the previous year when it would otherwise
    /// fall after `latest`.
    pub fn with_latest_line_at(mut self, latest: Option<NaiveDateTime>) -> Self {
        self.latest_line_at = latest;
        self
    }

    pub fn normalize(&mut self, token: &str) -> Result<NaiveDateTime, TimestampError> {
        let malformed = || TimestampError::Malformed {
            token: token.to_string(),
        };
        let partial = parse_partial(self.format, token).ok_or_else(malformed)?;
        let mut instant = partial.at_year(self.year).ok_or_else(malformed)?;

        if let (None, Some(latest)) = (self.last, self.latest_line_at) {
            if instant > latest {
                let previous_year = self.year - 1;
                instant = partial.at_year(previous_year).ok_or_else(malformed)?;
                self.year = previous_year;
            }
        }

        if let Some(last) = self.last {
            if last - instant > Duration::days(ROLLOVER_THRESHOLD_DAYS) {
                let next_year = self.year + 1;
                instant = partial.at_year(next_year).ok_or_else(malformed)?;
                self.year = next_year;
            }
        }

        self.last = Some(match self.last {
            Some(last) if last > instant => last,
            _ => instant,
        });
        Ok(instant)
    }
}

fn parse_partial(format: TimestampFormat, token: &str) -> Option<PartialTimestamp> {
    let mut parts = token.split_whitespace();
    let (month, day) = match format {
        TimestampFormat::Syslog => {
            let month = parse_month(parts.next()?)?;
            let day = parse_number(parts.next()?, 2)?;
            (month, day)
        }
        TimestampFormat::SlashMillis => {
            let (month, day) = parts.next()?.split_once('/')?;
            (parse_number(month, 2)?, parse_number(day, 2)?)
        }
    };
    let time = parse_time(parts.next()?, format == TimestampFormat::SlashMillis)?;
    if parts.next().is_some() {
        return None;
    }
    Some(PartialTimestamp { month, day, time })
}

fn parse_month(token: &str) -> Option<u32> {
    let lower = token.to_ascii_lowercase();
    MONTHS
        .iter()
        .position(|name| *name == lower)
        .map(|index| index as u32 + 1)
}

fn parse_number(token: &str, max_digits: usize) -> Option<u32> {
    if token.is_empty() || token.len() > max_digits || !token.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    token.parse().ok()
}

fn parse_time(token: &str, allow_fraction: bool) -> Option<NaiveTime> {
    let (clock, fraction) = match token.split_once('.') {
        Some((clock, fraction)) if allow_fraction => (clock, Some(fraction)),
        Some(_) => return None,
        None => (token, None),
    };
    let mut fields = clock.split(':');
    let hour = parse_number(fields.next()?, 2)?;
    let minute = parse_number(fields.next()?, 2)?;
    let second = parse_number(fields.next()?, 2)?;
    if fields.next().is_some() {
        return None;
    }
    let nanos = match fraction {
        Some(digits) => {
            if digits.len() > 6 {
                return None;
            }
            parse_number(digits, 6)? * 10u32.pow(9 - digits.len() as u32)
        }
        None => 0,
    };
    NaiveTime::from_hms_nano_opt(hour, minute, second, nanos)
}
