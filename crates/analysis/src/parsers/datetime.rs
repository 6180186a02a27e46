//! Message header recognition and date/time resolution.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use groupscope_core::{ClockStyle, DateOrder};
use once_cell::sync::Lazy;
use regex::Regex;

/// `[31/01/2023, 10:00:05 PM] body` or `31/01/2023, 22:00 - body`.
static HEADER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^\[?(?P<date>\d{1,4}(?P<sep>[/.\-])\d{1,2}[/.\-]\d{1,4}),?\s+(?P<hour>\d{1,2}):(?P<minute>\d{2})(?::(?P<second>\d{2}))?(?:\s*(?P<meridiem>[AaPp])\.?\s?[Mm](?:\.|\b))?\]?\s*(?:-\s*)?(?P<body>.*)$",
    )
    .expect("header pattern is valid")
});

/// Date token split into its numeric parts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateShape {
    /// Year first: only readable as `YYYY-MM-DD`.
    YearFirst {
        /// Four-digit year.
        year: i32,
        /// Month field.
        month: u32,
        /// Day field.
        day: u32,
    },
    /// Year last: day and month in either order.
    YearLast {
        /// First field.
        first: u32,
        /// Second field.
        second: u32,
        /// Year, two-digit years already expanded.
        year: i32,
    },
}

impl DateShape {
    fn parse(token: &str, sep: char) -> Option<Self> {
        let parts: Vec<&str> = token.split(sep).collect();
        if parts.len() != 3 {
            return None;
        }
        let (a, b, c) = (parts[0], parts[1], parts[2]);

        if a.len() == 4 && c.len() <= 2 {
            return Some(DateShape::YearFirst {
                year: a.parse().ok()?,
                month: b.parse().ok()?,
                day: c.parse().ok()?,
            });
        }
        if a.len() <= 2 && (c.len() == 2 || c.len() == 4) {
            let raw_year: i32 = c.parse().ok()?;
            let year = if c.len() == 2 { 2000 + raw_year } else { raw_year };
            return Some(DateShape::YearLast {
                first: a.parse().ok()?,
                second: b.parse().ok()?,
                year,
            });
        }
        None
    }

    /// The only order this date can be read in, if its values settle it.
    pub fn disambiguate(&self) -> Option<DateOrder> {
        match *self {
            DateShape::YearFirst { .. } => Some(DateOrder::YearMonthDay),
            DateShape::YearLast { first, second, .. } => {
                if first > 12 && (1..=12).contains(&second) {
                    Some(DateOrder::DayMonthYear)
                } else if second > 12 && (1..=12).contains(&first) {
                    Some(DateOrder::MonthDayYear)
                } else {
                    None
                }
            }
        }
    }

    /// Calendar date under a given order.
    pub fn resolve(&self, order: DateOrder) -> Option<NaiveDate> {
        match (*self, order) {
            (DateShape::YearFirst { year, month, day }, DateOrder::YearMonthDay) => {
                NaiveDate::from_ymd_opt(year, month, day)
            }
            (
                DateShape::YearLast {
                    first,
                    second,
                    year,
                },
                DateOrder::DayMonthYear,
            ) => NaiveDate::from_ymd_opt(year, second, first),
            (
                DateShape::YearLast {
                    first,
                    second,
                    year,
                },
                DateOrder::MonthDayYear,
            ) => NaiveDate::from_ymd_opt(year, first, second),
            _ => None,
        }
    }
}

/// A line shaped like a message header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderLine<'a> {
    /// Parsed date token, `None` when its layout is not supported.
    pub date: Option<DateShape>,
    /// Hour as written.
    pub hour: u32,
    /// Minute.
    pub minute: u32,
    /// Second, 0 when absent.
    pub second: u32,
    /// `Some(true)` for PM, `Some(false)` for AM, `None` for 24-hour times.
    pub pm: Option<bool>,
    /// Everything after the timestamp.
    pub body: &'a str,
}

impl<'a> HeaderLine<'a> {
    /// Match a header at the start of a line.
    pub fn match_line(line: &'a str) -> Option<Self> {
        let caps = HEADER_RE.captures(line)?;
        let sep = caps.name("sep")?.as_str().chars().next()?;
        let date = DateShape::parse(caps.name("date")?.as_str(), sep);
        let second = match caps.name("second") {
            Some(m) => m.as_str().parse().ok()?,
            None => 0,
        };
        let pm = caps
            .name("meridiem")
            .map(|m| m.as_str().eq_ignore_ascii_case("p"));

        Some(Self {
            date,
            hour: caps.name("hour")?.as_str().parse().ok()?,
            minute: caps.name("minute")?.as_str().parse().ok()?,
            second,
            pm,
            body: caps.name("body").map(|m| m.as_str()).unwrap_or_default(),
        })
    }

    /// Clock convention of this header.
    pub fn clock_style(&self) -> ClockStyle {
        if self.pm.is_some() {
            ClockStyle::TwelveHour
        } else {
            ClockStyle::TwentyFourHour
        }
    }

    /// Time of day, honoring AM/PM.
    pub fn time(&self) -> Option<NaiveTime> {
        let hour = match self.pm {
            Some(pm) => {
                if !(1..=12).contains(&self.hour) {
                    return None;
                }
                match (self.hour, pm) {
                    (12, false) => 0,
                    (12, true) => 12,
                    (h, true) => h + 12,
                    (h, false) => h,
                }
            }
            None => self.hour,
        };
        NaiveTime::from_hms_opt(hour, self.minute, self.second)
    }

    /// Full timestamp under a given date order.
    pub fn timestamp(&self, order: DateOrder) -> Option<NaiveDateTime> {
        let date = self.date?.resolve(order)?;
        Some(date.and_time(self.time()?))
    }
}
