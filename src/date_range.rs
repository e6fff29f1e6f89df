//! Symbolic date presets and their concrete intervals.
//!
//! `resolve` turns a preset into a `[from, to]` interval anchored on a given
//! calendar day, and `detect` performs the reverse lookup. Detection compares
//! calendar days, never instants, so an interval built earlier in the day
//! still matches its preset.

use jiff::ToSpan;
use jiff::Zoned;
use jiff::civil::{Date, DateTime};

use crate::enum_display_fromstr;
use crate::error::{DealboardError, Result};

/// How far back "all time" reaches from today.
pub const ALL_TIME_DAYS: i64 = 9999;

/// The fixed vocabulary of date presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DatePreset {
    Today,
    Yesterday,
    Last7Days,
    Last30Days,
    ThisYear,
    LastYear,
    AllTime,
}

enum_display_fromstr!(DatePreset, DealboardError::UnknownPreset, {
    Today => "today",
    Yesterday => "yesterday",
    Last7Days => "last-7-days",
    Last30Days => "last-30-days",
    ThisYear => "this-year",
    LastYear => "last-year",
    AllTime => "all-time",
});

impl DatePreset {
    /// Every preset, in detection order
    pub const ALL: [DatePreset; 7] = [
        DatePreset::Today,
        DatePreset::Yesterday,
        DatePreset::Last7Days,
        DatePreset::Last30Days,
        DatePreset::ThisYear,
        DatePreset::LastYear,
        DatePreset::AllTime,
    ];
}

/// A closed interval between two civil date-times.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DateRange {
    pub from: DateTime,
    pub to: DateTime,
}

impl DateRange {
    /// Build a range, rejecting `from > to`.
    pub fn new(from: DateTime, to: DateTime) -> Result<Self> {
        if from > to {
            return Err(DealboardError::InvalidDateRange(format!(
                "start {from} is after end {to}"
            )));
        }
        Ok(Self { from, to })
    }

    /// Range covering whole calendar days from `from` through `to`.
    pub fn from_days(from: Date, to: Date) -> Result<Self> {
        Self::new(start_of_day(from), end_of_day(to))
    }

    pub fn contains(&self, at: DateTime) -> bool {
        self.from <= at && at <= self.to
    }
}

fn start_of_day(date: Date) -> DateTime {
    date.at(0, 0, 0, 0)
}

fn end_of_day(date: Date) -> DateTime {
    date.at(23, 59, 59, 999_999_999)
}

/// The calendar day presets are anchored on when no anchor is supplied.
pub fn today() -> Date {
    Zoned::now().date()
}

/// Resolve a preset into a concrete interval anchored on `today`.
pub fn resolve(preset: DatePreset, today: Date) -> Result<DateRange> {
    let (from, to) = match preset {
        DatePreset::Today => (today, today),
        DatePreset::Yesterday => {
            let yesterday = today.yesterday()?;
            (yesterday, yesterday)
        }
        DatePreset::Last7Days => (today.checked_sub(6.days())?, today),
        DatePreset::Last30Days => (today.checked_sub(29.days())?, today),
        DatePreset::ThisYear => (today.first_of_year(), today.last_of_year()),
        DatePreset::LastYear => {
            let last_year_end = today.first_of_year().yesterday()?;
            (last_year_end.first_of_year(), last_year_end)
        }
        DatePreset::AllTime => (today.checked_sub(ALL_TIME_DAYS.days())?, today),
    };
    DateRange::from_days(from, to)
}

/// Find the preset that produced `range`, or `None` for a custom range.
///
/// The all-time lower bound is matched with a tolerance of one day either
/// side since it is a relative offset that may have been computed on a
/// different day than `today`.
pub fn detect(range: &DateRange, today: Date) -> Option<DatePreset> {
    let from = range.from.date();
    let to = range.to.date();

    DatePreset::ALL.into_iter().find(|&preset| {
        let Ok(expected) = resolve(preset, today) else {
            return false;
        };
        let expected_from = expected.from.date();
        if to != expected.to.date() {
            return false;
        }
        if preset == DatePreset::AllTime {
            return within_one_day(from, expected_from);
        }
        from == expected_from
    })
}

fn within_one_day(actual: Date, expected: Date) -> bool {
    if actual == expected {
        return true;
    }
    let before = expected.yesterday().ok();
    let after = expected.tomorrow().ok();
    before == Some(actual) || after == Some(actual)
}
