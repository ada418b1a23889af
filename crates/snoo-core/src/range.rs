//! Inclusive calendar-day ranges.

use std::iter::FusedIterator;

use chrono::NaiveDate;

/// An inclusive range of calendar days.
///
/// Iterating is lazy and can be restarted: every call to [`DayRange::iter`]
/// starts again at `start`. A range whose start is after its end is empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DayRange {
    pub const fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    pub const fn start(&self) -> NaiveDate {
        self.start
    }

    pub const fn end(&self) -> NaiveDate {
        self.end
    }

    /// Number of days the range yields.
    pub fn len(&self) -> usize {
        let days = (self.end - self.start).num_days();
        usize::try_from(days + 1).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.start > self.end
    }

    pub const fn iter(&self) -> Days {
        Days {
            next: Some(self.start),
            end: self.end,
        }
    }
}

impl IntoIterator for DayRange {
    type Item = NaiveDate;
    type IntoIter = Days;

    fn into_iter(self) -> Days {
        self.iter()
    }
}

impl IntoIterator for &DayRange {
    type Item = NaiveDate;
    type IntoIter = Days;

    fn into_iter(self) -> Days {
        self.iter()
    }
}

/// Iterator over the days of a [`DayRange`].
#[derive(Debug, Clone)]
pub struct Days {
    next: Option<NaiveDate>,
    end: NaiveDate,
}

impl Iterator for Days {
    type Item = NaiveDate;

    fn next(&mut self) -> Option<NaiveDate> {
        let day = self.next.filter(|day| *day <= self.end)?;
        // succ_opt is None only at NaiveDate::MAX, which ends the range.
        self.next = day.succ_opt();
        Some(day)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self
            .next
            .map_or(0, |next| DayRange::new(next, self.end).len());
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Days {}

impl FusedIterator for Days {}
