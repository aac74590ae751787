//! Signed calendar durations between partial-precision dates.
//!
//! Dates are `YYYY`, `YYYY-MM` or `YYYY-MM-DD` (anything past the tenth
//! character is ignored). Missing month and day default to January 1st.
//! The difference is hierarchical: whole months are stepped first, with the
//! day clamped to the end of shorter months, and the remainder is counted in
//! days. Output looks like `P2Y4M9D`, `-P1M` or `P0D`.

use chrono::{Datelike, Months, NaiveDate};

use crate::error::{JoinError, Side};
use crate::table::Table;

/// Result for pairs where either side is not a usable date
pub const INVALID_DATES: &str = "Invalid dates";

pub const CITING_DATE_COLUMN: &str = "citing_date";
pub const CITED_DATE_COLUMN: &str = "cited_date";
pub const TIME_SPAN_COLUMN: &str = "time_span";

/// Minimum length for each precision level
const YEAR_LEN: usize = 4;
const MONTH_LEN: usize = 7;
const DAY_LEN: usize = 10;

/// Precision a date string carries, inferred from its length
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precision {
    Year,
    Month,
    Day,
}

impl Precision {
    pub fn of(date: &str) -> Option<Self> {
        match date.chars().count() {
            n if n >= DAY_LEN => Some(Self::Day),
            n if n >= MONTH_LEN => Some(Self::Month),
            n if n >= YEAR_LEN => Some(Self::Year),
            _ => None,
        }
    }
}

/// Year/month/day difference; all components share one sign
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CalendarSpan {
    pub years: i32,
    pub months: i32,
    pub days: i64,
}

impl CalendarSpan {
    /// Difference `later - earlier`, negative when `later` precedes `earlier`
    pub fn between(later: NaiveDate, earlier: NaiveDate) -> Option<Self> {
        let mut months = (later.year() - earlier.year()) * 12
            + (later.month() as i32 - earlier.month() as i32);
        let mut anchor = shift_months(earlier, months)?;

        // Step back (or forward) until the anchor does not overshoot
        if later < earlier {
            while later > anchor {
                months += 1;
                anchor = shift_months(earlier, months)?;
            }
        } else {
            while later < anchor {
                months -= 1;
                anchor = shift_months(earlier, months)?;
            }
        }

        let days = (later - anchor).num_days();
        let sign = months.signum();
        let whole = months.abs();
        Some(Self {
            years: sign * (whole / 12),
            months: sign * (whole % 12),
            days,
        })
    }

    pub fn is_zero(&self) -> bool {
        self.years == 0 && self.months == 0 && self.days == 0
    }

    pub fn is_negative(&self) -> bool {
        self.years < 0 || self.months < 0 || self.days < 0
    }
}

impl std::fmt::Display for CalendarSpan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_negative() {
            f.write_str("-")?;
        }
        f.write_str("P")?;
        if self.is_zero() {
            return f.write_str("0D");
        }
        if self.years != 0 {
            write!(f, "{}Y", self.years.unsigned_abs())?;
        }
        if self.months != 0 {
            write!(f, "{}M", self.months.unsigned_abs())?;
        }
        if self.days != 0 {
            write!(f, "{}D", self.days.unsigned_abs())?;
        }
        Ok(())
    }
}

fn shift_months(date: NaiveDate, months: i32) -> Option<NaiveDate> {
    let step = Months::new(months.unsigned_abs());
    if months >= 0 {
        date.checked_add_months(step)
    } else {
        date.checked_sub_months(step)
    }
}

/// Parse the first ten characters as `YYYY[-MM[-DD]]`, defaulting to Jan 1st
pub fn parse_partial_date(date: &str) -> Option<NaiveDate> {
    Precision::of(date)?;
    let head: String = date.chars().take(DAY_LEN).collect();
    let mut parts = head.trim().split('-');

    let year: i32 = parse_field(parts.next()?)?;
    let month: u32 = parts.next().map(parse_field::<u32>).unwrap_or(Some(1))?;
    let day: u32 = parts.next().map(parse_field::<u32>).unwrap_or(Some(1))?;
    if parts.next().is_some() {
        return None;
    }
    NaiveDate::from_ymd_opt(year, month, day)
}

fn parse_field<T: std::str::FromStr>(field: &str) -> Option<T> {
    if field.is_empty() || !field.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    field.parse().ok()
}

/// Signed duration from `cited` to `citing`, or [`INVALID_DATES`].
pub fn time_span(citing: &str, cited: &str) -> String {
    let (Some(citing), Some(cited)) = (parse_partial_date(citing), parse_partial_date(cited))
    else {
        return INVALID_DATES.to_string();
    };
    match CalendarSpan::between(citing, cited) {
        Some(span) => span.to_string(),
        None => INVALID_DATES.to_string(),
    }
}

/// Append a `time_span` column computed from the citing and cited dates.
pub fn add_time_span(table: &mut Table) -> Result<usize, JoinError> {
    let citing = table.require_column(CITING_DATE_COLUMN, Side::Input)?;
    let cited = table.require_column(CITED_DATE_COLUMN, Side::Input)?;

    let mut invalid = 0;
    for row in &mut table.rows {
        let span = time_span(&row[citing], &row[cited]);
        if span == INVALID_DATES {
            invalid += 1;
        }
        row.push(span);
    }
    table.headers.push(TIME_SPAN_COLUMN.to_string());
    Ok(invalid)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn day_precision() {
        assert_eq!(time_span("2020-05-10", "2018-01-01"), "P2Y4M9D");
        assert_eq!(time_span("2018-01-01", "2020-05-10"), "-P2Y4M9D");
    }

    #[test]
    fn zero_span() {
        assert_eq!(time_span("2020", "2020"), "P0D");
        assert_eq!(time_span("2020-01-01", "2020"), "P0D");
    }

    #[test]
    fn below_year_precision() {
        assert_eq!(time_span("202", "2019"), INVALID_DATES);
        assert_eq!(time_span("2019", ""), INVALID_DATES);
    }

    #[test]
    fn not_a_date() {
        assert_eq!(time_span("abcd", "2019"), INVALID_DATES);
        assert_eq!(time_span("2019-13", "2019"), INVALID_DATES);
        assert_eq!(time_span("2019-02-30", "2019"), INVALID_DATES);
    }

    #[test]
    fn mixed_precision_uses_defaults() {
        assert_eq!(time_span("2021-03", "2020"), "P1Y2M");
        assert_eq!(time_span("2020", "2019-12-31"), "P1D");
    }

    #[test]
    fn timestamps_are_truncated() {
        assert_eq!(time_span("2020-05-10T08:30:00Z", "2020-05-01"), "P9D");
    }

    #[test]
    fn end_of_month_clamping() {
        assert_eq!(time_span("2020-03-31", "2020-02-29"), "P1M2D");
        assert_eq!(time_span("2020-02-29", "2020-01-31"), "P1M");
        assert_eq!(time_span("2020-02-29", "2020-03-31"), "-P1M");
    }

    #[test]
    fn years_only() {
        assert_eq!(time_span("2024-06-15", "2019-06-15"), "P5Y");
        assert_eq!(time_span("2019-06-15", "2024-06-15"), "-P5Y");
    }

    #[test]
    fn precision_levels() {
        assert_eq!(Precision::of("2020"), Some(Precision::Year));
        assert_eq!(Precision::of("2020-05"), Some(Precision::Month));
        assert_eq!(Precision::of("2020-05-10"), Some(Precision::Day));
        assert_eq!(Precision::of("20"), None);
    }

    #[test]
    fn column_added() {
        let mut table = Table {
            headers: vec!["citing_date".into(), "cited_date".into()],
            rows: vec![
                vec!["2020-05-10".into(), "2018-01-01".into()],
                vec!["2020".into(), "".into()],
            ],
        };
        assert_eq!(add_time_span(&mut table).unwrap(), 1);
        assert_eq!(table.headers.last().unwrap(), TIME_SPAN_COLUMN);
        assert_eq!(table.rows[0][2], "P2Y4M9D");
        assert_eq!(table.rows[1][2], INVALID_DATES);
    }

    #[test]
    fn column_requires_dates() {
        let mut table = Table::new(vec!["citing_date".into()]);
        assert!(add_time_span(&mut table).is_err());
    }
}
