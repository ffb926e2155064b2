//! Schedule date handling
//!
//! The schedule date arrives as a free-form form field. Recognized formats
//! are normalized into the certificate display form ("6TH MARCH 2025");
//! anything else is carried through verbatim so the certification text
//! still renders.

use chrono::{Datelike, NaiveDate};

/// A parsed schedule date
#[derive(Debug, Clone, PartialEq)]
pub enum ScheduleDate {
    /// A date parsed from a recognized format
    Explicit(NaiveDate),
    /// An unrecognized string, kept as supplied
    Verbatim(String),
    /// No date provided
    None,
}

/// Parse a schedule date string
///
/// Supported formats:
/// - `""` (empty/absent) → None
/// - `"2025-03-06"` → Explicit date (ISO format)
/// - `"03/06/2025"` → Explicit date (US format)
/// - anything else → Verbatim
pub fn parse_schedule_date(input: Option<&str>) -> ScheduleDate {
    let expr = match input {
        Some(s) => s.trim(),
        None => return ScheduleDate::None,
    };

    if expr.is_empty() {
        return ScheduleDate::None;
    }

    // ISO format: 2025-03-06
    if let Ok(date) = NaiveDate::parse_from_str(expr, "%Y-%m-%d") {
        return ScheduleDate::Explicit(date);
    }

    // US format: 03/06/2025
    if let Ok(date) = NaiveDate::parse_from_str(expr, "%m/%d/%Y") {
        return ScheduleDate::Explicit(date);
    }

    ScheduleDate::Verbatim(expr.to_string())
}

/// Render the date as it appears in the certification text
///
/// Example: "6TH MARCH 2025". Verbatim input is uppercased; a missing date
/// renders as an empty string.
pub fn certificate_date(date: &ScheduleDate) -> String {
    match date {
        ScheduleDate::Explicit(d) => format!(
            "{}{} {} {}",
            d.day(),
            day_suffix(d.day()),
            d.format("%B").to_string().to_uppercase(),
            d.year()
        ),
        ScheduleDate::Verbatim(s) => s.to_uppercase(),
        ScheduleDate::None => String::new(),
    }
}

/// Ordinal suffix for a day of month (1ST, 2ND, 3RD, 4TH, ...)
fn day_suffix(day: u32) -> &'static str {
    match day {
        11..=13 => "TH",
        _ => match day % 10 {
            1 => "ST",
            2 => "ND",
            3 => "RD",
            _ => "TH",
        },
    }
}
