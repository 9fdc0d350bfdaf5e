// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Conversion of free-text period labels into calendar dates.
//!
//! Two grammars are supported:
//! * month-year column labels like `Mar 2025` or `March 2025`, mapped to the first day of the month;
//! * banner sentences like `For the month ended 31 December 2025`, mapped to the exact date.
//!
//! Neither function fails: anything that doesn't fit the grammar yields `None`.

use chrono::{NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;

use report_types::{Cell, RawGrid};

/// English month names, full and abbreviated.
const MONTHS: [(&str, &str); 12] = [
    ("january", "jan"),
    ("february", "feb"),
    ("march", "mar"),
    ("april", "apr"),
    ("may", "may"),
    ("june", "jun"),
    ("july", "jul"),
    ("august", "aug"),
    ("september", "sep"),
    ("october", "oct"),
    ("november", "nov"),
    ("december", "dec"),
];

const BANNER_PHRASES: [&str; 2] = ["for the month ended", "for the period ended"];

static MONTH_YEAR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([A-Za-z]+)\s+([0-9]{4})$").expect("Pattern is valid."));

static BANNER_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d{1,2})\s+([A-Za-z]+)\s+(\d{4})").expect("Pattern is valid."));

/// Month number (1-12) for a full or abbreviated English month name, case-insensitive.
fn month_number(name: &str) -> Option<u32> {
    let name = name.to_lowercase();
    MONTHS
        .iter()
        .position(|(full, short)| name == *full || name == *short)
        .map(|index| index as u32 + 1)
}

/// Parse a month-year label, e.g. `Mar 2025`, into the first day of that month.
pub fn parse_month_year(label: &str) -> Option<NaiveDate> {
    let captures = MONTH_YEAR.captures(label.trim())?;
    let month = month_number(&captures[1])?;
    let year = captures[2].parse::<i32>().ok()?;

    NaiveDate::from_ymd_opt(year, month, 1)
}

/// Extract the report date from a banner sentence,
/// e.g. `For the month ended 31 December 2025`.
///
/// Only the first date-like substring is considered.
pub fn parse_report_period(text: &str) -> Option<NaiveDate> {
    let lower = text.to_lowercase();
    if !BANNER_PHRASES.iter().any(|phrase| lower.contains(phrase)) {
        return None;
    }

    let captures = BANNER_DATE.captures(text)?;
    let day = captures[1].parse::<u32>().ok()?;
    let month = month_number(&captures[2])?;
    let year = captures[3].parse::<i32>().ok()?;

    NaiveDate::from_ymd_opt(year, month, day)
}

/// Scan the first `scan_rows` rows of the grid for a banner carrying the report period.
pub fn find_report_period(grid: &RawGrid, scan_rows: usize) -> Option<NaiveDate> {
    grid.rows()
        .iter()
        .take(scan_rows)
        .flat_map(|row| row.iter())
        .find_map(|cell| match cell {
            Cell::Text(text) => parse_report_period(text),
            _ => None,
        })
}

/// Column label for a header cell stored as a date, in the month-year grammar.
pub fn month_year_label(date: &NaiveDateTime) -> String {
    date.format("%b %Y").to_string()
}
