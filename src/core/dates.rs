//! Permissive date parsing for the date-normalization stage.
//!
//! Accepts the formats seen in tabloid exports: ISO dates and date-times,
//! dotted German dates, slash/dash day-first dates, English `Month DD, YYYY`
//! and German `DD. Monat YYYY`. Anything else yields `None`.

use chrono::{DateTime, NaiveDate, NaiveDateTime};

/// Outcome of parsing one raw date cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateParse
{
    Parsed(NaiveDate),
    /// Cell was empty
    Missing,
    /// Cell had content that did not parse
    Unparsed,
}

const DATE_FORMATS: &[&str] =
    &["%Y-%m-%d", "%d.%m.%Y", "%d/%m/%Y", "%d-%m-%Y", "%Y/%m/%d", "%B %d, %Y", "%b %d, %Y"];

const DATETIME_FORMATS: &[&str] =
    &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M", "%d.%m.%Y %H:%M"];

const GERMAN_MONTHS: &[(&str, u32)] = &[
    ("jänner", 1),
    ("januar", 1),
    ("februar", 2),
    ("feber", 2),
    ("märz", 3),
    ("april", 4),
    ("mai", 5),
    ("juni", 6),
    ("juli", 7),
    ("august", 8),
    ("september", 9),
    ("oktober", 10),
    ("november", 11),
    ("dezember", 12),
];

/// Parse a free-form date cell.
pub fn parse_date(raw: &str) -> DateParse
{
    let s = raw.trim();
    if s.is_empty()
    {
        return DateParse::Missing;
    }

    parse_known(s)
        .or_else(|| parse_german_long(s))
        .map_or(DateParse::Unparsed, DateParse::Parsed)
}

fn parse_known(s: &str) -> Option<NaiveDate>
{
    if let Ok(dt) = DateTime::parse_from_rfc3339(s)
    {
        return Some(dt.date_naive());
    }

    DATE_FORMATS
        .iter()
        .find_map(|f| NaiveDate::parse_from_str(s, f).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|f| {
                    NaiveDateTime::parse_from_str(s, f)
                        .ok()
                        .map(|dt| dt.date())
                })
        })
}

/// `12. März 2024`, `1 Jänner 2023`
fn parse_german_long(s: &str) -> Option<NaiveDate>
{
    let lowered = s.to_lowercase();
    let mut parts = lowered.split_whitespace();

    let day: u32 = parts
        .next()?
        .trim_end_matches('.')
        .parse()
        .ok()?;
    let month_word = parts.next()?;
    let year: i32 = parts
        .next()?
        .parse()
        .ok()?;
    if parts
        .next()
        .is_some()
    {
        return None;
    }

    let month = GERMAN_MONTHS
        .iter()
        .find(|(name, _)| *name == month_word)
        .map(|(_, m)| *m)?;

    NaiveDate::from_ymd_opt(year, month, day)
}
