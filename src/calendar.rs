//! Month grid and per-day notes for the dashboard calendar widget.
//!
//! Notes live only in memory for the lifetime of the portal process;
//! closing the portal discards them. Keys are unpadded `"YYYY-M-D"`
//! strings.

use chrono::{Datelike, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

pub const DAY_HEADERS: [&str; 7] = ["Min", "Sen", "Sel", "Rab", "Kam", "Jum", "Sab"];

pub const MONTH_NAMES: [&str; 12] = [
    "Januari",
    "Februari",
    "Maret",
    "April",
    "Mei",
    "Juni",
    "Juli",
    "Agustus",
    "September",
    "Oktober",
    "November",
    "Desember",
];

/// Notes keyed by unpadded `"YYYY-M-D"`.
pub type Notes = HashMap<String, String>;

static DATE_KEY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{4})-(\d{1,2})-(\d{1,2})$").expect("date key pattern"));

pub fn note_key(date: NaiveDate) -> String {
    format!("{}-{}-{}", date.year(), date.month(), date.day())
}

/// Parse a `YYYY-M-D` argument into a calendar date.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let caps = DATE_KEY.captures(s.trim())?;
    let year = caps[1].parse().ok()?;
    let month = caps[2].parse().ok()?;
    let day = caps[3].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

pub fn days_in_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|d| d.pred_opt())
        .map(|d| d.day())
        .unwrap_or(0)
}

/// Cells for a month laid out on a Sunday-first week: leading `None`
/// placeholders up to the month's first weekday, then days 1..=last.
pub fn month_cells(year: i32, month: u32) -> Vec<Option<u32>> {
    let Some(first) = NaiveDate::from_ymd_opt(year, month, 1) else {
        return Vec::new();
    };

    let leading = first.weekday().num_days_from_sunday() as usize;
    let mut cells: Vec<Option<u32>> = vec![None; leading];
    cells.extend((1..=days_in_month(year, month)).map(Some));
    cells
}

/// Shift a (year, month) pair by a signed number of months.
pub fn shift_month(year: i32, month: u32, offset: i32) -> (i32, u32) {
    let zero_based = year * 12 + month as i32 - 1 + offset;
    (zero_based.div_euclid(12), (zero_based.rem_euclid(12) + 1) as u32)
}

/// Store, trim, or clear the note for a date. Blank input removes any
/// existing note. Returns whether a note remains stored afterwards.
pub fn save_note(notes: &mut Notes, date: NaiveDate, input: &str) -> bool {
    let trimmed = input.trim();
    let key = note_key(date);
    if trimmed.is_empty() {
        notes.remove(&key);
        false
    } else {
        notes.insert(key, trimmed.to_string());
        true
    }
}

pub fn note_for<'a>(notes: &'a Notes, date: NaiveDate) -> Option<&'a str> {
    notes.get(&note_key(date)).map(String::as_str)
}

pub fn has_note(notes: &Notes, date: NaiveDate) -> bool {
    note_for(notes, date).is_some_and(|n| !n.trim().is_empty())
}
