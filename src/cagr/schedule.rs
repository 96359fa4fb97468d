//! Parsing of the "horário / sala" cell.
//!
//! Each line looks like `2.0730-3 / CTC-AB1`: site weekday (2 = Monday),
//! start slot, number of consecutive slots, then the room.

use regex::Regex;
use std::sync::LazyLock;
use tracing::trace;

use crate::cagr::models::ScheduleEntry;

/// Start times of the site's class slots, in day order.
pub const TIME_SLOTS: [&str; 14] = [
    "0730", "0820", "0910", "1010", "1100", "1330", "1420", "1510", "1620", "1710", "1830", "1920",
    "2020", "2110",
];

/// Site weekday number of Monday.
const SITE_MONDAY: u8 = 2;

static SCHEDULE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d)\.(\d{4})-(\d) / (.+)$").unwrap());

/// Parse one schedule line. Anything that does not describe a known slot yields `None`.
pub fn parse_schedule_entry(line: &str) -> Option<ScheduleEntry> {
    let line = line.trim();
    let caps = SCHEDULE_RE.captures(line)?;

    let weekday = caps[1].parse::<u8>().ok()?.checked_sub(SITE_MONDAY)?;
    let start = TIME_SLOTS.iter().position(|slot| *slot == &caps[2])?;
    let duration: usize = caps[3].parse().ok()?;
    let end = (start + duration).min(TIME_SLOTS.len());

    Some(ScheduleEntry {
        weekday,
        slots: TIME_SLOTS[start..end].iter().map(|s| s.to_string()).collect(),
        room: caps[4].trim().to_string(),
    })
}

/// Parse every line of a schedule cell, dropping the ones that don't parse.
pub fn parse_schedule(text: &str) -> Vec<ScheduleEntry> {
    text.lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| {
            let entry = parse_schedule_entry(line);
            if entry.is_none() {
                trace!(line, "dropping unparseable schedule line");
            }
            entry
        })
        .collect()
}
