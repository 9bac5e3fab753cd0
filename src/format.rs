use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Utc};

const MS_PER_DAY: i64 = 1000 * 60 * 60 * 24;

/// Parses the timestamps the comments API hands out. Offsets are honoured;
/// bare date-times are read as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }

    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Whole days between two instants, floored (so a negative span of a few
/// hours is -1, not 0).
pub fn whole_days_between(from: DateTime<Utc>, to: DateTime<Utc>) -> i64 {
    (to - from).num_milliseconds().div_euclid(MS_PER_DAY)
}

/// Human label for a timestamp relative to `now`.
pub fn format_date(ts: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let diff_days = (now.date_naive() - ts.date_naive()).num_days();
    let time = ts.format("%-I:%M %p");

    match diff_days {
        0 => format!("Today {}", time),
        1 => format!("Yesterday {}", time),
        d if d < 7 => format!("{} {}", ts.format("%a"), time),
        _ if ts.year() != now.year() => format!("{}, {}", ts.format("%b %-d, %Y"), time),
        _ => format!("{}, {}", ts.format("%b %-d"), time),
    }
}

/// Same as [`format_date`] but for the raw string form; anything that does
/// not parse renders as "Invalid date".
pub fn format_raw_date(raw: &str, now: DateTime<Utc>) -> String {
    match parse_timestamp(raw) {
        Some(ts) => format_date(ts, now),
        None => "Invalid date".to_string(),
    }
}

pub fn format_age(days: i64) -> String {
    if days == 0 {
        return "Today".to_string();
    }
    if days == 1 {
        return "1 day".to_string();
    }
    if days < 7 {
        return format!("{} days", days);
    }
    if days < 30 {
        return plural(days / 7, "week");
    }
    if days < 365 {
        return plural(days / 30, "month");
    }
    plural(days / 365, "year")
}

fn plural(n: i64, unit: &str) -> String {
    if n == 1 {
        format!("1 {}", unit)
    } else {
        format!("{} {}s", n, unit)
    }
}

/// Cuts `text` to at most `max_len` characters, ending in "..." when cut.
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() <= max_len {
        return text.to_string();
    }
    let keep = max_len.saturating_sub(3);
    let mut out: String = text.chars().take(keep).collect();
    out.push_str("...");
    out
}
