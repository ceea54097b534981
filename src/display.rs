//! Formatting helpers shared by the snapshot printer and the TUI.

use crate::gate::{GatedRow, RowContent};

const MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Parse an RFC 3339 / ISO 8601 timestamp to Unix seconds, honouring a
/// trailing `Z` or `±HH:MM` offset. Date-only strings mean midnight UTC.
pub fn parse_iso_to_unix_secs(s: &str) -> Option<i64> {
    let s = s.trim();
    if s.len() < 10 {
        return None;
    }
    let year: i64 = s.get(0..4)?.parse().ok()?;
    let month: i64 = s.get(5..7)?.parse().ok()?;
    let day: i64 = s.get(8..10)?.parse().ok()?;

    let (hour, minute, second, rest) = if s.len() >= 19 {
        (
            s.get(11..13)?.parse::<i64>().ok()?,
            s.get(14..16)?.parse::<i64>().ok()?,
            s.get(17..19)?.parse::<i64>().ok()?,
            &s[19..],
        )
    } else if s.len() == 10 {
        (0, 0, 0, "")
    } else {
        return None;
    };

    // Skip fractional seconds.
    let rest = match rest.strip_prefix('.') {
        Some(frac) => frac.trim_start_matches(|c: char| c.is_ascii_digit()),
        None => rest,
    };
    let offset_secs = match rest {
        "" | "Z" => 0,
        tz if tz.len() == 6 && (tz.starts_with('+') || tz.starts_with('-')) => {
            let sign = if tz.starts_with('-') { -1 } else { 1 };
            let h: i64 = tz.get(1..3)?.parse().ok()?;
            let m: i64 = tz.get(4..6)?.parse().ok()?;
            sign * (h * 3600 + m * 60)
        }
        _ => return None,
    };

    let a = (14 - month) / 12;
    let y = year + 4800 - a;
    let m = month + 12 * a - 3;
    let jdn = day + (153 * m + 2) / 5 + 365 * y + y / 4 - y / 100 + y / 400 - 32045;
    let unix_days = jdn - 2_440_588;
    Some(unix_days * 86400 + hour * 3600 + minute * 60 + second - offset_secs)
}

/// Civil (year, month, day) for days since the Unix epoch.
fn civil_from_days(days: i64) -> (i64, usize, i64) {
    let z = days + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z.rem_euclid(146_097);
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = doy - (153 * mp + 2) / 5 + 1;
    let month = if mp < 10 { mp + 3 } else { mp - 9 };
    let year = yoe + era * 400 + i64::from(month <= 2);
    (year, month as usize, day)
}

/// `14 Oct 19:00` in UTC; the raw string when it does not parse.
pub fn format_kickoff(iso: &str) -> String {
    let Some(secs) = parse_iso_to_unix_secs(iso) else {
        return iso.to_string();
    };
    let (_, month, day) = civil_from_days(secs.div_euclid(86_400));
    let tod = secs.rem_euclid(86_400);
    format!(
        "{day:02} {} {:02}:{:02}",
        MONTHS[month.saturating_sub(1).min(11)],
        tod / 3600,
        (tod / 60) % 60
    )
}

pub fn format_percent(p: f64) -> String {
    format!("{p:.0}%")
}

pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(1)).collect();
        format!("{kept}…")
    }
}

pub const LOCKED_LABEL: &str = "🔒 Premium";
pub const NO_PREDICTION_LABEL: &str = "No prediction available";

/// One-line prediction cell for a gated row.
pub fn prediction_cell(row: &GatedRow<'_>) -> String {
    match row.content {
        RowContent::Locked => LOCKED_LABEL.to_string(),
        RowContent::Unlocked(None) => NO_PREDICTION_LABEL.to_string(),
        RowContent::Unlocked(Some(p)) => {
            let mut cell = format!("{} ({} conf)", p.advice(), format_percent(p.confidence()));
            if let Some(h) = p.first_half_analysis.as_ref().filter(|h| h.has_value) {
                cell.push_str(&format!(" · 1H {}", format_percent(h.probability)));
            }
            cell
        }
    }
}
