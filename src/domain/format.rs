//! Display formatting for metric values.
//!
//! All functions are total: absent input renders as [`PLACEHOLDER`], and no
//! range validation happens here.

use chrono::{DateTime, NaiveDate, NaiveDateTime};

/// Rendered in place of a missing value.
pub const PLACEHOLDER: &str = "-";

/// Rendered for a date string that cannot be parsed.
pub const INVALID_DATE: &str = "Invalid Date";

fn currency_symbol(code: &str) -> Option<&'static str> {
    let symbol = match code.to_ascii_uppercase().as_str() {
        "USD" => "$",
        "EUR" => "€",
        "GBP" => "£",
        "JPY" => "¥",
        "CNY" => "CN¥",
        "KRW" => "₩",
        "INR" => "₹",
        "CAD" => "CA$",
        "AUD" => "A$",
        "MXN" => "MX$",
        _ => return None,
    };
    Some(symbol)
}

/// Enough fractional digits to print any finite `f64` exactly.
const EXACT_DIGITS: usize = 1100;

/// Fixed-point rendering with `digits` decimals.
///
/// `{:.N}` resolves an exact tie to the even digit; here a tie goes to the
/// value with the larger magnitude, so `6.25` renders as `6.3`.
fn to_fixed(value: f64, digits: usize) -> String {
    let rounded = format!("{value:.digits$}");
    if !value.is_finite() {
        return rounded;
    }

    let exact = format!("{:.*}", EXACT_DIGITS, value.abs());
    let Some((int_part, frac)) = exact.split_once('.') else {
        return rounded;
    };
    let (kept, rest) = frac.split_at(digits);
    let is_tie = rest.starts_with('5') && rest[1..].bytes().all(|b| b == b'0');
    if !is_tie {
        return rounded;
    }

    // Add one unit in the last kept place, carrying leftwards
    let mut number: Vec<u8> = int_part.bytes().chain(kept.bytes()).collect();
    let mut carry = true;
    for d in number.iter_mut().rev() {
        if *d == b'9' {
            *d = b'0';
        } else {
            *d += 1;
            carry = false;
            break;
        }
    }
    if carry {
        number.insert(0, b'1');
    }

    let split = number.len() - digits;
    let mut out = String::with_capacity(number.len() + 2);
    if value < 0.0 {
        out.push('-');
    }
    out.push_str(&String::from_utf8_lossy(&number[..split]));
    if digits > 0 {
        out.push('.');
        out.push_str(&String::from_utf8_lossy(&number[split..]));
    }
    out
}

/// Insert `,` every three digits of the integer part of `digits`.
fn group_thousands(digits: &str) -> String {
    let (int_part, frac_part) = match digits.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (digits, None),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3 + 4);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if let Some(frac) = frac_part {
        grouped.push('.');
        grouped.push_str(frac);
    }
    grouped
}

/// Render an amount as en-US currency with two decimals, e.g. `$1,234.50`.
///
/// Codes without a known symbol are prefixed: `CHF 1,234.50`.
pub fn format_currency(value: Option<f64>, currency: &str) -> String {
    let Some(value) = value else {
        return PLACEHOLDER.to_string();
    };

    let amount = if value.is_finite() {
        group_thousands(&to_fixed(value.abs(), 2))
    } else {
        format!("{}", value.abs())
    };
    let sign = if value < 0.0 { "-" } else { "" };

    match currency_symbol(currency) {
        Some(symbol) => format!("{sign}{symbol}{amount}"),
        None => format!("{sign}{} {amount}", currency.to_ascii_uppercase()),
    }
}

/// Three decimals followed by the unit, e.g. `2.000 kg`.
pub fn format_weight(value: Option<f64>, unit: &str) -> String {
    match value {
        Some(v) => format!("{} {unit}", to_fixed(v, 3)),
        None => PLACEHOLDER.to_string(),
    }
}

/// One decimal followed by `%`.
pub fn format_percentage(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{}%", to_fixed(v, 1)),
        None => PLACEHOLDER.to_string(),
    }
}

/// Size given in megabytes: below 1 MB rendered as whole KB, otherwise MB
/// with one decimal.
pub fn format_file_size(size_mb: Option<f64>) -> String {
    match size_mb {
        Some(mb) if mb < 1.0 => format!("{} KB", to_fixed(mb * 1024.0, 0)),
        Some(mb) => format!("{} MB", to_fixed(mb, 1)),
        None => PLACEHOLDER.to_string(),
    }
}

/// Parse the timestamp shapes the data source emits, normalized to UTC.
fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_utc());
    }
    // Postgres text output: "2024-01-05 10:00:00.123+00"
    if let Ok(dt) = DateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f%#z") {
        return Some(dt.naive_utc());
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Short en-US date, e.g. `Jan 5, 2024`.
pub fn format_date(value: Option<&str>) -> String {
    match value {
        None | Some("") => PLACEHOLDER.to_string(),
        Some(raw) => parse_timestamp(raw)
            .map(|dt| dt.format("%b %-d, %Y").to_string())
            .unwrap_or_else(|| INVALID_DATE.to_string()),
    }
}

/// Short en-US date with 12-hour time, e.g. `Jan 5, 2024, 03:07 PM`.
pub fn format_date_time(value: Option<&str>) -> String {
    match value {
        None | Some("") => PLACEHOLDER.to_string(),
        Some(raw) => parse_timestamp(raw)
            .map(|dt| dt.format("%b %-d, %Y, %I:%M %p").to_string())
            .unwrap_or_else(|| INVALID_DATE.to_string()),
    }
}

/// Completion as a percentage, 0 when nothing is required.
pub fn progress_percent(done: u32, total: u32) -> f64 {
    if total == 0 {
        0.0
    } else {
        f64::from(done) / f64::from(total) * 100.0
    }
}

/// `3 / 5 Passed` style counter.
pub fn format_ratio(done: u32, total: u32, verb: &str) -> String {
    format!("{done} / {total} {verb}")
}
