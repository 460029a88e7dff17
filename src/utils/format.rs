use chrono::DateTime;

const KB: f64 = 1024.0;
const MB: f64 = KB * 1024.0;
const GB: f64 = MB * 1024.0;

pub fn format_bytes(value: u64) -> String {
    let v = value as f64;
    if value == 0 {
        "0 B".to_string()
    } else if v < KB {
        format!("{} B", value)
    } else if v < MB {
        format!("{:.1} KB", v / KB)
    } else if v < GB {
        format!("{:.1} MB", v / MB)
    } else {
        format!("{:.1} GB", v / GB)
    }
}

pub fn format_duration_ms(value: Option<f64>) -> String {
    match value {
        None => "n/a".to_string(),
        Some(ms) if ms < 1000.0 => format!("{} ms", ms.round()),
        Some(ms) => format!("{:.2} s", ms / 1000.0),
    }
}

/// Seconds from `base` to `ts`, e.g. `"1.250s"`.
pub fn format_relative_time(ts: &str, base: Option<&str>) -> String {
    let Some(base) = base.filter(|b| !b.is_empty()) else {
        return "0.000s".to_string();
    };
    if ts.is_empty() {
        return "0.000s".to_string();
    }
    match (DateTime::parse_from_rfc3339(ts), DateTime::parse_from_rfc3339(base)) {
        (Ok(ts), Ok(base)) => {
            let delta = ts.signed_duration_since(base);
            let secs = delta.num_microseconds().map_or_else(
                || delta.num_milliseconds() as f64 / 1000.0,
                |us| us as f64 / 1_000_000.0,
            );
            format!("{:.3}s", secs)
        }
        _ => "n/a".to_string(),
    }
}
