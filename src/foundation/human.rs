//! Human-readable formatting for export reports.

const SIZE_UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

/// Format a duration as hours/minutes/seconds, omitting zero components.
///
/// Seconds keep up to two decimals. A zero duration renders as `0s`.
pub fn format_duration(secs: f64) -> String {
    let centis = if secs.is_finite() && secs > 0.0 {
        (secs * 100.0).round() as u64
    } else {
        0
    };

    let hours = centis / 360_000;
    let minutes = (centis % 360_000) / 6_000;
    let sec_centis = centis % 6_000;

    let mut parts = Vec::with_capacity(3);
    if hours > 0 {
        parts.push(format!("{hours}h"));
    }
    if minutes > 0 {
        parts.push(format!("{minutes}m"));
    }
    if sec_centis > 0 || parts.is_empty() {
        let whole = sec_centis / 100;
        let frac = sec_centis % 100;
        let s = if frac == 0 {
            format!("{whole}s")
        } else if frac % 10 == 0 {
            format!("{whole}.{}s", frac / 10)
        } else {
            format!("{whole}.{frac:02}s")
        };
        parts.push(s);
    }
    parts.join(" ")
}

/// Format a byte count in the largest unit under which the value stays below 1024.
pub fn format_size(bytes: u64) -> String {
    let mut value = bytes as f64;
    let mut unit = 0usize;
    while value >= 1024.0 && unit + 1 < SIZE_UNITS.len() {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{value:.2} {}", SIZE_UNITS[unit])
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/human.rs"]
mod tests;
