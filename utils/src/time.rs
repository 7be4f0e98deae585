//! Human-readable durations for logs and status responses.

const UNITS: [(u64, &str); 4] = [(86_400, "d"), (3_600, "h"), (60, "m"), (1, "s")];

/// Render `secs` using its two most significant units, e.g. `"24h 0m"`,
/// `"3m 5s"`, `"2d 1h"`. Durations under a minute are plain seconds.
pub fn format_duration(secs: u64) -> String {
    let Some(i) = UNITS.iter().position(|(size, _)| secs >= *size) else {
        return "0s".to_owned();
    };
    let (major, major_unit) = UNITS[i];
    match UNITS.get(i + 1) {
        Some(&(minor, minor_unit)) => format!(
            "{}{} {}{}",
            secs / major,
            major_unit,
            (secs % major) / minor,
            minor_unit
        ),
        None => format!("{secs}{major_unit}"),
    }
}

/// [`format_duration`] for millisecond values, rounding down to whole seconds.
pub fn format_duration_ms(ms: u64) -> String {
    format_duration(ms / 1000)
}
