use chrono::NaiveDateTime;

pub const BAR_WIDTH: usize = 20;

/// Minutes between two timestamps, counted in whole seconds.
pub fn minutes_between(start: NaiveDateTime, end: NaiveDateTime) -> f64 {
    (end - start).num_seconds() as f64 / 60.0
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub fn format_duration(minutes: f64) -> String {
    let minutes = minutes.max(0.0);
    let hours = (minutes / 60.0).floor() as i64;
    let mins = (minutes % 60.0).floor() as i64;

    if hours > 0 {
        format!("{}h {}m", hours, mins)
    } else {
        format!("{}m", mins)
    }
}

/// Share of the target reached, in percent. Zero when there is no target.
pub fn percentage_of(minutes: f64, target_minutes: f64) -> f64 {
    if target_minutes <= 0.0 {
        return 0.0;
    }
    minutes / target_minutes * 100.0
}

/// One cell per 5% of the target, capped at the bar width.
pub fn progress_bar(percentage: f64) -> String {
    let filled = ((percentage / 5.0).floor().max(0.0) as usize).min(BAR_WIDTH);
    format!("{}{}", "█".repeat(filled), "░".repeat(BAR_WIDTH - filled))
}
