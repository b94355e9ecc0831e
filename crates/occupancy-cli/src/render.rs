//! Plain-text rendering of a cycle report for the terminal.

use chrono::Local;

use occupancy_core::utils::{first_line, format_age};
use occupancy_core::{CycleReport, FacilityResult, ReadingSource, RefreshError};

use crate::styles::{bold, level_color, paint, MUTED, WARNING};

#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Label preceding each facility number ("WOF").
    pub label: String,
    pub color: bool,
    pub timestamp: bool,
}

pub fn render_report(report: &CycleReport, opts: &RenderOptions) -> String {
    let mut lines = Vec::new();

    if report.offline {
        lines.push(paint("⚠️ Offline mode", WARNING, opts.color));
    }

    match report.results.as_slice() {
        [single] => {
            lines.push(bold(
                &format!("🏋️ {} {} occupancy", opts.label, single.id),
                opts.color,
            ));
            lines.push(value(single, opts));
        }
        results => {
            for result in results {
                lines.push(format!("{} {}: {}", opts.label, result.id, value(result, opts)));
            }
        }
    }

    if opts.timestamp {
        let at = report.refreshed_at.with_timezone(&Local).format("%H:%M:%S");
        lines.push(paint(&format!("As of {}", at), MUTED, opts.color));
    }

    lines.join("\n")
}

/// Percentage (with cache age when cached) or "n/a" with the reason.
fn value(result: &FacilityResult, opts: &RenderOptions) -> String {
    let Some(reading) = &result.reading else {
        let reason = result.failure.as_deref().map(first_line).unwrap_or_default();
        return paint(&format!("n/a ({})", reason), MUTED, opts.color);
    };

    let pct = format!("{}%", reading.percentage);
    let mut out = if opts.color {
        paint(&pct, level_color(reading.level()), true)
    } else {
        pct
    };

    if result.source == ReadingSource::Cached {
        if let Some(age) = result.cache_age {
            let note = format!(" (cached {})", format_age(age.num_minutes()));
            out.push_str(&paint(&note, MUTED, opts.color));
        }
    }
    out
}

pub fn render_failure(err: &RefreshError) -> String {
    format!("⚠️ {}", first_line(&err.to_string()))
}
