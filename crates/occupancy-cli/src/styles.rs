use crossterm::style::{Color, Stylize};

use occupancy_core::OccupancyLevel;

// Color palette
pub const LOW: Color = Color::Rgb { r: 96, g: 160, b: 96 };
pub const MODERATE: Color = Color::Rgb { r: 192, g: 160, b: 64 };
pub const HIGH: Color = Color::Rgb { r: 192, g: 64, b: 64 };
pub const MUTED: Color = Color::Rgb { r: 128, g: 128, b: 128 };
pub const WARNING: Color = Color::Rgb { r: 224, g: 176, b: 48 };

pub fn level_color(level: OccupancyLevel) -> Color {
    match level {
        OccupancyLevel::Low => LOW,
        OccupancyLevel::Moderate => MODERATE,
        OccupancyLevel::High => HIGH,
    }
}

/// Foreground-colored text, or the plain text when color is off.
pub fn paint(text: &str, color: Color, enabled: bool) -> String {
    if enabled {
        text.with(color).to_string()
    } else {
        text.to_string()
    }
}

pub fn bold(text: &str, enabled: bool) -> String {
    if enabled {
        text.bold().to_string()
    } else {
        text.to_string()
    }
}
