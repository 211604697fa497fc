pub mod dashboard;
pub mod session_detail;
pub mod sessions;

use ratatui::style::Color;

use crate::models::DisplayStatus;

pub fn status_color(status: DisplayStatus) -> Color {
    match status {
        DisplayStatus::Overdue => Color::Red,
        DisplayStatus::InProgress => Color::Cyan,
        DisplayStatus::Upcoming => Color::Yellow,
        DisplayStatus::Completed => Color::Green,
    }
}

pub fn progress_bar(percent: f64, width: usize) -> String {
    let filled = ((percent.clamp(0.0, 100.0) / 100.0) * width as f64).round() as usize;
    format!("{}{}", "█".repeat(filled), "░".repeat(width - filled))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_bar_fills_proportionally() {
        assert_eq!(progress_bar(0.0, 4), "░░░░");
        assert_eq!(progress_bar(50.0, 4), "██░░");
        assert_eq!(progress_bar(100.0, 4), "████");
    }

    #[test]
    fn progress_bar_clamps_out_of_range() {
        assert_eq!(progress_bar(250.0, 3), "███");
        assert_eq!(progress_bar(-10.0, 3), "░░░");
    }

    #[test]
    fn every_status_has_a_distinct_color() {
        let colors: Vec<Color> = DisplayStatus::ALL.iter().map(|s| status_color(*s)).collect();
        for (i, a) in colors.iter().enumerate() {
            for b in &colors[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }
}
