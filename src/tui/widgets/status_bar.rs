use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::Modifier;
use ratatui::widgets::Paragraph;

use crate::tui::widgets::color::Palette;

const SEPARATOR: &str = " • ";
const ELLIPSIS: &str = "...";

pub fn render_status_bar(f: &mut Frame, area: Rect, message: Option<&str>, key_hints: &[String], palette: &Palette) {
    let max_width = area.width as usize;
    let (content, style) = match message {
        // Status messages get a highlighted background for visibility
        Some(msg) => (
            truncate(msg, max_width),
            palette.highlight().add_modifier(Modifier::BOLD),
        ),
        None => (fit_hints(key_hints, max_width), palette.normal()),
    };

    f.render_widget(Paragraph::new(content).style(style), area);
}

/// Join as many hints as fit in `max_width`, marking dropped ones with an ellipsis
pub fn fit_hints(key_hints: &[String], max_width: usize) -> String {
    let mut text = String::new();
    for (i, hint) in key_hints.iter().enumerate() {
        let current_len = text.chars().count();
        let would_be_len = if i == 0 {
            hint.chars().count()
        } else {
            current_len + SEPARATOR.chars().count() + hint.chars().count()
        };

        if would_be_len > max_width {
            if i == 0 {
                return truncate(hint, max_width);
            }
            if current_len + ELLIPSIS.len() <= max_width {
                text.push_str(ELLIPSIS);
            } else {
                text = text.chars().take(max_width.saturating_sub(ELLIPSIS.len())).collect::<String>() + ELLIPSIS;
            }
            break;
        }

        if i > 0 {
            text.push_str(SEPARATOR);
        }
        text.push_str(hint);
    }
    text
}

fn truncate(text: &str, max_width: usize) -> String {
    if text.chars().count() <= max_width {
        return text.to_string();
    }
    text.chars().take(max_width.saturating_sub(ELLIPSIS.len())).collect::<String>() + ELLIPSIS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hints_fit_or_get_an_ellipsis() {
        let hints = vec!["n: New".to_string(), "e: Edit".to_string(), "q: Quit".to_string()];
        assert_eq!(fit_hints(&hints, 80), "n: New • e: Edit • q: Quit");
        assert_eq!(fit_hints(&hints, 19), "n: New • e: Edit...");
        assert_eq!(fit_hints(&hints, 18), "n: New • e: Edi...");
        assert_eq!(fit_hints(&hints, 4), "n...");
    }
}
