use ratatui::Frame;
use ratatui::layout::{Alignment, Rect};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};

use crate::models::Post;
use crate::tui::widgets::color::Palette;
use crate::tui::widgets::popup_area;

pub fn render_confirm_delete(f: &mut Frame, area: Rect, post: &Post, selection: usize, palette: &Palette) {
    // Calculate popup area (50% width, 35% height, centered)
    let popup_area = popup_area(area, 50, 35);

    // Clear the background first - this prevents content from showing through
    f.render_widget(Clear, popup_area);

    let mut all_lines = vec![
        Line::from(Span::styled("Delete this post?", palette.normal())),
        Line::from(""),
        Line::from(Span::styled(post.title.clone(), palette.normal())),
        Line::from(Span::styled(
            format!("{} on {}", post.status.label(), post.platform.label()),
            palette.normal(),
        )),
        Line::from(""),
    ];

    for (index, option) in ["Delete", "Cancel"].iter().enumerate() {
        let is_selected = index == selection;
        let prefix = if is_selected { "> " } else { "  " };
        let style = if is_selected { palette.highlight() } else { palette.normal() };
        all_lines.push(Line::from(Span::styled(format!("{}{}", prefix, option), style)));
    }

    all_lines.push(Line::from(""));
    all_lines.push(Line::from(Span::styled(
        "Use ↑↓ to navigate, Enter to confirm, Esc to cancel",
        palette.normal(),
    )));

    let paragraph = Paragraph::new(all_lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Confirm Delete")
                .title_alignment(Alignment::Center)
                .style(palette.normal()),
        )
        .style(palette.normal())
        .wrap(ratatui::widgets::Wrap { trim: true })
        .alignment(Alignment::Center);

    f.render_widget(paragraph, popup_area);
}
