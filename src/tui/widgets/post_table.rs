use ratatui::Frame;
use ratatui::layout::{Constraint, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::Line;
use ratatui::widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState};

use crate::models::{HEADERS, MediaStatus, Post, Status};
use crate::tui::widgets::color::Palette;
use crate::utils::format_date;

const COLUMN_WIDTHS: [Constraint; 9] = [
    Constraint::Min(14),      // Title
    Constraint::Length(11),   // Status
    Constraint::Fill(2),      // Caption
    Constraint::Length(12),   // Media Status
    Constraint::Length(10),   // Deadline
    Constraint::Length(12),   // Publish Date
    Constraint::Length(9),    // Platform
    Constraint::Length(6),    // Posted
    Constraint::Fill(1),      // Result
];

fn status_marker(status: Status) -> &'static str {
    match status {
        Status::Idea => "○",
        Status::InProgress => "◐",
        Status::Done => "●",
    }
}

fn media_marker(media: MediaStatus) -> &'static str {
    match media {
        MediaStatus::NotStarted => "○",
        MediaStatus::MediaChosen => "◐",
        MediaStatus::Linked => "●",
    }
}

/// Captions can span lines; the table shows only the first
fn first_line(text: &str) -> String {
    let mut lines = text.lines();
    let first = lines.next().unwrap_or("").to_string();
    if lines.next().is_some() { format!("{} …", first) } else { first }
}

fn post_row(post: &Post) -> Row<'static> {
    Row::new(vec![
        Cell::from(post.title.clone()),
        Cell::from(format!("{} {}", status_marker(post.status), post.status.label())),
        Cell::from(first_line(&post.caption)),
        Cell::from(format!("{} {}", media_marker(post.media_status), post.media_status.label())),
        Cell::from(format_date(post.deadline)),
        Cell::from(format_date(post.publish_date)),
        Cell::from(post.platform.label()),
        Cell::from(if post.posted { "✓" } else { "" }),
        Cell::from(post.result.clone().unwrap_or_default()),
    ])
}

pub fn render_post_table(
    f: &mut Frame,
    area: Rect,
    posts: &[Post],
    table_state: &mut TableState,
    palette: &Palette,
    backend_name: &str,
) {
    let title = format!("Content planning ({}) - {} posts", backend_name, posts.len());
    let block = Block::default()
        .borders(Borders::ALL)
        .title(title)
        .style(palette.normal());

    if posts.is_empty() {
        let paragraph = Paragraph::new(vec![
            Line::from("No posts planned yet."),
            Line::from("Press the new-post key to add one."),
        ])
        .block(block);
        f.render_widget(paragraph, area);
        return;
    }

    let header = Row::new(HEADERS.iter().map(|h| Cell::from(*h)))
        .style(Style::default().add_modifier(Modifier::BOLD))
        .bottom_margin(1);
    let rows: Vec<Row> = posts.iter().map(post_row).collect();

    let table = Table::new(rows, COLUMN_WIDTHS)
        .header(header)
        .block(block)
        .column_spacing(1)
        .row_highlight_style(palette.highlight())
        .highlight_symbol("> ");

    f.render_stateful_widget(table, area, table_state);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn multi_line_caption_shows_first_line() {
        assert_eq!(first_line("Hook\nBody"), "Hook …");
        assert_eq!(first_line("Single"), "Single");
        assert_eq!(first_line(""), "");
    }
}
