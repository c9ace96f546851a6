use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::Line;
use ratatui::widgets::{Block, Borders, Paragraph};

use crate::tui::app::{FormMode, PostField, PostForm};
use crate::tui::widgets::color::Palette;
use crate::tui::widgets::editor::Editor;

/// Area of each field, in `PostField` order
struct FieldAreas {
    title: Rect,
    status: Rect,
    caption: Rect,
    media_status: Rect,
    deadline: Rect,
    publish_date: Rect,
    platform: Rect,
    posted: Rect,
    result: Rect,
}

impl FieldAreas {
    /// Two columns: the text-heavy fields left, scheduling fields right
    fn calculate(area: Rect) -> Self {
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(area);

        let left = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Title
                Constraint::Length(3), // Status
                Constraint::Min(5),    // Caption (multi-line)
                Constraint::Length(3), // Media status
            ])
            .split(columns[0]);

        let right = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Deadline
                Constraint::Length(3), // Publish date
                Constraint::Length(3), // Platform
                Constraint::Length(3), // Posted
                Constraint::Length(3), // Result
                Constraint::Min(0),
            ])
            .split(columns[1]);

        Self {
            title: left[0],
            status: left[1],
            caption: left[2],
            media_status: left[3],
            deadline: right[0],
            publish_date: right[1],
            platform: right[2],
            posted: right[3],
            result: right[4],
        }
    }
}

pub fn render_post_form(f: &mut Frame, area: Rect, form: &PostForm, palette: &Palette) {
    if area.width < 4 || area.height < 4 {
        return;
    }

    let heading = match form.mode {
        FormMode::Add => "New post",
        FormMode::Edit { .. } => "Edit post",
    };
    let outer = Block::default()
        .borders(Borders::ALL)
        .title(heading)
        .style(palette.normal());
    let inner = outer.inner(area);
    f.render_widget(outer, area);

    let areas = FieldAreas::calculate(inner);
    let active_style = palette.highlight();
    let inactive_style = Style::default().fg(palette.fg).add_modifier(Modifier::DIM);
    let style_for = |field: PostField| if form.current_field == field { active_style } else { inactive_style };

    render_text_field(f, areas.title, "Title", &form.title, style_for(PostField::Title));
    render_choice_field(f, areas.status, "Status", form.status.label(), style_for(PostField::Status));
    render_text_field(f, areas.caption, "Caption", &form.caption, style_for(PostField::Caption));
    render_choice_field(
        f,
        areas.media_status,
        "Media status",
        form.media_status.label(),
        style_for(PostField::MediaStatus),
    );
    render_text_field(f, areas.deadline, "Deadline (YYYY-MM-DD)", &form.deadline, style_for(PostField::Deadline));
    render_text_field(
        f,
        areas.publish_date,
        "Publish date (YYYY-MM-DD)",
        &form.publish_date,
        style_for(PostField::PublishDate),
    );
    render_choice_field(f, areas.platform, "Platform", form.platform.label(), style_for(PostField::Platform));
    render_choice_field(
        f,
        areas.posted,
        "Posted?",
        if form.posted { "[x] Yes" } else { "[ ] No" },
        style_for(PostField::Posted),
    );
    render_text_field(f, areas.result, "Result (optional)", &form.result, style_for(PostField::Result));

    // Place the terminal cursor in the active text field
    let active = match form.current_field {
        PostField::Title => Some((areas.title, &form.title)),
        PostField::Caption => Some((areas.caption, &form.caption)),
        PostField::Deadline => Some((areas.deadline, &form.deadline)),
        PostField::PublishDate => Some((areas.publish_date, &form.publish_date)),
        PostField::Result => Some((areas.result, &form.result)),
        _ => None,
    };
    if let Some((field_area, editor)) = active {
        if let Some(position) = cursor_position(field_area, editor) {
            f.set_cursor_position(position);
        }
    }
}

/// Bordered editor showing the lines around the cursor
fn render_text_field(f: &mut Frame, area: Rect, label: &str, editor: &Editor, style: Style) {
    let height = area.height.saturating_sub(2) as usize;
    let width = area.width.saturating_sub(2) as usize;
    let v_offset = editor.scroll_offset(height);
    let h_offset = editor.horizontal_offset(width);

    let lines: Vec<Line> = editor
        .lines
        .iter()
        .skip(v_offset)
        .take(height.max(1))
        .map(|l| Line::from(l.chars().skip(h_offset).take(width).collect::<String>()))
        .collect();

    let paragraph = Paragraph::new(lines)
        .style(style)
        .block(Block::default().borders(Borders::ALL).title(label.to_string()));
    f.render_widget(paragraph, area);
}

/// Bordered single value cycled with the arrow keys
fn render_choice_field(f: &mut Frame, area: Rect, label: &str, value: &str, style: Style) {
    let paragraph = Paragraph::new(format!("◀ {} ▶", value))
        .style(style)
        .block(Block::default().borders(Borders::ALL).title(label.to_string()));
    f.render_widget(paragraph, area);
}

/// Screen position of the editor cursor inside a bordered field
fn cursor_position(area: Rect, editor: &Editor) -> Option<(u16, u16)> {
    if area.width < 3 || area.height < 3 {
        return None;
    }
    let height = area.height.saturating_sub(2) as usize;
    let width = area.width.saturating_sub(2) as usize;
    let row = editor.cursor_line.saturating_sub(editor.scroll_offset(height));
    let col = editor.cursor_col.saturating_sub(editor.horizontal_offset(width));
    Some((area.x + 1 + col as u16, area.y + 1 + row as u16))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cursor_sits_inside_the_border() {
        let editor = Editor::from_string("abc".into());
        let area = Rect::new(10, 5, 20, 3);
        assert_eq!(cursor_position(area, &editor), Some((14, 6)));
    }

    #[test]
    fn long_lines_scroll_horizontally() {
        let editor = Editor::from_string("x".repeat(40));
        let area = Rect::new(0, 0, 12, 3);
        // 10 visible columns, cursor at col 40 lands on the last one
        assert_eq!(cursor_position(area, &editor), Some((10, 1)));
    }
}
