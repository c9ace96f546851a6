use ratatui::Frame;
use ratatui::layout::{Alignment, Rect};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};

use crate::Config;
use crate::tui::widgets::color::Palette;
use crate::tui::widgets::popup_area;
use crate::utils::format_key_binding_for_display as show;

pub fn render_help(f: &mut Frame, area: Rect, config: &Config, palette: &Palette) {
    // Calculate popup area (60% width, 70% height, centered)
    let popup_area = popup_area(area, 60, 70);

    // Clear the background first - this prevents content from showing through
    f.render_widget(Clear, popup_area);

    let paragraph = Paragraph::new(build_help_text(config))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Help - Key Bindings")
                .title_alignment(Alignment::Center)
                .style(palette.normal()),
        )
        .style(palette.normal())
        .wrap(ratatui::widgets::Wrap { trim: false });

    f.render_widget(paragraph, popup_area);
}

fn build_help_text(config: &Config) -> String {
    let kb = &config.key_bindings;
    let mut text = String::new();

    text.push_str("Posts:\n");
    text.push_str(&format!("  ↑ / ↓ or {} / {}: Move selection\n", show(&kb.list_up), show(&kb.list_down)));
    text.push_str(&format!("  {}: New post\n", show(&kb.new)));
    text.push_str(&format!("  {}: Edit selected post\n", show(&kb.edit)));
    text.push_str(&format!("  {}: Delete selected post\n", show(&kb.delete)));
    text.push_str(&format!("  {}: Export to Excel (.xlsx)\n", show(&kb.export_xlsx)));
    text.push_str(&format!("  {}: Export to CSV\n", show(&kb.export_csv)));
    text.push('\n');

    text.push_str("Form:\n");
    text.push_str(&format!("  {}: Save post\n", show(&kb.save)));
    text.push_str("  Tab / Shift+Tab: Next / previous field\n");
    text.push_str("  ← / → or Space: Change status, media, platform, posted\n");
    text.push_str("  Enter: Newline in caption, next field elsewhere\n");
    text.push_str("  Esc: Cancel without saving\n");
    text.push('\n');

    text.push_str("General:\n");
    text.push_str(&format!("  {}: Show/hide help\n", show(&kb.help)));
    text.push_str(&format!("  {}: Quit\n", show(&kb.quit)));

    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn help_lists_configured_bindings() {
        let mut config = Config::default();
        config.key_bindings.export_csv = "v".to_string();
        let text = build_help_text(&config);
        assert!(text.contains("v: Export to CSV"));
        assert!(text.contains("F1: Show/hide help"));
    }
}
