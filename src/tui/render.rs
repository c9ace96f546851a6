use ratatui::Frame;
use ratatui::layout::Alignment;
use ratatui::widgets::{Block, Borders};

use crate::tui::app::Mode;
use crate::tui::widgets::{
    color::Palette, confirm_delete::render_confirm_delete, form::render_post_form,
    help::render_help, post_table::render_post_table, status_bar::render_status_bar,
};
use crate::tui::{App, Layout};

pub fn render(f: &mut Frame, app: &mut App, layout: &Layout) {
    let palette = Palette::from_theme(&app.config.theme);

    // Outer border with the app name centered in the top border
    let outer_block = Block::default()
        .borders(Borders::ALL)
        .title("Content Planner")
        .title_alignment(Alignment::Center)
        .style(palette.normal());
    f.render_widget(outer_block, f.area());

    // The table stays underneath the popups; the form replaces it
    match (&app.mode, &app.form) {
        (Mode::Form, Some(form)) => render_post_form(f, layout.main_area, form, &palette),
        _ => {
            let backend = app.store.backend_name();
            render_post_table(f, layout.main_area, &app.posts, &mut app.table_state, &palette, backend);
        }
    }

    if app.mode == Mode::ConfirmDelete {
        if let Some(post) = app.selected_post() {
            render_confirm_delete(f, f.area(), post, app.delete_selection, &palette);
        }
    }

    if app.mode == Mode::Help {
        render_help(f, f.area(), &app.config, &palette);
    }

    let key_hints = app.key_hints();
    render_status_bar(f, layout.status_area, app.status_message.as_deref(), &key_hints, &palette);
}
