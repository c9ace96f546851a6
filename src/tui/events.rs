use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode, size as terminal_size,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::Rect;
use std::io;
use std::time::Duration;

use crate::export::ExportFormat;
use crate::tui::app::{Mode, PostField};
use crate::tui::error::TuiError;
use crate::tui::{App, Layout};

/// Guard that restores the terminal even on panic.
/// A terminal left in raw mode or on the alternate screen is unusable.
struct TerminalGuard {
    raw_mode_enabled: bool,
    alternate_screen_enabled: bool,
}

impl TerminalGuard {
    fn new() -> Result<Self, TuiError> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;

        Ok(Self {
            raw_mode_enabled: true,
            alternate_screen_enabled: true,
        })
    }

    /// Restore explicitly on normal exit; drop then does nothing
    fn restore(&mut self) -> Result<(), TuiError> {
        if self.raw_mode_enabled {
            disable_raw_mode()?;
            self.raw_mode_enabled = false;
        }
        if self.alternate_screen_enabled {
            execute!(io::stdout(), LeaveAlternateScreen)?;
            self.alternate_screen_enabled = false;
        }
        Ok(())
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        // Errors are ignored here, we're already in a cleanup path
        if self.raw_mode_enabled {
            let _ = disable_raw_mode();
        }
        if self.alternate_screen_enabled {
            let _ = execute!(io::stdout(), LeaveAlternateScreen);
        }
    }
}

pub fn run_event_loop(mut app: App) -> Result<(), TuiError> {
    // Check the size before entering the alternate screen so the error is readable
    let (width, height) = terminal_size()?;
    if !Layout::fits(Rect::new(0, 0, width, height)) {
        return Err(TuiError::TooSmall {
            min_width: Layout::MIN_WIDTH,
            min_height: Layout::MIN_HEIGHT,
        });
    }

    let mut guard = TerminalGuard::new()?;
    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)?;
    tracing::debug!(backend = app.store.backend_name(), posts = app.posts.len(), "tui started");

    loop {
        app.check_status_message_timeout();

        let size = terminal.size()?;
        let terminal_rect = Rect::new(0, 0, size.width, size.height);
        terminal.draw(|f| {
            let layout = Layout::calculate(terminal_rect);
            crate::tui::render::render(f, &mut app, &layout);
        })?;

        // Only Press events: Windows also reports Release
        if event::poll(Duration::from_millis(16))? {
            if let Event::Key(key_event) = event::read()? {
                if key_event.kind == KeyEventKind::Press && handle_key_event(&mut app, key_event)? {
                    break;
                }
            }
        }
    }

    guard.restore()?;
    Ok(())
}

/// Dispatch a key press for the current mode. Returns true when the app should quit.
pub fn handle_key_event(app: &mut App, key_event: KeyEvent) -> Result<bool, TuiError> {
    match app.mode {
        Mode::View => handle_view_key(app, key_event)?,
        Mode::Form => handle_form_key(app, key_event)?,
        Mode::ConfirmDelete => handle_confirm_delete_key(app, key_event)?,
        Mode::Help => {
            if key_event.code == KeyCode::Esc || app.keys.help.matches(&key_event) {
                app.toggle_help();
            }
        }
    }
    Ok(app.should_quit)
}

fn handle_view_key(app: &mut App, key_event: KeyEvent) -> Result<(), TuiError> {
    let keys = app.keys.clone();
    if keys.quit.matches(&key_event) {
        app.should_quit = true;
    } else if key_event.code == KeyCode::Up || keys.list_up.matches(&key_event) {
        app.select_previous();
    } else if key_event.code == KeyCode::Down || keys.list_down.matches(&key_event) {
        app.select_next();
    } else if keys.new.matches(&key_event) {
        app.open_add_form();
    } else if keys.edit.matches(&key_event) || key_event.code == KeyCode::Enter {
        app.open_edit_form();
    } else if keys.delete.matches(&key_event) {
        app.request_delete();
    } else if keys.export_xlsx.matches(&key_event) {
        app.export(ExportFormat::Xlsx);
    } else if keys.export_csv.matches(&key_event) {
        app.export(ExportFormat::Csv);
    } else if keys.help.matches(&key_event) {
        app.toggle_help();
    }
    Ok(())
}

fn handle_form_key(app: &mut App, key_event: KeyEvent) -> Result<(), TuiError> {
    if key_event.code == KeyCode::Esc {
        app.cancel_form();
        return Ok(());
    }
    if app.keys.save.matches(&key_event) {
        return app.save_form();
    }

    let Some(form) = app.form.as_mut() else {
        app.mode = Mode::View;
        return Ok(());
    };

    match key_event.code {
        KeyCode::Tab => form.current_field = form.current_field.next(),
        KeyCode::BackTab => form.current_field = form.current_field.prev(),
        KeyCode::Enter if form.current_field == PostField::Caption => form.caption.insert_newline(),
        KeyCode::Enter => form.current_field = form.current_field.next(),
        _ if form.current_field.is_text() => {
            let caption = form.current_field == PostField::Caption;
            // Some(true) leaves for the next field, Some(false) for the previous
            let mut leave = None;
            if let Some(editor) = form.current_editor_mut() {
                match key_event.code {
                    // Ctrl combinations other than save are not text
                    KeyCode::Char(_) if key_event.modifiers.contains(KeyModifiers::CONTROL) => {}
                    KeyCode::Char(c) => editor.insert_char(c),
                    KeyCode::Backspace => editor.delete_char(),
                    KeyCode::Delete => editor.delete_forward(),
                    KeyCode::Left => editor.move_cursor_left(),
                    KeyCode::Right => editor.move_cursor_right(),
                    KeyCode::Home => editor.move_cursor_home(),
                    KeyCode::End => editor.move_cursor_end(),
                    KeyCode::Up if !(caption && editor.move_cursor_up()) => leave = Some(false),
                    KeyCode::Down if !(caption && editor.move_cursor_down()) => leave = Some(true),
                    _ => {}
                }
            }
            match leave {
                Some(true) => form.current_field = form.current_field.next(),
                Some(false) => form.current_field = form.current_field.prev(),
                None => {}
            }
        }
        KeyCode::Left => form.cycle_choice(false),
        KeyCode::Right | KeyCode::Char(' ') => form.cycle_choice(true),
        KeyCode::Up => form.current_field = form.current_field.prev(),
        KeyCode::Down => form.current_field = form.current_field.next(),
        _ => {}
    }
    Ok(())
}

fn handle_confirm_delete_key(app: &mut App, key_event: KeyEvent) -> Result<(), TuiError> {
    match key_event.code {
        // Two options: 0 = Delete, 1 = Cancel
        KeyCode::Up | KeyCode::Down | KeyCode::Tab => app.delete_selection = 1 - app.delete_selection.min(1),
        KeyCode::Enter => app.confirm_delete()?,
        KeyCode::Char('y') | KeyCode::Char('Y') => {
            app.delete_selection = 0;
            app.confirm_delete()?;
        }
        KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
            app.delete_selection = 1;
            app.mode = Mode::View;
        }
        _ => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Config;
    use crate::models::{Platform, Post, Status};
    use crate::store::MemoryStore;
    use chrono::NaiveDate;

    fn app_with(titles: &[&str]) -> App {
        let day = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        let posts = titles.iter().map(|t| Post::new(*t, day)).collect();
        App::new(Config::default(), Box::new(MemoryStore::with_posts(posts))).unwrap()
    }

    fn press(app: &mut App, code: KeyCode) -> bool {
        handle_key_event(app, KeyEvent::new(code, KeyModifiers::NONE)).unwrap()
    }

    fn ctrl(app: &mut App, c: char) -> bool {
        handle_key_event(app, KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)).unwrap()
    }

    fn type_str(app: &mut App, text: &str) {
        for c in text.chars() {
            press(app, KeyCode::Char(c));
        }
    }

    #[test]
    fn quit_key_stops_the_loop() {
        let mut app = app_with(&[]);
        assert!(!press(&mut app, KeyCode::Char('j')));
        assert!(press(&mut app, KeyCode::Char('q')));
    }

    #[test]
    fn typing_q_in_a_form_does_not_quit() {
        let mut app = app_with(&[]);
        press(&mut app, KeyCode::Char('n'));
        assert!(!press(&mut app, KeyCode::Char('q')));
        assert_eq!(app.form.as_ref().unwrap().title.to_string(), "q");
    }

    #[test]
    fn new_post_through_the_keyboard() {
        let mut app = app_with(&["Existing"]);
        press(&mut app, KeyCode::Char('n'));
        type_str(&mut app, "Launch");
        press(&mut app, KeyCode::Tab); // Status
        press(&mut app, KeyCode::Right);
        press(&mut app, KeyCode::Tab); // Caption
        type_str(&mut app, "Line one");
        press(&mut app, KeyCode::Enter);
        type_str(&mut app, "Line two");
        ctrl(&mut app, 's');

        assert_eq!(app.mode, Mode::View);
        assert_eq!(app.posts.len(), 2);
        let added = &app.posts[1];
        assert_eq!(added.title, "Launch");
        assert_eq!(added.status, Status::InProgress);
        assert_eq!(added.caption, "Line one\nLine two");
    }

    #[test]
    fn enter_advances_single_line_fields() {
        let mut app = app_with(&[]);
        press(&mut app, KeyCode::Char('n'));
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.form.as_ref().unwrap().current_field, PostField::Status);
        press(&mut app, KeyCode::BackTab);
        assert_eq!(app.form.as_ref().unwrap().current_field, PostField::Title);
    }

    #[test]
    fn space_toggles_posted_and_cycles_platform() {
        let mut app = app_with(&["A"]);
        press(&mut app, KeyCode::Char('e'));
        app.form.as_mut().unwrap().current_field = PostField::Platform;
        press(&mut app, KeyCode::Left);
        press(&mut app, KeyCode::Tab);
        press(&mut app, KeyCode::Char(' '));
        ctrl(&mut app, 's');

        assert_eq!(app.posts[0].platform, Platform::LinkedIn);
        assert!(app.posts[0].posted);
    }

    #[test]
    fn escape_discards_the_form() {
        let mut app = app_with(&["A"]);
        press(&mut app, KeyCode::Char('e'));
        type_str(&mut app, " changed");
        press(&mut app, KeyCode::Esc);

        assert_eq!(app.mode, Mode::View);
        assert!(app.form.is_none());
        assert_eq!(app.posts[0].title, "A");
    }

    #[test]
    fn delete_flow_with_confirmation() {
        let mut app = app_with(&["A", "B"]);
        press(&mut app, KeyCode::Char('d'));
        assert_eq!(app.mode, Mode::ConfirmDelete);
        press(&mut app, KeyCode::Esc);
        assert_eq!(app.posts.len(), 2);

        press(&mut app, KeyCode::Char('d'));
        press(&mut app, KeyCode::Up); // Cancel -> Delete
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.mode, Mode::View);
        assert_eq!(app.posts.len(), 1);
        assert_eq!(app.posts[0].title, "B");
    }

    #[test]
    fn help_opens_and_closes() {
        let mut app = app_with(&[]);
        press(&mut app, KeyCode::F(1));
        assert_eq!(app.mode, Mode::Help);
        press(&mut app, KeyCode::Esc);
        assert_eq!(app.mode, Mode::View);
    }
}
