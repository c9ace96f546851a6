use ratatui::widgets::TableState;
use std::time::{Duration, Instant};

use crate::Config;
use crate::export::{self, ExportFormat};
use crate::models::{MediaStatus, Platform, Post, Status};
use crate::store::{PostStore, RowRef};
use crate::tui::error::TuiError;
use crate::tui::widgets::editor::Editor;
use crate::utils::{ParsedKeyBinding, format_date, parse_date, parse_key_binding, today};

/// How long a status message stays before key hints return
const STATUS_MESSAGE_TIMEOUT: Duration = Duration::from_secs(4);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    View,
    Form,
    ConfirmDelete,
    Help,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostField {
    Title,
    Status,
    Caption,
    MediaStatus,
    Deadline,
    PublishDate,
    Platform,
    Posted,
    Result,
}

impl PostField {
    const ORDER: [PostField; 9] = [
        PostField::Title,
        PostField::Status,
        PostField::Caption,
        PostField::MediaStatus,
        PostField::Deadline,
        PostField::PublishDate,
        PostField::Platform,
        PostField::Posted,
        PostField::Result,
    ];

    pub fn next(self) -> Self {
        let idx = Self::ORDER.iter().position(|f| *f == self).unwrap_or(0);
        Self::ORDER[(idx + 1) % Self::ORDER.len()]
    }

    pub fn prev(self) -> Self {
        let idx = Self::ORDER.iter().position(|f| *f == self).unwrap_or(0);
        Self::ORDER[(idx + Self::ORDER.len() - 1) % Self::ORDER.len()]
    }

    /// Fields edited through a text editor rather than by cycling choices
    pub fn is_text(self) -> bool {
        matches!(
            self,
            PostField::Title
                | PostField::Caption
                | PostField::Deadline
                | PostField::PublishDate
                | PostField::Result
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormMode {
    Add,
    /// Editing the row at this index of the table
    Edit { index: usize },
}

/// Add/edit form. Every save submits all nine fields.
#[derive(Debug, Clone)]
pub struct PostForm {
    pub mode: FormMode,
    pub current_field: PostField,
    pub title: Editor,
    pub status: Status,
    pub caption: Editor,
    pub media_status: MediaStatus,
    pub deadline: Editor,
    pub publish_date: Editor,
    pub platform: Platform,
    pub posted: bool,
    pub result: Editor,
}

impl PostForm {
    /// Empty form with today's dates
    pub fn new_add(today: chrono::NaiveDate) -> Self {
        let mut form = Self::from_post(&Post::new("", today), FormMode::Add);
        form.title = Editor::new();
        form
    }

    /// Form prefilled from an existing post
    pub fn from_post(post: &Post, mode: FormMode) -> Self {
        Self {
            mode,
            current_field: PostField::Title,
            title: Editor::from_string(post.title.clone()),
            status: post.status,
            caption: Editor::from_string(post.caption.clone()),
            media_status: post.media_status,
            deadline: Editor::from_string(format_date(post.deadline)),
            publish_date: Editor::from_string(format_date(post.publish_date)),
            platform: post.platform,
            posted: post.posted,
            result: Editor::from_string(post.result.clone().unwrap_or_default()),
        }
    }

    /// Editor behind the current field, if it is a text field
    pub fn current_editor_mut(&mut self) -> Option<&mut Editor> {
        match self.current_field {
            PostField::Title => Some(&mut self.title),
            PostField::Caption => Some(&mut self.caption),
            PostField::Deadline => Some(&mut self.deadline),
            PostField::PublishDate => Some(&mut self.publish_date),
            PostField::Result => Some(&mut self.result),
            _ => None,
        }
    }

    /// Step a choice field forward (or backward); toggles the posted flag
    pub fn cycle_choice(&mut self, forward: bool) {
        match self.current_field {
            PostField::Status => {
                self.status = if forward { self.status.next() } else { self.status.prev() };
            }
            PostField::MediaStatus => {
                self.media_status = if forward {
                    self.media_status.next()
                } else {
                    self.media_status.prev()
                };
            }
            PostField::Platform => {
                self.platform = if forward { self.platform.next() } else { self.platform.prev() };
            }
            PostField::Posted => self.posted = !self.posted,
            _ => {}
        }
    }

    /// Validate the fields and build the post to store
    pub fn to_post(&self) -> Result<Post, String> {
        let title = self.title.to_string().trim().to_string();
        if title.is_empty() {
            return Err("Title is required".to_string());
        }
        let date = |editor: &Editor, label: &str| {
            let text = editor.to_string();
            parse_date(&text).map_err(|_| format!("{} must be YYYY-MM-DD (got '{}')", label, text.trim()))
        };
        let result = self.result.to_string().trim().to_string();

        Ok(Post {
            title,
            status: self.status,
            caption: self.caption.to_string(),
            media_status: self.media_status,
            deadline: date(&self.deadline, "Deadline")?,
            publish_date: date(&self.publish_date, "Publish date")?,
            platform: self.platform,
            posted: self.posted,
            result: if result.is_empty() { None } else { Some(result) },
        })
    }
}

/// Key bindings from the config, parsed once at startup
#[derive(Debug, Clone)]
pub struct KeyMap {
    pub quit: ParsedKeyBinding,
    pub new: ParsedKeyBinding,
    pub edit: ParsedKeyBinding,
    pub delete: ParsedKeyBinding,
    pub save: ParsedKeyBinding,
    pub help: ParsedKeyBinding,
    pub export_xlsx: ParsedKeyBinding,
    pub export_csv: ParsedKeyBinding,
    pub list_up: ParsedKeyBinding,
    pub list_down: ParsedKeyBinding,
}

impl KeyMap {
    pub fn from_config(config: &Config) -> Result<Self, TuiError> {
        let kb = &config.key_bindings;
        let parse = |name: &str, value: &str| {
            parse_key_binding(value).map_err(|e| TuiError::KeyBindingError(format!("{}: {}", name, e)))
        };
        Ok(Self {
            quit: parse("quit", &kb.quit)?,
            new: parse("new", &kb.new)?,
            edit: parse("edit", &kb.edit)?,
            delete: parse("delete", &kb.delete)?,
            save: parse("save", &kb.save)?,
            help: parse("help", &kb.help)?,
            export_xlsx: parse("export_xlsx", &kb.export_xlsx)?,
            export_csv: parse("export_csv", &kb.export_csv)?,
            list_up: parse("list_up", &kb.list_up)?,
            list_down: parse("list_down", &kb.list_down)?,
        })
    }
}

pub struct App {
    pub config: Config,
    pub keys: KeyMap,
    pub store: Box<dyn PostStore>,
    pub posts: Vec<Post>,
    pub table_state: TableState,
    pub mode: Mode,
    pub form: Option<PostForm>,
    /// 0 = Delete, 1 = Cancel
    pub delete_selection: usize,
    pub status_message: Option<String>,
    pub status_message_time: Option<Instant>,
    pub should_quit: bool,
}

impl App {
    pub fn new(config: Config, store: Box<dyn PostStore>) -> Result<Self, TuiError> {
        let keys = KeyMap::from_config(&config)?;
        let mut app = Self {
            config,
            keys,
            store,
            posts: Vec::new(),
            table_state: TableState::default(),
            mode: Mode::View,
            form: None,
            delete_selection: 1,
            status_message: None,
            status_message_time: None,
            should_quit: false,
        };
        app.reload()?;
        Ok(app)
    }

    /// Re-read the table from the store and keep the selection in range
    pub fn reload(&mut self) -> Result<(), TuiError> {
        self.posts = self.store.list()?;
        let selected = match (self.table_state.selected(), self.posts.len()) {
            (_, 0) => None,
            (Some(i), len) => Some(i.min(len - 1)),
            (None, _) => Some(0),
        };
        self.table_state.select(selected);
        Ok(())
    }

    /// Reload after a successful write. A failed read keeps the cached table
    /// and is reported in the status bar; returns whether the reload worked.
    fn refresh(&mut self, done: String) -> bool {
        match self.reload() {
            Ok(()) => {
                self.set_status_message(done);
                true
            }
            Err(e) => {
                tracing::warn!(error = %e, "reloading posts failed");
                self.set_status_message(format!("{}, but reloading failed: {}", done, e));
                false
            }
        }
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.table_state.selected().filter(|i| *i < self.posts.len())
    }

    pub fn selected_post(&self) -> Option<&Post> {
        self.selected_index().and_then(|i| self.posts.get(i))
    }

    pub fn select_next(&mut self) {
        if self.posts.is_empty() {
            return;
        }
        let next = self.selected_index().map(|i| (i + 1).min(self.posts.len() - 1)).unwrap_or(0);
        self.table_state.select(Some(next));
    }

    pub fn select_previous(&mut self) {
        if self.posts.is_empty() {
            return;
        }
        let prev = self.selected_index().map(|i| i.saturating_sub(1)).unwrap_or(0);
        self.table_state.select(Some(prev));
    }

    pub fn open_add_form(&mut self) {
        self.form = Some(PostForm::new_add(today()));
        self.mode = Mode::Form;
    }

    pub fn open_edit_form(&mut self) {
        let Some(index) = self.selected_index() else {
            self.set_status_message("Nothing selected to edit");
            return;
        };
        self.form = Some(PostForm::from_post(&self.posts[index], FormMode::Edit { index }));
        self.mode = Mode::Form;
    }

    pub fn cancel_form(&mut self) {
        self.form = None;
        self.mode = Mode::View;
    }

    /// Validate and store the form. Validation problems keep the form open;
    /// store failures are reported and the form stays open so nothing is lost.
    pub fn save_form(&mut self) -> Result<(), TuiError> {
        let (post, mode) = match self.form.as_ref().map(|f| (f.to_post(), f.mode.clone())) {
            None => return Ok(()),
            Some((Ok(post), mode)) => (post, mode),
            Some((Err(message), _)) => {
                self.set_status_message(message);
                return Ok(());
            }
        };

        let title = post.title.clone();
        let outcome = match mode {
            FormMode::Add => self.store.add(post).map(|_| "Post added"),
            FormMode::Edit { index } => self.store.update(&RowRef::Index(index), post).map(|_| "Post updated"),
        };

        match outcome {
            Ok(message) => {
                tracing::info!(title = %title, "{}", message);
                self.form = None;
                self.mode = Mode::View;
                if self.refresh(format!("{}: {}", message, title)) && mode == FormMode::Add {
                    let last = self.posts.len().checked_sub(1);
                    self.table_state.select(last);
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "saving post failed");
                self.set_status_message(format!("Save failed: {}", e));
            }
        }
        Ok(())
    }

    pub fn request_delete(&mut self) {
        if self.selected_post().is_some() {
            self.delete_selection = 1;
            self.mode = Mode::ConfirmDelete;
        } else {
            self.set_status_message("Nothing selected to delete");
        }
    }

    /// Delete the selected row if the user picked Delete
    pub fn confirm_delete(&mut self) -> Result<(), TuiError> {
        self.mode = Mode::View;
        if self.delete_selection != 0 {
            return Ok(());
        }
        let Some(index) = self.selected_index() else {
            return Ok(());
        };
        let title = self.posts[index].title.clone();
        match self.store.delete(&RowRef::Index(index)) {
            Ok(()) => {
                tracing::info!(title = %title, "post deleted");
                self.refresh(format!("Deleted: {}", title));
            }
            Err(e) => {
                tracing::warn!(error = %e, "delete failed");
                self.set_status_message(format!("Delete failed: {}", e));
            }
        }
        Ok(())
    }

    /// Write the table to the export directory
    pub fn export(&mut self, format: ExportFormat) {
        let path = format.default_path(&self.config.get_export_dir());
        match export::write_file(&self.posts, format, &path) {
            Ok(()) => self.set_status_message(format!("Exported to {}", path.display())),
            Err(e) => {
                tracing::warn!(error = %e, "export failed");
                self.set_status_message(format!("Export failed: {}", e));
            }
        }
    }

    pub fn toggle_help(&mut self) {
        self.mode = if self.mode == Mode::Help { Mode::View } else { Mode::Help };
    }

    pub fn set_status_message(&mut self, message: impl Into<String>) {
        self.status_message = Some(message.into());
        self.status_message_time = Some(Instant::now());
    }

    /// Clear the status message once it has been visible long enough
    pub fn check_status_message_timeout(&mut self) {
        if let Some(time) = self.status_message_time {
            if time.elapsed() >= STATUS_MESSAGE_TIMEOUT {
                self.status_message = None;
                self.status_message_time = None;
            }
        }
    }

    /// Key hints for the status bar in the current mode
    pub fn key_hints(&self) -> Vec<String> {
        use crate::utils::format_key_binding_for_display as show;
        let kb = &self.config.key_bindings;
        match self.mode {
            Mode::View => vec![
                format!("{}: New", show(&kb.new)),
                format!("{}: Edit", show(&kb.edit)),
                format!("{}: Delete", show(&kb.delete)),
                format!("{}: Excel", show(&kb.export_xlsx)),
                format!("{}: CSV", show(&kb.export_csv)),
                format!("{}: Help", show(&kb.help)),
                format!("{}: Quit", show(&kb.quit)),
            ],
            Mode::Form => vec![
                format!("{}: Save", show(&kb.save)),
                "Tab: Next field".to_string(),
                "←/→: Change choice".to_string(),
                "Esc: Cancel".to_string(),
            ],
            Mode::ConfirmDelete => vec![
                "↑/↓: Choose".to_string(),
                "Enter: Confirm".to_string(),
                "Esc: Cancel".to_string(),
            ],
            Mode::Help => vec![format!("{} / Esc: Close help", show(&kb.help))],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use chrono::NaiveDate;

    fn app_with(posts: Vec<Post>) -> App {
        App::new(Config::default(), Box::new(MemoryStore::with_posts(posts))).unwrap()
    }

    fn post(title: &str) -> Post {
        Post::new(title, NaiveDate::from_ymd_opt(2025, 4, 1).unwrap())
    }

    fn type_text(editor: &mut Editor, text: &str) {
        for ch in text.chars() {
            editor.insert_char(ch);
        }
    }

    #[test]
    fn add_form_appends_and_selects_new_row() {
        let mut app = app_with(vec![post("Existing")]);
        app.open_add_form();
        let form = app.form.as_mut().unwrap();
        type_text(&mut form.title, "Launch");
        form.current_field = PostField::Platform;
        form.cycle_choice(true);

        app.save_form().unwrap();

        assert_eq!(app.mode, Mode::View);
        assert_eq!(app.posts.len(), 2);
        assert_eq!(app.posts[1].title, "Launch");
        assert_eq!(app.posts[1].platform, Platform::TikTok);
        assert_eq!(app.selected_index(), Some(1));
    }

    #[test]
    fn empty_title_keeps_form_open() {
        let mut app = app_with(vec![]);
        app.open_add_form();
        app.save_form().unwrap();

        assert_eq!(app.mode, Mode::Form);
        assert!(app.posts.is_empty());
        assert_eq!(app.status_message.as_deref(), Some("Title is required"));
    }

    #[test]
    fn malformed_date_keeps_form_open() {
        let mut app = app_with(vec![post("A")]);
        app.open_edit_form();
        let form = app.form.as_mut().unwrap();
        form.deadline = Editor::from_string("31-12-2025".into());
        app.save_form().unwrap();

        assert_eq!(app.mode, Mode::Form);
        assert!(app.status_message.unwrap().contains("Deadline"));
    }

    #[test]
    fn edit_form_overwrites_selected_row_only() {
        let mut app = app_with(vec![post("Dup"), post("Dup")]);
        app.select_next();
        app.open_edit_form();
        let form = app.form.as_mut().unwrap();
        form.current_field = PostField::Posted;
        form.cycle_choice(true);
        form.result = Editor::from_string("800 views".into());
        app.save_form().unwrap();

        assert!(!app.posts[0].posted);
        assert!(app.posts[1].posted);
        assert_eq!(app.posts[1].result.as_deref(), Some("800 views"));
    }

    #[test]
    fn delete_needs_confirmation() {
        let mut app = app_with(vec![post("A"), post("B")]);
        app.request_delete();
        assert_eq!(app.mode, Mode::ConfirmDelete);
        // Cancel is preselected
        app.confirm_delete().unwrap();
        assert_eq!(app.posts.len(), 2);

        app.request_delete();
        app.delete_selection = 0;
        app.confirm_delete().unwrap();
        assert_eq!(app.posts.len(), 1);
        assert_eq!(app.posts[0].title, "B");
        assert_eq!(app.selected_index(), Some(0));
    }

    #[test]
    fn selection_stays_in_bounds() {
        let mut app = app_with(vec![post("A"), post("B")]);
        app.select_previous();
        assert_eq!(app.selected_index(), Some(0));
        app.select_next();
        app.select_next();
        assert_eq!(app.selected_index(), Some(1));
    }

    /// Store whose reads start failing once `fail_reads` is set
    struct FailingReads {
        inner: MemoryStore,
        fail_reads: std::cell::Cell<bool>,
    }

    impl PostStore for FailingReads {
        fn backend_name(&self) -> &'static str {
            "failing"
        }

        fn add(&mut self, post: Post) -> Result<(), crate::StoreError> {
            self.inner.add(post)
        }

        fn list(&self) -> Result<Vec<Post>, crate::StoreError> {
            if self.fail_reads.get() {
                return Err(crate::StoreError::NotFound("network down".into()));
            }
            self.inner.list()
        }

        fn update(&mut self, target: &RowRef, post: Post) -> Result<(), crate::StoreError> {
            self.fail_reads.set(true);
            self.inner.update(target, post)
        }

        fn delete(&mut self, target: &RowRef) -> Result<(), crate::StoreError> {
            self.fail_reads.set(true);
            self.inner.delete(target)
        }
    }

    fn app_with_failing_reads(posts: Vec<Post>) -> App {
        let store = FailingReads {
            inner: MemoryStore::with_posts(posts),
            fail_reads: std::cell::Cell::new(false),
        };
        App::new(Config::default(), Box::new(store)).unwrap()
    }

    #[test]
    fn failed_reload_after_save_keeps_the_session() {
        let mut app = app_with_failing_reads(vec![post("A")]);
        app.open_edit_form();
        app.form.as_mut().unwrap().title = Editor::from_string("B".into());

        assert!(app.save_form().is_ok());
        assert_eq!(app.mode, Mode::View);
        assert!(!app.should_quit);
        // The cached table stays on screen
        assert_eq!(app.posts[0].title, "A");
        assert!(app.status_message.as_deref().unwrap().contains("reloading failed"));
    }

    #[test]
    fn failed_reload_after_delete_keeps_the_session() {
        let mut app = app_with_failing_reads(vec![post("A"), post("B")]);
        app.request_delete();
        app.delete_selection = 0;

        assert!(app.confirm_delete().is_ok());
        assert_eq!(app.mode, Mode::View);
        assert_eq!(app.posts.len(), 2);
        assert!(app.status_message.as_deref().unwrap().starts_with("Deleted: A"));
    }

    #[test]
    fn field_order_wraps() {
        assert_eq!(PostField::Result.next(), PostField::Title);
        assert_eq!(PostField::Title.prev(), PostField::Result);
        assert!(!PostField::Status.is_text());
    }
}
