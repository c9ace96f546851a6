//! Storage for the content calendar.
//!
//! Every backend keeps posts as an ordered table and implements [`PostStore`];
//! callers hold a `Box<dyn PostStore>` and never care which one is active.

pub mod memory;
pub mod sheet;
pub mod sqlite;
pub mod google;

use thiserror::Error;

use crate::config::{BackendKind, Config};
use crate::models::{Post, RowError};

pub use memory::MemoryStore;
pub use sheet::{SheetClient, SheetError, SheetStore};
pub use sqlite::SqliteStore;
pub use google::GoogleSheetsClient;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Title must not be empty")]
    EmptyTitle,
    #[error("No post titled '{0}'")]
    NotFound(String),
    #[error("Row {index} is out of range (table has {len} rows)")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("SQLite error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("Spreadsheet error: {0}")]
    Sheet(#[from] SheetError),
    #[error("Malformed stored row {row}: {source}")]
    Row { row: usize, source: RowError },
    #[error("Failed to create database directory: {0}")]
    Directory(String),
}

/// Identifies the row an update or delete applies to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowRef {
    /// 0-based position in `list()` order
    Index(usize),
    /// First post whose title matches exactly
    Title(String),
}

impl RowRef {
    pub fn title(title: impl Into<String>) -> Self {
        RowRef::Title(title.into())
    }

    /// Resolve to a 0-based index against the current table contents
    pub fn resolve(&self, posts: &[Post]) -> Result<usize, StoreError> {
        match self {
            RowRef::Index(index) => {
                if *index < posts.len() {
                    Ok(*index)
                } else {
                    Err(StoreError::IndexOutOfRange {
                        index: *index,
                        len: posts.len(),
                    })
                }
            }
            RowRef::Title(title) => posts
                .iter()
                .position(|p| same_title(&p.title, title))
                .ok_or_else(|| StoreError::NotFound(title.clone())),
        }
    }
}

/// Ordered table of posts with full-row CRUD
pub trait PostStore {
    /// Short backend label for logs and the status line
    fn backend_name(&self) -> &'static str;

    /// Append a post at the end of the table
    fn add(&mut self, post: Post) -> Result<(), StoreError>;

    /// All posts in table order
    fn list(&self) -> Result<Vec<Post>, StoreError>;

    /// Number of rows, counted without parsing them
    fn row_count(&self) -> Result<usize, StoreError> {
        Ok(self.list()?.len())
    }

    /// Overwrite every field of the target row
    fn update(&mut self, target: &RowRef, post: Post) -> Result<(), StoreError>;

    /// Remove the target row
    fn delete(&mut self, target: &RowRef) -> Result<(), StoreError>;

    /// First post with the given title, together with its index
    fn find_by_title(&self, title: &str) -> Result<(usize, Post), StoreError> {
        self.list()?
            .into_iter()
            .enumerate()
            .find(|(_, p)| same_title(&p.title, title))
            .ok_or_else(|| StoreError::NotFound(title.to_string()))
    }
}

/// Titles are the lookup key, so an empty one is refused by every backend.
/// Surrounding whitespace is dropped and a blank result becomes `None`, so a
/// post reads back the same from every backend.
pub(crate) fn normalize(mut post: Post) -> Result<Post, StoreError> {
    post.title = post.title.trim().to_string();
    if post.title.is_empty() {
        return Err(StoreError::EmptyTitle);
    }
    post.result = post
        .result
        .map(|r| r.trim().to_string())
        .filter(|r| !r.is_empty());
    Ok(post)
}

/// Title comparison shared by every lookup; stored cells may carry stray spaces
pub(crate) fn same_title(stored: &str, wanted: &str) -> bool {
    stored.trim() == wanted.trim()
}

/// Build the backend selected by `kind`
pub fn open_store(config: &Config, kind: BackendKind) -> Result<Box<dyn PostStore>, StoreError> {
    tracing::debug!(backend = kind.as_str(), "opening store");
    let store: Box<dyn PostStore> = match kind {
        BackendKind::Memory => Box::new(MemoryStore::new()),
        BackendKind::Sqlite => Box::new(SqliteStore::open(&config.get_database_path())?),
        BackendKind::Sheet => {
            let token = config.resolve_sheet_token().ok_or(SheetError::MissingToken)?;
            let client = GoogleSheetsClient::connect(&config.sheet, token)?;
            Box::new(SheetStore::open(client)?)
        }
    };
    Ok(store)
}

/// Replace the contents of `to` with the posts of `from`, keeping their order.
/// Returns the number of posts copied.
pub fn sync(from: &dyn PostStore, to: &mut dyn PostStore) -> Result<usize, StoreError> {
    let posts = from.list()?;
    // Stale target rows may not parse, so only count them
    let existing = to.row_count()?;
    tracing::info!(
        from = from.backend_name(),
        to = to.backend_name(),
        removing = existing,
        copying = posts.len(),
        "syncing stores"
    );

    // Delete from the end so row numbers of the remaining rows stay put
    for index in (0..existing).rev() {
        to.delete(&RowRef::Index(index))?;
    }
    let count = posts.len();
    for post in posts {
        to.add(post)?;
    }
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn post(title: &str) -> Post {
        Post::new(title, NaiveDate::from_ymd_opt(2025, 5, 1).unwrap())
    }

    #[test]
    fn row_ref_resolves_first_matching_title() {
        let posts = vec![post("a"), post("b"), post("a")];
        assert_eq!(RowRef::title("a").resolve(&posts).unwrap(), 0);
        assert_eq!(RowRef::title("b").resolve(&posts).unwrap(), 1);
        assert!(matches!(
            RowRef::title("zzz").resolve(&posts),
            Err(StoreError::NotFound(_))
        ));
        assert!(matches!(
            RowRef::Index(3).resolve(&posts),
            Err(StoreError::IndexOutOfRange { index: 3, len: 3 })
        ));
    }

    #[test]
    fn normalize_trims_title_and_blank_result() {
        let mut padded = post("  Launch ");
        padded.result = Some("  ".into());
        let clean = normalize(padded).unwrap();
        assert_eq!(clean.title, "Launch");
        assert_eq!(clean.result, None);
        assert!(matches!(normalize(post(" \t")), Err(StoreError::EmptyTitle)));
    }

    #[test]
    fn sync_replaces_target_contents_in_order() {
        let mut source = MemoryStore::new();
        source.add(post("one")).unwrap();
        source.add(post("two")).unwrap();

        let mut target = MemoryStore::new();
        target.add(post("stale")).unwrap();

        let copied = sync(&source, &mut target).unwrap();
        assert_eq!(copied, 2);
        let titles: Vec<_> = target.list().unwrap().into_iter().map(|p| p.title).collect();
        assert_eq!(titles, vec!["one", "two"]);
    }
}
