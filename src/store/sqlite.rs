use rusqlite::Connection;
use std::path::Path;

use super::{normalize, same_title, PostStore, RowRef, StoreError};
use crate::models::Post;
use crate::utils::now_timestamp;

/// Post table persisted in a local SQLite file
pub struct SqliteStore {
    conn: Connection,
}

/// A posts row as stored, before the text columns are parsed back into a Post
struct StoredRow {
    id: i64,
    cells: [String; 9],
}

impl SqliteStore {
    /// Open (or create) the database file and initialize the schema
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        // Create parent directory if it doesn't exist
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| StoreError::Directory(e.to_string()))?;
            }
        }

        let conn = Connection::open(path)?;
        let store = SqliteStore { conn };
        store.initialize_schema()?;
        tracing::debug!(path = %path.display(), "opened sqlite store");
        Ok(store)
    }

    /// In-memory database, mostly useful for tests
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let store = SqliteStore {
            conn: Connection::open_in_memory()?,
        };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Initialize the database schema (table and indexes)
    fn initialize_schema(&self) -> Result<(), StoreError> {
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS posts (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                position        INTEGER NOT NULL,
                title           TEXT NOT NULL,
                status          TEXT NOT NULL,
                caption         TEXT NOT NULL DEFAULT '',
                media_status    TEXT NOT NULL,
                deadline        TEXT NOT NULL,
                publish_date    TEXT NOT NULL,
                platform        TEXT NOT NULL,
                posted          INTEGER NOT NULL DEFAULT 0,
                result          TEXT,
                created_at      TEXT NOT NULL,
                updated_at      TEXT NOT NULL
            )",
            [],
        )?;

        self.conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_posts_position ON posts(position)",
            [],
        )?;

        self.conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_posts_title ON posts(title)",
            [],
        )?;

        Ok(())
    }

    /// Rows in table order with their ids
    fn stored_rows(&self) -> Result<Vec<StoredRow>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, title, status, caption, media_status, deadline, publish_date, platform, posted, result
             FROM posts ORDER BY position ASC, id ASC",
        )?;
        let rows = stmt
            .query_map([], |row| {
                let posted: i64 = row.get(8)?;
                let result: Option<String> = row.get(9)?;
                Ok(StoredRow {
                    id: row.get(0)?,
                    cells: [
                        row.get(1)?,
                        row.get(2)?,
                        row.get(3)?,
                        row.get(4)?,
                        row.get(5)?,
                        row.get(6)?,
                        row.get(7)?,
                        if posted != 0 { "Yes".to_string() } else { "No".to_string() },
                        result.unwrap_or_default(),
                    ],
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn parse_rows(rows: Vec<StoredRow>) -> Result<Vec<Post>, StoreError> {
        rows.into_iter()
            .enumerate()
            .map(|(row, stored)| {
                Post::from_row(&stored.cells).map_err(|source| StoreError::Row { row, source })
            })
            .collect()
    }

    /// Id of the row a reference points at
    fn resolve_id(&self, target: &RowRef) -> Result<i64, StoreError> {
        let rows = self.stored_rows()?;
        let index = match target {
            RowRef::Index(i) if *i < rows.len() => *i,
            RowRef::Index(i) => {
                return Err(StoreError::IndexOutOfRange {
                    index: *i,
                    len: rows.len(),
                });
            }
            RowRef::Title(title) => rows
                .iter()
                .position(|r| same_title(&r.cells[0], title))
                .ok_or_else(|| StoreError::NotFound(title.clone()))?,
        };
        Ok(rows[index].id)
    }

    fn next_position(&self) -> Result<i64, StoreError> {
        let max: Option<i64> = self
            .conn
            .query_row("SELECT MAX(position) FROM posts", [], |row| row.get(0))?;
        Ok(max.map(|m| m + 1).unwrap_or(0))
    }
}

impl PostStore for SqliteStore {
    fn backend_name(&self) -> &'static str {
        "sqlite"
    }

    fn add(&mut self, post: Post) -> Result<(), StoreError> {
        let post = normalize(post)?;
        let position = self.next_position()?;
        let now = now_timestamp();
        let row = post.to_row();
        self.conn.execute(
            "INSERT INTO posts (position, title, status, caption, media_status, deadline, publish_date, platform, posted, result, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            rusqlite::params![
                position,
                row[0],
                row[1],
                row[2],
                row[3],
                row[4],
                row[5],
                row[6],
                if post.posted { 1 } else { 0 },
                post.result,
                now,
                now
            ],
        )?;
        tracing::debug!(title = %post.title, position, "inserted post");
        Ok(())
    }

    fn list(&self) -> Result<Vec<Post>, StoreError> {
        Self::parse_rows(self.stored_rows()?)
    }

    fn row_count(&self) -> Result<usize, StoreError> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM posts", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    fn update(&mut self, target: &RowRef, post: Post) -> Result<(), StoreError> {
        let post = normalize(post)?;
        let id = self.resolve_id(target)?;
        let row = post.to_row();
        self.conn.execute(
            "UPDATE posts SET title = ?1, status = ?2, caption = ?3, media_status = ?4, deadline = ?5,
                 publish_date = ?6, platform = ?7, posted = ?8, result = ?9, updated_at = ?10
             WHERE id = ?11",
            rusqlite::params![
                row[0],
                row[1],
                row[2],
                row[3],
                row[4],
                row[5],
                row[6],
                if post.posted { 1 } else { 0 },
                post.result,
                now_timestamp(),
                id
            ],
        )?;
        tracing::debug!(id, title = %post.title, "updated post");
        Ok(())
    }

    fn delete(&mut self, target: &RowRef) -> Result<(), StoreError> {
        let id = self.resolve_id(target)?;
        self.conn
            .execute("DELETE FROM posts WHERE id = ?1", rusqlite::params![id])?;
        tracing::debug!(id, "deleted post");
        Ok(())
    }
}
