use thiserror::Error;

use super::{normalize, same_title, PostStore, RowRef, StoreError};
use crate::models::{HEADERS, Post};

/// Sheet row 1 holds the header, and rows are 1-based, so data index `i` lives at row `i + 2`
pub const FIRST_DATA_ROW: usize = 2;

#[derive(Debug, Error)]
pub enum SheetError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] attohttpc::Error),
    #[error("Spreadsheet API returned {code}: {body}")]
    Status { code: u16, body: String },
    #[error("Spreadsheet '{0}' not found")]
    NotFound(String),
    #[error("No access token configured for the remote sheet")]
    MissingToken,
    #[error("Unexpected API response: {0}")]
    Json(#[from] serde_json::Error),
}

/// Row-level access to a remote spreadsheet.
/// Row numbers are 1-based sheet rows; each call is one round trip.
pub trait SheetClient {
    /// Every non-empty row, header included
    fn fetch_rows(&self) -> Result<Vec<Vec<String>>, SheetError>;

    fn append_row(&mut self, cells: &[String]) -> Result<(), SheetError>;

    fn update_row(&mut self, row_number: usize, cells: &[String]) -> Result<(), SheetError>;

    fn delete_row(&mut self, row_number: usize) -> Result<(), SheetError>;
}

/// Post table kept in a remote spreadsheet; rows follow the sheet's own order
pub struct SheetStore<C: SheetClient> {
    client: C,
}

impl<C: SheetClient> SheetStore<C> {
    /// Wrap a client, writing the header row if the sheet is still empty
    pub fn open(mut client: C) -> Result<Self, SheetError> {
        if client.fetch_rows()?.is_empty() {
            let header: Vec<String> = HEADERS.iter().map(|h| h.to_string()).collect();
            client.append_row(&header)?;
            tracing::info!("initialized empty sheet with header row");
        }
        Ok(Self { client })
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    fn data_rows(&self) -> Result<Vec<Vec<String>>, SheetError> {
        let mut rows = self.client.fetch_rows()?;
        if !rows.is_empty() {
            rows.remove(0);
        }
        Ok(rows)
    }

    /// Sheet row number for a reference, resolved against the current sheet contents
    fn row_number(&self, target: &RowRef) -> Result<usize, StoreError> {
        let rows = self.data_rows()?;
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
                .position(|r| r.first().is_some_and(|t| same_title(t, title)))
                .ok_or_else(|| StoreError::NotFound(title.clone()))?,
        };
        Ok(index + FIRST_DATA_ROW)
    }
}

impl<C: SheetClient> PostStore for SheetStore<C> {
    fn backend_name(&self) -> &'static str {
        "sheet"
    }

    fn add(&mut self, post: Post) -> Result<(), StoreError> {
        let post = normalize(post)?;
        self.client.append_row(&post.to_row())?;
        tracing::debug!(title = %post.title, "appended post to sheet");
        Ok(())
    }

    fn list(&self) -> Result<Vec<Post>, StoreError> {
        self.data_rows()?
            .iter()
            .enumerate()
            .map(|(row, cells)| Post::from_row(cells).map_err(|source| StoreError::Row { row, source }))
            .collect()
    }

    fn row_count(&self) -> Result<usize, StoreError> {
        Ok(self.data_rows()?.len())
    }

    fn update(&mut self, target: &RowRef, post: Post) -> Result<(), StoreError> {
        let post = normalize(post)?;
        let row_number = self.row_number(target)?;
        self.client.update_row(row_number, &post.to_row())?;
        tracing::debug!(row_number, title = %post.title, "updated sheet row");
        Ok(())
    }

    fn delete(&mut self, target: &RowRef) -> Result<(), StoreError> {
        let row_number = self.row_number(target)?;
        self.client.delete_row(row_number)?;
        tracing::debug!(row_number, "deleted sheet row");
        Ok(())
    }
}
