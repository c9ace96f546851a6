use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::utils::{format_date, parse_date};

/// Column headers, in the fixed order every export and the remote sheet use
pub const HEADERS: [&str; 9] = [
    "Title",
    "Status",
    "Caption",
    "Media Status",
    "Deadline",
    "Publish Date",
    "Platform",
    "Posted",
    "Result",
];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RowError {
    #[error("Missing value for column '{0}'")]
    MissingField(&'static str),
    #[error("Invalid date '{value}' in column '{column}' (expected YYYY-MM-DD)")]
    InvalidDate { column: &'static str, value: String },
    #[error("Invalid value '{value}' in column '{column}'")]
    InvalidValue { column: &'static str, value: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    Idea,
    InProgress,
    Done,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MediaStatus {
    NotStarted,
    MediaChosen,
    Linked,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Platform {
    Instagram,
    TikTok,
    Facebook,
    LinkedIn,
}

/// Implements the label/parse plumbing shared by the three choice columns.
/// Parsing accepts the sheet label or the variant name, ignoring case and
/// separators, so "In Progress", "in-progress" and "InProgress" all match.
macro_rules! choice_enum {
    ($ty:ident, $column:literal, [$($variant:ident => $label:literal),+ $(,)?]) => {
        impl $ty {
            pub const ALL: &'static [$ty] = &[$($ty::$variant),+];

            /// Label written to spreadsheets and shown in the table
            pub fn label(&self) -> &'static str {
                match self {
                    $($ty::$variant => $label),+
                }
            }

            /// The next choice, wrapping around (used by the form to cycle values)
            pub fn next(&self) -> Self {
                let idx = Self::ALL.iter().position(|v| v == self).unwrap_or(0);
                Self::ALL[(idx + 1) % Self::ALL.len()]
            }

            /// The previous choice, wrapping around
            pub fn prev(&self) -> Self {
                let idx = Self::ALL.iter().position(|v| v == self).unwrap_or(0);
                Self::ALL[(idx + Self::ALL.len() - 1) % Self::ALL.len()]
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.label())
            }
        }

        impl FromStr for $ty {
            type Err = RowError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let wanted = normalize_choice(s);
                $(
                    if wanted == normalize_choice($label) || wanted == normalize_choice(stringify!($variant)) {
                        return Ok($ty::$variant);
                    }
                )+
                Err(RowError::InvalidValue { column: $column, value: s.to_string() })
            }
        }
    };
}

choice_enum!(Status, "Status", [
    Idea => "Idea",
    InProgress => "In Progress",
    Done => "Done",
]);

choice_enum!(MediaStatus, "Media Status", [
    NotStarted => "Not Started",
    MediaChosen => "Media Chosen",
    Linked => "Linked",
]);

choice_enum!(Platform, "Platform", [
    Instagram => "Instagram",
    TikTok => "TikTok",
    Facebook => "Facebook",
    LinkedIn => "LinkedIn",
]);

fn normalize_choice(s: &str) -> String {
    s.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(|c| c.to_lowercase())
        .collect()
}

/// One row of the content calendar
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub title: String,
    pub status: Status,
    pub caption: String,
    pub media_status: MediaStatus,
    pub deadline: NaiveDate,
    pub publish_date: NaiveDate,
    pub platform: Platform,
    pub posted: bool,
    pub result: Option<String>,
}

impl Post {
    /// Create a post with the same defaults the add form starts from:
    /// a fresh idea for Instagram, due and published on `today`
    pub fn new(title: impl Into<String>, today: NaiveDate) -> Self {
        Self {
            title: title.into(),
            status: Status::Idea,
            caption: String::new(),
            media_status: MediaStatus::NotStarted,
            deadline: today,
            publish_date: today,
            platform: Platform::Instagram,
            posted: false,
            result: None,
        }
    }

    /// Label used for the posted column
    pub fn posted_label(&self) -> &'static str {
        if self.posted { "Yes" } else { "No" }
    }

    /// Serialize to the nine spreadsheet cells, in `HEADERS` order
    pub fn to_row(&self) -> [String; 9] {
        [
            self.title.clone(),
            self.status.label().to_string(),
            self.caption.clone(),
            self.media_status.label().to_string(),
            format_date(self.deadline),
            format_date(self.publish_date),
            self.platform.label().to_string(),
            self.posted_label().to_string(),
            self.result.clone().unwrap_or_default(),
        ]
    }

    /// Parse a spreadsheet row in `HEADERS` order.
    /// Trailing cells may be missing (the sheets API drops empty trailing cells);
    /// they read as empty strings.
    pub fn from_row<S: AsRef<str>>(cells: &[S]) -> Result<Self, RowError> {
        let cell = |idx: usize| cells.get(idx).map(|c| c.as_ref().trim()).unwrap_or("");
        let required = |idx: usize| {
            let value = cell(idx);
            if value.is_empty() {
                Err(RowError::MissingField(HEADERS[idx]))
            } else {
                Ok(value)
            }
        };
        let date = |idx: usize| -> Result<NaiveDate, RowError> {
            let value = required(idx)?;
            parse_date(value).map_err(|_| RowError::InvalidDate {
                column: HEADERS[idx],
                value: value.to_string(),
            })
        };

        let result = cell(8);
        Ok(Post {
            title: required(0)?.to_string(),
            status: required(1)?.parse()?,
            caption: cells.get(2).map(|c| c.as_ref().to_string()).unwrap_or_default(),
            media_status: required(3)?.parse()?,
            deadline: date(4)?,
            publish_date: date(5)?,
            platform: required(6)?.parse()?,
            posted: parse_posted(cell(7))?,
            result: if result.is_empty() { None } else { Some(result.to_string()) },
        })
    }
}

fn parse_posted(value: &str) -> Result<bool, RowError> {
    match value.to_lowercase().as_str() {
        "yes" | "true" | "1" => Ok(true),
        // An empty posted cell means the post has not gone out yet
        "no" | "false" | "0" | "" => Ok(false),
        _ => Err(RowError::InvalidValue {
            column: "Posted",
            value: value.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn choices_parse_labels_and_variant_names() {
        assert_eq!("In Progress".parse::<Status>(), Ok(Status::InProgress));
        assert_eq!("in-progress".parse::<Status>(), Ok(Status::InProgress));
        assert_eq!("InProgress".parse::<Status>(), Ok(Status::InProgress));
        assert_eq!("media chosen".parse::<MediaStatus>(), Ok(MediaStatus::MediaChosen));
        assert_eq!("tiktok".parse::<Platform>(), Ok(Platform::TikTok));
        assert!("Twitter".parse::<Platform>().is_err());
    }

    #[test]
    fn choices_cycle_in_both_directions() {
        assert_eq!(Status::Done.next(), Status::Idea);
        assert_eq!(Status::Idea.prev(), Status::Done);
        assert_eq!(Platform::Facebook.next(), Platform::LinkedIn);
    }

    #[test]
    fn row_layout_matches_headers() {
        let mut post = Post::new("Launch", d(2025, 3, 1));
        post.caption = "Big day".into();
        post.posted = true;
        post.result = Some("1.2k likes".into());

        let row = post.to_row();
        assert_eq!(row[0], "Launch");
        assert_eq!(row[1], "Idea");
        assert_eq!(row[4], "2025-03-01");
        assert_eq!(row[7], "Yes");
        assert_eq!(row[8], "1.2k likes");
        assert_eq!(Post::from_row(&row).unwrap(), post);
    }

    #[test]
    fn short_rows_default_trailing_cells() {
        let cells = ["Teaser", "Done", "", "Linked", "2025-01-02", "2025-01-03", "Facebook"];
        let post = Post::from_row(&cells).unwrap();
        assert!(!post.posted);
        assert_eq!(post.result, None);
        assert_eq!(post.caption, "");
    }

    #[test]
    fn malformed_rows_are_rejected() {
        let bad_date = ["A", "Idea", "", "Linked", "03/01/2025", "2025-01-03", "Facebook"];
        assert!(matches!(
            Post::from_row(&bad_date),
            Err(RowError::InvalidDate { column: "Deadline", .. })
        ));

        let no_title = ["", "Idea", "", "Linked", "2025-01-02", "2025-01-03", "Facebook"];
        assert_eq!(Post::from_row(&no_title), Err(RowError::MissingField("Title")));
    }
}
