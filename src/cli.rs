use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use std::io::Write;
use std::path::PathBuf;
use thiserror::Error;

use crate::config::{BackendKind, Config};
use crate::export::{self, ExportError, ExportFormat};
use crate::models::{MediaStatus, Platform, Post, RowError, Status};
use crate::store::{self, PostStore, RowRef, StoreError};
use crate::utils::{format_date, parse_date, today};

#[derive(Parser)]
#[command(name = "contentplanner")]
#[command(about = "Plan social media posts in a terminal content calendar")]
#[command(version)]
pub struct Cli {
    /// Custom config file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Use development mode (uses separate dev config/database)
    #[arg(long)]
    pub dev: bool,

    /// Storage backend, overriding the config file
    #[arg(long, value_enum)]
    pub backend: Option<BackendKind>,

    /// Log at debug level
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// The nine post fields as command-line options.
/// Unset options take the same defaults as the add form.
#[derive(Args, Debug, Clone, Default)]
pub struct PostArgs {
    /// Status: idea, in-progress, done
    #[arg(long)]
    pub status: Option<String>,
    /// Post caption
    #[arg(long)]
    pub caption: Option<String>,
    /// Media status: not-started, media-chosen, linked
    #[arg(long)]
    pub media_status: Option<String>,
    /// Deadline (YYYY-MM-DD), defaults to today
    #[arg(long)]
    pub deadline: Option<String>,
    /// Publish date (YYYY-MM-DD), defaults to today
    #[arg(long)]
    pub publish_date: Option<String>,
    /// Platform: instagram, tiktok, facebook, linkedin
    #[arg(long)]
    pub platform: Option<String>,
    /// Whether the post has been published (true/false)
    #[arg(long)]
    pub posted: Option<bool>,
    /// Result notes
    #[arg(long)]
    pub result: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Launch interactive TUI (default if no subcommand)
    Tui,
    /// Add a post to the calendar
    Add {
        /// Post title
        title: String,
        #[command(flatten)]
        post: PostArgs,
    },
    /// Show all posts
    List {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Show the first post with this title
    Show {
        title: String,
    },
    /// Overwrite every field of the first post with this title
    Update {
        /// Title of the post to replace
        target: String,
        /// New title (defaults to the current one)
        #[arg(long)]
        title: Option<String>,
        #[command(flatten)]
        post: PostArgs,
    },
    /// Delete the first post with this title
    Delete {
        title: String,
    },
    /// Export all posts to a spreadsheet file
    Export {
        #[arg(long, value_enum, default_value = "xlsx")]
        format: ExportFormat,
        /// Output file (defaults to the export directory from the config)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Append posts from a CSV export
    Import {
        path: PathBuf,
    },
    /// Copy the whole calendar between backends
    Sync {
        /// Replace the contents of this backend with the active one
        #[arg(long, value_enum, conflicts_with = "from", required_unless_present = "from")]
        to: Option<BackendKind>,
        /// Replace the active backend's contents with this one
        #[arg(long, value_enum)]
        from: Option<BackendKind>,
    },
}

#[derive(Debug, Error)]
pub enum CliError {
    #[error("Store error: {0}")]
    StoreError(#[from] StoreError),
    #[error("Export error: {0}")]
    ExportError(#[from] ExportError),
    #[error("Invalid field value: {0}")]
    FieldError(#[from] RowError),
    #[error("Failed to parse date: {0}")]
    DateParseError(String),
    #[error("Failed to serialize posts: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl PostArgs {
    /// Build a full post from the options, starting from `base` for unset fields
    pub fn into_post(self, title: String, base: Post) -> Result<Post, CliError> {
        let date = |value: Option<String>, fallback: NaiveDate| -> Result<NaiveDate, CliError> {
            match value {
                Some(s) => parse_date(&s).map_err(|e| {
                    CliError::DateParseError(format!("Invalid date format '{}': {}", s, e))
                }),
                None => Ok(fallback),
            }
        };

        Ok(Post {
            title,
            status: self.status.as_deref().map(str::parse::<Status>).transpose()?.unwrap_or(base.status),
            caption: self.caption.unwrap_or(base.caption),
            media_status: self
                .media_status
                .as_deref()
                .map(str::parse::<MediaStatus>)
                .transpose()?
                .unwrap_or(base.media_status),
            deadline: date(self.deadline, base.deadline)?,
            publish_date: date(self.publish_date, base.publish_date)?,
            platform: self.platform.as_deref().map(str::parse::<Platform>).transpose()?.unwrap_or(base.platform),
            posted: self.posted.unwrap_or(base.posted),
            // An explicit empty --result clears the notes
            result: match self.result {
                Some(r) if r.is_empty() => None,
                Some(r) => Some(r),
                None => base.result,
            },
        })
    }
}

/// Handle the add command
pub fn handle_add(title: String, args: PostArgs, store: &mut dyn PostStore) -> Result<(), CliError> {
    let base = Post::new(title.clone(), today());
    let post = args.into_post(title, base)?;
    store.add(post.clone())?;
    println!("Added '{}' ({} backend)", post.title, store.backend_name());
    Ok(())
}

/// Handle the list command
pub fn handle_list(json: bool, store: &dyn PostStore) -> Result<(), CliError> {
    let posts = store.list()?;
    let mut out = std::io::stdout().lock();
    if json {
        serde_json::to_writer_pretty(&mut out, &posts)?;
        writeln!(out)?;
    } else {
        write_table(&mut out, &posts)?;
    }
    Ok(())
}

/// Handle the show command
pub fn handle_show(title: &str, store: &dyn PostStore) -> Result<(), CliError> {
    let (index, post) = store.find_by_title(title)?;
    let mut out = std::io::stdout().lock();
    writeln!(out, "Row {}", index + 1)?;
    for (header, value) in crate::models::HEADERS.iter().zip(post.to_row()) {
        writeln!(out, "{:>13}: {}", header, value)?;
    }
    Ok(())
}

/// Handle the update command: the first post titled `target` is replaced wholesale.
/// Fields not given on the command line keep their current values.
pub fn handle_update(
    target: String,
    new_title: Option<String>,
    args: PostArgs,
    store: &mut dyn PostStore,
) -> Result<(), CliError> {
    let (_, current) = store.find_by_title(&target)?;
    let title = new_title.unwrap_or_else(|| current.title.clone());
    let post = args.into_post(title, current)?;
    store.update(&RowRef::Title(target.clone()), post)?;
    println!("Updated '{}'", target);
    Ok(())
}

/// Handle the delete command
pub fn handle_delete(title: String, store: &mut dyn PostStore) -> Result<(), CliError> {
    store.delete(&RowRef::Title(title.clone()))?;
    println!("Deleted '{}'", title);
    Ok(())
}

/// Handle the export command
pub fn handle_export(
    format: ExportFormat,
    output: Option<PathBuf>,
    config: &Config,
    store: &dyn PostStore,
) -> Result<(), CliError> {
    let posts = store.list()?;
    let path = output.unwrap_or_else(|| format.default_path(&config.get_export_dir()));
    export::write_file(&posts, format, &path)?;
    println!("Exported {} posts to {}", posts.len(), path.display());
    Ok(())
}

/// Handle the import command
pub fn handle_import(path: PathBuf, store: &mut dyn PostStore) -> Result<(), CliError> {
    let file = std::fs::File::open(&path)?;
    let posts = export::from_csv(file)?;
    let count = posts.len();
    for post in posts {
        store.add(post)?;
    }
    println!("Imported {} posts from {}", count, path.display());
    Ok(())
}

/// Handle the sync command
pub fn handle_sync(
    to: Option<BackendKind>,
    from: Option<BackendKind>,
    config: &Config,
    active: &mut dyn PostStore,
) -> Result<(), CliError> {
    let count = match (to, from) {
        (Some(kind), _) => {
            let mut other = store::open_store(config, kind)?;
            store::sync(&*active, other.as_mut())?
        }
        (None, Some(kind)) => {
            let other = store::open_store(config, kind)?;
            store::sync(other.as_ref(), active)?
        }
        (None, None) => 0,
    };
    println!("Synced {} posts", count);
    Ok(())
}

/// Plain-text table with one line per post
fn write_table<W: Write>(out: &mut W, posts: &[Post]) -> std::io::Result<()> {
    if posts.is_empty() {
        return writeln!(out, "No posts planned yet");
    }
    writeln!(
        out,
        "{:<4} {:<28} {:<12} {:<13} {:<10} {:<10} {:<10} {:<6}",
        "#", "Title", "Status", "Media", "Deadline", "Publish", "Platform", "Posted"
    )?;
    for (idx, post) in posts.iter().enumerate() {
        writeln!(
            out,
            "{:<4} {:<28} {:<12} {:<13} {:<10} {:<10} {:<10} {:<6}",
            idx + 1,
            truncate(&post.title, 28),
            post.status.label(),
            post.media_status.label(),
            format_date(post.deadline),
            format_date(post.publish_date),
            post.platform.label(),
            post.posted_label()
        )?;
    }
    Ok(())
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        text.chars().take(max.saturating_sub(3)).collect::<String>() + "..."
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[test]
    fn cli_args_override_form_defaults() {
        let args = PostArgs {
            status: Some("done".into()),
            platform: Some("TikTok".into()),
            deadline: Some("2025-07-01".into()),
            posted: Some(true),
            ..Default::default()
        };
        let base = Post::new("x", NaiveDate::from_ymd_opt(2025, 1, 1).unwrap());
        let post = args.into_post("Reel".into(), base).unwrap();
        assert_eq!(post.status, Status::Done);
        assert_eq!(post.platform, Platform::TikTok);
        assert_eq!(post.deadline, NaiveDate::from_ymd_opt(2025, 7, 1).unwrap());
        assert_eq!(post.publish_date, NaiveDate::from_ymd_opt(2025, 1, 1).unwrap());
        assert!(post.posted);
    }

    #[test]
    fn bad_date_is_reported() {
        let args = PostArgs {
            deadline: Some("tomorrow".into()),
            ..Default::default()
        };
        let base = Post::new("x", NaiveDate::from_ymd_opt(2025, 1, 1).unwrap());
        assert!(matches!(
            args.into_post("x".into(), base),
            Err(CliError::DateParseError(_))
        ));
    }

    #[test]
    fn update_keeps_unspecified_fields() {
        let mut store = MemoryStore::new();
        let mut original = Post::new("Launch", NaiveDate::from_ymd_opt(2025, 1, 1).unwrap());
        original.caption = "keep me".into();
        store.add(original).unwrap();

        let args = PostArgs {
            status: Some("in progress".into()),
            ..Default::default()
        };
        handle_update("Launch".into(), Some("Launch v2".into()), args, &mut store).unwrap();

        let posts = store.list().unwrap();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].title, "Launch v2");
        assert_eq!(posts[0].caption, "keep me");
        assert_eq!(posts[0].status, Status::InProgress);
    }

    #[test]
    fn table_lists_every_post() {
        let posts = vec![
            Post::new("First", NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()),
            Post::new("Second", NaiveDate::from_ymd_opt(2025, 1, 2).unwrap()),
        ];
        let mut buf = Vec::new();
        write_table(&mut buf, &posts).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text.lines().count(), 3);
        assert!(text.contains("Second"));
    }
}
