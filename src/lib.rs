pub mod cli;
pub mod config;
pub mod export;
pub mod logging;
pub mod models;
pub mod store;
pub mod tui;
pub mod utils;

pub use config::{BackendKind, Config};
pub use models::{MediaStatus, Platform, Post, Status};
pub use store::{PostStore, RowRef, StoreError};
pub use utils::Profile;
