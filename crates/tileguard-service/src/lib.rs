//! Plumbing around the tileguard-core reconciliation engine:
//! - [`config`] — YAML configuration
//! - [`repository`] — pattern loading from a watched directory
//! - [`fetch`] — tile retrieval from the remote tile server
//! - [`notify`] — webhook delivery of defacement notifications
//! - [`watcher`] — the single-worker loop tying the stages together

pub mod config;
pub mod fetch;
pub mod notify;
pub mod repository;
pub mod watcher;

pub use config::{Config, ConfigError};
pub use fetch::{FetchError, HttpTileFetcher, TileFetcher};
pub use notify::{NotificationDispatcher, WebhookDispatcher};
pub use repository::{DirectoryRepository, PatternRepository, RepositoryError};
pub use watcher::Watcher;
