//! Persistence core for a blog CMS: posts, tags and categories on SQLite.
//! Services here are the only entry points that hand out classified errors.

pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::{AppConfig, ConfigError, DatabaseConfig, LoggerConfig};
pub use db::{open_db, open_db_in_memory, open_store, CancelHandle, DbError, ExecContext, Queryable};
pub use error::{classify, AppError, ErrorKind};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::post::{Post, PostId, SaveMode};
pub use model::taxonomy::{Category, CategoryId, Tag, TagId};
pub use repo::filter::{Filters, Metadata};
pub use repo::unit_of_work::run_in_transaction;
pub use repo::{
    CategoryRepository, PostRepository, RepoError, RepoResult, Repository,
    SqliteCategoryRepository, SqlitePostRepository, SqliteTagRepository, TagRepository,
};
pub use service::post_service::{NewPostRequest, PostPage, PostService, UpdatePostRequest};
pub use service::taxonomy_service::{CategoryService, TagService};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
