pub mod aggregation;
pub mod analysis;
pub mod catalog;
pub mod config;
pub mod dashboard;
pub mod db;
pub mod errors;
pub mod logging;
pub mod models;
pub mod persistence;

pub use analysis::{Analyzer, CommandGenerator, TextGenerator};
pub use catalog::Catalog;
pub use config::AppConfig;
pub use dashboard::Dashboard;
pub use db::{KeyValueStore, MemoryStore, SqliteStore, UnavailableStore};
pub use errors::{AppError, AppResult};
pub use models::Month;
pub use persistence::Persistence;
