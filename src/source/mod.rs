use std::fmt;
use std::path::PathBuf;

use crate::config::{Backend, SourceConfig};
use crate::models::item::Item;

pub mod files;
pub mod sqlite;

/// Errors that stop the whole catalog load.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadError {
    /// The configured data root (directory or database file) does not exist.
    MissingRoot(PathBuf),
    /// The database exists but could not be opened or queried.
    Database(String),
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadError::MissingRoot(path) => write!(f, "Data folder not found at: {}", path.display()),
            LoadError::Database(msg) => write!(f, "Database unavailable: {}", msg),
        }
    }
}

/// Items read for one category, plus a warning per record that was dropped.
#[derive(Debug, Default)]
pub struct CategoryLoad {
    pub items: Vec<Item>,
    pub skipped: Vec<String>,
}

/// A place items come from. Every operation goes through here.
/// Implementations: `FileTreeSource` (JSON files) and `SqliteSource` (rusqlite/r2d2).
pub trait ItemSource: Send + Sync {
    /// Fails when the source as a whole is unusable.
    fn check(&self) -> Result<(), LoadError>;

    /// `Err` means the category has no backing directory or table; the caller
    /// treats that as zero items.
    fn load_category(&self, category_id: &str) -> Result<CategoryLoad, String>;

    fn describe(&self) -> String;
}

/// Build the source the configuration asks for.
pub fn create_source(config: &SourceConfig) -> Result<Box<dyn ItemSource>, LoadError> {
    match config.backend {
        Backend::Files => Ok(Box::new(files::FileTreeSource::new(&config.root))),
        Backend::Sqlite => {
            let source = sqlite::SqliteSource::open(&config.db_path)?;
            Ok(Box::new(source))
        }
    }
}
