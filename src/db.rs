use std::path::Path;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::OpenFlags;

pub type DbPool = Pool<SqliteConnectionManager>;

/// Open a read-only pool over a catalog database. `path` may be a plain file
/// path or a `file:` URI (used for shared in-memory databases).
pub fn init_pool_at(path: &Path) -> Result<DbPool, String> {
    let flags = OpenFlags::SQLITE_OPEN_READ_ONLY
        | OpenFlags::SQLITE_OPEN_URI
        | OpenFlags::SQLITE_OPEN_NO_MUTEX;
    let manager = SqliteConnectionManager::file(path).with_flags(flags);
    let pool = Pool::builder()
        .max_size(4)
        .build(manager)
        .map_err(|e| e.to_string())?;

    // Fail now rather than on the first category.
    let conn = pool.get().map_err(|e| e.to_string())?;
    conn.query_row("SELECT COUNT(*) FROM sqlite_master", [], |row| row.get::<_, i64>(0))
        .map_err(|e| e.to_string())?;

    Ok(pool)
}

/// Whether `path` names an in-memory or URI database rather than a file on disk.
pub fn is_uri(path: &Path) -> bool {
    path.to_str().map(|s| s.starts_with("file:")).unwrap_or(false)
}
