use std::path::Path;

use rusqlite::types::ValueRef;
use rusqlite::{params, Row};
use serde_json::{Map, Number, Value};

use super::{CategoryLoad, ItemSource, LoadError};
use crate::db::{self, DbPool};
use crate::models::item::Item;

/// Columns stored as text whose logical type is a list or an object.
pub const STRUCTURED_FIELDS: &[&str] = &[
    "applications",
    "categories",
    "images",
    "key_points",
    "references",
    "timeline",
    "important_figures",
    "related_topics",
];

/// Deployment-specific table names tried before the generated spellings.
/// The `artists` entry matches the upper-case table of the legacy warehouse.
pub const TABLE_NAME_OVERRIDES: &[(&str, &str)] = &[("artists", "ARTISTS")];

/// Reads each category from a table in an SQLite database.
pub struct SqliteSource {
    pool: DbPool,
    label: String,
}

impl SqliteSource {
    /// Open the database at `path`. A missing file is fatal for the load.
    pub fn open(path: &Path) -> Result<Self, LoadError> {
        if !db::is_uri(path) && !path.is_file() {
            return Err(LoadError::MissingRoot(path.to_path_buf()));
        }
        let pool = db::init_pool_at(path).map_err(LoadError::Database)?;
        Ok(SqliteSource {
            pool,
            label: format!("sqlite:{}", path.display()),
        })
    }

    /// First candidate spelling that exists as a table or view.
    pub fn resolve_table(&self, category_id: &str) -> Result<Option<String>, String> {
        let conn = self.pool.get().map_err(|e| e.to_string())?;
        let mut stmt = conn
            .prepare("SELECT name FROM sqlite_master WHERE type IN ('table', 'view') AND name = ?1")
            .map_err(|e| e.to_string())?;
        for candidate in candidate_table_names(category_id) {
            let found = stmt
                .exists(params![candidate])
                .map_err(|e| e.to_string())?;
            if found {
                return Ok(Some(candidate));
            }
        }
        Ok(None)
    }
}

impl ItemSource for SqliteSource {
    fn check(&self) -> Result<(), LoadError> {
        let conn = self.pool.get().map_err(|e| LoadError::Database(e.to_string()))?;
        conn.query_row("SELECT COUNT(*) FROM sqlite_master", [], |row| row.get::<_, i64>(0))
            .map_err(|e| LoadError::Database(e.to_string()))?;
        Ok(())
    }

    fn load_category(&self, category_id: &str) -> Result<CategoryLoad, String> {
        let table = match self.resolve_table(category_id)? {
            Some(t) => t,
            None => {
                return Err(format!(
                    "No table found for category '{}' (tried {})",
                    category_id,
                    candidate_table_names(category_id).join(", ")
                ))
            }
        };

        let conn = self.pool.get().map_err(|e| e.to_string())?;
        let sql = format!("SELECT * FROM \"{}\"", table.replace('"', "\"\""));
        let mut stmt = conn.prepare(&sql).map_err(|e| e.to_string())?;
        let columns: Vec<String> = stmt
            .column_names()
            .iter()
            .map(|c| c.to_lowercase())
            .collect();

        let mut load = CategoryLoad::default();
        let mut rows = stmt.query([]).map_err(|e| e.to_string())?;
        let mut index = 0usize;
        loop {
            let row = match rows.next() {
                Ok(Some(row)) => row,
                Ok(None) => break,
                Err(e) => {
                    load.skipped.push(format!("Error reading row {} of {}: {}", index, table, e));
                    break;
                }
            };
            match row_to_record(row, &columns) {
                Ok(record) => load.items.push(Item::from_record(record)),
                Err(e) => load
                    .skipped
                    .push(format!("Skipping row {} of {}: {}", index, table, e)),
            }
            index += 1;
        }

        Ok(load)
    }

    fn describe(&self) -> String {
        self.label.clone()
    }
}

/// Spellings probed for a category's table, in order, without duplicates.
pub fn candidate_table_names(category_id: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    let mut push = |name: String| {
        if !name.is_empty() && !names.contains(&name) {
            names.push(name);
        }
    };

    for (id, table) in TABLE_NAME_OVERRIDES {
        if *id == category_id {
            push(table.to_string());
        }
    }

    let singular = category_id.strip_suffix('s').unwrap_or(category_id).to_string();
    let plural = if category_id.ends_with('s') {
        category_id.to_string()
    } else {
        format!("{}s", category_id)
    };

    for stem in [category_id.to_string(), singular, plural] {
        push(stem.clone());
        push(stem.to_uppercase());
        push(stem.to_lowercase());
        push(format!("tbl_{}", stem.to_lowercase()));
        push(format!("TBL_{}", stem.to_uppercase()));
        push(format!("{}_table", stem.to_lowercase()));
        push(format!("{}_TABLE", stem.to_uppercase()));
    }

    names
}

fn row_to_record(row: &Row, columns: &[String]) -> rusqlite::Result<Map<String, Value>> {
    let mut record = Map::new();
    for (i, name) in columns.iter().enumerate() {
        let value = match row.get_ref(i)? {
            ValueRef::Null => Value::Null,
            ValueRef::Integer(n) => Value::Number(n.into()),
            ValueRef::Real(f) => Number::from_f64(f)
                .map(Value::Number)
                .unwrap_or_else(|| Value::String(f.to_string())),
            ValueRef::Text(bytes) | ValueRef::Blob(bytes) => {
                let text = String::from_utf8_lossy(bytes).into_owned();
                if STRUCTURED_FIELDS.contains(&name.as_str()) {
                    parse_structured(&text)
                } else {
                    Value::String(text)
                }
            }
        };
        record.insert(name.clone(), value);
    }
    Ok(record)
}

/// JSON-decode a structured cell. Empty or unparseable text is kept as the raw string.
pub fn parse_structured(raw: &str) -> Value {
    if raw.trim().is_empty() {
        return Value::String(raw.to_string());
    }
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}
