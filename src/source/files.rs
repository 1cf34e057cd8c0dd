use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;
use walkdir::WalkDir;

use super::{CategoryLoad, ItemSource, LoadError};
use crate::models::item::Item;

/// Reads `<root>/<category_id>/**/*.json`, one item per file.
pub struct FileTreeSource {
    root: PathBuf,
}

impl FileTreeSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        FileTreeSource { root: root.into() }
    }
}

impl ItemSource for FileTreeSource {
    fn check(&self) -> Result<(), LoadError> {
        if self.root.is_dir() {
            Ok(())
        } else {
            Err(LoadError::MissingRoot(self.root.clone()))
        }
    }

    fn load_category(&self, category_id: &str) -> Result<CategoryLoad, String> {
        let dir = self.root.join(category_id);
        if !dir.is_dir() {
            return Err(format!(
                "Category folder '{}' not found at {}",
                category_id,
                dir.display()
            ));
        }

        let mut load = CategoryLoad::default();
        let walker = WalkDir::new(&dir).follow_links(false).sort_by_file_name();

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    load.skipped.push(format!("Error accessing entry: {}", e));
                    continue;
                }
            };
            if !entry.file_type().is_file() || !is_json_file(entry.path()) {
                continue;
            }
            match read_item(entry.path()) {
                Ok(item) => load.items.push(item),
                Err(e) => load.skipped.push(e),
            }
        }

        Ok(load)
    }

    fn describe(&self) -> String {
        format!("files:{}", self.root.display())
    }
}

fn is_json_file(path: &Path) -> bool {
    path.extension().map(|ext| ext == "json").unwrap_or(false)
}

fn read_item(path: &Path) -> Result<Item, String> {
    let text = fs::read_to_string(path)
        .map_err(|e| format!("Error loading {}: {}", path.display(), e))?;
    let value: Value = serde_json::from_str(&text)
        .map_err(|e| format!("Invalid JSON in {}: {}", path.display(), e))?;
    Item::from_json(value).map_err(|e| format!("Invalid record in {}: {}", path.display(), e))
}
