use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::models::item::Item;

/// Display metadata for a category, fixed at configuration time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CategoryMeta {
    pub id: String,
    pub display_title: String,
    #[serde(default)]
    pub display_description: String,
    #[serde(default)]
    pub main_card_image: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Category {
    pub id: String,
    pub display_title: String,
    pub display_description: String,
    pub main_card_image: String,
    pub items: Vec<Item>,
}

impl Category {
    pub fn from_meta(meta: &CategoryMeta, items: Vec<Item>) -> Self {
        Category {
            id: meta.id.clone(),
            display_title: meta.display_title.clone(),
            display_description: meta.display_description.clone(),
            main_card_image: meta.main_card_image.clone(),
            items,
        }
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    /// First item whose derived slug matches.
    pub fn find_item(&self, slug: &str) -> Option<&Item> {
        self.items.iter().find(|item| item.slug == slug)
    }
}

/// Read-only registry of categories, iterated in configuration order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CategoryStore {
    order: Vec<String>,
    categories: HashMap<String, Category>,
}

impl CategoryStore {
    /// Merge static metadata with loaded items. Metadata order is kept;
    /// items for ids without metadata are ignored, missing ids get no items.
    pub fn build(metas: &[CategoryMeta], mut items: HashMap<String, Vec<Item>>) -> Self {
        let mut order = Vec::with_capacity(metas.len());
        let mut categories = HashMap::with_capacity(metas.len());
        for meta in metas {
            if categories.contains_key(&meta.id) {
                log::warn!("[catalog] Duplicate category id '{}' ignored", meta.id);
                continue;
            }
            let loaded = items.remove(&meta.id).unwrap_or_default();
            order.push(meta.id.clone());
            categories.insert(meta.id.clone(), Category::from_meta(meta, loaded));
        }
        CategoryStore { order, categories }
    }

    pub fn get(&self, id: &str) -> Option<&Category> {
        self.categories.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.categories.contains_key(id)
    }

    pub fn ids(&self) -> &[String] {
        &self.order
    }

    pub fn iter(&self) -> impl Iterator<Item = &Category> {
        self.order.iter().filter_map(|id| self.categories.get(id))
    }

    pub fn find_item(&self, category_id: &str, slug: &str) -> Option<&Item> {
        self.get(category_id)?.find_item(slug)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn total_items(&self) -> usize {
        self.categories.values().map(|c| c.items.len()).sum()
    }
}
