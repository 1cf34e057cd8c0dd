use std::fmt;

use serde::Serialize;

use crate::models::category::{Category, CategoryStore};
use crate::models::item::Item;

/// Which page a session is looking at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum View {
    #[default]
    Home,
    CategoryDetail,
    ItemDetail,
}

/// Per-session navigation state.
///
/// Invariant: `selected_item` is only set together with `selected_category`,
/// and names an item of that category. The transition methods keep it; the
/// URL reconciler builds states through the constructors below.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct NavigationState {
    pub view: View,
    pub selected_category: Option<String>,
    /// Slug of the selected item.
    pub selected_item: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavError {
    UnknownCategory(String),
    NoCategorySelected,
    UnknownItem { category: String, item: String },
}

impl fmt::Display for NavError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NavError::UnknownCategory(id) => write!(f, "Unknown category '{}'.", id),
            NavError::NoCategorySelected => {
                write!(f, "Please choose a category before opening an item.")
            }
            NavError::UnknownItem { category, item } => {
                write!(f, "No item '{}' in category '{}'.", item, category)
            }
        }
    }
}

impl NavigationState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn home() -> Self {
        Self::default()
    }

    pub fn category(id: impl Into<String>) -> Self {
        NavigationState {
            view: View::CategoryDetail,
            selected_category: Some(id.into()),
            selected_item: None,
        }
    }

    pub fn item(category: impl Into<String>, slug: impl Into<String>) -> Self {
        NavigationState {
            view: View::ItemDetail,
            selected_category: Some(category.into()),
            selected_item: Some(slug.into()),
        }
    }

    pub fn navigate_to_home(&mut self) {
        *self = Self::home();
    }

    pub fn navigate_to_category(&mut self, store: &CategoryStore, id: &str) -> Result<(), NavError> {
        if !store.contains(id) {
            return Err(NavError::UnknownCategory(id.to_string()));
        }
        *self = Self::category(id);
        Ok(())
    }

    /// Requires a selected category containing `slug`. On error the state is untouched.
    pub fn navigate_to_item(&mut self, store: &CategoryStore, slug: &str) -> Result<(), NavError> {
        let category = self
            .selected_category
            .clone()
            .ok_or(NavError::NoCategorySelected)?;
        if store.find_item(&category, slug).is_none() {
            return Err(NavError::UnknownItem {
                category,
                item: slug.to_string(),
            });
        }
        self.view = View::ItemDetail;
        self.selected_item = Some(slug.to_string());
        Ok(())
    }

    /// Back to the selected category; home when there is none.
    pub fn back_to_category(&mut self) {
        match self.selected_category.take() {
            Some(id) => *self = Self::category(id),
            None => self.navigate_to_home(),
        }
    }

    pub fn current_category<'a>(&self, store: &'a CategoryStore) -> Option<&'a Category> {
        store.get(self.selected_category.as_deref()?)
    }

    pub fn current_item<'a>(&self, store: &'a CategoryStore) -> Option<&'a Item> {
        let category = self.selected_category.as_deref()?;
        store.find_item(category, self.selected_item.as_deref()?)
    }

    /// Whether the state is one a session could legitimately be in for `store`.
    pub fn is_consistent(&self, store: &CategoryStore) -> bool {
        match self.view {
            View::Home => self.selected_category.is_none() && self.selected_item.is_none(),
            View::CategoryDetail => {
                self.current_category(store).is_some() && self.selected_item.is_none()
            }
            View::ItemDetail => self.current_item(store).is_some(),
        }
    }
}
