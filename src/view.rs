use crate::config::SiteConfig;
use crate::models::category::{Category, CategoryStore};
use crate::models::item::Item;
use crate::navigation::{NavigationState, View};

/// Which optional panels the item page may offer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Features {
    pub story: bool,
    pub maps: bool,
}

/// One-shot message shown above the page body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: String,
    pub message: String,
}

#[derive(Debug)]
pub enum Page<'a> {
    Home {
        categories: Vec<&'a Category>,
    },
    Category {
        category: &'a Category,
    },
    Item {
        category: &'a Category,
        item: &'a Item,
    },
    /// The catalog could not be loaded at all.
    Unavailable {
        message: String,
    },
}

/// Everything the renderer needs for one response.
#[derive(Debug)]
pub struct ViewModel<'a> {
    pub site: &'a SiteConfig,
    pub page: Page<'a>,
    pub notice: Option<Notice>,
    pub features: Features,
    /// Number of skipped categories or records in the current catalog.
    pub warnings: usize,
}

impl<'a> ViewModel<'a> {
    pub fn unavailable(site: &'a SiteConfig, message: impl Into<String>) -> Self {
        ViewModel {
            site,
            page: Page::Unavailable {
                message: message.into(),
            },
            notice: None,
            features: Features::default(),
            warnings: 0,
        }
    }

    pub fn title(&self) -> String {
        match &self.page {
            Page::Home { .. } | Page::Unavailable { .. } => self.site.title.clone(),
            Page::Category { category } => {
                format!("{} · {}", category.display_title, self.site.title)
            }
            Page::Item { item, .. } => format!("{} · {}", item.title, self.site.title),
        }
    }
}

/// Resolve a navigation state against the catalog. A state that no longer
/// resolves (the catalog changed under the session) is shown as home.
pub fn build<'a>(
    state: &NavigationState,
    store: &'a CategoryStore,
    site: &'a SiteConfig,
    features: Features,
) -> ViewModel<'a> {
    let resolved = if state.is_consistent(store) {
        match state.view {
            View::CategoryDetail => state
                .current_category(store)
                .map(|category| Page::Category { category }),
            View::ItemDetail => state
                .current_category(store)
                .zip(state.current_item(store))
                .map(|(category, item)| Page::Item { category, item }),
            View::Home => None,
        }
    } else {
        log::debug!("Stale navigation state {:?}, showing home", state);
        None
    };

    let page = resolved.unwrap_or_else(|| Page::Home {
        categories: store.iter().collect(),
    });

    ViewModel {
        site,
        page,
        notice: None,
        features,
        warnings: 0,
    }
}
