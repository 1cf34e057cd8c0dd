use url::form_urlencoded;

use crate::models::category::CategoryStore;
use crate::navigation::{NavigationState, View};

pub const PAGE_HOME: &str = "home";
pub const PAGE_CATEGORY: &str = "category";
pub const PAGE_ITEM: &str = "item";

/// The navigation parameters of the query string.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct QueryParams {
    pub page: Option<String>,
    pub category: Option<String>,
    pub item: Option<String>,
}

impl QueryParams {
    /// Parse a raw query string. Unknown keys are ignored; the first
    /// occurrence of a key wins.
    pub fn parse(query: &str) -> Self {
        let mut params = QueryParams::default();
        for (key, value) in form_urlencoded::parse(query.trim_start_matches('?').as_bytes()) {
            let slot = match key.as_ref() {
                "page" => &mut params.page,
                "category" => &mut params.category,
                "item" => &mut params.item,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value.into_owned());
            }
        }
        params.normalized()
    }

    /// Empty values count as absent.
    pub fn normalized(self) -> Self {
        fn keep(v: Option<String>) -> Option<String> {
            v.filter(|s| !s.is_empty())
        }
        QueryParams {
            page: keep(self.page),
            category: keep(self.category),
            item: keep(self.item),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.page.is_none() && self.category.is_none() && self.item.is_none()
    }

    /// Encoded as `page`, `category`, `item` in that order.
    pub fn to_query_string(&self) -> String {
        let mut out = form_urlencoded::Serializer::new(String::new());
        for (key, value) in [
            ("page", &self.page),
            ("category", &self.category),
            ("item", &self.item),
        ] {
            if let Some(v) = value {
                out.append_pair(key, v);
            }
        }
        out.finish()
    }

    pub fn to_url(&self) -> String {
        if self.is_empty() {
            "/".to_string()
        } else {
            format!("/?{}", self.to_query_string())
        }
    }
}

/// State → URL parameters. Home has none.
pub fn state_to_query(state: &NavigationState) -> QueryParams {
    match state.view {
        View::Home => QueryParams::default(),
        View::CategoryDetail => QueryParams {
            page: Some(PAGE_CATEGORY.to_string()),
            category: state.selected_category.clone(),
            item: None,
        },
        View::ItemDetail => QueryParams {
            page: Some(PAGE_ITEM.to_string()),
            category: state.selected_category.clone(),
            item: state.selected_item.clone(),
        },
    }
}

pub fn state_to_url(state: &NavigationState) -> String {
    state_to_query(state).to_url()
}

/// Result of reading navigation state out of a URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciled {
    pub state: NavigationState,
    /// Canonical parameters to redirect to when the request's differ.
    pub rewrite: Option<QueryParams>,
}

/// URL → state. Anything that does not name a reachable view falls back:
/// an unresolvable category goes home, an unknown item slug in a valid
/// category stays on that category.
pub fn reconcile(params: &QueryParams, store: &CategoryStore) -> Reconciled {
    let params = params.clone().normalized();
    let category = params.category.as_deref().filter(|id| store.contains(id));

    let state = match (params.page.as_deref(), category) {
        (Some(PAGE_CATEGORY), Some(id)) => NavigationState::category(id),
        (Some(PAGE_ITEM), Some(id)) => match params.item.as_deref() {
            Some(slug) if store.find_item(id, slug).is_some() => NavigationState::item(id, slug),
            Some(_) => NavigationState::category(id),
            None => NavigationState::home(),
        },
        _ => NavigationState::home(),
    };

    let canonical = state_to_query(&state);
    let rewrite = if canonical != params { Some(canonical) } else { None };
    Reconciled { state, rewrite }
}
