use rocket::form::Form;
use rocket::http::uri::Origin;
use rocket::request::FlashMessage;
use rocket::response::content::RawHtml;
use rocket::response::{Flash, Redirect};
use rocket::State;
use std::sync::Arc;

use crate::catalog::CatalogService;
use crate::config::AppConfig;
use crate::models::category::CategoryStore;
use crate::navigation::{NavError, NavigationState};
use crate::render;
use crate::router::{self, QueryParams};
use crate::session::{SessionId, SessionStore};
use crate::view::{self, Features, Notice, ViewModel};
use crate::{ai, maps};

#[derive(Responder)]
pub enum PageResponse {
    Page(RawHtml<String>),
    Redirect(Redirect),
    #[response(status = 503)]
    Unavailable(RawHtml<String>),
}

pub fn features(config: &AppConfig) -> Features {
    Features {
        story: ai::is_enabled(&config.ai),
        maps: maps::is_enabled(&config.maps),
    }
}

// ── Page ───────────────────────────────────────────────

/// The only page. Its query string decides what is shown; a query that
/// does not describe a reachable view is redirected to one that does.
#[get("/")]
pub fn index(
    uri: &Origin<'_>,
    session: SessionId,
    flash: Option<FlashMessage<'_>>,
    config: &State<AppConfig>,
    catalog: &State<CatalogService>,
    sessions: &State<Arc<SessionStore>>,
) -> PageResponse {
    let catalog = match catalog.current() {
        Ok(c) => c,
        Err(e) => {
            log::error!("[catalog] {}", e);
            let vm = ViewModel::unavailable(&config.site, e.to_string());
            return PageResponse::Unavailable(RawHtml(render::render_page(&vm)));
        }
    };

    let params = QueryParams::parse(uri.query().map(|q| q.as_str()).unwrap_or(""));
    let reconciled = router::reconcile(&params, &catalog.store);
    sessions.set(&session.0, reconciled.state.clone());

    if let Some(canonical) = reconciled.rewrite {
        return PageResponse::Redirect(Redirect::to(canonical.to_url()));
    }

    let mut vm = view::build(&reconciled.state, &catalog.store, &config.site, features(config));
    vm.notice = flash.map(|f| Notice {
        kind: f.kind().to_string(),
        message: f.message().to_string(),
    });
    vm.warnings = catalog.warnings.len();

    PageResponse::Page(RawHtml(render::render_page(&vm)))
}

// ── Navigation events ──────────────────────────────────

/// The view a navigation form was rendered on, posted as `at.page`,
/// `at.category` and `at.item`. Absent fields fall back to the session.
#[derive(FromForm, Debug)]
pub struct RenderedView {
    pub page: Option<String>,
    pub category: Option<String>,
    pub item: Option<String>,
}

impl RenderedView {
    /// The reconciled state of that view, or `None` when the form named none.
    fn state(&self, store: &CategoryStore) -> Option<NavigationState> {
        let params = QueryParams {
            page: self.page.clone(),
            category: self.category.clone(),
            item: self.item.clone(),
        }
        .normalized();
        if params.is_empty() {
            None
        } else {
            Some(router::reconcile(&params, store).state)
        }
    }
}

#[derive(FromForm)]
pub struct BackForm {
    pub at: RenderedView,
}

#[derive(FromForm)]
pub struct CategoryForm {
    pub category: String,
    pub at: RenderedView,
}

#[derive(FromForm)]
pub struct ItemForm {
    pub item: String,
    pub at: RenderedView,
}

type NavResult = Result<Redirect, Flash<Redirect>>;

/// Apply a transition to the session and answer with the resulting URL.
/// The session first moves to `origin`, the view the form was rendered on.
/// A rejected transition leaves the state alone and flashes the reason.
fn transition(
    session: &SessionId,
    sessions: &SessionStore,
    origin: Option<NavigationState>,
    apply: impl FnOnce(&mut NavigationState) -> Result<(), NavError>,
) -> NavResult {
    let (outcome, url) = sessions.update(&session.0, |state| {
        if let Some(origin) = origin {
            *state = origin;
        }
        let outcome = apply(state);
        (outcome, router::state_to_url(state))
    });
    match outcome {
        Ok(()) => Ok(Redirect::to(url)),
        Err(e) => {
            log::info!("Navigation rejected: {}", e);
            Err(Flash::error(Redirect::to(url), e.to_string()))
        }
    }
}

#[post("/nav/home")]
pub fn nav_home(session: SessionId, sessions: &State<Arc<SessionStore>>) -> NavResult {
    transition(&session, sessions, None, |state| {
        state.navigate_to_home();
        Ok(())
    })
}

#[post("/nav/category", data = "<form>")]
pub fn nav_category(
    form: Form<CategoryForm>,
    session: SessionId,
    catalog: &State<CatalogService>,
    sessions: &State<Arc<SessionStore>>,
) -> NavResult {
    let catalog = catalog.current().map_err(|e| Flash::error(Redirect::to("/"), e.to_string()))?;
    let origin = form.at.state(&catalog.store);
    transition(&session, sessions, origin, |state| {
        state.navigate_to_category(&catalog.store, &form.category)
    })
}

#[post("/nav/item", data = "<form>")]
pub fn nav_item(
    form: Form<ItemForm>,
    session: SessionId,
    catalog: &State<CatalogService>,
    sessions: &State<Arc<SessionStore>>,
) -> NavResult {
    let catalog = catalog.current().map_err(|e| Flash::error(Redirect::to("/"), e.to_string()))?;
    let origin = form.at.state(&catalog.store);
    transition(&session, sessions, origin, |state| {
        state.navigate_to_item(&catalog.store, &form.item)
    })
}

#[post("/nav/back", data = "<form>")]
pub fn nav_back(
    form: Form<BackForm>,
    session: SessionId,
    catalog: &State<CatalogService>,
    sessions: &State<Arc<SessionStore>>,
) -> NavResult {
    let catalog = catalog.current().map_err(|e| Flash::error(Redirect::to("/"), e.to_string()))?;
    let origin = form.at.state(&catalog.store);
    transition(&session, sessions, origin, |state| {
        state.back_to_category();
        Ok(())
    })
}

pub fn routes() -> Vec<rocket::Route> {
    routes![index, nav_home, nav_category, nav_item, nav_back]
}
