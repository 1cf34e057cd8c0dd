use rocket::serde::json::Json;
use rocket::State;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::catalog::CatalogService;
use crate::config::AppConfig;
use crate::session::SessionStore;
use crate::{ai, health, maps, render};

// ── Story ──────────────────────────────────────────────

#[get("/story?<category>&<item>")]
pub async fn story(
    category: &str,
    item: &str,
    config: &State<AppConfig>,
    catalog: &State<CatalogService>,
) -> Json<Value> {
    let catalog = match catalog.current() {
        Ok(c) => c,
        Err(e) => return Json(json!({"ok": false, "error": e.to_string()})),
    };
    let (title, category_title) = match catalog.store.get(category) {
        Some(cat) => match cat.find_item(item) {
            Some(found) => (found.title.clone(), cat.display_title.clone()),
            None => return Json(json!({"ok": false, "error": format!("Unknown item '{}'", item)})),
        },
        None => {
            return Json(json!({"ok": false, "error": format!("Unknown category '{}'", category)}))
        }
    };

    let ai_config = config.ai.clone();
    let result = rocket::tokio::task::spawn_blocking(move || {
        ai::generate_story(&ai_config, &title, &category_title)
    })
    .await;

    match result {
        Ok(Ok(story)) => Json(json!({"ok": true, "story": story})),
        Ok(Err(e)) => {
            log::warn!("Story generation failed: {}", e);
            Json(json!({"ok": false, "error": e.to_string()}))
        }
        Err(e) => Json(json!({"ok": false, "error": format!("Story task failed: {}", e)})),
    }
}

// ── Map ────────────────────────────────────────────────

#[get("/map?<location>")]
pub async fn map(location: &str, config: &State<AppConfig>) -> Json<Value> {
    let maps_config = config.maps.clone();
    let location = location.to_string();
    let result =
        rocket::tokio::task::spawn_blocking(move || maps::street_views(&maps_config, &location))
            .await;

    match result {
        Ok(Ok(views)) => Json(json!({
            "ok": true,
            "views": views,
            "html": render::render_street_views(&views),
        })),
        Ok(Err(e)) => {
            log::warn!("Map lookup failed: {}", e);
            Json(json!({"ok": false, "error": e.to_string()}))
        }
        Err(e) => Json(json!({"ok": false, "error": format!("Map task failed: {}", e)})),
    }
}

// ── Catalog ────────────────────────────────────────────

#[get("/health")]
pub fn health_check(catalog: &State<CatalogService>, sessions: &State<Arc<SessionStore>>) -> Json<Value> {
    match catalog.current() {
        Ok(c) => Json(json!(health::gather(&c, sessions.len()))),
        Err(e) => Json(json!({"ok": false, "error": e.to_string()})),
    }
}

/// Drop the cached catalog and load it again from the source.
#[post("/catalog/reload")]
pub fn catalog_reload(catalog: &State<CatalogService>) -> Json<Value> {
    match catalog.reload() {
        Ok(c) => {
            log::info!("[catalog] Reloaded from {}", c.source);
            Json(json!({
                "ok": true,
                "total_items": c.store.total_items(),
                "warnings": c.warnings.len(),
            }))
        }
        Err(e) => {
            log::error!("[catalog] Reload failed: {}", e);
            Json(json!({"ok": false, "error": e.to_string()}))
        }
    }
}

pub fn routes() -> Vec<rocket::Route> {
    routes![story, map, health_check, catalog_reload]
}
