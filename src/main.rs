#[macro_use]
extern crate rocket;

use std::process;
use std::sync::Arc;

use rocket::fairing::{Fairing, Info, Kind};
use rocket::http::{ContentType, Header};
use rocket::response::content::RawHtml;
use rocket::{Build, Rocket};

mod ai;
mod boot;
mod catalog;
mod config;
mod db;
mod formatters;
mod health;
mod maps;
mod models;
mod navigation;
mod render;
mod router;
mod routes;
mod session;
mod source;
mod tasks;
mod view;

#[cfg(test)]
mod tests;

use catalog::CatalogService;
use config::AppConfig;
use session::SessionStore;

/// Pages depend on per-session state, so HTML must never be served from a cache.
pub struct NoCachePages;

#[rocket::async_trait]
impl Fairing for NoCachePages {
    fn info(&self) -> Info {
        Info { name: "No-Cache Pages", kind: Kind::Response }
    }

    async fn on_response<'r>(&self, _req: &'r rocket::Request<'_>, res: &mut rocket::Response<'r>) {
        if res.content_type() == Some(ContentType::HTML) {
            res.set_header(Header::new("Cache-Control", "no-store, no-cache, must-revalidate, max-age=0"));
            res.set_header(Header::new("Pragma", "no-cache"));
        }
    }
}

#[catch(404)]
fn not_found() -> RawHtml<String> {
    RawHtml("<html><body style='font-family:sans-serif;text-align:center;padding:80px'><h1>404</h1><p>Page not found.</p><a href='/'>← Home</a></body></html>".to_string())
}

#[catch(500)]
fn server_error() -> RawHtml<String> {
    RawHtml("<html><body style='font-family:sans-serif;text-align:center;padding:80px'><h1>500</h1><p>Internal server error.</p><a href='/'>← Home</a></body></html>".to_string())
}

/// Assemble the server around an already configured catalog.
pub fn build_rocket(config: AppConfig, catalog: CatalogService) -> Rocket<Build> {
    rocket::build()
        .manage(config)
        .manage(catalog)
        .manage(Arc::new(SessionStore::new()))
        .attach(NoCachePages)
        .attach(tasks::BackgroundTasks)
        .mount("/", routes::public::routes())
        .mount("/api", routes::api::routes())
        .register("/", catchers![not_found, server_error])
}

#[launch]
fn rocket() -> _ {
    env_logger::init();
    health::init_uptime();

    let config = match AppConfig::load() {
        Ok(c) => c,
        Err(e) => {
            log::error!("[boot] Invalid configuration: {}", e);
            process::exit(1);
        }
    };

    // Boot check: data root, categories, optional keys
    boot::run(&config);

    let catalog = CatalogService::new(config.source.clone(), config.categories.clone());
    if let Err(e) = catalog.current() {
        log::error!("[catalog] {}", e);
        process::exit(1);
    }

    build_rocket(config, catalog)
}
