use serde::Serialize;
use std::sync::OnceLock;
use std::time::Instant;

use crate::catalog::Catalog;

/// Boot instant, set once at startup via `init_uptime()`.
static BOOT_INSTANT: OnceLock<Instant> = OnceLock::new();

pub fn init_uptime() {
    let _ = BOOT_INSTANT.set(Instant::now());
}

fn uptime_secs() -> u64 {
    BOOT_INSTANT.get().map(|b| b.elapsed().as_secs()).unwrap_or(0)
}

// ── Data Structures ─────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct HealthReport {
    pub ok: bool,
    pub source: String,
    pub loaded_at: String,
    pub categories: Vec<CategoryHealth>,
    pub total_items: usize,
    pub warnings: Vec<String>,
    pub sessions: usize,
    pub uptime_secs: u64,
}

#[derive(Debug, Serialize)]
pub struct CategoryHealth {
    pub id: String,
    pub title: String,
    pub items: usize,
}

// ── Gathering ───────────────────────────────────────────────

pub fn gather(catalog: &Catalog, sessions: usize) -> HealthReport {
    HealthReport {
        ok: true,
        source: catalog.source.clone(),
        loaded_at: catalog.loaded_at.to_rfc3339(),
        categories: catalog
            .store
            .iter()
            .map(|c| CategoryHealth {
                id: c.id.clone(),
                title: c.display_title.clone(),
                items: c.item_count(),
            })
            .collect(),
        total_items: catalog.store.total_items(),
        warnings: catalog.warnings.clone(),
        sessions,
        uptime_secs: uptime_secs(),
    }
}
