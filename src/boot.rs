use log::{error, info, warn};
use std::path::Path;
use std::process;

use crate::config::{AppConfig, Backend};
use crate::{ai, db, maps};

/// Findings of a boot check. Any error aborts startup.
#[derive(Debug, Default)]
pub struct BootReport {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl BootReport {
    fn error(&mut self, msg: String) {
        error!("[boot]   {}", msg);
        self.errors.push(msg);
    }

    fn warn(&mut self, msg: String) {
        warn!("[boot]   {}", msg);
        self.warnings.push(msg);
    }
}

/// Inspect the configuration and the data it points at without loading anything.
pub fn check(config: &AppConfig) -> BootReport {
    let mut report = BootReport::default();

    // ── 1. Data source ─────────────────────────────────
    match config.source.backend {
        Backend::Files => {
            let root = &config.source.root;
            if !root.is_dir() {
                report.error(format!("Data folder not found at: {}", root.display()));
            } else {
                for meta in &config.categories {
                    let dir = root.join(&meta.id);
                    if !dir.is_dir() {
                        report.warn(format!(
                            "Category folder missing: {} ('{}' will be empty)",
                            dir.display(),
                            meta.display_title
                        ));
                    }
                }
            }
        }
        Backend::Sqlite => {
            let path = &config.source.db_path;
            if !db::is_uri(path) && !path.is_file() {
                report.error(format!("Database file not found at: {}", path.display()));
            }
        }
    }

    // ── 2. Categories ──────────────────────────────────
    let mut seen = std::collections::HashSet::new();
    for meta in &config.categories {
        if meta.id.trim().is_empty() {
            report.error("A configured category has an empty id".to_string());
        } else if !seen.insert(meta.id.as_str()) {
            report.warn(format!("Category '{}' is configured twice", meta.id));
        }
    }

    // ── 3. Optional integrations ───────────────────────
    if !ai::is_enabled(&config.ai) {
        report.warn("GOOGLE_API_KEY not set, story generation disabled".to_string());
    }
    if !maps::is_enabled(&config.maps) {
        report.warn("GOOGLE_MAPS_API_KEY not set, map view disabled".to_string());
    }

    // ── 4. Rocket.toml exists ──────────────────────────
    if !Path::new("Rocket.toml").exists() {
        report.warn("Rocket.toml not found, using default server config".to_string());
    }

    report
}

/// Run all boot checks. Call this before Rocket launches.
/// Exits the process when a check fails.
pub fn run(config: &AppConfig) {
    info!("[boot] Art & Culture catalog boot check starting...");

    let report = check(config);

    if !report.errors.is_empty() {
        error!(
            "[boot] Boot check FAILED: {} error(s), {} warning(s). Aborting.",
            report.errors.len(),
            report.warnings.len()
        );
        process::exit(1);
    }

    if report.warnings.is_empty() {
        info!("[boot] Boot check passed. All systems go.");
    } else {
        warn!(
            "[boot] Boot check passed with {} warning(s). Some features may not work correctly.",
            report.warnings.len()
        );
    }
}
