use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::models::category::CategoryMeta;

pub const DEFAULT_CONFIG_PATH: &str = "artcat.toml";

/// Which backend the catalog is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    Files,
    Sqlite,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    pub title: String,
    pub tagline: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        SiteConfig {
            title: "Art & Culture Explorer".to_string(),
            tagline: "Discover the rich tapestry of human creativity and cultural heritage"
                .to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub backend: Backend,
    /// Root of the JSON file tree (files backend).
    pub root: PathBuf,
    /// SQLite database file (sqlite backend).
    pub db_path: PathBuf,
    /// 0 keeps a loaded catalog for the life of the process.
    pub cache_ttl_secs: u64,
    /// Bump to force a reload under a new cache key.
    pub version: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        SourceConfig {
            backend: Backend::Files,
            root: PathBuf::from("data"),
            db_path: PathBuf::from("data/catalog.db"),
            cache_ttl_secs: 0,
            version: "1".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AiConfig {
    pub gemini_api_key: String,
    pub gemini_model: String,
    pub max_tokens: u32,
}

impl Default for AiConfig {
    fn default() -> Self {
        AiConfig {
            gemini_api_key: String::new(),
            gemini_model: "gemini-2.0-flash-exp".to_string(),
            max_tokens: 2048,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MapsConfig {
    pub api_key: String,
    pub nearby_radius: u32,
    pub nearby_limit: usize,
}

impl Default for MapsConfig {
    fn default() -> Self {
        MapsConfig {
            api_key: String::new(),
            nearby_radius: 1000,
            nearby_limit: 2,
        }
    }
}

/// Everything read from `artcat.toml`, after environment overrides.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub site: SiteConfig,
    pub source: SourceConfig,
    pub categories: Vec<CategoryMeta>,
    pub ai: AiConfig,
    pub maps: MapsConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            site: SiteConfig::default(),
            source: SourceConfig::default(),
            categories: default_categories(),
            ai: AiConfig::default(),
            maps: MapsConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load from `ARTCAT_CONFIG` or `artcat.toml`. A missing file means defaults;
    /// a file that exists but does not parse is an error.
    pub fn load() -> Result<Self, String> {
        let path = std::env::var("ARTCAT_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        let mut config = match std::fs::read_to_string(&path) {
            Ok(text) => Self::from_toml(&text).map_err(|e| format!("{}: {}", path, e))?,
            Err(_) => {
                log::info!("No {} found, using built-in defaults", path);
                AppConfig::default()
            }
        };
        config.apply_env();
        Ok(config)
    }

    pub fn from_toml(text: &str) -> Result<Self, String> {
        let mut config: AppConfig = toml::from_str(text).map_err(|e| e.to_string())?;
        if config.categories.is_empty() {
            config.categories = default_categories();
        }
        Ok(config)
    }

    fn apply_env(&mut self) {
        if let Ok(v) = std::env::var("GOOGLE_API_KEY") {
            if !v.is_empty() {
                self.ai.gemini_api_key = v;
            }
        }
        if let Ok(v) = std::env::var("GOOGLE_MAPS_API_KEY") {
            if !v.is_empty() {
                self.maps.api_key = v;
            }
        }
        if let Ok(v) = std::env::var("ARTCAT_DATA_ROOT") {
            if !v.is_empty() {
                self.source.root = PathBuf::from(v);
            }
        }
        if let Ok(v) = std::env::var("ARTCAT_DB_PATH") {
            if !v.is_empty() {
                self.source.db_path = PathBuf::from(v);
            }
        }
    }
}

/// The four collections the site ships with.
pub fn default_categories() -> Vec<CategoryMeta> {
    vec![
        CategoryMeta {
            id: "sculptures_architecture".into(),
            display_title: "Sculptures & Architecture".into(),
            display_description: "Explore the world of sculptures and architectural marvels.".into(),
            main_card_image: "https://courses.mapacademy.io/wp-content/uploads/2022/04/1024px-Konark-sun-temple-wheel-1.jpeg".into(),
        },
        CategoryMeta {
            id: "handicrafts_paintings".into(),
            display_title: "Handicrafts & Paintings".into(),
            display_description: "Discover the beauty of handicrafts and paintings.".into(),
            main_card_image: "https://en-media.thebetterindia.com/uploads/2016/06/Untitled-design-7.jpg".into(),
        },
        CategoryMeta {
            id: "performing_arts_festivals".into(),
            display_title: "Performing Arts & Festivals".into(),
            display_description: "Experience the vibrancy of performing arts and cultural festivals.".into(),
            main_card_image: "https://rajasthanyatra.in/blog/wp-content/uploads/2024/05/Festivals-of-Rajasthan.webp".into(),
        },
        CategoryMeta {
            id: "artists".into(),
            display_title: "Artists".into(),
            display_description: "Learn about the lives and works of famous artists.".into(),
            main_card_image: "https://static.standard.co.uk/s3fs-public/thumbnails/image/2019/03/05/11/sei26139543-1-0.jpg?quality=100&auto=webp&width=960".into(),
        },
    ]
}
