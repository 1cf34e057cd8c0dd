#![cfg(test)]

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rocket::http::{ContentType, Status};
use rocket::local::blocking::Client;
use serde_json::json;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::ai;
use crate::boot;
use crate::catalog::{load_catalog, CacheKey, CatalogCache, CatalogService};
use crate::config::{AppConfig, Backend, MapsConfig, SourceConfig};
use crate::db::DbPool;
use crate::formatters::{format_dimensions, format_list_items, format_section_title, title_case};
use crate::health;
use crate::maps;
use crate::models::category::{CategoryMeta, CategoryStore};
use crate::models::item::{classify_section, derive_slug, FieldValue, Item, SectionKind, DEFAULT_TITLE};
use crate::navigation::{NavError, NavigationState, View};
use crate::render::{self, html_escape};
use crate::router::{self, QueryParams, PAGE_HOME};
use crate::session::SessionStore;
use crate::source::files::FileTreeSource;
use crate::source::sqlite::{self, candidate_table_names, SqliteSource};
use crate::source::{ItemSource, LoadError};
use crate::view::{self, Features, Page};

/// Atomic counter for unique shared-cache DB names and temp dirs so parallel tests don't collide.
static TEST_COUNTER: AtomicU64 = AtomicU64::new(0);

fn next_id() -> u64 {
    TEST_COUNTER.fetch_add(1, Ordering::SeqCst)
}

/// Fresh empty directory under the system temp dir.
fn temp_root() -> PathBuf {
    let dir = std::env::temp_dir().join(format!("artcat_test_{}_{}", std::process::id(), next_id()));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();
    dir
}

fn write_file(root: &Path, rel: &str, contents: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

/// Named shared-cache in-memory SQLite pool so every connection sees the same tables.
fn test_pool(uri: &str) -> DbPool {
    let manager = SqliteConnectionManager::file(uri);
    Pool::builder()
        .max_size(2)
        .build(manager)
        .expect("Failed to create test pool")
}

/// Runs `sql` against a fresh shared-cache database and opens a read-only
/// source over it. The returned pool keeps the database alive.
fn sqlite_fixture(sql: &str) -> (DbPool, SqliteSource) {
    let uri = format!("file:artcat_testdb_{}?mode=memory&cache=shared", next_id());
    let pool = test_pool(&uri);
    pool.get().unwrap().execute_batch(sql).unwrap();
    let source = SqliteSource::open(Path::new(&uri)).expect("open shared-cache database");
    (pool, source)
}

fn meta(id: &str, title: &str) -> CategoryMeta {
    CategoryMeta {
        id: id.to_string(),
        display_title: title.to_string(),
        display_description: format!("All about {}", title.to_lowercase()),
        main_card_image: format!("https://img.example/{}.jpg", id),
    }
}

fn test_metas() -> Vec<CategoryMeta> {
    vec![meta("paintings", "Paintings"), meta("artists", "Artists")]
}

fn item(value: serde_json::Value) -> Item {
    Item::from_json(value).unwrap()
}

/// `paintings` with three items, `artists` empty.
fn test_store() -> CategoryStore {
    let mut items = HashMap::new();
    items.insert(
        "paintings".to_string(),
        vec![
            item(json!({"id": "mona_lisa", "title": "Mona Lisa", "description": "A portrait."})),
            item(json!({"title": "The Starry Night", "images": ["a.jpg", "b.jpg"]})),
            item(json!({"title": "Water Lilies", "features": ["Series of about 250 paintings"]})),
        ],
    );
    CategoryStore::build(&test_metas(), items)
}

/// A data tree matching `test_store()` on disk.
fn test_tree() -> PathBuf {
    let root = temp_root();
    write_file(&root, "paintings/mona_lisa.json", r#"{"id": "mona_lisa", "title": "Mona Lisa", "description": "A portrait."}"#);
    write_file(&root, "paintings/starry.json", r#"{"title": "The Starry Night", "images": ["a.jpg", "b.jpg"]}"#);
    write_file(&root, "paintings/nested/lilies.json", r#"{"title": "Water Lilies"}"#);
    fs::create_dir_all(root.join("artists")).unwrap();
    root
}

// ═══════════════════════════════════════════════════════════
// Items & field normalization
// ═══════════════════════════════════════════════════════════

#[test]
fn item_missing_title_gets_default() {
    let it = item(json!({"description": "no title here"}));
    assert_eq!(it.title, DEFAULT_TITLE);
    let blank = item(json!({"title": "   "}));
    assert_eq!(blank.title, DEFAULT_TITLE);
}

#[test]
fn item_non_object_is_rejected() {
    assert!(Item::from_json(json!([1, 2, 3])).is_err());
    assert!(Item::from_json(json!("just a string")).is_err());
    assert!(Item::from_json(json!(null)).is_err());
}

#[test]
fn item_images_accepts_list_or_single_string() {
    let list = item(json!({"images": ["a.jpg", "", 3, "b.jpg"]}));
    assert_eq!(list.images, vec!["a.jpg", "b.jpg"]);
    let single = item(json!({"images": "only.jpg"}));
    assert_eq!(single.images, vec!["only.jpg"]);
    let other = item(json!({"images": {"src": "x.jpg"}}));
    assert!(other.images.is_empty());
}

#[test]
fn field_value_coercion() {
    assert_eq!(FieldValue::from_json(&json!(null)), None);
    assert_eq!(FieldValue::from_json(&json!("x")), Some(FieldValue::Text("x".into())));
    assert_eq!(FieldValue::from_json(&json!(42)), Some(FieldValue::Text("42".into())));
    assert_eq!(FieldValue::from_json(&json!(true)), Some(FieldValue::Text("true".into())));
    assert_eq!(
        FieldValue::from_json(&json!(["a", 1, null, {"k": "v"}])),
        Some(FieldValue::List(vec!["a".into(), "1".into(), r#"{"k":"v"}"#.into()]))
    );
    assert_eq!(
        FieldValue::from_json(&json!({"height": "30 m", "floors": 3})),
        Some(FieldValue::KeyValue(vec![
            ("height".into(), "30 m".into()),
            ("floors".into(), "3".into()),
        ]))
    );
}

#[test]
fn item_fields_keep_record_order_and_reserved_keys() {
    let it = item(json!({
        "title": "T",
        "zeta": "z",
        "alpha": "a",
        "references": ["r1"],
        "images": ["i.jpg"]
    }));
    let keys: Vec<&str> = it.fields.iter().map(|(k, _)| k.as_str()).collect();
    assert_eq!(keys, vec!["zeta", "alpha", "references"]);
    assert!(it.field("references").is_some());
    assert!(it.field("title").is_none());
}

#[test]
fn slug_prefers_id_then_title() {
    assert_eq!(derive_slug(Some("mona_lisa"), "Whatever"), "mona_lisa");
    assert_eq!(derive_slug(None, "The Starry Night"), "the_starry_night");
    assert_eq!(derive_slug(Some(""), "Water Lilies"), "water_lilies");
    assert_eq!(derive_slug(None, "!!!"), "item");

    let numeric = item(json!({"id": 7, "title": "Seven"}));
    assert_eq!(numeric.slug, "7");
    let zero = item(json!({"id": 0, "title": "Zero Id"}));
    assert_eq!(zero.slug, "zero_id");
}

#[test]
fn slug_drops_punctuation_from_titles() {
    assert_eq!(derive_slug(None, "St. Mary's Church"), "st_marys_church");
    assert_eq!(derive_slug(None, "Mother-and-Child"), "mother_and_child");
    assert_eq!(derive_slug(None, "Tanjore (Thanjavur) Painting!"), "tanjore_thanjavur_painting");
    assert_eq!(derive_slug(None, "Café  Noir"), "café__noir");
}

#[test]
fn slug_is_deterministic() {
    let a = item(json!({"title": "Konark Sun Temple"}));
    let b = item(json!({"title": "Konark Sun Temple"}));
    assert_eq!(a.slug, b.slug);
}

#[test]
fn sections_classify_and_order() {
    let it = item(json!({
        "title": "T",
        "history": "old",
        "materials": "stone",
        "description": "first",
        "notable_works": ["a", "b"],
        "dimensions": {"height": "2 m"},
        "empty_text": "",
        "empty_list": [],
        "generated_at": "2024-01-01",
        "references": ["x"]
    }));
    let sections = it.sections();
    let priority: Vec<&str> = sections.priority.iter().map(|(k, _)| *k).collect();
    assert_eq!(priority, vec!["description", "history"]);
    let lists: Vec<&str> = sections.lists.iter().map(|(k, _)| *k).collect();
    assert_eq!(lists, vec!["notable_works"]);
    let other: Vec<&str> = sections.other.iter().map(|(k, _)| *k).collect();
    assert_eq!(other, vec!["materials", "dimensions"]);
}

#[test]
fn list_under_priority_name_is_a_list_section() {
    assert_eq!(
        classify_section("description", &FieldValue::List(vec!["a".into()])),
        SectionKind::List
    );
    assert_eq!(
        classify_section("description", &FieldValue::Text("a".into())),
        SectionKind::Priority
    );
    assert_eq!(
        classify_section("era", &FieldValue::KeyValue(vec![])),
        SectionKind::Other
    );
}

#[test]
fn preview_falls_back_through_fields() {
    let long = "x".repeat(200);
    let it = item(json!({"title": "T", "summary": long}));
    let preview = it.preview();
    assert_eq!(preview.chars().count(), 123);
    assert!(preview.ends_with("..."));

    let listed = item(json!({"title": "T", "highlights": ["Tribal dances"]}));
    assert_eq!(listed.preview(), "Tribal dances");

    let bare = item(json!({"title": "T"}));
    assert!(bare.preview().starts_with("Click to explore"));
}

// ═══════════════════════════════════════════════════════════
// File-tree source
// ═══════════════════════════════════════════════════════════

#[test]
fn files_malformed_json_is_skipped() {
    let root = temp_root();
    write_file(&root, "paintings/a.json", r#"{"title": "A"}"#);
    write_file(&root, "paintings/b.json", r#"{"title": "B"}"#);
    write_file(&root, "paintings/c.json", r#"{"title": "C""#);
    write_file(&root, "paintings/d.json", r#"["not", "an", "object"]"#);

    let source = FileTreeSource::new(&root);
    let load = source.load_category("paintings").unwrap();
    assert_eq!(load.items.len(), 2);
    assert_eq!(load.skipped.len(), 2);
    assert!(load.skipped.iter().any(|s| s.contains("Invalid JSON")));
}

#[test]
fn files_walk_is_recursive_sorted_and_json_only() {
    let root = temp_root();
    write_file(&root, "paintings/b.json", r#"{"title": "B"}"#);
    write_file(&root, "paintings/a.json", r#"{"title": "A"}"#);
    write_file(&root, "paintings/sub/c.json", r#"{"title": "C"}"#);
    write_file(&root, "paintings/notes.txt", "ignore me");
    write_file(&root, "paintings/readme.JSONX", "{}");

    let source = FileTreeSource::new(&root);
    let load = source.load_category("paintings").unwrap();
    let titles: Vec<&str> = load.items.iter().map(|i| i.title.as_str()).collect();
    assert_eq!(titles, vec!["A", "B", "C"]);
    assert!(load.skipped.is_empty());
}

#[test]
fn files_missing_category_folder_is_an_error_for_that_category() {
    let root = temp_root();
    let source = FileTreeSource::new(&root);
    assert!(source.check().is_ok());
    let err = source.load_category("ghosts").unwrap_err();
    assert!(err.contains("ghosts"));
}

#[test]
fn files_missing_root_is_fatal() {
    let root = temp_root().join("does_not_exist");
    let source = FileTreeSource::new(&root);
    assert_eq!(source.check(), Err(LoadError::MissingRoot(root.clone())));
    let err = load_catalog(&source, &test_metas()).unwrap_err();
    assert!(err.to_string().starts_with("Data folder not found at:"));
}

#[test]
fn load_catalog_keeps_config_order_and_warns() {
    let root = temp_root();
    write_file(&root, "artists/frida.json", r#"{"title": "Frida Kahlo"}"#);
    write_file(&root, "artists/broken.json", "{");
    let metas = vec![meta("paintings", "Paintings"), meta("artists", "Artists")];

    let catalog = load_catalog(&FileTreeSource::new(&root), &metas).unwrap();
    assert_eq!(catalog.store.ids(), &["paintings".to_string(), "artists".to_string()]);
    assert_eq!(catalog.store.get("paintings").unwrap().item_count(), 0);
    assert_eq!(catalog.store.get("artists").unwrap().item_count(), 1);
    // one for the missing folder, one for the broken file
    assert_eq!(catalog.warnings.len(), 2);
}

#[test]
fn load_catalog_is_deterministic() {
    let root = test_tree();
    let source = FileTreeSource::new(&root);
    let a = load_catalog(&source, &test_metas()).unwrap();
    let b = load_catalog(&source, &test_metas()).unwrap();
    let items_a: Vec<&Item> = a.store.iter().flat_map(|c| c.items.iter()).collect();
    let items_b: Vec<&Item> = b.store.iter().flat_map(|c| c.items.iter()).collect();
    assert_eq!(items_a, items_b);
}

// ═══════════════════════════════════════════════════════════
// SQLite source
// ═══════════════════════════════════════════════════════════

#[test]
fn sqlite_structured_columns_are_parsed() {
    let (_pool, source) = sqlite_fixture(
        "CREATE TABLE paintings (ID TEXT, Title TEXT, key_points TEXT, timeline TEXT, images TEXT, era TEXT);
         INSERT INTO paintings VALUES ('p1', 'Guernica', '[]', 'not json', '[\"g.jpg\"]', '[1937]');
         INSERT INTO paintings VALUES ('p2', NULL, '', '{\"1937\": \"painted\"}', NULL, 'modern');",
    );

    let load = source.load_category("paintings").unwrap();
    assert_eq!(load.items.len(), 2);

    let guernica = &load.items[0];
    assert_eq!(guernica.title, "Guernica");
    assert_eq!(guernica.slug, "p1");
    assert_eq!(guernica.field("key_points"), Some(&FieldValue::List(vec![])));
    assert_eq!(guernica.field("timeline"), Some(&FieldValue::Text("not json".into())));
    assert_eq!(guernica.images, vec!["g.jpg"]);
    // not in the structured set, stays a string
    assert_eq!(guernica.field("era"), Some(&FieldValue::Text("[1937]".into())));

    let untitled = &load.items[1];
    assert_eq!(untitled.title, DEFAULT_TITLE);
    assert_eq!(untitled.field("key_points"), Some(&FieldValue::Text(String::new())));
    assert_eq!(
        untitled.field("timeline"),
        Some(&FieldValue::KeyValue(vec![("1937".into(), "painted".into())]))
    );
}

#[test]
fn sqlite_parse_structured_never_fails() {
    assert_eq!(sqlite::parse_structured("[]"), json!([]));
    assert_eq!(sqlite::parse_structured(""), json!(""));
    assert_eq!(sqlite::parse_structured("[oops"), json!("[oops"));
}

#[test]
fn sqlite_artists_maps_to_upper_case_table() {
    let (_pool, source) = sqlite_fixture(
        "CREATE TABLE ARTISTS (title TEXT);
         INSERT INTO ARTISTS VALUES ('Raja Ravi Varma');",
    );
    assert_eq!(candidate_table_names("artists")[0], "ARTISTS");

    assert_eq!(source.resolve_table("artists").unwrap(), Some("ARTISTS".to_string()));
    let load = source.load_category("artists").unwrap();
    assert_eq!(load.items.len(), 1);
    assert_eq!(load.items[0].title, "Raja Ravi Varma");
}

#[test]
fn sqlite_probes_table_spellings() {
    let names = candidate_table_names("sculptures");
    for expected in ["sculptures", "SCULPTURES", "sculpture", "tbl_sculpture", "sculptures_table"] {
        assert!(names.contains(&expected.to_string()), "missing {}", expected);
    }
    let mut dedup = names.clone();
    dedup.dedup();
    assert_eq!(names.len(), dedup.len());

    let (_pool, source) = sqlite_fixture("CREATE TABLE tbl_sculpture (title TEXT);");
    assert_eq!(source.resolve_table("sculptures").unwrap(), Some("tbl_sculpture".to_string()));
}

#[test]
fn sqlite_missing_table_is_an_error_for_that_category() {
    let (_pool, source) = sqlite_fixture("");
    assert!(source.check().is_ok());
    let err = source.load_category("festivals").unwrap_err();
    assert!(err.contains("festivals"));
}

#[test]
fn sqlite_open_missing_file_is_fatal() {
    let path = temp_root().join("nope.db");
    match SqliteSource::open(&path) {
        Err(LoadError::MissingRoot(p)) => assert_eq!(p, path),
        Err(e) => panic!("unexpected error: {}", e),
        Ok(_) => panic!("opened a missing database"),
    }
}

#[test]
fn sqlite_open_reads_a_database_file() {
    let path = temp_root().join("catalog.db");
    {
        let conn = rusqlite::Connection::open(&path).unwrap();
        conn.execute_batch(
            "CREATE TABLE paintings (title TEXT, description TEXT);
             INSERT INTO paintings VALUES ('Sunflowers', 'Still life');",
        )
        .unwrap();
    }
    let source = SqliteSource::open(&path).unwrap();
    let catalog = load_catalog(&source, &test_metas()).unwrap();
    assert_eq!(catalog.store.get("paintings").unwrap().item_count(), 1);
    // no artists table
    assert_eq!(catalog.warnings.len(), 1);
}

// ═══════════════════════════════════════════════════════════
// Catalog cache
// ═══════════════════════════════════════════════════════════

fn cache_key(root: &Path) -> CacheKey {
    CacheKey {
        source: SourceConfig {
            root: root.to_path_buf(),
            ..SourceConfig::default()
        },
        categories: test_metas(),
    }
}

#[test]
fn cache_loads_once_per_key() {
    let root = test_tree();
    let cache = CatalogCache::new();
    let key = cache_key(&root);
    let loads = AtomicUsize::new(0);
    let load = || {
        loads.fetch_add(1, Ordering::SeqCst);
        load_catalog(&FileTreeSource::new(&root), &test_metas())
    };

    let a = cache.get_or_load(&key, None, load).unwrap();
    let b = cache
        .get_or_load(&key, None, || {
            loads.fetch_add(1, Ordering::SeqCst);
            load_catalog(&FileTreeSource::new(&root), &test_metas())
        })
        .unwrap();
    assert!(Arc::ptr_eq(&a, &b));
    assert_eq!(loads.load(Ordering::SeqCst), 1);

    let mut other = key.clone();
    other.source.version = "2".into();
    cache
        .get_or_load(&other, None, || {
            loads.fetch_add(1, Ordering::SeqCst);
            load_catalog(&FileTreeSource::new(&root), &test_metas())
        })
        .unwrap();
    assert_eq!(loads.load(Ordering::SeqCst), 2);
    assert!(cache.invalidate(&key));
    assert!(cache.invalidate(&other));
}

#[test]
fn cache_concurrent_callers_share_one_load() {
    let root = test_tree();
    let cache = Arc::new(CatalogCache::new());
    let loads = Arc::new(AtomicUsize::new(0));
    let key = cache_key(&root);

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let cache = Arc::clone(&cache);
            let loads = Arc::clone(&loads);
            let key = key.clone();
            let root = root.clone();
            std::thread::spawn(move || {
                cache
                    .get_or_load(&key, None, || {
                        loads.fetch_add(1, Ordering::SeqCst);
                        load_catalog(&FileTreeSource::new(&root), &test_metas())
                    })
                    .map(|c| c.store.total_items())
            })
        })
        .collect();

    for h in handles {
        assert_eq!(h.join().unwrap().unwrap(), 3);
    }
    assert_eq!(loads.load(Ordering::SeqCst), 1);
}

#[test]
fn cache_expired_entry_reloads_and_failures_are_not_cached() {
    let root = test_tree();
    let cache = CatalogCache::new();
    let key = cache_key(&root);
    let loads = AtomicUsize::new(0);
    let counted = || {
        loads.fetch_add(1, Ordering::SeqCst);
        load_catalog(&FileTreeSource::new(&root), &test_metas())
    };

    cache.get_or_load(&key, Some(Duration::ZERO), counted).unwrap();
    cache
        .get_or_load(&key, Some(Duration::ZERO), || {
            loads.fetch_add(1, Ordering::SeqCst);
            load_catalog(&FileTreeSource::new(&root), &test_metas())
        })
        .unwrap();
    assert_eq!(loads.load(Ordering::SeqCst), 2);

    let missing = cache_key(&root.join("missing"));
    assert!(cache
        .get_or_load(&missing, None, || load_catalog(&FileTreeSource::new(root.join("missing")), &test_metas()))
        .is_err());
    assert!(!cache.invalidate(&missing));
}

#[test]
fn catalog_service_reload_picks_up_new_files() {
    let root = test_tree();
    let service = CatalogService::new(
        SourceConfig {
            root: root.clone(),
            ..SourceConfig::default()
        },
        test_metas(),
    );
    assert_eq!(service.current().unwrap().store.total_items(), 3);

    write_file(&root, "artists/frida.json", r#"{"title": "Frida Kahlo"}"#);
    assert_eq!(service.current().unwrap().store.total_items(), 3);
    assert_eq!(service.reload().unwrap().store.total_items(), 4);
}

// ═══════════════════════════════════════════════════════════
// Navigation
// ═══════════════════════════════════════════════════════════

#[test]
fn nav_starts_home() {
    let state = NavigationState::new();
    assert_eq!(state.view, View::Home);
    assert_eq!(state.selected_category, None);
    assert_eq!(state.selected_item, None);
}

#[test]
fn nav_to_category() {
    let store = test_store();
    let mut state = NavigationState::new();
    state.navigate_to_category(&store, "paintings").unwrap();
    assert_eq!(state, NavigationState::category("paintings"));
    assert!(state.is_consistent(&store));
}

#[test]
fn nav_unknown_category_leaves_state() {
    let store = test_store();
    let mut state = NavigationState::category("artists");
    let err = state.navigate_to_category(&store, "sculpture").unwrap_err();
    assert_eq!(err, NavError::UnknownCategory("sculpture".into()));
    assert_eq!(state, NavigationState::category("artists"));
}

#[test]
fn nav_item_requires_category() {
    let store = test_store();
    let mut state = NavigationState::new();
    assert_eq!(state.navigate_to_item(&store, "mona_lisa"), Err(NavError::NoCategorySelected));
    assert_eq!(state, NavigationState::home());
}

#[test]
fn nav_item_must_belong_to_category() {
    let store = test_store();
    let mut state = NavigationState::category("artists");
    let err = state.navigate_to_item(&store, "mona_lisa").unwrap_err();
    assert!(matches!(err, NavError::UnknownItem { .. }));
    assert_eq!(state, NavigationState::category("artists"));
}

#[test]
fn nav_item_then_sibling_then_back() {
    let store = test_store();
    let mut state = NavigationState::new();
    state.navigate_to_category(&store, "paintings").unwrap();
    state.navigate_to_item(&store, "mona_lisa").unwrap();
    assert_eq!(state, NavigationState::item("paintings", "mona_lisa"));
    assert_eq!(state.current_item(&store).unwrap().title, "Mona Lisa");

    state.navigate_to_item(&store, "water_lilies").unwrap();
    assert_eq!(state.selected_item.as_deref(), Some("water_lilies"));

    state.back_to_category();
    assert_eq!(state, NavigationState::category("paintings"));
}

#[test]
fn nav_back_without_category_goes_home() {
    let mut state = NavigationState::new();
    state.back_to_category();
    assert_eq!(state, NavigationState::home());
}

#[test]
fn duplicate_slugs_resolve_to_first_item() {
    let mut items = HashMap::new();
    items.insert(
        "paintings".to_string(),
        vec![
            item(json!({"title": "Untitled Study", "medium": "oil"})),
            item(json!({"title": "Untitled Study", "medium": "charcoal"})),
        ],
    );
    let store = CategoryStore::build(&test_metas(), items);
    let category = store.get("paintings").unwrap();
    assert_eq!(category.items[0].slug, category.items[1].slug);

    let found = store.find_item("paintings", "untitled_study").unwrap();
    assert_eq!(found.field("medium"), Some(&FieldValue::Text("oil".into())));

    let mut state = NavigationState::category("paintings");
    state.navigate_to_item(&store, &category.items[1].slug).unwrap();
    let reconciled = router::reconcile(&router::state_to_query(&state), &store);
    let shown = reconciled.state.current_item(&store).unwrap();
    assert_eq!(shown.field("medium"), Some(&FieldValue::Text("oil".into())));
}

#[test]
fn nav_home_clears_everything() {
    let mut state = NavigationState::item("paintings", "mona_lisa");
    state.navigate_to_home();
    assert_eq!(state, NavigationState::home());
}

// ═══════════════════════════════════════════════════════════
// URL router
// ═══════════════════════════════════════════════════════════

#[test]
fn query_string_order_and_encoding() {
    let params = QueryParams {
        page: Some("item".into()),
        category: Some("paintings".into()),
        item: Some("a b&c".into()),
    };
    assert_eq!(params.to_url(), "/?page=item&category=paintings&item=a+b%26c");
    assert_eq!(QueryParams::parse(&params.to_query_string()), params);
    assert_eq!(QueryParams::default().to_url(), "/");
}

#[test]
fn query_parse_ignores_unknown_and_empty() {
    let params = QueryParams::parse("?utm=1&page=category&category=&category=x");
    assert_eq!(params.page.as_deref(), Some("category"));
    assert_eq!(params.category, None);
    assert!(QueryParams::parse("").is_empty());
}

#[test]
fn state_to_url_per_view() {
    assert_eq!(router::state_to_url(&NavigationState::home()), "/");
    assert_eq!(
        router::state_to_url(&NavigationState::category("artists")),
        "/?page=category&category=artists"
    );
    assert_eq!(
        router::state_to_url(&NavigationState::item("paintings", "mona_lisa")),
        "/?page=item&category=paintings&item=mona_lisa"
    );
}

#[test]
fn url_round_trip_for_every_item() {
    let store = test_store();
    for category in store.iter() {
        for it in &category.items {
            let mut state = NavigationState::new();
            state.navigate_to_category(&store, &category.id).unwrap();
            state.navigate_to_item(&store, &it.slug).unwrap();

            let url = router::state_to_url(&state);
            let query = url.trim_start_matches("/?");
            let reconciled = router::reconcile(&QueryParams::parse(query), &store);
            assert_eq!(reconciled.state, state);
            assert_eq!(reconciled.rewrite, None);
        }
    }
}

#[test]
fn reconcile_unknown_item_falls_back_to_category() {
    let store = test_store();
    let reconciled = router::reconcile(&QueryParams::parse("page=item&category=paintings&item=nope"), &store);
    assert_eq!(reconciled.state, NavigationState::category("paintings"));
    assert_eq!(
        reconciled.rewrite.map(|q| q.to_url()),
        Some("/?page=category&category=paintings".to_string())
    );
}

#[test]
fn reconcile_invalid_inputs_go_home() {
    let store = test_store();
    for query in [
        "page=category&category=unknown",
        "page=category",
        "page=item&category=paintings",
        "page=item&item=mona_lisa",
        "page=gallery&category=paintings",
        "category=paintings",
    ] {
        let reconciled = router::reconcile(&QueryParams::parse(query), &store);
        assert_eq!(reconciled.state, NavigationState::home(), "{}", query);
        assert_eq!(reconciled.rewrite, Some(QueryParams::default()), "{}", query);
    }
}

#[test]
fn reconcile_empty_query_is_home_without_rewrite() {
    let store = test_store();
    let reconciled = router::reconcile(&QueryParams::default(), &store);
    assert_eq!(reconciled.state, NavigationState::home());
    assert_eq!(reconciled.rewrite, None);

    let explicit = router::reconcile(&QueryParams::parse(&format!("page={}", PAGE_HOME)), &store);
    assert_eq!(explicit.state, NavigationState::home());
    assert_eq!(explicit.rewrite, Some(QueryParams::default()));
}

#[test]
fn canonical_url_is_a_fixed_point() {
    let store = test_store();
    for query in [
        "page=item&category=paintings&item=nope",
        "page=category&category=zzz",
        "page=item&category=paintings&item=the_starry_night&extra=1",
    ] {
        let first = router::reconcile(&QueryParams::parse(query), &store);
        let canonical = router::state_to_query(&first.state);
        let second = router::reconcile(&canonical, &store);
        assert_eq!(second.state, first.state);
        assert_eq!(second.rewrite, None, "{}", query);
    }
}

// ═══════════════════════════════════════════════════════════
// Sessions
// ═══════════════════════════════════════════════════════════

#[test]
fn session_store_tracks_state_per_id() {
    let store = test_store();
    let sessions = SessionStore::new();
    let snapshot = |id: &str| sessions.update(id, |state| state.clone());
    assert_eq!(snapshot("a"), NavigationState::home());

    let result = sessions.update("a", |state| state.navigate_to_category(&store, "paintings"));
    assert!(result.is_ok());
    assert_eq!(snapshot("a"), NavigationState::category("paintings"));
    assert_eq!(snapshot("b"), NavigationState::home());

    sessions.set("b", NavigationState::item("paintings", "mona_lisa"));
    assert_eq!(snapshot("b"), NavigationState::item("paintings", "mona_lisa"));
    assert_eq!(sessions.len(), 2);
    sessions.cleanup(Duration::from_secs(3600));
    assert_eq!(sessions.len(), 2);
    sessions.cleanup(Duration::ZERO);
    assert_eq!(sessions.len(), 0);
}

// ═══════════════════════════════════════════════════════════
// View & rendering
// ═══════════════════════════════════════════════════════════

#[test]
fn view_falls_back_home_for_stale_state() {
    let store = test_store();
    let site = AppConfig::default().site;
    let vm = view::build(&NavigationState::item("paintings", "gone"), &store, &site, Features::default());
    assert!(matches!(vm.page, Page::Home { .. }));
}

#[test]
fn render_empty_artists_category() {
    let store = test_store();
    let site = AppConfig::default().site;
    let vm = view::build(&NavigationState::category("artists"), &store, &site, Features::default());
    let html = render::render_page(&vm);
    assert!(html.contains("No items found"));
    assert!(html.contains("0 items"));
    assert!(html.contains("Artists"));
}

#[test]
fn render_home_lists_categories_in_order() {
    let store = test_store();
    let site = AppConfig::default().site;
    let vm = view::build(&NavigationState::home(), &store, &site, Features::default());
    let html = render::render_page(&vm);
    let paintings = html.find("Explore Paintings").unwrap();
    let artists = html.find("Explore Artists").unwrap();
    assert!(paintings < artists);
    assert!(html.contains(r#"name="category" value="paintings""#));
}

#[test]
fn render_category_features_first_item() {
    let store = test_store();
    let site = AppConfig::default().site;
    let vm = view::build(&NavigationState::category("paintings"), &store, &site, Features::default());
    let html = render::render_page(&vm);
    assert!(html.contains("Explore Featured Item"));
    assert!(html.contains("3 Items"));
    assert!(html.contains(render::PLACEHOLDER_IMAGE));
    assert!(html.contains(r#"name="item" value="the_starry_night""#));
}

#[test]
fn render_forms_carry_the_rendered_view() {
    let store = test_store();
    let site = AppConfig::default().site;

    let category = render::render_page(&view::build(&NavigationState::category("paintings"), &store, &site, Features::default()));
    assert!(category.contains(r#"<input type="hidden" name="item" value="mona_lisa"><input type="hidden" name="at.page" value="category"><input type="hidden" name="at.category" value="paintings">"#));

    let item_page = render::render_page(&view::build(&NavigationState::item("paintings", "mona_lisa"), &store, &site, Features::default()));
    assert!(item_page.contains(r#"action="/nav/back"><input type="hidden" name="at.page" value="item"><input type="hidden" name="at.category" value="paintings"><input type="hidden" name="at.item" value="mona_lisa">"#));

    let home = render::render_page(&view::build(&NavigationState::home(), &store, &site, Features::default()));
    assert!(!home.contains("at.category"));
}

#[test]
fn render_item_sections_and_gallery() {
    let mut items = HashMap::new();
    items.insert(
        "paintings".to_string(),
        vec![item(json!({
            "id": "konark",
            "title": "Konark <Sun> Temple",
            "images": ["1.jpg", "2.jpg", "3.jpg", "4.jpg", "5.jpg"],
            "description": "d".repeat(600),
            "notable_works": ["Wheels"],
            "awards_honors": "UNESCO",
            "dimensions": {"height": "30 m", "width": "75 m"},
            "generated_at": "2024-05-01",
            "location": "Konark, Odisha"
        }))],
    );
    let store = CategoryStore::build(&test_metas(), items);
    let site = AppConfig::default().site;
    let features = Features { story: true, maps: true };
    let vm = view::build(&NavigationState::item("paintings", "konark"), &store, &site, features);
    let html = render::render_page(&vm);

    assert!(html.contains("Konark &lt;Sun&gt; Temple"));
    assert!(html.contains(r#"class="gallery gallery-slider""#));
    assert!(html.contains("<details open><summary>Description</summary>"));
    assert!(html.contains("Additional Information"));
    assert!(html.contains("Notable Works"));
    assert!(html.contains("Awards &amp; Honors"));
    assert!(html.contains("H: 30 m × W: 75 m"));
    assert!(!html.contains("Generated At"));
    assert!(html.contains("/api/story?category=paintings&amp;item=konark"));
    assert!(html.contains("/api/map?location=Konark%2C+Odisha"));
}

#[test]
fn render_gallery_modes() {
    let one = item(json!({"title": "One", "images": ["a.jpg"]}));
    let three = item(json!({"title": "Three", "images": ["a.jpg", "b.jpg", "c.jpg"]}));
    let mut items = HashMap::new();
    items.insert("paintings".to_string(), vec![one, three]);
    let store = CategoryStore::build(&test_metas(), items);
    let site = AppConfig::default().site;

    let single = render::render_page(&view::build(&NavigationState::item("paintings", "one"), &store, &site, Features::default()));
    assert!(single.contains(r#"class="gallery gallery-single""#));
    let grid = render::render_page(&view::build(&NavigationState::item("paintings", "three"), &store, &site, Features::default()));
    assert!(grid.contains(r#"class="gallery gallery-grid""#));
    assert!(!grid.contains("/api/story"));
}

#[test]
fn render_street_views_empty_and_filled() {
    assert!(render::render_street_views(&[]).contains("Could not find location"));
    let html = render::render_street_views(&[maps::StreetView {
        title: "Main Location".into(),
        url: "https://maps.example/embed?a=1&b=2".into(),
    }]);
    assert!(html.contains("<iframe"));
    assert!(html.contains("a=1&amp;b=2"));
}

#[test]
fn html_escape_basics() {
    assert_eq!(html_escape(r#"<a href="x">&'</a>"#), "&lt;a href=&quot;x&quot;&gt;&amp;&#39;&lt;/a&gt;");
}

// ═══════════════════════════════════════════════════════════
// Formatters
// ═══════════════════════════════════════════════════════════

#[test]
fn section_titles() {
    assert_eq!(format_section_title("notable_works"), "Notable Works");
    assert_eq!(format_section_title("awards_honors"), "Awards & Honors");
    assert_eq!(format_section_title("year_of_completion"), "Year Of Completion");
    assert_eq!(format_section_title("UPPER_case"), "Upper Case");
    assert_eq!(title_case("3d art"), "3D Art");
}

#[test]
fn list_and_dimension_formatting() {
    let items: Vec<String> = (1..=7).map(|i| format!("w{}", i)).collect();
    assert_eq!(format_list_items(&items, 5), "w1 • w2 • w3 • w4 • w5 (+2 more)");
    assert_eq!(format_list_items(&[], 5), "None listed");

    let dims = FieldValue::KeyValue(vec![("length".into(), "4 m".into()), ("height".into(), "1 m".into())]);
    assert_eq!(format_dimensions(&dims).as_deref(), Some("H: 1 m × D: 4 m"));
    assert_eq!(format_dimensions(&FieldValue::KeyValue(vec![("weight".into(), "2t".into())])), None);
    assert_eq!(format_dimensions(&FieldValue::Text("2 x 3".into())).as_deref(), Some("2 x 3"));
}

// ═══════════════════════════════════════════════════════════
// Configuration & boot
// ═══════════════════════════════════════════════════════════

#[test]
fn config_defaults_have_four_categories() {
    let config = AppConfig::default();
    assert_eq!(config.categories.len(), 4);
    assert_eq!(config.categories[3].id, "artists");
    assert_eq!(config.source.backend, Backend::Files);
    assert_eq!(config.maps.nearby_limit, 2);
}

#[test]
fn config_from_toml() {
    let config = AppConfig::from_toml(
        r#"
        [source]
        backend = "sqlite"
        db_path = "warehouse.db"
        cache_ttl_secs = 300

        [[categories]]
        id = "masks"
        display_title = "Masks"
        "#,
    )
    .unwrap();
    assert_eq!(config.source.backend, Backend::Sqlite);
    assert_eq!(config.source.db_path, PathBuf::from("warehouse.db"));
    assert_eq!(config.source.cache_ttl_secs, 300);
    assert_eq!(config.categories.len(), 1);
    assert_eq!(config.categories[0].display_description, "");
    assert_eq!(config.site.title, "Art & Culture Explorer");

    let empty = AppConfig::from_toml("").unwrap();
    assert_eq!(empty.categories.len(), 4);
    assert!(AppConfig::from_toml("[source]\nbackend = \"mongo\"").is_err());
}

#[test]
fn boot_check_reports_missing_data() {
    let mut config = AppConfig::default();
    config.source.root = temp_root().join("missing");
    let report = boot::check(&config);
    assert_eq!(report.errors.len(), 1);

    let root = test_tree();
    config.source.root = root;
    config.categories = test_metas();
    config.categories.push(meta("festivals", "Festivals"));
    let report = boot::check(&config);
    assert!(report.errors.is_empty());
    assert!(report.warnings.iter().any(|w| w.contains("festivals")));
    assert!(report.warnings.iter().any(|w| w.contains("GOOGLE_API_KEY")));
}

// ═══════════════════════════════════════════════════════════
// External services (offline parts)
// ═══════════════════════════════════════════════════════════

#[test]
fn story_without_key_is_an_error() {
    let config = AppConfig::default().ai;
    assert!(!ai::is_enabled(&config));
    let err = ai::generate_story(&config, "Mona Lisa", "Paintings").unwrap_err();
    assert!(err.to_string().contains("not available"));
}

#[test]
fn story_prompt_mentions_item() {
    let prompt = ai::prompts::story("Hornbill Festival", "Festivals", "");
    assert!(prompt.contains("\"Hornbill Festival\""));
    assert!(prompt.contains("none available"));
}

#[test]
fn gemini_text_extraction() {
    let body = json!({"candidates": [{"content": {"parts": [{"text": "Once "}, {"text": "upon"}]}}]});
    assert_eq!(ai::gemini::extract_text(&body), "Once upon");
    assert_eq!(ai::gemini::extract_text(&json!({})), "");
}

#[test]
fn maps_parse_and_embed() {
    let body = json!({
        "status": "OK",
        "results": [
            {"name": "Museum", "geometry": {"location": {"lat": 1.5, "lng": 2.5}}},
            {"name": "No geometry"},
            {"name": "Gallery", "geometry": {"location": {"lat": 3.0, "lng": 4.0}}},
            {"name": "Temple", "geometry": {"location": {"lat": 5.0, "lng": 6.0}}}
        ]
    });
    let places = maps::parse_places(&body, 2);
    let names: Vec<&str> = places.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["Museum", "Gallery"]);

    let url = maps::embed_url("k", maps::LatLng { lat: 1.5, lng: 2.5 });
    assert_eq!(url, "https://www.google.com/maps/embed/v1/streetview?key=k&location=1.5%2C2.5");

    let err = maps::street_views(&MapsConfig::default(), "Konark").unwrap_err();
    assert!(err.to_string().contains("not configured"));
}

#[test]
fn health_report_summarizes_catalog() {
    let catalog = load_catalog(&FileTreeSource::new(test_tree()), &test_metas()).unwrap();
    let report = health::gather(&catalog, 3);
    assert!(report.ok);
    assert_eq!(report.total_items, 3);
    assert_eq!(report.categories.len(), 2);
    assert_eq!(report.categories[1].items, 0);
    assert_eq!(report.sessions, 3);
}

// ═══════════════════════════════════════════════════════════
// HTTP
// ═══════════════════════════════════════════════════════════

fn test_client(root: &Path) -> Client {
    let mut config = AppConfig::default();
    config.source.root = root.to_path_buf();
    config.categories = test_metas();
    let catalog = CatalogService::new(config.source.clone(), config.categories.clone());
    Client::tracked(crate::build_rocket(config, catalog)).expect("valid rocket instance")
}

fn location(resp: &rocket::local::blocking::LocalResponse<'_>) -> Option<String> {
    resp.headers().get_one("Location").map(|s| s.to_string())
}

#[test]
fn http_home_renders() {
    let client = test_client(&test_tree());
    let resp = client.get("/").dispatch();
    assert_eq!(resp.status(), Status::Ok);
    let body = resp.into_string().unwrap();
    assert!(body.contains("Explore Categories"));
}

#[test]
fn http_invalid_category_redirects_home() {
    let client = test_client(&test_tree());
    let resp = client.get("/?page=category&category=sculpture").dispatch();
    assert_eq!(resp.status(), Status::SeeOther);
    assert_eq!(location(&resp).as_deref(), Some("/"));
}

#[test]
fn http_unknown_item_redirects_to_category() {
    let client = test_client(&test_tree());
    let resp = client.get("/?page=item&category=paintings&item=nope").dispatch();
    assert_eq!(resp.status(), Status::SeeOther);
    assert_eq!(location(&resp).as_deref(), Some("/?page=category&category=paintings"));

    let resp = client.get("/?page=category&category=paintings").dispatch();
    assert_eq!(resp.status(), Status::Ok);
}

#[test]
fn http_deep_link_to_item() {
    let client = test_client(&test_tree());
    let resp = client.get("/?page=item&category=paintings&item=mona_lisa").dispatch();
    assert_eq!(resp.status(), Status::Ok);
    let body = resp.into_string().unwrap();
    assert!(body.contains("Mona Lisa"));
    assert!(body.contains("Back to Paintings"));
}

#[test]
fn http_navigation_flow() {
    let client = test_client(&test_tree());

    let resp = client
        .post("/nav/category")
        .header(ContentType::Form)
        .body("category=paintings")
        .dispatch();
    assert_eq!(resp.status(), Status::SeeOther);
    assert_eq!(location(&resp).as_deref(), Some("/?page=category&category=paintings"));

    let resp = client
        .post("/nav/item")
        .header(ContentType::Form)
        .body("item=the_starry_night")
        .dispatch();
    assert_eq!(resp.status(), Status::SeeOther);
    assert_eq!(
        location(&resp).as_deref(),
        Some("/?page=item&category=paintings&item=the_starry_night")
    );

    // a bare form without the rendered view falls back to the session
    let resp = client.post("/nav/back").header(ContentType::Form).body("").dispatch();
    assert_eq!(location(&resp).as_deref(), Some("/?page=category&category=paintings"));

    let resp = client.post("/nav/home").dispatch();
    assert_eq!(location(&resp).as_deref(), Some("/"));
}

#[test]
fn http_back_acts_on_the_tab_it_was_clicked_in() {
    let client = test_client(&test_tree());
    // tab one shows an item, tab two then loads home under the same session
    client.get("/?page=item&category=paintings&item=mona_lisa").dispatch();
    client.get("/").dispatch();

    let resp = client
        .post("/nav/back")
        .header(ContentType::Form)
        .body("at.page=item&at.category=paintings&at.item=mona_lisa")
        .dispatch();
    assert_eq!(resp.status(), Status::SeeOther);
    assert_eq!(location(&resp).as_deref(), Some("/?page=category&category=paintings"));
}

#[test]
fn http_item_click_acts_on_the_tab_it_was_clicked_in() {
    let client = test_client(&test_tree());
    client.get("/?page=category&category=paintings").dispatch();
    client.get("/?page=category&category=artists").dispatch();

    let resp = client
        .post("/nav/item")
        .header(ContentType::Form)
        .body("item=mona_lisa&at.page=category&at.category=paintings")
        .dispatch();
    assert_eq!(resp.status(), Status::SeeOther);
    assert_eq!(
        location(&resp).as_deref(),
        Some("/?page=item&category=paintings&item=mona_lisa")
    );

    let body = client.get("/?page=item&category=paintings&item=mona_lisa").dispatch().into_string().unwrap();
    assert!(!body.contains("No item"));
}

#[test]
fn http_rendered_forms_round_trip() {
    let client = test_client(&test_tree());
    let page = client.get("/?page=item&category=paintings&item=the_starry_night").dispatch().into_string().unwrap();
    assert!(page.contains(r#"name="at.item" value="the_starry_night""#));
    client.get("/?page=category&category=artists").dispatch();

    let resp = client
        .post("/nav/item")
        .header(ContentType::Form)
        .body("item=mona_lisa&at.page=item&at.category=paintings&at.item=the_starry_night")
        .dispatch();
    assert_eq!(
        location(&resp).as_deref(),
        Some("/?page=item&category=paintings&item=mona_lisa")
    );
}

#[test]
fn http_item_without_category_flashes_error() {
    let client = test_client(&test_tree());
    let resp = client
        .post("/nav/item")
        .header(ContentType::Form)
        .body("item=mona_lisa")
        .dispatch();
    assert_eq!(resp.status(), Status::SeeOther);
    assert_eq!(location(&resp).as_deref(), Some("/"));

    let body = client.get("/").dispatch().into_string().unwrap();
    assert!(body.contains("Please choose a category"));
}

#[test]
fn http_empty_category_renders() {
    let client = test_client(&test_tree());
    let resp = client.get("/?page=category&category=artists").dispatch();
    assert_eq!(resp.status(), Status::Ok);
    assert!(resp.into_string().unwrap().contains("No items found"));
}

#[test]
fn http_missing_root_is_unavailable() {
    let client = test_client(&temp_root().join("missing"));
    let resp = client.get("/").dispatch();
    assert_eq!(resp.status(), Status::ServiceUnavailable);
    assert!(resp.into_string().unwrap().contains("Data folder not found"));
}

#[test]
fn http_health_and_reload() {
    let root = test_tree();
    let client = test_client(&root);

    let health: serde_json::Value = client.get("/api/health").dispatch().into_json().unwrap();
    assert_eq!(health["ok"], json!(true));
    assert_eq!(health["total_items"], json!(3));

    write_file(&root, "artists/frida.json", r#"{"title": "Frida Kahlo"}"#);
    let reload: serde_json::Value = client.post("/api/catalog/reload").dispatch().into_json().unwrap();
    assert_eq!(reload["ok"], json!(true));
    assert_eq!(reload["total_items"], json!(4));
}

#[test]
fn http_story_for_unknown_item() {
    let client = test_client(&test_tree());
    let resp: serde_json::Value = client
        .get("/api/story?category=paintings&item=nope")
        .dispatch()
        .into_json()
        .unwrap();
    assert_eq!(resp["ok"], json!(false));
}
