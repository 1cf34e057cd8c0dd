use crate::formatters::{format_dimensions, format_list_items, format_section_title};
use crate::models::category::Category;
use crate::models::item::{FieldValue, Item, PRIORITY_SECTIONS};
use crate::navigation::NavigationState;
use crate::router::{self, PAGE_HOME};
use crate::view::{Notice, Page, ViewModel};

/// Shown when an item has no images.
pub const PLACEHOLDER_IMAGE: &str = "https://images.unsplash.com/photo-1578662996442-48f60103fc96?w=400&h=300&fit=crop&crop=center&auto=format&q=60";

/// Text longer than this is folded into a `<details>` element.
pub const LONG_TEXT_CHARS: usize = 500;

/// Galleries with more images than this get a main image plus thumbnails.
const GRID_GALLERY_MAX: usize = 4;

/// Renders a full page for a view model. Pure: same model, same HTML.
pub fn render_page(vm: &ViewModel) -> String {
    let body_html = match &vm.page {
        Page::Home { categories } => render_home(vm, categories),
        Page::Category { category } => render_category(category),
        Page::Item { category, item } => render_item(vm, category, item),
        Page::Unavailable { message } => render_unavailable(message),
    };

    let notice_html = vm.notice.as_ref().map(build_notice).unwrap_or_default();
    let warnings_html = if vm.warnings > 0 {
        format!(
            r#"<p class="load-warnings">{} record(s) or categories could not be loaded.</p>"#,
            vm.warnings
        )
    } else {
        String::new()
    };

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title}</title>
<style>{css}</style>
</head>
<body>
<header class="site-header">
    <form method="post" action="/nav/home"><button class="site-title" type="submit">{site_title}</button></form>
</header>
<main class="content">
{notice}
{body}
</main>
<footer class="site-footer">
    {warnings}
    <p class="footer-quote">"Art and culture are the soul of human civilization, connecting us across time and space."</p>
</footer>
<script>{gallery_js}</script>
</body>
</html>"#,
        title = html_escape(&vm.title()),
        css = DEFAULT_CSS,
        site_title = html_escape(&vm.site.title),
        notice = notice_html,
        body = body_html,
        warnings = warnings_html,
        gallery_js = GALLERY_JS,
    )
}

fn build_notice(notice: &Notice) -> String {
    format!(
        r#"<div class="notice notice-{}" role="alert">{}</div>"#,
        html_escape(&notice.kind),
        html_escape(&notice.message)
    )
}

// ── Home ───────────────────────────────────────────────

fn render_home(vm: &ViewModel, categories: &[&Category]) -> String {
    let mut html = format!(
        r#"<section class="hero"><h1>{}</h1><p class="hero-subtitle">{}</p></section>
<h2 class="section-title">Explore Categories</h2>"#,
        html_escape(&vm.site.title),
        html_escape(&vm.site.tagline)
    );

    if categories.is_empty() {
        html.push_str(r#"<p class="empty">No categories configured.</p>"#);
        return html;
    }

    html.push_str(r#"<div class="category-grid">"#);
    for category in categories {
        html.push_str(&format!(
            r#"<article class="category-card">
    <div class="card-image"><img src="{img}" alt="{title}" loading="lazy"></div>
    <div class="card-content">
        <h3 class="card-title">{title}</h3>
        <p class="card-description">{desc}</p>
        <span class="count-badge">{count} item{plural}</span>
        {button}
    </div>
</article>"#,
            img = html_escape(&category.main_card_image),
            title = html_escape(&category.display_title),
            desc = html_escape(&category.display_description),
            count = category.item_count(),
            plural = if category.item_count() == 1 { "" } else { "s" },
            button = nav_form(
                "/nav/category",
                &[("category", category.id.clone())],
                &format!("Explore {}", category.display_title),
                "btn btn-primary",
            ),
        ));
    }
    html.push_str("</div>");
    html
}

// ── Category ───────────────────────────────────────────

fn render_category(category: &Category) -> String {
    let mut html = format!(
        r#"<section class="category-hero">
    {back}
    <h1>{title}</h1>
    <p class="hero-subtitle">{desc}</p>
</section>"#,
        back = nav_form("/nav/home", &[], "← All categories", "btn btn-back"),
        title = html_escape(&category.display_title),
        desc = html_escape(&category.display_description),
    );

    let items = &category.items;
    if items.is_empty() {
        html.push_str(
            r#"<div class="empty-state">
    <h3>No items found</h3>
    <p>We're working on adding more content to this category. Check back soon!</p>
    <span class="count-badge">0 items</span>
</div>"#,
        );
        return html;
    }

    html.push_str(&format!(
        r#"<div class="collection-overview">
    <div><h4>Collection Overview</h4><p>Discover {n} amazing piece{plural} in this collection</p></div>
    <span class="count-badge">{n} Item{plural}</span>
</div>"#,
        n = items.len(),
        plural = if items.len() == 1 { "" } else { "s" },
    ));

    let origin = origin_fields(&NavigationState::category(category.id.as_str()));
    html.push_str(&render_item_card(&items[0], &origin, true));

    if items.len() > 1 {
        html.push_str(r#"<h2 class="section-title">More in this collection</h2><div class="item-grid">"#);
        for item in &items[1..] {
            html.push_str(&render_item_card(item, &origin, false));
        }
        html.push_str("</div>");
    }

    html
}

fn render_item_card(item: &Item, origin: &[(&str, String)], featured: bool) -> String {
    let image = item.first_image().unwrap_or(PLACEHOLDER_IMAGE);
    let (class, badge, label) = if featured {
        (
            "item-card featured-card",
            r#"<span class="featured-badge">Featured</span>"#,
            "Explore Featured Item",
        )
    } else {
        ("item-card", "", "View Details")
    };
    format!(
        r#"<article class="{class}">
    <div class="card-image"><img src="{img}" alt="{title}" loading="lazy">{badge}</div>
    <div class="card-content">
        <h4 class="card-title">{title}</h4>
        <p class="card-description">{preview}</p>
        {button}
    </div>
</article>"#,
        class = class,
        img = html_escape(image),
        title = html_escape(&item.title),
        badge = badge,
        preview = html_escape(&item.preview()),
        button = {
            let mut fields = vec![("item", item.slug.clone())];
            fields.extend_from_slice(origin);
            nav_form("/nav/item", &fields, label, "btn btn-primary")
        },
    )
}

// ── Item ───────────────────────────────────────────────

fn render_item(vm: &ViewModel, category: &Category, item: &Item) -> String {
    let mut html = String::new();
    let origin = origin_fields(&NavigationState::item(category.id.as_str(), item.slug.as_str()));

    html.push_str(&build_breadcrumbs(category, item, &origin));
    html.push_str(&format!(
        r#"<section class="item-header">
    {back}
    <h1>{title}</h1>
</section>"#,
        back = nav_form(
            "/nav/back",
            &origin,
            &format!("← Back to {}", category.display_title),
            "btn btn-back",
        ),
        title = html_escape(&item.title),
    ));

    html.push_str(&build_gallery(item));
    html.push_str(&build_sections(item));

    if vm.features.story {
        html.push_str(&build_story_panel(category, item));
    }
    if vm.features.maps {
        if let Some(location) = item.field("location").and_then(|v| v.as_text()) {
            if !location.trim().is_empty() {
                html.push_str(&build_map_panel(location));
            }
        }
    }

    html
}

fn build_breadcrumbs(category: &Category, item: &Item, origin: &[(&str, String)]) -> String {
    format!(
        r#"<nav class="breadcrumbs" aria-label="Breadcrumb">
    {home} <span class="sep">›</span> {cat} <span class="sep">›</span> <span class="current">{item}</span>
</nav>"#,
        home = nav_form("/nav/home", &[], "Home", "crumb"),
        cat = nav_form("/nav/back", origin, &category.display_title, "crumb"),
        item = html_escape(&item.title),
    )
}

/// One image: a single figure. Up to four: a grid. More: main image with a
/// thumbnail strip that swaps it client-side.
fn build_gallery(item: &Item) -> String {
    let title = html_escape(&item.title);
    match item.images.len() {
        0 => String::new(),
        1 => format!(
            r#"<figure class="gallery gallery-single"><img src="{}" alt="{}"></figure>"#,
            html_escape(&item.images[0]),
            title
        ),
        n if n <= GRID_GALLERY_MAX => {
            let mut html = String::from(r#"<div class="gallery gallery-grid">"#);
            for (i, src) in item.images.iter().enumerate() {
                html.push_str(&format!(
                    r#"<img src="{}" alt="{} ({})" loading="lazy">"#,
                    html_escape(src),
                    title,
                    i + 1
                ));
            }
            html.push_str("</div>");
            html
        }
        n => {
            let mut html = format!(
                r#"<div class="gallery gallery-slider" data-count="{}">
    <img class="gallery-main" src="{}" alt="{}">
    <div class="gallery-thumbs">"#,
                n,
                html_escape(&item.images[0]),
                title
            );
            for (i, src) in item.images.iter().enumerate() {
                html.push_str(&format!(
                    r#"<img class="gallery-thumb{}" src="{}" alt="{} ({})" data-index="{}" loading="lazy">"#,
                    if i == 0 { " active" } else { "" },
                    html_escape(src),
                    title,
                    i + 1,
                    i
                ));
            }
            html.push_str("</div></div>");
            html
        }
    }
}

fn build_sections(item: &Item) -> String {
    let sections = item.sections();
    if sections.is_empty() {
        return r#"<p class="empty">No further details are available for this item.</p>"#.to_string();
    }

    let mut html = String::new();

    if !sections.priority.is_empty() {
        html.push_str(r#"<section class="sections sections-priority">"#);
        for (key, value) in &sections.priority {
            html.push_str(&render_section(key, value, true));
        }
        html.push_str("</section>");
    }

    if !sections.lists.is_empty() {
        html.push_str(r#"<section class="sections sections-lists"><h2 class="section-title">Additional Information</h2>"#);
        for (key, items) in &sections.lists {
            html.push_str(&format!(
                r#"<div class="section list-section"><h3>{}</h3><ul>"#,
                html_escape(&format_section_title(key))
            ));
            for entry in items.iter() {
                html.push_str(&format!("<li>{}</li>", html_escape(entry)));
            }
            html.push_str("</ul></div>");
        }
        html.push_str("</section>");
    }

    if !sections.other.is_empty() {
        html.push_str(r#"<section class="sections sections-other"><h2 class="section-title">Detailed Information</h2>"#);
        for (key, value) in &sections.other {
            html.push_str(&render_section(key, value, false));
        }
        html.push_str("</section>");
    }

    html
}

fn render_section(key: &str, value: &FieldValue, priority: bool) -> String {
    let title = html_escape(&format_section_title(key));
    let class = if PRIORITY_SECTIONS.contains(&key) {
        "section priority-section"
    } else {
        "section"
    };

    match value {
        FieldValue::Text(text) if text.chars().count() > LONG_TEXT_CHARS => format!(
            r#"<div class="{}"><details{}><summary>{}</summary>{}</details></div>"#,
            class,
            if priority { " open" } else { "" },
            title,
            paragraphs(text)
        ),
        FieldValue::Text(text) => format!(
            r#"<div class="{}"><h3>{}</h3>{}</div>"#,
            class,
            title,
            paragraphs(text)
        ),
        FieldValue::KeyValue(pairs) => {
            let mut html = format!(r#"<div class="{}"><h3>{}</h3>"#, class, title);
            if key == "dimensions" {
                if let Some(dims) = format_dimensions(value) {
                    html.push_str(&format!(r#"<p class="dimensions">{}</p>"#, html_escape(&dims)));
                }
            }
            html.push_str(r#"<dl class="kv-grid">"#);
            for (k, v) in pairs {
                html.push_str(&format!(
                    "<dt>{}</dt><dd>{}</dd>",
                    html_escape(&format_section_title(k)),
                    html_escape(v)
                ));
            }
            html.push_str("</dl></div>");
            html
        }
        FieldValue::List(items) => format!(
            r#"<div class="{}"><h3>{}</h3><p>{}</p></div>"#,
            class,
            title,
            html_escape(&format_list_items(items, 5))
        ),
    }
}

fn paragraphs(text: &str) -> String {
    text.split("\n\n")
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(|p| format!("<p>{}</p>", html_escape(p).replace('\n', "<br>")))
        .collect()
}

fn build_story_panel(category: &Category, item: &Item) -> String {
    let query = url::form_urlencoded::Serializer::new(String::new())
        .append_pair("category", &category.id)
        .append_pair("item", &item.slug)
        .finish();
    format!(
        r#"<section class="panel story-panel">
    <h2 class="section-title">Story</h2>
    <button class="btn btn-primary" type="button" data-story-src="/api/story?{}">Generate a story</button>
    <div class="story-output" aria-live="polite"></div>
</section>"#,
        html_escape(&query)
    )
}

fn build_map_panel(location: &str) -> String {
    let query = url::form_urlencoded::Serializer::new(String::new())
        .append_pair("location", location)
        .finish();
    format!(
        r#"<section class="panel map-panel">
    <h2 class="section-title">Explore the Location</h2>
    <p class="map-location">{}</p>
    <button class="btn btn-primary" type="button" data-map-src="/api/map?{}">Show Street View</button>
    <div class="map-output"></div>
</section>"#,
        html_escape(location),
        html_escape(&query)
    )
}

/// Fragment for the map panel. An empty list means the address did not resolve.
pub fn render_street_views(views: &[crate::maps::StreetView]) -> String {
    if views.is_empty() {
        return r#"<p class="notice notice-error">Could not find location on Google Maps</p>"#.to_string();
    }
    let mut html = String::from(r#"<div class="street-views">"#);
    for view in views {
        html.push_str(&format!(
            r#"<div class="street-view"><h4>{}</h4><iframe src="{}" width="100%" height="300" style="border:0" loading="lazy" allowfullscreen></iframe></div>"#,
            html_escape(&view.title),
            html_escape(&view.url)
        ));
    }
    html.push_str("</div>");
    html
}

// ── Misc ───────────────────────────────────────────────

fn render_unavailable(message: &str) -> String {
    format!(
        r#"<div class="empty-state"><h3>The catalog is unavailable</h3><p>{}</p></div>"#,
        html_escape(message)
    )
}

/// A button that posts a navigation event, with at most one hidden field.
/// Hidden `at.*` fields naming the view a form was rendered on. The
/// `/nav/*` handlers start from this view instead of the session's last one.
fn origin_fields(state: &NavigationState) -> Vec<(&'static str, String)> {
    let query = router::state_to_query(state);
    let mut fields = vec![("at.page", query.page.unwrap_or_else(|| PAGE_HOME.to_string()))];
    if let Some(category) = query.category {
        fields.push(("at.category", category));
    }
    if let Some(item) = query.item {
        fields.push(("at.item", item));
    }
    fields
}

fn nav_form(action: &str, fields: &[(&str, String)], label: &str, class: &str) -> String {
    let hidden: String = fields
        .iter()
        .map(|(name, value)| {
            format!(
                r#"<input type="hidden" name="{}" value="{}">"#,
                html_escape(name),
                html_escape(value)
            )
        })
        .collect();
    format!(
        r#"<form class="nav-form" method="post" action="{}">{}<button class="{}" type="submit">{}</button></form>"#,
        action,
        hidden,
        class,
        html_escape(label)
    )
}

pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

const GALLERY_JS: &str = r#"
(function() {
    document.querySelectorAll('.gallery-slider').forEach(function(g) {
        var main = g.querySelector('.gallery-main');
        g.querySelectorAll('.gallery-thumb').forEach(function(t) {
            t.addEventListener('click', function() {
                main.src = t.src;
                g.querySelectorAll('.gallery-thumb').forEach(function(o) { o.classList.remove('active'); });
                t.classList.add('active');
            });
        });
    });

    function load(btn, attr, out, handle) {
        btn.addEventListener('click', function() {
            btn.disabled = true;
            out.textContent = 'Loading...';
            fetch(btn.getAttribute(attr))
                .then(function(r) { return r.json(); })
                .then(function(d) { handle(d, out); })
                .catch(function() { out.textContent = 'Request failed.'; })
                .then(function() { btn.disabled = false; });
        });
    }

    document.querySelectorAll('[data-story-src]').forEach(function(btn) {
        var out = btn.parentNode.querySelector('.story-output');
        load(btn, 'data-story-src', out, function(d, o) {
            o.textContent = d.ok ? d.story : d.error;
        });
    });

    document.querySelectorAll('[data-map-src]').forEach(function(btn) {
        var out = btn.parentNode.querySelector('.map-output');
        load(btn, 'data-map-src', out, function(d, o) {
            if (d.ok) { o.innerHTML = d.html; } else { o.textContent = d.error; }
        });
    });
})();
"#;

const DEFAULT_CSS: &str = r#"
:root {
    --color-bg: #f4f8fc;
    --color-card: #ffffff;
    --color-text: #1e3a5f;
    --color-muted: #5a6b7f;
    --color-accent: #4a90e2;
    --color-highlight: #ff9800;
    --color-border: #d6e4f0;
    --radius: 16px;
}

* { margin: 0; padding: 0; box-sizing: border-box; }

body {
    font-family: Georgia, 'Times New Roman', serif;
    color: var(--color-text);
    background: var(--color-bg);
    line-height: 1.6;
}

.site-header { padding: 1rem 2rem; border-bottom: 1px solid var(--color-border); background: var(--color-card); }
.site-title { font-size: 1.3rem; font-weight: 700; background: none; border: 0; color: var(--color-text); cursor: pointer; }
.content { max-width: 1200px; margin: 0 auto; padding: 2rem; }
.site-footer { text-align: center; padding: 2rem; color: var(--color-muted); font-style: italic; }
.load-warnings { font-style: normal; font-size: 0.85rem; margin-bottom: 0.5rem; }

.hero, .category-hero { text-align: center; padding: 2.5rem 1rem; margin-bottom: 2rem; }
.hero h1, .category-hero h1 { font-size: 2.6rem; }
.hero-subtitle { color: var(--color-muted); font-style: italic; margin-top: 0.8rem; }
.section-title { font-size: 1.6rem; margin: 2rem 0 1rem; }

.nav-form { display: inline; }
.btn { border: 0; border-radius: 20px; padding: 0.55rem 1.2rem; cursor: pointer; font: inherit; }
.btn-primary { background: var(--color-accent); color: #fff; }
.btn-back { background: transparent; color: var(--color-accent); }
.crumb { background: none; border: 0; color: var(--color-accent); cursor: pointer; font: inherit; }

.category-grid, .item-grid { display: grid; grid-template-columns: repeat(auto-fill, minmax(300px, 1fr)); gap: 1.5rem; }
.category-card, .item-card { background: var(--color-card); border: 1px solid var(--color-border); border-radius: var(--radius); overflow: hidden; display: flex; flex-direction: column; }
.featured-card { border: 2px solid #d4af37; margin-bottom: 2rem; }
.card-image { position: relative; height: 200px; overflow: hidden; }
.card-image img { width: 100%; height: 100%; object-fit: cover; }
.featured-badge { position: absolute; top: 10px; right: 10px; background: var(--color-accent); color: #fff; padding: 0.3rem 0.8rem; border-radius: 15px; font-size: 0.8rem; }
.card-content { padding: 1.2rem; display: flex; flex-direction: column; gap: 0.8rem; flex: 1; }
.card-description { color: var(--color-muted); font-size: 0.9rem; flex: 1; }
.count-badge { align-self: flex-start; background: var(--color-highlight); color: #fff; padding: 0.3rem 0.9rem; border-radius: 20px; font-weight: 600; font-size: 0.85rem; }

.collection-overview, .empty-state, .panel, .section { background: var(--color-card); border: 1px solid var(--color-border); border-radius: var(--radius); padding: 1.5rem; margin-bottom: 1.5rem; }
.collection-overview { display: flex; justify-content: space-between; align-items: center; }
.empty-state { text-align: center; padding: 3rem; }

.notice { padding: 0.8rem 1.2rem; border-radius: 10px; margin-bottom: 1.5rem; }
.notice-error { background: #fdecea; color: #8a1c1c; }
.notice-info { background: #e8f1fb; color: var(--color-text); }

.breadcrumbs { margin-bottom: 1rem; color: var(--color-muted); }
.item-header h1 { font-size: 2.4rem; margin: 0.5rem 0 1.5rem; }

.gallery { margin-bottom: 2rem; }
.gallery img { border-radius: 12px; }
.gallery-single img { width: 100%; max-height: 560px; object-fit: contain; }
.gallery-grid { display: grid; grid-template-columns: repeat(2, 1fr); gap: 0.8rem; }
.gallery-grid img { width: 100%; height: 260px; object-fit: cover; }
.gallery-main { width: 100%; max-height: 520px; object-fit: contain; }
.gallery-thumbs { display: flex; gap: 0.5rem; overflow-x: auto; margin-top: 0.6rem; }
.gallery-thumb { width: 96px; height: 72px; object-fit: cover; cursor: pointer; opacity: 0.6; }
.gallery-thumb.active { opacity: 1; outline: 2px solid var(--color-accent); }

.section h3, .section summary { font-size: 1.2rem; margin-bottom: 0.6rem; cursor: default; }
.section summary { cursor: pointer; }
.section p { margin-bottom: 0.6rem; }
.list-section ul { padding-left: 1.4rem; }
.kv-grid { display: grid; grid-template-columns: max-content 1fr; gap: 0.4rem 1.2rem; }
.kv-grid dt { font-weight: 600; }
.dimensions { font-weight: 600; }

.story-output { white-space: pre-wrap; margin-top: 1rem; }
.street-views { display: grid; grid-template-columns: repeat(auto-fit, minmax(280px, 1fr)); gap: 1rem; margin-top: 1rem; }
"#;
