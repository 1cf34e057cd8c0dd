use serde::Serialize;
use serde_json::{Map, Value};

/// Title given to records that carry no usable `title` field.
pub const DEFAULT_TITLE: &str = "Untitled Item";

/// Keys that are part of every record's bookkeeping and never rendered as sections.
pub const RESERVED_FIELDS: &[&str] = &[
    "images",
    "title",
    "generated_at",
    "last_modified",
    "references",
];

/// Sections rendered first on the item page, in this order.
pub const PRIORITY_SECTIONS: &[&str] = &[
    "description",
    "overview",
    "summary",
    "history",
    "significance",
    "background",
    "context",
];

const PREVIEW_TEXT_FIELDS: &[&str] = &["description", "overview", "summary", "details", "information"];
const PREVIEW_LIST_FIELDS: &[&str] = &["features", "characteristics", "highlights", "notable_works"];
const PREVIEW_FALLBACK: &str = "Click to explore more details about this fascinating item.";

/// A single named value on an item, after normalization.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum FieldValue {
    Text(String),
    List(Vec<String>),
    KeyValue(Vec<(String, String)>),
}

impl FieldValue {
    /// Coerce an arbitrary JSON value. `null` has no representation and yields `None`.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Null => None,
            Value::String(s) => Some(FieldValue::Text(s.clone())),
            Value::Bool(_) | Value::Number(_) => Some(FieldValue::Text(value.to_string())),
            Value::Array(values) => Some(FieldValue::List(
                values.iter().filter(|v| !v.is_null()).map(value_text).collect(),
            )),
            Value::Object(map) => Some(FieldValue::KeyValue(
                map.iter()
                    .filter(|(_, v)| !v.is_null())
                    .map(|(k, v)| (k.clone(), value_text(v)))
                    .collect(),
            )),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            FieldValue::Text(s) => s.is_empty(),
            FieldValue::List(items) => items.is_empty(),
            FieldValue::KeyValue(pairs) => pairs.is_empty(),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            FieldValue::List(items) => Some(items),
            _ => None,
        }
    }
}

/// Strings pass through untouched; anything else is rendered as compact JSON.
fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// One content record belonging to a category.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Item {
    pub title: String,
    pub images: Vec<String>,
    /// Every field of the record except `title` and `images`, in record order.
    pub fields: Vec<(String, FieldValue)>,
    /// Identity used in the `item` query parameter.
    pub slug: String,
}

/// Where a field ends up on the item page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionKind {
    Priority,
    List,
    Other,
}

/// Renderable fields of an item, grouped by [`SectionKind`].
#[derive(Debug, Default)]
pub struct Sections<'a> {
    pub priority: Vec<(&'a str, &'a FieldValue)>,
    pub lists: Vec<(&'a str, &'a [String])>,
    pub other: Vec<(&'a str, &'a FieldValue)>,
}

impl Sections<'_> {
    pub fn is_empty(&self) -> bool {
        self.priority.is_empty() && self.lists.is_empty() && self.other.is_empty()
    }
}

impl Item {
    /// Parse a raw JSON document. Only objects are records.
    pub fn from_json(value: Value) -> Result<Self, String> {
        match value {
            Value::Object(map) => Ok(Self::from_record(map)),
            Value::Array(_) => Err("expected a JSON object, found an array".into()),
            other => Err(format!("expected a JSON object, found {}", json_kind(&other))),
        }
    }

    /// Build an item from a record whose values are already JSON.
    pub fn from_record(record: Map<String, Value>) -> Self {
        let title = record
            .get("title")
            .and_then(title_text)
            .unwrap_or_else(|| DEFAULT_TITLE.to_string());

        let images = match record.get("images") {
            Some(Value::Array(values)) => values
                .iter()
                .filter_map(|v| v.as_str())
                .filter(|s| !s.trim().is_empty())
                .map(|s| s.to_string())
                .collect(),
            Some(Value::String(s)) if !s.trim().is_empty() => vec![s.clone()],
            _ => Vec::new(),
        };

        let id = record.get("id").and_then(id_text);
        let slug = derive_slug(id.as_deref(), &title);

        let fields = record
            .iter()
            .filter(|(key, _)| key.as_str() != "title" && key.as_str() != "images")
            .filter_map(|(key, value)| FieldValue::from_json(value).map(|v| (key.clone(), v)))
            .collect();

        Item {
            title,
            images,
            fields,
            slug,
        }
    }

    pub fn field(&self, name: &str) -> Option<&FieldValue> {
        self.fields.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }

    pub fn first_image(&self) -> Option<&str> {
        self.images.first().map(|s| s.as_str())
    }

    /// Short teaser for item cards.
    pub fn preview(&self) -> String {
        for name in PREVIEW_TEXT_FIELDS {
            if let Some(value) = self.field(name).filter(|v| !v.is_empty()) {
                let text = match value {
                    FieldValue::Text(s) => s.clone(),
                    FieldValue::List(items) => items.join(", "),
                    FieldValue::KeyValue(pairs) => pairs
                        .iter()
                        .map(|(k, v)| format!("{}: {}", k, v))
                        .collect::<Vec<_>>()
                        .join(", "),
                };
                return truncate_chars(&text, 120);
            }
        }
        for name in PREVIEW_LIST_FIELDS {
            if let Some(first) = self.field(name).and_then(|v| v.as_list()).and_then(|l| l.first()) {
                return truncate_chars(first, 100);
            }
        }
        PREVIEW_FALLBACK.to_string()
    }

    /// Group renderable fields: lists first by type, then priority names, then the rest.
    /// Reserved keys and empty values are left out.
    pub fn sections(&self) -> Sections<'_> {
        let mut sections = Sections::default();
        for (key, value) in &self.fields {
            if RESERVED_FIELDS.contains(&key.as_str()) || value.is_empty() {
                continue;
            }
            match classify_section(key, value) {
                SectionKind::List => {
                    if let FieldValue::List(items) = value {
                        sections.lists.push((key, items));
                    }
                }
                SectionKind::Priority => sections.priority.push((key, value)),
                SectionKind::Other => sections.other.push((key, value)),
            }
        }
        sections.priority.sort_by_key(|(key, _)| {
            PRIORITY_SECTIONS
                .iter()
                .position(|p| p == key)
                .unwrap_or(PRIORITY_SECTIONS.len())
        });
        sections
    }
}

pub fn classify_section(key: &str, value: &FieldValue) -> SectionKind {
    match value {
        FieldValue::List(_) => SectionKind::List,
        _ if PRIORITY_SECTIONS.contains(&key) => SectionKind::Priority,
        _ => SectionKind::Other,
    }
}

/// `id` wins when present and truthy. Otherwise the title is lower-cased,
/// spaces and hyphens become underscores and every other non-alphanumeric
/// character is dropped, so "St. Mary's Church" is `st_marys_church`.
pub fn derive_slug(id: Option<&str>, title: &str) -> String {
    if let Some(id) = id.filter(|s| !s.is_empty()) {
        return id.to_string();
    }
    let slug: String = title
        .to_lowercase()
        .chars()
        .map(|c| if c == ' ' || c == '-' { '_' } else { c })
        .filter(|c| c.is_alphanumeric() || *c == '_')
        .collect();
    if slug.is_empty() {
        "item".to_string()
    } else {
        slug
    }
}

fn title_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn id_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) if n.as_f64() != Some(0.0) => Some(n.to_string()),
        _ => None,
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

pub fn truncate_chars(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let cut: String = text.chars().take(max).collect();
    format!("{}...", cut)
}
