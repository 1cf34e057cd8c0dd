use crate::models::item::FieldValue;

/// Display titles that plain title-casing gets wrong or that read better spelled out.
const SECTION_TITLES: &[(&str, &str)] = &[
    ("notable_works", "Notable Works"),
    ("art_style", "Art Style"),
    ("time_period", "Time Period"),
    ("birth_date", "Birth Date"),
    ("death_date", "Death Date"),
    ("birth_place", "Birth Place"),
    ("architectural_style", "Architectural Style"),
    ("construction_period", "Construction Period"),
    ("cultural_significance", "Cultural Significance"),
    ("created_by", "Created By"),
    ("materials_used", "Materials Used"),
    ("dimensions", "Dimensions"),
    ("location", "Location"),
    ("historical_context", "Historical Context"),
    ("artistic_movement", "Artistic Movement"),
    ("influenced_by", "Influenced By"),
    ("influence_on", "Influence On"),
    ("major_works", "Major Works"),
    ("awards_honors", "Awards & Honors"),
    ("exhibition_history", "Exhibition History"),
    ("restoration_history", "Restoration History"),
    ("current_status", "Current Status"),
    ("visitor_information", "Visitor Information"),
    ("fun_facts", "Fun Facts"),
    ("technical_details", "Technical Details"),
    ("conservation_notes", "Conservation Notes"),
];

/// Human-readable title for a field key.
pub fn format_section_title(key: &str) -> String {
    SECTION_TITLES
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, title)| title.to_string())
        .unwrap_or_else(|| title_case(&key.replace('_', " ")))
}

/// Upper-case the first letter of every run of letters, lower-case the rest.
pub fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_word = false;
    for c in text.chars() {
        if c.is_alphabetic() {
            if in_word {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            in_word = true;
        } else {
            out.push(c);
            in_word = false;
        }
    }
    out
}

/// Join up to `max` entries with a bullet, noting how many were left out.
pub fn format_list_items(items: &[String], max: usize) -> String {
    if items.is_empty() {
        return "None listed".to_string();
    }
    let shown = items.iter().take(max).cloned().collect::<Vec<_>>().join(" • ");
    if items.len() > max {
        format!("{} (+{} more)", shown, items.len() - max)
    } else {
        shown
    }
}

/// `H: … × W: … × D: …` for a dimensions object; text values pass through.
pub fn format_dimensions(value: &FieldValue) -> Option<String> {
    match value {
        FieldValue::Text(s) => Some(s.clone()),
        FieldValue::KeyValue(pairs) => {
            let get = |key: &str| {
                pairs
                    .iter()
                    .find(|(k, _)| k == key)
                    .map(|(_, v)| v.as_str())
            };
            let mut parts = Vec::new();
            if let Some(h) = get("height") {
                parts.push(format!("H: {}", h));
            }
            if let Some(w) = get("width") {
                parts.push(format!("W: {}", w));
            }
            if let Some(d) = get("depth").or_else(|| get("length")) {
                parts.push(format!("D: {}", d));
            }
            if parts.is_empty() {
                None
            } else {
                Some(parts.join(" × "))
            }
        }
        FieldValue::List(_) => None,
    }
}
