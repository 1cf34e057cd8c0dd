use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

use crate::config::MapsConfig;

const GEOCODE_URL: &str = "https://maps.googleapis.com/maps/api/geocode/json";
const NEARBY_URL: &str = "https://maps.googleapis.com/maps/api/place/nearbysearch/json";
const STREETVIEW_EMBED_URL: &str = "https://www.google.com/maps/embed/v1/streetview";
const NEARBY_TYPES: &str = "tourist_attraction|landmark|museum|art_gallery";

#[derive(Debug)]
pub struct MapsError(pub String);

impl std::fmt::Display for MapsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Place {
    pub name: String,
    pub location: LatLng,
}

/// One Street View panel on the map view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StreetView {
    pub title: String,
    pub url: String,
}

pub fn is_enabled(config: &MapsConfig) -> bool {
    !config.api_key.trim().is_empty()
}

/// Street View panels for `location` followed by the closest attractions.
/// An address that does not geocode yields an empty list.
pub fn street_views(config: &MapsConfig, location: &str) -> Result<Vec<StreetView>, MapsError> {
    if !is_enabled(config) {
        return Err(MapsError("Google Maps API key not configured".into()));
    }
    if location.trim().is_empty() {
        return Ok(Vec::new());
    }

    let origin = match geocode(config, location)? {
        Some(origin) => origin,
        None => return Ok(Vec::new()),
    };

    let mut views = vec![StreetView {
        title: "Main Location".to_string(),
        url: embed_url(&config.api_key, origin),
    }];

    // Nearby places are a bonus; the main panel stands on its own.
    match nearby_places(config, origin) {
        Ok(places) => views.extend(places.into_iter().map(|p| StreetView {
            url: embed_url(&config.api_key, p.location),
            title: p.name,
        })),
        Err(e) => log::warn!("Nearby search around '{}' failed: {}", location, e),
    }

    Ok(views)
}

pub fn geocode(config: &MapsConfig, address: &str) -> Result<Option<LatLng>, MapsError> {
    let json = get_json(GEOCODE_URL, &[("address", address), ("key", &config.api_key)])?;
    if !status_ok(&json) {
        return Ok(None);
    }
    Ok(json
        .get("results")
        .and_then(|r| r.get(0))
        .and_then(|r| r.pointer("/geometry/location"))
        .and_then(parse_lat_lng))
}

pub fn nearby_places(config: &MapsConfig, origin: LatLng) -> Result<Vec<Place>, MapsError> {
    let location = format!("{},{}", origin.lat, origin.lng);
    let radius = config.nearby_radius.to_string();
    let json = get_json(
        NEARBY_URL,
        &[
            ("location", &location),
            ("radius", &radius),
            ("type", NEARBY_TYPES),
            ("key", &config.api_key),
        ],
    )?;
    if !status_ok(&json) {
        return Ok(Vec::new());
    }
    Ok(parse_places(&json, config.nearby_limit))
}

/// Up to `limit` named results with coordinates.
pub fn parse_places(json: &Value, limit: usize) -> Vec<Place> {
    json.get("results")
        .and_then(|r| r.as_array())
        .map(|results| {
            results
                .iter()
                .filter_map(|place| {
                    let name = place.get("name")?.as_str()?.to_string();
                    let location = parse_lat_lng(place.pointer("/geometry/location")?)?;
                    Some(Place { name, location })
                })
                .take(limit)
                .collect()
        })
        .unwrap_or_default()
}

pub fn embed_url(api_key: &str, at: LatLng) -> String {
    let query = url::form_urlencoded::Serializer::new(String::new())
        .append_pair("key", api_key)
        .append_pair("location", &format!("{},{}", at.lat, at.lng))
        .finish();
    format!("{}?{}", STREETVIEW_EMBED_URL, query)
}

fn parse_lat_lng(value: &Value) -> Option<LatLng> {
    Some(LatLng {
        lat: value.get("lat")?.as_f64()?,
        lng: value.get("lng")?.as_f64()?,
    })
}

fn status_ok(json: &Value) -> bool {
    json.get("status").and_then(|s| s.as_str()) == Some("OK")
}

fn get_json(base: &str, params: &[(&str, &str)]) -> Result<Value, MapsError> {
    let url = url::Url::parse_with_params(base, params).map_err(|e| MapsError(e.to_string()))?;

    let client = reqwest::blocking::Client::builder()
        .timeout(Duration::from_secs(15))
        .build()
        .map_err(|e| MapsError(format!("HTTP client error: {}", e)))?;

    let resp = client
        .get(url)
        .send()
        .map_err(|e| MapsError(format!("Maps request failed: {}", e)))?;
    if !resp.status().is_success() {
        return Err(MapsError(format!("Maps API returned {}", resp.status())));
    }
    resp.json()
        .map_err(|e| MapsError(format!("Maps JSON parse error: {}", e)))
}
