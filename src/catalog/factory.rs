//! Turns untrusted request bodies into well-formed catalog records.
//!
//! Nothing in here rejects input: every field has a coercion rule and a
//! default, and whatever cannot be coerced falls back to the default.

use super::models::{
    now_millis, Drama, Episode, DEFAULT_COUNTRY, DEFAULT_STATUS, DEFAULT_TITLE,
};
use serde::{Deserialize, Deserializer};
use serde_json::{json, Value};

pub const DEFAULT_SEED_COUNT: usize = 6;

/// Body of a create or update request.
///
/// `None` means the key was absent, `Some(Value::Null)` means the caller sent
/// an explicit `null`. Identity and timestamp keys are not part of the shape,
/// so callers can never overwrite them.
#[derive(Deserialize, Debug, Default, Clone)]
pub struct DramaPayload {
    #[serde(default, deserialize_with = "present")]
    pub title: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    pub original_title: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    pub year: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    pub country: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    pub genres: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    pub status: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    pub rating: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    pub poster_url: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    pub banner_url: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    pub description: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    pub cast: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    pub tags: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    pub episodes: Option<Value>,
}

fn present<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Value>, D::Error> {
    Value::deserialize(d).map(Some)
}

impl DramaPayload {
    /// Builds a payload out of any JSON document. Non-object documents carry
    /// no fields.
    pub fn from_json(value: Value) -> DramaPayload {
        match value {
            Value::Object(_) => serde_json::from_value(value).unwrap_or_default(),
            _ => DramaPayload::default(),
        }
    }

    fn apply_to(self, drama: &mut Drama) {
        if let Some(v) = self.title {
            drama.title = coerce_title(&v);
        }
        if let Some(v) = self.original_title {
            drama.original_title = coerce_string(&v).unwrap_or_default();
        }
        if let Some(v) = self.year {
            drama.year = coerce_integer(&v);
        }
        if let Some(v) = self.country {
            drama.country = coerce_non_empty(&v, DEFAULT_COUNTRY);
        }
        if let Some(v) = self.genres {
            drama.genres = coerce_string_list(&v);
        }
        if let Some(v) = self.status {
            drama.status = coerce_non_empty(&v, DEFAULT_STATUS);
        }
        if let Some(v) = self.rating {
            drama.rating = coerce_number(&v).unwrap_or(0.0);
        }
        if let Some(v) = self.poster_url {
            drama.poster_url = coerce_string(&v).unwrap_or_default();
        }
        if let Some(v) = self.banner_url {
            drama.banner_url = coerce_string(&v).unwrap_or_default();
        }
        if let Some(v) = self.description {
            drama.description = coerce_string(&v).unwrap_or_default();
        }
        if let Some(v) = self.cast {
            drama.cast = coerce_string_list(&v);
        }
        if let Some(v) = self.tags {
            drama.tags = coerce_string_list(&v);
        }
        if let Some(v) = self.episodes {
            drama.episodes = coerce_episodes(&v);
        }
    }
}

/// Scalars become their textual form, anything else has no string value.
fn coerce_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn coerce_title(value: &Value) -> String {
    match coerce_string(value) {
        Some(s) if !s.trim().is_empty() => s.trim().to_owned(),
        _ => DEFAULT_TITLE.to_owned(),
    }
}

fn coerce_non_empty(value: &Value, default: &str) -> String {
    coerce_string(value)
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| default.to_owned())
}

fn coerce_number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    n.is_finite().then_some(n)
}

fn coerce_integer(value: &Value) -> Option<i64> {
    if let Value::Number(n) = value {
        if let Some(i) = n.as_i64() {
            return Some(i);
        }
    }
    coerce_number(value).map(|n| n.trunc() as i64)
}

fn coerce_string_list(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items.iter().filter_map(coerce_string).collect(),
        _ => vec![],
    }
}

fn coerce_episodes(value: &Value) -> Vec<Episode> {
    let Value::Array(items) = value else {
        return vec![];
    };
    items
        .iter()
        .filter_map(Value::as_object)
        .enumerate()
        .map(|(position, fields)| {
            let text = |key: &str| {
                fields
                    .get(key)
                    .and_then(coerce_string)
                    .unwrap_or_default()
            };
            Episode {
                number: fields
                    .get("number")
                    .and_then(coerce_integer)
                    .unwrap_or(position as i64 + 1),
                title: text("title"),
                stream_url: text("stream_url"),
                subtitle_url: text("subtitle_url"),
            }
        })
        .collect()
}

fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Builds a brand new record out of `payload`, with a fresh id and
/// `created_at == updated_at == now`.
pub fn create(payload: DramaPayload) -> Drama {
    let now = now_millis();
    let mut drama = Drama {
        id: new_id(),
        title: DEFAULT_TITLE.to_owned(),
        original_title: String::new(),
        year: None,
        country: DEFAULT_COUNTRY.to_owned(),
        genres: vec![],
        status: DEFAULT_STATUS.to_owned(),
        rating: 0.0,
        poster_url: String::new(),
        banner_url: String::new(),
        description: String::new(),
        cast: vec![],
        tags: vec![],
        episodes: vec![],
        created_at: now,
        updated_at: now,
    };
    payload.apply_to(&mut drama);
    drama
}

/// Shallow merge: every field present in `payload` replaces the existing one.
/// `updated_at` always moves forward, even if nothing else changed.
pub fn update(existing: &mut Drama, payload: DramaPayload) {
    payload.apply_to(existing);
    existing.touch();
}

/// Parses the `count` query parameter of the seed route.
pub fn parse_seed_count(raw: Option<&str>) -> usize {
    let Some(n) = raw.and_then(|s| s.trim().parse::<f64>().ok()) else {
        return DEFAULT_SEED_COUNT;
    };
    if !n.is_finite() {
        return DEFAULT_SEED_COUNT;
    }
    if n < 1.0 {
        return 0;
    }
    n.trunc() as usize
}

/// Placeholder records sharing the same demo content, distinct by title and id.
pub fn seed(count: usize) -> Vec<Drama> {
    (1..=count)
        .map(|n| {
            create(DramaPayload {
                title: Some(json!(format!("Sample Drama {}", n))),
                original_title: Some(json!(format!("示例剧集 {}", n))),
                year: Some(json!(2024)),
                genres: Some(json!(["Romance", "Fantasy"])),
                status: Some(json!(if n % 2 == 0 { "Completed" } else { "Ongoing" })),
                rating: Some(json!(8.2)),
                poster_url: Some(json!("https://picsum.photos/seed/drama-poster/400/600")),
                banner_url: Some(json!("https://picsum.photos/seed/drama-banner/1280/480")),
                description: Some(json!(
                    "A placeholder series used to populate demo catalogs."
                )),
                cast: Some(json!(["Lead Actor", "Lead Actress"])),
                tags: Some(json!(["sample", "demo"])),
                episodes: Some(json!([
                    {
                        "number": 1,
                        "title": "Episode 1",
                        "stream_url": "https://test-streams.mux.dev/x36xhzz/x36xhzz.m3u8",
                        "subtitle_url": ""
                    },
                    {
                        "number": 2,
                        "title": "Episode 2",
                        "stream_url": "https://test-streams.mux.dev/x36xhzz/x36xhzz.m3u8",
                        "subtitle_url": ""
                    }
                ])),
                ..DramaPayload::default()
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn payload(value: Value) -> DramaPayload {
        DramaPayload::from_json(value)
    }

    #[test]
    fn create_applies_defaults() {
        let drama = create(payload(json!({})));
        assert_eq!(drama.title, DEFAULT_TITLE);
        assert_eq!(drama.country, DEFAULT_COUNTRY);
        assert_eq!(drama.status, DEFAULT_STATUS);
        assert_eq!(drama.rating, 0.0);
        assert_eq!(drama.year, None);
        assert!(drama.genres.is_empty());
        assert!(drama.episodes.is_empty());
        assert_eq!(drama.created_at, drama.updated_at);
    }

    #[test]
    fn create_trims_title_and_defaults_blank_title() {
        assert_eq!(create(payload(json!({"title": "  Nirvana in Fire "}))).title, "Nirvana in Fire");
        assert_eq!(create(payload(json!({"title": "   "}))).title, DEFAULT_TITLE);
        assert_eq!(create(payload(json!({"title": null}))).title, DEFAULT_TITLE);
    }

    #[test]
    fn create_coerces_numbers() {
        let drama = create(payload(json!({"year": "2019", "rating": "9.1"})));
        assert_eq!(drama.year, Some(2019));
        assert_eq!(drama.rating, 9.1);

        let drama = create(payload(json!({"year": "soon", "rating": {"x": 1}})));
        assert_eq!(drama.year, None);
        assert_eq!(drama.rating, 0.0);

        let drama = create(payload(json!({"year": 2020.7})));
        assert_eq!(drama.year, Some(2020));
    }

    #[test]
    fn create_coerces_sequences() {
        let drama = create(payload(json!({
            "genres": "Romance",
            "cast": ["A", 2, null, {"x": 1}],
            "tags": ["t"],
            "episodes": [{"title": "Pilot", "stream_url": "u"}, "junk", {"number": "5"}],
        })));
        assert!(drama.genres.is_empty());
        assert_eq!(drama.cast, vec!["A".to_owned(), "2".to_owned()]);
        assert_eq!(drama.tags, vec!["t".to_owned()]);
        assert_eq!(drama.episodes.len(), 2);
        assert_eq!(drama.episodes[0].number, 1);
        assert_eq!(drama.episodes[0].title, "Pilot");
        assert_eq!(drama.episodes[1].number, 5);
    }

    #[test]
    fn empty_country_and_status_fall_back() {
        let drama = create(payload(json!({"country": "", "status": ""})));
        assert_eq!(drama.country, DEFAULT_COUNTRY);
        assert_eq!(drama.status, DEFAULT_STATUS);
    }

    #[test]
    fn non_object_payload_carries_nothing() {
        let drama = create(payload(json!(["title", "x"])));
        assert_eq!(drama.title, DEFAULT_TITLE);
    }

    #[test]
    fn ids_are_unique() {
        let ids: HashSet<String> = (0..200).map(|_| create(DramaPayload::default()).id).collect();
        assert_eq!(ids.len(), 200);
    }

    #[test]
    fn update_merges_only_present_fields() {
        let mut drama = create(payload(json!({"title": "A", "year": 2020})));
        let before = drama.updated_at;
        update(&mut drama, payload(json!({"year": 2021})));
        assert_eq!(drama.title, "A");
        assert_eq!(drama.year, Some(2021));
        assert!(drama.updated_at > before);
    }

    #[test]
    fn update_ignores_protected_fields() {
        let mut drama = create(DramaPayload::default());
        let id = drama.id.clone();
        let created_at = drama.created_at;
        update(
            &mut drama,
            payload(json!({"id": "hijacked", "created_at": "1999-01-01T00:00:00.000Z"})),
        );
        assert_eq!(drama.id, id);
        assert_eq!(drama.created_at, created_at);
    }

    #[test]
    fn update_with_empty_payload_still_touches() {
        let mut drama = create(DramaPayload::default());
        let before = drama.updated_at;
        update(&mut drama, DramaPayload::default());
        assert!(drama.updated_at > before);
    }

    #[test]
    fn explicit_null_resets_field() {
        let mut drama = create(payload(json!({"year": 2001, "genres": ["A"]})));
        update(&mut drama, payload(json!({"year": null, "genres": null})));
        assert_eq!(drama.year, None);
        assert!(drama.genres.is_empty());
    }

    #[test]
    fn seed_count_parsing() {
        assert_eq!(parse_seed_count(None), DEFAULT_SEED_COUNT);
        assert_eq!(parse_seed_count(Some("abc")), DEFAULT_SEED_COUNT);
        assert_eq!(parse_seed_count(Some("3")), 3);
        assert_eq!(parse_seed_count(Some("3.9")), 3);
        assert_eq!(parse_seed_count(Some("0")), 0);
        assert_eq!(parse_seed_count(Some("-4")), 0);
        assert_eq!(parse_seed_count(Some("250")), 250);
    }

    #[test]
    fn seed_produces_distinct_records() {
        let dramas = seed(4);
        assert_eq!(dramas.len(), 4);
        let titles: HashSet<&str> = dramas.iter().map(|d| d.title.as_str()).collect();
        let ids: HashSet<&str> = dramas.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(titles.len(), 4);
        assert_eq!(ids.len(), 4);
        assert!(dramas.iter().all(|d| d.episodes.len() == 2));
    }
}
