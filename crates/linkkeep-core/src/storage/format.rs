//! On-disk link file format
//!
//! The link file is a JSON object with three members:
//!
//! ```text
//! {
//!   "links": [ { "id", "url", "description", "categories", "tags",
//!                "created_at", "last_updated" }, ... ],
//!   "categories": [ ... ],
//!   "tags": [ ... ]
//! }
//! ```
//!
//! Reading is lenient: every link member except `url` may be missing or
//! null, timestamps may be RFC 3339 or naive local ISO-8601, and links
//! without a usable URL are skipped. The top-level `categories`/`tags`
//! arrays are informational; the store derives its own from the links.

use std::collections::HashSet;

use chrono::{DateTime, Local, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::models::Link;
use crate::store::Store;

/// Formats accepted for timestamps without an offset
const NAIVE_TIMESTAMP_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

#[derive(Serialize)]
struct StoreFileRef<'a> {
    links: &'a [Link],
    categories: Vec<&'a str>,
    tags: Vec<&'a str>,
}

#[derive(Deserialize)]
struct StoreFile {
    #[serde(default)]
    links: Option<Vec<StoredLink>>,
    #[serde(default)]
    categories: Option<Vec<String>>,
    #[serde(default)]
    tags: Option<Vec<String>>,
}

#[derive(Deserialize)]
struct StoredLink {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    categories: Option<Vec<String>>,
    #[serde(default)]
    tags: Option<Vec<String>>,
    #[serde(default)]
    created_at: Option<String>,
    #[serde(default)]
    last_updated: Option<String>,
}

/// Serialize a store to pretty-printed JSON
pub(crate) fn encode(store: &Store) -> serde_json::Result<Vec<u8>> {
    let file = StoreFileRef {
        links: store.links(),
        categories: store.categories().iter().map(String::as_str).collect(),
        tags: store.tags().iter().map(String::as_str).collect(),
    };
    serde_json::to_vec_pretty(&file)
}

/// Parse a link file into a store
pub(crate) fn decode(bytes: &[u8]) -> serde_json::Result<Store> {
    let file: StoreFile = serde_json::from_slice(bytes)?;
    let now = Utc::now();

    let mut seen_ids = HashSet::new();
    let links: Vec<Link> = file
        .links
        .unwrap_or_default()
        .into_iter()
        .enumerate()
        .filter_map(|(position, stored)| hydrate(stored, now, position, &mut seen_ids))
        .collect();

    let store = Store::from_links(links);

    let listed = file.categories.map(|c| c.len()).unwrap_or(0)
        + file.tags.map(|t| t.len()).unwrap_or(0);
    let derived = store.categories().len() + store.tags().len();
    if listed != derived {
        debug!(listed, derived, "Stored label lists differ from link labels");
    }

    Ok(store)
}

/// Build one link; ids already in `seen_ids` are replaced with fresh ones
fn hydrate(
    stored: StoredLink,
    now: DateTime<Utc>,
    position: usize,
    seen_ids: &mut HashSet<Uuid>,
) -> Option<Link> {
    let url = stored.url.unwrap_or_default();
    let mut id = stored
        .id
        .as_deref()
        .and_then(|id| Uuid::parse_str(id).ok())
        .unwrap_or_else(Uuid::new_v4);
    if !seen_ids.insert(id) {
        warn!("Stored link #{} repeats id {}; assigning a new one", position, id);
        id = Uuid::new_v4();
        seen_ids.insert(id);
    }
    let created_at = stored
        .created_at
        .as_deref()
        .and_then(parse_timestamp)
        .unwrap_or(now);
    let last_updated = stored
        .last_updated
        .as_deref()
        .and_then(parse_timestamp)
        .unwrap_or(now);

    match Link::hydrate(
        id,
        &url,
        stored.description.as_deref().unwrap_or(""),
        stored.categories.unwrap_or_default(),
        stored.tags.unwrap_or_default(),
        created_at,
        last_updated,
    ) {
        Ok(link) => Some(link),
        Err(e) => {
            warn!("Skipping stored link #{}: {}", position, e);
            None
        }
    }
}

/// Parse an RFC 3339 or naive (local time) ISO-8601 timestamp
pub(crate) fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }

    NAIVE_TIMESTAMP_FORMATS.iter().find_map(|format| {
        NaiveDateTime::parse_from_str(value, format)
            .ok()
            .and_then(|naive| naive.and_local_timezone(Local).earliest())
            .map(|local| local.with_timezone(&Utc))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_encode_decode_preserves_links() {
        let mut store = Store::new();
        store
            .add_link("a.com", "Alpha", ["dev"], ["x", "y"])
            .unwrap();
        store
            .add_link("http://b.com", "", Vec::<String>::new(), ["y"])
            .unwrap();

        let bytes = encode(&store).unwrap();
        let decoded = decode(&bytes).unwrap();
        assert_eq!(decoded, store);
    }

    #[test]
    fn test_encoded_shape() {
        let mut store = Store::new();
        store.add_link("a.com", "", ["c"], ["t"]).unwrap();

        let value: serde_json::Value = serde_json::from_slice(&encode(&store).unwrap()).unwrap();
        assert_eq!(value["categories"], serde_json::json!(["c"]));
        assert_eq!(value["tags"], serde_json::json!(["t"]));
        assert_eq!(value["links"][0]["url"], "https://a.com");
        assert!(value["links"][0]["created_at"].is_string());
        assert!(value["links"][0]["last_updated"].is_string());
    }

    #[test]
    fn test_decode_replaces_repeated_ids() {
        let json = r#"{
            "links": [
                {"id": "6f1c2d3e-4a5b-4c6d-8e7f-901234567890", "url": "a.com"},
                {"id": "6f1c2d3e-4a5b-4c6d-8e7f-901234567890", "url": "b.com"}
            ]
        }"#;

        let store = decode(json.as_bytes()).unwrap();
        let first = store.get(0).unwrap().id();
        let second = store.get(1).unwrap().id();

        assert_eq!(first.to_string(), "6f1c2d3e-4a5b-4c6d-8e7f-901234567890");
        assert_ne!(first, second);
        assert_eq!(store.position(first), Some(0));
        assert_eq!(store.position(second), Some(1));
    }

    #[test]
    fn test_decode_defaults_missing_fields() {
        let json = r#"{
            "links": [
                {"url": "example.com"},
                {"url": "https://two.com", "description": null, "tags": ["a", " a "]}
            ],
            "categories": [],
            "tags": ["stale"]
        }"#;

        let store = decode(json.as_bytes()).unwrap();
        assert_eq!(store.len(), 2);

        let first = store.get(0).unwrap();
        assert_eq!(first.url(), "https://example.com");
        assert_eq!(first.description(), "");
        assert!(first.categories().is_empty());

        assert_eq!(store.get(1).unwrap().tags(), ["a"]);
        assert!(!store.tags().contains("stale"));
    }

    #[test]
    fn test_decode_skips_links_without_url() {
        let json = r#"{"links": [{"description": "orphan"}, {"url": "  "}, {"url": "ok.com"}]}"#;
        let store = decode(json.as_bytes()).unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.get(0).unwrap().url(), "https://ok.com");
    }

    #[test]
    fn test_decode_keeps_timestamps_and_id() {
        let json = r#"{"links": [{
            "id": "7f2c1e9a-4b1d-4c55-9a57-0e4f3f6b2d10",
            "url": "https://a.com",
            "created_at": "2024-03-01T10:00:00Z",
            "last_updated": "2024-03-02T11:30:00+00:00"
        }]}"#;

        let store = decode(json.as_bytes()).unwrap();
        let link = store.get(0).unwrap();
        assert_eq!(
            link.id().to_string(),
            "7f2c1e9a-4b1d-4c55-9a57-0e4f3f6b2d10"
        );
        assert_eq!(
            link.created_at(),
            Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap()
        );
        assert_eq!(
            link.last_updated(),
            Utc.with_ymd_and_hms(2024, 3, 2, 11, 30, 0).unwrap()
        );
    }

    #[test]
    fn test_decode_rejects_malformed_json() {
        assert!(decode(b"{not json").is_err());
        assert!(decode(b"").is_err());
        assert!(decode(b"[1, 2, 3]").is_err());
    }

    #[test]
    fn test_parse_naive_timestamp() {
        let parsed = parse_timestamp("2023-07-14T09:15:30.123456").unwrap();
        let expected = Local
            .with_ymd_and_hms(2023, 7, 14, 9, 15, 30)
            .earliest()
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(parsed.timestamp(), expected.timestamp());

        assert!(parse_timestamp("2023-07-14T09:15:30").is_some());
        assert!(parse_timestamp("yesterday").is_none());
    }
}
