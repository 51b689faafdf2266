//! Fixtures shared by the tests of this crate and its dependents.

use std::fmt::Display;
use std::sync::{Arc, Mutex};

use serde_json::json;

use crate::types::*;

const POKEMON_URL: &str = "https://pokeapi.co/api/v2/pokemon";

/// A list resource whose locator encodes `id`.
pub fn resource(name: &str, id: u32) -> NamedResource {
    NamedResource::new(name, format!("{POKEMON_URL}/{id}/"))
}

/// A bare (not enriched) catalog entry.
pub fn entry(name: &str, id: u32) -> CatalogEntry {
    resource(name, id).into()
}

/// A catalog entry carrying a detail with the given tags.
pub fn enriched_entry(name: &str, id: u32, tags: &[&str]) -> CatalogEntry {
    entry(name, id).with_detail(Arc::new(detail(id, name, tags)))
}

pub fn detail(id: u32, name: &str, tags: &[&str]) -> CatalogItemDetail {
    serde_json::from_value(detail_json(id, name, tags)).expect("fixture should deserialize")
}

/// Detail body in the shape PokeAPI returns it.
pub fn detail_json(id: u32, name: &str, tags: &[&str]) -> serde_json::Value {
    let types: Vec<_> = tags
        .iter()
        .enumerate()
        .map(|(i, tag)| {
            json!({
                "slot": i + 1,
                "type": { "name": tag, "url": format!("https://pokeapi.co/api/v2/type/{tag}/") },
            })
        })
        .collect();
    json!({
        "id": id,
        "name": name,
        "height": 7,
        "weight": 69,
        "base_experience": 64,
        "types": types,
        "stats": [
            { "base_stat": 45, "effort": 0, "stat": { "name": "hp", "url": "" } },
            { "base_stat": 49, "effort": 0, "stat": { "name": "attack", "url": "" } },
        ],
        "abilities": [
            { "ability": { "name": "overgrow", "url": "" }, "is_hidden": false, "slot": 1 },
        ],
        "sprites": {
            "front_default": null,
            "other": { "official-artwork": { "front_default": image_url(id) } },
        },
    })
}

/// A list page of `(name, id)` pairs.
pub fn list_page(count: u64, has_next: bool, items: &[(&str, u32)]) -> ListPage {
    ListPage {
        count,
        next: has_next.then(|| format!("{POKEMON_URL}?offset=20&limit=20")),
        previous: None,
        results: items.iter().map(|(name, id)| resource(name, *id)).collect(),
    }
}

#[derive(Clone, Debug, Default)]
pub struct CollectingWriter {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl Display for CollectingWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let buffer = self.buffer.lock().unwrap();
        let str_content = String::from_utf8_lossy(&buffer);
        write!(f, "{str_content}")
    }
}

impl<'w> tracing_subscriber::fmt::MakeWriter<'w> for CollectingWriter {
    type Writer = <Mutex<Vec<u8>> as tracing_subscriber::fmt::MakeWriter<'w>>::Writer;

    fn make_writer(&'w self) -> Self::Writer {
        (*self.buffer).make_writer()
    }
}

/// A subscriber capturing formatted events, levels included, into a buffer.
pub fn test_subscriber() -> (impl tracing::Subscriber, CollectingWriter) {
    let writer = CollectingWriter::default();

    let subscriber = tracing_subscriber::fmt()
        .with_writer(writer.clone())
        .compact()
        .without_time()
        .with_ansi(false)
        .with_target(false)
        .finish();

    (subscriber, writer)
}
