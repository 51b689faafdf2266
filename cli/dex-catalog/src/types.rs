//! Catalog interaction types.
//!
//! The wire types mirror what PokeAPI returns (and the relay passes through
//! unchanged). Unknown fields are ignored, so only the attributes the
//! explorer renders are modelled.

use std::fmt::Display;
use std::num::NonZeroU32;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Result / pagination types
// ---------------------------------------------------------------------------

/// Generic paginated result container as returned by list endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultsPage<T> {
    pub count: u64,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<T>,
}

impl<T> ResultsPage<T> {
    /// Whether the remote reported a further page.
    pub fn has_next(&self) -> bool {
        self.next.is_some()
    }
}

/// A name together with the locator of the full resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NamedResource {
    pub name: String,
    #[serde(default)]
    pub url: String,
}

impl NamedResource {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }
}

/// One page of the catalog list.
pub type ListPage = ResultsPage<NamedResource>;
/// The taxonomy of category tags (PokeAPI `/type`).
pub type TypeList = ResultsPage<NamedResource>;

// ---------------------------------------------------------------------------
// Detail record
// ---------------------------------------------------------------------------

/// Immutable snapshot of one catalog item's attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogItemDetail {
    pub id: u32,
    pub name: String,
    #[serde(default)]
    pub sprites: Sprites,
    #[serde(default)]
    pub types: Vec<TypeSlot>,
    /// Height in decimetres
    pub height: u32,
    /// Weight in hectograms
    pub weight: u32,
    #[serde(default)]
    pub stats: Vec<BaseStat>,
    #[serde(default)]
    pub abilities: Vec<AbilitySlot>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sprites {
    #[serde(default)]
    pub front_default: Option<String>,
    #[serde(default)]
    pub other: Option<OtherSprites>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OtherSprites {
    #[serde(default, rename = "official-artwork")]
    pub official_artwork: Option<Artwork>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artwork {
    #[serde(default)]
    pub front_default: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeSlot {
    #[serde(default)]
    pub slot: u8,
    #[serde(rename = "type")]
    pub type_: NamedResource,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseStat {
    pub base_stat: u32,
    #[serde(default)]
    pub effort: u32,
    pub stat: NamedResource,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbilitySlot {
    pub ability: NamedResource,
    #[serde(default)]
    pub is_hidden: bool,
    #[serde(default)]
    pub slot: u8,
}

const ARTWORK_BASE_URL: &str =
    "https://raw.githubusercontent.com/PokeAPI/sprites/master/sprites/pokemon/other/official-artwork";

impl CatalogItemDetail {
    /// The category tags of this item, in slot order.
    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.types.iter().map(|slot| slot.type_.name.as_str())
    }

    /// The first category tag, if any.
    pub fn primary_tag(&self) -> Option<&str> {
        self.tags().next()
    }

    /// Sum of the base stats, saturating at `u32::MAX`.
    pub fn stat_total(&self) -> u32 {
        self.stats
            .iter()
            .fold(0u32, |total, stat| total.saturating_add(stat.base_stat))
    }

    pub fn height_m(&self) -> f64 {
        f64::from(self.height) / 10.0
    }

    pub fn weight_kg(&self) -> f64 {
        f64::from(self.weight) / 10.0
    }

    /// Official artwork, falling back to the well-known sprite location.
    pub fn artwork_url(&self) -> String {
        self.sprites
            .other
            .as_ref()
            .and_then(|other| other.official_artwork.as_ref())
            .and_then(|artwork| artwork.front_default.clone())
            .unwrap_or_else(|| image_url(self.id))
    }

    /// Identifiers of the neighbouring entries as `(previous, next)`.
    ///
    /// `previous` is absent for the first entry, `next` for the largest identifier.
    pub fn neighbours(&self) -> (Option<u32>, Option<u32>) {
        let previous = (self.id > 1).then(|| self.id - 1);
        (previous, self.id.checked_add(1))
    }
}

/// Location of the official artwork for a numeric identifier.
pub fn image_url(id: u32) -> String {
    format!("{ARTWORK_BASE_URL}/{id}.png")
}

// ---------------------------------------------------------------------------
// Catalog entries
// ---------------------------------------------------------------------------

/// One listable item of the catalog.
///
/// `detail` is attached once the follow-up fetch succeeded and is shared
/// with the loader's per-session cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub name: String,
    #[serde(rename = "url")]
    pub reference_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<Arc<CatalogItemDetail>>,
}

impl CatalogEntry {
    pub fn new(name: impl Into<String>, reference_url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            reference_url: reference_url.into(),
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: Arc<CatalogItemDetail>) -> Self {
        self.detail = Some(detail);
        self
    }

    /// Numeric identifier encoded in the reference locator.
    pub fn identifier(&self) -> Option<u32> {
        identifier_from_url(&self.reference_url)
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.detail
            .as_ref()
            .is_some_and(|detail| detail.tags().any(|t| t == tag))
    }
}

impl From<NamedResource> for CatalogEntry {
    fn from(resource: NamedResource) -> Self {
        CatalogEntry::new(resource.name, resource.url)
    }
}

/// Parse the identifier from the second-to-last path segment of a locator,
/// e.g. `https://pokeapi.co/api/v2/pokemon/25/` -> `25`.
pub fn identifier_from_url(url: &str) -> Option<u32> {
    let mut segments = url.rsplit('/');
    segments.next()?;
    segments.next()?.parse().ok()
}

/// Capitalize the first character of a catalog name.
pub fn format_name(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

// ---------------------------------------------------------------------------
// Identifiers
// ---------------------------------------------------------------------------

/// Address of a single catalog item, either by number or by lowercase name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ItemId {
    Number(NonZeroU32),
    Name(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidItemId {
    #[error("identifier must not be empty")]
    Empty,
    #[error("identifier must be a positive number")]
    Zero,
    #[error("identifier '{0}' contains characters other than letters, digits and '-'")]
    InvalidCharacters(String),
}

impl FromStr for ItemId {
    type Err = InvalidItemId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(InvalidItemId::Empty);
        }

        if s.bytes().all(|b| b.is_ascii_digit()) {
            return match s.parse::<u32>() {
                Ok(n) => NonZeroU32::new(n).map(ItemId::Number).ok_or(InvalidItemId::Zero),
                Err(_) => Err(InvalidItemId::InvalidCharacters(s.to_string())),
            };
        }

        let name = s.to_lowercase();
        if !name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        {
            return Err(InvalidItemId::InvalidCharacters(s.to_string()));
        }
        Ok(ItemId::Name(name))
    }
}

impl Display for ItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ItemId::Number(n) => write!(f, "{n}"),
            ItemId::Name(name) => write!(f, "{name}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Relay-specific bodies
// ---------------------------------------------------------------------------

/// How a search result was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchMatch {
    Exact,
    Partial,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    pub results: Vec<CatalogItemDetail>,
    #[serde(rename = "type")]
    pub match_type: SearchMatch,
}

/// Normalized error body returned by the relay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub error: String,
}

#[cfg(test)]
mod tests {
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn identifier_is_second_to_last_segment() {
        assert_eq!(
            identifier_from_url("https://pokeapi.co/api/v2/pokemon/25/"),
            Some(25)
        );
        assert_eq!(identifier_from_url("https://pokeapi.co/api/v2/pokemon/25"), None);
        assert_eq!(identifier_from_url(""), None);
        assert_eq!(identifier_from_url("/pokemon/abc/"), None);
    }

    #[test]
    fn format_name_capitalizes_first_character() {
        assert_eq!(format_name("pikachu"), "Pikachu");
        assert_eq!(format_name("mr-mime"), "Mr-mime");
        assert_eq!(format_name(""), "");
    }

    #[test]
    fn item_id_parses_numbers_and_names() {
        assert_eq!(
            "25".parse::<ItemId>(),
            Ok(ItemId::Number(NonZeroU32::new(25).unwrap()))
        );
        assert_eq!("Pikachu".parse::<ItemId>(), Ok(ItemId::Name("pikachu".into())));
        assert_eq!("mr-mime".parse::<ItemId>(), Ok(ItemId::Name("mr-mime".into())));
        assert_eq!("0".parse::<ItemId>(), Err(InvalidItemId::Zero));
        assert_eq!("".parse::<ItemId>(), Err(InvalidItemId::Empty));
        assert!(matches!(
            "../etc".parse::<ItemId>(),
            Err(InvalidItemId::InvalidCharacters(_))
        ));
        assert!(matches!(
            "99999999999".parse::<ItemId>(),
            Err(InvalidItemId::InvalidCharacters(_))
        ));
    }

    #[test]
    fn detail_ignores_unknown_fields() {
        let json = indoc! {r#"
            {
                "id": 25,
                "name": "pikachu",
                "base_experience": 112,
                "height": 4,
                "weight": 60,
                "types": [
                    { "slot": 1, "type": { "name": "electric", "url": "https://pokeapi.co/api/v2/type/13/" } }
                ],
                "stats": [
                    { "base_stat": 35, "effort": 0, "stat": { "name": "hp", "url": "" } },
                    { "base_stat": 55, "effort": 0, "stat": { "name": "attack", "url": "" } }
                ],
                "abilities": [
                    { "ability": { "name": "static", "url": "" }, "is_hidden": false, "slot": 1 }
                ],
                "sprites": { "front_default": null, "other": { "official-artwork": { "front_default": "art.png" } } }
            }
        "#};
        let detail: CatalogItemDetail = serde_json::from_str(json).unwrap();
        assert_eq!(detail.tags().collect::<Vec<_>>(), vec!["electric"]);
        assert_eq!(detail.stat_total(), 90);
        assert_eq!(detail.height_m(), 0.4);
        assert_eq!(detail.weight_kg(), 6.0);
        assert_eq!(detail.artwork_url(), "art.png");
        assert_eq!(detail.neighbours(), (Some(24), Some(26)));
    }

    #[test]
    fn artwork_falls_back_to_well_known_location() {
        let json = r#"{ "id": 1, "name": "bulbasaur", "height": 7, "weight": 69 }"#;
        let detail: CatalogItemDetail = serde_json::from_str(json).unwrap();
        assert_eq!(detail.artwork_url(), image_url(1));
        assert_eq!(detail.neighbours(), (None, Some(2)));
    }

    #[test]
    fn extreme_values_do_not_overflow() {
        let json = r#"{
            "id": 4294967295,
            "name": "glitch",
            "height": 0,
            "weight": 0,
            "stats": [
                { "base_stat": 4294967295, "stat": { "name": "hp", "url": "" } },
                { "base_stat": 10, "stat": { "name": "attack", "url": "" } }
            ]
        }"#;
        let detail: CatalogItemDetail = serde_json::from_str(json).unwrap();
        assert_eq!(detail.neighbours(), (Some(u32::MAX - 1), None));
        assert_eq!(detail.stat_total(), u32::MAX);
    }
}
