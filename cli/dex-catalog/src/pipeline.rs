//! Filtering and sorting of loaded entries into the displayed view.

use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt::Display;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::CatalogEntry;

/// Order of the derived view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortKey {
    /// Ascending numeric identifier
    #[default]
    #[serde(rename = "id")]
    ByIdentifier,
    #[serde(rename = "name")]
    ByNameAscending,
    #[serde(rename = "name-desc")]
    ByNameDescending,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown sort order '{0}', expected one of 'id', 'name', 'name-desc'")]
pub struct UnknownSortKey(String);

impl FromStr for SortKey {
    type Err = UnknownSortKey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "id" => Ok(SortKey::ByIdentifier),
            "name" => Ok(SortKey::ByNameAscending),
            "name-desc" => Ok(SortKey::ByNameDescending),
            other => Err(UnknownSortKey(other.to_string())),
        }
    }
}

impl Display for SortKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SortKey::ByIdentifier => "id",
            SortKey::ByNameAscending => "name",
            SortKey::ByNameDescending => "name-desc",
        };
        write!(f, "{s}")
    }
}

/// User controlled filter and sort settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewFilterState {
    pub search_query: String,
    pub selected_tags: BTreeSet<String>,
    pub sort_key: SortKey,
}

impl ViewFilterState {
    pub fn is_filtering(&self) -> bool {
        !self.search_query.is_empty() || !self.selected_tags.is_empty()
    }

    fn matches_query(&self, entry: &CatalogEntry) -> bool {
        if self.search_query.is_empty() {
            return true;
        }
        // Names match case-insensitively, the locator literally, so that a
        // numeric query finds the entry by identifier.
        entry
            .name
            .to_lowercase()
            .contains(&self.search_query.to_lowercase())
            || entry.reference_url.contains(&self.search_query)
    }

    fn matches_tags(&self, entry: &CatalogEntry) -> bool {
        self.selected_tags.is_empty()
            || entry
                .detail
                .as_ref()
                .is_some_and(|detail| detail.tags().any(|tag| self.selected_tags.contains(tag)))
    }
}

/// Derive the displayed view from the loaded entries.
///
/// The result borrows from `entries` which is neither reordered nor modified.
pub fn derive_view<'a>(
    entries: &'a [CatalogEntry],
    filter: &ViewFilterState,
) -> Vec<&'a CatalogEntry> {
    let mut view: Vec<&CatalogEntry> = entries
        .iter()
        .filter(|entry| filter.matches_query(entry) && filter.matches_tags(entry))
        .collect();

    match filter.sort_key {
        SortKey::ByIdentifier => view.sort_by(|a, b| compare_identifiers(a, b)),
        SortKey::ByNameAscending => view.sort_by(|a, b| compare_names(&a.name, &b.name)),
        SortKey::ByNameDescending => view.sort_by(|a, b| compare_names(&b.name, &a.name)),
    }
    view
}

/// Entries without a parseable identifier go last.
fn compare_identifiers(a: &CatalogEntry, b: &CatalogEntry) -> Ordering {
    match (a.identifier(), b.identifier()) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Case-insensitive comparison, lowercase before uppercase on ties.
fn compare_names(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| b.cmp(a))
}

/// The results line shown above the view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewSummary {
    pub shown: usize,
    pub total: usize,
    pub filtering: bool,
}

impl ViewSummary {
    pub fn new(entries: &[CatalogEntry], view: &[&CatalogEntry], filter: &ViewFilterState) -> Self {
        Self {
            shown: view.len(),
            total: entries.len(),
            filtering: filter.is_filtering(),
        }
    }

    /// Headline and hint for a filtered view without results.
    pub fn no_results_hint(&self) -> Option<(&'static str, &'static str)> {
        (self.filtering && self.shown == 0).then_some((
            "No Pokemon found matching your criteria",
            "Try adjusting your search or filters",
        ))
    }
}

impl Display for ViewSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.filtering {
            write!(f, "Showing {} results", self.shown)
        } else {
            write!(f, "Showing {} Pokemon", self.shown)
        }
    }
}
