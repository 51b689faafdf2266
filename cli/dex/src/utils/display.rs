//! Text rendering of catalog entries, details and tags.

use std::fmt::{self, Display};

use dex_catalog::{CatalogEntry, CatalogItemDetail, NamedResource, format_name};
use itertools::Itertools;

/// Shown instead of tags for entries whose detail could not be fetched.
const DETAIL_PLACEHOLDER: &str = "(details unavailable)";
/// Base stat value rendered as a full bar.
const STAT_SCALE: u32 = 150;
const STAT_BAR_WIDTH: u32 = 20;
const TAGS_LINE_WIDTH: usize = 80;

/// Zero padded catalog number, e.g. `#025`.
pub fn catalog_number(id: u32) -> String {
    format!("#{id:03}")
}

/// Human readable name of a base stat.
pub fn stat_display_name(stat: &str) -> String {
    match stat {
        "hp" => "HP".to_string(),
        "attack" => "Attack".to_string(),
        "defense" => "Defense".to_string(),
        "special-attack" => "Sp. Attack".to_string(),
        "special-defense" => "Sp. Defense".to_string(),
        "speed" => "Speed".to_string(),
        other => format_name(other),
    }
}

/// Share of [STAT_SCALE] in percent, not capped.
fn stat_percent(base_stat: u32) -> u32 {
    base_stat
        .saturating_mul(100)
        .saturating_add(STAT_SCALE / 2)
        / STAT_SCALE
}

fn stat_bar(base_stat: u32) -> String {
    let filled = (base_stat.min(STAT_SCALE) * STAT_BAR_WIDTH + STAT_SCALE / 2) / STAT_SCALE;
    let empty = STAT_BAR_WIDTH - filled;
    format!(
        "[{}{}]",
        "#".repeat(filled as usize),
        ".".repeat(empty as usize)
    )
}

fn formatted_tags(detail: &CatalogItemDetail) -> String {
    detail.tags().map(format_name).join(", ")
}

/// One line per entry: number, name, tags and physical attributes.
pub struct DisplayCards<'a>(pub &'a [&'a CatalogEntry]);

impl DisplayCards<'_> {
    fn columns(entry: &CatalogEntry) -> [String; 4] {
        let number = entry
            .identifier()
            .map(catalog_number)
            .unwrap_or_else(|| "#???".to_string());
        let name = format_name(&entry.name);
        let (tags, physical) = match &entry.detail {
            Some(detail) => (
                formatted_tags(detail),
                format!("{:.1}m  {:.1}kg", detail.height_m(), detail.weight_kg()),
            ),
            None => (DETAIL_PLACEHOLDER.to_string(), String::new()),
        };
        [number, name, tags, physical]
    }
}

impl Display for DisplayCards<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rows = self.0.iter().map(|entry| Self::columns(entry)).collect_vec();

        let width = |column: usize| {
            rows.iter()
                .map(|row| row[column].chars().count())
                .max()
                .unwrap_or_default()
        };
        let (number_width, name_width, tags_width) = (width(0), width(1), width(2));

        let mut rows = rows.iter().peekable();
        while let Some([number, name, tags, physical]) = rows.next() {
            let line = format!(
                "{number:<number_width$}  {name:<name_width$}  {tags:<tags_width$}  {physical}"
            );
            write!(f, "{}", line.trim_end())?;
            // Only print a newline if there are more rows to print
            if rows.peek().is_some() {
                writeln!(f)?;
            }
        }
        Ok(())
    }
}

/// Full detail view of a single item.
pub struct DisplayDetail<'a>(pub &'a CatalogItemDetail);

impl Display for DisplayDetail<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let detail = self.0;

        writeln!(
            f,
            "{} {}",
            catalog_number(detail.id),
            format_name(&detail.name)
        )?;
        writeln!(f, "Types:   {}", formatted_tags(detail))?;
        writeln!(f, "Height:  {:.1}m", detail.height_m())?;
        writeln!(f, "Weight:  {:.1}kg", detail.weight_kg())?;
        writeln!(f, "Artwork: {}", detail.artwork_url())?;

        if !detail.stats.is_empty() {
            writeln!(f)?;
            writeln!(f, "Base Stats")?;
            for stat in &detail.stats {
                writeln!(
                    f,
                    "  {:<11}  {:>3}  {}  {}%",
                    stat_display_name(&stat.stat.name),
                    stat.base_stat,
                    stat_bar(stat.base_stat),
                    stat_percent(stat.base_stat)
                )?;
            }
            writeln!(f, "  {:<11}  {:>3}", "Total", detail.stat_total())?;
        }

        if !detail.abilities.is_empty() {
            writeln!(f)?;
            writeln!(f, "Abilities")?;
            for ability in &detail.abilities {
                let hidden = if ability.is_hidden { " (hidden)" } else { "" };
                writeln!(f, "  {}{hidden}", format_name(&ability.ability.name))?;
            }
        }

        let neighbours = match detail.neighbours() {
            (Some(previous), Some(next)) => format!(
                "Previous: {}  Next: {}",
                catalog_number(previous),
                catalog_number(next)
            ),
            (Some(previous), None) => format!("Previous: {}", catalog_number(previous)),
            (None, Some(next)) => format!("Next: {}", catalog_number(next)),
            (None, None) => return Ok(()),
        };
        writeln!(f)?;
        write!(f, "{neighbours}")
    }
}

/// Category tags, wrapped to the terminal width.
pub struct DisplayTags<'a>(pub &'a [NamedResource]);

impl Display for DisplayTags<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tags = self.0.iter().map(|tag| tag.name.as_str()).join(", ");
        write!(f, "{}", textwrap::fill(&tags, TAGS_LINE_WIDTH))
    }
}
