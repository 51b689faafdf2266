use anyhow::{Result, bail};
use bpaf::Bpaf;
use dex_catalog::{
    CatalogLoader,
    Client,
    ClientTrait,
    LoadOutcome,
    SortKey,
    ViewFilterState,
    ViewSummary,
    derive_view,
};
use serde_json::json;
use tracing::{debug, instrument};

use crate::config::Config;
use crate::utils::display::DisplayCards;
use crate::utils::message;

const LOAD_FAILED: &str = "Failed to load Pokemon. Please try again.";
const LOAD_MORE_HINT: &str = "Use '--pages N' to load more.";

// Browse, filter and sort the catalog
#[derive(Debug, Bpaf, Clone)]
pub struct Browse {
    /// Only show entries whose name contains QUERY (case-insensitive)
    /// or whose number contains it
    #[bpaf(short('s'), long("search"), argument("QUERY"))]
    pub search: Option<String>,

    /// Only show entries of this type, can be repeated
    #[bpaf(short('t'), long("type"), argument("TYPE"), many)]
    pub types: Vec<String>,

    /// Sort order, one of 'id', 'name' or 'name-desc'
    #[bpaf(long, argument("ORDER"), fallback(SortKey::default()), display_fallback)]
    pub sort: SortKey,

    /// Number of further pages to load after the first one.
    ///
    /// Further pages are only loaded while no search or type filter is set.
    #[bpaf(long, argument("N"), fallback(0))]
    pub pages: usize,

    /// Print the view as JSON
    #[bpaf(long)]
    pub json: bool,
}

impl Browse {
    pub fn filter(&self) -> ViewFilterState {
        ViewFilterState {
            search_query: self.search.clone().unwrap_or_default(),
            selected_tags: self.types.iter().map(|tag| tag.to_lowercase()).collect(),
            sort_key: self.sort,
        }
    }

    #[instrument(name = "browse", skip_all, fields(pages = self.pages, json = self.json))]
    pub async fn handle(self, config: Config, client: Client) -> Result<()> {
        let filter = self.filter();
        let loader = CatalogLoader::new(client, config.loader_config());

        self.load(&loader, &filter).await?;

        let entries = loader.entries();
        let view = derive_view(&entries, &filter);
        let summary = ViewSummary::new(&entries, &view, &filter);

        if self.json {
            let output = json!({
                "shown": summary.shown,
                "total": summary.total,
                "has_more": loader.state().has_more,
                "entries": view,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
            return Ok(());
        }

        if !view.is_empty() {
            println!("{}", DisplayCards(&view));
        }
        message::plain(&summary);
        if let Some((headline, hint)) = summary.no_results_hint() {
            message::plain(format!("{headline}\n{hint}"));
        }
        if loader.can_load_more(&filter) {
            message::plain(LOAD_MORE_HINT);
        }
        Ok(())
    }

    /// Load the first page, then up to `pages` further pages.
    async fn load<C: ClientTrait>(
        &self,
        loader: &CatalogLoader<C>,
        filter: &ViewFilterState,
    ) -> Result<()> {
        if let LoadOutcome::Failed(kind) = loader.load_initial().await {
            debug!(%kind, "initial load failed");
            bail!(LOAD_FAILED);
        }

        for _ in 0..self.pages {
            if !loader.can_load_more(filter) {
                break;
            }
            match loader.load_more().await {
                LoadOutcome::Published { appended } => debug!(appended, "loaded more entries"),
                LoadOutcome::Skipped => break,
                // The loaded entries stay usable
                LoadOutcome::Failed(kind) => {
                    message::warning(format!("Could not load more Pokemon: {kind}"));
                    break;
                },
            }
        }
        Ok(())
    }
}
