use anyhow::{Context, Result};
use bpaf::Bpaf;
use dex_catalog::{Client, ClientTrait, SearchMatch};
use tracing::{debug, instrument};

use crate::utils::display::DisplayDetail;
use crate::utils::message;

// Look up an entry by exact name or number
#[derive(Debug, Bpaf, Clone)]
pub struct Search {
    /// Print the search response as JSON
    #[bpaf(long)]
    pub json: bool,

    /// Exact name or number to look up
    #[bpaf(positional("QUERY"))]
    pub query: String,
}

impl Search {
    #[instrument(name = "search", skip_all, fields(query = self.query))]
    pub async fn handle(self, client: Client) -> Result<()> {
        let response = client
            .search(&self.query)
            .await
            .context("Search failed")?;
        debug!(match_type = ?response.match_type, results = response.results.len());

        if self.json {
            println!("{}", serde_json::to_string_pretty(&response)?);
            return Ok(());
        }

        match (response.match_type, response.results.first()) {
            (SearchMatch::Exact, Some(detail)) => println!("{}", DisplayDetail(detail)),
            _ => message::plain(format!(
                "No exact match for '{query}'.\nUse 'dex browse -s {query}' to filter by partial names.",
                query = self.query.trim()
            )),
        }
        Ok(())
    }
}
