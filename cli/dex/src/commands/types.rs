use anyhow::{Context, Result};
use bpaf::Bpaf;
use dex_catalog::{Client, ClientTrait};
use tracing::instrument;

use crate::utils::display::DisplayTags;
use crate::utils::message;

// List the category tags
#[derive(Debug, Bpaf, Clone)]
pub struct Types {
    /// Print the tags as JSON
    #[bpaf(long)]
    pub json: bool,
}

impl Types {
    #[instrument(name = "types", skip_all)]
    pub async fn handle(self, client: Client) -> Result<()> {
        let types = client
            .types()
            .await
            .context("Failed to fetch Pokemon types")?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&types.results)?);
            return Ok(());
        }

        if types.results.is_empty() {
            message::warning("The catalog reported no types");
            return Ok(());
        }
        println!("{}", DisplayTags(&types.results));
        Ok(())
    }
}
