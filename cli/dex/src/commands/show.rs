use anyhow::{Context, Result, bail};
use bpaf::Bpaf;
use dex_catalog::{Client, ClientTrait, DetailError, ItemId};
use tracing::instrument;

use crate::utils::display::DisplayDetail;

// Show details of a single entry
#[derive(Debug, Bpaf, Clone)]
pub struct Show {
    /// Print the detail record as JSON
    #[bpaf(long)]
    pub json: bool,

    /// Number or name of the entry, e.g. '25' or 'pikachu'
    #[bpaf(positional("ID_OR_NAME"))]
    pub id_or_name: String,
}

impl Show {
    #[instrument(name = "show", skip_all, fields(id_or_name = self.id_or_name))]
    pub async fn handle(self, client: Client) -> Result<()> {
        let id = self
            .id_or_name
            .parse::<ItemId>()
            .context("Invalid Pokemon ID")?;

        let detail = match client.detail(&id).await {
            Ok(detail) => detail,
            Err(DetailError::NotFound(_)) => {
                bail!("Pokemon '{id}' not found. Use 'dex search' to look up names and numbers.")
            },
            Err(err) => return Err(err).context("Failed to load Pokemon"),
        };

        if self.json {
            println!("{}", serde_json::to_string_pretty(&detail)?);
        } else {
            println!("{}", DisplayDetail(&detail));
        }
        Ok(())
    }
}
