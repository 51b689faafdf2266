mod browse;
mod search;
mod serve;
mod show;
mod types;

use std::fmt;

use anyhow::{Result, anyhow};
use bpaf::{Bpaf, Parser};
use dex_catalog::Client;
use indoc::indoc;
use tracing::debug;

use crate::config::Config;
use crate::utils::init::init_catalog_client;

static DEX_DESCRIPTION: &'_ str = indoc! {"
    dex explores the PokeAPI catalog.\n\n

    Run 'dex serve' to start the relay in front of PokeAPI,
    then browse, filter and inspect the catalog from the terminal."
};

fn vec_len<T>(x: Vec<T>) -> usize {
    Vec::len(&x)
}

#[derive(Bpaf, Clone, Copy, Debug)]
pub enum Verbosity {
    Verbose(
        /// Increase logging verbosity
        ///
        /// Invoke multiple times for increasing detail.
        #[bpaf(short('v'), long("verbose"), req_flag(()), many, map(vec_len))]
        usize,
    ),

    /// Silence logs except for errors
    #[bpaf(short, long)]
    Quiet,
}

impl Default for Verbosity {
    fn default() -> Self {
        Verbosity::Verbose(0)
    }
}

#[derive(Bpaf)]
#[bpaf(options, descr(DEX_DESCRIPTION))]
pub struct DexCli(#[bpaf(external(dex_args))] pub DexArgs);

/// Main dex args parser
///
/// This struct is used to parse the command line arguments
/// and allows to be composed with other parsers.
///
/// To parse the dex CLI, use [`DexCli`] instead using [`dex_cli()`].
#[derive(Debug, Bpaf)]
#[bpaf(ignore_rustdoc)] // we don't want this struct to be interpreted as a group
pub struct DexArgs {
    /// Verbose mode
    ///
    /// Invoke multiple times for increasing detail.
    #[bpaf(external, fallback(Default::default()))]
    pub verbosity: Verbosity,

    /// Print the version of the program
    #[allow(dead_code)] // fake arg, `--version` is checked for separately (see [Version])
    #[bpaf(long, short('V'))]
    version: bool,

    #[bpaf(external(commands), optional)]
    command: Option<Commands>,
}

impl fmt::Debug for Commands {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Command")
    }
}

impl DexArgs {
    pub async fn handle(self, config: Config) -> Result<()> {
        // Given no command, print the usage hint
        let Some(command) = self.command else {
            println!("{}", indoc! {"
                Usage: dex [-v]... [-q] COMMAND

                Use 'dex --help' for full list of commands and more information"
            });
            return Ok(());
        };

        let command = match command {
            // The relay handles interrupts itself to shut down gracefully
            Commands::Relay(args) => return args.handle(config).await,
            Commands::Explore(args) => args,
        };

        let client = init_catalog_client(&config)?;

        // Wait for either an interrupting signal or completion of the cli work.
        // Dropping the worker abandons in-flight requests.
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                debug!("interrupted, abandoning command");
                Err(anyhow!("user interrupted process"))
            }
            result = command.handle(config, client) => result
        }
    }
}

#[derive(Bpaf, Clone)]
enum Commands {
    Relay(#[bpaf(external(relay_commands))] RelayCommands),
    Explore(#[bpaf(external(explore_commands))] ExploreCommands),
}

/// Run the relay
#[derive(Bpaf, Clone)]
enum RelayCommands {
    /// Run the relay in front of PokeAPI
    #[bpaf(command)]
    Serve(#[bpaf(external(serve::serve))] serve::Serve),
}

impl RelayCommands {
    async fn handle(self, config: Config) -> Result<()> {
        match self {
            RelayCommands::Serve(args) => args.handle(config).await?,
        }
        Ok(())
    }
}

/// Explore the catalog
#[derive(Bpaf, Clone)]
enum ExploreCommands {
    /// Browse, filter and sort the catalog
    #[bpaf(command)]
    Browse(#[bpaf(external(browse::browse))] browse::Browse),

    /// Show details of a single entry
    #[bpaf(command)]
    Show(#[bpaf(external(show::show))] show::Show),

    /// List the category tags
    #[bpaf(command)]
    Types(#[bpaf(external(types::types))] types::Types),

    /// Look up an entry by exact name or number
    #[bpaf(command)]
    Search(#[bpaf(external(search::search))] search::Search),
}

impl ExploreCommands {
    async fn handle(self, config: Config, client: Client) -> Result<()> {
        match self {
            ExploreCommands::Browse(args) => args.handle(config, client).await?,
            ExploreCommands::Show(args) => args.handle(client).await?,
            ExploreCommands::Types(args) => args.handle(client).await?,
            ExploreCommands::Search(args) => args.handle(client).await?,
        }
        Ok(())
    }
}

/// Fake argument used to parse `--version` separately
///
/// bpaf allows `dex --invalid option --version`
/// (https://github.com/pacak/bpaf/issues/288) but common utilities,
/// such as git always require correct arguments even in the presence of
/// short circuiting flags such as `--version`
#[derive(Bpaf, Default)]
pub struct Version(#[bpaf(short('V'), long("version"))] bool);

impl Version {
    /// Parses to [Self] and extract the `--version` flag
    pub fn check() -> bool {
        bpaf::construct!(version(), dex_args())
            .to_options()
            .run_inner(bpaf::Args::current_args())
            .map(|(v, _)| v)
            .unwrap_or_default()
            .0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<DexArgs, bpaf::ParseFailure> {
        dex_cli().run_inner(args).map(|DexCli(args)| args)
    }

    #[test]
    fn parses_verbosity() {
        let args = parse(&["-vv", "types"]).unwrap();
        assert!(matches!(args.verbosity, Verbosity::Verbose(2)));
        let args = parse(&["-q", "types"]).unwrap();
        assert!(matches!(args.verbosity, Verbosity::Quiet));
    }

    #[test]
    fn parses_browse_filters() {
        let args = parse(&[
            "browse", "-s", "char", "-t", "fire", "-t", "flying", "--sort", "name-desc",
        ])
        .unwrap();
        let Some(Commands::Explore(ExploreCommands::Browse(browse))) = args.command else {
            panic!("expected browse command");
        };
        let filter = browse.filter();
        assert_eq!(filter.search_query, "char");
        assert_eq!(filter.selected_tags.len(), 2);
        assert_eq!(filter.sort_key, dex_catalog::SortKey::ByNameDescending);
    }

    #[test]
    fn rejects_unknown_sort_key() {
        assert!(parse(&["browse", "--sort", "weight"]).is_err());
    }

    #[test]
    fn show_requires_identifier() {
        assert!(parse(&["show"]).is_err());
        assert!(parse(&["show", "pikachu"]).is_ok());
    }
}
