use std::process::ExitCode;

use anyhow::Result;
use bpaf::{Args, Parser};
use commands::{DexArgs, DexCli, Version};
use tracing::debug;
use utils::init::init_logger;
use utils::message;

mod commands;
mod config;
mod utils;

async fn run(args: DexArgs) -> Result<()> {
    init_logger(Some(args.verbosity));
    let config = config::Config::parse()?;
    args.handle(config).await?;
    Ok(())
}

fn main() -> ExitCode {
    // initialize logger with "best guess" defaults
    // updating the logger conf is cheap, so we reinitialize whenever we get more information
    init_logger(None);

    // Quit early if `--version` is present
    if Version::check() {
        println!("Version: {}", env!("CARGO_PKG_VERSION"));
        return ExitCode::from(0);
    }

    // Parse verbosity flags to affect help message/parse errors
    let verbosity = {
        let verbosity_parser = commands::verbosity();
        let other_parser = bpaf::any("_", Some::<String>).many();

        bpaf::construct!(verbosity_parser, other_parser)
            .map(|(v, _)| v)
            .to_options()
            .run_inner(Args::current_args())
            .unwrap_or_default()
    };

    init_logger(Some(verbosity));

    // Run the argument parser
    //
    // Pass through Completion "failure"; In completion mode this needs to be printed as is
    // to work with the shell completion frontends
    //
    // Pass through Stdout failure; This represents `--help`
    let args = match commands::dex_cli().run_inner(Args::current_args()) {
        Ok(DexCli(args)) => args,
        Err(bpaf::ParseFailure::Stdout(m, _)) => {
            print!("{m:80}");
            return ExitCode::from(0);
        },
        Err(bpaf::ParseFailure::Stderr(m)) => {
            message::error(format!("{m:80}"));
            return ExitCode::from(1);
        },
        Err(bpaf::ParseFailure::Completion(c)) => {
            print!("{c}");
            return ExitCode::from(0);
        },
    };

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(e) => {
            message::error(format!("could not start async runtime: {e}"));
            return ExitCode::from(1);
        },
    };

    // Run dex. Print errors and exit with status 1 on failure
    match runtime.block_on(run(args)) {
        Ok(()) => ExitCode::from(0),

        Err(e) => {
            debug!("{:#}", e);

            let err_str = e
                .chain()
                .skip(1)
                .fold(e.to_string(), |acc, cause| format!("{acc}: {cause}"));

            message::error(err_str);

            ExitCode::from(1)
        },
    }
}
