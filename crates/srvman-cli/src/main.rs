//! CLI entry point - the composition root.
//!
//! Parses arguments, initialises logging, builds the [`CliContext`] via
//! bootstrap and routes each command to its handler.

use clap::{CommandFactory, Parser};
use tracing_subscriber::EnvFilter;

use srvman_cli::{Cli, CliConfig, CliContext, CliError, Commands, bootstrap, handlers};

const DEFAULT_FILTER: &str = "srvman_core=info,srvman_runtime=info,srvman_cli=info";
const VERBOSE_FILTER: &str = "srvman_core=debug,srvman_runtime=debug,srvman_cli=debug";

#[tokio::main]
async fn main() {
    // Load .env before clap reads env fallbacks
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli).await {
        let code = e.downcast_ref::<CliError>().map_or(1, CliError::exit_code);
        eprintln!("Error: {e:#}");
        std::process::exit(code);
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { VERBOSE_FILTER } else { DEFAULT_FILTER };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let Some(command) = cli.command.as_ref() else {
        Cli::command().print_help()?;
        return Ok(());
    };

    let config = CliConfig::from_cli(&cli)?;
    let ctx = bootstrap(config)?;
    dispatch(&ctx, command).await
}

async fn dispatch(ctx: &CliContext, command: &Commands) -> anyhow::Result<()> {
    match command {
        Commands::Paths => handlers::paths::execute(ctx)?,
        Commands::List { json } => handlers::list::execute(ctx, *json).await?,
        Commands::Add {
            name,
            dir,
            jar,
            ram,
            proxy,
        } => handlers::add::execute(ctx, name, dir, jar, *ram, *proxy).await?,
        Commands::Remove { name } => handlers::remove::execute(ctx, name).await?,
        Commands::Show { name, json } => handlers::show::execute(ctx, name, *json).await?,
        Commands::Ports { filter, all, page } => {
            handlers::ports::execute(ctx, filter.as_deref(), *all, *page).await?;
        }
        Commands::Close { ports } => handlers::close::execute(ctx, ports).await?,
        Commands::Run { name } => handlers::run::execute(ctx, name).await?,
        Commands::Console => handlers::console::execute(ctx).await?,
    }
    Ok(())
}
