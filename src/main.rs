use anyhow::Result;
use clap::Parser;

use factionkeep::cli::output::{self, OutputConfig};
use factionkeep::cli::{check, faction, run, Cli, ColorChoice, Commands};
use factionkeep::infrastructure::config::logging::LoggingConfig;

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {}
    }
    output::configure(OutputConfig {
        json: cli.json,
        quiet: cli.quiet,
    });

    if let Err(e) = dispatch(&cli).await {
        output::error(&format!("{e:#}"));
        std::process::exit(1);
    }
}

async fn dispatch(cli: &Cli) -> Result<()> {
    let config = cli.config.as_path();

    if !matches!(cli.command, Commands::Run(_)) {
        // One-shot commands only surface warnings unless RUST_LOG says otherwise.
        LoggingConfig {
            level: "warn".into(),
            format: "pretty".into(),
        }
        .init();
    }

    match &cli.command {
        Commands::Run(args) => run::execute(config, args).await,
        Commands::List => faction::list(config).await,
        Commands::Show(arg) => faction::show(config, &arg.id).await,
        Commands::Create(args) => faction::create(config, args).await,
        Commands::Delete(arg) => faction::delete(config, &arg.id).await,
        Commands::Deposit(args) => faction::deposit(config, args).await,
        Commands::Withdraw(args) => faction::withdraw(config, args).await,
        Commands::RenameRank(args) => faction::rename_rank(config, args).await,
        Commands::Check => check::execute(config).await,
    }
}
