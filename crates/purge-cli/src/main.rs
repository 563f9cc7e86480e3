mod cmd;
mod context;
mod output;
mod roster;

use clap::{Parser, Subcommand};
use cmd::{config::ConfigSubcommand, run::RunArgs};
use context::Context;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "guild-purge",
    about = "Bulk kick or ban Discord guild members from a roster file or by role state",
    version,
    propagate_version = true
)]
struct Cli {
    /// Config file (default: guild-purge.yaml in the working directory)
    #[arg(long, global = true, env = "GUILD_PURGE_CONFIG")]
    config: Option<PathBuf>,

    /// Bot token
    #[arg(long, global = true, env = "DISCORD_BOT_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Target guild id (overrides guild_id in the config file)
    #[arg(long, global = true, env = "DISCORD_GUILD_ID")]
    guild: Option<String>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate the token and confirm the bot can reach the guild
    Check,

    /// List members holding no roles besides @everyone
    Roleless,

    /// Kick or ban members
    Run(RunArgs),

    /// Show, initialise, or validate the config file
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = match &cli.command {
        Commands::Run(_) => tracing::Level::INFO,
        _ => tracing::Level::WARN,
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let ctx = Context::new(cli.config, cli.token, cli.guild, cli.json);

    let result = match cli.command {
        Commands::Check => cmd::check::run(&ctx),
        Commands::Roleless => cmd::roleless::run(&ctx),
        Commands::Run(args) => cmd::run::run(&ctx, args),
        Commands::Config { subcommand } => cmd::config::run(&ctx, subcommand),
    };

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
