use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod view;

#[derive(Parser)]
#[command(name = "brewtimer", version, about = "Guided coffee brewing timer")]
struct Cli {
    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Brew a recipe interactively
    Brew(commands::brew::BrewArgs),
    /// Recipe lookup
    Recipe {
        #[command(subcommand)]
        action: commands::recipe::RecipeAction,
    },
    /// Finished brews
    History {
        #[command(subcommand)]
        action: commands::history::HistoryAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

fn init_tracing(verbose: bool) {
    let default = if verbose {
        "brewtimer=debug"
    } else {
        "brewtimer=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Brew(args) => commands::brew::run(args),
        Commands::Recipe { action } => commands::recipe::run(action),
        Commands::History { action } => commands::history::run(action),
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
