use clap::{ArgAction, Parser, Subcommand};
use commands::{cleanup, config, daemon, export, import, refresh, status};

mod commands;
mod context;
mod logging;
mod output;

#[derive(Parser)]
#[command(name = "reviewhub")]
#[command(about = "ReviewHub - aggregate, cache and import customer reviews from external providers")]
#[command(version)]
struct Cli {
    /// Enable verbose output (use multiple times for more verbosity: -v, -vv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Output format
    #[arg(long, global = true, default_value = "human", value_enum)]
    output: output::OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Refresh the review cache from all configured providers
    #[command(long_about = "Fetch reviews from every configured provider, preload the page cache and upsert the results into the durable store. Exits non-zero when no live source returned any reviews.")]
    Refresh {
        /// Number of pages to preload
        #[arg(long)]
        pages: Option<u32>,

        /// Reviews per page
        #[arg(long)]
        per_page: Option<u32>,

        /// Clear existing cached pages before fetching
        #[arg(long, action = ArgAction::SetTrue)]
        clear_cache: bool,
    },
    /// Import reviews from a CSV file or straight from a provider
    #[command(long_about = "Import reviews into the durable store. With --file, rows come from a CSV export; with --source, reviews are fetched live from the named provider. Existing reviews are skipped unless --update-existing is given; moderation flags are always preserved.")]
    Import {
        /// CSV file to import
        #[arg(long, value_name = "PATH", conflicts_with = "source")]
        file: Option<std::path::PathBuf>,

        /// Live provider to import from: google, tripadvisor or all
        #[arg(long, value_name = "SOURCE")]
        source: Option<String>,

        /// Maximum reviews to fetch per provider
        #[arg(long, default_value_t = 50)]
        max_reviews: u32,

        /// Overwrite mutable fields of reviews that already exist
        #[arg(long, action = ArgAction::SetTrue)]
        update_existing: bool,

        /// Classify rows without writing anything
        #[arg(long, action = ArgAction::SetTrue)]
        dry_run: bool,
    },
    /// Export stored reviews to CSV
    Export {
        /// Output file (stdout when omitted)
        #[arg(long, value_name = "PATH")]
        file: Option<std::path::PathBuf>,
    },
    /// Delete old inactive reviews
    #[command(long_about = "Delete inactive reviews whose review date is older than the retention horizon. Idempotent; prints the number of rows removed.")]
    Cleanup {
        /// Retention horizon in days
        #[arg(long, default_value_t = 365)]
        older_than_days: u32,
    },
    /// Show provider status, store statistics and recent import runs
    Status,
    /// Show configuration or store provider API keys
    Config {
        #[command(subcommand)]
        cmd: ConfigCommands,
    },
    /// Run as daemon with a periodic refresh schedule
    #[command(long_about = "Run ReviewHub in the foreground, refreshing reviews on the configured cron schedule. Performs an initial refresh on startup unless --no-startup-refresh is specified.")]
    Daemon {
        /// Cron schedule expression (e.g. '0 0 4 * * *' for 04:00 daily)
        #[arg(long, value_name = "SCHEDULE")]
        schedule: Option<String>,

        /// Skip the initial refresh on startup
        #[arg(long, action = ArgAction::SetTrue)]
        no_startup_refresh: bool,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show current configuration (masks API keys)
    Show,
    /// Store an API key for a provider
    #[command(long_about = "Store an API key in the credentials file. The key is prompted for without echo unless --key is given.")]
    SetKey {
        /// Provider: google or tripadvisor
        provider: String,

        /// API key value (prompted when omitted)
        #[arg(long)]
        key: Option<String>,
    },
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();

    // The daemon logs to a rolling file unless running in a container,
    // where stderr is what the runtime collects.
    let log_file = if matches!(cli.command, Commands::Daemon { .. })
        && std::env::var("DOCKER_ENV").is_err()
    {
        Some(review_config::PathManager::default().log_file())
    } else {
        None
    };
    logging::init_logging_with_file(cli.verbose, cli.quiet, log_file)
        .map_err(|e| color_eyre::eyre::eyre!("{}", e))?;

    let output = output::Output::new(cli.output, cli.quiet);

    match cli.command {
        Commands::Refresh { pages, per_page, clear_cache } => {
            refresh::run_refresh(pages, per_page, clear_cache, &output).await
        }
        Commands::Import { file, source, max_reviews, update_existing, dry_run } => {
            import::run_import(file, source, max_reviews, update_existing, dry_run, &output).await
        }
        Commands::Export { file } => export::run_export(file, &output).await,
        Commands::Cleanup { older_than_days } => {
            cleanup::run_cleanup(older_than_days, &output).await
        }
        Commands::Status => status::run_status(&output).await,
        Commands::Config { cmd } => match cmd {
            ConfigCommands::Show => config::run_show(&output),
            ConfigCommands::SetKey { provider, key } => config::run_set_key(&provider, key, &output),
        },
        Commands::Daemon { schedule, no_startup_refresh } => {
            daemon::run_daemon(schedule, no_startup_refresh, &output).await
        }
    }
}
