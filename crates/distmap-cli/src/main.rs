use clap::{Parser, Subcommand, ValueEnum};

mod commands;

#[derive(Parser)]
#[command(
    name = "distmap",
    about = "distmap — assign weighted work units to processes",
    version,
    propagate_version = true,
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute a distribution map for a list of unit weights.
    ///
    /// Weights come from --weights (comma separated) or --weights-file
    /// (comma or whitespace separated). The map is computed as the given
    /// rank would compute it.
    Balance {
        /// Unit weights, e.g. 10,10,10,10,1,1
        #[arg(short, long, value_delimiter = ',', conflicts_with = "weights_file")]
        weights: Vec<u64>,
        /// File holding unit weights.
        #[arg(long)]
        weights_file: Option<String>,
        /// Number of processes to distribute over.
        #[arg(short, long)]
        nprocs: usize,
        /// Rank of the calling process.
        #[arg(short, long, default_value_t = 0)]
        rank: usize,
        /// Override the configured strategy.
        #[arg(short, long, value_enum)]
        strategy: Option<StrategyArg>,
        /// Path to distmap.toml.
        #[arg(short, long)]
        config: Option<String>,
        /// Balance the same input this many times (shows cache reuse).
        #[arg(long, default_value_t = 1)]
        repeat: usize,
        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: String,
    },
    /// Write a distmap.toml with the default settings.
    Init {
        #[arg(short, long, default_value = ".")]
        path: String,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum StrategyArg {
    RoundRobin,
    Knapsack,
}

impl From<StrategyArg> for distmap_core::Strategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::RoundRobin => distmap_core::Strategy::RoundRobin,
            StrategyArg::Knapsack => distmap_core::Strategy::Knapsack,
        }
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("distmap=info".parse()?)
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Balance {
            weights,
            weights_file,
            nprocs,
            rank,
            strategy,
            config,
            repeat,
            format,
        } => commands::balance::balance(commands::balance::BalanceArgs {
            weights,
            weights_file,
            nprocs,
            rank,
            strategy: strategy.map(Into::into),
            config,
            repeat,
            format,
        }),
        Commands::Init { path } => commands::init::init(&path),
    }
}
