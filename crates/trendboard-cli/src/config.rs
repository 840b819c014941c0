use std::path::PathBuf;

use anyhow::bail;
use clap::{Parser, Subcommand};
use trendboard::{OffsetStrategy, PostId};

/// Runtime configuration for the `trendboard` binary.
///
/// Global settings come from CLI flags or environment variables (a `.env`
/// file in the working directory is loaded first); the subcommand picks the
/// work to do.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "trendboard",
    version,
    about = "Seed, page through and benchmark a board's post table"
)]
pub struct CliArgs {
    /// Path of the SQLite database file. Created if missing.
    ///
    /// Environment variable: `TRENDBOARD_DATABASE`
    #[arg(long, env = "TRENDBOARD_DATABASE", default_value = "trendboard.db")]
    pub database: PathBuf,

    /// Maximum number of pooled database connections.
    ///
    /// Environment variable: `TRENDBOARD_POOL_SIZE`
    #[arg(long, env = "TRENDBOARD_POOL_SIZE", default_value_t = 8)]
    pub pool_size: u32,

    /// Machine tag embedded in every identifier this process issues.
    ///
    /// Must be unique among all processes writing to the same table, and
    /// fit in 10 bits.
    ///
    /// Environment variable: `MACHINE_TAG`
    #[arg(long, env = "MACHINE_TAG", default_value_t = 1)]
    pub machine_tag: u64,

    /// How offset pages are fetched: `naive` or `covering`.
    ///
    /// Environment variable: `OFFSET_STRATEGY`
    #[arg(long, env = "OFFSET_STRATEGY", default_value_t = OffsetStrategy::CoveringLookup)]
    pub offset_strategy: OffsetStrategy,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Replace every post with `total` synthetic ones.
    Seed {
        #[arg(long, default_value_t = 100_000)]
        total: u64,
        /// Posts inserted per transaction.
        #[arg(long, default_value_t = 1_000)]
        batch_size: usize,
    },
    /// Print one offset page as JSON.
    List {
        #[arg(long, allow_hyphen_values = true)]
        page: Option<i64>,
        #[arg(long, allow_hyphen_values = true)]
        size: Option<i64>,
    },
    /// Print one cursor page as JSON.
    Cursor {
        /// Last id of the previous page; omit for the first page.
        #[arg(long)]
        cursor_id: Option<PostId>,
        #[arg(long, allow_hyphen_values = true)]
        size: Option<i64>,
    },
    /// Follow cursors to the end of the table and report what was seen.
    Walk {
        #[arg(long, allow_hyphen_values = true)]
        size: Option<i64>,
    },
    /// Run both offset strategies on the same page and compare them.
    Compare {
        #[arg(long, allow_hyphen_values = true)]
        page: Option<i64>,
        #[arg(long, allow_hyphen_values = true)]
        size: Option<i64>,
        /// Timed runs per strategy.
        #[arg(long, default_value_t = 5)]
        rounds: u32,
    },
    /// Issue identifiers and print their fields.
    NextId {
        #[arg(long, default_value_t = 1)]
        count: u64,
    },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database: PathBuf,
    pub pool_size: u32,
    pub machine_tag: u64,
    pub offset_strategy: OffsetStrategy,
    pub command: Command,
}

impl TryFrom<CliArgs> for Config {
    type Error = anyhow::Error;

    fn try_from(args: CliArgs) -> Result<Self, Self::Error> {
        if args.pool_size == 0 {
            bail!("TRENDBOARD_POOL_SIZE must be greater than 0");
        }

        if args.machine_tag > PostId::max_machine_tag() {
            bail!(
                "MACHINE_TAG ({}) exceeds the machine tag space (max = {})",
                args.machine_tag,
                PostId::max_machine_tag()
            );
        }

        match args.command {
            Command::Seed { batch_size: 0, .. } => {
                bail!("--batch-size must be greater than 0");
            }
            Command::Compare { rounds: 0, .. } => {
                bail!("--rounds must be greater than 0");
            }
            _ => {}
        }

        Ok(Self {
            database: args.database,
            pool_size: args.pool_size,
            machine_tag: args.machine_tag,
            offset_strategy: args.offset_strategy,
            command: args.command,
        })
    }
}
