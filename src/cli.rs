use crate::api::DEFAULT_API_URL;
use chrono::NaiveDate;
use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

const DEFAULT_INPUT: &str = "swim_records.json";

#[derive(Parser, Debug)]
#[command(
    name = "swimstat",
    about = "Training statistics for swim session logs (JSON file, directory or ZIP)"
)]
pub struct Cli {
    /// Records source: a `.json` file, a directory of them, or a `.zip` export.
    #[arg(short, long, global = true, env = "SWIMSTAT_INPUT", default_value = DEFAULT_INPUT)]
    pub input: PathBuf,

    /// Print results as JSON instead of text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Increase log verbosity (-v, -vv). Defaults to INFO.
    #[arg(short = 'v', long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Decrease log verbosity (-q, -qq). Defaults to INFO.
    #[arg(short = 'q', long, action = ArgAction::Count, global = true)]
    pub quiet: u8,

    #[command(subcommand)]
    pub cmd: Option<Cmd>,
}

#[derive(Subcommand, Debug)]
pub enum Cmd {
    /// Lifetime totals, weekly stats, personal bests and averages (default).
    Summary {
        /// Reference date (YYYY-MM-DD). Defaults to today.
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Per-stroke breakdown over segments and over session styles.
    Styles,
    /// Totals for the 7 days ending at the reference date.
    Weekly {
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Best distance, duration and speed.
    Bests,
    /// Compare the most recent session with earlier ones.
    Compare {
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Goal counts, completion rate and progress.
    Goals,
    /// Achievement counts and the locked ones closest to unlocking.
    Achievements {
        /// How many locked achievements to list.
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// Profile analysis and a rule-based training recommendation.
    Recommend {
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Download records, goals and achievements from the backend into a JSON file.
    Fetch {
        /// Backend base URL.
        #[arg(long, env = "SWIMSTAT_API_URL", default_value = DEFAULT_API_URL)]
        api_url: String,

        /// Bearer token sent as `Authorization`.
        #[arg(long, env = "SWIMSTAT_TOKEN", hide_env_values = true)]
        token: Option<String>,

        /// Where to write the bundle. Defaults to the `--input` path.
        #[arg(long)]
        out: Option<PathBuf>,
    },
}
