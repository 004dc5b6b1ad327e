use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "frontaudit")]
#[command(about = "Read-only quality auditor for front-end source trees", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Audit a source tree and write JSON reports
    Audit {
        /// Path of the tree to audit
        path: PathBuf,

        /// Config file (defaults to frontaudit.toml under the audited tree)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Directory for spools and reports
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Categories to run (security, performance, accessibility,
        /// dependency, live-page); default is all
        #[arg(long, value_delimiter = ',')]
        categories: Option<Vec<String>>,

        /// URLs for the live-page category
        #[arg(long, value_delimiter = ',')]
        urls: Option<Vec<String>>,

        /// Extra glob exclusions
        #[arg(long, value_delimiter = ',')]
        exclude: Option<Vec<String>>,

        /// Files per micro-batch (5-50)
        #[arg(long)]
        micro_batch: Option<usize>,

        /// Memory budget in MB before the scheduler starts pausing
        #[arg(long)]
        memory_budget_mb: Option<u64>,

        /// Run `npm audit` for the dependency category
        #[arg(long)]
        npm_audit: bool,

        /// Run eslint per file and fold its rule findings into categories
        #[arg(long)]
        eslint: bool,

        /// Run `depcheck` for the dependency category
        #[arg(long)]
        depcheck: bool,

        /// Top issues per category in the standardized report
        #[arg(long)]
        top: Option<usize>,

        /// Increase verbosity (can be repeated: -v, -vv)
        #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
        verbosity: u8,
    },

    /// Write a starter frontaudit.toml
    Init {
        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },
}
