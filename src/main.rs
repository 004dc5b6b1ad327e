use anyhow::Result;
use clap::Parser;
use frontaudit::cli::{Cli, Commands};
use frontaudit::commands::audit::{apply_overrides, run_audit, AuditOverrides};
use frontaudit::commands::init::init_config;
use frontaudit::config::AuditConfig;

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Audit {
            path,
            config,
            output_dir,
            categories,
            urls,
            exclude,
            micro_batch,
            memory_budget_mb,
            npm_audit,
            eslint,
            depcheck,
            top,
            verbosity,
        } => {
            init_logger(verbosity);
            let loaded = AuditConfig::load(config.as_deref(), &path)?;
            let merged = apply_overrides(
                loaded,
                AuditOverrides {
                    output_dir,
                    categories,
                    urls,
                    exclude,
                    micro_batch,
                    memory_budget_mb,
                    npm_audit,
                    eslint,
                    depcheck,
                    top,
                },
            );

            // Single-threaded cooperative runtime: concurrency here is
            // interleaved I/O, not data parallelism.
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()?;
            runtime.block_on(run_audit(path, merged))
        }
        Commands::Init { force } => {
            init_logger(0);
            init_config(force)
        }
    }
}

fn init_logger(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}
