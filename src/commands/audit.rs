//! The `audit` command: configuration assembly, one orchestrated run,
//! standardization, and a short terminal summary.

use crate::config::AuditConfig;
use crate::io::output::ensure_output_dir;
use crate::orchestrator::Orchestrator;
use crate::report;
use anyhow::{Context, Result};
use std::path::PathBuf;

/// CLI flag overlay applied on top of the config file
#[derive(Debug, Default)]
pub struct AuditOverrides {
    pub output_dir: Option<PathBuf>,
    pub categories: Option<Vec<String>>,
    pub urls: Option<Vec<String>>,
    pub exclude: Option<Vec<String>>,
    pub micro_batch: Option<usize>,
    pub memory_budget_mb: Option<u64>,
    pub npm_audit: bool,
    pub eslint: bool,
    pub depcheck: bool,
    pub top: Option<usize>,
}

pub fn apply_overrides(mut config: AuditConfig, overrides: AuditOverrides) -> AuditConfig {
    if let Some(dir) = overrides.output_dir {
        config.output_dir = dir;
    }
    if let Some(categories) = overrides.categories {
        config.categories = categories;
    }
    if let Some(urls) = overrides.urls {
        config.urls = urls;
    }
    if let Some(exclude) = overrides.exclude {
        config.exclude.extend(exclude);
    }
    if let Some(micro) = overrides.micro_batch {
        config.micro_batch_size = micro;
    }
    if let Some(budget) = overrides.memory_budget_mb {
        config.memory_budget_mb = budget;
    }
    if overrides.npm_audit {
        config.npm_audit = true;
    }
    if overrides.eslint {
        config.eslint = true;
    }
    if overrides.depcheck {
        config.depcheck = true;
    }
    if let Some(top) = overrides.top {
        config.top_issues = top;
    }
    config
}

/// Runs every selected category, persists all artifacts, prints a summary.
/// The run itself never fails on a category; only top-level conditions such
/// as an uncreatable output directory propagate out of here.
pub async fn run_audit(path: PathBuf, config: AuditConfig) -> Result<()> {
    let selection = config.selected_categories()?;
    ensure_output_dir(&config.output_dir)
        .with_context(|| format!("cannot create output dir {}", config.output_dir.display()))?;

    let top_issues = config.top_issues;
    let output_dir = config.output_dir.clone();
    let ctx = config.build_context(path);
    let orchestrator = Orchestrator::new(ctx, &selection);

    let summary = orchestrator.run_all().await?;
    let standardized = report::standardize(&summary, top_issues);
    report::persist(&standardized, &output_dir)?;

    println!(
        "Audit complete in {}ms: {} issue(s) across {} categories",
        summary.duration_ms,
        summary.total_issues,
        summary.categories.len()
    );
    for category in &standardized.categories {
        println!(
            "  {:<18} score {:>5.1}  issues {:>4}  (high {}, medium {}, low {})",
            category.category.display_name(),
            category.score,
            category.total_issues,
            category.high_severity,
            category.medium_severity,
            category.low_severity
        );
    }
    println!("Overall score: {:.1}/100", standardized.overall_score);
    for recommendation in &standardized.recommendations {
        println!("  - {recommendation}");
    }
    println!("Reports written to {}", output_dir.display());

    Ok(())
}
