//! Audit category modules.
//!
//! Each category pairs a detector table (data) with the shared scan
//! machinery: walker subset, batch scheduler, detection engine, spool and
//! deduplicator, plus at most one opaque external analyzer whose output is
//! normalized before spooling. The public contract of every module is
//! `run(ctx) -> CategoryResult` and it never propagates an error: internal
//! failures degrade to partial or empty results with a warning.

pub mod accessibility;
pub mod dependency;
pub mod live_page;
pub mod performance;
pub mod security;

use crate::core::{Category, CategoryResult, Finding};
use crate::detection::{scan_content, DetectorBank, DetectorSet};
use crate::errors::AuditError;
use crate::external::{
    LintEngine, PageMetricsCollector, UnusedDependencyChecker, VulnerabilityChecker,
};
use crate::io::walker::FileWalker;
use crate::scheduler::{BatchConfig, BatchScheduler, MemoryMonitor, ProcessMemoryMonitor};
use crate::spool::IssueSpool;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Everything a category run needs, passed explicitly (no module-level
/// state). External analyzers are optional; a missing one simply skips that
/// normalization step.
pub struct ScanContext {
    pub root: PathBuf,
    pub output_dir: PathBuf,
    pub batch: BatchConfig,
    pub monitor: Arc<dyn MemoryMonitor>,
    pub exclude_patterns: Vec<String>,
    pub urls: Vec<String>,
    pub page_score_threshold: f64,
    pub lint: Option<Arc<dyn LintEngine>>,
    pub vulnerabilities: Option<Arc<dyn VulnerabilityChecker>>,
    pub unused_deps: Option<Arc<dyn UnusedDependencyChecker>>,
    pub page_metrics: Option<Arc<dyn PageMetricsCollector>>,
}

impl ScanContext {
    pub fn new(root: PathBuf, output_dir: PathBuf) -> Self {
        let batch = BatchConfig::default();
        Self {
            root,
            output_dir,
            monitor: Arc::new(ProcessMemoryMonitor::new(512 * 1024 * 1024)),
            batch,
            exclude_patterns: Vec::new(),
            urls: Vec::new(),
            page_score_threshold: 90.0,
            lint: None,
            vulnerabilities: None,
            unused_deps: None,
            page_metrics: None,
        }
    }
}

/// File-scanning machinery shared by the source-tree categories.
pub struct CategoryScan {
    pub category: Category,
    banks: &'static [DetectorBank],
    extensions: &'static [&'static str],
    lint_rule_prefixes: &'static [&'static str],
}

impl CategoryScan {
    pub fn new(
        category: Category,
        banks: &'static [DetectorBank],
        extensions: &'static [&'static str],
        lint_rule_prefixes: &'static [&'static str],
    ) -> Self {
        Self {
            category,
            banks,
            extensions,
            lint_rule_prefixes,
        }
    }

    /// Never fails: any internal error degrades this category to the
    /// canonical empty result with a warning.
    pub async fn run(&self, ctx: &ScanContext) -> CategoryResult {
        match self.try_run(ctx).await {
            Ok(result) => result,
            Err(e) => {
                log::warn!("{} audit degraded to empty result: {e}", self.category);
                CategoryResult::empty(self.category)
            }
        }
    }

    async fn try_run(&self, ctx: &ScanContext) -> anyhow::Result<CategoryResult> {
        let detectors = Arc::new(DetectorSet::compile_banks(self.banks)?);
        let files = FileWalker::new(ctx.root.clone())
            .with_extensions(self.extensions.iter().map(|s| s.to_string()).collect())
            .with_exclude_patterns(ctx.exclude_patterns.clone())
            .walk()?;

        log::debug!("{}: scanning {} files", self.category, files.len());

        let mut spool = IssueSpool::create(&ctx.output_dir, self.category)?;
        let scheduler = BatchScheduler::new(ctx.batch.clone(), Arc::clone(&ctx.monitor));
        let category = self.category;
        let lint = ctx.lint.clone();
        let prefixes = self.lint_rule_prefixes;

        let stats = scheduler
            .run_batched(
                &files,
                move |path| {
                    let detectors = Arc::clone(&detectors);
                    let lint = lint.clone();
                    async move { scan_one_file(path, detectors, lint, prefixes).await }
                },
                |findings: Vec<Finding>| {
                    for finding in &findings {
                        if let Err(e) = spool.append(finding) {
                            log::warn!("{category}: spool append failed: {e}");
                        }
                    }
                },
                category.as_str(),
            )
            .await;

        if stats.failed > 0 {
            log::warn!(
                "{}: {} of {} files skipped",
                self.category,
                stats.failed,
                stats.processed
            );
        }

        let mut issues = spool.finish()?;
        sort_findings(&mut issues);
        Ok(CategoryResult::new(self.category, issues))
    }
}

/// Deterministic report ordering. Completion order inside a micro-batch is
/// unconstrained, so the spool's append order varies run to run; the
/// persisted result must not.
fn sort_findings(findings: &mut [Finding]) {
    findings.sort_by(|a, b| {
        (&a.file, a.line, a.column, &a.finding_type, &a.message).cmp(&(
            &b.file,
            b.line,
            b.column,
            &b.finding_type,
            &b.message,
        ))
    });
}

/// Per-file scan op run inside the scheduler. An unreadable file is an error
/// here; the scheduler contains it as zero findings for that file. An empty
/// file is zero findings plus one warning, never an error.
async fn scan_one_file(
    path: PathBuf,
    detectors: Arc<DetectorSet>,
    lint: Option<Arc<dyn LintEngine>>,
    lint_rule_prefixes: &'static [&'static str],
) -> anyhow::Result<Vec<Finding>> {
    let content = tokio::fs::read_to_string(&path).await.map_err(|source| {
        AuditError::FileAccess {
            path: path.clone(),
            source,
        }
    })?;

    if content.is_empty() {
        log::warn!("empty file skipped: {}", path.display());
        return Ok(Vec::new());
    }

    let mut findings = scan_content(&content, &detectors, &path);

    if let Some(engine) = lint {
        match engine.lint(&path).await {
            Ok(records) => findings.extend(crate::external::normalize_lint_records(
                records,
                &path,
                lint_rule_prefixes,
            )),
            // The lint engine failing for one file never fails the file scan
            Err(e) => log::warn!("lint engine failed for {}: {e}", path.display()),
        }
    }

    Ok(findings)
}

/// Spools pre-normalized findings from an external analyzer and closes out a
/// category result. Used by the categories that do not batch over the file
/// tree (dependency health, live page).
fn spool_and_finish(
    output_dir: &Path,
    category: Category,
    findings: Vec<Finding>,
) -> anyhow::Result<CategoryResult> {
    let mut spool = IssueSpool::create(output_dir, category)?;
    for finding in &findings {
        spool.append(finding)?;
    }
    Ok(CategoryResult::new(category, spool.finish()?))
}
