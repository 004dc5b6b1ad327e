//! Opaque external analyzers and their normalization into findings.
//!
//! This is the single boundary where external-tool semantics enter the core:
//! every record shape below is normalized into [`Finding`] before it reaches a
//! spool, and every failure surfaces as [`AuditError::ExternalTool`] so the
//! owning category can continue with whatever it already has.

use crate::core::{Finding, FindingSource, Severity};
use crate::errors::{AuditError, AuditResult};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::process::Command;

/// One record from an opaque lint engine
#[derive(Debug, Clone)]
pub struct LintRecord {
    pub rule_id: String,
    pub severity: Option<Severity>,
    pub line: usize,
    pub message: String,
}

/// One vulnerable package from a dependency-vulnerability checker
#[derive(Debug, Clone)]
pub struct VulnRecord {
    pub package: String,
    pub severity: Option<Severity>,
    pub title: String,
    pub recommendation: String,
}

/// Unused (dev)dependency names from an unused-dependency detector
#[derive(Debug, Clone, Default)]
pub struct UnusedDeps {
    pub dependencies: Vec<String>,
    pub dev_dependencies: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceProfile {
    Mobile,
    Desktop,
}

impl DeviceProfile {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceProfile::Mobile => "mobile",
            DeviceProfile::Desktop => "desktop",
        }
    }
}

/// One failing audit reported by a page-metrics collector
#[derive(Debug, Clone)]
pub struct FailingAudit {
    pub id: String,
    pub title: String,
    pub severity: Option<Severity>,
}

/// Per-URL, per-device page metrics: 0-100 scores keyed by audit dimension
/// plus the audits that failed outright.
#[derive(Debug, Clone, Default)]
pub struct PageMetrics {
    pub scores: BTreeMap<String, f64>,
    pub failing_audits: Vec<FailingAudit>,
}

#[async_trait]
pub trait LintEngine: Send + Sync {
    async fn lint(&self, file: &Path) -> AuditResult<Vec<LintRecord>>;
}

#[async_trait]
pub trait VulnerabilityChecker: Send + Sync {
    async fn check(&self, manifest_dir: &Path) -> AuditResult<Vec<VulnRecord>>;
}

#[async_trait]
pub trait UnusedDependencyChecker: Send + Sync {
    async fn check(&self, manifest_dir: &Path) -> AuditResult<UnusedDeps>;
}

#[async_trait]
pub trait PageMetricsCollector: Send + Sync {
    async fn collect(&self, url: &str, device: DeviceProfile) -> AuditResult<PageMetrics>;
}

/// Maps tool-reported severity strings onto our tiers
pub fn map_severity(raw: &str) -> Option<Severity> {
    match raw.to_ascii_lowercase().as_str() {
        "critical" | "high" | "error" => Some(Severity::High),
        "moderate" | "medium" | "warning" | "warn" => Some(Severity::Medium),
        "low" | "minor" => Some(Severity::Low),
        "info" | "informational" => Some(Severity::Info),
        _ => None,
    }
}

/// Whether an external-tool failure is worth a retry. Only a narrow class of
/// transient transport conditions qualifies.
pub fn is_transient(err: &AuditError) -> bool {
    match err {
        AuditError::ExternalTool { reason, .. } => {
            let reason = reason.to_ascii_lowercase();
            reason.contains("timeout")
                || reason.contains("timed out")
                || reason.contains("econnreset")
                || reason.contains("connection refused")
        }
        _ => false,
    }
}

/// Bounded retry with fixed backoff around one external call
pub async fn with_retry<T, F, Fut>(max_retries: usize, backoff: Duration, mut call: F) -> AuditResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = AuditResult<T>>,
{
    let mut attempt = 0;
    loop {
        match call().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt < max_retries && is_transient(&e) => {
                attempt += 1;
                log::warn!("transient external failure (attempt {attempt}): {e}");
                tokio::time::sleep(backoff).await;
            }
            Err(e) => return Err(e),
        }
    }
}

async fn run_json_command(
    tool: &str,
    program: &str,
    args: &[&str],
    cwd: &Path,
    timeout: Duration,
) -> AuditResult<Value> {
    let spawn = Command::new(program)
        .args(args)
        .current_dir(cwd)
        .kill_on_drop(true)
        .output();
    let output = tokio::time::timeout(timeout, spawn)
        .await
        .map_err(|_| AuditError::ExternalTool {
            tool: tool.to_string(),
            reason: format!("timed out after {}s", timeout.as_secs()),
        })?
        .map_err(|e| AuditError::ExternalTool {
            tool: tool.to_string(),
            reason: e.to_string(),
        })?;

    // Several of these tools exit non-zero when they find problems, so the
    // status code is not an error signal; unparseable stdout is.
    serde_json::from_slice(&output.stdout).map_err(|e| AuditError::ExternalTool {
        tool: tool.to_string(),
        reason: format!("malformed output: {e}"),
    })
}

/// `npm audit --json` backed vulnerability checker
pub struct NpmAuditChecker {
    pub timeout: Duration,
}

impl Default for NpmAuditChecker {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(120),
        }
    }
}

#[async_trait]
impl VulnerabilityChecker for NpmAuditChecker {
    async fn check(&self, manifest_dir: &Path) -> AuditResult<Vec<VulnRecord>> {
        let json = run_json_command(
            "npm-audit",
            "npm",
            &["audit", "--json"],
            manifest_dir,
            self.timeout,
        )
        .await?;
        Ok(parse_npm_audit(&json))
    }
}

/// Lenient parse of the npm audit report shape; unknown fields are ignored
/// and missing ones default rather than fail.
pub fn parse_npm_audit(json: &Value) -> Vec<VulnRecord> {
    let Some(vulns) = json.get("vulnerabilities").and_then(Value::as_object) else {
        return Vec::new();
    };
    vulns
        .iter()
        .map(|(package, detail)| {
            let severity = detail
                .get("severity")
                .and_then(Value::as_str)
                .and_then(map_severity);
            let title = detail
                .get("via")
                .and_then(Value::as_array)
                .and_then(|via| {
                    via.iter()
                        .find_map(|v| v.get("title").and_then(Value::as_str))
                })
                .unwrap_or("known vulnerability")
                .to_string();
            let recommendation = if detail
                .get("fixAvailable")
                .map(|f| !f.is_null() && f != &Value::Bool(false))
                .unwrap_or(false)
            {
                format!("Run `npm audit fix` to upgrade {package}")
            } else {
                format!("Review advisories for {package}; no automatic fix available")
            };
            VulnRecord {
                package: package.clone(),
                severity,
                title,
                recommendation,
            }
        })
        .collect()
}

/// `npx eslint --format json` backed lint engine. Rule-id namespace
/// filtering happens in normalization, not here; this runner reports
/// everything eslint produced for the file.
pub struct EslintRunner {
    pub timeout: Duration,
}

impl Default for EslintRunner {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(60),
        }
    }
}

#[async_trait]
impl LintEngine for EslintRunner {
    async fn lint(&self, file: &Path) -> AuditResult<Vec<LintRecord>> {
        let path = file.to_string_lossy().into_owned();
        let cwd = file.parent().unwrap_or_else(|| Path::new("."));
        let json = run_json_command(
            "eslint",
            "npx",
            &["eslint", "--format", "json", "--no-color", &path],
            cwd,
            self.timeout,
        )
        .await?;
        Ok(parse_eslint_report(&json))
    }
}

/// Lenient parse of the eslint JSON formatter output: an array of file
/// entries each carrying `messages` with ruleId, numeric severity, line.
pub fn parse_eslint_report(json: &Value) -> Vec<LintRecord> {
    let Some(entries) = json.as_array() else {
        return Vec::new();
    };
    entries
        .iter()
        .filter_map(|entry| entry.get("messages").and_then(Value::as_array))
        .flatten()
        .filter_map(|message| {
            let rule_id = message.get("ruleId").and_then(Value::as_str)?;
            Some(LintRecord {
                rule_id: rule_id.to_string(),
                severity: match message.get("severity").and_then(Value::as_u64) {
                    Some(2) => Some(Severity::Medium),
                    Some(1) => Some(Severity::Low),
                    _ => None,
                },
                line: message.get("line").and_then(Value::as_u64).unwrap_or(1) as usize,
                message: message
                    .get("message")
                    .and_then(Value::as_str)
                    .unwrap_or("lint finding")
                    .to_string(),
            })
        })
        .collect()
}

/// `npx depcheck --json` backed unused-dependency detector
pub struct DepcheckRunner {
    pub timeout: Duration,
}

impl Default for DepcheckRunner {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(120),
        }
    }
}

#[async_trait]
impl UnusedDependencyChecker for DepcheckRunner {
    async fn check(&self, manifest_dir: &Path) -> AuditResult<UnusedDeps> {
        let json = run_json_command(
            "depcheck",
            "npx",
            &["depcheck", "--json"],
            manifest_dir,
            self.timeout,
        )
        .await?;
        let names = |key: &str| -> Vec<String> {
            json.get(key)
                .and_then(Value::as_array)
                .map(|a| {
                    a.iter()
                        .filter_map(Value::as_str)
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default()
        };
        Ok(UnusedDeps {
            dependencies: names("dependencies"),
            dev_dependencies: names("devDependencies"),
        })
    }
}

/// `npx lighthouse --output=json` backed page-metrics collector. Mobile is
/// lighthouse's default emulation; desktop uses its preset.
pub struct LighthouseCollector {
    pub timeout: Duration,
}

impl Default for LighthouseCollector {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(180),
        }
    }
}

#[async_trait]
impl PageMetricsCollector for LighthouseCollector {
    async fn collect(&self, url: &str, device: DeviceProfile) -> AuditResult<PageMetrics> {
        let mut args = vec![
            "lighthouse",
            url,
            "--output=json",
            "--quiet",
            "--chrome-flags=--headless",
        ];
        if device == DeviceProfile::Desktop {
            args.push("--preset=desktop");
        }
        let json =
            run_json_command("lighthouse", "npx", &args, Path::new("."), self.timeout).await?;
        Ok(parse_lighthouse(&json))
    }
}

/// Lenient parse of a lighthouse report: 0-1 category scores scaled to 0-100,
/// and audits scored 0 reported as failing. Anything missing or null is
/// skipped rather than failed.
pub fn parse_lighthouse(json: &Value) -> PageMetrics {
    let mut metrics = PageMetrics::default();
    if let Some(categories) = json.get("categories").and_then(Value::as_object) {
        for (id, category) in categories {
            if let Some(score) = category.get("score").and_then(Value::as_f64) {
                metrics.scores.insert(id.clone(), score * 100.0);
            }
        }
    }
    if let Some(audits) = json.get("audits").and_then(Value::as_object) {
        for (id, audit) in audits {
            if audit.get("score").and_then(Value::as_f64) == Some(0.0) {
                metrics.failing_audits.push(FailingAudit {
                    id: id.clone(),
                    title: audit
                        .get("title")
                        .and_then(Value::as_str)
                        .unwrap_or(id)
                        .to_string(),
                    severity: None,
                });
            }
        }
    }
    metrics
}

/// Fallback collector for deployments that opt out of the lighthouse
/// subprocess. Always reports the tool unavailable, which the live-page
/// category recovers from as a zero-issue result.
pub struct UnavailableCollector;

#[async_trait]
impl PageMetricsCollector for UnavailableCollector {
    async fn collect(&self, url: &str, _device: DeviceProfile) -> AuditResult<PageMetrics> {
        Err(AuditError::ExternalTool {
            tool: "page-metrics".to_string(),
            reason: format!("no collector configured for {url}"),
        })
    }
}

/// Normalizes lint records into findings, keeping only rule ids under the
/// given prefixes (each category owns fixed rule namespaces).
pub fn normalize_lint_records(
    records: Vec<LintRecord>,
    file: &Path,
    prefixes: &[&str],
) -> Vec<Finding> {
    records
        .into_iter()
        .filter(|r| prefixes.iter().any(|p| r.rule_id.starts_with(p)))
        .map(|r| Finding {
            finding_type: r.rule_id,
            file: file.to_path_buf(),
            line: r.line,
            column: None,
            severity: r.severity,
            message: r.message,
            snippet: None,
            context: None,
            tags: Vec::new(),
            source: FindingSource::ExternalTool,
        })
        .collect()
}

pub fn normalize_vuln_records(records: Vec<VulnRecord>, manifest: &Path) -> Vec<Finding> {
    records
        .into_iter()
        .map(|r| Finding {
            finding_type: "vulnerable-dependency".to_string(),
            file: manifest.to_path_buf(),
            line: 1,
            column: None,
            severity: r.severity,
            message: format!("{}: {} ({})", r.package, r.title, r.recommendation),
            snippet: None,
            context: None,
            tags: vec![format!("package:{}", r.package)],
            source: FindingSource::ExternalTool,
        })
        .collect()
}

pub fn normalize_unused_deps(unused: &UnusedDeps, manifest: &Path) -> Vec<Finding> {
    let entry = |name: &str, dev: bool| Finding {
        finding_type: "unused-dependency".to_string(),
        file: manifest.to_path_buf(),
        line: 1,
        column: None,
        severity: Some(Severity::Low),
        message: if dev {
            format!("Unused devDependency: {name}")
        } else {
            format!("Unused dependency: {name}")
        },
        snippet: None,
        context: None,
        tags: vec![format!("package:{name}")],
        source: FindingSource::ExternalTool,
    };
    unused
        .dependencies
        .iter()
        .map(|n| entry(n, false))
        .chain(unused.dev_dependencies.iter().map(|n| entry(n, true)))
        .collect()
}

/// Converts page metrics into findings tagged with url and device; the score
/// band determines severity, and failing audits come through at their own
/// severity (info when the tool did not classify them).
pub fn normalize_page_metrics(
    metrics: &PageMetrics,
    url: &str,
    device: DeviceProfile,
    score_threshold: f64,
) -> Vec<Finding> {
    let tags = vec![format!("url:{url}"), format!("device:{}", device.as_str())];
    let virtual_file = PathBuf::from(url);
    let mut findings = Vec::new();

    for (dimension, score) in &metrics.scores {
        if *score >= score_threshold {
            continue;
        }
        let severity = if *score < 50.0 {
            Severity::High
        } else if *score < 75.0 {
            Severity::Medium
        } else {
            Severity::Low
        };
        findings.push(Finding {
            finding_type: format!("page-score-{dimension}"),
            file: virtual_file.clone(),
            line: 1,
            column: None,
            severity: Some(severity),
            message: format!(
                "{dimension} score {score:.0} below threshold {score_threshold:.0} on {} ({url})",
                device.as_str()
            ),
            snippet: None,
            context: None,
            tags: tags.clone(),
            source: FindingSource::ExternalTool,
        });
    }

    for audit in &metrics.failing_audits {
        findings.push(Finding {
            finding_type: format!("failing-audit-{}", audit.id),
            file: virtual_file.clone(),
            line: 1,
            column: None,
            severity: audit.severity.or(Some(Severity::Info)),
            message: format!("Failing audit on {}: {}", device.as_str(), audit.title),
            snippet: None,
            context: None,
            tags: tags.clone(),
            source: FindingSource::ExternalTool,
        });
    }

    findings
}
