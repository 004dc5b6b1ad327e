//! Run configuration.
//!
//! Loaded from `frontaudit.toml` and overlaid with CLI flags, then passed
//! explicitly into scheduler and orchestrator construction. There is no
//! cached module-level configuration: whoever needs settings receives them
//! as a value.

use crate::categories::ScanContext;
use crate::core::Category;
use crate::errors::{AuditError, AuditResult};
use crate::external::{
    DepcheckRunner, EslintRunner, LighthouseCollector, NpmAuditChecker, UnavailableCollector,
};
use crate::scheduler::{BatchConfig, ProcessMemoryMonitor};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub const CONFIG_FILE: &str = "frontaudit.toml";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct AuditConfig {
    /// Directory for spools and reports
    pub output_dir: PathBuf,
    /// Category slugs to run; empty means all
    pub categories: Vec<String>,
    /// Extra glob exclusions on top of the built-in ones
    pub exclude: Vec<String>,
    /// URLs for the live-page category; empty disables it effectively
    pub urls: Vec<String>,
    pub macro_chunk_size: usize,
    pub micro_batch_size: usize,
    pub memory_budget_mb: u64,
    pub pressure_threshold: f64,
    pub page_score_threshold: f64,
    pub top_issues: usize,
    /// Run `npm audit` for the dependency category
    pub npm_audit: bool,
    /// Run eslint per file and fold its rule findings into categories
    pub eslint: bool,
    /// Run `depcheck` for the dependency category
    pub depcheck: bool,
    /// Collect page metrics with lighthouse when URLs are configured
    pub lighthouse: bool,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("audit-reports"),
            categories: Vec::new(),
            exclude: Vec::new(),
            urls: Vec::new(),
            macro_chunk_size: 500,
            micro_batch_size: 20,
            memory_budget_mb: 512,
            pressure_threshold: 0.65,
            page_score_threshold: 90.0,
            top_issues: 10,
            npm_audit: false,
            eslint: false,
            depcheck: false,
            lighthouse: true,
        }
    }
}

impl AuditConfig {
    /// Loads from an explicit path (missing file is an error) or from
    /// `frontaudit.toml` next to the audited tree (missing file falls back
    /// to defaults).
    pub fn load(explicit: Option<&Path>, root: &Path) -> AuditResult<Self> {
        let path = match explicit {
            Some(p) => p.to_path_buf(),
            None => {
                let default_path = root.join(CONFIG_FILE);
                if !default_path.exists() {
                    log::debug!("no {CONFIG_FILE} found; using defaults");
                    return Ok(Self::default());
                }
                default_path
            }
        };
        let raw = std::fs::read_to_string(&path).map_err(|source| AuditError::FileAccess {
            path: path.clone(),
            source,
        })?;
        let config: Self = toml::from_str(&raw)
            .map_err(|e| AuditError::Config(format!("{}: {e}", path.display())))?;
        log::debug!("loaded config from {}", path.display());
        Ok(config)
    }

    pub fn selected_categories(&self) -> AuditResult<Vec<Category>> {
        self.categories
            .iter()
            .map(|name| {
                Category::all()
                    .iter()
                    .copied()
                    .find(|c| c.as_str() == name)
                    .ok_or_else(|| AuditError::Config(format!("unknown category '{name}'")))
            })
            .collect()
    }

    /// Assembles the per-run context, wiring external tools per the toggles
    pub fn build_context(&self, root: PathBuf) -> ScanContext {
        let mut ctx = ScanContext::new(root, self.output_dir.clone());
        ctx.batch = BatchConfig {
            macro_chunk_size: self.macro_chunk_size,
            micro_batch_size: self.micro_batch_size.clamp(5, 50),
            pressure_threshold: self.pressure_threshold,
            ..BatchConfig::default()
        };
        ctx.monitor = Arc::new(ProcessMemoryMonitor::new(
            self.memory_budget_mb * 1024 * 1024,
        ));
        ctx.exclude_patterns = self.exclude.clone();
        ctx.urls = self.urls.clone();
        ctx.page_score_threshold = self.page_score_threshold;
        if self.npm_audit {
            ctx.vulnerabilities = Some(Arc::new(NpmAuditChecker::default()));
        }
        if self.eslint {
            ctx.lint = Some(Arc::new(EslintRunner::default()));
        }
        if self.depcheck {
            ctx.unused_deps = Some(Arc::new(DepcheckRunner::default()));
        }
        if !self.urls.is_empty() {
            ctx.page_metrics = if self.lighthouse {
                Some(Arc::new(LighthouseCollector::default()))
            } else {
                // Opted out of the subprocess: the category still runs and
                // reports zero with a warning per URL
                Some(Arc::new(UnavailableCollector))
            };
        }
        ctx
    }
}

/// Starter file written by `frontaudit init`
pub const STARTER_CONFIG: &str = r#"# frontaudit configuration
output-dir = "audit-reports"

# Category slugs to run; omit for all of:
# security, performance, accessibility, dependency, live-page
# categories = ["security", "accessibility"]

# Extra exclusions on top of node_modules, dist, build, minified files
exclude = []

# URLs for the live-page category
urls = []

micro-batch-size = 20
memory-budget-mb = 512

# External tools (require npm / npx on PATH)
npm-audit = false
depcheck = false
eslint = false

# Set to false to skip the lighthouse subprocess for configured URLs
lighthouse = true
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn missing_default_config_falls_back_to_defaults() {
        let dir = TempDir::new().unwrap();
        let config = AuditConfig::load(None, dir.path()).unwrap();
        assert_eq!(config.micro_batch_size, 20);
        assert_eq!(config.output_dir, PathBuf::from("audit-reports"));
    }

    #[test]
    fn missing_explicit_config_is_an_error() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope.toml");
        assert!(AuditConfig::load(Some(&missing), dir.path()).is_err());
    }

    #[test]
    fn partial_config_file_keeps_defaults_for_the_rest() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE),
            "micro-batch-size = 5\ncategories = [\"security\"]\n",
        )
        .unwrap();

        let config = AuditConfig::load(None, dir.path()).unwrap();
        assert_eq!(config.micro_batch_size, 5);
        assert_eq!(config.memory_budget_mb, 512);
        assert_eq!(config.selected_categories().unwrap(), vec![Category::Security]);
    }

    #[test]
    fn unknown_category_is_rejected() {
        let config = AuditConfig {
            categories: vec!["seo".into()],
            ..Default::default()
        };
        assert!(config.selected_categories().is_err());
    }

    #[test]
    fn starter_config_parses() {
        let config: AuditConfig = toml::from_str(STARTER_CONFIG).unwrap();
        assert!(!config.npm_audit);
        assert!(config.lighthouse);
    }

    #[test]
    fn configured_urls_wire_a_page_metrics_collector() {
        let config = AuditConfig {
            urls: vec!["https://example.com".into()],
            ..Default::default()
        };
        let ctx = config.build_context(PathBuf::from("."));
        assert!(ctx.page_metrics.is_some());

        let without_urls = AuditConfig::default().build_context(PathBuf::from("."));
        assert!(without_urls.page_metrics.is_none());
    }
}
