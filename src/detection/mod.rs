//! Line-oriented pattern detection engine.
//!
//! Detection is deliberately regex-based rather than AST-based: detector
//! tables are data, the scan loop is the only logic. Each detector carries
//! declarative exclusion guards evaluated before a match is accepted, so a
//! `password` hit inside a template interpolation or an equality comparison
//! can be rejected without per-detector special cases.
//!
//! Detectors are grouped into banks, each with its own match policy. A
//! first-match bank stops at its first accepting detector per line but never
//! suppresses the banks after it, so a credential line is classified once
//! while an unrelated sink on the same line still reports.

use crate::core::{Finding, FindingSource, Severity};
use crate::errors::{AuditError, AuditResult};
use regex::Regex;
use std::path::Path;

const SNIPPET_MAX_LEN: usize = 120;
const CONTEXT_RADIUS: usize = 2;

/// Declarative detector definition, compiled into a [`Detector`] at
/// category start.
#[derive(Debug, Clone)]
pub struct DetectorSpec {
    pub id: &'static str,
    pub pattern: &'static str,
    pub message: &'static str,
    pub severity: Severity,
    /// A match is rejected when any of these also match the line
    pub exclude_if: &'static [&'static str],
}

/// A detector table plus the policy it scans under
#[derive(Debug, Clone, Copy)]
pub struct DetectorBank {
    pub specs: &'static [DetectorSpec],
    pub policy: MatchPolicy,
}

#[derive(Debug)]
pub struct Detector {
    pub id: String,
    pub pattern: Regex,
    pub message: String,
    pub severity: Severity,
    exclude_if: Vec<Regex>,
}

impl Detector {
    fn compile(spec: &DetectorSpec) -> AuditResult<Self> {
        let compile = |p: &str| {
            Regex::new(p).map_err(|e| AuditError::Config(format!("bad pattern for {}: {e}", spec.id)))
        };
        Ok(Self {
            id: spec.id.to_string(),
            pattern: compile(spec.pattern)?,
            message: spec.message.to_string(),
            severity: spec.severity,
            exclude_if: spec
                .exclude_if
                .iter()
                .map(|p| compile(p))
                .collect::<AuditResult<Vec<_>>>()?,
        })
    }

    fn accepts(&self, line: &str) -> bool {
        self.pattern.is_match(line) && !self.exclude_if.iter().any(|g| g.is_match(line))
    }
}

/// Whether every matching detector in a bank fires on a line, or scanning
/// stops at the bank's first. Secret detection uses first-match so one
/// credential line is not classified several times over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchPolicy {
    AllMatches,
    FirstMatchPerLine,
}

#[derive(Debug)]
struct DetectorGroup {
    detectors: Vec<Detector>,
    policy: MatchPolicy,
}

/// Compiled detector banks for one category run. Built once, immutable after.
#[derive(Debug)]
pub struct DetectorSet {
    groups: Vec<DetectorGroup>,
}

fn compile_detectors(specs: &[DetectorSpec]) -> AuditResult<Vec<Detector>> {
    specs.iter().map(Detector::compile).collect()
}

impl DetectorSet {
    /// Single-bank set; most categories scan one table under one policy
    pub fn compile(specs: &[DetectorSpec], policy: MatchPolicy) -> AuditResult<Self> {
        Ok(Self {
            groups: vec![DetectorGroup {
                detectors: compile_detectors(specs)?,
                policy,
            }],
        })
    }

    pub fn compile_banks(banks: &[DetectorBank]) -> AuditResult<Self> {
        Ok(Self {
            groups: banks
                .iter()
                .map(|bank| {
                    Ok(DetectorGroup {
                        detectors: compile_detectors(bank.specs)?,
                        policy: bank.policy,
                    })
                })
                .collect::<AuditResult<Vec<_>>>()?,
        })
    }

    pub fn len(&self) -> usize {
        self.groups.iter().map(|g| g.detectors.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn is_stylesheet(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("css") | Some("scss") | Some("less")
    )
}

// The bare-`*` prefix marks block-comment continuation lines; in stylesheets
// it is the universal selector, so the heuristic is gated off there.
fn is_comment_or_blank(line: &str, stylesheet: bool) -> bool {
    let trimmed = line.trim_start();
    trimmed.is_empty()
        || trimmed.starts_with("//")
        || trimmed.starts_with("/*")
        || (!stylesheet && trimmed.starts_with('*'))
        || trimmed.starts_with("<!--")
}

fn truncate_snippet(line: &str) -> String {
    let trimmed = line.trim();
    if trimmed.chars().count() > SNIPPET_MAX_LEN {
        let cut: String = trimmed.chars().take(SNIPPET_MAX_LEN).collect();
        format!("{cut}...")
    } else {
        trimmed.to_string()
    }
}

/// Symmetric context window around `index`, with the matched line marked
fn context_window(lines: &[&str], index: usize) -> String {
    let start = index.saturating_sub(CONTEXT_RADIUS);
    let end = (index + CONTEXT_RADIUS + 1).min(lines.len());
    lines[start..end]
        .iter()
        .enumerate()
        .map(|(offset, line)| {
            let marker = if start + offset == index { "> " } else { "  " };
            format!("{marker}{}: {}", start + offset + 1, truncate_snippet(line))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Scan one file's content against a compiled detector set.
///
/// Pure over its inputs: identical content and detectors always yield the
/// same findings in the same order. A first-match bank contributes at most
/// one finding per line; every other bank is still evaluated for that line.
pub fn scan_content(content: &str, set: &DetectorSet, path: &Path) -> Vec<Finding> {
    let lines: Vec<&str> = content.lines().collect();
    let stylesheet = is_stylesheet(path);
    let mut findings = Vec::new();

    for (index, line) in lines.iter().enumerate() {
        if is_comment_or_blank(line, stylesheet) {
            continue;
        }
        for group in &set.groups {
            for detector in &group.detectors {
                if !detector.accepts(line) {
                    continue;
                }
                let column = detector.pattern.find(line).map(|m| m.start() + 1);
                findings.push(Finding {
                    finding_type: detector.id.clone(),
                    file: path.to_path_buf(),
                    line: index + 1,
                    column,
                    severity: Some(detector.severity),
                    message: detector.message.clone(),
                    snippet: Some(truncate_snippet(line)),
                    context: Some(context_window(&lines, index)),
                    tags: Vec::new(),
                    source: FindingSource::Custom,
                });
                if group.policy == MatchPolicy::FirstMatchPerLine {
                    break;
                }
            }
        }
    }

    findings
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::path::PathBuf;

    fn specs() -> Vec<DetectorSpec> {
        vec![
            DetectorSpec {
                id: "hardcoded-password",
                pattern: r#"(?i)(password|passwd|pwd)\s*[:=]\s*["'][^"']{8,}["']"#,
                message: "Hardcoded password detected",
                severity: Severity::High,
                exclude_if: &[r"===?\s*$", r"\$\{"],
            },
            DetectorSpec {
                id: "eval-usage",
                pattern: r"\beval\s*\(",
                message: "eval() usage",
                severity: Severity::High,
                exclude_if: &[],
            },
        ]
    }

    #[test]
    fn password_fixture_yields_one_high_finding_at_line_five() {
        let content = "\n\n\n\nconst password = \"abc123456789012\"\n";
        let set = DetectorSet::compile(&specs(), MatchPolicy::FirstMatchPerLine).unwrap();
        let findings = scan_content(content, &set, &PathBuf::from("login.js"));

        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].line, 5);
        assert_eq!(findings[0].severity, Some(Severity::High));
        assert_eq!(findings[0].finding_type, "hardcoded-password");
    }

    #[test]
    fn clean_content_yields_zero_findings() {
        let set = DetectorSet::compile(&specs(), MatchPolicy::AllMatches).unwrap();
        let findings = scan_content("const x = 1;\nlet y = x + 2;\n", &set, &PathBuf::from("a.js"));
        assert!(findings.is_empty());
    }

    #[test]
    fn comment_and_blank_lines_are_skipped() {
        let content = "// password = \"abc123456789012\"\n\n/* eval( */\n";
        let set = DetectorSet::compile(&specs(), MatchPolicy::AllMatches).unwrap();
        assert!(scan_content(content, &set, &PathBuf::from("a.js")).is_empty());
    }

    #[test]
    fn universal_selector_lines_are_scanned_in_stylesheets() {
        let important = [DetectorSpec {
            id: "important-abuse",
            pattern: r"!important",
            message: "!important override",
            severity: Severity::Low,
            exclude_if: &[],
        }];
        let set = DetectorSet::compile(&important, MatchPolicy::AllMatches).unwrap();
        let content = "* { margin: 0 !important; }\n";

        // Universal selector in a stylesheet is code, not a comment
        assert_eq!(scan_content(content, &set, &PathBuf::from("reset.css")).len(), 1);
        // The same prefix in a script file is a block-comment continuation
        assert!(scan_content(content, &set, &PathBuf::from("a.js")).is_empty());
    }

    #[test]
    fn exclusion_guard_rejects_template_interpolation() {
        let content = "const msg = `password: ${maskedPassword(\"placeholder\")}`\n";
        let set = DetectorSet::compile(
            &[DetectorSpec {
                id: "hardcoded-password",
                pattern: r#"(?i)password\s*[:=]?\s*"#,
                message: "Hardcoded password detected",
                severity: Severity::High,
                exclude_if: &[r"\$\{"],
            }],
            MatchPolicy::AllMatches,
        )
        .unwrap();
        assert!(scan_content(content, &set, &PathBuf::from("a.js")).is_empty());
    }

    #[test]
    fn first_match_policy_stops_after_one_detector_per_line() {
        let content = "const password = \"abc123456789012\"; eval(input)\n";
        let first = DetectorSet::compile(&specs(), MatchPolicy::FirstMatchPerLine).unwrap();
        let all = DetectorSet::compile(&specs(), MatchPolicy::AllMatches).unwrap();
        let path = PathBuf::from("a.js");

        assert_eq!(scan_content(content, &first, &path).len(), 1);
        assert_eq!(scan_content(content, &all, &path).len(), 2);
    }

    #[test]
    fn first_match_bank_does_not_suppress_later_banks() {
        const SECRETS: &[DetectorSpec] = &[DetectorSpec {
            id: "hardcoded-password",
            pattern: r#"(?i)(password|passwd|pwd)\s*[:=]\s*["'][^"']{8,}["']"#,
            message: "Hardcoded password detected",
            severity: Severity::High,
            exclude_if: &[],
        }];
        const SINKS: &[DetectorSpec] = &[DetectorSpec {
            id: "eval-usage",
            pattern: r"\beval\s*\(",
            message: "eval() usage",
            severity: Severity::High,
            exclude_if: &[],
        }];
        let set = DetectorSet::compile_banks(&[
            DetectorBank {
                specs: SECRETS,
                policy: MatchPolicy::FirstMatchPerLine,
            },
            DetectorBank {
                specs: SINKS,
                policy: MatchPolicy::AllMatches,
            },
        ])
        .unwrap();

        let content = "const password = \"abc123456789012\"; eval(input)\n";
        let ids: Vec<String> = scan_content(content, &set, &PathBuf::from("a.js"))
            .into_iter()
            .map(|f| f.finding_type)
            .collect();
        assert_eq!(ids, vec!["hardcoded-password", "eval-usage"]);
    }

    #[test]
    fn scan_is_idempotent() {
        let content = "eval(userInput)\nconst pwd = \"supersecret99\"\n";
        let set = DetectorSet::compile(&specs(), MatchPolicy::AllMatches).unwrap();
        let path = PathBuf::from("a.js");
        assert_eq!(
            scan_content(content, &set, &path),
            scan_content(content, &set, &path)
        );
    }

    #[test]
    fn context_window_marks_matched_line() {
        let content = "const a = 1;\nconst b = 2;\neval(x)\nconst c = 3;\nconst d = 4;\n";
        let set = DetectorSet::compile(&specs(), MatchPolicy::AllMatches).unwrap();
        let findings = scan_content(content, &set, &PathBuf::from("a.js"));
        let context = findings[0].context.as_deref().unwrap();

        assert!(context.contains("> 3: eval(x)"));
        assert!(context.contains("  1: const a = 1;"));
        assert!(context.contains("  5: const d = 4;"));
    }

    #[test]
    fn long_lines_are_truncated_in_snippet() {
        let long = format!("eval({})", "x".repeat(300));
        let set = DetectorSet::compile(&specs(), MatchPolicy::AllMatches).unwrap();
        let findings = scan_content(&long, &set, &PathBuf::from("a.js"));
        let snippet = findings[0].snippet.as_deref().unwrap();
        assert!(snippet.len() <= SNIPPET_MAX_LEN + 3);
        assert!(snippet.ends_with("..."));
    }
}
