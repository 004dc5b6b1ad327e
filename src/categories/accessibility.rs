//! Accessibility audit: missing alternatives, broken focus order, handlers on
//! non-interactive elements. Line-based heuristics; the lint engine's
//! `jsx-a11y/` rules supplement them when enabled.

use super::{CategoryScan, ScanContext};
use crate::core::{Category, CategoryResult, Severity};
use crate::detection::{DetectorBank, DetectorSpec, MatchPolicy};

const EXTENSIONS: &[&str] = &["html", "htm", "jsx", "tsx", "vue", "svelte"];

const LINT_RULE_PREFIXES: &[&str] = &["jsx-a11y/", "vuejs-accessibility/"];

pub const DETECTORS: &[DetectorSpec] = &[
    DetectorSpec {
        id: "img-missing-alt",
        pattern: r"<img\b",
        message: "<img> without an alt attribute",
        severity: Severity::Medium,
        exclude_if: &[r#"\balt\s*="#, r"\{\.\.\."],
    },
    DetectorSpec {
        id: "input-missing-label",
        pattern: r"<input\b",
        message: "<input> without an accessible label",
        severity: Severity::Medium,
        exclude_if: &[
            r"aria-label",
            r"aria-labelledby",
            r#"type\s*=\s*["']?(hidden|submit|button|reset)"#,
            r"\{\.\.\.",
        ],
    },
    DetectorSpec {
        id: "positive-tabindex",
        pattern: r#"tabindex\s*=\s*["']?[1-9]"#,
        message: "Positive tabindex overrides natural focus order",
        severity: Severity::Medium,
        exclude_if: &[],
    },
    DetectorSpec {
        id: "html-missing-lang",
        pattern: r"<html\b",
        message: "<html> without a lang attribute",
        severity: Severity::Medium,
        exclude_if: &[r"\blang\s*="],
    },
    DetectorSpec {
        id: "click-on-non-interactive",
        pattern: r"<(div|span)\b[^>]*\bon[Cc]lick",
        message: "Click handler on a non-interactive element; add a role and key handler or use <button>",
        severity: Severity::Medium,
        exclude_if: &[r#"\brole\s*="#],
    },
    DetectorSpec {
        id: "empty-link",
        pattern: r"<a\b[^>]*>\s*</a>",
        message: "Link with no accessible text",
        severity: Severity::Low,
        exclude_if: &[r"aria-label"],
    },
    DetectorSpec {
        id: "autoplaying-media",
        pattern: r"<(video|audio)\b[^>]*\bautoplay\b",
        message: "Autoplaying media; provide user control",
        severity: Severity::Low,
        exclude_if: &[r"\bmuted\b"],
    },
];

pub const BANKS: &[DetectorBank] = &[DetectorBank {
    specs: DETECTORS,
    policy: MatchPolicy::AllMatches,
}];

pub fn scan() -> CategoryScan {
    CategoryScan::new(Category::Accessibility, BANKS, EXTENSIONS, LINT_RULE_PREFIXES)
}

pub async fn run(ctx: &ScanContext) -> CategoryResult {
    scan().run(ctx).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::{scan_content, DetectorSet};
    use std::path::PathBuf;

    fn scan_line(line: &str) -> Vec<String> {
        let set = DetectorSet::compile(DETECTORS, MatchPolicy::AllMatches).unwrap();
        scan_content(line, &set, &PathBuf::from("index.html"))
            .into_iter()
            .map(|f| f.finding_type)
            .collect()
    }

    #[test]
    fn img_without_alt_is_flagged() {
        assert_eq!(scan_line(r#"<img src="hero.png">"#), vec!["img-missing-alt"]);
        assert!(scan_line(r#"<img src="hero.png" alt="Hero banner">"#).is_empty());
    }

    #[test]
    fn spread_props_suppress_attribute_heuristics() {
        assert!(scan_line(r#"<img {...imgProps} />"#).is_empty());
    }

    #[test]
    fn positive_tabindex_is_flagged_zero_is_not() {
        assert_eq!(scan_line(r#"<div tabindex="3">"#), vec!["positive-tabindex"]);
        assert!(scan_line(r#"<div tabindex="0">"#).is_empty());
        assert!(scan_line(r#"<div tabindex="-1">"#).is_empty());
    }

    #[test]
    fn click_on_div_requires_role() {
        assert_eq!(
            scan_line(r#"<div onClick={open}>menu</div>"#),
            vec!["click-on-non-interactive"]
        );
        assert!(scan_line(r#"<div role="button" tabindex="0" onClick={open}>menu</div>"#)
            .is_empty());
    }

    #[test]
    fn labelled_inputs_pass() {
        assert_eq!(scan_line(r#"<input name="q">"#), vec!["input-missing-label"]);
        assert!(scan_line(r#"<input name="q" aria-label="Search">"#).is_empty());
        assert!(scan_line(r#"<input type="hidden" name="csrf">"#).is_empty());
    }
}
