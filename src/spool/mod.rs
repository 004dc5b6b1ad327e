//! On-disk issue spool and end-of-run deduplicator.
//!
//! Raw findings are appended one JSON object per line to a category-scoped
//! `<category>-issues.jsonl`, truncated at the start of each run. Memory held
//! for findings during scanning is therefore O(1), not O(total raw findings);
//! the full set only materializes during the post-scan dedup pass. Malformed
//! spool lines are dropped without failing the pass.

use crate::core::{Category, Finding};
use crate::errors::{AuditError, AuditResult};
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

pub struct IssueSpool {
    category: Category,
    path: PathBuf,
    writer: BufWriter<File>,
    appended: usize,
}

impl IssueSpool {
    /// Creates (or truncates) the category's spool file under `dir`.
    pub fn create(dir: &Path, category: Category) -> AuditResult<Self> {
        let path = dir.join(format!("{}-issues.jsonl", category.as_str()));
        let file = File::create(&path)?;
        Ok(Self {
            category,
            path,
            writer: BufWriter::new(file),
            appended: 0,
        })
    }

    pub fn append(&mut self, finding: &Finding) -> AuditResult<()> {
        serde_json::to_writer(&mut self.writer, finding)?;
        self.writer.write_all(b"\n")?;
        self.appended += 1;
        Ok(())
    }

    pub fn appended(&self) -> usize {
        self.appended
    }

    /// Closes the stream, reads the spool back, and reduces it to an
    /// order-preserving unique set of findings.
    pub fn finish(mut self) -> AuditResult<Vec<Finding>> {
        self.writer.flush()?;
        drop(self.writer);
        let raw = parse_spool(&self.path, self.category)?;
        Ok(dedup_findings(raw))
    }
}

/// Reads a spool file back, one independently parsed finding per line.
/// A bad line never fails the pass; it is dropped with a debug log.
fn parse_spool(path: &Path, category: Category) -> AuditResult<Vec<Finding>> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let mut raw = Vec::new();
    for (line_no, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<Finding>(&line) {
            Ok(finding) => raw.push(finding),
            Err(_) => {
                let err = AuditError::SpoolParse { line_no: line_no + 1 };
                log::debug!("{category}: dropping line: {err}");
            }
        }
    }
    Ok(raw)
}

/// Order-preserving set reduction keyed by (file, line, type, message).
/// Idempotent: `dedup(dedup(x)) == dedup(x)`.
pub fn dedup_findings(findings: Vec<Finding>) -> Vec<Finding> {
    let mut seen = HashSet::new();
    findings
        .into_iter()
        .filter(|f| seen.insert(f.dedup_key()))
        .collect()
}
