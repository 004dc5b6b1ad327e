//! Error taxonomy for the audit pipeline.
//!
//! Errors are recovered as close to their origin as possible: an unreadable
//! file is zero findings for that file, a failed external tool leaves the
//! category with whatever it already has, a malformed spool line is dropped,
//! and a category that dies before producing anything is degraded by the
//! orchestrator. Only top-level conditions (such as failing to create the
//! output directory) terminate the run.

use crate::core::Category;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuditError {
    #[error("cannot read {path}: {source}")]
    FileAccess {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("external tool '{tool}' failed: {reason}")]
    ExternalTool { tool: String, reason: String },

    #[error("spool line {line_no} failed to parse")]
    SpoolParse { line_no: usize },

    #[error("category {category} failed: {reason}")]
    CategoryFatal { category: Category, reason: String },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type AuditResult<T> = Result<T, AuditError>;
