use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use crate::source::ReviewSource;

/// One row per import run. Created with status `Running`, mutated only
/// by the run that owns it, finalized exactly once.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ImportLog {
    /// Database id; 0 until persisted.
    pub id: i64,
    pub source: ReviewSource,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub status: ImportStatus,
    pub imported: i64,
    pub updated: i64,
    pub skipped: i64,
    pub total_rows: i64,
    pub file_name: Option<String>,
    pub error_message: Option<String>,
    pub warnings: Option<String>,
}

impl ImportLog {
    pub fn new(source: ReviewSource) -> Self {
        Self {
            id: 0,
            source,
            started_at: Utc::now(),
            finished_at: None,
            status: ImportStatus::Running,
            imported: 0,
            updated: 0,
            skipped: 0,
            total_rows: 0,
            file_name: None,
            error_message: None,
            warnings: None,
        }
    }

    pub fn duration(&self) -> Option<chrono::Duration> {
        self.finished_at.map(|finished| finished - self.started_at)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ImportStatus {
    Running,
    Success,
    Failed,
    Cancelled,
}

impl ImportStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImportStatus::Running => "running",
            ImportStatus::Success => "success",
            ImportStatus::Failed => "failed",
            ImportStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, ImportStatus::Running)
    }
}

impl fmt::Display for ImportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ImportStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "running" => Ok(ImportStatus::Running),
            "success" => Ok(ImportStatus::Success),
            "failed" => Ok(ImportStatus::Failed),
            "cancelled" => Ok(ImportStatus::Cancelled),
            other => Err(format!("Unknown import status: {}", other)),
        }
    }
}
