use std::fs::{self, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use chrono::Local;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuditError {
    #[error("Failed to access audit log: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to serialize audit event: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEvent {
    pub timestamp: String,
    pub actor: Option<String>,
    pub action: String,
    pub task_id: Option<u64>,
    pub details: Value,
}

impl AuditEvent {
    pub fn now(actor: &str, action: &str, task_id: Option<u64>, details: Value) -> Self {
        Self {
            timestamp: Local::now().to_rfc3339(),
            actor: Some(actor.to_string()),
            action: action.to_string(),
            task_id,
            details,
        }
    }
}

pub fn audit_log_path(root: &Path) -> PathBuf {
    root.join(".audit.log")
}

pub fn append_audit_event(root: &Path, event: &AuditEvent) -> Result<(), AuditError> {
    let path = audit_log_path(root);
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)?;
    let line = serde_json::to_string(event)?;
    writeln!(file, "{}", line)?;
    Ok(())
}

pub fn read_audit_events(root: &Path) -> Result<Vec<AuditEvent>, AuditError> {
    let path = audit_log_path(root);
    if !path.exists() {
        return Ok(Vec::new());
    }
    let reader = BufReader::new(fs::File::open(path)?);
    let mut events = Vec::new();
    for line in reader.lines() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        events.push(serde_json::from_str(trimmed)?);
    }
    Ok(events)
}
