use std::fs;
use std::path::{Path, PathBuf};

use chrono::Local;
use serde_json::json;
use thiserror::Error;
use tracing::{info, warn};

use crate::audit::{append_audit_event, AuditEvent};
use crate::planner::Operation;
use crate::task::{Task, TaskError};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Task store IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to (de)serialize tasks: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("No task with id {0}")]
    NotFound(u64),
    #[error(transparent)]
    Task(#[from] TaskError),
}

/// Durable home for tasks.
pub trait TaskStore {
    fn create_task(&mut self, task: Task) -> Result<u64, StoreError>;

    fn fetch_task(&self, id: u64) -> Result<Task, StoreError>;

    /// Slot `i` holds task `i`; deleted or inactive slots are `None`.
    fn fetch_active_tasks(&self) -> Result<Vec<Option<Task>>, StoreError>;

    /// Applies `operations` in order, appending one event per operation.
    fn apply_mutations(
        &mut self,
        actor: &str,
        id: u64,
        operations: &[Operation],
    ) -> Result<(), StoreError>;
}

/// Keeps every task slot in one `tasks.json` under `root`.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    root: PathBuf,
}

impl JsonFileStore {
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn tasks_path(&self) -> PathBuf {
        self.root.join("tasks.json")
    }

    fn load(&self) -> Result<Vec<Option<Task>>, StoreError> {
        let path = self.tasks_path();
        if !path.exists() {
            return Ok(Vec::new());
        }
        let text = fs::read_to_string(path)?;
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_str(&text)?)
    }

    fn save(&self, slots: &[Option<Task>]) -> Result<(), StoreError> {
        let path = self.tasks_path();
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_string_pretty(slots)?)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    /// Runs after `tasks.json` is committed, so a failure here must not turn
    /// a stored change into a reported error.
    fn record(&self, event: AuditEvent) {
        if let Err(err) = append_audit_event(&self.root, &event) {
            warn!(
                action = %event.action,
                task_id = ?event.task_id,
                error = %err,
                "audit log not updated"
            );
        }
    }
}

impl TaskStore for JsonFileStore {
    fn create_task(&mut self, mut task: Task) -> Result<u64, StoreError> {
        let mut slots = self.load()?;
        let id = slots.len() as u64;
        task.id = Some(id);
        let details = json!({ "title": task.title, "blob_idx": task.blob_idx });
        let actor = task.created_by.clone();
        slots.push(Some(task));
        self.save(&slots)?;
        self.record(AuditEvent::now(&actor, "create", Some(id), details));
        info!(id, "created task");
        Ok(id)
    }

    fn fetch_task(&self, id: u64) -> Result<Task, StoreError> {
        let slots = self.load()?;
        usize::try_from(id)
            .ok()
            .and_then(|idx| slots.into_iter().nth(idx))
            .flatten()
            .ok_or(StoreError::NotFound(id))
    }

    fn fetch_active_tasks(&self) -> Result<Vec<Option<Task>>, StoreError> {
        Ok(self
            .load()?
            .into_iter()
            .map(|slot| slot.filter(Task::is_active))
            .collect())
    }

    fn apply_mutations(
        &mut self,
        actor: &str,
        id: u64,
        operations: &[Operation],
    ) -> Result<(), StoreError> {
        let mut slots = self.load()?;
        let slot = usize::try_from(id)
            .ok()
            .and_then(|idx| slots.get_mut(idx))
            .and_then(Option::as_mut)
            .ok_or(StoreError::NotFound(id))?;

        // Work on a copy so a failing operation leaves the stored task untouched.
        let mut updated = slot.clone();
        let now = Local::now().timestamp();
        for op in operations {
            updated.apply(op, actor, now)?;
        }
        *slot = updated;
        let details = serde_json::to_value(operations)?;
        self.save(&slots)?;
        self.record(AuditEvent::now(actor, "modify", Some(id), details));
        info!(id, operations = operations.len(), "applied mutations");
        Ok(())
    }
}
