use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::planner::Operation;
use crate::schema::{
    AttrKind, AttributeSpec, OpKind, Schema, ASSIGNED, DESCRIPTION, DUE, PROJECT, RANK, TAGS,
};

pub const DEFAULT_STATUS: &str = "open";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TaskError {
    #[error("invalid value '{value}' for {attr}: {reason}")]
    InvalidValue {
        attr: String,
        value: String,
        reason: String,
    },
    #[error("cannot assign {attr}: {reason}")]
    InvalidAssignment { attr: String, reason: String },
    #[error("you cannot set {attr} to none")]
    IllegalNullAssignment { attr: String },
}

impl TaskError {
    pub fn invalid_value(
        attr: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        TaskError::InvalidValue {
            attr: attr.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    pub fn invalid_assignment(attr: impl Into<String>, reason: impl Into<String>) -> Self {
        TaskError::InvalidAssignment {
            attr: attr.into(),
            reason: reason.into(),
        }
    }

    pub fn illegal_null(attr: impl Into<String>) -> Self {
        TaskError::IllegalNullAssignment { attr: attr.into() }
    }
}

/// A coerced attribute value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum AttrValue {
    Text(String),
    Number(f64),
    /// Unix seconds.
    Instant(i64),
}

impl AttrValue {
    pub fn kind(&self) -> AttrKind {
        match self {
            AttrValue::Text(_) => AttrKind::Text,
            AttrValue::Number(_) => AttrKind::Number,
            AttrValue::Instant(_) => AttrKind::Instant,
        }
    }

    fn into_text(self) -> Option<String> {
        match self {
            AttrValue::Text(text) => Some(text),
            _ => None,
        }
    }

    fn as_number(&self) -> Option<f64> {
        match self {
            AttrValue::Number(number) => Some(*number),
            _ => None,
        }
    }

    fn as_instant(&self) -> Option<i64> {
        match self {
            AttrValue::Instant(ts) => Some(*ts),
            _ => None,
        }
    }
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrValue::Text(text) => f.write_str(text),
            AttrValue::Number(number) => write!(f, "{number}"),
            AttrValue::Instant(ts) => write!(f, "{ts}"),
        }
    }
}

/// One store-appended audit entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub kind: OpKind,
    pub timestamp: i64,
    pub actor: String,
    pub attribute: String,
    pub value: Option<AttrValue>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Task {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    pub blob_idx: String,
    pub title: String,
    #[serde(rename = "desc")]
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub assigned: Vec<String>,
    pub project: Option<String>,
    pub status: String,
    pub rank: Option<f64>,
    pub due: Option<i64>,
    pub created: i64,
    #[serde(default)]
    pub created_by: String,
    #[serde(default)]
    pub events: Vec<Event>,
}

impl Task {
    pub fn is_active(&self) -> bool {
        let status = self.status.trim();
        !(status.eq_ignore_ascii_case("closed") || status.eq_ignore_ascii_case("done"))
    }

    /// Stores a coerced singular value. `None` clears a nullable field.
    ///
    /// Type and nullability come from the schema entry; only the field
    /// storage is named here.
    pub fn assign(&mut self, attr: &str, value: Option<AttrValue>) -> Result<(), TaskError> {
        let spec = Schema::builtin()
            .lookup(attr)
            .filter(|spec| !spec.internal && !spec.is_repeated() && spec.allows(OpKind::Set))
            .ok_or_else(|| TaskError::invalid_assignment(attr, "attribute is not assignable"))?;
        check_value(spec, value.as_ref())?;
        match spec.name {
            DESCRIPTION => {
                self.description = value.and_then(AttrValue::into_text).unwrap_or_default()
            }
            PROJECT => self.project = value.and_then(AttrValue::into_text),
            RANK => self.rank = value.as_ref().and_then(AttrValue::as_number),
            DUE => self.due = value.as_ref().and_then(AttrValue::as_instant),
            _ => return Err(TaskError::invalid_assignment(attr, "attribute has no task field")),
        }
        Ok(())
    }

    /// Applies one operation and records it in `events`.
    pub fn apply(&mut self, op: &Operation, actor: &str, now: i64) -> Result<(), TaskError> {
        let value = match op {
            Operation::Append { attr, value } => {
                self.list_mut(attr)?.push(value.clone());
                Some(AttrValue::Text(value.clone()))
            }
            Operation::Remove { attr, value } => {
                let list = self.list_mut(attr)?;
                match list.iter().position(|item| item == value) {
                    Some(pos) => {
                        list.remove(pos);
                    }
                    None => warn!(attr = %attr, value = %value, "remove matched nothing"),
                }
                Some(AttrValue::Text(value.clone()))
            }
            Operation::Set { attr, value } => {
                self.assign(attr, value.clone())?;
                value.clone()
            }
        };
        self.events.push(Event {
            kind: op.kind(),
            timestamp: now,
            actor: actor.to_string(),
            attribute: op.attr().to_string(),
            value,
        });
        Ok(())
    }

    fn list_mut(&mut self, attr: &str) -> Result<&mut Vec<String>, TaskError> {
        let spec = Schema::builtin()
            .lookup(attr)
            .filter(|spec| spec.is_repeated())
            .ok_or_else(|| TaskError::invalid_assignment(attr, "not a collection attribute"))?;
        match spec.name {
            TAGS => Ok(&mut self.tags),
            ASSIGNED => Ok(&mut self.assigned),
            _ => Err(TaskError::invalid_assignment(attr, "collection has no task field")),
        }
    }
}

fn check_value(spec: &AttributeSpec, value: Option<&AttrValue>) -> Result<(), TaskError> {
    match value {
        None if !spec.nullable => Err(TaskError::illegal_null(spec.name)),
        Some(value) if value.kind() != spec.kind => Err(TaskError::invalid_value(
            spec.name,
            value.to_string(),
            "value has the wrong type",
        )),
        Some(AttrValue::Number(number)) if !number.is_finite() => Err(TaskError::invalid_value(
            spec.name,
            number.to_string(),
            "number must be finite",
        )),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task() -> Task {
        Task {
            blob_idx: "blob".to_string(),
            title: "Example".to_string(),
            status: DEFAULT_STATUS.to_string(),
            tags: vec!["errand".to_string(), "home".to_string()],
            created: 1_000,
            ..Task::default()
        }
    }

    #[test]
    fn apply_records_one_event_per_operation() {
        let mut task = task();
        let ops = vec![
            Operation::append(TAGS, "urgent"),
            Operation::remove(TAGS, "errand"),
            Operation::set(PROJECT, Some(AttrValue::Text("home".to_string()))),
        ];
        for op in &ops {
            task.apply(op, "alice", 2_000).expect("apply");
        }
        assert_eq!(task.tags, vec!["home", "urgent"]);
        assert_eq!(task.project.as_deref(), Some("home"));
        let kinds: Vec<OpKind> = task.events.iter().map(|event| event.kind).collect();
        assert_eq!(kinds, vec![OpKind::Append, OpKind::Remove, OpKind::Set]);
        assert!(task.events.iter().all(|event| event.actor == "alice"));
    }

    #[test]
    fn remove_deletes_only_first_match() {
        let mut task = task();
        task.tags = vec!["a".to_string(), "b".to_string(), "a".to_string()];
        task.apply(&Operation::remove(TAGS, "a"), "bob", 1).expect("apply");
        assert_eq!(task.tags, vec!["b", "a"]);
    }

    #[test]
    fn set_to_none_clears_nullable_field() {
        let mut task = task();
        task.rank = Some(3.0);
        task.apply(&Operation::set(RANK, None), "bob", 1).expect("apply");
        assert_eq!(task.rank, None);
        assert_eq!(task.events[0].value, None);
    }

    #[test]
    fn assign_rejects_mismatched_value_type() {
        let mut task = task();
        let err = task
            .assign(RANK, Some(AttrValue::Text("high".to_string())))
            .unwrap_err();
        assert!(matches!(err, TaskError::InvalidValue { .. }));
    }

    #[test]
    fn assign_follows_schema_flags() {
        let mut task = task();
        assert_eq!(task.assign(DESCRIPTION, None), Err(TaskError::illegal_null(DESCRIPTION)));
        for attr in ["title", "status", "created", "blob_idx", TAGS, "garbage"] {
            let err = task
                .assign(attr, Some(AttrValue::Text("x".to_string())))
                .unwrap_err();
            assert!(matches!(err, TaskError::InvalidAssignment { .. }), "{attr}");
        }
        task.assign(DUE, Some(AttrValue::Instant(42))).expect("due");
        assert_eq!(task.due, Some(42));
    }

    #[test]
    fn non_finite_rank_never_reaches_the_task() {
        let mut task = task();
        let err = task
            .apply(&Operation::set(RANK, Some(AttrValue::Number(f64::NAN))), "bob", 1)
            .unwrap_err();
        assert!(matches!(err, TaskError::InvalidValue { .. }));
        assert_eq!(task.rank, None);
        assert!(task.events.is_empty());
    }

    #[test]
    fn closed_and_done_tasks_are_inactive() {
        let mut task = task();
        assert!(task.is_active());
        task.status = "Done".to_string();
        assert!(!task.is_active());
        task.status = "closed".to_string();
        assert!(!task.is_active());
    }
}
