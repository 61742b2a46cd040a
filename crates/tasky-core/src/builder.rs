use chrono::Local;
use thiserror::Error;
use tracing::debug;

use crate::capture::{
    strip_comments, BlobAllocator, CaptureError, DescriptionCapture, DEFAULT_COMMENT_MARKER,
};
use crate::coerce::Coercer;
use crate::schema::{OpKind, Schema, ASSIGNED, DESCRIPTION, TAGS};
use crate::task::{Task, TaskError, DEFAULT_STATUS};
use crate::token::{classify, Grammar, Token};

#[derive(Debug, Error)]
pub enum BuildError {
    #[error(transparent)]
    Task(#[from] TaskError),
    #[error(transparent)]
    Capture(#[from] CaptureError),
}

/// Assembles new tasks from `add` tokens.
#[derive(Debug, Clone)]
pub struct TaskBuilder {
    schema: Schema,
    coercer: Coercer,
    comment_marker: String,
    created_at: Option<i64>,
}

impl TaskBuilder {
    pub fn new(schema: Schema, coercer: Coercer) -> Self {
        Self {
            schema,
            coercer,
            comment_marker: DEFAULT_COMMENT_MARKER.to_string(),
            created_at: None,
        }
    }

    pub fn comment_marker(mut self, marker: impl Into<String>) -> Self {
        self.comment_marker = marker.into();
        self
    }

    /// Pins the creation instant instead of reading the clock.
    pub fn created_at(mut self, ts: i64) -> Self {
        self.created_at = Some(ts);
        self
    }

    /// Every token is validated before `capture` or `allocator` is touched.
    pub fn build<S: AsRef<str>>(
        &self,
        actor: &str,
        tokens: &[S],
        capture: &mut dyn DescriptionCapture,
        allocator: &mut dyn BlobAllocator,
    ) -> Result<Task, BuildError> {
        let mut task = Task::default();
        let mut title_words: Vec<&str> = Vec::new();
        let mut described = false;

        for token in tokens {
            let token = token.as_ref();
            match classify(token, Grammar::Create) {
                Token::TagAdd(name) => {
                    self.schema.collection_spec(TAGS, OpKind::Append)?;
                    task.tags.push(name.to_string());
                }
                Token::AssigneeAdd(name) => {
                    self.schema.collection_spec(ASSIGNED, OpKind::Append)?;
                    task.assigned.push(name.to_string());
                }
                Token::Assignment { attr, raw } => {
                    let spec = self.schema.assignable_spec(attr)?;
                    let value = self.coercer.coerce(spec, raw)?;
                    task.assign(spec.name, value)?;
                    described |= spec.name == DESCRIPTION;
                }
                Token::Word(_) | Token::TagRemove(_) => {
                    if !token.is_empty() {
                        title_words.push(token);
                    }
                }
            }
        }

        if !described {
            let raw = capture.capture_text()?;
            task.description = strip_comments(&raw, &self.comment_marker);
        }

        task.title = title_words.join(" ");
        task.status = DEFAULT_STATUS.to_string();
        task.created = self
            .created_at
            .unwrap_or_else(|| Local::now().timestamp());
        task.created_by = actor.to_string();
        task.events = Vec::new();
        task.blob_idx = allocator.new_blob_index();

        debug!(
            title = %task.title,
            tags = task.tags.len(),
            assigned = task.assigned.len(),
            captured = !described,
            "built task"
        );
        Ok(task)
    }
}
