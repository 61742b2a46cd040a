use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::coerce::{is_none_literal, Coercer};
use crate::schema::{OpKind, Schema, ASSIGNED, TAGS};
use crate::task::{AttrValue, TaskError};
use crate::token::{classify, Grammar, Token};

/// One discrete change against an existing task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Operation {
    Append {
        attr: String,
        value: String,
    },
    Remove {
        attr: String,
        value: String,
    },
    Set {
        attr: String,
        value: Option<AttrValue>,
    },
}

impl Operation {
    pub fn append(attr: impl Into<String>, value: impl Into<String>) -> Self {
        Operation::Append {
            attr: attr.into(),
            value: value.into(),
        }
    }

    pub fn remove(attr: impl Into<String>, value: impl Into<String>) -> Self {
        Operation::Remove {
            attr: attr.into(),
            value: value.into(),
        }
    }

    pub fn set(attr: impl Into<String>, value: Option<AttrValue>) -> Self {
        Operation::Set {
            attr: attr.into(),
            value,
        }
    }

    pub fn kind(&self) -> OpKind {
        match self {
            Operation::Append { .. } => OpKind::Append,
            Operation::Remove { .. } => OpKind::Remove,
            Operation::Set { .. } => OpKind::Set,
        }
    }

    pub fn attr(&self) -> &str {
        match self {
            Operation::Append { attr, .. }
            | Operation::Remove { attr, .. }
            | Operation::Set { attr, .. } => attr,
        }
    }
}

/// A token the modify grammar has no meaning for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnknownToken {
    pub position: usize,
    pub token: String,
}

impl fmt::Display for UnknownToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown arg '{}'. Skipping...", self.token)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MutationPlan {
    /// Must be applied in this order.
    pub operations: Vec<Operation>,
    pub skipped: Vec<UnknownToken>,
}

impl MutationPlan {
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}

/// Turns `modify` tokens into an ordered operation list.
#[derive(Debug, Clone, Copy)]
pub struct MutationPlanner {
    schema: Schema,
    coercer: Coercer,
}

impl MutationPlanner {
    pub fn new(schema: Schema, coercer: Coercer) -> Self {
        Self { schema, coercer }
    }

    /// Fails on the first invalid token; never returns a partial plan.
    pub fn plan<S: AsRef<str>>(&self, tokens: &[S]) -> Result<MutationPlan, TaskError> {
        let mut plan = MutationPlan::default();
        for (position, token) in tokens.iter().enumerate() {
            let token = token.as_ref();
            let op = match classify(token, Grammar::Modify) {
                Token::TagAdd(name) => self.collection_op(OpKind::Append, TAGS, name)?,
                Token::TagRemove(name) => self.collection_op(OpKind::Remove, TAGS, name)?,
                Token::AssigneeAdd(name) => self.collection_op(OpKind::Append, ASSIGNED, name)?,
                Token::Assignment { attr, raw } => self.assignment(attr, raw)?,
                Token::Word(word) => {
                    if !word.is_empty() {
                        warn!("unknown arg '{}'. Skipping...", word);
                        plan.skipped.push(UnknownToken {
                            position,
                            token: word.to_string(),
                        });
                    }
                    continue;
                }
            };
            plan.operations.push(op);
        }
        debug!(
            operations = plan.operations.len(),
            skipped = plan.skipped.len(),
            "planned mutations"
        );
        Ok(plan)
    }

    fn collection_op(&self, kind: OpKind, attr: &str, value: &str) -> Result<Operation, TaskError> {
        let spec = self.schema.collection_spec(attr, kind)?;
        Ok(match kind {
            OpKind::Remove => Operation::remove(spec.name, value),
            _ => Operation::append(spec.name, value),
        })
    }

    fn assignment(&self, attr: &str, raw: &str) -> Result<Operation, TaskError> {
        if self.schema.lookup(attr).is_some_and(|spec| spec.internal) {
            return Err(TaskError::invalid_assignment(
                attr,
                "attribute is managed internally",
            ));
        }
        if is_none_literal(raw) {
            let spec = self
                .schema
                .lookup(attr)
                .filter(|spec| spec.nullable && spec.allows(OpKind::Set))
                .ok_or_else(|| TaskError::illegal_null(attr))?;
            return Ok(Operation::set(spec.name, None));
        }
        let spec = self.schema.assignable_spec(attr)?;
        let value = self.coercer.coerce(spec, raw)?;
        Ok(Operation::set(spec.name, value))
    }
}
