//! Recognized task attributes and the operations each one accepts.
//!
//! Every other module asks the schema about an attribute instead of matching
//! on attribute names, so a new attribute only needs a new table entry here
//! (plus a field on [`crate::task::Task`] to hold it).

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::task::TaskError;

pub const TITLE: &str = "title";
pub const DESCRIPTION: &str = "desc";
pub const TAGS: &str = "tags";
pub const ASSIGNED: &str = "assigned";
pub const PROJECT: &str = "project";
pub const STATUS: &str = "status";
pub const RANK: &str = "rank";
pub const DUE: &str = "due";
pub const CREATED: &str = "created";
pub const BLOB_IDX: &str = "blob_idx";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttrKind {
    Text,
    Number,
    Instant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    Singular,
    Repeated,
}

/// A mutation shape. Shared by planned operations and recorded events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpKind {
    Set,
    Append,
    Remove,
}

impl fmt::Display for OpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OpKind::Set => "set",
            OpKind::Append => "append",
            OpKind::Remove => "remove",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttributeSpec {
    pub name: &'static str,
    pub kind: AttrKind,
    pub cardinality: Cardinality,
    /// May be cleared with the `none` literal.
    pub nullable: bool,
    /// May be targeted by `attr:value` tokens.
    pub assignable: bool,
    /// Managed by the system; any attempt to assign it is a contract violation.
    pub internal: bool,
    pub operations: &'static [OpKind],
}

impl AttributeSpec {
    pub fn allows(&self, op: OpKind) -> bool {
        self.operations.contains(&op)
    }

    pub fn is_repeated(&self) -> bool {
        self.cardinality == Cardinality::Repeated
    }
}

const SET_ONLY: &[OpKind] = &[OpKind::Set];
const NO_OPERATIONS: &[OpKind] = &[];

const fn singular(
    name: &'static str,
    kind: AttrKind,
    nullable: bool,
    assignable: bool,
) -> AttributeSpec {
    AttributeSpec {
        name,
        kind,
        cardinality: Cardinality::Singular,
        nullable,
        assignable,
        internal: false,
        operations: if assignable { SET_ONLY } else { NO_OPERATIONS },
    }
}

const fn repeated(name: &'static str, operations: &'static [OpKind]) -> AttributeSpec {
    AttributeSpec {
        name,
        kind: AttrKind::Text,
        cardinality: Cardinality::Repeated,
        nullable: false,
        assignable: false,
        internal: false,
        operations,
    }
}

static BUILTIN_ATTRIBUTES: &[AttributeSpec] = &[
    singular(TITLE, AttrKind::Text, false, false),
    singular(DESCRIPTION, AttrKind::Text, false, true),
    repeated(TAGS, &[OpKind::Append, OpKind::Remove]),
    // Assignees have no removal grammar; the gap is declared here rather
    // than hidden in the planner.
    repeated(ASSIGNED, &[OpKind::Append]),
    singular(PROJECT, AttrKind::Text, true, true),
    singular(STATUS, AttrKind::Text, false, false),
    singular(RANK, AttrKind::Number, true, true),
    singular(DUE, AttrKind::Instant, true, true),
    singular(CREATED, AttrKind::Instant, false, false),
    AttributeSpec {
        name: BLOB_IDX,
        kind: AttrKind::Text,
        cardinality: Cardinality::Singular,
        nullable: false,
        assignable: false,
        internal: true,
        operations: NO_OPERATIONS,
    },
];

#[derive(Debug, Clone, Copy)]
pub struct Schema {
    attributes: &'static [AttributeSpec],
}

impl Default for Schema {
    fn default() -> Self {
        Self::builtin()
    }
}

impl Schema {
    pub fn new(attributes: &'static [AttributeSpec]) -> Self {
        Self { attributes }
    }

    pub fn builtin() -> Self {
        Self::new(BUILTIN_ATTRIBUTES)
    }

    pub fn attributes(&self) -> &'static [AttributeSpec] {
        self.attributes
    }

    pub fn lookup(&self, name: &str) -> Option<&'static AttributeSpec> {
        self.attributes.iter().find(|spec| spec.name == name)
    }

    pub fn nullable_names(&self) -> Vec<&'static str> {
        self.attributes
            .iter()
            .filter(|spec| spec.nullable)
            .map(|spec| spec.name)
            .collect()
    }

    /// Resolves the target of an `attr:value` token.
    pub fn assignable_spec(&self, name: &str) -> Result<&'static AttributeSpec, TaskError> {
        let Some(spec) = self.lookup(name) else {
            return Err(TaskError::invalid_assignment(name, "unknown attribute"));
        };
        if spec.internal {
            return Err(TaskError::invalid_assignment(
                name,
                "attribute is managed internally",
            ));
        }
        if spec.is_repeated() {
            return Err(TaskError::invalid_assignment(
                name,
                "repeated attribute cannot be assigned a single value",
            ));
        }
        if !spec.assignable || !spec.allows(OpKind::Set) {
            return Err(TaskError::invalid_assignment(name, "attribute is not assignable"));
        }
        Ok(spec)
    }

    /// Resolves the target of an append/remove token on a collection.
    pub fn collection_spec(
        &self,
        name: &str,
        op: OpKind,
    ) -> Result<&'static AttributeSpec, TaskError> {
        let spec = self
            .lookup(name)
            .filter(|spec| spec.is_repeated())
            .ok_or_else(|| TaskError::invalid_assignment(name, "not a collection attribute"))?;
        if !spec.allows(op) {
            return Err(TaskError::invalid_assignment(
                name,
                format!("{op} is not supported"),
            ));
        }
        Ok(spec)
    }
}
