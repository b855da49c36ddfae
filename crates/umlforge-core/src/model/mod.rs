mod change;
mod check;
mod class;
mod design;
mod relationship;

use thiserror::Error;

pub use change::{
    AppliedChange, Change, ChangeError, ChangeOutcome, ClassModifications,
    RelationshipModifications,
};
pub use check::{IssueKind, ModelIssue, ModelReport, Severity};
pub use class::{Attribute, DesignClass, Method, Point, Visibility};
pub use design::DesignModel;
pub use relationship::{DesignRelationship, RelationshipKind};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("Class name must not be empty")]
    EmptyName,
    #[error("Cannot rename {from} to {to}: a class with that name already exists")]
    NameConflict { from: String, to: String },
}
