//! Error taxonomy surfaced at the view boundary
//!
//! Every failure is converted into a dismissible, severity-tagged [`Alert`];
//! none of them are fatal.

use thiserror::Error;

use crate::auth::AuthError;
use crate::comments::CommentId;
use crate::models::{Alert, AlertSeverity, RequirementId};
use crate::workflow::Stage;

/// Errors produced by workflow, session and backend operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WorkflowError {
    /// A required field was empty or malformed
    #[error("{0}")]
    Validation(String),

    /// A stage advance was attempted before its predicate held
    #[error("{reason}")]
    GateNotSatisfied { stage: Stage, reason: String },

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("Requirement not found: {0}")]
    NotFound(RequirementId),

    #[error("Comment not found: {0}")]
    CommentNotFound(CommentId),

    /// The owning view was unmounted before the operation finished
    #[error("Operation cancelled")]
    Cancelled,
}

impl WorkflowError {
    pub fn severity(&self) -> AlertSeverity {
        match self {
            WorkflowError::Validation(_) => AlertSeverity::Error,
            WorkflowError::GateNotSatisfied { .. } => AlertSeverity::Warning,
            WorkflowError::Auth(_) => AlertSeverity::Error,
            WorkflowError::NotFound(_) | WorkflowError::CommentNotFound(_) => AlertSeverity::Error,
            WorkflowError::Cancelled => AlertSeverity::Info,
        }
    }

    /// Banner shown in place of the failed operation
    pub fn to_alert(&self) -> Alert {
        Alert::new(self.severity(), self.to_string())
    }
}
