//! Query filters understood by every repository implementation.
//!
//! Fields left as `None` do not constrain the result. The `matches` methods
//! are the reference semantics; SQL adapters must agree with them.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::ids::ActorId;
use crate::models::{LogAction, LogRecord, Problem, ProblemStatus, TargetModel};

/// How a problem title is compared. Both variants ignore case and
/// surrounding whitespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TitleMatch {
    /// Whole-title equality; used for duplicate detection.
    Exact(String),
    /// Substring search; used by the public search endpoint.
    Contains(String),
}

impl TitleMatch {
    pub fn matches(&self, title: &str) -> bool {
        let title = title.trim().to_lowercase();
        match self {
            Self::Exact(needle) => title == needle.trim().to_lowercase(),
            Self::Contains(needle) => title.contains(&needle.trim().to_lowercase()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProblemFilter {
    pub title: Option<TitleMatch>,
    pub status: Option<ProblemStatus>,
    pub created_by: Option<ActorId>,
}

impl ProblemFilter {
    pub fn exact_title(title: impl Into<String>) -> Self {
        Self {
            title: Some(TitleMatch::Exact(title.into())),
            ..Default::default()
        }
    }

    pub fn matches(&self, problem: &Problem) -> bool {
        self.title.as_ref().is_none_or(|t| t.matches(&problem.title))
            && self.status.is_none_or(|s| s == problem.status)
            && self.created_by.is_none_or(|a| a == problem.created_by)
    }
}

/// Sparse field-equality match over audit records.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogFilter {
    #[serde(default)]
    pub action: Option<LogAction>,
    #[serde(default)]
    pub target_model: Option<TargetModel>,
    #[serde(default)]
    pub target_id: Option<Uuid>,
}

impl LogFilter {
    pub fn is_empty(&self) -> bool {
        self.action.is_none() && self.target_model.is_none() && self.target_id.is_none()
    }

    pub fn matches(&self, record: &LogRecord) -> bool {
        self.action.is_none_or(|a| a == record.action)
            && self.target_model.is_none_or(|m| m == record.target_model)
            && self.target_id.is_none_or(|id| Some(id) == record.target_id)
    }
}
