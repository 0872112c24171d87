//! # Domain Models
//!
//! These structs represent the core entities of Rusty-Forum.
//! JSON field names are camelCase to match what API clients already consume.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::ids::{ActorId, LogId, ProblemId, SolutionId};

/// Lifecycle state of a problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ProblemStatus {
    #[default]
    Active,
    Close,
    Resolved,
}

impl ProblemStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "ACTIVE",
            Self::Close => "CLOSE",
            Self::Resolved => "RESOLVED",
        }
    }
}

impl fmt::Display for ProblemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProblemStatus {
    type Err = String;

    /// Case-insensitive: `active`, `Active` and `ACTIVE` are all accepted.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ACTIVE" => Ok(Self::Active),
            "CLOSE" => Ok(Self::Close),
            "RESOLVED" => Ok(Self::Resolved),
            _ => Err(format!("{s} is not a valid status")),
        }
    }
}

/// A question posted to the forum.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Problem {
    pub id: ProblemId,
    pub title: String,
    pub details: String,
    /// What the author tried and what they expected to happen.
    pub try_and_expect: Option<String>,
    /// Free-text, comma separated tags.
    pub tags: Option<String>,
    pub status: ProblemStatus,
    pub up_votes: u64,
    pub down_votes: u64,
    pub views: u64,
    pub solution_count: u64,
    /// Solutions by reference, in the order they were attached.
    pub solutions: Vec<SolutionId>,
    pub created_by: ActorId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Problem {
    /// Builds a fresh problem with all counters at zero.
    pub fn from_new(id: ProblemId, input: NewProblem, created_by: ActorId, now: DateTime<Utc>) -> Self {
        Self {
            id,
            title: input.title.trim().to_string(),
            details: input.details,
            try_and_expect: input.try_and_expect,
            tags: input.tags,
            status: input.status.unwrap_or_default(),
            up_votes: 0,
            down_votes: 0,
            views: 0,
            solution_count: 0,
            solutions: Vec::new(),
            created_by,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn counter(&self, counter: ProblemCounter) -> u64 {
        match counter {
            ProblemCounter::UpVotes => self.up_votes,
            ProblemCounter::DownVotes => self.down_votes,
            ProblemCounter::Views => self.views,
            ProblemCounter::SolutionCount => self.solution_count,
        }
    }

    /// Applies a signed delta to one counter, never going below zero.
    pub fn apply_delta(&mut self, counter: ProblemCounter, delta: i64) {
        let slot = match counter {
            ProblemCounter::UpVotes => &mut self.up_votes,
            ProblemCounter::DownVotes => &mut self.down_votes,
            ProblemCounter::Views => &mut self.views,
            ProblemCounter::SolutionCount => &mut self.solution_count,
        };
        *slot = slot.saturating_add_signed(delta);
    }

    pub fn apply_patch(&mut self, patch: &ProblemPatch, now: DateTime<Utc>) {
        if let Some(title) = &patch.title {
            self.title = title.trim().to_string();
        }
        if let Some(details) = &patch.details {
            self.details = details.clone();
        }
        if let Some(try_and_expect) = &patch.try_and_expect {
            self.try_and_expect = Some(try_and_expect.clone());
        }
        if let Some(tags) = &patch.tags {
            self.tags = Some(tags.clone());
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        self.updated_at = now;
    }
}

/// An answer to a problem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Solution {
    pub id: SolutionId,
    pub problem_id: ProblemId,
    pub details: String,
    pub up_votes: u64,
    pub down_votes: u64,
    pub created_by: ActorId,
    pub is_accepted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Solution {
    pub fn from_new(
        id: SolutionId,
        problem_id: ProblemId,
        input: NewSolution,
        created_by: ActorId,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            problem_id,
            details: input.details,
            up_votes: 0,
            down_votes: 0,
            created_by,
            is_accepted: false,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn apply_delta(&mut self, counter: SolutionCounter, delta: i64) {
        let slot = match counter {
            SolutionCounter::UpVotes => &mut self.up_votes,
            SolutionCounter::DownVotes => &mut self.down_votes,
        };
        *slot = slot.saturating_add_signed(delta);
    }

    pub fn apply_patch(&mut self, patch: &SolutionPatch, now: DateTime<Utc>) {
        self.details = patch.details.clone();
        self.updated_at = now;
    }
}

/// A problem together with its populated solutions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProblemDetails {
    pub problem: Problem,
    pub solutions: Vec<Solution>,
}

/// Counters on a problem that move independently of `update`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProblemCounter {
    UpVotes,
    DownVotes,
    Views,
    SolutionCount,
}

impl ProblemCounter {
    pub fn column(&self) -> &'static str {
        match self {
            Self::UpVotes => "up_votes",
            Self::DownVotes => "down_votes",
            Self::Views => "views",
            Self::SolutionCount => "solution_count",
        }
    }

    pub fn vote(is_up_vote: bool) -> Self {
        if is_up_vote {
            Self::UpVotes
        } else {
            Self::DownVotes
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SolutionCounter {
    UpVotes,
    DownVotes,
}

impl SolutionCounter {
    pub fn column(&self) -> &'static str {
        match self {
            Self::UpVotes => "up_votes",
            Self::DownVotes => "down_votes",
        }
    }

    pub fn vote(is_up_vote: bool) -> Self {
        if is_up_vote {
            Self::UpVotes
        } else {
            Self::DownVotes
        }
    }
}

// ── Audit log ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogAction {
    Create,
    Update,
    Delete,
    Vote,
    Clear,
}

impl LogAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "CREATE",
            Self::Update => "UPDATE",
            Self::Delete => "DELETE",
            Self::Vote => "VOTE",
            Self::Clear => "CLEAR",
        }
    }

    /// Noun used in human readable audit messages ("the creation of the problem").
    pub fn noun(&self) -> &'static str {
        match self {
            Self::Create => "creation",
            Self::Update => "update",
            Self::Delete => "deletion",
            Self::Vote => "vote",
            Self::Clear => "clearing",
        }
    }
}

impl fmt::Display for LogAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "CREATE" => Ok(Self::Create),
            "UPDATE" => Ok(Self::Update),
            "DELETE" => Ok(Self::Delete),
            "VOTE" => Ok(Self::Vote),
            "CLEAR" => Ok(Self::Clear),
            _ => Err(format!("{s} is not a valid log action")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TargetModel {
    Problem,
    Solution,
    Log,
}

impl TargetModel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Problem => "PROBLEM",
            Self::Solution => "SOLUTION",
            Self::Log => "LOG",
        }
    }
}

impl fmt::Display for TargetModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TargetModel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PROBLEM" => Ok(Self::Problem),
            "SOLUTION" => Ok(Self::Solution),
            "LOG" => Ok(Self::Log),
            _ => Err(format!("{s} is not a valid target model")),
        }
    }
}

/// An audit entry before it has been persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub user_id: Option<ActorId>,
    pub action: LogAction,
    pub target_id: Option<Uuid>,
    pub target_model: TargetModel,
    pub is_success: bool,
    pub details: Option<String>,
}

impl LogEntry {
    /// A successful action against a specific entity.
    pub fn success(actor: ActorId, action: LogAction, model: TargetModel, target: impl Into<Uuid>) -> Self {
        Self {
            user_id: Some(actor),
            action,
            target_id: Some(target.into()),
            target_model: model,
            is_success: true,
            details: None,
        }
    }

    /// A failed action; failures never reference a target.
    pub fn failure(actor: ActorId, action: LogAction, model: TargetModel, details: impl Into<String>) -> Self {
        Self {
            user_id: Some(actor),
            action,
            target_id: None,
            target_model: model,
            is_success: false,
            details: Some(details.into()),
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

/// A persisted, immutable audit record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogRecord {
    pub id: LogId,
    pub user_id: Option<ActorId>,
    pub action: LogAction,
    pub target_id: Option<Uuid>,
    pub target_model: TargetModel,
    pub is_success: bool,
    pub details: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl LogRecord {
    pub fn from_entry(id: LogId, entry: LogEntry, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            user_id: entry.user_id,
            action: entry.action,
            target_id: entry.target_id,
            target_model: entry.target_model,
            is_success: entry.is_success,
            details: entry.details,
            created_at,
        }
    }
}

// ── Inputs ──────────────────────────────────────────────────────────────────

/// Payload for creating a problem. The author is stamped by the service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProblem {
    pub title: String,
    pub details: String,
    #[serde(default)]
    pub try_and_expect: Option<String>,
    #[serde(default)]
    pub tags: Option<String>,
    #[serde(default)]
    pub status: Option<ProblemStatus>,
}

/// Sparse update of the author-editable problem fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProblemPatch {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub details: Option<String>,
    #[serde(default)]
    pub try_and_expect: Option<String>,
    #[serde(default)]
    pub tags: Option<String>,
    #[serde(default)]
    pub status: Option<ProblemStatus>,
}

impl ProblemPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.details.is_none()
            && self.try_and_expect.is_none()
            && self.tags.is_none()
            && self.status.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSolution {
    pub details: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SolutionPatch {
    pub details: String,
}
