//! Deny-before-attempt checks shared by the entity services.

use domains::{ActorId, ForumError, NewProblem, ProblemPatch, ProblemStatus, Result};

/// Only the creator may change or remove an entity.
pub fn ensure_owner(actor: ActorId, owner: ActorId, entity: &str) -> Result<()> {
    if actor == owner {
        Ok(())
    } else {
        Err(ForumError::Unauthorized(format!(
            "You are not authorized to modify this {entity}."
        )))
    }
}

pub fn require_text(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        Err(ForumError::Validation(format!("{field} must not be empty")))
    } else {
        Ok(())
    }
}

pub fn validate_new_problem(input: &NewProblem) -> Result<()> {
    require_text("title", &input.title)?;
    require_text("details", &input.details)?;
    if input.status == Some(ProblemStatus::Close) {
        return Err(ForumError::Validation(
            "a problem cannot be created with status CLOSE".into(),
        ));
    }
    Ok(())
}

pub fn validate_problem_patch(patch: &ProblemPatch) -> Result<()> {
    if let Some(title) = &patch.title {
        require_text("title", title)?;
    }
    if let Some(details) = &patch.details {
        require_text("details", details)?;
    }
    Ok(())
}
