//! Handlers for `/forum/problem`.

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::Json;
use domains::{NewProblem, Problem, ProblemDetails, ProblemId, ProblemPatch, ProblemStatus};
use serde::{Deserialize, Serialize};
use services::ProblemSearch;

use super::{ApiError, ApiResult, AppState, Envelope};

/// Query string of `GET /forum/problem`. Blank values count as absent.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ProblemQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl ProblemQuery {
    fn into_search(self) -> ApiResult<ProblemSearch> {
        let title = self.title.filter(|t| !t.trim().is_empty());
        let status = match self.status.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(raw.parse::<ProblemStatus>().map_err(ApiError::BadRequest)?),
        };
        Ok(ProblemSearch { title, status })
    }
}

pub async fn create_problem(
    State(state): State<AppState>,
    body: Result<Json<NewProblem>, JsonRejection>,
) -> ApiResult<Envelope<Problem>> {
    let Json(input) = body?;
    let problem = state.services.problems.create(input).await?;
    Ok(Envelope::created("Problem created successfully", problem))
}

pub async fn list_problems(
    State(state): State<AppState>,
    query: Result<Query<ProblemQuery>, QueryRejection>,
) -> ApiResult<Envelope<Vec<Problem>>> {
    let Query(query) = query?;
    let criteria = serde_json::to_string(&query).unwrap_or_default();
    let search = query.into_search()?;

    let problems = if search.is_empty() {
        state.services.problems.list().await?
    } else {
        state.services.problems.search(search.clone()).await?
    };
    if problems.is_empty() {
        let message = if search.is_empty() {
            "No problems found".to_owned()
        } else {
            format!("No problems found matching the given criteria: {criteria}")
        };
        return Err(ApiError::NotFound(message));
    }
    Ok(Envelope::ok("Problems retrieved successfully", problems))
}

pub async fn view_problem(
    State(state): State<AppState>,
    id: Result<Path<ProblemId>, PathRejection>,
) -> ApiResult<Envelope<ProblemDetails>> {
    let Path(id) = id?;
    let details = state.services.problems.view(id).await?;
    Ok(Envelope::ok("Problem retrieved successfully", details))
}

pub async fn update_problem(
    State(state): State<AppState>,
    id: Result<Path<ProblemId>, PathRejection>,
    body: Result<Json<ProblemPatch>, JsonRejection>,
) -> ApiResult<Envelope<Problem>> {
    let Path(id) = id?;
    let Json(patch) = body?;
    let problem = state.services.problems.update(id, patch).await?;
    Ok(Envelope::ok("Problem updated successfully", problem))
}

pub async fn delete_problem(
    State(state): State<AppState>,
    id: Result<Path<ProblemId>, PathRejection>,
) -> ApiResult<Envelope<Problem>> {
    let Path(id) = id?;
    let problem = state.services.problems.delete(id).await?;
    Ok(Envelope::ok("Problem deleted successfully", problem))
}

pub async fn vote_problem(
    State(state): State<AppState>,
    params: Result<Path<(ProblemId, bool)>, PathRejection>,
) -> ApiResult<Envelope<Problem>> {
    let Path((id, is_up_vote)) = params?;
    let problem = state.services.problems.vote(id, is_up_vote).await?;
    Ok(Envelope::ok("Vote recorded successfully", problem))
}
