//! Handlers for `/forum/solution`.

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::Json;
use domains::{NewSolution, ProblemId, Solution, SolutionId, SolutionPatch};

use super::{ApiResult, AppState, Envelope};

pub async fn create_solution(
    State(state): State<AppState>,
    problem_id: Result<Path<ProblemId>, PathRejection>,
    body: Result<Json<NewSolution>, JsonRejection>,
) -> ApiResult<Envelope<Solution>> {
    let Path(problem_id) = problem_id?;
    let Json(input) = body?;
    let solution = state.services.solutions.create(problem_id, input).await?;
    Ok(Envelope::created("Solution created successfully", solution))
}

pub async fn list_solutions(
    State(state): State<AppState>,
    problem_id: Result<Path<ProblemId>, PathRejection>,
) -> ApiResult<Envelope<Vec<Solution>>> {
    let Path(problem_id) = problem_id?;
    let solutions = state.services.solutions.list_for_problem(problem_id).await?;
    Ok(Envelope::ok("Solutions retrieved successfully", solutions))
}

pub async fn update_solution(
    State(state): State<AppState>,
    id: Result<Path<SolutionId>, PathRejection>,
    body: Result<Json<SolutionPatch>, JsonRejection>,
) -> ApiResult<Envelope<Solution>> {
    let Path(id) = id?;
    let Json(patch) = body?;
    let solution = state.services.solutions.update(id, patch).await?;
    Ok(Envelope::ok("Solution updated successfully", solution))
}

pub async fn delete_solution(
    State(state): State<AppState>,
    id: Result<Path<SolutionId>, PathRejection>,
) -> ApiResult<Envelope<Solution>> {
    let Path(id) = id?;
    let solution = state.services.solutions.delete(id).await?;
    Ok(Envelope::ok("Solution deleted successfully", solution))
}

pub async fn vote_solution(
    State(state): State<AppState>,
    params: Result<Path<(SolutionId, bool)>, PathRejection>,
) -> ApiResult<Envelope<Solution>> {
    let Path((id, is_up_vote)) = params?;
    let solution = state.services.solutions.vote(id, is_up_vote).await?;
    Ok(Envelope::ok("Vote recorded successfully", solution))
}
