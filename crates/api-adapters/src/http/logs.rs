//! Handlers for `/forum/log`.

use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use domains::{LogAction, LogFilter, LogRecord, TargetModel};
use serde::Deserialize;
use uuid::Uuid;

use super::{ApiError, ApiResult, AppState, Envelope};

/// Query string of `GET /forum/log/search`, parsed leniently so that a bad
/// value produces a 400 with a precise message.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogQuery {
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default)]
    pub target_model: Option<String>,
    #[serde(default)]
    pub target_id: Option<String>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl TryFrom<LogQuery> for LogFilter {
    type Error = ApiError;

    fn try_from(query: LogQuery) -> ApiResult<Self> {
        let action = non_blank(query.action)
            .map(|raw| raw.parse::<LogAction>().map_err(ApiError::BadRequest))
            .transpose()?;
        let target_model = non_blank(query.target_model)
            .map(|raw| raw.parse::<TargetModel>().map_err(ApiError::BadRequest))
            .transpose()?;
        let target_id = non_blank(query.target_id)
            .map(|raw| {
                Uuid::parse_str(raw.trim())
                    .map_err(|e| ApiError::BadRequest(format!("{raw} is not a valid ID: {e}")))
            })
            .transpose()?;
        Ok(LogFilter {
            action,
            target_model,
            target_id,
        })
    }
}

pub async fn all_logs(State(state): State<AppState>) -> ApiResult<Envelope<Vec<LogRecord>>> {
    let logs = state.services.audit.all().await?;
    Ok(Envelope::ok("Logs retrieved successfully", logs))
}

pub async fn search_logs(
    State(state): State<AppState>,
    query: Result<Query<LogQuery>, QueryRejection>,
) -> ApiResult<Envelope<Vec<LogRecord>>> {
    let Query(query) = query?;
    let filter = LogFilter::try_from(query)?;
    let logs = state.services.audit.logs(filter).await?;
    Ok(Envelope::ok("Logs retrieved successfully", logs))
}

pub async fn clear_logs(State(state): State<AppState>) -> ApiResult<Envelope<LogRecord>> {
    let record = state.services.audit.clear().await?;
    Ok(Envelope::ok("Logs cleared successfully", record))
}
