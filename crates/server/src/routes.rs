//! Route handlers and router assembly.

use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use examsweep_core::{
    FixStatus, Item, ItemSelection, PrecheckVerdict, ResultId, Risk, Run, RunId, RunParams, Stage,
    SweepResult,
};
use examsweep_pipeline::{FixRunner, ReviewQueue, SweepRunner, DEFAULT_CONCURRENCY};
use examsweep_quality::PrecheckEngine;

use crate::error::ApiError;
use crate::state::AppState;

/// Hard cap on every listing endpoint.
const MAX_LIST_LIMIT: usize = 100;
/// Listing size when the caller does not ask for one.
const DEFAULT_LIST_LIMIT: usize = 20;

/// Assemble the full router over the shared state.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/sweep/run", post(start_sweep))
        .route("/sweep/runs", get(list_runs))
        .route("/sweep/run/{id}", get(get_run))
        .route("/sweep/run/{id}/results", get(list_run_results))
        .route("/sweep/run/{id}/fix", post(run_fix_phase))
        .route("/sweep/preview", get(preview))
        .route("/review-queue", get(list_review_queue))
        .route("/review-queue/{id}/approve", post(approve_review))
        .route("/review-queue/{id}/reject", post(reject_review))
        .with_state(state)
}

/// Success envelope.
fn envelope(data: impl Serialize) -> Json<Value> {
    Json(json!({ "success": true, "data": data }))
}

fn clamp_limit(limit: Option<usize>) -> usize {
    limit.unwrap_or(DEFAULT_LIST_LIMIT).min(MAX_LIST_LIMIT)
}

fn parse_run_id(id: &str) -> Result<RunId, ApiError> {
    id.parse()
        .map_err(|_| ApiError::BadRequest(format!("invalid run id: {id}")))
}

fn parse_result_id(id: &str) -> Result<ResultId, ApiError> {
    id.parse()
        .map_err(|_| ApiError::BadRequest(format!("invalid result id: {id}")))
}

// === Sweep ===

#[derive(Debug, Deserialize)]
pub(crate) struct SweepRequest {
    from: Option<i64>,
    to: Option<i64>,
    #[serde(default)]
    apply: Option<bool>,
    #[serde(default, rename = "useLLM")]
    use_llm: Option<bool>,
    #[serde(default)]
    concurrency: Option<usize>,
}

pub(crate) async fn start_sweep(
    State(state): State<AppState>,
    Json(request): Json<SweepRequest>,
) -> Result<Json<Value>, ApiError> {
    let (Some(from), Some(to)) = (request.from, request.to) else {
        return Err(ApiError::BadRequest(
            "from and to are required numeric fields".to_string(),
        ));
    };
    if from > to {
        return Err(ApiError::BadRequest(format!(
            "invalid range: from ({from}) is greater than to ({to})"
        )));
    }

    let params = RunParams {
        selection: ItemSelection::Range { from, to },
        apply: request.apply.unwrap_or(false),
        use_judge: request.use_llm.unwrap_or(false),
        concurrency: request.concurrency.unwrap_or(DEFAULT_CONCURRENCY),
    };

    let runner = SweepRunner::new(
        state.storage.clone(),
        state.judge.clone(),
        state.cancel.clone(),
    );
    let run = runner
        .run(params)
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    // An empty range still leaves a DONE run behind; the caller gets 404
    let empty = run.summary.as_ref().is_some_and(|s| s.total == 0);
    if empty {
        return Err(ApiError::NotFound(format!(
            "no items found in range [{from}, {to}]"
        )));
    }

    Ok(envelope(run))
}

pub(crate) async fn get_run(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let run_id = parse_run_id(&id)?;
    let run: Run = state
        .storage
        .load_run(run_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("run {run_id} not found")))?;

    Ok(envelope(run))
}

#[derive(Debug, Deserialize)]
pub(crate) struct ListParams {
    limit: Option<usize>,
}

pub(crate) async fn list_runs(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Value>, ApiError> {
    let runs = state.storage.list_runs(clamp_limit(params.limit)).await?;
    Ok(envelope(runs))
}

/// One result joined with the variant it audited.
#[derive(Debug, Serialize)]
pub(crate) struct ResultEntry {
    result: SweepResult,
    item: Option<Item>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ResultsParams {
    stage: Option<String>,
    limit: Option<usize>,
}

pub(crate) async fn list_run_results(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(params): Query<ResultsParams>,
) -> Result<Json<Value>, ApiError> {
    let run_id = parse_run_id(&id)?;
    state
        .storage
        .load_run(run_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("run {run_id} not found")))?;

    let stage = params
        .stage
        .as_deref()
        .map(str::parse::<Stage>)
        .transpose()
        .map_err(ApiError::BadRequest)?;

    let results = state
        .storage
        .list_results(run_id, stage, clamp_limit(params.limit))
        .await?;

    let variant_ids: Vec<i64> = results.iter().map(|r| r.variant_id).collect();
    let mut items = state.storage.fetch_by_ids(&variant_ids).await?;

    let entries: Vec<ResultEntry> = results
        .into_iter()
        .map(|result| {
            let item = items.remove(&result.variant_id);
            ResultEntry { result, item }
        })
        .collect();

    Ok(envelope(entries))
}

// === Fix phase ===

#[derive(Debug, Default, Deserialize)]
pub(crate) struct FixRequest {
    #[serde(default, rename = "autoApply")]
    auto_apply: Option<bool>,
}

pub(crate) async fn run_fix_phase(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<FixRequest>,
) -> Result<Json<Value>, ApiError> {
    let run_id = parse_run_id(&id)?;
    let judge = state
        .judge
        .clone()
        .ok_or_else(|| ApiError::BadRequest("judge model not configured".to_string()))?;

    let runner = FixRunner::new(state.storage.clone(), judge);
    let outcome = runner
        .run(run_id, request.auto_apply.unwrap_or(false))
        .await?;

    Ok(envelope(json!({
        "autoFixed": outcome.auto_fixed,
        "pendingReview": outcome.pending_review,
        "errors": outcome.errors,
    })))
}

// === Preview ===

#[derive(Debug, Deserialize)]
pub(crate) struct PreviewParams {
    ids: String,
}

/// Precheck verdict for one variant, nothing persisted.
#[derive(Debug, Serialize)]
pub(crate) struct PreviewEntry {
    variant_id: i64,
    verdict: PrecheckVerdict,
}

pub(crate) async fn preview(
    State(state): State<AppState>,
    Query(params): Query<PreviewParams>,
) -> Result<Json<Value>, ApiError> {
    let ids: Vec<i64> = params
        .ids
        .split(',')
        .filter(|s| !s.trim().is_empty())
        .map(|s| {
            s.trim()
                .parse()
                .map_err(|_| ApiError::BadRequest(format!("invalid variant id: {s}")))
        })
        .collect::<Result<_, _>>()?;

    let items = state.storage.fetch_by_ids(&ids).await?;
    let engine = PrecheckEngine::new();

    let mut entries: Vec<PreviewEntry> = items
        .values()
        .map(|item| PreviewEntry {
            variant_id: item.variant_id,
            verdict: engine.evaluate(item),
        })
        .collect();
    entries.sort_by_key(|e| e.variant_id);

    Ok(envelope(entries))
}

// === Review queue ===

#[derive(Debug, Deserialize)]
pub(crate) struct ReviewQueueParams {
    status: Option<String>,
    priority: Option<String>,
    limit: Option<usize>,
}

pub(crate) async fn list_review_queue(
    State(state): State<AppState>,
    Query(params): Query<ReviewQueueParams>,
) -> Result<Json<Value>, ApiError> {
    let status = params
        .status
        .as_deref()
        .map(str::parse::<FixStatus>)
        .transpose()
        .map_err(ApiError::BadRequest)?;
    let priority = params
        .priority
        .as_deref()
        .map(str::parse::<Risk>)
        .transpose()
        .map_err(ApiError::BadRequest)?;

    let queue = ReviewQueue::new(state.storage.clone());
    let entries = queue
        .list(status, priority, clamp_limit(params.limit))
        .await?;

    let entries: Vec<ResultEntry> = entries
        .into_iter()
        .map(|e| ResultEntry {
            result: e.result,
            item: e.item,
        })
        .collect();

    Ok(envelope(entries))
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ReviewRequest {
    #[serde(default)]
    reviewer: Option<String>,
    #[serde(default)]
    notes: Option<String>,
}

pub(crate) async fn approve_review(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<ReviewRequest>,
) -> Result<Json<Value>, ApiError> {
    let result_id = parse_result_id(&id)?;
    let reviewer = request.reviewer.as_deref().unwrap_or("anonymous");

    let queue = ReviewQueue::new(state.storage.clone());
    let result = queue.approve(result_id, reviewer).await?;

    Ok(envelope(result))
}

pub(crate) async fn reject_review(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<ReviewRequest>,
) -> Result<Json<Value>, ApiError> {
    let result_id = parse_result_id(&id)?;
    let reviewer = request.reviewer.as_deref().unwrap_or("anonymous");

    let queue = ReviewQueue::new(state.storage.clone());
    let result = queue.reject(result_id, reviewer, request.notes).await?;

    Ok(envelope(result))
}

// === Health ===

pub(crate) async fn health(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    if state.storage.health_check().await {
        Ok(envelope(json!({ "status": "ok" })))
    } else {
        Err(ApiError::Internal("storage unreachable".to_string()))
    }
}
