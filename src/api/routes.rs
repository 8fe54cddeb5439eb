use crate::analyzer::categorizer::{Category, CategoryRules, resolve_domain};
use crate::analyzer::{self, DEFAULT_TOP_DOMAINS_DAYS, DEFAULT_TREND_DAYS, MAX_WINDOW_DAYS};
use crate::config::{Config, write_categories};
use crate::db::{
    DailySummary, Database, DomainTotal, TimeEntryInput, TimeEntryRow, TrendPoint, format_date,
};
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::{error, info};

#[derive(Clone)]
pub struct ApiState {
    pub config: Arc<Config>,
}

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/api/time-entry", post(time_entry_create))
        .route("/api/daily-stats/:date", get(daily_stats))
        .route("/api/entries/:date", get(entries_by_date))
        .route("/api/weekly-stats", get(weekly_stats))
        .route("/api/top-domains", get(top_domains))
        .route("/api/productivity-trend", get(productivity_trend))
        .route("/api/status", get(status))
        .route(
            "/api/categories",
            get(categories_get).put(categories_put),
        )
        .route("/api/categorize", get(categorize))
        .fallback(not_found)
        .with_state(state)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TimeEntryPayload {
    domain: String,
    time_spent: i64,
    category: String,
    #[serde(default)]
    timestamp: Option<String>,
    #[serde(default)]
    date: Option<String>,
}

impl TimeEntryPayload {
    fn into_input(self) -> ApiResult<TimeEntryInput> {
        if self.time_spent < 0 {
            return Err(ApiError::BadRequest(format!(
                "timeSpent must not be negative: {}",
                self.time_spent
            )));
        }

        let category = self
            .category
            .parse::<Category>()
            .map_err(|error| ApiError::BadRequest(error.to_string()))?;

        let timestamp = match self.timestamp.as_deref().map(str::trim) {
            Some(raw) if !raw.is_empty() => DateTime::parse_from_rfc3339(raw)
                .map_err(|_| {
                    ApiError::BadRequest(format!(
                        "Invalid timestamp: {raw}. Example: 2026-02-18T09:30:00Z"
                    ))
                })?
                .with_timezone(&Local),
            _ => Local::now(),
        };

        let date = match self.date.as_deref().map(str::trim) {
            Some(raw) if !raw.is_empty() => parse_date(raw)?,
            _ => timestamp.date_naive(),
        };

        Ok(TimeEntryInput {
            domain: self.domain.trim().to_string(),
            time_spent_ms: self.time_spent,
            category,
            timestamp: timestamp.to_rfc3339(),
            date,
        })
    }
}

#[derive(Debug, Deserialize)]
struct RangeQuery {
    days: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct CategorizeQuery {
    url: String,
}

#[derive(Debug, Serialize)]
struct EntriesPayload {
    date: String,
    count: usize,
    entries: Vec<TimeEntryRow>,
}

#[derive(Debug, Serialize)]
struct StatusPayload {
    entries: i64,
    last_entry_at: Option<String>,
    db_path: String,
    api_port: u16,
}

async fn time_entry_create(
    State(state): State<ApiState>,
    payload: Result<Json<TimeEntryPayload>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let Json(payload) = payload.map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
    let entry = payload.into_input()?;

    let database = Database::open(&state.config.db_path)?;
    let id = analyzer::record_entry(&database, &entry)?;

    info!(
        id,
        domain = %entry.domain,
        category = %entry.category,
        time_spent = entry.time_spent_ms,
        "time entry recorded"
    );

    Ok(Json(json!({ "id": id })))
}

async fn daily_stats(
    State(state): State<ApiState>,
    Path(date): Path<String>,
) -> ApiResult<Json<DailySummary>> {
    let target_date = parse_date(&date)?;
    let database = Database::open(&state.config.db_path)?;

    Ok(Json(analyzer::daily_stats(&database, target_date)?))
}

async fn entries_by_date(
    State(state): State<ApiState>,
    Path(date): Path<String>,
) -> ApiResult<Json<EntriesPayload>> {
    let target_date = format_date(parse_date(&date)?);
    let database = Database::open(&state.config.db_path)?;
    let entries = database.entries_for_date(&target_date)?;

    Ok(Json(EntriesPayload {
        date: target_date,
        count: entries.len(),
        entries,
    }))
}

async fn weekly_stats(State(state): State<ApiState>) -> ApiResult<Json<Vec<DailySummary>>> {
    let database = Database::open(&state.config.db_path)?;
    let summaries = analyzer::weekly_stats(
        &database,
        Local::now().date_naive(),
        state.config.fill_missing_dates,
    )?;

    Ok(Json(summaries))
}

async fn top_domains(
    State(state): State<ApiState>,
    query: Result<Query<RangeQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<DomainTotal>>> {
    let days = range_days(query, DEFAULT_TOP_DOMAINS_DAYS)?;
    let database = Database::open(&state.config.db_path)?;

    Ok(Json(analyzer::top_domains(
        &database,
        Local::now().date_naive(),
        days,
    )?))
}

async fn productivity_trend(
    State(state): State<ApiState>,
    query: Result<Query<RangeQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<TrendPoint>>> {
    let days = range_days(query, DEFAULT_TREND_DAYS)?;
    let database = Database::open(&state.config.db_path)?;

    Ok(Json(analyzer::productivity_trend(
        &database,
        Local::now().date_naive(),
        days,
        state.config.fill_missing_dates,
    )?))
}

async fn status(State(state): State<ApiState>) -> ApiResult<Json<StatusPayload>> {
    let database = Database::open(&state.config.db_path)?;

    Ok(Json(StatusPayload {
        entries: database.entry_count()?,
        last_entry_at: database.latest_entry_timestamp()?,
        db_path: state.config.db_path.display().to_string(),
        api_port: state.config.api_port,
    }))
}

async fn categories_get(State(state): State<ApiState>) -> ApiResult<Json<CategoryRules>> {
    let rules = CategoryRules::load(&state.config.categories_path)?;
    Ok(Json(rules))
}

async fn categories_put(
    State(state): State<ApiState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let Json(payload) = payload.map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
    let rules = serde_json::from_value::<CategoryRules>(payload)
        .map_err(|error| ApiError::BadRequest(format!("Invalid categories schema: {error}")))?;

    write_categories(&state.config.categories_path, &rules)?;

    Ok(Json(json!({
        "saved": true,
        "path": state.config.categories_path.display().to_string()
    })))
}

async fn categorize(
    State(state): State<ApiState>,
    query: Result<Query<CategorizeQuery>, QueryRejection>,
) -> ApiResult<Json<Value>> {
    let Query(query) = query.map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
    let rules = CategoryRules::load(&state.config.categories_path)?;
    let domain = resolve_domain(&query.url);
    let category = rules.categorize(&domain);

    Ok(Json(json!({ "domain": domain, "category": category })))
}

async fn not_found() -> ApiError {
    ApiError::NotFound("Route not found".to_string())
}

fn range_days(query: Result<Query<RangeQuery>, QueryRejection>, default: u32) -> ApiResult<u32> {
    let Query(query) = query.map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
    match query.days {
        Some(days) if days > MAX_WINDOW_DAYS => Err(ApiError::BadRequest(format!(
            "days must be at most {MAX_WINDOW_DAYS}: {days}"
        ))),
        Some(days) => Ok(days),
        None => Ok(default),
    }
}

fn parse_date(input: &str) -> ApiResult<NaiveDate> {
    NaiveDate::parse_from_str(input, "%Y-%m-%d").map_err(|_| {
        ApiError::BadRequest(format!("Invalid date format: {input}. Example: 2026-02-18"))
    })
}

type ApiResult<T> = std::result::Result<T, ApiError>;

#[derive(Debug)]
enum ApiError {
    BadRequest(String),
    NotFound(String),
    Internal(anyhow::Error),
}

impl From<anyhow::Error> for ApiError {
    fn from(value: anyhow::Error) -> Self {
        Self::Internal(value)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::BadRequest(message) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "error": message }))).into_response()
            }
            ApiError::NotFound(message) => {
                (StatusCode::NOT_FOUND, Json(json!({ "error": message }))).into_response()
            }
            ApiError::Internal(error) => {
                error!(error = %format!("{error:#}"), "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": error.to_string() })),
                )
                    .into_response()
            }
        }
    }
}
