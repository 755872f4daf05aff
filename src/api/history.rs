//! Attendance history endpoint

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::NaiveDate;

use crate::{
    error::{AppError, AppResult},
    models::history::{HistoryQuery, HistoryResponse},
    AppState,
};

use super::AdminUser;

/// One day's check-ins (with `date`) or the per-day listing (without)
#[utoipa::path(
    get,
    path = "/history",
    tag = "checkin",
    security(("bearer_auth" = [])),
    params(HistoryQuery),
    responses(
        (status = 200, description = "Day detail or listing", body = HistoryResponse),
        (status = 400, description = "Invalid date", body = crate::error::ErrorResponse),
        (status = 401, description = "Not signed in", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_history(
    State(state): State<AppState>,
    AdminUser(_claims): AdminUser,
    Query(query): Query<HistoryQuery>,
) -> AppResult<Json<HistoryResponse>> {
    let response = match query.date.as_deref().filter(|d| !d.is_empty()) {
        Some(date) => {
            let date = NaiveDate::parse_from_str(date, "%Y-%m-%d")
                .map_err(|_| AppError::Validation("Invalid date format, expected YYYY-MM-DD".to_string()))?;
            HistoryResponse::Day(state.services.history.day(date).await?)
        }
        None => HistoryResponse::Listing(state.services.history.listing().await?),
    };
    Ok(Json(response))
}
