use std::sync::Arc;

use axum::extract::Query;
use axum::{Extension, Json};
use serde_json::json;
use tracing::info;

use crate::application::{ExpenseService, NewSettlement};

use super::dto::{CreateSettlementReq, GroupScopedQuery, IdQuery, SettlementDto, parse_amount};
use super::{ApiError, AuthUser};

/// `GET /api/expenses/settlements?groupId=<id>`: a group's settlements,
/// most recent first. Members only.
pub async fn get_settlements(
    Extension(service): Extension<Arc<ExpenseService>>,
    AuthUser(user): AuthUser,
    Query(query): Query<GroupScopedQuery>,
) -> Result<Json<Vec<SettlementDto>>, ApiError> {
    let group_id = query
        .group_id
        .ok_or_else(|| ApiError::bad_request("Group ID is required"))?;

    let settlements = service
        .get_group_settlements(user.user_id, group_id)
        .await?;
    Ok(Json(
        settlements.into_iter().map(SettlementDto::from).collect(),
    ))
}

/// `POST /api/expenses/settlements`: record a repayment from the caller to
/// another member. Rejected when the amount exceeds the caller's outstanding
/// debt within the group.
pub async fn create_settlement(
    Extension(service): Extension<Arc<ExpenseService>>,
    AuthUser(user): AuthUser,
    Json(req): Json<CreateSettlementReq>,
) -> Result<Json<SettlementDto>, ApiError> {
    info!(
        "Recording settlement of {} from {} to {}",
        req.amount, user.user_id, req.to_user_id
    );

    let amount_cents = parse_amount(&req.amount)?;
    let settlement = service
        .create_settlement(
            user.user_id,
            NewSettlement {
                group_id: req.group_id,
                to_user_id: req.to_user_id,
                amount_cents,
                notes: req.notes,
                status: req.status,
            },
        )
        .await?;
    Ok(Json(SettlementDto::from(settlement)))
}

/// `DELETE /api/expenses/settlements?id=<id>`: delete a settlement. Only
/// the user who paid it may do this.
pub async fn delete_settlement(
    Extension(service): Extension<Arc<ExpenseService>>,
    AuthUser(user): AuthUser,
    Query(query): Query<IdQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let id = query
        .id
        .ok_or_else(|| ApiError::bad_request("Settlement ID is required"))?;
    info!("Deleting settlement {} for user {}", id, user.user_id);

    service.delete_settlement(user.user_id, id).await?;
    Ok(Json(json!({ "success": true })))
}
