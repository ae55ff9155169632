use std::sync::Arc;

use axum::extract::Query;
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};

use crate::application::ExpenseService;

use super::dto::{BalanceDto, BalancesQuery};
use super::{ApiError, AuthUser};

/// `GET /api/expenses/balances?groupId=<id>&userId=<id?>`: all member
/// balances of a group, or a single member's balance (or null) when `userId`
/// is given. Members only.
pub async fn get_balances(
    Extension(service): Extension<Arc<ExpenseService>>,
    AuthUser(user): AuthUser,
    Query(query): Query<BalancesQuery>,
) -> Result<Response, ApiError> {
    let group_id = query
        .group_id
        .ok_or_else(|| ApiError::bad_request("Group ID is required"))?;

    let balances = service
        .get_balances(user.user_id, group_id, query.user_id)
        .await?;

    if query.user_id.is_some() {
        let single = balances.into_iter().next().map(BalanceDto::from);
        return Ok(Json(single).into_response());
    }
    let dtos: Vec<BalanceDto> = balances.into_iter().map(BalanceDto::from).collect();
    Ok(Json(dtos).into_response())
}
