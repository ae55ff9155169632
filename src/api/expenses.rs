use std::sync::Arc;

use axum::extract::Query;
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use serde_json::json;
use tracing::info;

use crate::application::{ExpensePatch, ExpenseService, NewExpense};
use crate::domain::SplitType;

use super::dto::{
    CreateExpenseReq, ExpenseDto, GroupScopedQuery, IdQuery, UpdateExpenseReq, parse_amount,
    parse_shares,
};
use super::{ApiError, AuthUser};

/// `GET /api/expenses/expenses?groupId=<id>&id=<id?>`: one expense with its
/// shares, or all of a group's expenses. Members only.
pub async fn get_expenses(
    Extension(service): Extension<Arc<ExpenseService>>,
    AuthUser(user): AuthUser,
    Query(query): Query<GroupScopedQuery>,
) -> Result<Response, ApiError> {
    if let Some(expense_id) = query.id {
        let detail = service.get_expense(user.user_id, expense_id).await?;
        return Ok(Json(ExpenseDto::from(detail)).into_response());
    }

    let group_id = query
        .group_id
        .ok_or_else(|| ApiError::bad_request("Group ID is required"))?;
    let details = service.get_group_expenses(user.user_id, group_id).await?;
    let dtos: Vec<ExpenseDto> = details.into_iter().map(ExpenseDto::from).collect();
    Ok(Json(dtos).into_response())
}

/// `POST /api/expenses/expenses`: create an expense with its shares. The
/// caller is the payer; for group expenses everyone involved must be a
/// member and the shares must sum to the amount.
pub async fn create_expense(
    Extension(service): Extension<Arc<ExpenseService>>,
    AuthUser(user): AuthUser,
    Json(req): Json<CreateExpenseReq>,
) -> Result<Json<ExpenseDto>, ApiError> {
    info!(
        "Creating expense {:?} for user {}",
        req.description, user.user_id
    );

    let split_type = req.split_type.unwrap_or(SplitType::Equal);
    let amount_cents = parse_amount(&req.amount)?;
    let shares = parse_shares(split_type, req.shares)?;

    let detail = service
        .create_expense(
            user.user_id,
            NewExpense {
                group_id: req.group_id,
                description: req.description,
                amount_cents,
                split_type,
                category: req.category,
                notes: req.notes,
                payment_date: req.payment_date,
                shares,
            },
        )
        .await?;
    Ok(Json(ExpenseDto::from(detail)))
}

/// `PUT /api/expenses/expenses`: update an expense; a new share list
/// replaces the previous one. Payer only.
pub async fn update_expense(
    Extension(service): Extension<Arc<ExpenseService>>,
    AuthUser(user): AuthUser,
    Json(req): Json<UpdateExpenseReq>,
) -> Result<Json<ExpenseDto>, ApiError> {
    let amount_cents = req.amount.as_deref().map(parse_amount).transpose()?;
    // The split type governing new shares: the requested one if present,
    // otherwise whatever the expense already uses, resolved service-side.
    let shares = match req.shares {
        Some(shares) => {
            let split_type = match req.split_type {
                Some(split_type) => split_type,
                None => {
                    service
                        .get_expense(user.user_id, req.id)
                        .await?
                        .expense
                        .split_type
                }
            };
            Some(parse_shares(split_type, shares)?)
        }
        None => None,
    };

    let detail = service
        .update_expense(
            user.user_id,
            req.id,
            ExpensePatch {
                description: req.description,
                amount_cents,
                split_type: req.split_type,
                category: req.category,
                notes: req.notes,
                payment_date: req.payment_date,
                shares,
            },
        )
        .await?;
    Ok(Json(ExpenseDto::from(detail)))
}

/// `DELETE /api/expenses/expenses?id=<id>`: delete an expense and its
/// shares. Payer only.
pub async fn delete_expense(
    Extension(service): Extension<Arc<ExpenseService>>,
    AuthUser(user): AuthUser,
    Query(query): Query<IdQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let id = query
        .id
        .ok_or_else(|| ApiError::bad_request("Expense ID is required"))?;
    info!("Deleting expense {} for user {}", id, user.user_id);

    service.delete_expense(user.user_id, id).await?;
    Ok(Json(json!({ "success": true })))
}
