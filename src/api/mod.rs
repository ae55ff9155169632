//! HTTP boundary: axum routes translating JSON requests into service calls.
//!
//! Authentication is delegated to an external session provider which injects
//! trusted identity headers; the [`AuthUser`] extractor resolves them.
//! Application errors surface as HTTP status codes plus a JSON
//! `{"error": ...}` body; store failures are logged server-side and never
//! leak internals.

use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::StatusCode;
use axum::http::request::Parts;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Extension, Json, Router};
use serde_json::json;
use tracing::error;
use uuid::Uuid;

use crate::application::{AppError, ExpenseService, Identity};

mod balances;
mod dto;
mod expenses;
mod groups;
mod members;
mod settlements;

pub use dto::*;

/// Build the API router with the service injected as an extension.
pub fn router(service: Arc<ExpenseService>) -> Router {
    Router::new()
        .route(
            "/api/expenses/groups",
            get(groups::get_groups)
                .post(groups::create_group)
                .put(groups::update_group)
                .delete(groups::delete_group),
        )
        .route("/api/expenses/balances", get(balances::get_balances))
        .route(
            "/api/expenses/expenses",
            get(expenses::get_expenses)
                .post(expenses::create_expense)
                .put(expenses::update_expense)
                .delete(expenses::delete_expense),
        )
        .route(
            "/api/expenses/settlements",
            get(settlements::get_settlements)
                .post(settlements::create_settlement)
                .delete(settlements::delete_settlement),
        )
        .route(
            "/api/expenses/members",
            get(members::get_members)
                .post(members::add_member)
                .delete(members::remove_member)
                .patch(members::set_member_role),
        )
        .route("/api/expenses/classmates", get(members::get_classmates))
        .layer(Extension(service))
}

/// The calling user, resolved from the session provider's identity headers.
/// Requests without a valid `x-user-id` are rejected with 401.
pub struct AuthUser(pub Identity);

impl<S: Send + Sync> FromRequestParts<S> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = |name: &str| {
            parts
                .headers
                .get(name)
                .and_then(|value| value.to_str().ok())
                .map(str::to_string)
        };

        let user_id = header("x-user-id")
            .and_then(|raw| Uuid::parse_str(&raw).ok())
            .ok_or_else(ApiError::unauthenticated)?;

        Ok(AuthUser(Identity {
            user_id,
            email: header("x-user-email"),
            full_name: header("x-user-name"),
        }))
    }
}

/// An error response: an HTTP status plus a JSON `{"error": ...}` body.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unauthenticated() -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "Not authenticated")
    }
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        let status = match &err {
            AppError::GroupNotFound(_)
            | AppError::ExpenseNotFound(_)
            | AppError::SettlementNotFound(_)
            | AppError::StudentNotFound(_) => StatusCode::NOT_FOUND,
            AppError::NotAMember
            | AppError::NotAnAdmin
            | AppError::NotTheCreator
            | AppError::NotThePayer
            | AppError::RecipientNotAMember => StatusCode::FORBIDDEN,
            AppError::ParticipantNotAMember(_)
            | AppError::AlreadyMember
            | AppError::LastAdmin
            | AppError::InvalidAmount(_)
            | AppError::InvalidShares(_)
            | AppError::SettlementExceedsDebt { .. } => StatusCode::BAD_REQUEST,
            AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!("Unexpected store failure: {}", err);
            return Self::new(status, "Internal server error");
        }
        Self::new(status, err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}
