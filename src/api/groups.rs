use std::sync::Arc;

use axum::extract::Query;
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use serde_json::json;
use tracing::info;

use crate::application::ExpenseService;
use crate::domain::GroupPatch;

use super::dto::{CreateGroupReq, GroupDto, IdQuery, UpdateGroupReq};
use super::{ApiError, AuthUser};

/// `GET /api/expenses/groups?id=<id>`: one group with its members, or all
/// groups the caller belongs to when `id` is absent.
pub async fn get_groups(
    Extension(service): Extension<Arc<ExpenseService>>,
    AuthUser(user): AuthUser,
    Query(query): Query<IdQuery>,
) -> Result<Response, ApiError> {
    match query.id {
        Some(id) => {
            let detail = service.get_group(user.user_id, id).await?;
            Ok(Json(GroupDto::with_members(detail.group, detail.members)).into_response())
        }
        None => {
            let groups = service.get_groups(user.user_id).await?;
            let dtos: Vec<GroupDto> = groups.into_iter().map(GroupDto::from).collect();
            Ok(Json(dtos).into_response())
        }
    }
}

/// `POST /api/expenses/groups`: create a group; the caller becomes an admin
/// member in the same transaction.
pub async fn create_group(
    Extension(service): Extension<Arc<ExpenseService>>,
    AuthUser(user): AuthUser,
    Json(req): Json<CreateGroupReq>,
) -> Result<Json<GroupDto>, ApiError> {
    info!("Creating group {:?} for user {}", req.name, user.user_id);

    let group = service
        .create_group(
            &user,
            crate::application::NewGroup {
                name: req.name,
                description: req.description,
                is_public: req.is_public,
                department: req.department,
                target_years: req.target_years,
            },
        )
        .await?;
    Ok(Json(GroupDto::from(group)))
}

/// `PUT /api/expenses/groups`: update a group. Admin members only.
pub async fn update_group(
    Extension(service): Extension<Arc<ExpenseService>>,
    AuthUser(user): AuthUser,
    Json(req): Json<UpdateGroupReq>,
) -> Result<Json<GroupDto>, ApiError> {
    let patch = GroupPatch {
        name: req.name,
        description: req.description,
        is_public: req.is_public,
        department: req.department,
        target_years: req.target_years,
    };
    let group = service.update_group(user.user_id, req.id, patch).await?;
    Ok(Json(GroupDto::from(group)))
}

/// `DELETE /api/expenses/groups?id=<id>`: delete a group. Creator only.
pub async fn delete_group(
    Extension(service): Extension<Arc<ExpenseService>>,
    AuthUser(user): AuthUser,
    Query(query): Query<IdQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let id = query
        .id
        .ok_or_else(|| ApiError::bad_request("Group ID is required"))?;
    info!("Deleting group {} for user {}", id, user.user_id);

    service.delete_group(user.user_id, id).await?;
    Ok(Json(json!({ "success": true })))
}
