use std::sync::Arc;

use axum::extract::Query;
use axum::{Extension, Json};
use serde_json::json;
use tracing::info;

use crate::application::ExpenseService;

use super::dto::{
    AddMemberReq, ClassmateDto, GroupScopedQuery, MemberDto, MemberRoleReq, RemoveMemberQuery,
};
use super::{ApiError, AuthUser};

/// `GET /api/expenses/members?groupId=<id>`: a group's members. Members
/// only.
pub async fn get_members(
    Extension(service): Extension<Arc<ExpenseService>>,
    AuthUser(user): AuthUser,
    Query(query): Query<GroupScopedQuery>,
) -> Result<Json<Vec<MemberDto>>, ApiError> {
    let group_id = query
        .group_id
        .ok_or_else(|| ApiError::bad_request("Group ID is required"))?;

    let members = service.get_members(user.user_id, group_id).await?;
    Ok(Json(members.into_iter().map(MemberDto::from).collect()))
}

/// `POST /api/expenses/members`: add a registered student to a group by
/// email. Admin members only.
pub async fn add_member(
    Extension(service): Extension<Arc<ExpenseService>>,
    AuthUser(user): AuthUser,
    Json(req): Json<AddMemberReq>,
) -> Result<Json<MemberDto>, ApiError> {
    info!(
        "Adding member {} to group {} by {}",
        req.email, req.group_id, user.user_id
    );

    let member = service
        .add_member(user.user_id, req.group_id, &req.email, req.is_admin)
        .await?;
    Ok(Json(MemberDto::from(member)))
}

/// `DELETE /api/expenses/members?groupId=<id>&memberId=<id>`: remove a
/// member. Admins may remove anyone; members may remove themselves; the last
/// admin stays.
pub async fn remove_member(
    Extension(service): Extension<Arc<ExpenseService>>,
    AuthUser(user): AuthUser,
    Query(query): Query<RemoveMemberQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let (group_id, member_id) = match (query.group_id, query.member_id) {
        (Some(group_id), Some(member_id)) => (group_id, member_id),
        _ => return Err(ApiError::bad_request("Missing required parameters")),
    };
    info!(
        "Removing member {} from group {} by {}",
        member_id, group_id, user.user_id
    );

    service
        .remove_member(user.user_id, group_id, member_id)
        .await?;
    Ok(Json(json!({ "success": true })))
}

/// `PATCH /api/expenses/members`: change a member's admin flag. Admin
/// members only; the last admin cannot be demoted.
pub async fn set_member_role(
    Extension(service): Extension<Arc<ExpenseService>>,
    AuthUser(user): AuthUser,
    Json(req): Json<MemberRoleReq>,
) -> Result<Json<MemberDto>, ApiError> {
    let member = service
        .set_member_admin(user.user_id, req.group_id, req.member_id, req.is_admin)
        .await?;
    Ok(Json(MemberDto::from(member)))
}

/// `GET /api/expenses/classmates`: students sharing the caller's department
/// and year. Best effort: failures yield an empty list.
pub async fn get_classmates(
    Extension(service): Extension<Arc<ExpenseService>>,
    AuthUser(user): AuthUser,
) -> Json<Vec<ClassmateDto>> {
    let classmates = service.get_classmates(user.user_id).await;
    Json(classmates.into_iter().map(ClassmateDto::from).collect())
}
