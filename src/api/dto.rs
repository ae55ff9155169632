use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{
    Classmate, Expense, ExpenseDetail, ExpenseParticipant, Group, GroupMember, Settlement,
    SettlementStatus, ShareSpec, SplitType, UserBalance, format_cents, parse_cents,
};

use super::ApiError;

// Responses carry amounts as decimal strings ("150.00"); requests accept the
// same format. Request bodies use camelCase field names, responses mirror the
// stored snake_case records.

#[derive(Debug, Clone, Serialize)]
pub struct GroupDto {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub created_by: Uuid,
    pub is_public: bool,
    pub department: Option<String>,
    pub target_years: Vec<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub members: Option<Vec<MemberDto>>,
}

impl From<Group> for GroupDto {
    fn from(group: Group) -> Self {
        Self {
            id: group.id,
            name: group.name,
            description: group.description,
            created_by: group.created_by,
            is_public: group.is_public,
            department: group.department,
            target_years: group.target_years,
            created_at: group.created_at,
            updated_at: group.updated_at,
            members: None,
        }
    }
}

impl GroupDto {
    pub fn with_members(group: Group, members: Vec<GroupMember>) -> Self {
        let mut dto = Self::from(group);
        dto.members = Some(members.into_iter().map(MemberDto::from).collect());
        dto
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MemberDto {
    pub id: Uuid,
    pub group_id: Uuid,
    pub user_id: Uuid,
    pub user_email: Option<String>,
    pub user_name: String,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
}

impl From<GroupMember> for MemberDto {
    fn from(member: GroupMember) -> Self {
        Self {
            id: member.id,
            group_id: member.group_id,
            user_id: member.user_id,
            user_email: member.user_email,
            user_name: member.user_name,
            is_admin: member.is_admin,
            created_at: member.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ExpenseDto {
    pub id: Uuid,
    pub description: String,
    pub amount: String,
    pub paid_by: Uuid,
    pub group_id: Option<Uuid>,
    pub split_type: SplitType,
    pub category: Option<String>,
    pub notes: Option<String>,
    pub payment_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub expense_participants: Vec<ParticipantDto>,
}

impl From<ExpenseDetail> for ExpenseDto {
    fn from(detail: ExpenseDetail) -> Self {
        let Expense {
            id,
            description,
            amount_cents,
            paid_by,
            group_id,
            split_type,
            category,
            notes,
            payment_date,
            created_at,
            updated_at,
        } = detail.expense;
        Self {
            id,
            description,
            amount: format_cents(amount_cents),
            paid_by,
            group_id,
            split_type,
            category,
            notes,
            payment_date,
            created_at,
            updated_at,
            expense_participants: detail
                .participants
                .into_iter()
                .map(ParticipantDto::from)
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ParticipantDto {
    pub id: Uuid,
    pub expense_id: Uuid,
    pub user_id: Uuid,
    pub amount_owed: String,
    pub is_settled: bool,
    pub created_at: DateTime<Utc>,
}

impl From<ExpenseParticipant> for ParticipantDto {
    fn from(participant: ExpenseParticipant) -> Self {
        Self {
            id: participant.id,
            expense_id: participant.expense_id,
            user_id: participant.user_id,
            amount_owed: format_cents(participant.amount_owed_cents),
            is_settled: participant.is_settled,
            created_at: participant.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SettlementDto {
    pub id: Uuid,
    pub group_id: Uuid,
    pub from_user_id: Uuid,
    pub to_user_id: Uuid,
    pub amount: String,
    pub status: SettlementStatus,
    pub notes: Option<String>,
    pub settled_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<Settlement> for SettlementDto {
    fn from(settlement: Settlement) -> Self {
        Self {
            id: settlement.id,
            group_id: settlement.group_id,
            from_user_id: settlement.from_user_id,
            to_user_id: settlement.to_user_id,
            amount: format_cents(settlement.amount_cents),
            status: settlement.status,
            notes: settlement.notes,
            settled_at: settlement.settled_at,
            created_at: settlement.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BalanceDto {
    pub user_id: Uuid,
    pub full_name: String,
    pub net_balance: String,
    pub you_owe: String,
    pub you_are_owed: String,
}

impl From<UserBalance> for BalanceDto {
    fn from(balance: UserBalance) -> Self {
        Self {
            user_id: balance.user_id,
            full_name: balance.full_name,
            net_balance: format_cents(balance.net_balance),
            you_owe: format_cents(balance.you_owe),
            you_are_owed: format_cents(balance.you_are_owed),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ClassmateDto {
    pub id: Uuid,
    pub full_name: String,
    pub avatar_url: Option<String>,
}

impl From<Classmate> for ClassmateDto {
    fn from(classmate: Classmate) -> Self {
        Self {
            id: classmate.id,
            full_name: classmate.full_name,
            avatar_url: classmate.avatar_url,
        }
    }
}

// ========================
// Request bodies
// ========================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateGroupReq {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub is_public: bool,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub target_years: Vec<i32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateGroupReq {
    pub id: Uuid,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub is_public: Option<bool>,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub target_years: Option<Vec<i32>>,
}

/// One requested share. `value` is interpreted per split type: ignored for
/// EQUAL, a decimal amount for EXACT, a percentage for PERCENTAGE, a weight
/// for SHARES.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareReq {
    pub user_id: Uuid,
    #[serde(default)]
    pub value: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateExpenseReq {
    #[serde(default)]
    pub group_id: Option<Uuid>,
    pub description: String,
    pub amount: String,
    #[serde(default)]
    pub split_type: Option<SplitType>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub payment_date: Option<DateTime<Utc>>,
    pub shares: Vec<ShareReq>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateExpenseReq {
    pub id: Uuid,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub amount: Option<String>,
    #[serde(default)]
    pub split_type: Option<SplitType>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub payment_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub shares: Option<Vec<ShareReq>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSettlementReq {
    pub group_id: Uuid,
    pub to_user_id: Uuid,
    pub amount: String,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub status: Option<SettlementStatus>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddMemberReq {
    pub group_id: Uuid,
    pub email: String,
    #[serde(default)]
    pub is_admin: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberRoleReq {
    pub group_id: Uuid,
    pub member_id: Uuid,
    pub is_admin: bool,
}

// ========================
// Query strings
// ========================

#[derive(Debug, Deserialize)]
pub struct IdQuery {
    #[serde(default)]
    pub id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupScopedQuery {
    #[serde(default)]
    pub group_id: Option<Uuid>,
    #[serde(default)]
    pub id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalancesQuery {
    #[serde(default)]
    pub group_id: Option<Uuid>,
    #[serde(default)]
    pub user_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveMemberQuery {
    #[serde(default)]
    pub group_id: Option<Uuid>,
    #[serde(default)]
    pub member_id: Option<Uuid>,
}

// ========================
// Amount and share parsing
// ========================

/// Parse a decimal amount from a request, rejecting malformed values with a
/// 400 rather than a service error.
pub(crate) fn parse_amount(raw: &str) -> Result<i64, ApiError> {
    parse_cents(raw).map_err(|e| ApiError::bad_request(format!("Invalid amount: {}", e)))
}

/// Convert request shares to domain share specs, interpreting `value` per
/// split type: EXACT takes decimal amounts, PERCENTAGE takes percentages
/// with up to two decimals (stored as basis points), SHARES takes integer
/// weights, and EQUAL needs no values at all.
pub(crate) fn parse_shares(
    split_type: SplitType,
    shares: Vec<ShareReq>,
) -> Result<Vec<ShareSpec>, ApiError> {
    shares
        .into_iter()
        .map(|share| {
            let value = match (&share.value, split_type) {
                (None, _) | (_, SplitType::Equal) => None,
                (Some(raw), SplitType::Exact) => Some(parse_cents(raw).map_err(|e| {
                    ApiError::bad_request(format!("Invalid share amount: {}", e))
                })?),
                (Some(raw), SplitType::Percentage) => Some(parse_cents(raw).map_err(|e| {
                    ApiError::bad_request(format!("Invalid share percentage: {}", e))
                })?),
                (Some(raw), SplitType::Shares) => Some(raw.trim().parse::<i64>().map_err(
                    |_| ApiError::bad_request(format!("Invalid share weight: {}", raw)),
                )?),
            };
            Ok(ShareSpec {
                user_id: share.user_id,
                value,
            })
        })
        .collect()
}
