use chrono::{DateTime, Utc};
use tracing::warn;

use crate::domain::{
    Cents, Classmate, Expense, ExpenseDetail, ExpenseId, ExpenseParticipant, Group, GroupId,
    GroupMember, GroupPatch, Settlement, SettlementId, SettlementStatus, ShareSpec, SplitType,
    Student, UserBalance, UserId, compute_balances, compute_shares,
};
use crate::storage::Repository;

use super::AppError;

/// Application service providing high-level operations over the shared
/// ledger. This is the primary interface for any client (HTTP API, tests).
pub struct ExpenseService {
    repo: Repository,
}

/// The resolved identity of the calling user, as supplied by the external
/// session provider. Display fields are optional; `display_name` falls back
/// the way the session provider does (full name, else the email local part,
/// else the raw id).
#[derive(Debug, Clone)]
pub struct Identity {
    pub user_id: UserId,
    pub email: Option<String>,
    pub full_name: Option<String>,
}

impl Identity {
    pub fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            email: None,
            full_name: None,
        }
    }

    pub fn display_name(&self) -> String {
        if let Some(name) = &self.full_name {
            return name.clone();
        }
        if let Some(email) = &self.email {
            if let Some((local, _)) = email.split_once('@') {
                return local.to_string();
            }
            return email.clone();
        }
        self.user_id.to_string()
    }
}

/// Input for creating a group.
pub struct NewGroup {
    pub name: String,
    pub description: Option<String>,
    pub is_public: bool,
    pub department: Option<String>,
    pub target_years: Vec<i32>,
}

/// Input for creating an expense.
pub struct NewExpense {
    pub group_id: Option<GroupId>,
    pub description: String,
    pub amount_cents: Cents,
    pub split_type: SplitType,
    pub category: Option<String>,
    pub notes: Option<String>,
    pub payment_date: Option<DateTime<Utc>>,
    pub shares: Vec<ShareSpec>,
}

/// Partial update for an expense; `None` fields are left untouched.
/// Changing the amount or the split type requires a fresh share list so the
/// construction invariant (shares sum to the amount) survives the update.
#[derive(Default)]
pub struct ExpensePatch {
    pub description: Option<String>,
    pub amount_cents: Option<Cents>,
    pub split_type: Option<SplitType>,
    pub category: Option<String>,
    pub notes: Option<String>,
    pub payment_date: Option<DateTime<Utc>>,
    pub shares: Option<Vec<ShareSpec>>,
}

/// Input for recording a settlement.
pub struct NewSettlement {
    pub group_id: GroupId,
    pub to_user_id: UserId,
    pub amount_cents: Cents,
    pub notes: Option<String>,
    pub status: Option<SettlementStatus>,
}

/// A group together with its member rows.
#[derive(Debug)]
pub struct GroupDetail {
    pub group: Group,
    pub members: Vec<GroupMember>,
}

impl ExpenseService {
    /// Create a new service with the given repository.
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }

    /// Initialize a new database at the given path.
    pub async fn init(database_path: &str) -> Result<Self, AppError> {
        let db_url = format!("sqlite:{}?mode=rwc", database_path);
        let repo = Repository::init(&db_url).await?;
        Ok(Self::new(repo))
    }

    /// Connect to an existing database.
    pub async fn connect(database_path: &str) -> Result<Self, AppError> {
        let db_url = format!("sqlite:{}", database_path);
        let repo = Repository::connect(&db_url).await?;
        Ok(Self::new(repo))
    }

    /// Sync a student profile from the registration system.
    pub async fn save_student(&self, student: &Student) -> Result<(), AppError> {
        Ok(self.repo.save_student(student).await?)
    }

    // ========================
    // Group operations
    // ========================

    /// Create a group; the creator becomes an admin member in the same
    /// transaction.
    pub async fn create_group(
        &self,
        caller: &Identity,
        new_group: NewGroup,
    ) -> Result<Group, AppError> {
        let mut group = Group::new(new_group.name, caller.user_id)
            .with_visibility(new_group.is_public)
            .with_target_years(new_group.target_years);
        if let Some(description) = new_group.description {
            group = group.with_description(description);
        }
        if let Some(department) = new_group.department {
            group = group.with_department(department);
        }

        let mut creator =
            GroupMember::new(group.id, caller.user_id, caller.display_name()).as_admin();
        if let Some(email) = &caller.email {
            creator = creator.with_email(email.clone());
        }

        self.repo.create_group(&group, &creator).await?;
        Ok(group)
    }

    /// Get a group with its members. Callers must belong to the group.
    pub async fn get_group(&self, caller: UserId, id: GroupId) -> Result<GroupDetail, AppError> {
        let group = self
            .repo
            .get_group(id)
            .await?
            .ok_or(AppError::GroupNotFound(id))?;
        self.require_member(id, caller).await?;
        let members = self.repo.get_members(id).await?;
        Ok(GroupDetail { group, members })
    }

    /// List the groups the caller belongs to.
    pub async fn get_groups(&self, caller: UserId) -> Result<Vec<Group>, AppError> {
        Ok(self.repo.get_groups(caller).await?)
    }

    /// Update a group. Admin members only.
    pub async fn update_group(
        &self,
        caller: UserId,
        id: GroupId,
        patch: GroupPatch,
    ) -> Result<Group, AppError> {
        let mut group = self
            .repo
            .get_group(id)
            .await?
            .ok_or(AppError::GroupNotFound(id))?;
        self.require_admin(id, caller).await?;

        if let Some(name) = patch.name {
            group.name = name;
        }
        if let Some(description) = patch.description {
            group.description = Some(description);
        }
        if let Some(is_public) = patch.is_public {
            group.is_public = is_public;
        }
        if let Some(department) = patch.department {
            group.department = Some(department);
        }
        if let Some(target_years) = patch.target_years {
            group.target_years = target_years;
        }
        group.updated_at = Utc::now();

        self.repo.update_group(&group).await?;
        Ok(group)
    }

    /// Delete a group, cascading to members, expenses, and settlements.
    /// Only the original creator may do this.
    pub async fn delete_group(&self, caller: UserId, id: GroupId) -> Result<(), AppError> {
        let group = self
            .repo
            .get_group(id)
            .await?
            .ok_or(AppError::GroupNotFound(id))?;
        if group.created_by != caller {
            return Err(AppError::NotTheCreator);
        }
        self.repo.delete_group(id).await?;
        Ok(())
    }

    // ========================
    // Member operations
    // ========================

    /// List the members of a group. Callers must belong to the group.
    pub async fn get_members(
        &self,
        caller: UserId,
        group_id: GroupId,
    ) -> Result<Vec<GroupMember>, AppError> {
        self.require_member(group_id, caller).await?;
        Ok(self.repo.get_members(group_id).await?)
    }

    /// Add a registered student to a group by email. Admin members only.
    pub async fn add_member(
        &self,
        caller: UserId,
        group_id: GroupId,
        email: &str,
        is_admin: bool,
    ) -> Result<GroupMember, AppError> {
        self.require_admin(group_id, caller).await?;

        let student = self
            .repo
            .get_student_by_email(email)
            .await?
            .ok_or_else(|| AppError::StudentNotFound(email.to_string()))?;
        if self.repo.find_member(group_id, student.id).await?.is_some() {
            return Err(AppError::AlreadyMember);
        }

        let mut member = GroupMember::new(group_id, student.id, student.full_name.clone())
            .with_email(student.email.clone());
        if is_admin {
            member = member.as_admin();
        }
        self.repo.add_member(&member).await?;
        Ok(member)
    }

    /// Remove a member. Admins may remove anyone; a member may remove
    /// themselves. The last admin can never be removed.
    pub async fn remove_member(
        &self,
        caller: UserId,
        group_id: GroupId,
        member_user_id: UserId,
    ) -> Result<(), AppError> {
        let caller_member = self.require_member(group_id, caller).await?;
        if caller != member_user_id && !caller_member.is_admin {
            return Err(AppError::NotAnAdmin);
        }

        let target = self
            .repo
            .find_member(group_id, member_user_id)
            .await?
            .ok_or(AppError::NotAMember)?;
        if target.is_admin && self.repo.count_admins(group_id).await? == 1 {
            return Err(AppError::LastAdmin);
        }

        self.repo.remove_member(group_id, member_user_id).await?;
        Ok(())
    }

    /// Change a member's admin flag. Admin members only; the last admin can
    /// never be demoted.
    pub async fn set_member_admin(
        &self,
        caller: UserId,
        group_id: GroupId,
        member_user_id: UserId,
        is_admin: bool,
    ) -> Result<GroupMember, AppError> {
        self.require_admin(group_id, caller).await?;

        let target = self
            .repo
            .find_member(group_id, member_user_id)
            .await?
            .ok_or(AppError::NotAMember)?;
        if !is_admin && target.is_admin && self.repo.count_admins(group_id).await? == 1 {
            return Err(AppError::LastAdmin);
        }

        self.repo
            .set_member_admin(group_id, member_user_id, is_admin)
            .await?;
        self.repo
            .find_member(group_id, member_user_id)
            .await?
            .ok_or(AppError::NotAMember)
    }

    // ========================
    // Expense operations
    // ========================

    /// Create an expense and its participant shares in one transaction.
    /// For group expenses the caller and every share user must be members.
    pub async fn create_expense(
        &self,
        caller: UserId,
        input: NewExpense,
    ) -> Result<ExpenseDetail, AppError> {
        if input.amount_cents <= 0 {
            return Err(AppError::InvalidAmount(
                "Expense amount must be positive".to_string(),
            ));
        }

        if let Some(group_id) = input.group_id {
            self.require_member(group_id, caller).await?;
            self.require_share_users_are_members(group_id, &input.shares)
                .await?;
        }

        let owed = compute_shares(input.split_type, input.amount_cents, &input.shares)?;

        let mut expense = Expense::new(input.description, input.amount_cents, caller)
            .with_split_type(input.split_type);
        if let Some(group_id) = input.group_id {
            expense = expense.with_group(group_id);
        }
        if let Some(category) = input.category {
            expense = expense.with_category(category);
        }
        if let Some(notes) = input.notes {
            expense = expense.with_notes(notes);
        }
        if let Some(payment_date) = input.payment_date {
            expense = expense.with_payment_date(payment_date);
        }

        let participants: Vec<ExpenseParticipant> = owed
            .into_iter()
            .map(|(user_id, amount)| ExpenseParticipant::new(expense.id, user_id, amount))
            .collect();

        self.repo.create_expense(&expense, &participants).await?;
        Ok(ExpenseDetail {
            expense,
            participants,
        })
    }

    /// Update an expense. Only the payer may do this; changing the amount or
    /// split type requires a fresh share list, which replaces the previous
    /// participant rows in the same transaction.
    pub async fn update_expense(
        &self,
        caller: UserId,
        id: ExpenseId,
        patch: ExpensePatch,
    ) -> Result<ExpenseDetail, AppError> {
        let detail = self
            .repo
            .get_expense(id)
            .await?
            .ok_or(AppError::ExpenseNotFound(id))?;
        let mut expense = detail.expense;
        if expense.paid_by != caller {
            return Err(AppError::NotThePayer);
        }

        if (patch.amount_cents.is_some() || patch.split_type.is_some()) && patch.shares.is_none() {
            return Err(AppError::InvalidAmount(
                "A share list is required when changing the amount or split type".to_string(),
            ));
        }

        if let Some(description) = patch.description {
            expense.description = description;
        }
        if let Some(amount_cents) = patch.amount_cents {
            if amount_cents <= 0 {
                return Err(AppError::InvalidAmount(
                    "Expense amount must be positive".to_string(),
                ));
            }
            expense.amount_cents = amount_cents;
        }
        if let Some(split_type) = patch.split_type {
            expense.split_type = split_type;
        }
        if let Some(category) = patch.category {
            expense.category = Some(category);
        }
        if let Some(notes) = patch.notes {
            expense.notes = Some(notes);
        }
        if let Some(payment_date) = patch.payment_date {
            expense.payment_date = payment_date;
        }
        expense.updated_at = Utc::now();

        let participants = match patch.shares {
            Some(shares) => {
                if let Some(group_id) = expense.group_id {
                    self.require_share_users_are_members(group_id, &shares)
                        .await?;
                }
                let owed = compute_shares(expense.split_type, expense.amount_cents, &shares)?;
                Some(
                    owed.into_iter()
                        .map(|(user_id, amount)| {
                            ExpenseParticipant::new(expense.id, user_id, amount)
                        })
                        .collect::<Vec<_>>(),
                )
            }
            None => None,
        };

        self.repo
            .update_expense(&expense, participants.as_deref())
            .await?;
        Ok(ExpenseDetail {
            participants: match participants {
                Some(participants) => participants,
                None => detail.participants,
            },
            expense,
        })
    }

    /// Delete an expense and its shares. Only the payer may do this.
    pub async fn delete_expense(&self, caller: UserId, id: ExpenseId) -> Result<(), AppError> {
        let detail = self
            .repo
            .get_expense(id)
            .await?
            .ok_or(AppError::ExpenseNotFound(id))?;
        if detail.expense.paid_by != caller {
            return Err(AppError::NotThePayer);
        }
        self.repo.delete_expense(id).await?;
        Ok(())
    }

    /// Get one expense with its shares. Group expenses require membership.
    pub async fn get_expense(
        &self,
        caller: UserId,
        id: ExpenseId,
    ) -> Result<ExpenseDetail, AppError> {
        let detail = self
            .repo
            .get_expense(id)
            .await?
            .ok_or(AppError::ExpenseNotFound(id))?;
        if let Some(group_id) = detail.expense.group_id {
            self.require_member(group_id, caller).await?;
        }
        Ok(detail)
    }

    /// All expenses of a group, newest payment first. Members only.
    pub async fn get_group_expenses(
        &self,
        caller: UserId,
        group_id: GroupId,
    ) -> Result<Vec<ExpenseDetail>, AppError> {
        self.require_member(group_id, caller).await?;
        Ok(self.repo.get_group_expenses(group_id).await?)
    }

    /// All expenses where the user is payer or participant, newest first.
    pub async fn get_expenses(&self, user_id: UserId) -> Result<Vec<ExpenseDetail>, AppError> {
        Ok(self.repo.get_expenses(user_id).await?)
    }

    /// Attach one more participant to an existing expense. Only the payer
    /// may do this; the share amount is taken as-is.
    pub async fn add_participant(
        &self,
        caller: UserId,
        expense_id: ExpenseId,
        user_id: UserId,
        amount_owed_cents: Cents,
    ) -> Result<ExpenseParticipant, AppError> {
        let detail = self
            .repo
            .get_expense(expense_id)
            .await?
            .ok_or(AppError::ExpenseNotFound(expense_id))?;
        if detail.expense.paid_by != caller {
            return Err(AppError::NotThePayer);
        }
        if let Some(group_id) = detail.expense.group_id {
            if self.repo.find_member(group_id, user_id).await?.is_none() {
                return Err(AppError::ParticipantNotAMember(user_id));
            }
        }

        let participant = ExpenseParticipant::new(expense_id, user_id, amount_owed_cents);
        self.repo.add_participant(&participant).await?;
        Ok(participant)
    }

    // ========================
    // Settlement operations
    // ========================

    /// Record a repayment between two members of a group. The amount must
    /// not exceed what the payer currently owes within the group, so
    /// replaying the same settlement cannot overdraw the debt.
    pub async fn create_settlement(
        &self,
        caller: UserId,
        input: NewSettlement,
    ) -> Result<Settlement, AppError> {
        if input.amount_cents <= 0 {
            return Err(AppError::InvalidAmount(
                "Settlement amount must be positive".to_string(),
            ));
        }
        self.require_member(input.group_id, caller).await?;
        if self
            .repo
            .find_member(input.group_id, input.to_user_id)
            .await?
            .is_none()
        {
            return Err(AppError::RecipientNotAMember);
        }

        let balances = self.compute_group_balances(input.group_id).await?;
        let owed = balances
            .iter()
            .find(|b| b.user_id == caller)
            .map(|b| b.you_owe)
            .unwrap_or(0);
        if input.amount_cents > owed {
            return Err(AppError::SettlementExceedsDebt {
                owed,
                requested: input.amount_cents,
            });
        }

        let mut settlement = Settlement::new(
            input.group_id,
            caller,
            input.to_user_id,
            input.amount_cents,
        );
        if let Some(notes) = input.notes {
            settlement = settlement.with_notes(notes);
        }
        if let Some(status) = input.status {
            settlement = settlement.with_status(status);
        }

        self.repo.create_settlement(&settlement).await?;
        Ok(settlement)
    }

    /// Settlements of a group, most recent first. Members only.
    pub async fn get_group_settlements(
        &self,
        caller: UserId,
        group_id: GroupId,
    ) -> Result<Vec<Settlement>, AppError> {
        self.require_member(group_id, caller).await?;
        Ok(self.repo.get_group_settlements(group_id).await?)
    }

    /// Delete a settlement. Only the user who paid it may do this.
    pub async fn delete_settlement(
        &self,
        caller: UserId,
        id: SettlementId,
    ) -> Result<(), AppError> {
        let settlement = self
            .repo
            .get_settlement(id)
            .await?
            .ok_or(AppError::SettlementNotFound(id))?;
        if settlement.from_user_id != caller {
            return Err(AppError::NotThePayer);
        }
        self.repo.delete_settlement(id).await?;
        Ok(())
    }

    // ========================
    // Balance operations
    // ========================

    /// Balances for a group, or a single member's balance when `user_id` is
    /// given. Callers must belong to the group.
    pub async fn get_balances(
        &self,
        caller: UserId,
        group_id: GroupId,
        user_id: Option<UserId>,
    ) -> Result<Vec<UserBalance>, AppError> {
        self.require_member(group_id, caller).await?;
        let mut balances = self.compute_group_balances(group_id).await?;
        if let Some(user_id) = user_id {
            balances.retain(|b| b.user_id == user_id);
        }
        Ok(balances)
    }

    async fn compute_group_balances(
        &self,
        group_id: GroupId,
    ) -> Result<Vec<UserBalance>, AppError> {
        let members = self.repo.get_members(group_id).await?;
        let details = self.repo.get_group_expenses(group_id).await?;
        let settlements = self.repo.get_group_settlements(group_id).await?;

        let mut expenses = Vec::with_capacity(details.len());
        let mut participants = Vec::new();
        for detail in details {
            expenses.push(detail.expense);
            participants.extend(detail.participants);
        }

        Ok(compute_balances(
            &members,
            &expenses,
            &participants,
            &settlements,
        ))
    }

    // ========================
    // Classmate lookup
    // ========================

    /// Students in the caller's department and year, for inviting into a
    /// group. Best effort: lookup failures yield an empty list instead of an
    /// error, since this powers a non-critical picker.
    pub async fn get_classmates(&self, user_id: UserId) -> Vec<Classmate> {
        let student = match self.repo.get_student(user_id).await {
            Ok(Some(student)) => student,
            Ok(None) => return Vec::new(),
            Err(e) => {
                warn!("Failed to fetch student profile for {}: {}", user_id, e);
                return Vec::new();
            }
        };

        match self
            .repo
            .list_classmates(&student.department, student.year, user_id)
            .await
        {
            Ok(students) => students.into_iter().map(Classmate::from).collect(),
            Err(e) => {
                warn!("Failed to list classmates for {}: {}", user_id, e);
                Vec::new()
            }
        }
    }

    // ========================
    // Authorization helpers
    // ========================

    async fn require_member(
        &self,
        group_id: GroupId,
        user_id: UserId,
    ) -> Result<GroupMember, AppError> {
        match self.repo.find_member(group_id, user_id).await? {
            Some(member) => Ok(member),
            None => {
                if self.repo.get_group(group_id).await?.is_none() {
                    Err(AppError::GroupNotFound(group_id))
                } else {
                    Err(AppError::NotAMember)
                }
            }
        }
    }

    async fn require_admin(
        &self,
        group_id: GroupId,
        user_id: UserId,
    ) -> Result<GroupMember, AppError> {
        let member = self.require_member(group_id, user_id).await?;
        if !member.is_admin {
            return Err(AppError::NotAnAdmin);
        }
        Ok(member)
    }

    async fn require_share_users_are_members(
        &self,
        group_id: GroupId,
        shares: &[ShareSpec],
    ) -> Result<(), AppError> {
        let members = self.repo.get_members(group_id).await?;
        for share in shares {
            if !members.iter().any(|m| m.user_id == share.user_id) {
                return Err(AppError::ParticipantNotAMember(share.user_id));
            }
        }
        Ok(())
    }
}
