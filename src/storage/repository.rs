use std::collections::HashMap;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use crate::domain::{
    Expense, ExpenseDetail, ExpenseId, ExpenseParticipant, Group, GroupId, GroupMember,
    Settlement, SettlementId, SettlementStatus, SplitType, Student, UserId,
};

use super::MIGRATION_001_INITIAL;

/// Repository for persisting and querying the expense-sharing ledger:
/// students, groups, members, expenses, participants, and settlements.
#[derive(Clone)]
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    /// Create a new repository with the given SQLite connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect to a SQLite database at the given path.
    /// Creates the database file if it doesn't exist.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = SqlitePool::connect(database_url)
            .await
            .context("Failed to connect to database")?;
        Ok(Self::new(pool))
    }

    /// Run database migrations.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::query(MIGRATION_001_INITIAL)
            .execute(&self.pool)
            .await
            .context("Failed to run migration 001")?;
        Ok(())
    }

    /// Initialize a new database (connect + migrate).
    pub async fn init(database_url: &str) -> Result<Self> {
        let repo = Self::connect(database_url).await?;
        repo.migrate().await?;
        Ok(repo)
    }

    // ========================
    // Student operations
    // ========================

    /// Save a student profile, replacing any previous row with the same id.
    pub async fn save_student(&self, student: &Student) -> Result<()> {
        sqlx::query(
            r#"
            INSERT OR REPLACE INTO students (id, full_name, email, department, year, avatar_url, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(student.id.to_string())
        .bind(&student.full_name)
        .bind(&student.email)
        .bind(&student.department)
        .bind(student.year)
        .bind(&student.avatar_url)
        .bind(student.created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .context("Failed to save student")?;
        Ok(())
    }

    /// Get a student by id.
    pub async fn get_student(&self, id: UserId) -> Result<Option<Student>> {
        let row = sqlx::query(
            "SELECT id, full_name, email, department, year, avatar_url, created_at FROM students WHERE id = ?",
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch student")?;

        row.as_ref().map(Self::row_to_student).transpose()
    }

    /// Get a student by email.
    pub async fn get_student_by_email(&self, email: &str) -> Result<Option<Student>> {
        let row = sqlx::query(
            "SELECT id, full_name, email, department, year, avatar_url, created_at FROM students WHERE email = ?",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch student by email")?;

        row.as_ref().map(Self::row_to_student).transpose()
    }

    /// List students sharing a department and year, excluding one user.
    pub async fn list_classmates(
        &self,
        department: &str,
        year: i32,
        excluding: UserId,
    ) -> Result<Vec<Student>> {
        let rows = sqlx::query(
            r#"
            SELECT id, full_name, email, department, year, avatar_url, created_at
            FROM students
            WHERE department = ? AND year = ? AND id != ?
            ORDER BY full_name
            "#,
        )
        .bind(department)
        .bind(year)
        .bind(excluding.to_string())
        .fetch_all(&self.pool)
        .await
        .context("Failed to list classmates")?;

        rows.iter().map(Self::row_to_student).collect()
    }

    // ========================
    // Group operations
    // ========================

    /// Create a group and its creator's admin membership in one transaction.
    pub async fn create_group(&self, group: &Group, creator: &GroupMember) -> Result<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .context("Failed to begin transaction")?;

        let target_years_json = serde_json::to_string(&group.target_years)?;
        sqlx::query(
            r#"
            INSERT INTO expense_groups (id, name, description, created_by, is_public, department, target_years, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(group.id.to_string())
        .bind(&group.name)
        .bind(&group.description)
        .bind(group.created_by.to_string())
        .bind(group.is_public)
        .bind(&group.department)
        .bind(&target_years_json)
        .bind(group.created_at.to_rfc3339())
        .bind(group.updated_at.to_rfc3339())
        .execute(&mut *tx)
        .await
        .context("Failed to save group")?;

        Self::insert_member(&mut tx, creator).await?;

        tx.commit().await.context("Failed to commit group creation")?;
        Ok(())
    }

    /// Get a group by id.
    pub async fn get_group(&self, id: GroupId) -> Result<Option<Group>> {
        let row = sqlx::query(
            r#"
            SELECT id, name, description, created_by, is_public, department, target_years, created_at, updated_at
            FROM expense_groups
            WHERE id = ?
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch group")?;

        row.as_ref().map(Self::row_to_group).transpose()
    }

    /// List the groups a user belongs to, newest first.
    pub async fn get_groups(&self, user_id: UserId) -> Result<Vec<Group>> {
        let rows = sqlx::query(
            r#"
            SELECT g.id, g.name, g.description, g.created_by, g.is_public, g.department, g.target_years, g.created_at, g.updated_at
            FROM expense_groups g
            JOIN expense_group_members m ON m.group_id = g.id
            WHERE m.user_id = ?
            ORDER BY g.created_at DESC
            "#,
        )
        .bind(user_id.to_string())
        .fetch_all(&self.pool)
        .await
        .context("Failed to list groups")?;

        rows.iter().map(Self::row_to_group).collect()
    }

    /// Persist updated group fields.
    pub async fn update_group(&self, group: &Group) -> Result<()> {
        let target_years_json = serde_json::to_string(&group.target_years)?;
        sqlx::query(
            r#"
            UPDATE expense_groups
            SET name = ?, description = ?, is_public = ?, department = ?, target_years = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&group.name)
        .bind(&group.description)
        .bind(group.is_public)
        .bind(&group.department)
        .bind(&target_years_json)
        .bind(Utc::now().to_rfc3339())
        .bind(group.id.to_string())
        .execute(&self.pool)
        .await
        .context("Failed to update group")?;
        Ok(())
    }

    /// Delete a group and everything hanging off it: settlements,
    /// participants of its expenses, expenses, and memberships.
    pub async fn delete_group(&self, id: GroupId) -> Result<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .context("Failed to begin transaction")?;
        let group_id = id.to_string();

        sqlx::query("DELETE FROM expense_settlements WHERE group_id = ?")
            .bind(&group_id)
            .execute(&mut *tx)
            .await
            .context("Failed to delete group settlements")?;
        sqlx::query(
            "DELETE FROM expense_participants WHERE expense_id IN (SELECT id FROM expenses WHERE group_id = ?)",
        )
        .bind(&group_id)
        .execute(&mut *tx)
        .await
        .context("Failed to delete group expense participants")?;
        sqlx::query("DELETE FROM expenses WHERE group_id = ?")
            .bind(&group_id)
            .execute(&mut *tx)
            .await
            .context("Failed to delete group expenses")?;
        sqlx::query("DELETE FROM expense_group_members WHERE group_id = ?")
            .bind(&group_id)
            .execute(&mut *tx)
            .await
            .context("Failed to delete group members")?;
        sqlx::query("DELETE FROM expense_groups WHERE id = ?")
            .bind(&group_id)
            .execute(&mut *tx)
            .await
            .context("Failed to delete group")?;

        tx.commit().await.context("Failed to commit group deletion")?;
        Ok(())
    }

    // ========================
    // Member operations
    // ========================

    /// List the members of a group.
    pub async fn get_members(&self, group_id: GroupId) -> Result<Vec<GroupMember>> {
        let rows = sqlx::query(
            r#"
            SELECT id, group_id, user_id, user_email, user_name, is_admin, created_at
            FROM expense_group_members
            WHERE group_id = ?
            ORDER BY created_at
            "#,
        )
        .bind(group_id.to_string())
        .fetch_all(&self.pool)
        .await
        .context("Failed to list group members")?;

        rows.iter().map(Self::row_to_member).collect()
    }

    /// Membership probe: the member row for (group, user), if any.
    pub async fn find_member(
        &self,
        group_id: GroupId,
        user_id: UserId,
    ) -> Result<Option<GroupMember>> {
        let row = sqlx::query(
            r#"
            SELECT id, group_id, user_id, user_email, user_name, is_admin, created_at
            FROM expense_group_members
            WHERE group_id = ? AND user_id = ?
            "#,
        )
        .bind(group_id.to_string())
        .bind(user_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch group member")?;

        row.as_ref().map(Self::row_to_member).transpose()
    }

    /// Add a member to a group.
    pub async fn add_member(&self, member: &GroupMember) -> Result<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .context("Failed to begin transaction")?;
        Self::insert_member(&mut tx, member).await?;
        tx.commit().await.context("Failed to commit member insert")?;
        Ok(())
    }

    async fn insert_member(
        tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
        member: &GroupMember,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO expense_group_members (id, group_id, user_id, user_email, user_name, is_admin, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(member.id.to_string())
        .bind(member.group_id.to_string())
        .bind(member.user_id.to_string())
        .bind(&member.user_email)
        .bind(&member.user_name)
        .bind(member.is_admin)
        .bind(member.created_at.to_rfc3339())
        .execute(&mut **tx)
        .await
        .context("Failed to save group member")?;
        Ok(())
    }

    /// Remove a member from a group.
    pub async fn remove_member(&self, group_id: GroupId, user_id: UserId) -> Result<()> {
        sqlx::query("DELETE FROM expense_group_members WHERE group_id = ? AND user_id = ?")
            .bind(group_id.to_string())
            .bind(user_id.to_string())
            .execute(&self.pool)
            .await
            .context("Failed to remove group member")?;
        Ok(())
    }

    /// Flip a member's admin flag.
    pub async fn set_member_admin(
        &self,
        group_id: GroupId,
        user_id: UserId,
        is_admin: bool,
    ) -> Result<()> {
        sqlx::query(
            "UPDATE expense_group_members SET is_admin = ? WHERE group_id = ? AND user_id = ?",
        )
        .bind(is_admin)
        .bind(group_id.to_string())
        .bind(user_id.to_string())
        .execute(&self.pool)
        .await
        .context("Failed to update group member")?;
        Ok(())
    }

    /// Count the admins of a group.
    pub async fn count_admins(&self, group_id: GroupId) -> Result<i64> {
        let row = sqlx::query(
            "SELECT COUNT(*) as count FROM expense_group_members WHERE group_id = ? AND is_admin = 1",
        )
        .bind(group_id.to_string())
        .fetch_one(&self.pool)
        .await
        .context("Failed to count group admins")?;

        Ok(row.get("count"))
    }

    // ========================
    // Expense operations
    // ========================

    /// Insert an expense and its participant rows in one transaction.
    pub async fn create_expense(
        &self,
        expense: &Expense,
        participants: &[ExpenseParticipant],
    ) -> Result<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .context("Failed to begin transaction")?;

        Self::insert_expense(&mut tx, expense).await?;
        for participant in participants {
            Self::insert_participant(&mut tx, participant).await?;
        }

        tx.commit()
            .await
            .context("Failed to commit expense creation")?;
        Ok(())
    }

    async fn insert_expense(
        tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
        expense: &Expense,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO expenses (id, description, amount_cents, paid_by, group_id, split_type, category, notes, payment_date, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(expense.id.to_string())
        .bind(&expense.description)
        .bind(expense.amount_cents)
        .bind(expense.paid_by.to_string())
        .bind(expense.group_id.map(|id| id.to_string()))
        .bind(expense.split_type.as_str())
        .bind(&expense.category)
        .bind(&expense.notes)
        .bind(expense.payment_date.to_rfc3339())
        .bind(expense.created_at.to_rfc3339())
        .bind(expense.updated_at.to_rfc3339())
        .execute(&mut **tx)
        .await
        .context("Failed to save expense")?;
        Ok(())
    }

    async fn insert_participant(
        tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
        participant: &ExpenseParticipant,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO expense_participants (id, expense_id, user_id, amount_owed_cents, is_settled, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(participant.id.to_string())
        .bind(participant.expense_id.to_string())
        .bind(participant.user_id.to_string())
        .bind(participant.amount_owed_cents)
        .bind(participant.is_settled)
        .bind(participant.created_at.to_rfc3339())
        .execute(&mut **tx)
        .await
        .context("Failed to save expense participant")?;
        Ok(())
    }

    /// Insert a single participant row.
    pub async fn add_participant(&self, participant: &ExpenseParticipant) -> Result<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .context("Failed to begin transaction")?;
        Self::insert_participant(&mut tx, participant).await?;
        tx.commit()
            .await
            .context("Failed to commit participant insert")?;
        Ok(())
    }

    /// Get an expense with its participants.
    pub async fn get_expense(&self, id: ExpenseId) -> Result<Option<ExpenseDetail>> {
        let row = sqlx::query(
            r#"
            SELECT id, description, amount_cents, paid_by, group_id, split_type, category, notes, payment_date, created_at, updated_at
            FROM expenses
            WHERE id = ?
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch expense")?;

        let Some(row) = row else { return Ok(None) };
        let expense = Self::row_to_expense(&row)?;
        let participants = self.get_participants(expense.id).await?;
        Ok(Some(ExpenseDetail {
            expense,
            participants,
        }))
    }

    /// Participants of a single expense.
    pub async fn get_participants(&self, expense_id: ExpenseId) -> Result<Vec<ExpenseParticipant>> {
        let rows = sqlx::query(
            r#"
            SELECT id, expense_id, user_id, amount_owed_cents, is_settled, created_at
            FROM expense_participants
            WHERE expense_id = ?
            ORDER BY created_at
            "#,
        )
        .bind(expense_id.to_string())
        .fetch_all(&self.pool)
        .await
        .context("Failed to fetch expense participants")?;

        rows.iter().map(Self::row_to_participant).collect()
    }

    /// All expenses of a group with their participants, newest payment first.
    pub async fn get_group_expenses(&self, group_id: GroupId) -> Result<Vec<ExpenseDetail>> {
        let rows = sqlx::query(
            r#"
            SELECT id, description, amount_cents, paid_by, group_id, split_type, category, notes, payment_date, created_at, updated_at
            FROM expenses
            WHERE group_id = ?
            ORDER BY payment_date DESC
            "#,
        )
        .bind(group_id.to_string())
        .fetch_all(&self.pool)
        .await
        .context("Failed to list group expenses")?;

        let expenses: Vec<Expense> =
            rows.iter().map(Self::row_to_expense).collect::<Result<_>>()?;

        let mut by_expense: HashMap<ExpenseId, Vec<ExpenseParticipant>> = HashMap::new();
        for participant in self.get_group_participants(group_id).await? {
            by_expense
                .entry(participant.expense_id)
                .or_default()
                .push(participant);
        }

        Ok(Self::zip_participants(expenses, by_expense))
    }

    /// All expenses where the user is payer or participant, newest first.
    pub async fn get_expenses(&self, user_id: UserId) -> Result<Vec<ExpenseDetail>> {
        let rows = sqlx::query(
            r#"
            SELECT DISTINCT e.id, e.description, e.amount_cents, e.paid_by, e.group_id, e.split_type, e.category, e.notes, e.payment_date, e.created_at, e.updated_at
            FROM expenses e
            LEFT JOIN expense_participants p ON p.expense_id = e.id
            WHERE e.paid_by = ? OR p.user_id = ?
            ORDER BY e.created_at DESC
            "#,
        )
        .bind(user_id.to_string())
        .bind(user_id.to_string())
        .fetch_all(&self.pool)
        .await
        .context("Failed to list user expenses")?;

        let expenses: Vec<Expense> =
            rows.iter().map(Self::row_to_expense).collect::<Result<_>>()?;

        let mut by_expense: HashMap<ExpenseId, Vec<ExpenseParticipant>> = HashMap::new();
        for expense in &expenses {
            by_expense.insert(expense.id, self.get_participants(expense.id).await?);
        }

        Ok(Self::zip_participants(expenses, by_expense))
    }

    fn zip_participants(
        expenses: Vec<Expense>,
        mut by_expense: HashMap<ExpenseId, Vec<ExpenseParticipant>>,
    ) -> Vec<ExpenseDetail> {
        expenses
            .into_iter()
            .map(|expense| {
                let participants = by_expense.remove(&expense.id).unwrap_or_default();
                ExpenseDetail {
                    expense,
                    participants,
                }
            })
            .collect()
    }

    /// Participant rows across all expenses of a group.
    pub async fn get_group_participants(
        &self,
        group_id: GroupId,
    ) -> Result<Vec<ExpenseParticipant>> {
        let rows = sqlx::query(
            r#"
            SELECT p.id, p.expense_id, p.user_id, p.amount_owed_cents, p.is_settled, p.created_at
            FROM expense_participants p
            JOIN expenses e ON e.id = p.expense_id
            WHERE e.group_id = ?
            ORDER BY p.created_at
            "#,
        )
        .bind(group_id.to_string())
        .fetch_all(&self.pool)
        .await
        .context("Failed to list group participants")?;

        rows.iter().map(Self::row_to_participant).collect()
    }

    /// Update an expense; when `participants` is given the previous share
    /// rows are replaced in the same transaction.
    pub async fn update_expense(
        &self,
        expense: &Expense,
        participants: Option<&[ExpenseParticipant]>,
    ) -> Result<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .context("Failed to begin transaction")?;

        sqlx::query(
            r#"
            UPDATE expenses
            SET description = ?, amount_cents = ?, split_type = ?, category = ?, notes = ?, payment_date = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&expense.description)
        .bind(expense.amount_cents)
        .bind(expense.split_type.as_str())
        .bind(&expense.category)
        .bind(&expense.notes)
        .bind(expense.payment_date.to_rfc3339())
        .bind(Utc::now().to_rfc3339())
        .bind(expense.id.to_string())
        .execute(&mut *tx)
        .await
        .context("Failed to update expense")?;

        if let Some(participants) = participants {
            sqlx::query("DELETE FROM expense_participants WHERE expense_id = ?")
                .bind(expense.id.to_string())
                .execute(&mut *tx)
                .await
                .context("Failed to clear expense participants")?;
            for participant in participants {
                Self::insert_participant(&mut tx, participant).await?;
            }
        }

        tx.commit()
            .await
            .context("Failed to commit expense update")?;
        Ok(())
    }

    /// Delete an expense and its participant rows.
    pub async fn delete_expense(&self, id: ExpenseId) -> Result<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .context("Failed to begin transaction")?;

        sqlx::query("DELETE FROM expense_participants WHERE expense_id = ?")
            .bind(id.to_string())
            .execute(&mut *tx)
            .await
            .context("Failed to delete expense participants")?;
        sqlx::query("DELETE FROM expenses WHERE id = ?")
            .bind(id.to_string())
            .execute(&mut *tx)
            .await
            .context("Failed to delete expense")?;

        tx.commit()
            .await
            .context("Failed to commit expense deletion")?;
        Ok(())
    }

    // ========================
    // Settlement operations
    // ========================

    /// Insert a settlement row. Outstanding-balance validation is the
    /// caller's responsibility.
    pub async fn create_settlement(&self, settlement: &Settlement) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO expense_settlements (id, group_id, from_user_id, to_user_id, amount_cents, status, notes, settled_at, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(settlement.id.to_string())
        .bind(settlement.group_id.to_string())
        .bind(settlement.from_user_id.to_string())
        .bind(settlement.to_user_id.to_string())
        .bind(settlement.amount_cents)
        .bind(settlement.status.as_str())
        .bind(&settlement.notes)
        .bind(settlement.settled_at.map(|dt| dt.to_rfc3339()))
        .bind(settlement.created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .context("Failed to save settlement")?;
        Ok(())
    }

    /// Get a settlement by id.
    pub async fn get_settlement(&self, id: SettlementId) -> Result<Option<Settlement>> {
        let row = sqlx::query(
            r#"
            SELECT id, group_id, from_user_id, to_user_id, amount_cents, status, notes, settled_at, created_at
            FROM expense_settlements
            WHERE id = ?
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch settlement")?;

        row.as_ref().map(Self::row_to_settlement).transpose()
    }

    /// Settlements of a group, most recent first.
    pub async fn get_group_settlements(&self, group_id: GroupId) -> Result<Vec<Settlement>> {
        let rows = sqlx::query(
            r#"
            SELECT id, group_id, from_user_id, to_user_id, amount_cents, status, notes, settled_at, created_at
            FROM expense_settlements
            WHERE group_id = ?
            ORDER BY created_at DESC
            "#,
        )
        .bind(group_id.to_string())
        .fetch_all(&self.pool)
        .await
        .context("Failed to list group settlements")?;

        rows.iter().map(Self::row_to_settlement).collect()
    }

    /// Delete a settlement.
    pub async fn delete_settlement(&self, id: SettlementId) -> Result<()> {
        sqlx::query("DELETE FROM expense_settlements WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .context("Failed to delete settlement")?;
        Ok(())
    }

    // ========================
    // Row mappers
    // ========================

    fn row_to_student(row: &sqlx::sqlite::SqliteRow) -> Result<Student> {
        let id_str: String = row.get("id");
        let created_at_str: String = row.get("created_at");

        Ok(Student {
            id: Uuid::parse_str(&id_str).context("Invalid student ID")?,
            full_name: row.get("full_name"),
            email: row.get("email"),
            department: row.get("department"),
            year: row.get("year"),
            avatar_url: row.get("avatar_url"),
            created_at: Self::parse_timestamp(&created_at_str)?,
        })
    }

    fn row_to_group(row: &sqlx::sqlite::SqliteRow) -> Result<Group> {
        let id_str: String = row.get("id");
        let created_by_str: String = row.get("created_by");
        let target_years_json: String = row.get("target_years");
        let created_at_str: String = row.get("created_at");
        let updated_at_str: String = row.get("updated_at");

        Ok(Group {
            id: Uuid::parse_str(&id_str).context("Invalid group ID")?,
            name: row.get("name"),
            description: row.get("description"),
            created_by: Uuid::parse_str(&created_by_str).context("Invalid creator ID")?,
            is_public: row.get::<i32, _>("is_public") != 0,
            department: row.get("department"),
            target_years: serde_json::from_str(&target_years_json).unwrap_or_default(),
            created_at: Self::parse_timestamp(&created_at_str)?,
            updated_at: Self::parse_timestamp(&updated_at_str)?,
        })
    }

    fn row_to_member(row: &sqlx::sqlite::SqliteRow) -> Result<GroupMember> {
        let id_str: String = row.get("id");
        let group_id_str: String = row.get("group_id");
        let user_id_str: String = row.get("user_id");
        let created_at_str: String = row.get("created_at");

        Ok(GroupMember {
            id: Uuid::parse_str(&id_str).context("Invalid member ID")?,
            group_id: Uuid::parse_str(&group_id_str).context("Invalid group ID")?,
            user_id: Uuid::parse_str(&user_id_str).context("Invalid user ID")?,
            user_email: row.get("user_email"),
            user_name: row.get("user_name"),
            is_admin: row.get::<i32, _>("is_admin") != 0,
            created_at: Self::parse_timestamp(&created_at_str)?,
        })
    }

    fn row_to_expense(row: &sqlx::sqlite::SqliteRow) -> Result<Expense> {
        let id_str: String = row.get("id");
        let paid_by_str: String = row.get("paid_by");
        let group_id_str: Option<String> = row.get("group_id");
        let split_type_str: String = row.get("split_type");
        let payment_date_str: String = row.get("payment_date");
        let created_at_str: String = row.get("created_at");
        let updated_at_str: String = row.get("updated_at");

        Ok(Expense {
            id: Uuid::parse_str(&id_str).context("Invalid expense ID")?,
            description: row.get("description"),
            amount_cents: row.get("amount_cents"),
            paid_by: Uuid::parse_str(&paid_by_str).context("Invalid payer ID")?,
            group_id: group_id_str
                .map(|s| Uuid::parse_str(&s))
                .transpose()
                .context("Invalid group ID")?,
            split_type: SplitType::from_str(&split_type_str)
                .ok_or_else(|| anyhow::anyhow!("Invalid split type: {}", split_type_str))?,
            category: row.get("category"),
            notes: row.get("notes"),
            payment_date: Self::parse_timestamp(&payment_date_str)?,
            created_at: Self::parse_timestamp(&created_at_str)?,
            updated_at: Self::parse_timestamp(&updated_at_str)?,
        })
    }

    fn row_to_participant(row: &sqlx::sqlite::SqliteRow) -> Result<ExpenseParticipant> {
        let id_str: String = row.get("id");
        let expense_id_str: String = row.get("expense_id");
        let user_id_str: String = row.get("user_id");
        let created_at_str: String = row.get("created_at");

        Ok(ExpenseParticipant {
            id: Uuid::parse_str(&id_str).context("Invalid participant ID")?,
            expense_id: Uuid::parse_str(&expense_id_str).context("Invalid expense ID")?,
            user_id: Uuid::parse_str(&user_id_str).context("Invalid user ID")?,
            amount_owed_cents: row.get("amount_owed_cents"),
            is_settled: row.get::<i32, _>("is_settled") != 0,
            created_at: Self::parse_timestamp(&created_at_str)?,
        })
    }

    fn row_to_settlement(row: &sqlx::sqlite::SqliteRow) -> Result<Settlement> {
        let id_str: String = row.get("id");
        let group_id_str: String = row.get("group_id");
        let from_user_str: String = row.get("from_user_id");
        let to_user_str: String = row.get("to_user_id");
        let status_str: String = row.get("status");
        let settled_at_str: Option<String> = row.get("settled_at");
        let created_at_str: String = row.get("created_at");

        Ok(Settlement {
            id: Uuid::parse_str(&id_str).context("Invalid settlement ID")?,
            group_id: Uuid::parse_str(&group_id_str).context("Invalid group ID")?,
            from_user_id: Uuid::parse_str(&from_user_str).context("Invalid payer ID")?,
            to_user_id: Uuid::parse_str(&to_user_str).context("Invalid recipient ID")?,
            amount_cents: row.get("amount_cents"),
            status: SettlementStatus::from_str(&status_str)
                .ok_or_else(|| anyhow::anyhow!("Invalid settlement status: {}", status_str))?,
            notes: row.get("notes"),
            settled_at: settled_at_str
                .map(|s| Self::parse_timestamp(&s))
                .transpose()?,
            created_at: Self::parse_timestamp(&created_at_str)?,
        })
    }

    fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
        Ok(DateTime::parse_from_rfc3339(value)
            .context("Invalid timestamp")?
            .with_timezone(&Utc))
    }
}
