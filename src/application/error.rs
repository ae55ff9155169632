use thiserror::Error;

use crate::domain::{Cents, ExpenseId, GroupId, SettlementId, SplitError, UserId};

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Group not found: {0}")]
    GroupNotFound(GroupId),

    #[error("Expense not found: {0}")]
    ExpenseNotFound(ExpenseId),

    #[error("Settlement not found: {0}")]
    SettlementNotFound(SettlementId),

    #[error("No student registered with email {0}")]
    StudentNotFound(String),

    #[error("Not a member of this group")]
    NotAMember,

    #[error("Not an admin of this group")]
    NotAnAdmin,

    #[error("Only the group creator can delete the group")]
    NotTheCreator,

    #[error("Only the payer can modify this record")]
    NotThePayer,

    #[error("Recipient is not a member of this group")]
    RecipientNotAMember,

    #[error("Participant {0} is not a member of this group")]
    ParticipantNotAMember(UserId),

    #[error("User is already a member of this group")]
    AlreadyMember,

    #[error("Cannot remove the last admin of the group")]
    LastAdmin,

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Invalid shares: {0}")]
    InvalidShares(#[from] SplitError),

    #[error("Settlement exceeds outstanding balance: owed {owed} cents, requested {requested}")]
    SettlementExceedsDebt { owed: Cents, requested: Cents },

    #[error("Database error: {0}")]
    Database(#[from] anyhow::Error),
}
