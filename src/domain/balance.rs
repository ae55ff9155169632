use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::{Cents, Expense, ExpenseId, ExpenseParticipant, GroupMember, Settlement, UserId};

/// A user's aggregate position within a group, derived at query time.
/// Positive `you_are_owed` means others owe this user; positive `you_owe` is
/// the user's outstanding debt; `net_balance = you_are_owed - you_owe`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserBalance {
    pub user_id: UserId,
    pub full_name: String,
    pub net_balance: Cents,
    pub you_owe: Cents,
    pub you_are_owed: Cents,
}

/// Derive every member's balance from a snapshot of the group ledger.
///
/// Each unsettled participant row is a pairwise debt from the participant to
/// the expense payer; the payer's own share cancels and is skipped. Completed
/// settlements reduce the payer's debt to the recipient (pending and
/// cancelled ones change nothing). Positions between each pair of users are
/// netted, then summed per member across all counterparties.
pub fn compute_balances(
    members: &[GroupMember],
    expenses: &[Expense],
    participants: &[ExpenseParticipant],
    settlements: &[Settlement],
) -> Vec<UserBalance> {
    let payer_of: HashMap<ExpenseId, UserId> =
        expenses.iter().map(|e| (e.id, e.paid_by)).collect();

    // Net pairwise positions, keyed by (low, high) user id; a positive value
    // means `low` owes `high`.
    let mut pairs: HashMap<(UserId, UserId), Cents> = HashMap::new();
    let mut add_debt = |debtor: UserId, creditor: UserId, amount: Cents| {
        if debtor < creditor {
            *pairs.entry((debtor, creditor)).or_insert(0) += amount;
        } else {
            *pairs.entry((creditor, debtor)).or_insert(0) -= amount;
        }
    };

    for participant in participants {
        if participant.is_settled {
            continue;
        }
        let Some(&payer) = payer_of.get(&participant.expense_id) else {
            continue;
        };
        if participant.user_id == payer {
            continue;
        }
        add_debt(participant.user_id, payer, participant.amount_owed_cents);
    }

    for settlement in settlements {
        if !settlement.is_completed() {
            continue;
        }
        // A repayment from A to B is a debt in the opposite direction.
        add_debt(
            settlement.to_user_id,
            settlement.from_user_id,
            settlement.amount_cents,
        );
    }

    let mut owes: HashMap<UserId, Cents> = HashMap::new();
    let mut owed: HashMap<UserId, Cents> = HashMap::new();
    for (&(low, high), &net) in &pairs {
        match net.cmp(&0) {
            std::cmp::Ordering::Greater => {
                *owes.entry(low).or_insert(0) += net;
                *owed.entry(high).or_insert(0) += net;
            }
            std::cmp::Ordering::Less => {
                *owes.entry(high).or_insert(0) += -net;
                *owed.entry(low).or_insert(0) += -net;
            }
            std::cmp::Ordering::Equal => {}
        }
    }

    members
        .iter()
        .map(|member| {
            let you_owe = owes.get(&member.user_id).copied().unwrap_or(0);
            let you_are_owed = owed.get(&member.user_id).copied().unwrap_or(0);
            UserBalance {
                user_id: member.user_id,
                full_name: member.user_name.clone(),
                net_balance: you_are_owed - you_owe,
                you_owe,
                you_are_owed,
            }
        })
        .collect()
}
