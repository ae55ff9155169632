use std::collections::HashSet;

use super::{Cents, SplitType, UserId};

/// One requested share of an expense. The meaning of `value` depends on the
/// split type: ignored for EQUAL, cents for EXACT, basis points for
/// PERCENTAGE (100 = 1%), a positive weight for SHARES.
#[derive(Debug, Clone)]
pub struct ShareSpec {
    pub user_id: UserId,
    pub value: Option<i64>,
}

impl ShareSpec {
    pub fn even(user_id: UserId) -> Self {
        Self {
            user_id,
            value: None,
        }
    }

    pub fn valued(user_id: UserId, value: i64) -> Self {
        Self {
            user_id,
            value: Some(value),
        }
    }
}

/// Basis points in a whole (100%).
const FULL_PERCENTAGE: i64 = 10_000;

/// Divide `total` among the given shares according to the split type.
///
/// The returned amounts always sum exactly to `total`: integer division
/// remainders are handed out one cent at a time to the earliest shares, so
/// the construction invariant `sum(amount_owed) == amount` holds for every
/// split type, including totals that do not divide evenly.
pub fn compute_shares(
    split_type: SplitType,
    total: Cents,
    shares: &[ShareSpec],
) -> Result<Vec<(UserId, Cents)>, SplitError> {
    if total <= 0 {
        return Err(SplitError::NonPositiveTotal(total));
    }
    if shares.is_empty() {
        return Err(SplitError::NoShares);
    }
    let mut seen = HashSet::new();
    for share in shares {
        if !seen.insert(share.user_id) {
            return Err(SplitError::DuplicateUser(share.user_id));
        }
    }

    match split_type {
        SplitType::Equal => divide_by_weights(total, shares, |_| Ok(1)),
        SplitType::Exact => {
            let mut owed = Vec::with_capacity(shares.len());
            let mut sum: Cents = 0;
            for share in shares {
                let amount = share.value.ok_or(SplitError::MissingValue(share.user_id))?;
                if amount < 0 {
                    return Err(SplitError::NegativeValue(share.user_id));
                }
                sum += amount;
                owed.push((share.user_id, amount));
            }
            if sum != total {
                return Err(SplitError::SumMismatch {
                    expected: total,
                    actual: sum,
                });
            }
            Ok(owed)
        }
        SplitType::Percentage => {
            let mut basis_points: i64 = 0;
            for share in shares {
                let bp = share.value.ok_or(SplitError::MissingValue(share.user_id))?;
                if bp < 0 {
                    return Err(SplitError::NegativeValue(share.user_id));
                }
                basis_points += bp;
            }
            if basis_points != FULL_PERCENTAGE {
                return Err(SplitError::PercentageTotal(basis_points));
            }
            divide_by_weights(total, shares, |share| {
                share.value.ok_or(SplitError::MissingValue(share.user_id))
            })
        }
        SplitType::Shares => {
            for share in shares {
                let weight = share.value.ok_or(SplitError::MissingValue(share.user_id))?;
                if weight <= 0 {
                    return Err(SplitError::NonPositiveWeight(share.user_id));
                }
            }
            divide_by_weights(total, shares, |share| {
                share.value.ok_or(SplitError::MissingValue(share.user_id))
            })
        }
    }
}

/// Floor-divide `total` proportionally to each share's weight, then hand the
/// leftover cents to the earliest shares, one each.
fn divide_by_weights<F>(
    total: Cents,
    shares: &[ShareSpec],
    weight_of: F,
) -> Result<Vec<(UserId, Cents)>, SplitError>
where
    F: Fn(&ShareSpec) -> Result<i64, SplitError>,
{
    let mut weights = Vec::with_capacity(shares.len());
    let mut weight_sum: i64 = 0;
    for share in shares {
        let weight = weight_of(share)?;
        weight_sum += weight;
        weights.push(weight);
    }

    let mut owed = Vec::with_capacity(shares.len());
    let mut distributed: Cents = 0;
    for (share, weight) in shares.iter().zip(&weights) {
        let amount = total * weight / weight_sum;
        distributed += amount;
        owed.push((share.user_id, amount));
    }

    let mut remainder = total - distributed;
    let mut i = 0;
    while remainder > 0 {
        owed[i].1 += 1;
        remainder -= 1;
        i += 1;
    }

    Ok(owed)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SplitError {
    NonPositiveTotal(Cents),
    NoShares,
    DuplicateUser(UserId),
    MissingValue(UserId),
    NegativeValue(UserId),
    NonPositiveWeight(UserId),
    SumMismatch { expected: Cents, actual: Cents },
    PercentageTotal(i64),
}

impl std::fmt::Display for SplitError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SplitError::NonPositiveTotal(total) => {
                write!(f, "expense amount must be positive, got {} cents", total)
            }
            SplitError::NoShares => write!(f, "at least one share is required"),
            SplitError::DuplicateUser(user) => {
                write!(f, "user {} appears in more than one share", user)
            }
            SplitError::MissingValue(user) => {
                write!(f, "share for user {} is missing a value", user)
            }
            SplitError::NegativeValue(user) => {
                write!(f, "share for user {} has a negative value", user)
            }
            SplitError::NonPositiveWeight(user) => {
                write!(f, "share weight for user {} must be positive", user)
            }
            SplitError::SumMismatch { expected, actual } => write!(
                f,
                "share amounts must sum to the expense amount ({} cents, got {})",
                expected, actual
            ),
            SplitError::PercentageTotal(basis_points) => write!(
                f,
                "share percentages must sum to 100% (got {} basis points)",
                basis_points
            ),
        }
    }
}

impl std::error::Error for SplitError {}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;

    fn users(n: usize) -> Vec<UserId> {
        (0..n).map(|_| Uuid::new_v4()).collect()
    }

    #[test]
    fn test_equal_split_even_total() {
        let ids = users(2);
        let shares: Vec<_> = ids.iter().map(|&u| ShareSpec::even(u)).collect();
        let owed = compute_shares(SplitType::Equal, 30000, &shares).unwrap();

        assert_eq!(owed, vec![(ids[0], 15000), (ids[1], 15000)]);
    }

    #[test]
    fn test_equal_split_remainder_goes_to_earliest() {
        let ids = users(3);
        let shares: Vec<_> = ids.iter().map(|&u| ShareSpec::even(u)).collect();
        let owed = compute_shares(SplitType::Equal, 100, &shares).unwrap();

        assert_eq!(owed[0].1, 34);
        assert_eq!(owed[1].1, 33);
        assert_eq!(owed[2].1, 33);
    }

    #[test]
    fn test_exact_split_requires_matching_sum() {
        let ids = users(2);
        let shares = vec![ShareSpec::valued(ids[0], 1000), ShareSpec::valued(ids[1], 900)];

        let err = compute_shares(SplitType::Exact, 2000, &shares).unwrap_err();
        assert_eq!(
            err,
            SplitError::SumMismatch {
                expected: 2000,
                actual: 1900
            }
        );

        let shares = vec![ShareSpec::valued(ids[0], 1000), ShareSpec::valued(ids[1], 1000)];
        let owed = compute_shares(SplitType::Exact, 2000, &shares).unwrap();
        assert_eq!(owed[1], (ids[1], 1000));
    }

    #[test]
    fn test_percentage_split() {
        let ids = users(2);
        // 25% / 75%
        let shares = vec![
            ShareSpec::valued(ids[0], 2500),
            ShareSpec::valued(ids[1], 7500),
        ];
        let owed = compute_shares(SplitType::Percentage, 10000, &shares).unwrap();

        assert_eq!(owed, vec![(ids[0], 2500), (ids[1], 7500)]);
    }

    #[test]
    fn test_percentage_must_total_one_hundred() {
        let ids = users(2);
        let shares = vec![
            ShareSpec::valued(ids[0], 2500),
            ShareSpec::valued(ids[1], 2500),
        ];

        let err = compute_shares(SplitType::Percentage, 10000, &shares).unwrap_err();
        assert_eq!(err, SplitError::PercentageTotal(5000));
    }

    #[test]
    fn test_shares_split_by_weight() {
        let ids = users(2);
        let shares = vec![ShareSpec::valued(ids[0], 2), ShareSpec::valued(ids[1], 1)];
        let owed = compute_shares(SplitType::Shares, 3000, &shares).unwrap();

        assert_eq!(owed, vec![(ids[0], 2000), (ids[1], 1000)]);
    }

    #[test]
    fn test_duplicate_user_rejected() {
        let user = Uuid::new_v4();
        let shares = vec![ShareSpec::even(user), ShareSpec::even(user)];

        let err = compute_shares(SplitType::Equal, 1000, &shares).unwrap_err();
        assert_eq!(err, SplitError::DuplicateUser(user));
    }

    #[test]
    fn test_all_split_types_sum_to_total() {
        let ids = users(3);
        let cases: Vec<(SplitType, Vec<ShareSpec>)> = vec![
            (
                SplitType::Equal,
                ids.iter().map(|&u| ShareSpec::even(u)).collect(),
            ),
            (
                SplitType::Exact,
                vec![
                    ShareSpec::valued(ids[0], 3333),
                    ShareSpec::valued(ids[1], 3333),
                    ShareSpec::valued(ids[2], 3335),
                ],
            ),
            (
                SplitType::Percentage,
                vec![
                    ShareSpec::valued(ids[0], 3333),
                    ShareSpec::valued(ids[1], 3333),
                    ShareSpec::valued(ids[2], 3334),
                ],
            ),
            (
                SplitType::Shares,
                vec![
                    ShareSpec::valued(ids[0], 1),
                    ShareSpec::valued(ids[1], 2),
                    ShareSpec::valued(ids[2], 4),
                ],
            ),
        ];

        for (split_type, shares) in cases {
            let owed = compute_shares(split_type, 10001, &shares).unwrap();
            let sum: Cents = owed.iter().map(|(_, c)| c).sum();
            assert_eq!(sum, 10001, "split {:?} must sum to the total", split_type);
        }
    }
}
