//! Per-tag balance breakdown.

use std::collections::BTreeMap;

use serde::Serialize;

use kft_core::{Money, UserId};

/// The total of one tag in one month, split by the user who entered each amount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagBalance {
    /// The tag.
    pub tag: String,

    /// Sum of every amount under the tag.
    pub total: Money,

    /// Sum per submitting user.
    pub per_user: BTreeMap<UserId, Money>,
}

impl TagBalance {
    /// An empty balance for `tag`.
    #[must_use]
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            total: Money::ZERO,
            per_user: BTreeMap::new(),
        }
    }

    /// Add `amount` entered by `user`.
    ///
    /// Returns `false`, leaving the balance unchanged, if the total or the user's
    /// share would overflow.
    #[must_use]
    pub fn add(&mut self, user: UserId, amount: Money) -> bool {
        let share = self.per_user.get(&user).copied().unwrap_or_default();
        match (self.total.checked_add(amount), share.checked_add(amount)) {
            (Some(total), Some(share)) => {
                self.total = total;
                self.per_user.insert(user, share);
                true
            }
            _ => false,
        }
    }

    /// The share of the total entered by `user`, in percent.
    ///
    /// `None` when the total is zero, since no meaningful ratio exists. The ratio is
    /// signed, so outflows against an outflow total come out positive.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn share_percent(&self, user: UserId) -> Option<f64> {
        if self.total == Money::ZERO {
            return None;
        }
        let amount = self.per_user.get(&user).copied().unwrap_or_default();
        Some(amount.cents() as f64 * 100.0 / self.total.cents() as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accumulates_per_user() {
        let mut balance = TagBalance::new("food");
        assert!(balance.add(UserId::new(1), Money::from_cents(-500)));
        assert!(balance.add(UserId::new(2), Money::from_cents(-300)));
        assert!(balance.add(UserId::new(1), Money::from_cents(-200)));

        assert_eq!(balance.total, Money::from_cents(-1000));
        assert_eq!(balance.per_user[&UserId::new(1)], Money::from_cents(-700));
        assert_eq!(balance.share_percent(UserId::new(1)), Some(70.0));
        assert_eq!(balance.share_percent(UserId::new(2)), Some(30.0));
        assert_eq!(balance.share_percent(UserId::new(3)), Some(0.0));
    }

    #[test]
    fn zero_total_has_no_shares() {
        let mut balance = TagBalance::new("swap");
        assert!(balance.add(UserId::new(1), Money::from_cents(500)));
        assert!(balance.add(UserId::new(2), Money::from_cents(-500)));
        assert_eq!(balance.total, Money::ZERO);
        assert_eq!(balance.share_percent(UserId::new(1)), None);
        assert_eq!(TagBalance::new("empty").share_percent(UserId::new(1)), None);
    }

    #[test]
    fn overflow_leaves_balance_unchanged() {
        let mut balance = TagBalance::new("house");
        assert!(balance.add(UserId::new(1), Money::from_cents(i64::MAX)));
        assert!(!balance.add(UserId::new(2), Money::from_cents(1)));
        assert_eq!(balance.total, Money::from_cents(i64::MAX));
        assert_eq!(balance.per_user.len(), 1);
    }
}
