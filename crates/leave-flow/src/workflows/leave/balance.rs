use serde::{Deserialize, Serialize};

use super::domain::{LeaveType, UserId};

/// Yearly allowance a fresh balance record starts from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaveAllowance {
    pub casual: u32,
    pub sick: u32,
    pub earned: u32,
}

impl Default for LeaveAllowance {
    fn default() -> Self {
        Self {
            casual: 12,
            sick: 12,
            earned: 15,
        }
    }
}

/// Composite key; one balance per user per year.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BalanceKey {
    pub user: UserId,
    pub year: i32,
}

impl BalanceKey {
    pub fn new(user: UserId, year: i32) -> Self {
        Self { user, year }
    }
}

/// Remaining days per leave type for one (user, year).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaveBalance {
    pub user: UserId,
    pub year: i32,
    pub casual: u32,
    pub sick: u32,
    pub earned: u32,
}

impl LeaveBalance {
    pub fn opening(key: BalanceKey, allowance: &LeaveAllowance) -> Self {
        Self {
            user: key.user,
            year: key.year,
            casual: allowance.casual,
            sick: allowance.sick,
            earned: allowance.earned,
        }
    }

    pub fn available(&self, leave_type: LeaveType) -> u32 {
        match leave_type {
            LeaveType::Casual => self.casual,
            LeaveType::Sick => self.sick,
            LeaveType::Earned => self.earned,
        }
    }

    pub fn total_available(&self) -> u32 {
        self.casual
            .saturating_add(self.sick)
            .saturating_add(self.earned)
    }

    /// Subtract `days`, flooring the counter at zero.
    pub fn debit(&mut self, leave_type: LeaveType, days: u32) {
        let counter = match leave_type {
            LeaveType::Casual => &mut self.casual,
            LeaveType::Sick => &mut self.sick,
            LeaveType::Earned => &mut self.earned,
        };
        *counter = counter.saturating_sub(days);
    }
}

/// Deduction applied together with an approval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceDebit {
    pub key: BalanceKey,
    pub leave_type: LeaveType,
    pub days: u32,
}
