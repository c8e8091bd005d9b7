use std::cmp::Reverse;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};

use super::application::{LeaveApplication, NewLeaveApplication, ReviewTransition, TransitionError};
use super::balance::{BalanceKey, LeaveAllowance, LeaveBalance};
use super::domain::{LeaveId, LeaveType, UserId};
use super::repository::{
    LeaveApplicationRepository, LeaveBalanceStore, LeaveQuery, PurgeReport, RepositoryError,
};

#[derive(Debug, Default)]
struct LeaveTables {
    last_id: u64,
    applications: BTreeMap<LeaveId, LeaveApplication>,
    balances: HashMap<BalanceKey, LeaveBalance>,
}

/// Process-local store. One mutex guards both tables, which makes every conditional
/// update and the review commit atomic.
#[derive(Debug, Clone, Default)]
pub struct InMemoryLeaveStore {
    allowance: LeaveAllowance,
    tables: Arc<Mutex<LeaveTables>>,
}

impl InMemoryLeaveStore {
    pub fn new(allowance: LeaveAllowance) -> Self {
        Self {
            allowance,
            tables: Arc::default(),
        }
    }

    pub fn application_count(&self) -> usize {
        self.tables()
            .map(|tables| tables.applications.len())
            .unwrap_or_default()
    }

    pub fn balance_count(&self) -> usize {
        self.tables()
            .map(|tables| tables.balances.len())
            .unwrap_or_default()
    }

    fn tables(&self) -> Result<MutexGuard<'_, LeaveTables>, RepositoryError> {
        self.tables
            .lock()
            .map_err(|_| RepositoryError::Unavailable("leave store lock poisoned".to_string()))
    }
}

fn opening_balance<'a>(
    balances: &'a mut HashMap<BalanceKey, LeaveBalance>,
    key: &BalanceKey,
    allowance: &LeaveAllowance,
) -> &'a mut LeaveBalance {
    balances
        .entry(key.clone())
        .or_insert_with(|| LeaveBalance::opening(key.clone(), allowance))
}

impl LeaveApplicationRepository for InMemoryLeaveStore {
    fn insert(&self, application: NewLeaveApplication) -> Result<LeaveApplication, RepositoryError> {
        let mut tables = self.tables()?;
        tables.last_id += 1;
        let id = LeaveId(tables.last_id);
        let stored = application.into_application(id);
        tables.applications.insert(id, stored.clone());
        Ok(stored)
    }

    fn fetch(&self, id: LeaveId) -> Result<Option<LeaveApplication>, RepositoryError> {
        let tables = self.tables()?;
        Ok(tables.applications.get(&id).cloned())
    }

    fn list(&self, query: &LeaveQuery) -> Result<Vec<LeaveApplication>, RepositoryError> {
        let tables = self.tables()?;
        let mut matching: Vec<LeaveApplication> = tables
            .applications
            .values()
            .filter(|application| query.matches(application))
            .cloned()
            .collect();
        matching.sort_by_key(|application| Reverse((application.applied_at(), application.id())));
        Ok(matching)
    }

    fn remove_pending(&self, id: LeaveId) -> Result<LeaveApplication, RepositoryError> {
        let mut tables = self.tables()?;
        let current = tables
            .applications
            .get(&id)
            .ok_or(RepositoryError::NotFound)?
            .status();
        if current.is_terminal() {
            return Err(RepositoryError::StatusConflict { current });
        }
        tables
            .applications
            .remove(&id)
            .ok_or(RepositoryError::NotFound)
    }

    fn commit_review(
        &self,
        transition: &ReviewTransition,
    ) -> Result<LeaveApplication, RepositoryError> {
        let mut tables = self.tables()?;
        let mut updated = tables
            .applications
            .get(&transition.leave_id)
            .cloned()
            .ok_or(RepositoryError::NotFound)?;

        updated
            .apply_review(transition)
            .map_err(|error| match error {
                TransitionError::NotPending { status, .. } => {
                    RepositoryError::StatusConflict { current: status }
                }
                other => RepositoryError::Unavailable(other.to_string()),
            })?;

        if let Some(debit) = &transition.debit {
            opening_balance(&mut tables.balances, &debit.key, &self.allowance)
                .debit(debit.leave_type, debit.days);
        }
        tables.applications.insert(updated.id(), updated.clone());
        Ok(updated)
    }

    fn purge_applicant(&self, user: &UserId) -> Result<PurgeReport, RepositoryError> {
        let mut tables = self.tables()?;
        let pending = tables
            .applications
            .values()
            .filter(|application| application.applicant_id() == user && application.is_pending())
            .count();
        if pending > 0 {
            return Err(RepositoryError::PendingApplications { count: pending });
        }

        let before_applications = tables.applications.len();
        tables
            .applications
            .retain(|_, application| application.applicant_id() != user);
        let before_balances = tables.balances.len();
        tables.balances.retain(|key, _| key.user != *user);

        Ok(PurgeReport {
            applications: before_applications - tables.applications.len(),
            balances: before_balances - tables.balances.len(),
        })
    }
}

impl LeaveBalanceStore for InMemoryLeaveStore {
    fn get_or_create(&self, key: &BalanceKey) -> Result<LeaveBalance, RepositoryError> {
        let mut tables = self.tables()?;
        Ok(opening_balance(&mut tables.balances, key, &self.allowance).clone())
    }

    fn peek(&self, key: &BalanceKey) -> Result<LeaveBalance, RepositoryError> {
        let tables = self.tables()?;
        Ok(tables
            .balances
            .get(key)
            .cloned()
            .unwrap_or_else(|| LeaveBalance::opening(key.clone(), &self.allowance)))
    }

    fn debit(
        &self,
        key: &BalanceKey,
        leave_type: LeaveType,
        days: u32,
    ) -> Result<LeaveBalance, RepositoryError> {
        let mut tables = self.tables()?;
        let balance = opening_balance(&mut tables.balances, key, &self.allowance);
        balance.debit(leave_type, days);
        Ok(balance.clone())
    }
}
