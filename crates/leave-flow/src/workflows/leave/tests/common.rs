use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::NaiveDate;
use serde_json::Value;

use crate::workflows::leave::application::{LeaveApplication, LeavePolicy, NewLeaveApplication, ReviewTransition};
use crate::workflows::leave::balance::{BalanceKey, LeaveBalance};
use crate::workflows::leave::clock::FixedClock;
use crate::workflows::leave::domain::{Actor, LeaveId, LeaveRequest, LeaveType, Role, UserId};
use crate::workflows::leave::memory::InMemoryLeaveStore;
use crate::workflows::leave::repository::{
    LeaveApplicationRepository, LeaveBalanceStore, LeaveQuery, NotificationError,
    NotificationSink, PurgeReport, RepositoryError, ReviewNotice,
};
use crate::workflows::leave::service::LeaveWorkflowService;

/// Monday 19 October 2026.
pub(super) fn today() -> NaiveDate {
    date(2026, 10, 19)
}

pub(super) fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

pub(super) fn employee(id: &str, department: &str) -> Actor {
    Actor::new(id, Role::Employee, department)
        .with_name(format!("Employee {id}"))
        .with_email(format!("{id}@example.com"))
}

pub(super) fn manager(id: &str, department: &str) -> Actor {
    Actor::new(id, Role::Manager, department)
        .with_name(format!("Manager {id}"))
        .with_email(format!("{id}@example.com"))
}

pub(super) fn admin(id: &str) -> Actor {
    Actor::new(id, Role::Admin, "HQ").with_name(format!("Admin {id}"))
}

/// Wednesday 21 to Tuesday 27 October: five working days across a weekend.
pub(super) fn casual_request() -> LeaveRequest {
    LeaveRequest {
        leave_type: LeaveType::Casual,
        start_date: date(2026, 10, 21),
        end_date: date(2026, 10, 27),
        reason: "family wedding".to_string(),
    }
}

pub(super) type TestService = LeaveWorkflowService<InMemoryLeaveStore, MemoryNotifier>;

pub(super) fn build_service() -> (TestService, Arc<InMemoryLeaveStore>, Arc<MemoryNotifier>) {
    let store = Arc::new(InMemoryLeaveStore::default());
    let notifier = Arc::new(MemoryNotifier::default());
    let service = LeaveWorkflowService::with_clock(
        store.clone(),
        notifier.clone(),
        LeavePolicy::default(),
        Arc::new(FixedClock::on(today())),
    );
    (service, store, notifier)
}

pub(super) fn balance_of(store: &InMemoryLeaveStore, user: &Actor) -> LeaveBalance {
    store
        .get_or_create(&BalanceKey::new(user.id.clone(), 2026))
        .expect("balance available")
}

#[derive(Default, Clone)]
pub(super) struct MemoryNotifier {
    notices: Arc<Mutex<Vec<ReviewNotice>>>,
}

impl MemoryNotifier {
    pub(super) fn notices(&self) -> Vec<ReviewNotice> {
        self.notices.lock().expect("notifier mutex poisoned").clone()
    }
}

impl NotificationSink for MemoryNotifier {
    fn notify(&self, notice: ReviewNotice) -> Result<(), NotificationError> {
        self.notices
            .lock()
            .expect("notifier mutex poisoned")
            .push(notice);
        Ok(())
    }
}

pub(super) struct FailingNotifier;

impl NotificationSink for FailingNotifier {
    fn notify(&self, _notice: ReviewNotice) -> Result<(), NotificationError> {
        Err(NotificationError::Transport("smtp relay offline".to_string()))
    }
}

pub(super) struct UnavailableStore;

impl LeaveApplicationRepository for UnavailableStore {
    fn insert(&self, _application: NewLeaveApplication) -> Result<LeaveApplication, RepositoryError> {
        Err(offline())
    }

    fn fetch(&self, _id: LeaveId) -> Result<Option<LeaveApplication>, RepositoryError> {
        Err(offline())
    }

    fn list(&self, _query: &LeaveQuery) -> Result<Vec<LeaveApplication>, RepositoryError> {
        Err(offline())
    }

    fn remove_pending(&self, _id: LeaveId) -> Result<LeaveApplication, RepositoryError> {
        Err(offline())
    }

    fn commit_review(
        &self,
        _transition: &ReviewTransition,
    ) -> Result<LeaveApplication, RepositoryError> {
        Err(offline())
    }

    fn purge_applicant(&self, _user: &UserId) -> Result<PurgeReport, RepositoryError> {
        Err(offline())
    }
}

impl LeaveBalanceStore for UnavailableStore {
    fn get_or_create(&self, _key: &BalanceKey) -> Result<LeaveBalance, RepositoryError> {
        Err(offline())
    }

    fn peek(&self, _key: &BalanceKey) -> Result<LeaveBalance, RepositoryError> {
        Err(offline())
    }

    fn debit(
        &self,
        _key: &BalanceKey,
        _leave_type: LeaveType,
        _days: u32,
    ) -> Result<LeaveBalance, RepositoryError> {
        Err(offline())
    }
}

fn offline() -> RepositoryError {
    RepositoryError::Unavailable("database offline".to_string())
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 16 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
