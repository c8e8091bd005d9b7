use std::sync::{Arc, Mutex};

use chrono::NaiveDate;
use leave_flow::workflows::leave::{
    working_days, Actor, FixedClock, InMemoryLeaveStore, LeaveAllowance, LeavePolicy,
    LeaveRequest, LeaveServiceError, LeaveStatus, LeaveType, LeaveWorkflowService,
    NotificationError, NotificationSink, ReviewDecision, ReviewNotice, Role,
};

fn day(month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, month, day).expect("valid date")
}

#[derive(Default)]
struct Outbox {
    sent: Mutex<Vec<ReviewNotice>>,
}

impl NotificationSink for Outbox {
    fn notify(&self, notice: ReviewNotice) -> Result<(), NotificationError> {
        self.sent.lock().expect("outbox mutex poisoned").push(notice);
        Ok(())
    }
}

fn service_with(
    allowance: LeaveAllowance,
) -> (
    LeaveWorkflowService<InMemoryLeaveStore, Outbox>,
    Arc<Outbox>,
) {
    let outbox = Arc::new(Outbox::default());
    let policy = LeavePolicy {
        allowance,
        ..LeavePolicy::default()
    };
    let service = LeaveWorkflowService::with_clock(
        Arc::new(InMemoryLeaveStore::new(allowance)),
        outbox.clone(),
        policy,
        Arc::new(FixedClock::on(day(10, 19))),
    );
    (service, outbox)
}

#[test]
fn working_days_skip_weekends_and_never_fall_below_one() {
    assert_eq!(working_days(day(10, 21), day(10, 27)), 5);
    assert_eq!(working_days(day(10, 19), day(10, 23)), 5);
    assert_eq!(working_days(day(10, 24), day(10, 25)), 1);
    assert_eq!(working_days(day(10, 30), day(11, 3)), 3);
}

#[test]
fn manager_leave_climbs_to_admin_and_email_reflects_outcome() {
    let (service, outbox) = service_with(LeaveAllowance::default());
    let lead = Actor::new("m-1", Role::Manager, "Support")
        .with_name("Priya Raman")
        .with_email("priya@example.com");
    let hr = Actor::new("a-1", Role::Admin, "HQ").with_name("Dana Ortiz");

    let application = service
        .submit(
            &lead,
            LeaveRequest {
                leave_type: LeaveType::Sick,
                start_date: day(10, 19),
                end_date: day(10, 20),
                reason: "flu".to_string(),
            },
        )
        .expect("managers may apply starting today");

    let peer = Actor::new("m-2", Role::Manager, "Support");
    assert!(matches!(
        service.review(application.id(), &peer, ReviewDecision::Approve, None),
        Err(LeaveServiceError::Authorization(_))
    ));

    let reviewed = service
        .review(
            application.id(),
            &hr,
            ReviewDecision::Approve,
            Some("get well soon".to_string()),
        )
        .expect("admin approves manager leave");
    assert_eq!(reviewed.status(), LeaveStatus::Approved);

    let balance = service.current_balance(&lead.id).expect("balance");
    assert_eq!(balance.sick, 10);

    let sent = outbox.sent.lock().expect("outbox mutex poisoned");
    assert_eq!(sent.len(), 1);
    let notice = &sent[0];
    assert_eq!(notice.applicant_email, "priya@example.com");
    assert_eq!(notice.subject(), "[LeaveMS] Leave Application APPROVED - LEAVE-1");
    let body = notice.body();
    assert!(body.starts_with("Dear Priya Raman,"));
    assert!(body.contains("Sick Leave"));
    assert!(body.contains("Dana Ortiz [Admin]"));
    assert!(body.contains("get well soon"));
}

#[test]
fn configured_allowance_bounds_submissions() {
    let allowance = LeaveAllowance {
        casual: 2,
        sick: 12,
        earned: 15,
    };
    let (service, _) = service_with(allowance);
    let staff = Actor::new("e-1", Role::Employee, "Support");

    let result = service.submit(
        &staff,
        LeaveRequest {
            leave_type: LeaveType::Casual,
            start_date: day(10, 21),
            end_date: day(10, 23),
            reason: "moving house".to_string(),
        },
    );

    match result {
        Err(error @ LeaveServiceError::InsufficientBalance { .. }) => assert_eq!(
            error.to_string(),
            "insufficient Casual Leave: available 2 day(s), requested 3 day(s)"
        ),
        other => panic!("expected insufficient balance, got {other:?}"),
    }
}
