use chrono::{Datelike, Duration, Local, NaiveDate};
use clap::Args;
use leave_flow::error::AppError;
use leave_flow::workflows::leave::{
    Actor, FixedClock, InMemoryLeaveStore, LeaveApplication, LeaveBalance, LeavePolicy,
    LeaveRequest, LeaveType, LeaveWorkflowService, NotificationError, NotificationSink,
    ReviewDecision, ReviewNotice, Role,
};
use std::sync::Arc;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Date the scenario runs on (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) today: Option<NaiveDate>,
}

/// Prints notices inline so the walkthrough shows the e-mail an applicant would get.
struct ConsoleNotifier;

impl NotificationSink for ConsoleNotifier {
    fn notify(&self, notice: ReviewNotice) -> Result<(), NotificationError> {
        println!("  mail to {}: {}", notice.applicant_email, notice.subject());
        for line in notice.body().lines() {
            println!("    | {line}");
        }
        Ok(())
    }
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let today = args.today.unwrap_or_else(|| Local::now().date_naive());
    let policy = LeavePolicy::default();
    let service = LeaveWorkflowService::with_clock(
        Arc::new(InMemoryLeaveStore::new(policy.allowance)),
        Arc::new(ConsoleNotifier),
        policy,
        Arc::new(FixedClock::on(today)),
    );

    let employee = Actor::new("emp-001", Role::Employee, "Engineering")
        .with_name("Asha Menon")
        .with_email("asha.menon@example.com");
    let manager = Actor::new("mgr-001", Role::Manager, "Engineering")
        .with_name("Ravi Iyer")
        .with_email("ravi.iyer@example.com");
    let admin = Actor::new("adm-001", Role::Admin, "People Ops").with_name("Meera Shah");

    println!("Leave workflow demo ({today})");
    print_balance("Opening balance", &service.current_balance(&employee.id)?);

    let (start, end) = wednesday_to_tuesday_after(today);
    let application = service.submit(
        &employee,
        LeaveRequest {
            leave_type: LeaveType::Casual,
            start_date: start,
            end_date: end,
            reason: "Sister's wedding".to_string(),
        },
    )?;
    print_application("\nSubmitted", &application);

    let reviewed = service.review(
        application.id(),
        &manager,
        ReviewDecision::Approve,
        Some("Approved, enjoy the celebrations.".to_string()),
    )?;
    print_application("\nManager decision", &reviewed);
    print_balance("Balance after approval", &service.current_balance(&employee.id)?);

    println!("\nAdmin attempts to review the same application");
    match service.review(application.id(), &admin, ReviewDecision::Reject, None) {
        Ok(_) => println!("  unexpectedly accepted"),
        Err(error) => println!("  refused: {error}"),
    }

    println!("\nManager attempts a second review");
    match service.review(application.id(), &manager, ReviewDecision::Reject, None) {
        Ok(_) => println!("  unexpectedly accepted"),
        Err(error) => println!("  refused: {error}"),
    }

    println!("\nEmployee requests 31 calendar days of earned leave");
    let long_start = start + Duration::days(14);
    match service.submit(
        &employee,
        LeaveRequest {
            leave_type: LeaveType::Earned,
            start_date: long_start,
            end_date: long_start + Duration::days(30),
            reason: "Extended travel".to_string(),
        },
    ) {
        Ok(_) => println!("  unexpectedly accepted"),
        Err(error) => println!("  refused: {error}"),
    }

    let summary = service.summary(&manager)?;
    println!(
        "\nManager dashboard: {} total, {} pending, {} approved, {} rejected",
        summary.total, summary.pending, summary.approved, summary.rejected
    );

    Ok(())
}

/// A Wednesday-to-Tuesday window in the week after `today`: seven calendar days, five of
/// them working days.
fn wednesday_to_tuesday_after(today: NaiveDate) -> (NaiveDate, NaiveDate) {
    let days_to_monday = 7 - i64::from(today.weekday().num_days_from_monday());
    let start = today + Duration::days(days_to_monday + 2);
    (start, start + Duration::days(6))
}

fn print_application(heading: &str, application: &LeaveApplication) {
    println!("{heading}");
    println!(
        "  {} {} {} -> {} ({} working day(s)) [{}]",
        application.id(),
        application.leave_type().display_name(),
        application.start_date(),
        application.end_date(),
        application.total_days(),
        application.status()
    );
    if let Some(reviewer) = application.reviewed_by() {
        println!(
            "  reviewed by {} ({})",
            reviewer.name,
            reviewer.role.display_name()
        );
    }
}

fn print_balance(heading: &str, balance: &LeaveBalance) {
    println!(
        "{heading} {}: casual {}, sick {}, earned {} (total {})",
        balance.year,
        balance.casual,
        balance.sick,
        balance.earned,
        balance.total_available()
    );
}
