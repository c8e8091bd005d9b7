use serde::{Deserialize, Serialize};

use super::application::LeaveApplication;
use super::domain::{Actor, Role, UserId};

/// Which applications a viewer's queue contains.
///
/// Kept as data rather than a closure so storage adapters can turn it into a query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "scope", rename_all = "snake_case")]
pub enum VisibilityScope {
    /// The viewer's own applications.
    Applicant { user: UserId },
    /// Employee applications from one department.
    DepartmentEmployees { department: String },
    /// Every manager application.
    Managers,
}

impl VisibilityScope {
    pub fn matches(&self, application: &LeaveApplication) -> bool {
        let applicant = application.applicant();
        match self {
            VisibilityScope::Applicant { user } => applicant.id == *user,
            VisibilityScope::DepartmentEmployees { department } => {
                applicant.role == Role::Employee && applicant.department == *department
            }
            VisibilityScope::Managers => applicant.role == Role::Manager,
        }
    }
}

/// Role and department rules for the employee → manager → admin chain.
#[derive(Debug, Clone, Copy, Default)]
pub struct AuthorizationPolicy;

impl AuthorizationPolicy {
    pub fn new() -> Self {
        Self
    }

    /// Admins sit at the top of the chain and never file leave.
    pub fn can_apply(&self, actor: &Actor) -> bool {
        matches!(actor.role, Role::Employee | Role::Manager)
    }

    pub fn can_review(&self, reviewer: &Actor, application: &LeaveApplication) -> bool {
        self.review_denial(reviewer, application).is_none()
    }

    /// Why `reviewer` may not decide on `application`, or `None` when they may.
    pub fn review_denial(
        &self,
        reviewer: &Actor,
        application: &LeaveApplication,
    ) -> Option<&'static str> {
        let applicant = application.applicant();
        if reviewer.id == applicant.id {
            return Some("applicants cannot review their own leave");
        }

        match (reviewer.role, applicant.role) {
            (Role::Employee, _) => Some("employees cannot review leave applications"),
            (Role::Manager, Role::Employee) if reviewer.department == applicant.department => None,
            (Role::Manager, Role::Employee) => {
                Some("managers can only review leaves from their own department")
            }
            (Role::Manager, _) => Some("managers can only review employee leave applications"),
            (Role::Admin, Role::Manager) => None,
            (Role::Admin, _) => Some("admins can only review manager leave applications"),
        }
    }

    pub fn can_view(&self, viewer: &Actor, application: &LeaveApplication) -> bool {
        if viewer.id == application.applicant().id {
            return true;
        }
        match viewer.role {
            Role::Employee => false,
            Role::Manager | Role::Admin => self.visible_scope(viewer).matches(application),
        }
    }

    /// The viewer's working queue: own history for employees, the department's employee
    /// requests for managers, and manager requests for admins.
    pub fn visible_scope(&self, viewer: &Actor) -> VisibilityScope {
        match viewer.role {
            Role::Employee => VisibilityScope::Applicant {
                user: viewer.id.clone(),
            },
            Role::Manager => VisibilityScope::DepartmentEmployees {
                department: viewer.department.clone(),
            },
            Role::Admin => VisibilityScope::Managers,
        }
    }
}
