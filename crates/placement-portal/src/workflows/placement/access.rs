//! Access control gate.
//!
//! [`authorize`] is a pure decision over an already resolved [`Account`]: it reads no store
//! and performs no writes. Rules run in a fixed order and the first failing rule names the
//! denial: role, account standing (blacklist, inactive, approval), then ownership of the
//! target.

use std::fmt;

use serde::Serialize;

use super::domain::{Account, Application, Company, PlacementDrive, Principal, Role, Student};
use super::error::PortalError;

/// Capabilities a principal may request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Action {
    ViewProfile,
    Logout,
    ChangePassword,
    ViewAdminOverview,
    ApproveCompany,
    SetCompanyBlacklist,
    SetStudentBlacklist,
    SetDriveStatus,
    CreateDrive,
    ViewOwnDrives,
    ViewDriveApplications,
    ViewOpenDrives,
    Apply,
    ViewOwnApplications,
    SetApplicationStatus,
}

impl Action {
    pub const fn name(self) -> &'static str {
        match self {
            Action::ViewProfile => "view-profile",
            Action::Logout => "logout",
            Action::ChangePassword => "change-password",
            Action::ViewAdminOverview => "view-admin-overview",
            Action::ApproveCompany => "approve-company",
            Action::SetCompanyBlacklist => "set-company-blacklist",
            Action::SetStudentBlacklist => "set-student-blacklist",
            Action::SetDriveStatus => "set-drive-status",
            Action::CreateDrive => "create-drive",
            Action::ViewOwnDrives => "view-own-drives",
            Action::ViewDriveApplications => "view-drive-applications",
            Action::ViewOpenDrives => "view-open-drives",
            Action::Apply => "apply",
            Action::ViewOwnApplications => "view-own-applications",
            Action::SetApplicationStatus => "set-application-status",
        }
    }

    /// Roles allowed to request the action at all.
    pub const fn permits(self, role: Role) -> bool {
        match self {
            Action::ViewProfile | Action::Logout => true,
            Action::ViewAdminOverview
            | Action::ApproveCompany
            | Action::SetCompanyBlacklist
            | Action::SetStudentBlacklist
            | Action::SetDriveStatus => matches!(role, Role::Admin),
            Action::CreateDrive | Action::ViewOwnDrives => matches!(role, Role::Company),
            Action::ChangePassword
            | Action::ViewOpenDrives
            | Action::Apply
            | Action::ViewOwnApplications => matches!(role, Role::Student),
            Action::ViewDriveApplications | Action::SetApplicationStatus => {
                matches!(role, Role::Company | Role::Admin)
            }
        }
    }

    /// Actions still available to blacklisted, inactive or unapproved accounts.
    pub const fn ignores_account_standing(self) -> bool {
        matches!(self, Action::ViewProfile | Action::Logout)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Entity instance an action is applied to.
#[derive(Debug, Clone, Copy)]
pub enum Target<'a> {
    None,
    Student(&'a Student),
    Company(&'a Company),
    Drive(&'a PlacementDrive),
    Application {
        application: &'a Application,
        drive: &'a PlacementDrive,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DenialReason {
    Role,
    Blacklisted,
    Inactive,
    NotApproved,
    Ownership,
    NotFound,
}

impl DenialReason {
    pub const fn code(self) -> &'static str {
        match self {
            DenialReason::Role => "role",
            DenialReason::Blacklisted => "blacklisted",
            DenialReason::Inactive => "inactive",
            DenialReason::NotApproved => "not-approved",
            DenialReason::Ownership => "ownership",
            DenialReason::NotFound => "not-found",
        }
    }
}

impl fmt::Display for DenialReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", content = "reason", rename_all = "snake_case")]
pub enum Decision {
    Allowed,
    Denied(DenialReason),
}

impl Decision {
    pub const fn is_allowed(self) -> bool {
        matches!(self, Decision::Allowed)
    }

    pub fn into_result(self) -> Result<(), PortalError> {
        match self {
            Decision::Allowed => Ok(()),
            Decision::Denied(reason) => Err(PortalError::Denied(reason)),
        }
    }
}

/// Full decision: standing first, then ownership of `target`.
pub fn authorize(account: &Account, action: Action, target: &Target<'_>) -> Decision {
    match check_standing(account, action) {
        Decision::Allowed => check_ownership(account.principal(), target),
        denied => denied,
    }
}

/// Rules that need no target: role, blacklist, active flag and company approval.
pub fn check_standing(account: &Account, action: Action) -> Decision {
    if !action.permits(account.principal().role()) {
        return Decision::Denied(DenialReason::Role);
    }

    if action.ignores_account_standing() {
        return Decision::Allowed;
    }

    if account.blacklisted() {
        return Decision::Denied(DenialReason::Blacklisted);
    }

    if !account.active() {
        return Decision::Denied(DenialReason::Inactive);
    }

    if !account.approved() {
        return Decision::Denied(DenialReason::NotApproved);
    }

    Decision::Allowed
}

fn check_ownership(principal: Principal, target: &Target<'_>) -> Decision {
    let owned = match (principal, target) {
        (Principal::Admin(_), _) | (_, Target::None) => true,
        (Principal::Company(id), Target::Drive(drive)) => drive.company_id == id,
        (Principal::Company(id), Target::Application { application, drive }) => {
            application.drive_id == drive.id && drive.company_id == id
        }
        (Principal::Company(id), Target::Company(company)) => company.id == id,
        (Principal::Company(_), Target::Student(_)) => false,
        (Principal::Student(id), Target::Application { application, .. }) => {
            application.student_id == id
        }
        (Principal::Student(id), Target::Student(student)) => student.id == id,
        // Students may act on any drive; eligibility decides whether they can apply.
        (Principal::Student(_), Target::Drive(_)) => true,
        (Principal::Student(_), Target::Company(_)) => false,
    };

    if owned {
        Decision::Allowed
    } else {
        Decision::Denied(DenialReason::Ownership)
    }
}
