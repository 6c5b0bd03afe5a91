use super::common::*;
use crate::workflows::placement::access::{authorize, check_standing};
use crate::workflows::placement::domain::{Account, DriveStatus};
use crate::workflows::placement::{Action, Decision, DenialReason, Target};

#[test]
fn admin_only_actions_reject_other_roles() {
    let student = Account::Student(student_record(1, Some(8.0)));
    let company = Account::Company(company_record(2, true));

    for action in [Action::ApproveCompany, Action::SetDriveStatus, Action::ViewAdminOverview] {
        assert_eq!(
            authorize(&student, action, &Target::None),
            Decision::Denied(DenialReason::Role),
            "{action} should be admin only"
        );
        assert_eq!(
            authorize(&company, action, &Target::None),
            Decision::Denied(DenialReason::Role)
        );
        assert!(authorize(&admin_account(), action, &Target::None).is_allowed());
    }
}

#[test]
fn students_cannot_create_drives_and_companies_cannot_apply() {
    let student = Account::Student(student_record(1, Some(8.0)));
    let company = Account::Company(company_record(2, true));
    let drive = drive_record(5, 2, DriveStatus::Approved);

    assert_eq!(
        authorize(&student, Action::CreateDrive, &Target::None),
        Decision::Denied(DenialReason::Role)
    );
    assert_eq!(
        authorize(&company, Action::Apply, &Target::Drive(&drive)),
        Decision::Denied(DenialReason::Role)
    );
}

#[test]
fn unapproved_company_is_denied_before_ownership() {
    let company = Account::Company(company_record(2, false));
    let foreign_drive = drive_record(5, 9, DriveStatus::Pending);

    assert_eq!(
        authorize(&company, Action::CreateDrive, &Target::None),
        Decision::Denied(DenialReason::NotApproved)
    );
    assert_eq!(
        authorize(
            &company,
            Action::ViewDriveApplications,
            &Target::Drive(&foreign_drive)
        ),
        Decision::Denied(DenialReason::NotApproved)
    );
}

#[test]
fn blacklist_outranks_inactive_and_approval() {
    let mut record = company_record(2, false);
    record.blacklisted = true;
    record.active = false;

    assert_eq!(
        check_standing(&Account::Company(record), Action::CreateDrive),
        Decision::Denied(DenialReason::Blacklisted)
    );
}

#[test]
fn inactive_student_is_denied() {
    let mut record = student_record(1, Some(8.0));
    record.active = false;
    let drive = drive_record(5, 2, DriveStatus::Approved);

    assert_eq!(
        authorize(&Account::Student(record), Action::Apply, &Target::Drive(&drive)),
        Decision::Denied(DenialReason::Inactive)
    );
}

#[test]
fn profile_and_logout_ignore_standing() {
    let mut student = student_record(1, None);
    student.blacklisted = true;
    let company = company_record(2, false);

    for account in [Account::Student(student), Account::Company(company)] {
        assert!(authorize(&account, Action::ViewProfile, &Target::None).is_allowed());
        assert!(authorize(&account, Action::Logout, &Target::None).is_allowed());
    }
}

#[test]
fn companies_only_act_on_their_own_drives_and_applications() {
    let company = Account::Company(company_record(2, true));
    let own = drive_record(5, 2, DriveStatus::Approved);
    let foreign = drive_record(6, 3, DriveStatus::Approved);
    let own_application = application_record(10, 1, 5);
    let foreign_application = application_record(11, 1, 6);

    assert!(authorize(&company, Action::ViewDriveApplications, &Target::Drive(&own)).is_allowed());
    assert_eq!(
        authorize(
            &company,
            Action::ViewDriveApplications,
            &Target::Drive(&foreign)
        ),
        Decision::Denied(DenialReason::Ownership)
    );
    assert!(authorize(
        &company,
        Action::SetApplicationStatus,
        &Target::Application {
            application: &own_application,
            drive: &own,
        }
    )
    .is_allowed());
    assert_eq!(
        authorize(
            &company,
            Action::SetApplicationStatus,
            &Target::Application {
                application: &foreign_application,
                drive: &foreign,
            }
        ),
        Decision::Denied(DenialReason::Ownership)
    );
}

#[test]
fn application_must_belong_to_the_drive_it_is_checked_against() {
    let company = Account::Company(company_record(2, true));
    let own = drive_record(5, 2, DriveStatus::Approved);
    let mismatched = application_record(11, 1, 6);

    assert_eq!(
        authorize(
            &company,
            Action::SetApplicationStatus,
            &Target::Application {
                application: &mismatched,
                drive: &own,
            }
        ),
        Decision::Denied(DenialReason::Ownership)
    );
}

#[test]
fn admin_may_act_on_any_application() {
    let drive = drive_record(6, 3, DriveStatus::Approved);
    let application = application_record(11, 1, 6);

    assert!(authorize(
        &admin_account(),
        Action::SetApplicationStatus,
        &Target::Application {
            application: &application,
            drive: &drive,
        }
    )
    .is_allowed());
}

#[test]
fn denial_reasons_have_stable_codes() {
    assert_eq!(DenialReason::NotApproved.code(), "not-approved");
    assert_eq!(DenialReason::Blacklisted.to_string(), "blacklisted");
    assert_eq!(
        serde_json::to_value(Decision::Denied(DenialReason::Ownership)).expect("serializes"),
        serde_json::json!({ "decision": "denied", "reason": "ownership" })
    );
}
