use chrono::Days;

use super::common::*;
use crate::workflows::placement::domain::DriveStatus;
use crate::workflows::placement::eligibility::{evaluate, is_eligible, Ineligibility};

#[test]
fn cgpa_threshold_is_inclusive() {
    let drive = drive_record(1, 1, DriveStatus::Approved);

    assert!(is_eligible(&student_record(1, Some(7.0)), &drive, today()));
    assert_eq!(
        evaluate(&student_record(2, Some(6.9)), &drive, today()),
        Err(Ineligibility::CgpaBelowMinimum {
            required: 7.0,
            actual: 6.9,
        })
    );
}

#[test]
fn missing_cgpa_fails_when_a_minimum_is_set() {
    let drive = drive_record(1, 1, DriveStatus::Approved);

    assert_eq!(
        evaluate(&student_record(1, None), &drive, today()),
        Err(Ineligibility::MissingCgpa { required: 7.0 })
    );
}

#[test]
fn drives_without_minimum_accept_any_cgpa() {
    let mut drive = drive_record(1, 1, DriveStatus::Approved);
    drive.min_cgpa = None;

    assert!(is_eligible(&student_record(1, None), &drive, today()));
    assert!(is_eligible(&student_record(2, Some(4.2)), &drive, today()));
}

#[test]
fn deadline_day_is_still_open() {
    let drive = drive_record(1, 1, DriveStatus::Approved);
    let student = student_record(1, Some(9.1));

    assert!(is_eligible(&student, &drive, deadline()));

    let day_after = deadline()
        .checked_add_days(Days::new(1))
        .expect("valid date");
    assert_eq!(
        evaluate(&student, &drive, day_after),
        Err(Ineligibility::DeadlinePassed {
            deadline: deadline()
        })
    );
}

#[test]
fn only_approved_drives_accept_applications() {
    let student = student_record(1, Some(9.1));

    for status in [DriveStatus::Pending, DriveStatus::Closed] {
        let drive = drive_record(1, 1, status);
        assert_eq!(
            evaluate(&student, &drive, today()),
            Err(Ineligibility::DriveNotOpen { status })
        );
    }
}

#[test]
fn status_is_checked_before_cgpa() {
    let drive = drive_record(1, 1, DriveStatus::Closed);

    assert!(matches!(
        evaluate(&student_record(1, Some(2.0)), &drive, today()),
        Err(Ineligibility::DriveNotOpen { .. })
    ));
}

#[test]
fn reasons_serialize_with_a_tag() {
    let reason = Ineligibility::CgpaBelowMinimum {
        required: 7.0,
        actual: 6.5,
    };

    let value = serde_json::to_value(reason).expect("serializes");
    assert_eq!(value["reason"], "cgpa_below_minimum");
    assert_eq!(reason.to_string(), "CGPA 6.50 is below the required 7.00");
}
