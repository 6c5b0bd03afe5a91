use chrono::NaiveDate;
use serde::Serialize;

use super::domain::{DriveStatus, PlacementDrive, Student};

/// Why a student may not apply to a drive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, thiserror::Error)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum Ineligibility {
    #[error("drive is {} rather than open", .status.label())]
    DriveNotOpen { status: DriveStatus },
    #[error("application deadline {deadline} has passed")]
    DeadlinePassed { deadline: NaiveDate },
    #[error("a CGPA of at least {required:.2} is required but none is on record")]
    MissingCgpa { required: f32 },
    #[error("CGPA {actual:.2} is below the required {required:.2}")]
    CgpaBelowMinimum { required: f32, actual: f32 },
}

/// Admission rules for one (student, drive) pair evaluated on `today`.
///
/// Department and year are descriptive only and never filter.
pub fn evaluate(
    student: &Student,
    drive: &PlacementDrive,
    today: NaiveDate,
) -> Result<(), Ineligibility> {
    if !drive.status.accepts_applications() {
        return Err(Ineligibility::DriveNotOpen {
            status: drive.status,
        });
    }

    // Applying on the deadline date itself is allowed.
    if today > drive.application_deadline {
        return Err(Ineligibility::DeadlinePassed {
            deadline: drive.application_deadline,
        });
    }

    if let Some(required) = drive.min_cgpa {
        match student.cgpa {
            None => return Err(Ineligibility::MissingCgpa { required }),
            Some(actual) if actual < required => {
                return Err(Ineligibility::CgpaBelowMinimum { required, actual })
            }
            Some(_) => {}
        }
    }

    Ok(())
}

pub fn is_eligible(student: &Student, drive: &PlacementDrive, today: NaiveDate) -> bool {
    evaluate(student, drive, today).is_ok()
}
