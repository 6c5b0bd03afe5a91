//! Drive lifecycle: `Pending` at creation, admin-driven moves to `Approved` and `Closed`.

use chrono::{DateTime, NaiveDate, Utc};

use super::domain::{CompanyId, DriveDraft, DriveStatus, EntityKind, PlacementDrive};
use super::error::PortalError;
use super::repository::{NewDrive, PortalRepository, RepositoryError};

pub(crate) const MAX_CGPA: f32 = 10.0;

pub fn ensure_drive_transition(
    drive: &PlacementDrive,
    next: DriveStatus,
) -> Result<(), PortalError> {
    if drive.status.can_transition_to(next) {
        Ok(())
    } else {
        Err(PortalError::InvalidTransition {
            entity: EntityKind::Drive,
            from: drive.status.label(),
            to: next.label(),
        })
    }
}

pub(crate) fn validate_draft(draft: &DriveDraft, today: NaiveDate) -> Result<(), PortalError> {
    if draft.job_title.trim().is_empty() {
        return Err(PortalError::invalid("job_title", "must not be empty"));
    }
    if let Some(min_cgpa) = draft.min_cgpa {
        if !(0.0..=MAX_CGPA).contains(&min_cgpa) {
            return Err(PortalError::invalid("min_cgpa", "must be between 0 and 10"));
        }
    }
    if draft.application_deadline < today {
        return Err(PortalError::invalid(
            "application_deadline",
            "must not be in the past",
        ));
    }
    Ok(())
}

/// Stores a validated draft as a `Pending` drive. The deadline is fixed from here on.
pub(crate) fn create_drive<R>(
    repository: &R,
    company_id: CompanyId,
    draft: DriveDraft,
    now: DateTime<Utc>,
) -> Result<PlacementDrive, PortalError>
where
    R: PortalRepository + ?Sized,
{
    validate_draft(&draft, now.date_naive())?;

    let drive = repository.insert_drive(NewDrive {
        company_id,
        job_title: draft.job_title.trim().to_string(),
        job_description: draft.job_description,
        eligibility_criteria: draft.eligibility_criteria,
        min_cgpa: draft.min_cgpa,
        application_deadline: draft.application_deadline,
        created_at: now,
    })?;
    Ok(drive)
}

/// Applies an admin transition, returning the status the drive actually left.
pub(crate) fn transition_drive<R>(
    repository: &R,
    drive: &PlacementDrive,
    next: DriveStatus,
) -> Result<(DriveStatus, PlacementDrive), PortalError>
where
    R: PortalRepository + ?Sized,
{
    ensure_drive_transition(drive, next)?;

    match repository.update_drive_status(drive.id, drive.status, next) {
        Ok(updated) => Ok((drive.status, updated)),
        Err(RepositoryError::StaleWrite) => {
            // Another admin moved the drive first; retry once from the state they left.
            let current = repository
                .drive(drive.id)?
                .ok_or(PortalError::NotFound(EntityKind::Drive))?;
            ensure_drive_transition(&current, next)?;
            let updated = repository.update_drive_status(current.id, current.status, next)?;
            Ok((current.status, updated))
        }
        Err(RepositoryError::NotFound) => Err(PortalError::NotFound(EntityKind::Drive)),
        Err(other) => Err(PortalError::Storage(other)),
    }
}
