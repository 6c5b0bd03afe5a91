//! Application lifecycle.
//!
//! `Applied` is the initial state. `Shortlisted` may still move to `Rejected` or `Placed`;
//! `Rejected` and `Placed` are terminal. Moving to `Placed` goes through the placement
//! recorder so the status change and the placement row commit together.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use super::domain::{
    Application, ApplicationStatus, EntityKind, Placement, PlacementDrive, PlacementTerms,
    Student,
};
use super::eligibility::{self, Ineligibility};
use super::error::PortalError;
use super::placements;
use super::repository::{NewApplication, PortalRepository, RepositoryError};

/// Result of a status change, including the placement recorded for `Placed`.
#[derive(Debug, Clone, Serialize)]
pub struct StatusUpdate {
    pub previous: ApplicationStatus,
    pub application: Application,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placement: Option<Placement>,
}

pub fn ensure_application_transition(
    application: &Application,
    next: ApplicationStatus,
) -> Result<(), PortalError> {
    if application.status.can_transition_to(next) {
        Ok(())
    } else {
        Err(PortalError::InvalidTransition {
            entity: EntityKind::Application,
            from: application.status.label(),
            to: next.label(),
        })
    }
}

/// Creates an `Applied` application. The pair check up front only shapes the error; the
/// store's unique constraint is what stops concurrent duplicates.
pub(crate) fn create_application<R>(
    repository: &R,
    student: &Student,
    drive: &PlacementDrive,
    now: DateTime<Utc>,
) -> Result<Application, PortalError>
where
    R: PortalRepository + ?Sized,
{
    if repository.application_for(student.id, drive.id)?.is_some() {
        return Err(PortalError::DuplicateApplication);
    }

    match eligibility::evaluate(student, drive, now.date_naive()) {
        Ok(()) => {}
        Err(Ineligibility::DriveNotOpen { .. }) => return Err(PortalError::DriveNotOpen),
        Err(reason) => return Err(PortalError::NotEligible(reason)),
    }

    let created = repository.insert_application(NewApplication {
        student_id: student.id,
        drive_id: drive.id,
        applied_at: now,
    });

    match created {
        Ok(application) => Ok(application),
        Err(RepositoryError::Conflict) => Err(PortalError::DuplicateApplication),
        Err(RepositoryError::NotFound) => Err(PortalError::NotFound(EntityKind::Drive)),
        Err(other) => Err(PortalError::Storage(other)),
    }
}

pub(crate) fn set_status<R>(
    repository: &R,
    application: &Application,
    drive: &PlacementDrive,
    next: ApplicationStatus,
    terms: PlacementTerms,
    today: NaiveDate,
) -> Result<StatusUpdate, PortalError>
where
    R: PortalRepository + ?Sized,
{
    ensure_application_transition(application, next)?;

    if next == ApplicationStatus::Placed {
        let (previous, updated, placement) =
            placements::record_placement(repository, application, drive, terms, today)?;
        return Ok(StatusUpdate {
            previous,
            application: updated,
            placement: Some(placement),
        });
    }

    let (previous, updated) =
        match repository.update_application_status(application.id, application.status, next) {
            Ok(updated) => (application.status, updated),
            Err(RepositoryError::StaleWrite) => {
                let current = reload(repository, application)?;
                ensure_application_transition(&current, next)?;
                let updated =
                    repository.update_application_status(current.id, current.status, next)?;
                (current.status, updated)
            }
            Err(RepositoryError::NotFound) => {
                return Err(PortalError::NotFound(EntityKind::Application))
            }
            Err(other) => return Err(PortalError::Storage(other)),
        };

    Ok(StatusUpdate {
        previous,
        application: updated,
        placement: None,
    })
}

pub(crate) fn reload<R>(
    repository: &R,
    application: &Application,
) -> Result<Application, PortalError>
where
    R: PortalRepository + ?Sized,
{
    repository
        .application(application.id)?
        .ok_or(PortalError::NotFound(EntityKind::Application))
}
