use chrono::NaiveDate;

use super::applications::{ensure_application_transition, reload};
use super::domain::{
    Application, ApplicationStatus, EntityKind, Placement, PlacementDrive, PlacementTerms,
};
use super::error::PortalError;
use super::repository::{NewPlacement, PortalRepository, RepositoryError};

/// Records the placement for an application reaching `Placed`.
///
/// The application's move to `Placed` and the new `Placed` placement row are one storage
/// commit: when the placement cannot be recorded the application keeps its prior status.
/// Returns the status the application left, the placed application and the placement.
pub(crate) fn record_placement<R>(
    repository: &R,
    application: &Application,
    drive: &PlacementDrive,
    terms: PlacementTerms,
    today: NaiveDate,
) -> Result<(ApplicationStatus, Application, Placement), PortalError>
where
    R: PortalRepository + ?Sized,
{
    if repository
        .active_placement_for(application.student_id, application.drive_id)?
        .is_some()
    {
        return Err(PortalError::DuplicatePlacement);
    }

    let placement = new_placement(application, drive, terms, today)?;

    match repository.commit_placement(application.id, application.status, placement.clone()) {
        Ok((placed, recorded)) => Ok((application.status, placed, recorded)),
        Err(RepositoryError::StaleWrite) => {
            let current = reload(repository, application)?;
            ensure_application_transition(&current, ApplicationStatus::Placed)?;
            let (placed, recorded) = repository
                .commit_placement(current.id, current.status, placement)
                .map_err(commit_error)?;
            Ok((current.status, placed, recorded))
        }
        Err(other) => Err(commit_error(other)),
    }
}

fn new_placement(
    application: &Application,
    drive: &PlacementDrive,
    terms: PlacementTerms,
    today: NaiveDate,
) -> Result<NewPlacement, PortalError> {
    if let Some(package) = terms.package {
        if !package.is_finite() || package < 0.0 {
            return Err(PortalError::invalid("package", "must be a non-negative amount"));
        }
    }

    let position = terms
        .position
        .map(|position| position.trim().to_string())
        .filter(|position| !position.is_empty());

    Ok(NewPlacement {
        student_id: application.student_id,
        company_id: drive.company_id,
        drive_id: application.drive_id,
        position,
        package: terms.package,
        placement_date: today,
    })
}

fn commit_error(err: RepositoryError) -> PortalError {
    match err {
        RepositoryError::Conflict => PortalError::DuplicatePlacement,
        RepositoryError::NotFound => PortalError::NotFound(EntityKind::Application),
        other => PortalError::Storage(other),
    }
}
