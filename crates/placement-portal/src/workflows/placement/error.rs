use super::access::DenialReason;
use super::credentials::CredentialError;
use super::domain::EntityKind;
use super::eligibility::Ineligibility;
use super::repository::RepositoryError;

/// Typed failure returned by every portal operation.
///
/// The `Display` output is the stable user-facing message. `Storage` and `Credential` keep
/// their detail in `source()` for logs only.
#[derive(Debug, thiserror::Error)]
pub enum PortalError {
    #[error("invalid credentials")]
    AuthFailure,
    #[error("access denied: {0}")]
    Denied(DenialReason),
    #[error("an account with this e-mail is already registered")]
    DuplicateEmail,
    #[error("you have already applied to this drive")]
    DuplicateApplication,
    #[error("an active placement already exists for this student and drive")]
    DuplicatePlacement,
    #[error("not eligible for this drive: {0}")]
    NotEligible(Ineligibility),
    #[error("this drive is not open for applications")]
    DriveNotOpen,
    #[error("{entity} cannot move from {from} to {to}")]
    InvalidTransition {
        entity: EntityKind,
        from: &'static str,
        to: &'static str,
    },
    #[error("{0} not found")]
    NotFound(EntityKind),
    #[error("invalid {field}: {problem}")]
    InvalidField {
        field: &'static str,
        problem: &'static str,
    },
    #[error("the request could not be completed")]
    Storage(#[source] RepositoryError),
    #[error("the request could not be completed")]
    Credential(#[source] CredentialError),
}

impl PortalError {
    /// Machine-readable code, stable across releases.
    pub const fn code(&self) -> &'static str {
        match self {
            PortalError::AuthFailure => "auth_failure",
            PortalError::Denied(_) => "denied",
            PortalError::DuplicateEmail => "duplicate_email",
            PortalError::DuplicateApplication => "duplicate_application",
            PortalError::DuplicatePlacement => "duplicate_placement",
            PortalError::NotEligible(_) => "not_eligible",
            PortalError::DriveNotOpen => "drive_not_open",
            PortalError::InvalidTransition { .. } => "invalid_transition",
            PortalError::NotFound(_) => "not_found",
            PortalError::InvalidField { .. } => "invalid_field",
            PortalError::Storage(_) | PortalError::Credential(_) => "internal",
        }
    }

    pub const fn denial_reason(&self) -> Option<DenialReason> {
        match self {
            PortalError::Denied(reason) => Some(*reason),
            _ => None,
        }
    }

    pub(crate) const fn invalid(field: &'static str, problem: &'static str) -> Self {
        PortalError::InvalidField { field, problem }
    }
}

impl From<RepositoryError> for PortalError {
    fn from(value: RepositoryError) -> Self {
        Self::Storage(value)
    }
}

impl From<CredentialError> for PortalError {
    fn from(value: CredentialError) -> Self {
        Self::Credential(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn storage_detail_stays_out_of_the_message() {
        let err = PortalError::from(RepositoryError::Unavailable(
            "connection reset by 10.0.0.4".to_string(),
        ));
        assert_eq!(err.to_string(), "the request could not be completed");
        assert_eq!(err.code(), "internal");
        let source = err.source().expect("source retained").to_string();
        assert!(source.contains("10.0.0.4"));
    }

    #[test]
    fn denied_messages_carry_the_reason() {
        let err = PortalError::Denied(DenialReason::NotApproved);
        assert_eq!(err.to_string(), "access denied: not-approved");
        assert_eq!(err.denial_reason(), Some(DenialReason::NotApproved));
    }

    #[test]
    fn transition_messages_name_both_states() {
        let err = PortalError::InvalidTransition {
            entity: EntityKind::Application,
            from: "Rejected",
            to: "Shortlisted",
        };
        assert_eq!(
            err.to_string(),
            "application cannot move from Rejected to Shortlisted"
        );
    }
}
