//! Campus placement portal: role-based access gate plus the drive, application and
//! placement lifecycles.
//!
//! Callers go through [`PlacementPortalService`], which resolves the acting principal, asks
//! the gate, and then hands off to the lifecycle managers. Persistence sits behind
//! [`PortalRepository`]; multi-record writes are single storage commits.

pub mod access;
pub(crate) mod applications;
pub mod clock;
pub mod credentials;
pub mod domain;
pub(crate) mod drives;
pub mod eligibility;
pub mod error;
pub mod memory;
pub mod notices;
pub(crate) mod placements;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use access::{authorize, Action, Decision, DenialReason, Target};
pub use applications::{ensure_application_transition, StatusUpdate};
pub use clock::{Clock, FixedClock, SystemClock};
pub use credentials::{hash_secret, verify_secret, CredentialError, SecretHash};
pub use domain::{
    Account, Admin, AdminId, Application, ApplicationId, ApplicationStatus, Company, CompanyId,
    CompanyRegistration, DriveDraft, DriveId, DriveStatus, EntityKind, Placement, PlacementDrive,
    PlacementId, PlacementStatus, PlacementTerms, Principal, Role, Student, StudentId,
    StudentRegistration,
};
pub use drives::ensure_drive_transition;
pub use eligibility::{evaluate as evaluate_eligibility, is_eligible, Ineligibility};
pub use error::PortalError;
pub use memory::InMemoryPortalStore;
pub use notices::{InMemoryNoticePublisher, NoticeError, NoticePublisher, PortalNotice};
pub use repository::{IdentityStore, PortalRepository, PortalTotals, RepositoryError};
pub use router::{placement_router, AuthenticatedPrincipal, PRINCIPAL_HEADER, ROLE_HEADER};
pub use service::{AdminOverview, PlacementPortalService};
