use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use super::credentials::SecretHash;
use super::domain::{
    Account, Admin, AdminId, Application, ApplicationId, ApplicationStatus, Company, CompanyId,
    DriveId, DriveStatus, Placement, PlacementDrive, PlacementId, PlacementStatus, Role, Student,
    StudentId,
};

/// Lookup side of the storage boundary used for authentication and principal resolution.
pub trait IdentityStore: Send + Sync {
    /// Admins are keyed by username, students and companies by (normalized) e-mail.
    fn find_by_login_key(&self, role: Role, key: &str)
        -> Result<Option<Account>, RepositoryError>;
    fn admin(&self, id: AdminId) -> Result<Option<Admin>, RepositoryError>;
    fn student(&self, id: StudentId) -> Result<Option<Student>, RepositoryError>;
    fn company(&self, id: CompanyId) -> Result<Option<Company>, RepositoryError>;
}

/// Transactional store behind the portal.
///
/// Every method is one atomic unit. Unique constraints surface as
/// [`RepositoryError::Conflict`] and failed compare-and-swap updates as
/// [`RepositoryError::StaleWrite`]; the service translates both into typed portal errors.
pub trait PortalRepository: IdentityStore {
    /// Unique on `username`.
    fn insert_admin(&self, admin: NewAdmin) -> Result<Admin, RepositoryError>;
    /// Unique on `email`.
    fn insert_student(&self, student: NewStudent) -> Result<Student, RepositoryError>;
    /// Unique on `contact_email`.
    fn insert_company(&self, company: NewCompany) -> Result<Company, RepositoryError>;
    /// Flips the blacklist flag and leaves every other column alone.
    fn set_student_blacklisted(
        &self,
        id: StudentId,
        blacklisted: bool,
    ) -> Result<Student, RepositoryError>;
    /// Swaps the stored hash only while it still equals `expected`.
    fn replace_student_secret(
        &self,
        id: StudentId,
        expected: &SecretHash,
        replacement: SecretHash,
    ) -> Result<Student, RepositoryError>;
    fn set_company_approved(&self, id: CompanyId) -> Result<Company, RepositoryError>;
    fn set_company_blacklisted(
        &self,
        id: CompanyId,
        blacklisted: bool,
    ) -> Result<Company, RepositoryError>;

    fn insert_drive(&self, drive: NewDrive) -> Result<PlacementDrive, RepositoryError>;
    fn drive(&self, id: DriveId) -> Result<Option<PlacementDrive>, RepositoryError>;
    fn update_drive_status(
        &self,
        id: DriveId,
        expected: DriveStatus,
        next: DriveStatus,
    ) -> Result<PlacementDrive, RepositoryError>;

    /// Unique on `(student_id, drive_id)`.
    fn insert_application(
        &self,
        application: NewApplication,
    ) -> Result<Application, RepositoryError>;
    fn application(&self, id: ApplicationId) -> Result<Option<Application>, RepositoryError>;
    fn application_for(
        &self,
        student_id: StudentId,
        drive_id: DriveId,
    ) -> Result<Option<Application>, RepositoryError>;
    fn update_application_status(
        &self,
        id: ApplicationId,
        expected: ApplicationStatus,
        next: ApplicationStatus,
    ) -> Result<Application, RepositoryError>;

    /// Moves the application from `expected` to `Placed` and inserts the placement in one
    /// unit. Nothing is written when either step fails. A non-rejected placement for the same
    /// `(student_id, drive_id)` is a [`RepositoryError::Conflict`].
    fn commit_placement(
        &self,
        application_id: ApplicationId,
        expected: ApplicationStatus,
        placement: NewPlacement,
    ) -> Result<(Application, Placement), RepositoryError>;
    fn active_placement_for(
        &self,
        student_id: StudentId,
        drive_id: DriveId,
    ) -> Result<Option<Placement>, RepositoryError>;

    /// Unapproved companies that are not blacklisted.
    fn companies_pending_approval(&self) -> Result<Vec<Company>, RepositoryError>;
    fn drives_with_status(&self, status: DriveStatus)
        -> Result<Vec<PlacementDrive>, RepositoryError>;
    fn drives_for_company(&self, id: CompanyId) -> Result<Vec<PlacementDrive>, RepositoryError>;
    fn applications_for_student(&self, id: StudentId)
        -> Result<Vec<Application>, RepositoryError>;
    fn applications_for_drive(&self, id: DriveId) -> Result<Vec<Application>, RepositoryError>;
    fn totals(&self) -> Result<PortalTotals, RepositoryError>;
}

/// Error enumeration for storage failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("unique constraint violated")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("record changed concurrently")]
    StaleWrite,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PortalTotals {
    pub students: usize,
    pub companies: usize,
    pub drives: usize,
    pub applications: usize,
}

#[derive(Debug, Clone)]
pub struct NewAdmin {
    pub username: String,
    pub email: String,
    pub secret_hash: SecretHash,
    pub created_at: DateTime<Utc>,
}

impl NewAdmin {
    pub fn with_id(self, id: AdminId) -> Admin {
        Admin {
            id,
            username: self.username,
            email: self.email,
            secret_hash: self.secret_hash,
            created_at: self.created_at,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewStudent {
    pub name: String,
    pub email: String,
    pub secret_hash: SecretHash,
    pub phone: Option<String>,
    pub department: Option<String>,
    pub year: Option<u8>,
    pub cgpa: Option<f32>,
    pub created_at: DateTime<Utc>,
}

impl NewStudent {
    pub fn with_id(self, id: StudentId) -> Student {
        Student {
            id,
            name: self.name,
            email: self.email,
            secret_hash: self.secret_hash,
            phone: self.phone,
            department: self.department,
            year: self.year,
            cgpa: self.cgpa,
            active: true,
            blacklisted: false,
            created_at: self.created_at,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewCompany {
    pub name: String,
    pub contact_email: String,
    pub secret_hash: SecretHash,
    pub description: Option<String>,
    pub website: Option<String>,
    pub hr_contact: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl NewCompany {
    pub fn with_id(self, id: CompanyId) -> Company {
        Company {
            id,
            name: self.name,
            contact_email: self.contact_email,
            secret_hash: self.secret_hash,
            description: self.description,
            website: self.website,
            hr_contact: self.hr_contact,
            approved: false,
            active: true,
            blacklisted: false,
            created_at: self.created_at,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewDrive {
    pub company_id: CompanyId,
    pub job_title: String,
    pub job_description: Option<String>,
    pub eligibility_criteria: Option<String>,
    pub min_cgpa: Option<f32>,
    pub application_deadline: NaiveDate,
    pub created_at: DateTime<Utc>,
}

impl NewDrive {
    pub fn with_id(self, id: DriveId) -> PlacementDrive {
        PlacementDrive {
            id,
            company_id: self.company_id,
            job_title: self.job_title,
            job_description: self.job_description,
            eligibility_criteria: self.eligibility_criteria,
            min_cgpa: self.min_cgpa,
            application_deadline: self.application_deadline,
            status: DriveStatus::Pending,
            created_at: self.created_at,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct NewApplication {
    pub student_id: StudentId,
    pub drive_id: DriveId,
    pub applied_at: DateTime<Utc>,
}

impl NewApplication {
    pub fn with_id(self, id: ApplicationId) -> Application {
        Application {
            id,
            student_id: self.student_id,
            drive_id: self.drive_id,
            applied_at: self.applied_at,
            status: ApplicationStatus::Applied,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewPlacement {
    pub student_id: StudentId,
    pub company_id: CompanyId,
    pub drive_id: DriveId,
    pub position: Option<String>,
    pub package: Option<f64>,
    pub placement_date: NaiveDate,
}

impl NewPlacement {
    pub fn with_id(self, id: PlacementId, application_id: ApplicationId) -> Placement {
        Placement {
            id,
            application_id,
            student_id: self.student_id,
            company_id: self.company_id,
            drive_id: self.drive_id,
            position: self.position,
            package: self.package,
            placement_date: self.placement_date,
            status: PlacementStatus::Placed,
        }
    }
}
