use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::credentials::SecretHash;

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

entity_id!(
    /// Identifier of an administrator account.
    AdminId
);
entity_id!(
    /// Identifier of a registered student.
    StudentId
);
entity_id!(
    /// Identifier of a registered company.
    CompanyId
);
entity_id!(
    /// Identifier of a placement drive.
    DriveId
);
entity_id!(
    /// Identifier of a student's application to a drive.
    ApplicationId
);
entity_id!(
    /// Identifier of a recorded placement.
    PlacementId
);

/// Closed set of actor roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Student,
    Company,
}

impl Role {
    pub const fn label(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Student => "student",
            Role::Company => "company",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown role '{0}'")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "student" => Ok(Role::Student),
            "company" => Ok(Role::Company),
            _ => Err(UnknownRole(value.to_string())),
        }
    }
}

/// Authenticated actor passed explicitly into every core operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "role", content = "id", rename_all = "snake_case")]
pub enum Principal {
    Admin(AdminId),
    Student(StudentId),
    Company(CompanyId),
}

impl Principal {
    pub const fn role(self) -> Role {
        match self {
            Principal::Admin(_) => Role::Admin,
            Principal::Student(_) => Role::Student,
            Principal::Company(_) => Role::Company,
        }
    }

    /// Rebuilds a principal from the role/id pair carried by the session layer.
    pub const fn from_parts(role: Role, id: u64) -> Self {
        match role {
            Role::Admin => Principal::Admin(AdminId(id)),
            Role::Student => Principal::Student(StudentId(id)),
            Role::Company => Principal::Company(CompanyId(id)),
        }
    }

    pub const fn raw_id(self) -> u64 {
        match self {
            Principal::Admin(AdminId(id))
            | Principal::Student(StudentId(id))
            | Principal::Company(CompanyId(id)) => id,
        }
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.role(), self.raw_id())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Admin {
    pub id: AdminId,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub secret_hash: SecretHash,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Student {
    pub id: StudentId,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub secret_hash: SecretHash,
    pub phone: Option<String>,
    pub department: Option<String>,
    pub year: Option<u8>,
    pub cgpa: Option<f32>,
    pub active: bool,
    pub blacklisted: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Company {
    pub id: CompanyId,
    pub name: String,
    pub contact_email: String,
    #[serde(skip_serializing)]
    pub secret_hash: SecretHash,
    pub description: Option<String>,
    pub website: Option<String>,
    pub hr_contact: Option<String>,
    pub approved: bool,
    pub active: bool,
    pub blacklisted: bool,
    pub created_at: DateTime<Utc>,
}

/// A stored actor record, as resolved from a principal or a login key.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "role", content = "profile", rename_all = "snake_case")]
pub enum Account {
    Admin(Admin),
    Student(Student),
    Company(Company),
}

impl Account {
    pub fn principal(&self) -> Principal {
        match self {
            Account::Admin(admin) => Principal::Admin(admin.id),
            Account::Student(student) => Principal::Student(student.id),
            Account::Company(company) => Principal::Company(company.id),
        }
    }

    pub fn secret_hash(&self) -> &SecretHash {
        match self {
            Account::Admin(admin) => &admin.secret_hash,
            Account::Student(student) => &student.secret_hash,
            Account::Company(company) => &company.secret_hash,
        }
    }

    pub fn blacklisted(&self) -> bool {
        match self {
            Account::Admin(_) => false,
            Account::Student(student) => student.blacklisted,
            Account::Company(company) => company.blacklisted,
        }
    }

    pub fn active(&self) -> bool {
        match self {
            Account::Admin(_) => true,
            Account::Student(student) => student.active,
            Account::Company(company) => company.active,
        }
    }

    /// Only companies carry an approval flag; other roles count as approved.
    pub fn approved(&self) -> bool {
        match self {
            Account::Company(company) => company.approved,
            Account::Admin(_) | Account::Student(_) => true,
        }
    }
}

/// Drive lifecycle. `Approved` is the state in which students may apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DriveStatus {
    Pending,
    #[serde(alias = "Open")]
    Approved,
    Closed,
}

impl DriveStatus {
    pub const fn label(self) -> &'static str {
        match self {
            DriveStatus::Pending => "Pending",
            DriveStatus::Approved => "Approved",
            DriveStatus::Closed => "Closed",
        }
    }

    pub const fn accepts_applications(self) -> bool {
        matches!(self, DriveStatus::Approved)
    }

    pub const fn is_terminal(self) -> bool {
        matches!(self, DriveStatus::Closed)
    }

    pub const fn can_transition_to(self, next: DriveStatus) -> bool {
        matches!(
            (self, next),
            (DriveStatus::Pending, DriveStatus::Approved)
                | (DriveStatus::Pending, DriveStatus::Closed)
                | (DriveStatus::Approved, DriveStatus::Closed)
        )
    }
}

/// Application lifecycle. `Rejected` and `Placed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ApplicationStatus {
    Applied,
    Shortlisted,
    Rejected,
    Placed,
}

impl ApplicationStatus {
    pub const fn label(self) -> &'static str {
        match self {
            ApplicationStatus::Applied => "Applied",
            ApplicationStatus::Shortlisted => "Shortlisted",
            ApplicationStatus::Rejected => "Rejected",
            ApplicationStatus::Placed => "Placed",
        }
    }

    pub const fn is_terminal(self) -> bool {
        matches!(self, ApplicationStatus::Rejected | ApplicationStatus::Placed)
    }

    pub const fn can_transition_to(self, next: ApplicationStatus) -> bool {
        use ApplicationStatus::*;
        matches!(
            (self, next),
            (Applied, Shortlisted)
                | (Applied, Rejected)
                | (Applied, Placed)
                | (Shortlisted, Rejected)
                | (Shortlisted, Placed)
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlacementStatus {
    Pending,
    Placed,
    Rejected,
}

impl PlacementStatus {
    pub const fn label(self) -> &'static str {
        match self {
            PlacementStatus::Pending => "Pending",
            PlacementStatus::Placed => "Placed",
            PlacementStatus::Rejected => "Rejected",
        }
    }

    /// Non-rejected placements occupy the (student, drive) slot.
    pub const fn is_active(self) -> bool {
        !matches!(self, PlacementStatus::Rejected)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PlacementDrive {
    pub id: DriveId,
    pub company_id: CompanyId,
    pub job_title: String,
    pub job_description: Option<String>,
    pub eligibility_criteria: Option<String>,
    pub min_cgpa: Option<f32>,
    pub application_deadline: NaiveDate,
    pub status: DriveStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Application {
    pub id: ApplicationId,
    pub student_id: StudentId,
    pub drive_id: DriveId,
    pub applied_at: DateTime<Utc>,
    pub status: ApplicationStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct Placement {
    pub id: PlacementId,
    pub application_id: ApplicationId,
    pub student_id: StudentId,
    pub company_id: CompanyId,
    pub drive_id: DriveId,
    pub position: Option<String>,
    pub package: Option<f64>,
    pub placement_date: NaiveDate,
    pub status: PlacementStatus,
}

/// Self-registration payload for students.
#[derive(Debug, Clone, Deserialize)]
pub struct StudentRegistration {
    pub name: String,
    pub email: String,
    pub secret: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub year: Option<u8>,
    #[serde(default)]
    pub cgpa: Option<f32>,
}

/// Self-registration payload for companies. Registered companies start unapproved.
#[derive(Debug, Clone, Deserialize)]
pub struct CompanyRegistration {
    pub name: String,
    pub email: String,
    pub secret: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub hr_contact: Option<String>,
}

/// Company-supplied fields for a new drive.
#[derive(Debug, Clone, Deserialize)]
pub struct DriveDraft {
    pub job_title: String,
    #[serde(default)]
    pub job_description: Option<String>,
    #[serde(default)]
    pub eligibility_criteria: Option<String>,
    #[serde(default)]
    pub min_cgpa: Option<f32>,
    pub application_deadline: NaiveDate,
}

/// Offer details captured when an application is marked placed.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PlacementTerms {
    #[serde(default)]
    pub position: Option<String>,
    #[serde(default)]
    pub package: Option<f64>,
}

/// Entity kinds used in not-found and transition errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Admin,
    Student,
    Company,
    Drive,
    Application,
}

impl EntityKind {
    pub const fn label(self) -> &'static str {
        match self {
            EntityKind::Admin => "admin",
            EntityKind::Student => "student",
            EntityKind::Company => "company",
            EntityKind::Drive => "drive",
            EntityKind::Application => "application",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Normalizes login keys so uniqueness is case-insensitive.
pub fn normalize_email(raw: &str) -> String {
    raw.trim().to_ascii_lowercase()
}
