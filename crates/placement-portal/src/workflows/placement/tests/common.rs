use std::sync::{Arc, Mutex};

use axum::body::to_bytes;
use axum::response::Response;
use chrono::{NaiveDate, TimeZone, Utc};
use serde_json::Value;

use crate::config::BootstrapAdmin;
use crate::workflows::placement::credentials::SecretHash;
use crate::workflows::placement::domain::{
    Account, Admin, AdminId, Application, ApplicationId, ApplicationStatus, Company, CompanyId,
    CompanyRegistration, DriveDraft, DriveId, DriveStatus, Placement, PlacementDrive, Principal,
    Role, Student, StudentId, StudentRegistration,
};
use crate::workflows::placement::notices::{NoticeError, NoticePublisher, PortalNotice};
use crate::workflows::placement::repository::{
    IdentityStore, NewAdmin, NewApplication, NewCompany, NewDrive, NewPlacement, NewStudent,
    PortalRepository, PortalTotals, RepositoryError,
};
use crate::workflows::placement::{
    FixedClock, InMemoryNoticePublisher, InMemoryPortalStore, PlacementPortalService,
};

pub(super) type MemoryService =
    PlacementPortalService<InMemoryPortalStore, InMemoryNoticePublisher>;

pub(super) fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, 2).expect("valid date")
}

pub(super) fn deadline() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, 20).expect("valid date")
}

pub(super) fn bootstrap() -> BootstrapAdmin {
    BootstrapAdmin {
        username: "admin".to_string(),
        email: "admin@placement.com".to_string(),
        password: "admin123".to_string(),
    }
}

pub(super) fn student_registration(email: &str, cgpa: Option<f32>) -> StudentRegistration {
    StudentRegistration {
        name: "Priya Raman".to_string(),
        email: email.to_string(),
        secret: "s3cret-pass".to_string(),
        phone: Some("98450 00000".to_string()),
        department: Some("Computer Science".to_string()),
        year: Some(4),
        cgpa,
    }
}

pub(super) fn company_registration(email: &str) -> CompanyRegistration {
    CompanyRegistration {
        name: "Acme Analytics".to_string(),
        email: email.to_string(),
        secret: "hire-us".to_string(),
        description: Some("Data platform vendor".to_string()),
        website: Some("https://acme.example".to_string()),
        hr_contact: None,
    }
}

pub(super) fn draft(min_cgpa: Option<f32>) -> DriveDraft {
    DriveDraft {
        job_title: "Graduate Engineer".to_string(),
        job_description: Some("Backend services".to_string()),
        eligibility_criteria: Some("B.Tech 2026".to_string()),
        min_cgpa,
        application_deadline: deadline(),
    }
}

/// Service over the in-memory store with a fixed clock and the bootstrap admin in place.
pub(super) struct Harness {
    pub(super) service: Arc<MemoryService>,
    pub(super) store: Arc<InMemoryPortalStore>,
    pub(super) notices: Arc<InMemoryNoticePublisher>,
    pub(super) clock: Arc<FixedClock>,
    pub(super) admin: Principal,
}

pub(super) fn harness() -> Harness {
    let store = Arc::new(InMemoryPortalStore::new());
    let notices = Arc::new(InMemoryNoticePublisher::default());
    let clock = Arc::new(FixedClock::on(today()));
    let service = Arc::new(PlacementPortalService::with_clock(
        store.clone(),
        notices.clone(),
        clock.clone(),
    ));
    let admin = service
        .bootstrap_admin(&bootstrap())
        .expect("bootstrap admin");

    Harness {
        service,
        store,
        notices,
        clock,
        admin: Principal::Admin(admin.id),
    }
}

impl Harness {
    pub(super) fn student(&self, email: &str, cgpa: Option<f32>) -> Principal {
        let student = self
            .service
            .register_student(student_registration(email, cgpa))
            .expect("student registers");
        Principal::Student(student.id)
    }

    pub(super) fn pending_company(&self, email: &str) -> Principal {
        let company = self
            .service
            .register_company(company_registration(email))
            .expect("company registers");
        Principal::Company(company.id)
    }

    pub(super) fn approved_company(&self, email: &str) -> Principal {
        let principal = self.pending_company(email);
        let Principal::Company(id) = principal else {
            unreachable!("registered a company")
        };
        self.service
            .approve_company(self.admin, id)
            .expect("admin approves company");
        principal
    }

    pub(super) fn pending_drive(&self, company: Principal, min_cgpa: Option<f32>) -> DriveId {
        self.service
            .create_drive(company, draft(min_cgpa))
            .expect("drive created")
            .id
    }

    pub(super) fn open_drive(&self, company: Principal, min_cgpa: Option<f32>) -> DriveId {
        let drive_id = self.pending_drive(company, min_cgpa);
        self.service
            .set_drive_status(self.admin, drive_id, DriveStatus::Approved)
            .expect("admin approves drive");
        drive_id
    }

    pub(super) fn notice_kinds(&self) -> Vec<&'static str> {
        self.notices
            .events()
            .iter()
            .map(PortalNotice::template)
            .collect()
    }
}

pub(super) fn student_id(principal: Principal) -> StudentId {
    match principal {
        Principal::Student(id) => id,
        other => panic!("expected a student principal, got {other}"),
    }
}

pub(super) fn company_id(principal: Principal) -> CompanyId {
    match principal {
        Principal::Company(id) => id,
        other => panic!("expected a company principal, got {other}"),
    }
}

fn created_at() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 15, 9, 0, 0)
        .single()
        .expect("valid timestamp")
}

pub(super) fn admin_account() -> Account {
    Account::Admin(Admin {
        id: AdminId(1),
        username: "admin".to_string(),
        email: "admin@placement.com".to_string(),
        secret_hash: SecretHash::from_phc("unused"),
        created_at: created_at(),
    })
}

pub(super) fn student_record(id: u64, cgpa: Option<f32>) -> Student {
    Student {
        id: StudentId(id),
        name: format!("Student {id}"),
        email: format!("student{id}@campus.edu"),
        secret_hash: SecretHash::from_phc("unused"),
        phone: None,
        department: Some("Mechanical".to_string()),
        year: Some(3),
        cgpa,
        active: true,
        blacklisted: false,
        created_at: created_at(),
    }
}

pub(super) fn company_record(id: u64, approved: bool) -> Company {
    Company {
        id: CompanyId(id),
        name: format!("Company {id}"),
        contact_email: format!("hr{id}@corp.example"),
        secret_hash: SecretHash::from_phc("unused"),
        description: None,
        website: None,
        hr_contact: None,
        approved,
        active: true,
        blacklisted: false,
        created_at: created_at(),
    }
}

pub(super) fn drive_record(id: u64, company: u64, status: DriveStatus) -> PlacementDrive {
    PlacementDrive {
        id: DriveId(id),
        company_id: CompanyId(company),
        job_title: "Analyst".to_string(),
        job_description: None,
        eligibility_criteria: None,
        min_cgpa: Some(7.0),
        application_deadline: deadline(),
        status,
        created_at: created_at(),
    }
}

pub(super) fn application_record(id: u64, student: u64, drive: u64) -> Application {
    Application {
        id: ApplicationId(id),
        student_id: StudentId(student),
        drive_id: DriveId(drive),
        applied_at: created_at(),
        status: ApplicationStatus::Applied,
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body readable");
    serde_json::from_slice(&bytes).expect("valid json body")
}

/// Publisher whose transport is always down.
#[derive(Default)]
pub(super) struct OfflineNotices;

impl NoticePublisher for OfflineNotices {
    fn publish(&self, _notice: PortalNotice) -> Result<(), NoticeError> {
        Err(NoticeError::Transport("smtp relay offline".to_string()))
    }
}

pub(super) struct UnavailableStore;

fn offline<T>() -> Result<T, RepositoryError> {
    Err(RepositoryError::Unavailable("database offline".to_string()))
}

impl IdentityStore for UnavailableStore {
    fn find_by_login_key(
        &self,
        _role: Role,
        _key: &str,
    ) -> Result<Option<Account>, RepositoryError> {
        offline()
    }

    fn admin(&self, _id: AdminId) -> Result<Option<Admin>, RepositoryError> {
        offline()
    }

    fn student(&self, _id: StudentId) -> Result<Option<Student>, RepositoryError> {
        offline()
    }

    fn company(&self, _id: CompanyId) -> Result<Option<Company>, RepositoryError> {
        offline()
    }
}

impl PortalRepository for UnavailableStore {
    fn insert_admin(&self, _admin: NewAdmin) -> Result<Admin, RepositoryError> {
        offline()
    }

    fn insert_student(&self, _student: NewStudent) -> Result<Student, RepositoryError> {
        offline()
    }

    fn insert_company(&self, _company: NewCompany) -> Result<Company, RepositoryError> {
        offline()
    }

    fn set_student_blacklisted(
        &self,
        _id: StudentId,
        _blacklisted: bool,
    ) -> Result<Student, RepositoryError> {
        offline()
    }

    fn replace_student_secret(
        &self,
        _id: StudentId,
        _expected: &SecretHash,
        _replacement: SecretHash,
    ) -> Result<Student, RepositoryError> {
        offline()
    }

    fn set_company_approved(&self, _id: CompanyId) -> Result<Company, RepositoryError> {
        offline()
    }

    fn set_company_blacklisted(
        &self,
        _id: CompanyId,
        _blacklisted: bool,
    ) -> Result<Company, RepositoryError> {
        offline()
    }

    fn insert_drive(&self, _drive: NewDrive) -> Result<PlacementDrive, RepositoryError> {
        offline()
    }

    fn drive(&self, _id: DriveId) -> Result<Option<PlacementDrive>, RepositoryError> {
        offline()
    }

    fn update_drive_status(
        &self,
        _id: DriveId,
        _expected: DriveStatus,
        _next: DriveStatus,
    ) -> Result<PlacementDrive, RepositoryError> {
        offline()
    }

    fn insert_application(
        &self,
        _application: NewApplication,
    ) -> Result<Application, RepositoryError> {
        offline()
    }

    fn application(&self, _id: ApplicationId) -> Result<Option<Application>, RepositoryError> {
        offline()
    }

    fn application_for(
        &self,
        _student: StudentId,
        _drive: DriveId,
    ) -> Result<Option<Application>, RepositoryError> {
        offline()
    }

    fn update_application_status(
        &self,
        _id: ApplicationId,
        _expected: ApplicationStatus,
        _next: ApplicationStatus,
    ) -> Result<Application, RepositoryError> {
        offline()
    }

    fn commit_placement(
        &self,
        _application_id: ApplicationId,
        _expected: ApplicationStatus,
        _placement: NewPlacement,
    ) -> Result<(Application, Placement), RepositoryError> {
        offline()
    }

    fn active_placement_for(
        &self,
        _student: StudentId,
        _drive: DriveId,
    ) -> Result<Option<Placement>, RepositoryError> {
        offline()
    }

    fn companies_pending_approval(&self) -> Result<Vec<Company>, RepositoryError> {
        offline()
    }

    fn drives_with_status(
        &self,
        _status: DriveStatus,
    ) -> Result<Vec<PlacementDrive>, RepositoryError> {
        offline()
    }

    fn drives_for_company(&self, _id: CompanyId) -> Result<Vec<PlacementDrive>, RepositoryError> {
        offline()
    }

    fn applications_for_student(
        &self,
        _id: StudentId,
    ) -> Result<Vec<Application>, RepositoryError> {
        offline()
    }

    fn applications_for_drive(&self, _id: DriveId) -> Result<Vec<Application>, RepositoryError> {
        offline()
    }

    fn totals(&self) -> Result<PortalTotals, RepositoryError> {
        offline()
    }
}

type PendingWrite = Box<dyn FnOnce(&InMemoryPortalStore) + Send>;

/// In-memory store that commits a queued write right after the next student or company
/// lookup, so a second request lands between an operation's read and its write.
pub(super) struct InterleavingStore {
    inner: Arc<InMemoryPortalStore>,
    pending: Mutex<Option<PendingWrite>>,
}

impl InterleavingStore {
    pub(super) fn new(inner: Arc<InMemoryPortalStore>) -> Self {
        Self {
            inner,
            pending: Mutex::new(None),
        }
    }

    pub(super) fn after_next_lookup(
        &self,
        write: impl FnOnce(&InMemoryPortalStore) + Send + 'static,
    ) {
        *self.pending.lock().expect("pending lock") = Some(Box::new(write));
    }

    fn interleave(&self) {
        let write = self.pending.lock().expect("pending lock").take();
        if let Some(write) = write {
            write(&self.inner);
        }
    }
}

pub(super) type InterleavingService =
    PlacementPortalService<InterleavingStore, InMemoryNoticePublisher>;

pub(super) struct Interleaved {
    pub(super) service: Arc<InterleavingService>,
    pub(super) store: Arc<InterleavingStore>,
    pub(super) admin: Principal,
}

/// Service over an [`InterleavingStore`] with the bootstrap admin in place.
pub(super) fn interleaved() -> Interleaved {
    let store = Arc::new(InterleavingStore::new(Arc::new(InMemoryPortalStore::new())));
    let service = Arc::new(PlacementPortalService::with_clock(
        store.clone(),
        Arc::new(InMemoryNoticePublisher::default()),
        Arc::new(FixedClock::on(today())),
    ));
    let admin = service
        .bootstrap_admin(&bootstrap())
        .expect("bootstrap admin");
    Interleaved {
        service,
        store,
        admin: Principal::Admin(admin.id),
    }
}

impl IdentityStore for InterleavingStore {
    fn find_by_login_key(
        &self,
        role: Role,
        key: &str,
    ) -> Result<Option<Account>, RepositoryError> {
        self.inner.find_by_login_key(role, key)
    }

    fn admin(&self, id: AdminId) -> Result<Option<Admin>, RepositoryError> {
        self.inner.admin(id)
    }

    fn student(&self, id: StudentId) -> Result<Option<Student>, RepositoryError> {
        let found = self.inner.student(id);
        self.interleave();
        found
    }

    fn company(&self, id: CompanyId) -> Result<Option<Company>, RepositoryError> {
        let found = self.inner.company(id);
        self.interleave();
        found
    }
}

impl PortalRepository for InterleavingStore {
    fn insert_admin(&self, admin: NewAdmin) -> Result<Admin, RepositoryError> {
        self.inner.insert_admin(admin)
    }

    fn insert_student(&self, student: NewStudent) -> Result<Student, RepositoryError> {
        self.inner.insert_student(student)
    }

    fn insert_company(&self, company: NewCompany) -> Result<Company, RepositoryError> {
        self.inner.insert_company(company)
    }

    fn set_student_blacklisted(
        &self,
        id: StudentId,
        blacklisted: bool,
    ) -> Result<Student, RepositoryError> {
        self.inner.set_student_blacklisted(id, blacklisted)
    }

    fn replace_student_secret(
        &self,
        id: StudentId,
        expected: &SecretHash,
        replacement: SecretHash,
    ) -> Result<Student, RepositoryError> {
        self.inner.replace_student_secret(id, expected, replacement)
    }

    fn set_company_approved(&self, id: CompanyId) -> Result<Company, RepositoryError> {
        self.inner.set_company_approved(id)
    }

    fn set_company_blacklisted(
        &self,
        id: CompanyId,
        blacklisted: bool,
    ) -> Result<Company, RepositoryError> {
        self.inner.set_company_blacklisted(id, blacklisted)
    }

    fn insert_drive(&self, drive: NewDrive) -> Result<PlacementDrive, RepositoryError> {
        self.inner.insert_drive(drive)
    }

    fn drive(&self, id: DriveId) -> Result<Option<PlacementDrive>, RepositoryError> {
        self.inner.drive(id)
    }

    fn update_drive_status(
        &self,
        id: DriveId,
        expected: DriveStatus,
        next: DriveStatus,
    ) -> Result<PlacementDrive, RepositoryError> {
        self.inner.update_drive_status(id, expected, next)
    }

    fn insert_application(
        &self,
        application: NewApplication,
    ) -> Result<Application, RepositoryError> {
        self.inner.insert_application(application)
    }

    fn application(&self, id: ApplicationId) -> Result<Option<Application>, RepositoryError> {
        self.inner.application(id)
    }

    fn application_for(
        &self,
        student: StudentId,
        drive: DriveId,
    ) -> Result<Option<Application>, RepositoryError> {
        self.inner.application_for(student, drive)
    }

    fn update_application_status(
        &self,
        id: ApplicationId,
        expected: ApplicationStatus,
        next: ApplicationStatus,
    ) -> Result<Application, RepositoryError> {
        self.inner.update_application_status(id, expected, next)
    }

    fn commit_placement(
        &self,
        application_id: ApplicationId,
        expected: ApplicationStatus,
        placement: NewPlacement,
    ) -> Result<(Application, Placement), RepositoryError> {
        self.inner.commit_placement(application_id, expected, placement)
    }

    fn active_placement_for(
        &self,
        student: StudentId,
        drive: DriveId,
    ) -> Result<Option<Placement>, RepositoryError> {
        self.inner.active_placement_for(student, drive)
    }

    fn companies_pending_approval(&self) -> Result<Vec<Company>, RepositoryError> {
        self.inner.companies_pending_approval()
    }

    fn drives_with_status(
        &self,
        status: DriveStatus,
    ) -> Result<Vec<PlacementDrive>, RepositoryError> {
        self.inner.drives_with_status(status)
    }

    fn drives_for_company(&self, id: CompanyId) -> Result<Vec<PlacementDrive>, RepositoryError> {
        self.inner.drives_for_company(id)
    }

    fn applications_for_student(
        &self,
        id: StudentId,
    ) -> Result<Vec<Application>, RepositoryError> {
        self.inner.applications_for_student(id)
    }

    fn applications_for_drive(&self, id: DriveId) -> Result<Vec<Application>, RepositoryError> {
        self.inner.applications_for_drive(id)
    }

    fn totals(&self) -> Result<PortalTotals, RepositoryError> {
        self.inner.totals()
    }
}
