use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use super::credentials::SecretHash;
use super::domain::{
    Account, Admin, AdminId, Application, ApplicationId, ApplicationStatus, Company, CompanyId,
    DriveId, DriveStatus, Placement, PlacementDrive, PlacementId, Role, Student, StudentId,
};
use super::repository::{
    IdentityStore, NewAdmin, NewApplication, NewCompany, NewDrive, NewPlacement, NewStudent,
    PortalRepository, PortalTotals, RepositoryError,
};

/// Mutex-backed store. Each trait call holds the lock for its whole duration, so checks and
/// writes inside one call are serialisable.
#[derive(Debug, Default)]
pub struct InMemoryPortalStore {
    tables: Mutex<Tables>,
}

#[derive(Debug, Default)]
struct Tables {
    sequence: u64,
    admins: BTreeMap<AdminId, Admin>,
    students: BTreeMap<StudentId, Student>,
    companies: BTreeMap<CompanyId, Company>,
    drives: BTreeMap<DriveId, PlacementDrive>,
    applications: BTreeMap<ApplicationId, Application>,
    placements: BTreeMap<PlacementId, Placement>,
}

impl Tables {
    fn next_id(&mut self) -> u64 {
        self.sequence += 1;
        self.sequence
    }

    fn active_placement(&self, student_id: StudentId, drive_id: DriveId) -> Option<&Placement> {
        self.placements.values().find(|placement| {
            placement.student_id == student_id
                && placement.drive_id == drive_id
                && placement.status.is_active()
        })
    }
}

impl InMemoryPortalStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> Result<MutexGuard<'_, Tables>, RepositoryError> {
        self.tables
            .lock()
            .map_err(|_| RepositoryError::Unavailable("portal store lock poisoned".to_string()))
    }
}

impl IdentityStore for InMemoryPortalStore {
    fn find_by_login_key(
        &self,
        role: Role,
        key: &str,
    ) -> Result<Option<Account>, RepositoryError> {
        let tables = self.tables()?;
        let account = match role {
            Role::Admin => tables
                .admins
                .values()
                .find(|admin| admin.username == key)
                .cloned()
                .map(Account::Admin),
            Role::Student => tables
                .students
                .values()
                .find(|student| student.email == key)
                .cloned()
                .map(Account::Student),
            Role::Company => tables
                .companies
                .values()
                .find(|company| company.contact_email == key)
                .cloned()
                .map(Account::Company),
        };
        Ok(account)
    }

    fn admin(&self, id: AdminId) -> Result<Option<Admin>, RepositoryError> {
        Ok(self.tables()?.admins.get(&id).cloned())
    }

    fn student(&self, id: StudentId) -> Result<Option<Student>, RepositoryError> {
        Ok(self.tables()?.students.get(&id).cloned())
    }

    fn company(&self, id: CompanyId) -> Result<Option<Company>, RepositoryError> {
        Ok(self.tables()?.companies.get(&id).cloned())
    }
}

impl PortalRepository for InMemoryPortalStore {
    fn insert_admin(&self, admin: NewAdmin) -> Result<Admin, RepositoryError> {
        let mut tables = self.tables()?;
        if tables
            .admins
            .values()
            .any(|existing| existing.username == admin.username)
        {
            return Err(RepositoryError::Conflict);
        }
        let id = AdminId(tables.next_id());
        let record = admin.with_id(id);
        tables.admins.insert(id, record.clone());
        Ok(record)
    }

    fn insert_student(&self, student: NewStudent) -> Result<Student, RepositoryError> {
        let mut tables = self.tables()?;
        if tables
            .students
            .values()
            .any(|existing| existing.email == student.email)
        {
            return Err(RepositoryError::Conflict);
        }
        let id = StudentId(tables.next_id());
        let record = student.with_id(id);
        tables.students.insert(id, record.clone());
        Ok(record)
    }

    fn insert_company(&self, company: NewCompany) -> Result<Company, RepositoryError> {
        let mut tables = self.tables()?;
        if tables
            .companies
            .values()
            .any(|existing| existing.contact_email == company.contact_email)
        {
            return Err(RepositoryError::Conflict);
        }
        let id = CompanyId(tables.next_id());
        let record = company.with_id(id);
        tables.companies.insert(id, record.clone());
        Ok(record)
    }

    fn set_student_blacklisted(
        &self,
        id: StudentId,
        blacklisted: bool,
    ) -> Result<Student, RepositoryError> {
        let mut tables = self.tables()?;
        let student = tables
            .students
            .get_mut(&id)
            .ok_or(RepositoryError::NotFound)?;
        student.blacklisted = blacklisted;
        Ok(student.clone())
    }

    fn replace_student_secret(
        &self,
        id: StudentId,
        expected: &SecretHash,
        replacement: SecretHash,
    ) -> Result<Student, RepositoryError> {
        let mut tables = self.tables()?;
        let student = tables
            .students
            .get_mut(&id)
            .ok_or(RepositoryError::NotFound)?;
        if &student.secret_hash != expected {
            return Err(RepositoryError::StaleWrite);
        }
        student.secret_hash = replacement;
        Ok(student.clone())
    }

    fn set_company_approved(&self, id: CompanyId) -> Result<Company, RepositoryError> {
        let mut tables = self.tables()?;
        let company = tables
            .companies
            .get_mut(&id)
            .ok_or(RepositoryError::NotFound)?;
        company.approved = true;
        Ok(company.clone())
    }

    fn set_company_blacklisted(
        &self,
        id: CompanyId,
        blacklisted: bool,
    ) -> Result<Company, RepositoryError> {
        let mut tables = self.tables()?;
        let company = tables
            .companies
            .get_mut(&id)
            .ok_or(RepositoryError::NotFound)?;
        company.blacklisted = blacklisted;
        Ok(company.clone())
    }

    fn insert_drive(&self, drive: NewDrive) -> Result<PlacementDrive, RepositoryError> {
        let mut tables = self.tables()?;
        if !tables.companies.contains_key(&drive.company_id) {
            return Err(RepositoryError::NotFound);
        }
        let id = DriveId(tables.next_id());
        let record = drive.with_id(id);
        tables.drives.insert(id, record.clone());
        Ok(record)
    }

    fn drive(&self, id: DriveId) -> Result<Option<PlacementDrive>, RepositoryError> {
        Ok(self.tables()?.drives.get(&id).cloned())
    }

    fn update_drive_status(
        &self,
        id: DriveId,
        expected: DriveStatus,
        next: DriveStatus,
    ) -> Result<PlacementDrive, RepositoryError> {
        let mut tables = self.tables()?;
        let drive = tables.drives.get_mut(&id).ok_or(RepositoryError::NotFound)?;
        if drive.status != expected {
            return Err(RepositoryError::StaleWrite);
        }
        drive.status = next;
        Ok(drive.clone())
    }

    fn insert_application(
        &self,
        application: NewApplication,
    ) -> Result<Application, RepositoryError> {
        let mut tables = self.tables()?;
        if !tables.students.contains_key(&application.student_id)
            || !tables.drives.contains_key(&application.drive_id)
        {
            return Err(RepositoryError::NotFound);
        }
        if tables.applications.values().any(|existing| {
            existing.student_id == application.student_id
                && existing.drive_id == application.drive_id
        }) {
            return Err(RepositoryError::Conflict);
        }
        let id = ApplicationId(tables.next_id());
        let record = application.with_id(id);
        tables.applications.insert(id, record.clone());
        Ok(record)
    }

    fn application(&self, id: ApplicationId) -> Result<Option<Application>, RepositoryError> {
        Ok(self.tables()?.applications.get(&id).cloned())
    }

    fn application_for(
        &self,
        student_id: StudentId,
        drive_id: DriveId,
    ) -> Result<Option<Application>, RepositoryError> {
        Ok(self
            .tables()?
            .applications
            .values()
            .find(|application| {
                application.student_id == student_id && application.drive_id == drive_id
            })
            .cloned())
    }

    fn update_application_status(
        &self,
        id: ApplicationId,
        expected: ApplicationStatus,
        next: ApplicationStatus,
    ) -> Result<Application, RepositoryError> {
        let mut tables = self.tables()?;
        let application = tables
            .applications
            .get_mut(&id)
            .ok_or(RepositoryError::NotFound)?;
        if application.status != expected {
            return Err(RepositoryError::StaleWrite);
        }
        application.status = next;
        Ok(application.clone())
    }

    fn commit_placement(
        &self,
        application_id: ApplicationId,
        expected: ApplicationStatus,
        placement: NewPlacement,
    ) -> Result<(Application, Placement), RepositoryError> {
        let mut tables = self.tables()?;
        let current = tables
            .applications
            .get(&application_id)
            .ok_or(RepositoryError::NotFound)?;
        if current.status != expected {
            return Err(RepositoryError::StaleWrite);
        }
        if tables
            .active_placement(placement.student_id, placement.drive_id)
            .is_some()
        {
            return Err(RepositoryError::Conflict);
        }

        // Both checks passed; from here on the two writes cannot fail.
        let placement_id = PlacementId(tables.next_id());
        let placement = placement.with_id(placement_id, application_id);
        tables.placements.insert(placement_id, placement.clone());

        let application = tables
            .applications
            .get_mut(&application_id)
            .ok_or(RepositoryError::NotFound)?;
        application.status = ApplicationStatus::Placed;
        Ok((application.clone(), placement))
    }

    fn active_placement_for(
        &self,
        student_id: StudentId,
        drive_id: DriveId,
    ) -> Result<Option<Placement>, RepositoryError> {
        Ok(self
            .tables()?
            .active_placement(student_id, drive_id)
            .cloned())
    }

    fn companies_pending_approval(&self) -> Result<Vec<Company>, RepositoryError> {
        Ok(self
            .tables()?
            .companies
            .values()
            .filter(|company| !company.approved && !company.blacklisted)
            .cloned()
            .collect())
    }

    fn drives_with_status(
        &self,
        status: DriveStatus,
    ) -> Result<Vec<PlacementDrive>, RepositoryError> {
        Ok(self
            .tables()?
            .drives
            .values()
            .filter(|drive| drive.status == status)
            .cloned()
            .collect())
    }

    fn drives_for_company(&self, id: CompanyId) -> Result<Vec<PlacementDrive>, RepositoryError> {
        Ok(self
            .tables()?
            .drives
            .values()
            .filter(|drive| drive.company_id == id)
            .cloned()
            .collect())
    }

    fn applications_for_student(
        &self,
        id: StudentId,
    ) -> Result<Vec<Application>, RepositoryError> {
        Ok(self
            .tables()?
            .applications
            .values()
            .filter(|application| application.student_id == id)
            .cloned()
            .collect())
    }

    fn applications_for_drive(&self, id: DriveId) -> Result<Vec<Application>, RepositoryError> {
        Ok(self
            .tables()?
            .applications
            .values()
            .filter(|application| application.drive_id == id)
            .cloned()
            .collect())
    }

    fn totals(&self) -> Result<PortalTotals, RepositoryError> {
        let tables = self.tables()?;
        Ok(PortalTotals {
            students: tables.students.len(),
            companies: tables.companies.len(),
            drives: tables.drives.len(),
            applications: tables.applications.len(),
        })
    }
}
