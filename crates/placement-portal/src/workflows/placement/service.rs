use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use super::access::{self, Action, Decision, DenialReason, Target};
use super::applications::{self, StatusUpdate};
use super::clock::{Clock, SystemClock};
use super::credentials::{hash_secret, verify_secret};
use super::domain::{
    normalize_email, Account, Admin, Application, ApplicationId, ApplicationStatus, Company,
    CompanyId, CompanyRegistration, DriveDraft, DriveId, DriveStatus, EntityKind, PlacementDrive,
    PlacementTerms, Principal, Role, Student, StudentId, StudentRegistration,
};
use super::drives::{self, MAX_CGPA};
use super::error::PortalError;
use super::notices::{NoticePublisher, PortalNotice};
use super::repository::{
    NewAdmin, NewCompany, NewStudent, PortalRepository, PortalTotals, RepositoryError,
};
use crate::config::BootstrapAdmin;

/// Entry point for the calling layer: every operation takes the acting principal explicitly,
/// runs it through the access gate and then the relevant lifecycle manager.
pub struct PlacementPortalService<R, N> {
    repository: Arc<R>,
    notices: Arc<N>,
    clock: Arc<dyn Clock>,
}

/// Admin dashboard snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct AdminOverview {
    pub totals: PortalTotals,
    pub pending_companies: Vec<Company>,
    pub pending_drives: Vec<PlacementDrive>,
}

impl<R, N> PlacementPortalService<R, N>
where
    R: PortalRepository + 'static,
    N: NoticePublisher + 'static,
{
    pub fn new(repository: Arc<R>, notices: Arc<N>) -> Self {
        Self::with_clock(repository, notices, Arc::new(SystemClock))
    }

    pub fn with_clock(repository: Arc<R>, notices: Arc<N>, clock: Arc<dyn Clock>) -> Self {
        Self {
            repository,
            notices,
            clock,
        }
    }

    /// Ensures the configured administrator exists. Safe to call on every start.
    pub fn bootstrap_admin(&self, admin: &BootstrapAdmin) -> Result<Admin, PortalError> {
        let username = require_text("username", &admin.username)?;
        if let Some(existing) = self.find_admin(&username)? {
            debug!(%username, "bootstrap administrator already present");
            return Ok(existing);
        }

        require_secret(&admin.password)?;
        let created = self.repository.insert_admin(NewAdmin {
            username: username.clone(),
            email: normalize_email(&admin.email),
            secret_hash: hash_secret(&admin.password)?,
            created_at: self.clock.now(),
        });

        match created {
            Ok(created) => {
                info!(%username, admin_id = %created.id, "bootstrap administrator created");
                Ok(created)
            }
            // A concurrent bootstrap won the insert.
            Err(RepositoryError::Conflict) => self
                .find_admin(&username)?
                .ok_or(PortalError::Storage(RepositoryError::Conflict)),
            Err(other) => Err(other.into()),
        }
    }

    /// Checks credentials only; account standing is enforced per action by the gate.
    pub fn authenticate(
        &self,
        role: Role,
        identifier: &str,
        secret: &str,
    ) -> Result<Principal, PortalError> {
        let key = match role {
            Role::Admin => identifier.trim().to_string(),
            Role::Student | Role::Company => normalize_email(identifier),
        };

        let Some(account) = self.repository.find_by_login_key(role, &key)? else {
            debug!(%role, "login key not found");
            return Err(PortalError::AuthFailure);
        };

        if !verify_secret(account.secret_hash(), secret) {
            debug!(%role, "secret verification failed");
            return Err(PortalError::AuthFailure);
        }

        let principal = account.principal();
        info!(%principal, "principal authenticated");
        Ok(principal)
    }

    /// Gate decision for `principal`. `Err` only for storage failures.
    pub fn authorize(
        &self,
        principal: Principal,
        action: Action,
        target: &Target<'_>,
    ) -> Result<Decision, PortalError> {
        Ok(match self.resolve(principal)? {
            Some(account) => access::authorize(&account, action, target),
            None => Decision::Denied(DenialReason::NotFound),
        })
    }

    pub fn view_profile(&self, principal: Principal) -> Result<Account, PortalError> {
        self.admit(principal, Action::ViewProfile)
    }

    pub fn register_student(
        &self,
        registration: StudentRegistration,
    ) -> Result<Student, PortalError> {
        let name = require_text("name", &registration.name)?;
        let email = require_email(&registration.email)?;
        require_secret(&registration.secret)?;
        if let Some(cgpa) = registration.cgpa {
            require_cgpa("cgpa", cgpa)?;
        }

        let created = self.repository.insert_student(NewStudent {
            name,
            email,
            secret_hash: hash_secret(&registration.secret)?,
            phone: optional_text(registration.phone),
            department: optional_text(registration.department),
            year: registration.year,
            cgpa: registration.cgpa,
            created_at: self.clock.now(),
        });

        match created {
            Ok(student) => {
                info!(student_id = %student.id, "student registered");
                Ok(student)
            }
            Err(RepositoryError::Conflict) => Err(PortalError::DuplicateEmail),
            Err(other) => Err(other.into()),
        }
    }

    /// New companies start unapproved.
    pub fn register_company(
        &self,
        registration: CompanyRegistration,
    ) -> Result<Company, PortalError> {
        let name = require_text("name", &registration.name)?;
        let contact_email = require_email(&registration.email)?;
        require_secret(&registration.secret)?;

        let created = self.repository.insert_company(NewCompany {
            name,
            contact_email,
            secret_hash: hash_secret(&registration.secret)?,
            description: optional_text(registration.description),
            website: optional_text(registration.website),
            hr_contact: optional_text(registration.hr_contact),
            created_at: self.clock.now(),
        });

        match created {
            Ok(company) => {
                info!(company_id = %company.id, "company registered, awaiting approval");
                Ok(company)
            }
            Err(RepositoryError::Conflict) => Err(PortalError::DuplicateEmail),
            Err(other) => Err(other.into()),
        }
    }

    pub fn change_student_password(
        &self,
        principal: Principal,
        current: &str,
        replacement: &str,
    ) -> Result<(), PortalError> {
        let Account::Student(student) = self.admit(principal, Action::ChangePassword)? else {
            return Err(PortalError::Denied(DenialReason::Role));
        };

        if !verify_secret(&student.secret_hash, current) {
            return Err(PortalError::AuthFailure);
        }
        require_secret(replacement)?;

        let replaced = self.repository.replace_student_secret(
            student.id,
            &student.secret_hash,
            hash_secret(replacement)?,
        );
        match replaced {
            Ok(student) => {
                info!(student_id = %student.id, "student password changed");
                Ok(())
            }
            // The secret changed after it was verified, so `current` no longer holds.
            Err(RepositoryError::StaleWrite) => Err(PortalError::AuthFailure),
            Err(RepositoryError::NotFound) => Err(PortalError::NotFound(EntityKind::Student)),
            Err(other) => Err(other.into()),
        }
    }

    pub fn approve_company(
        &self,
        principal: Principal,
        company_id: CompanyId,
    ) -> Result<Company, PortalError> {
        let account = self.admit(principal, Action::ApproveCompany)?;
        let company = self.load_company(company_id)?;
        self.permit(&account, Action::ApproveCompany, &Target::Company(&company))?;

        if company.approved {
            return Ok(company);
        }

        let company = self.repository.set_company_approved(company.id)?;
        info!(company_id = %company.id, by = %principal, "company approved");
        self.announce(PortalNotice::CompanyApproved {
            company_id: company.id,
            by: principal,
        });
        Ok(company)
    }

    pub fn set_company_blacklist(
        &self,
        principal: Principal,
        company_id: CompanyId,
        blacklisted: bool,
    ) -> Result<Company, PortalError> {
        let account = self.admit(principal, Action::SetCompanyBlacklist)?;
        let company = self.load_company(company_id)?;
        self.permit(
            &account,
            Action::SetCompanyBlacklist,
            &Target::Company(&company),
        )?;

        if company.blacklisted == blacklisted {
            return Ok(company);
        }

        let company = self
            .repository
            .set_company_blacklisted(company.id, blacklisted)?;
        info!(company_id = %company.id, blacklisted, by = %principal, "company blacklist updated");
        self.announce(PortalNotice::CompanyBlacklistChanged {
            company_id: company.id,
            blacklisted,
            by: principal,
        });
        Ok(company)
    }

    pub fn set_student_blacklist(
        &self,
        principal: Principal,
        student_id: StudentId,
        blacklisted: bool,
    ) -> Result<Student, PortalError> {
        let account = self.admit(principal, Action::SetStudentBlacklist)?;
        let student = self.load_student(student_id)?;
        self.permit(
            &account,
            Action::SetStudentBlacklist,
            &Target::Student(&student),
        )?;

        if student.blacklisted == blacklisted {
            return Ok(student);
        }

        let student = self
            .repository
            .set_student_blacklisted(student.id, blacklisted)?;
        info!(student_id = %student.id, blacklisted, by = %principal, "student blacklist updated");
        self.announce(PortalNotice::StudentBlacklistChanged {
            student_id: student.id,
            blacklisted,
            by: principal,
        });
        Ok(student)
    }

    pub fn admin_overview(&self, principal: Principal) -> Result<AdminOverview, PortalError> {
        self.admit(principal, Action::ViewAdminOverview)?;
        Ok(AdminOverview {
            totals: self.repository.totals()?,
            pending_companies: self.repository.companies_pending_approval()?,
            pending_drives: self.repository.drives_with_status(DriveStatus::Pending)?,
        })
    }

    pub fn create_drive(
        &self,
        principal: Principal,
        draft: DriveDraft,
    ) -> Result<PlacementDrive, PortalError> {
        let Account::Company(company) = self.admit(principal, Action::CreateDrive)? else {
            return Err(PortalError::Denied(DenialReason::Role));
        };

        let drive = drives::create_drive(&*self.repository, company.id, draft, self.clock.now())?;
        info!(drive_id = %drive.id, company_id = %company.id, "placement drive created");
        Ok(drive)
    }

    pub fn set_drive_status(
        &self,
        principal: Principal,
        drive_id: DriveId,
        status: DriveStatus,
    ) -> Result<PlacementDrive, PortalError> {
        let account = self.admit(principal, Action::SetDriveStatus)?;
        let drive = self.load_drive(drive_id)?;
        self.permit(&account, Action::SetDriveStatus, &Target::Drive(&drive))?;

        let (from, drive) = drives::transition_drive(&*self.repository, &drive, status)?;
        info!(drive_id = %drive.id, from = from.label(), to = status.label(), "drive status changed");
        self.announce(PortalNotice::DriveStatusChanged {
            drive_id: drive.id,
            from,
            to: status,
            by: principal,
        });
        Ok(drive)
    }

    pub fn company_drives(&self, principal: Principal) -> Result<Vec<PlacementDrive>, PortalError> {
        let Account::Company(company) = self.admit(principal, Action::ViewOwnDrives)? else {
            return Err(PortalError::Denied(DenialReason::Role));
        };
        Ok(self.repository.drives_for_company(company.id)?)
    }

    /// Drives currently accepting applications.
    pub fn open_drives(&self, principal: Principal) -> Result<Vec<PlacementDrive>, PortalError> {
        self.admit(principal, Action::ViewOpenDrives)?;
        Ok(self.repository.drives_with_status(DriveStatus::Approved)?)
    }

    pub fn drive_applications(
        &self,
        principal: Principal,
        drive_id: DriveId,
    ) -> Result<Vec<Application>, PortalError> {
        let account = self.admit(principal, Action::ViewDriveApplications)?;
        let drive = self.load_drive(drive_id)?;
        self.permit(&account, Action::ViewDriveApplications, &Target::Drive(&drive))?;
        Ok(self.repository.applications_for_drive(drive.id)?)
    }

    #[instrument(level = "debug", skip(self), fields(principal = %principal))]
    pub fn apply_to_drive(
        &self,
        principal: Principal,
        drive_id: DriveId,
    ) -> Result<Application, PortalError> {
        let account = self.admit(principal, Action::Apply)?;
        let drive = self.load_drive(drive_id)?;
        self.permit(&account, Action::Apply, &Target::Drive(&drive))?;
        let Account::Student(student) = account else {
            return Err(PortalError::Denied(DenialReason::Role));
        };

        let application = applications::create_application(
            &*self.repository,
            &student,
            &drive,
            self.clock.now(),
        )?;
        info!(
            application_id = %application.id,
            student_id = %student.id,
            drive_id = %drive.id,
            "application submitted"
        );
        Ok(application)
    }

    pub fn student_applications(
        &self,
        principal: Principal,
    ) -> Result<Vec<Application>, PortalError> {
        let Account::Student(student) = self.admit(principal, Action::ViewOwnApplications)? else {
            return Err(PortalError::Denied(DenialReason::Role));
        };
        Ok(self.repository.applications_for_student(student.id)?)
    }

    /// Moves an application along its lifecycle. `terms` is only read for `Placed`.
    #[instrument(level = "debug", skip(self, terms), fields(principal = %principal))]
    pub fn set_application_status(
        &self,
        principal: Principal,
        application_id: ApplicationId,
        status: ApplicationStatus,
        terms: PlacementTerms,
    ) -> Result<StatusUpdate, PortalError> {
        let account = self.admit(principal, Action::SetApplicationStatus)?;
        let application = self
            .repository
            .application(application_id)?
            .ok_or(PortalError::NotFound(EntityKind::Application))?;
        let drive = self.load_drive(application.drive_id)?;
        self.permit(
            &account,
            Action::SetApplicationStatus,
            &Target::Application {
                application: &application,
                drive: &drive,
            },
        )?;

        let update = applications::set_status(
            &*self.repository,
            &application,
            &drive,
            status,
            terms,
            self.clock.today(),
        )?;

        info!(
            application_id = %update.application.id,
            from = update.previous.label(),
            to = update.application.status.label(),
            "application status changed"
        );
        self.announce(PortalNotice::ApplicationStatusChanged {
            application_id: update.application.id,
            from: update.previous,
            to: update.application.status,
            by: principal,
        });
        if let Some(placement) = &update.placement {
            info!(placement_id = %placement.id, "placement recorded");
            self.announce(PortalNotice::PlacementRecorded {
                placement_id: placement.id,
                student_id: placement.student_id,
                drive_id: placement.drive_id,
            });
        }
        Ok(update)
    }

    fn resolve(&self, principal: Principal) -> Result<Option<Account>, PortalError> {
        let account = match principal {
            Principal::Admin(id) => self.repository.admin(id)?.map(Account::Admin),
            Principal::Student(id) => self.repository.student(id)?.map(Account::Student),
            Principal::Company(id) => self.repository.company(id)?.map(Account::Company),
        };
        Ok(account)
    }

    /// Resolves the principal and applies the target-independent gate rules.
    fn admit(&self, principal: Principal, action: Action) -> Result<Account, PortalError> {
        let Some(account) = self.resolve(principal)? else {
            warn!(%principal, %action, "principal has no account record");
            return Err(PortalError::Denied(DenialReason::NotFound));
        };
        enforce(access::check_standing(&account, action), principal, action)?;
        Ok(account)
    }

    fn permit(
        &self,
        account: &Account,
        action: Action,
        target: &Target<'_>,
    ) -> Result<(), PortalError> {
        enforce(
            access::authorize(account, action, target),
            account.principal(),
            action,
        )
    }

    fn announce(&self, notice: PortalNotice) {
        let template = notice.template();
        if let Err(err) = self.notices.publish(notice) {
            warn!(template, error = %err, "failed to publish portal notice");
        }
    }

    fn find_admin(&self, username: &str) -> Result<Option<Admin>, PortalError> {
        Ok(
            match self.repository.find_by_login_key(Role::Admin, username)? {
                Some(Account::Admin(admin)) => Some(admin),
                _ => None,
            },
        )
    }

    fn load_company(&self, id: CompanyId) -> Result<Company, PortalError> {
        self.repository
            .company(id)?
            .ok_or(PortalError::NotFound(EntityKind::Company))
    }

    fn load_student(&self, id: StudentId) -> Result<Student, PortalError> {
        self.repository
            .student(id)?
            .ok_or(PortalError::NotFound(EntityKind::Student))
    }

    fn load_drive(&self, id: DriveId) -> Result<PlacementDrive, PortalError> {
        self.repository
            .drive(id)?
            .ok_or(PortalError::NotFound(EntityKind::Drive))
    }
}

fn enforce(decision: Decision, principal: Principal, action: Action) -> Result<(), PortalError> {
    if let Decision::Denied(reason) = decision {
        warn!(%principal, %action, %reason, "action denied");
    }
    decision.into_result()
}

fn require_text(field: &'static str, value: &str) -> Result<String, PortalError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(PortalError::invalid(field, "must not be empty"));
    }
    Ok(trimmed.to_string())
}

fn require_email(raw: &str) -> Result<String, PortalError> {
    let email = normalize_email(raw);
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(email),
        _ => Err(PortalError::invalid("email", "must be a valid e-mail address")),
    }
}

fn require_secret(secret: &str) -> Result<(), PortalError> {
    if secret.is_empty() {
        return Err(PortalError::invalid("secret", "must not be empty"));
    }
    Ok(())
}

fn require_cgpa(field: &'static str, cgpa: f32) -> Result<(), PortalError> {
    if (0.0..=MAX_CGPA).contains(&cgpa) {
        Ok(())
    } else {
        Err(PortalError::invalid(field, "must be between 0 and 10"))
    }
}

fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
