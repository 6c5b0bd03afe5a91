use chrono::{Days, NaiveDate, Utc};
use clap::Args;
use placement_portal::config::BootstrapAdmin;
use placement_portal::error::AppError;
use placement_portal::workflows::placement::{
    ApplicationStatus, CompanyRegistration, DriveDraft, DriveStatus, FixedClock,
    InMemoryNoticePublisher, InMemoryPortalStore, PlacementPortalService, PlacementTerms,
    PortalError, Principal, Role, StudentRegistration,
};
use std::sync::Arc;

const DEMO_ADMIN_PASSWORD: &str = "admin123";

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Date the scenario runs on (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) today: Option<NaiveDate>,
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let today = args.today.unwrap_or_else(|| Utc::now().date_naive());
    let deadline = today.checked_add_days(Days::new(14)).unwrap_or(today);

    let notices = Arc::new(InMemoryNoticePublisher::default());
    let portal = PlacementPortalService::with_clock(
        Arc::new(InMemoryPortalStore::new()),
        notices.clone(),
        Arc::new(FixedClock::on(today)),
    );

    println!("Placement season demo ({today})");
    let admin = portal.bootstrap_admin(&BootstrapAdmin {
        username: "admin".to_string(),
        email: "admin@placement.com".to_string(),
        password: DEMO_ADMIN_PASSWORD.to_string(),
    })?;
    let admin = Principal::Admin(admin.id);
    println!("- Bootstrap administrator ready ({admin})");

    let acme = portal.register_company(CompanyRegistration {
        name: "Acme".to_string(),
        email: "talent@acme.example".to_string(),
        secret: "acme-demo".to_string(),
        description: Some("Embedded systems".to_string()),
        website: Some("https://acme.example".to_string()),
        hr_contact: Some("Meera Iyer".to_string()),
    })?;
    let acme_principal = Principal::Company(acme.id);
    println!(
        "- Registered company {} -> approved: {}",
        acme.name, acme.approved
    );

    let draft = DriveDraft {
        job_title: "Graduate Firmware Engineer".to_string(),
        job_description: Some("RTOS and driver work".to_string()),
        eligibility_criteria: Some("ECE / CSE, 2026 batch".to_string()),
        min_cgpa: Some(8.0),
        application_deadline: deadline,
    };
    match portal.create_drive(acme_principal, draft.clone()) {
        Err(PortalError::Denied(reason)) => {
            println!("  Drive creation before approval denied: {reason}")
        }
        Err(err) => return Err(err.into()),
        Ok(_) => println!("  Unexpected: drive created before approval"),
    }

    let overview = portal.admin_overview(admin)?;
    println!(
        "- Admin overview: {} companies awaiting approval",
        overview.pending_companies.len()
    );
    portal.approve_company(admin, acme.id)?;
    println!("  Approved {}", acme.name);

    let drive = portal.create_drive(acme_principal, draft)?;
    println!(
        "- {} posted drive #{} '{}' (min CGPA 8.0, deadline {}) -> {}",
        acme.name,
        drive.id,
        drive.job_title,
        drive.application_deadline,
        drive.status.label()
    );
    let drive = portal.set_drive_status(admin, drive.id, DriveStatus::Approved)?;
    println!("  Admin moved drive to {}", drive.status.label());

    let asha = register_student(&portal, "Asha Menon", "asha@campus.edu", 8.5)?;
    let vikram = register_student(&portal, "Vikram Rao", "vikram@campus.edu", 7.9)?;

    let session = portal.authenticate(Role::Student, "asha@campus.edu", "asha-demo")?;
    println!("- Asha signed in as {session}");

    match portal.apply_to_drive(vikram, drive.id) {
        Err(err @ PortalError::NotEligible(_)) => println!("  Vikram cannot apply: {err}"),
        Err(err) => return Err(err.into()),
        Ok(_) => println!("  Unexpected: Vikram's application accepted"),
    }

    let application = portal.apply_to_drive(asha, drive.id)?;
    println!(
        "  Asha applied -> application #{} {}",
        application.id,
        application.status.label()
    );
    if let Err(err) = portal.apply_to_drive(asha, drive.id) {
        println!("  Second attempt refused: {err}");
    }

    let update = portal.set_application_status(
        acme_principal,
        application.id,
        ApplicationStatus::Shortlisted,
        PlacementTerms::default(),
    )?;
    println!(
        "- {} moved application #{} {} -> {}",
        acme.name,
        application.id,
        update.previous.label(),
        update.application.status.label()
    );

    let update = portal.set_application_status(
        acme_principal,
        application.id,
        ApplicationStatus::Placed,
        PlacementTerms {
            position: Some("Firmware Engineer".to_string()),
            package: Some(1_050_000.0),
        },
    )?;
    if let Some(placement) = &update.placement {
        println!(
            "  Placement #{} recorded on {} ({})",
            placement.id,
            placement.placement_date,
            placement.status.label()
        );
        match serde_json::to_string_pretty(placement) {
            Ok(json) => println!("  Placement payload:\n{json}"),
            Err(err) => println!("  Placement payload unavailable: {err}"),
        }
    }

    let totals = portal.admin_overview(admin)?.totals;
    println!(
        "- Totals: {} students, {} companies, {} drives, {} applications",
        totals.students, totals.companies, totals.drives, totals.applications
    );

    let events = notices.events();
    if events.is_empty() {
        println!("  Notices: none dispatched");
    } else {
        println!("  Notices:");
        for notice in events {
            println!("    - {}", notice.template());
        }
    }

    Ok(())
}

fn register_student(
    portal: &PlacementPortalService<InMemoryPortalStore, InMemoryNoticePublisher>,
    name: &str,
    email: &str,
    cgpa: f32,
) -> Result<Principal, AppError> {
    let first_name = name.split_whitespace().next().unwrap_or(name);
    let student = portal.register_student(StudentRegistration {
        name: name.to_string(),
        email: email.to_string(),
        secret: format!("{}-demo", first_name.to_ascii_lowercase()),
        phone: None,
        department: Some("Electronics".to_string()),
        year: Some(4),
        cgpa: Some(cgpa),
    })?;
    println!("- Registered student {} (CGPA {cgpa:.1})", student.name);
    Ok(Principal::Student(student.id))
}
