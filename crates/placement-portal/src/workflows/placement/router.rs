use std::error::Error as _;
use std::sync::Arc;

use axum::{
    extract::{FromRequestParts, Path, State},
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::error;

use super::domain::{
    ApplicationId, ApplicationStatus, CompanyId, CompanyRegistration, DriveDraft, DriveId,
    DriveStatus, PlacementTerms, Principal, Role, StudentId, StudentRegistration,
};
use super::error::PortalError;
use super::notices::NoticePublisher;
use super::repository::PortalRepository;
use super::service::PlacementPortalService;

pub const ROLE_HEADER: &str = "x-portal-role";
pub const PRINCIPAL_HEADER: &str = "x-portal-principal";

type SharedService<R, N> = State<Arc<PlacementPortalService<R, N>>>;

/// Router builder exposing the portal operations as JSON endpoints.
pub fn placement_router<R, N>(service: Arc<PlacementPortalService<R, N>>) -> Router
where
    R: PortalRepository + 'static,
    N: NoticePublisher + 'static,
{
    Router::new()
        .route("/api/v1/auth/login", post(login_handler::<R, N>))
        .route("/api/v1/profile", get(profile_handler::<R, N>))
        .route("/api/v1/students", post(register_student_handler::<R, N>))
        .route("/api/v1/companies", post(register_company_handler::<R, N>))
        .route(
            "/api/v1/students/me/password",
            put(change_password_handler::<R, N>),
        )
        .route(
            "/api/v1/students/me/applications",
            get(student_applications_handler::<R, N>),
        )
        .route(
            "/api/v1/companies/me/drives",
            get(company_drives_handler::<R, N>),
        )
        .route("/api/v1/admin/overview", get(overview_handler::<R, N>))
        .route(
            "/api/v1/admin/companies/:company_id/approve",
            post(approve_company_handler::<R, N>),
        )
        .route(
            "/api/v1/admin/companies/:company_id/blacklist",
            put(company_blacklist_handler::<R, N>),
        )
        .route(
            "/api/v1/admin/students/:student_id/blacklist",
            put(student_blacklist_handler::<R, N>),
        )
        .route(
            "/api/v1/admin/drives/:drive_id/status",
            put(drive_status_handler::<R, N>),
        )
        .route(
            "/api/v1/drives",
            get(open_drives_handler::<R, N>).post(create_drive_handler::<R, N>),
        )
        .route(
            "/api/v1/drives/:drive_id/applications",
            get(drive_applications_handler::<R, N>).post(apply_handler::<R, N>),
        )
        .route(
            "/api/v1/applications/:application_id/status",
            put(application_status_handler::<R, N>),
        )
        .with_state(service)
}

/// Principal asserted by the session layer through the role/principal headers.
#[derive(Debug, Clone, Copy)]
pub struct AuthenticatedPrincipal(pub Principal);

#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthenticatedPrincipal
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = |name: &str| {
            parts
                .headers
                .get(name)
                .and_then(|value| value.to_str().ok())
                .map(str::trim)
        };

        let role = header(ROLE_HEADER).and_then(|raw| raw.parse::<Role>().ok());
        let id = header(PRINCIPAL_HEADER).and_then(|raw| raw.parse::<u64>().ok());

        match (role, id) {
            (Some(role), Some(id)) => Ok(Self(Principal::from_parts(role, id))),
            _ => Err(error_response(PortalError::AuthFailure)),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub role: Role,
    pub identifier: String,
    pub secret: String,
}

#[derive(Debug, Deserialize)]
pub struct PasswordChange {
    pub current: String,
    pub replacement: String,
}

#[derive(Debug, Deserialize)]
pub struct BlacklistRequest {
    pub blacklisted: bool,
}

#[derive(Debug, Deserialize)]
pub struct DriveStatusRequest {
    pub status: DriveStatus,
}

#[derive(Debug, Deserialize)]
pub struct ApplicationStatusRequest {
    pub status: ApplicationStatus,
    #[serde(flatten)]
    pub terms: PlacementTerms,
}

pub(crate) async fn login_handler<R, N>(
    State(service): SharedService<R, N>,
    Json(request): Json<LoginRequest>,
) -> Response
where
    R: PortalRepository + 'static,
    N: NoticePublisher + 'static,
{
    respond(
        StatusCode::OK,
        service
            .authenticate(request.role, &request.identifier, &request.secret)
            .map(|principal| json!({ "principal": principal })),
    )
}

pub(crate) async fn profile_handler<R, N>(
    State(service): SharedService<R, N>,
    AuthenticatedPrincipal(principal): AuthenticatedPrincipal,
) -> Response
where
    R: PortalRepository + 'static,
    N: NoticePublisher + 'static,
{
    respond(StatusCode::OK, service.view_profile(principal))
}

pub(crate) async fn register_student_handler<R, N>(
    State(service): SharedService<R, N>,
    Json(registration): Json<StudentRegistration>,
) -> Response
where
    R: PortalRepository + 'static,
    N: NoticePublisher + 'static,
{
    respond(StatusCode::CREATED, service.register_student(registration))
}

pub(crate) async fn register_company_handler<R, N>(
    State(service): SharedService<R, N>,
    Json(registration): Json<CompanyRegistration>,
) -> Response
where
    R: PortalRepository + 'static,
    N: NoticePublisher + 'static,
{
    respond(StatusCode::CREATED, service.register_company(registration))
}

pub(crate) async fn change_password_handler<R, N>(
    State(service): SharedService<R, N>,
    AuthenticatedPrincipal(principal): AuthenticatedPrincipal,
    Json(change): Json<PasswordChange>,
) -> Response
where
    R: PortalRepository + 'static,
    N: NoticePublisher + 'static,
{
    match service.change_student_password(principal, &change.current, &change.replacement) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn student_applications_handler<R, N>(
    State(service): SharedService<R, N>,
    AuthenticatedPrincipal(principal): AuthenticatedPrincipal,
) -> Response
where
    R: PortalRepository + 'static,
    N: NoticePublisher + 'static,
{
    respond(StatusCode::OK, service.student_applications(principal))
}

pub(crate) async fn company_drives_handler<R, N>(
    State(service): SharedService<R, N>,
    AuthenticatedPrincipal(principal): AuthenticatedPrincipal,
) -> Response
where
    R: PortalRepository + 'static,
    N: NoticePublisher + 'static,
{
    respond(StatusCode::OK, service.company_drives(principal))
}

pub(crate) async fn overview_handler<R, N>(
    State(service): SharedService<R, N>,
    AuthenticatedPrincipal(principal): AuthenticatedPrincipal,
) -> Response
where
    R: PortalRepository + 'static,
    N: NoticePublisher + 'static,
{
    respond(StatusCode::OK, service.admin_overview(principal))
}

pub(crate) async fn approve_company_handler<R, N>(
    State(service): SharedService<R, N>,
    AuthenticatedPrincipal(principal): AuthenticatedPrincipal,
    Path(company_id): Path<u64>,
) -> Response
where
    R: PortalRepository + 'static,
    N: NoticePublisher + 'static,
{
    respond(
        StatusCode::OK,
        service.approve_company(principal, CompanyId(company_id)),
    )
}

pub(crate) async fn company_blacklist_handler<R, N>(
    State(service): SharedService<R, N>,
    AuthenticatedPrincipal(principal): AuthenticatedPrincipal,
    Path(company_id): Path<u64>,
    Json(request): Json<BlacklistRequest>,
) -> Response
where
    R: PortalRepository + 'static,
    N: NoticePublisher + 'static,
{
    respond(
        StatusCode::OK,
        service.set_company_blacklist(principal, CompanyId(company_id), request.blacklisted),
    )
}

pub(crate) async fn student_blacklist_handler<R, N>(
    State(service): SharedService<R, N>,
    AuthenticatedPrincipal(principal): AuthenticatedPrincipal,
    Path(student_id): Path<u64>,
    Json(request): Json<BlacklistRequest>,
) -> Response
where
    R: PortalRepository + 'static,
    N: NoticePublisher + 'static,
{
    respond(
        StatusCode::OK,
        service.set_student_blacklist(principal, StudentId(student_id), request.blacklisted),
    )
}

pub(crate) async fn drive_status_handler<R, N>(
    State(service): SharedService<R, N>,
    AuthenticatedPrincipal(principal): AuthenticatedPrincipal,
    Path(drive_id): Path<u64>,
    Json(request): Json<DriveStatusRequest>,
) -> Response
where
    R: PortalRepository + 'static,
    N: NoticePublisher + 'static,
{
    respond(
        StatusCode::OK,
        service.set_drive_status(principal, DriveId(drive_id), request.status),
    )
}

pub(crate) async fn open_drives_handler<R, N>(
    State(service): SharedService<R, N>,
    AuthenticatedPrincipal(principal): AuthenticatedPrincipal,
) -> Response
where
    R: PortalRepository + 'static,
    N: NoticePublisher + 'static,
{
    respond(StatusCode::OK, service.open_drives(principal))
}

pub(crate) async fn create_drive_handler<R, N>(
    State(service): SharedService<R, N>,
    AuthenticatedPrincipal(principal): AuthenticatedPrincipal,
    Json(draft): Json<DriveDraft>,
) -> Response
where
    R: PortalRepository + 'static,
    N: NoticePublisher + 'static,
{
    respond(StatusCode::CREATED, service.create_drive(principal, draft))
}

pub(crate) async fn drive_applications_handler<R, N>(
    State(service): SharedService<R, N>,
    AuthenticatedPrincipal(principal): AuthenticatedPrincipal,
    Path(drive_id): Path<u64>,
) -> Response
where
    R: PortalRepository + 'static,
    N: NoticePublisher + 'static,
{
    respond(
        StatusCode::OK,
        service.drive_applications(principal, DriveId(drive_id)),
    )
}

pub(crate) async fn apply_handler<R, N>(
    State(service): SharedService<R, N>,
    AuthenticatedPrincipal(principal): AuthenticatedPrincipal,
    Path(drive_id): Path<u64>,
) -> Response
where
    R: PortalRepository + 'static,
    N: NoticePublisher + 'static,
{
    respond(
        StatusCode::CREATED,
        service.apply_to_drive(principal, DriveId(drive_id)),
    )
}

pub(crate) async fn application_status_handler<R, N>(
    State(service): SharedService<R, N>,
    AuthenticatedPrincipal(principal): AuthenticatedPrincipal,
    Path(application_id): Path<u64>,
    Json(request): Json<ApplicationStatusRequest>,
) -> Response
where
    R: PortalRepository + 'static,
    N: NoticePublisher + 'static,
{
    respond(
        StatusCode::OK,
        service.set_application_status(
            principal,
            ApplicationId(application_id),
            request.status,
            request.terms,
        ),
    )
}

fn respond<T: Serialize>(status: StatusCode, result: Result<T, PortalError>) -> Response {
    match result {
        Ok(body) => (status, Json(body)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) fn status_for(err: &PortalError) -> StatusCode {
    match err {
        PortalError::AuthFailure => StatusCode::UNAUTHORIZED,
        PortalError::Denied(_) => StatusCode::FORBIDDEN,
        PortalError::NotFound(_) => StatusCode::NOT_FOUND,
        PortalError::DuplicateEmail
        | PortalError::DuplicateApplication
        | PortalError::DuplicatePlacement
        | PortalError::InvalidTransition { .. } => StatusCode::CONFLICT,
        PortalError::NotEligible(_)
        | PortalError::DriveNotOpen
        | PortalError::InvalidField { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        PortalError::Storage(_) | PortalError::Credential(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

pub(crate) fn error_response(err: PortalError) -> Response {
    let status = status_for(&err);
    if status.is_server_error() {
        let detail = err.source().map(ToString::to_string).unwrap_or_default();
        error!(code = err.code(), %detail, "portal request failed");
    }

    let mut payload = json!({
        "error": err.code(),
        "message": err.to_string(),
    });
    match &err {
        PortalError::Denied(reason) => payload["reason"] = json!(reason.code()),
        PortalError::NotEligible(reason) => payload["reason"] = json!(reason),
        _ => {}
    }

    (status, Json(payload)).into_response()
}
