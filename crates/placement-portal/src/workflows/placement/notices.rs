use std::sync::{Arc, Mutex};

use serde::Serialize;

use super::domain::{
    ApplicationId, ApplicationStatus, CompanyId, DriveId, DriveStatus, PlacementId, Principal,
    StudentId,
};

/// Committed state change announced to downstream consumers (mailers, audit sinks).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PortalNotice {
    CompanyApproved {
        company_id: CompanyId,
        by: Principal,
    },
    CompanyBlacklistChanged {
        company_id: CompanyId,
        blacklisted: bool,
        by: Principal,
    },
    StudentBlacklistChanged {
        student_id: StudentId,
        blacklisted: bool,
        by: Principal,
    },
    DriveStatusChanged {
        drive_id: DriveId,
        from: DriveStatus,
        to: DriveStatus,
        by: Principal,
    },
    ApplicationStatusChanged {
        application_id: ApplicationId,
        from: ApplicationStatus,
        to: ApplicationStatus,
        by: Principal,
    },
    PlacementRecorded {
        placement_id: PlacementId,
        student_id: StudentId,
        drive_id: DriveId,
    },
}

impl PortalNotice {
    pub const fn template(&self) -> &'static str {
        match self {
            PortalNotice::CompanyApproved { .. } => "company_approved",
            PortalNotice::CompanyBlacklistChanged { .. } => "company_blacklist_changed",
            PortalNotice::StudentBlacklistChanged { .. } => "student_blacklist_changed",
            PortalNotice::DriveStatusChanged { .. } => "drive_status_changed",
            PortalNotice::ApplicationStatusChanged { .. } => "application_status_changed",
            PortalNotice::PlacementRecorded { .. } => "placement_recorded",
        }
    }
}

/// Outbound hook invoked after a state change has been committed.
pub trait NoticePublisher: Send + Sync {
    fn publish(&self, notice: PortalNotice) -> Result<(), NoticeError>;
}

#[derive(Debug, thiserror::Error)]
pub enum NoticeError {
    #[error("notice transport unavailable: {0}")]
    Transport(String),
}

/// Buffers notices in memory so callers can inspect them.
#[derive(Debug, Default, Clone)]
pub struct InMemoryNoticePublisher {
    events: Arc<Mutex<Vec<PortalNotice>>>,
}

impl InMemoryNoticePublisher {
    pub fn events(&self) -> Vec<PortalNotice> {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl NoticePublisher for InMemoryNoticePublisher {
    fn publish(&self, notice: PortalNotice) -> Result<(), NoticeError> {
        self.events
            .lock()
            .map_err(|_| NoticeError::Transport("notice buffer poisoned".to_string()))?
            .push(notice);
        Ok(())
    }
}
