//! Authorization and lifecycle-state engine for a campus placement portal.
//!
//! The calling layer authenticates a principal and hands it, together with already-parsed
//! input, to [`workflows::placement::PlacementPortalService`]. The service gates the action,
//! applies the drive/application/placement state machines and returns the updated entity or a
//! typed [`workflows::placement::PortalError`].

pub mod config;
pub mod error;
pub mod telemetry;
pub mod workflows;
