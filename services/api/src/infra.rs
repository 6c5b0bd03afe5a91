use chrono::NaiveDate;
use metrics_exporter_prometheus::PrometheusHandle;
use placement_portal::workflows::placement::{NoticeError, NoticePublisher, PortalNotice};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Writes committed portal notices to the log until a mail relay is wired in.
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct TracingNoticePublisher;

impl NoticePublisher for TracingNoticePublisher {
    fn publish(&self, notice: PortalNotice) -> Result<(), NoticeError> {
        let payload = serde_json::to_string(&notice)
            .map_err(|err| NoticeError::Transport(err.to_string()))?;
        info!(template = notice.template(), %payload, "portal notice");
        Ok(())
    }
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}
