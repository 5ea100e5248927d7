use std::sync::OnceLock;

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use crate::core::config::Settings;

static PROM_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

pub(crate) fn init(settings: &Settings) -> anyhow::Result<()> {
    if !settings.telemetry().prometheus_enabled {
        return Ok(());
    }

    let handle = PrometheusBuilder::new().install_recorder()?;
    let _ = PROM_HANDLE.set(handle);
    Ok(())
}

pub(crate) fn render() -> Option<String> {
    PROM_HANDLE.get().map(|handle| handle.render())
}

pub(crate) fn record_http(status: u16, latency_seconds: f64) {
    let status_label = status.to_string();
    metrics::counter!("lms_http_requests_total", "status" => status_label.clone()).increment(1);
    metrics::histogram!("lms_http_request_duration_seconds", "status" => status_label)
        .record(latency_seconds);
}

pub(crate) fn record_bot_event(event: &'static str) {
    metrics::counter!("lms_bot_events_total", "event" => event).increment(1);
}

pub(crate) fn record_rate_limited(scope: &'static str) {
    metrics::counter!("lms_rate_limited_total", "scope" => scope).increment(1);
}
