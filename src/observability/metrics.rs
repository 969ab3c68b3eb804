//! Prometheus metrics.

use crate::{Error, Result};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle, PrometheusRecorder};
use std::net::SocketAddr;

/// Installs the Prometheus recorder.
///
/// With `listen` set the exporter serves `/metrics` on that address from the
/// current tokio runtime; otherwise metrics are only recorded and can be
/// rendered through the returned handle.
///
/// # Errors
///
/// Returns an error if a recorder is already installed or the exporter cannot
/// be built.
pub fn install_prometheus(listen: Option<SocketAddr>) -> Result<PrometheusHandle> {
    let builder = PrometheusBuilder::new();
    let Some(addr) = listen else {
        return builder
            .install_recorder()
            .map_err(|e| Error::operation_failed("metrics_recorder_install", e));
    };
    let runtime = tokio::runtime::Handle::try_current()
        .map_err(|e| Error::operation_failed("metrics_exporter_build", e))?;
    let (recorder, exporter) = {
        let _guard = runtime.enter();
        builder
            .with_http_listener(addr)
            .build()
            .map_err(|e| Error::operation_failed("metrics_exporter_build", e))?
    };
    let handle = recorder.handle();
    set_global_recorder(recorder)?;
    runtime.spawn(exporter);
    tracing::info!(%addr, "Prometheus exporter listening");
    Ok(handle)
}

fn set_global_recorder(recorder: PrometheusRecorder) -> Result<()> {
    metrics::set_global_recorder(recorder)
        .map_err(|e| Error::operation_failed("metrics_recorder_install", e))
}
