//! Prometheus metrics exposition
//!
//! Installs the global recorder the library counters feed into:
//!
//! - `pool_available_requests` (gauge)
//! - `pool_fabrication_requests_total` (counter)
//! - `pool_fabrication_responses_total` (counter): label `outcome`
//! - `pool_accounts_deactivated_total` (counter)
//! - `gateway_fabrication_webhooks_total` (counter): label `result`

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

/// Install the Prometheus recorder and return a handle for rendering metrics.
///
/// The handle's `render()` method produces the Prometheus text exposition
/// format served on the `/metrics` endpoint.
pub fn install_recorder() -> PrometheusHandle {
    PrometheusBuilder::new()
        .install_recorder()
        .expect("failed to install Prometheus recorder")
}

/// Record an inbound fabrication webhook with its handling result.
pub fn record_webhook(result: &str) {
    metrics::counter!("gateway_fabrication_webhooks_total", "result" => result.to_owned())
        .increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;
    use metrics_exporter_prometheus::PrometheusRecorder;

    #[test]
    fn record_functions_do_not_panic_without_recorder() {
        // When no recorder is installed, metrics calls are no-ops.
        record_webhook("accepted");
    }

    /// Create an isolated recorder/handle pair for unit tests, sidestepping
    /// the one-global-recorder-per-process constraint.
    fn isolated_recorder() -> (PrometheusRecorder, PrometheusHandle) {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();
        (recorder, handle)
    }

    #[test]
    fn record_webhook_increments_counter_with_label() {
        let (recorder, handle) = isolated_recorder();
        let _guard = metrics::set_default_local_recorder(&recorder);

        record_webhook("accepted");
        record_webhook("dropped");

        let output = handle.render();
        assert!(
            output.contains("gateway_fabrication_webhooks_total"),
            "rendered output must contain the webhook counter"
        );
        assert!(
            output.contains("result=\"accepted\""),
            "result label must be recorded"
        );
        assert!(
            output.contains("result=\"dropped\""),
            "distinct result values must appear separately"
        );
    }
}
