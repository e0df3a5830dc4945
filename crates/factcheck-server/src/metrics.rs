use once_cell::sync::OnceCell;
use opentelemetry::metrics::{Counter, Histogram, Meter};
use opentelemetry::{KeyValue, global};
use tracing::info;

struct FactCheckMetrics {
    requests: Counter<u64>,
    duration_ms: Histogram<f64>,
}

static METRICS: OnceCell<FactCheckMetrics> = OnceCell::new();

fn handles() -> &'static FactCheckMetrics {
    METRICS.get_or_init(|| {
        let meter: Meter = global::meter("factcheck.server");
        FactCheckMetrics {
            requests: meter
                .u64_counter("factcheck_requests_total")
                .with_description("Fact-check requests by outcome")
                .init(),
            duration_ms: meter
                .f64_histogram("factcheck_duration_ms")
                .with_description("Wall time of the research and analysis stages")
                .init(),
        }
    })
}

fn record(outcome: &'static str, duration_ms: Option<u64>) {
    let metrics = handles();
    let attrs = [KeyValue::new("outcome", outcome)];
    metrics.requests.add(1, &attrs);
    if let Some(duration_ms) = duration_ms {
        metrics.duration_ms.record(duration_ms as f64, &attrs);
    }
}

pub fn check_rejected(reason: &str) {
    record("rejected", None);
    info!(target = "telemetry.server", reason, event = "check_rejected");
}

pub fn check_started(headline_chars: usize) {
    info!(
        target = "telemetry.server",
        headline_chars,
        event = "check_started"
    );
}

pub fn check_completed(duration_ms: u64, verdict: &str, analysis_chars: usize) {
    record("completed", Some(duration_ms));
    info!(
        target = "telemetry.server",
        duration_ms,
        verdict,
        analysis_chars,
        event = "check_completed"
    );
}

pub fn check_failed(duration_ms: u64, error: &str) {
    record("failed", Some(duration_ms));
    info!(
        target = "telemetry.server",
        duration_ms,
        error,
        event = "check_failed"
    );
}
