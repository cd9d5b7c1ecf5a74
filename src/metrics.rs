//! Prometheus counters for the payment lifecycle.
//!
//! The recorder is installed once in `main`; the handle renders the
//! scrape endpoint. Everything else is fire-and-forget counters called
//! from the services.

use metrics::counter;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::time::Duration;

/// Install the Prometheus recorder and spawn its upkeep task.
pub fn init_metrics() -> PrometheusHandle {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .expect("Failed to install Prometheus recorder");

    let upkeep_handle = handle.clone();
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(Duration::from_secs(5)).await;
            upkeep_handle.run_upkeep();
        }
    });

    handle
}

pub fn track_intent_created() {
    counter!("bursar_payment_intents_created_total").increment(1);
}

pub fn track_payment_confirmed(amount_minor: i64) {
    counter!("bursar_payments_confirmed_total").increment(1);
    counter!("bursar_payments_confirmed_minor_total").increment(amount_minor.max(0) as u64);
}

pub fn track_payment_failed() {
    counter!("bursar_payments_failed_total").increment(1);
}

pub fn track_callback_replayed() {
    counter!("bursar_callbacks_replayed_total").increment(1);
}

pub fn track_signature_rejected() {
    counter!("bursar_callback_signature_rejections_total").increment(1);
}
