// src/metrics.rs
//
// Counter wrappers, compiled to no-ops unless the `observability` feature is
// enabled. Call sites stay unconditional.

#[cfg(feature = "observability")]
pub fn describe_metrics() {
    metrics::describe_counter!(
        "wagelens_candidates_detected_total",
        "Price candidates surviving extraction."
    );
    metrics::describe_counter!(
        "wagelens_filter_rejected_total",
        "Elements rejected by the element-level filter, by reason."
    );
    metrics::describe_counter!(
        "wagelens_parse_rejected_total",
        "Price texts rejected by the parser, by reason."
    );
    metrics::describe_counter!(
        "wagelens_badges_injected_total",
        "Badges inserted next to price elements."
    );
    metrics::describe_counter!(
        "wagelens_prices_replaced_total",
        "Price texts replaced in place."
    );
    metrics::describe_counter!(
        "wagelens_passes_completed_total",
        "Full detect-convert-present passes."
    );
}

#[cfg(not(feature = "observability"))]
pub fn describe_metrics() {}

#[cfg(feature = "observability")]
pub fn increment_candidates_detected() {
    metrics::increment_counter!("wagelens_candidates_detected_total");
}

#[cfg(not(feature = "observability"))]
pub fn increment_candidates_detected() {}

#[cfg(feature = "observability")]
pub fn increment_filter_rejected(reason: &'static str) {
    metrics::increment_counter!("wagelens_filter_rejected_total", "reason" => reason);
}

#[cfg(not(feature = "observability"))]
pub fn increment_filter_rejected(_reason: &'static str) {}

#[cfg(feature = "observability")]
pub fn increment_parse_rejected(reason: &'static str) {
    metrics::increment_counter!("wagelens_parse_rejected_total", "reason" => reason);
}

#[cfg(not(feature = "observability"))]
pub fn increment_parse_rejected(_reason: &'static str) {}

#[cfg(feature = "observability")]
pub fn increment_badges_injected() {
    metrics::increment_counter!("wagelens_badges_injected_total");
}

#[cfg(not(feature = "observability"))]
pub fn increment_badges_injected() {}

#[cfg(feature = "observability")]
pub fn increment_prices_replaced() {
    metrics::increment_counter!("wagelens_prices_replaced_total");
}

#[cfg(not(feature = "observability"))]
pub fn increment_prices_replaced() {}

#[cfg(feature = "observability")]
pub fn increment_pass_completed() {
    metrics::increment_counter!("wagelens_passes_completed_total");
}

#[cfg(not(feature = "observability"))]
pub fn increment_pass_completed() {}
