// persona-chat/src/metrics.rs

use prometheus::{Encoder, IntCounterVec, Registry, TextEncoder};
use lazy_static::lazy_static;
use std::sync::OnceLock;
use axum::response::IntoResponse;
use axum::http::StatusCode;

lazy_static! {
    static ref REGISTRY: Registry = Registry::new();
}
static REQ_COUNTER: OnceLock<IntCounterVec> = OnceLock::new();
static SHEETS_CALLS: OnceLock<IntCounterVec> = OnceLock::new();
static PROFILE_CACHE: OnceLock<IntCounterVec> = OnceLock::new();

pub fn init_metrics() {
    let req_counter = REQ_COUNTER.get_or_init(|| {
        IntCounterVec::new(
            prometheus::opts!("requests_total", "Total requests per route"),
            &["route", "status"],
        )
        .expect("static metric definition")
    });

    let sheets_calls = SHEETS_CALLS.get_or_init(|| {
        IntCounterVec::new(
            prometheus::opts!("sheets_calls_total", "Spreadsheet backend calls"),
            &["op", "outcome"],
        )
        .expect("static metric definition")
    });

    let profile_cache = PROFILE_CACHE.get_or_init(|| {
        IntCounterVec::new(
            prometheus::opts!("profile_cache_total", "Profile cache lookups"),
            &["result"],
        )
        .expect("static metric definition")
    });

    REGISTRY.register(Box::new(req_counter.clone())).ok();
    REGISTRY.register(Box::new(sheets_calls.clone())).ok();
    REGISTRY.register(Box::new(profile_cache.clone())).ok();
}

pub fn inc_request(route: &str, status: &str) {
    if let Some(counter) = REQ_COUNTER.get() {
        counter.with_label_values(&[route, status]).inc();
    }
}

pub fn inc_sheets_call(op: &str, ok: bool) {
    if let Some(counter) = SHEETS_CALLS.get() {
        counter
            .with_label_values(&[op, if ok { "ok" } else { "error" }])
            .inc();
    }
}

pub fn inc_profile_cache(hit: bool) {
    if let Some(counter) = PROFILE_CACHE.get() {
        counter
            .with_label_values(&[if hit { "hit" } else { "miss" }])
            .inc();
    }
}

pub async fn get_metrics() -> impl IntoResponse {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = vec![];
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            [("content-type", "text/plain")],
            format!("failed to encode metrics: {}", e).into_bytes(),
        );
    }

    (
        StatusCode::OK,
        [("content-type", "text/plain; version=0.0.4")],
        buffer,
    )
}
