use lazy_static::lazy_static;
use prometheus::{
    CounterVec, Gauge, HistogramVec, register_counter_vec, register_gauge, register_histogram_vec,
};

lazy_static! {
    pub static ref REQUEST_TOTAL: CounterVec = register_counter_vec!(
        "wimage_requests_total",
        "Requests that passed the gate, by endpoint",
        &["endpoint"]
    )
    .unwrap();
    pub static ref GATE_REJECTIONS: CounterVec = register_counter_vec!(
        "wimage_gate_rejections_total",
        "Requests refused before reaching a handler",
        &["reason"]
    )
    .unwrap();
    pub static ref UPSTREAM_LATENCY: HistogramVec = register_histogram_vec!(
        "wimage_upstream_latency_seconds",
        "Latency of calls to third-party services in seconds",
        &["upstream"]
    )
    .unwrap();
    pub static ref RATE_LIMIT_KEYS: Gauge = register_gauge!(
        "wimage_rate_limit_keys",
        "Client keys currently tracked by the rate limiter"
    )
    .unwrap();
}
