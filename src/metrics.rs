use lazy_static::lazy_static;
use prometheus::{Counter, Gauge, Histogram, register_counter, register_gauge, register_histogram};

lazy_static! {
    pub static ref REQUEST_TOTAL: Counter =
        register_counter!("renalplate_requests_total", "Total number of API requests").unwrap();
    pub static ref RATE_LIMITED_TOTAL: Counter = register_counter!(
        "renalplate_rate_limited_total",
        "Requests denied by the rate limiter"
    )
    .unwrap();
    pub static ref UPSTREAM_LATENCY: Histogram = register_histogram!(
        "renalplate_upstream_latency_seconds",
        "Model provider call latency in seconds"
    )
    .unwrap();
    pub static ref PUSH_SENT_TOTAL: Counter = register_counter!(
        "renalplate_push_sent_total",
        "Push notifications delivered"
    )
    .unwrap();
    pub static ref SUBSCRIPTIONS: Gauge = register_gauge!(
        "renalplate_push_subscriptions",
        "Push subscriptions currently registered"
    )
    .unwrap();
}
