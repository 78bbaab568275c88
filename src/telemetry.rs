//! Telemetry metric name constants.
//!
//! Centralised metric names for the request pipeline. Deployments install
//! their own `metrics` recorder (e.g. prometheus, statsd); without a
//! recorder installed, all metric calls are no-ops.
//!
//! # Metric naming conventions
//!
//! All metrics are prefixed with `tweeter_`. Counters end in `_total`,
//! histograms use meaningful units (e.g. `_seconds`).
//!
//! # Common labels
//!
//! - `status`: HTTP status code returned for the request (e.g. "201")
//! - `mode`: publish mode: "live" or "log_only"

/// Total `/tweet` requests handled.
///
/// Labels: `status`.
pub const REQUESTS_TOTAL: &str = "tweeter_requests_total";

/// End-to-end `/tweet` handling time in seconds.
///
/// Labels: `status`.
pub const REQUEST_DURATION_SECONDS: &str = "tweeter_request_duration_seconds";

/// Recognition calls that failed and fell back to the untitled caption.
pub const RECOGNITION_FAILURES_TOTAL: &str = "tweeter_recognition_failures_total";

/// Time spent in the publish backend, in seconds.
///
/// Labels: `mode`.
pub const PUBLISH_DURATION_SECONDS: &str = "tweeter_publish_duration_seconds";
