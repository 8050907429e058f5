//! Pipeline metrics collection.
//!
//! The library only records; installing an exporter is up to the binary.

use metrics::{counter, histogram};

use crate::retry::RetryClass;

/// Metric name constants for consistency.
pub mod names {
    /// Retries scheduled by the retry executor, by operation and class.
    pub const RETRIES_TOTAL: &str = "shotline_retries_total";

    /// Settled generation requests by kind (image, video) and outcome.
    pub const GENERATION_TOTAL: &str = "shotline_generation_total";

    /// Generation latency in seconds by kind.
    pub const GENERATION_SECONDS: &str = "shotline_generation_seconds";

    /// Continuity step results by outcome.
    pub const CONTINUITY_TOTAL: &str = "shotline_continuity_total";
}

/// Generation kinds used as the `kind` label.
pub mod kinds {
    pub const IMAGE: &str = "image";
    pub const VIDEO: &str = "video";
}

/// Continuity outcomes used as the `outcome` label.
pub mod continuity {
    /// Frame written into the next shot
    pub const PROPAGATED: &str = "propagated";
    /// Next shot already had a start frame before extraction
    pub const SKIPPED: &str = "skipped";
    /// Next shot received a start frame while extraction ran
    pub const PREEMPTED: &str = "preempted";
    pub const FAILED: &str = "failed";
    pub const TIMEOUT: &str = "timeout";
}

/// Record a scheduled retry.
pub fn record_retry(operation: &str, class: RetryClass) {
    counter!(
        names::RETRIES_TOTAL,
        "operation" => operation.to_string(),
        "class" => class.as_str()
    )
    .increment(1);
}

/// Record a settled image or video generation.
pub fn record_generation(kind: &'static str, success: bool, latency_secs: f64) {
    let outcome = if success { "completed" } else { "error" };
    counter!(names::GENERATION_TOTAL, "kind" => kind, "outcome" => outcome).increment(1);
    histogram!(names::GENERATION_SECONDS, "kind" => kind).record(latency_secs);
}

/// Record the result of a continuity step.
pub fn record_continuity(outcome: &'static str) {
    counter!(names::CONTINUITY_TOTAL, "outcome" => outcome).increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_names() {
        assert_eq!(names::RETRIES_TOTAL, "shotline_retries_total");
        assert_eq!(names::GENERATION_TOTAL, "shotline_generation_total");
        assert_eq!(names::CONTINUITY_TOTAL, "shotline_continuity_total");
    }

    #[test]
    fn test_recording_without_recorder_is_noop() {
        record_retry("generate_image", RetryClass::RateLimited);
        record_generation(kinds::VIDEO, true, 1.5);
        record_continuity(continuity::SKIPPED);
    }
}
