//! Metric instruments owned by one adapter pipeline

use std::time::Duration;

use opentelemetry::metrics::{Counter, Histogram, Meter};

use crate::failure::Classification;
use crate::tags::{elapsed_ms, OperationTags};

/// Names of the three instruments of an adapter category
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricNames {
    /// `adapter.{category}.requests`
    pub requests: String,
    /// `adapter.{category}.responses`
    pub responses: String,
    /// `adapter.{category}.duration`
    pub duration: String,
}

impl MetricNames {
    /// Names for a category; the category is lowercased
    pub fn for_category(category: &str) -> Self {
        let prefix = format!("{}.{}", crate::LAYER, category.to_lowercase());
        Self {
            requests: format!("{prefix}.requests"),
            responses: format!("{prefix}.responses"),
            duration: format!("{prefix}.duration"),
        }
    }
}

/// Request/response counters and the duration histogram
///
/// Instruments are built once when the pipeline is constructed and reused for
/// every call.
#[derive(Clone)]
pub struct AdapterInstruments {
    requests: Counter<u64>,
    responses: Counter<u64>,
    duration: Histogram<f64>,
}

impl AdapterInstruments {
    /// Build instruments for a category using the standard names
    pub fn new(meter: &Meter, category: &str) -> Self {
        let names = MetricNames::for_category(category);
        Self::with_names(meter, names.requests, names.responses, names.duration)
    }

    /// Build instruments with explicit names
    pub fn with_names(
        meter: &Meter,
        requests: impl Into<String>,
        responses: impl Into<String>,
        duration: impl Into<String>,
    ) -> Self {
        Self {
            requests: meter
                .u64_counter(requests.into())
                .with_description("Adapter calls started")
                .build(),
            responses: meter
                .u64_counter(responses.into())
                .with_description("Adapter calls completed")
                .build(),
            duration: meter
                .f64_histogram(duration.into())
                .with_description("Adapter call duration")
                .with_unit("ms")
                .build(),
        }
    }

    /// Count a call before it is delegated
    pub fn record_request(&self, operation: &OperationTags) {
        self.requests.add(1, &operation.request());
    }

    /// Count a successful call and record its duration
    pub fn record_success(&self, operation: &OperationTags, elapsed: Duration) {
        let tags = operation.success();
        self.responses.add(1, &tags);
        self.duration.record(elapsed_ms(elapsed), &tags);
    }

    /// Count a failed call and record its duration
    pub fn record_failure(
        &self,
        operation: &OperationTags,
        classification: &Classification,
        elapsed: Duration,
    ) {
        let tags = operation.failure(classification);
        self.responses.add(1, &tags);
        self.duration.record(elapsed_ms(elapsed), &tags);
    }
}

impl std::fmt::Debug for AdapterInstruments {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdapterInstruments").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::failure::ErrorType;

    #[test]
    fn metric_names_lowercase_the_category() {
        let names = MetricNames::for_category("Repository");
        assert_eq!(names.requests, "adapter.repository.requests");
        assert_eq!(names.responses, "adapter.repository.responses");
        assert_eq!(names.duration, "adapter.repository.duration");
    }

    #[test]
    fn recording_against_the_noop_meter_is_harmless() {
        let meter = opentelemetry::global::meter("beacon-runtime-test");
        let instruments = AdapterInstruments::new(&meter, "Client");
        let operation = OperationTags::new("Client", "HttpBillingClient", "charge");

        instruments.record_request(&operation);
        instruments.record_success(&operation, Duration::from_millis(3));
        instruments.record_failure(
            &operation,
            &Classification::new(ErrorType::Expected, "card.declined"),
            Duration::from_millis(4),
        );
    }
}
