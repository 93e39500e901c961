//! Tag sets for adapter metrics and spans
//!
//! Cardinality is fixed: requests carry 4 tags, successful responses 5 and
//! failed responses 7. Spans carry the 4 request attributes plus 2 on success
//! or 4 on failure.

use std::time::Duration;

use opentelemetry::KeyValue;

use crate::failure::Classification;
use crate::keys;

/// Identity of one contract operation on one adapter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OperationTags {
    /// Adapter category (`Repository`, `Client`, `Publisher`, ...)
    pub category: &'static str,
    /// Adapter type name
    pub handler: &'static str,
    /// Operation name
    pub method: &'static str,
}

impl OperationTags {
    /// Create the tags for an operation
    pub const fn new(category: &'static str, handler: &'static str, method: &'static str) -> Self {
        Self {
            category,
            handler,
            method,
        }
    }

    /// Layer value, constant for every adapter
    pub const fn layer(&self) -> &'static str {
        crate::LAYER
    }

    /// Span name: `"{layer} {category} {handler}.{method}"`
    pub fn span_name(&self) -> String {
        format!(
            "{} {} {}.{}",
            self.layer(),
            self.category,
            self.handler,
            self.method
        )
    }

    /// The 4 request tags
    pub fn request(&self) -> Vec<KeyValue> {
        let mut tags = Vec::with_capacity(7);
        tags.push(KeyValue::new(keys::REQUEST_LAYER, self.layer()));
        tags.push(KeyValue::new(keys::REQUEST_CATEGORY, self.category));
        tags.push(KeyValue::new(keys::REQUEST_HANDLER, self.handler));
        tags.push(KeyValue::new(keys::REQUEST_HANDLER_METHOD, self.method));
        tags
    }

    /// The 5 tags of a successful response
    pub fn success(&self) -> Vec<KeyValue> {
        let mut tags = self.request();
        tags.push(KeyValue::new(keys::RESPONSE_STATUS, keys::STATUS_SUCCESS));
        tags
    }

    /// The 7 tags of a failed response
    pub fn failure(&self, classification: &Classification) -> Vec<KeyValue> {
        let mut tags = self.request();
        tags.push(KeyValue::new(keys::RESPONSE_STATUS, keys::STATUS_FAILURE));
        tags.extend(error_tags(classification));
        tags
    }
}

/// Span completion attributes for a successful call (2)
pub fn span_success(elapsed: Duration) -> Vec<KeyValue> {
    vec![
        KeyValue::new(keys::RESPONSE_STATUS, keys::STATUS_SUCCESS),
        KeyValue::new(keys::RESPONSE_ELAPSED, elapsed_ms(elapsed)),
    ]
}

/// Span completion attributes for a failed call (4)
pub fn span_failure(elapsed: Duration, classification: &Classification) -> Vec<KeyValue> {
    let mut attributes = vec![
        KeyValue::new(keys::RESPONSE_STATUS, keys::STATUS_FAILURE),
        KeyValue::new(keys::RESPONSE_ELAPSED, elapsed_ms(elapsed)),
    ];
    attributes.extend(error_tags(classification));
    attributes
}

fn error_tags(classification: &Classification) -> [KeyValue; 2] {
    [
        KeyValue::new(keys::ERROR_TYPE, classification.error_type.as_str()),
        KeyValue::new(keys::ERROR_CODE, classification.code.clone()),
    ]
}

/// Duration in fractional milliseconds
pub fn elapsed_ms(elapsed: Duration) -> f64 {
    elapsed.as_secs_f64() * 1_000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::failure::ErrorType;

    const FIND: OperationTags = OperationTags::new("Repository", "PgUserRepository", "find_user");

    fn keys_of(tags: &[KeyValue]) -> Vec<&str> {
        tags.iter().map(|tag| tag.key.as_str()).collect()
    }

    #[test]
    fn span_name_joins_layer_category_handler_and_method() {
        assert_eq!(FIND.span_name(), "adapter Repository PgUserRepository.find_user");
    }

    #[test]
    fn request_tags_use_the_fixed_four_keys() {
        assert_eq!(
            keys_of(&FIND.request()),
            [
                "request.layer",
                "request.category",
                "request.handler",
                "request.handler.method"
            ]
        );
    }

    #[test]
    fn response_tag_cardinality() {
        let classification = Classification::new(ErrorType::Expected, "user.not_found");
        assert_eq!(FIND.success().len(), 5);
        assert_eq!(FIND.failure(&classification).len(), 7);
        assert_eq!(
            keys_of(&FIND.failure(&classification))[4..],
            ["response.status", "error.type", "error.code"]
        );
    }

    #[test]
    fn span_tag_cardinality() {
        let classification = Classification::new(ErrorType::Exceptional, "db.timeout");
        let elapsed = Duration::from_millis(12);
        assert_eq!(FIND.request().len() + span_success(elapsed).len(), 6);
        assert_eq!(
            FIND.request().len() + span_failure(elapsed, &classification).len(),
            8
        );
    }

    #[test]
    fn elapsed_is_reported_in_milliseconds() {
        assert!((elapsed_ms(Duration::from_micros(1_500)) - 1.5).abs() < 1e-9);
    }
}
