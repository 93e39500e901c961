//! Failure classification for adapter telemetry
//!
//! Failures returned by a wrapped adapter are data, not control flow: the
//! pipeline classifies them into one of three `error.type` buckets and picks a
//! representative `error.code`, then hands the original value back to the
//! caller untouched.
//!
//! Classification never panics. Every branch ends in a fallback that only
//! needs the failure's runtime type name.

use std::fmt;

/// Bucket reported under `error.type`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorType {
    /// A failure wrapping several sub-failures
    Aggregate,
    /// A hard failure carrying an originating fault
    Exceptional,
    /// A domain failure the adapter anticipates (not found, conflict, ...)
    Expected,
}

impl ErrorType {
    /// Tag value for this bucket
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorType::Aggregate => "aggregate",
            ErrorType::Exceptional => "exceptional",
            ErrorType::Expected => "expected",
        }
    }
}

impl fmt::Display for ErrorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of classifying a failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    /// Value of `error.type`
    pub error_type: ErrorType,
    /// Value of `error.code`
    pub code: String,
}

impl Classification {
    /// Create a classification
    pub fn new(error_type: ErrorType, code: impl Into<String>) -> Self {
        Self {
            error_type,
            code: code.into(),
        }
    }
}

/// Structural view of a failure used by [`classify`]
pub enum FailureShape<'a> {
    /// Wraps an ordered collection of sub-failures (possibly empty)
    Aggregate(Vec<&'a dyn AdapterFailure>),
    /// Hard failure; `code` is the originating fault's declared code
    Exceptional {
        /// Declared fault code
        code: String,
    },
    /// Anticipated failure with a declared code
    Expected {
        /// Declared error code
        code: String,
    },
    /// Nothing structural is known about the failure
    Opaque,
}

/// Failure values that generated pipelines can classify
///
/// Every method has a default, so `impl AdapterFailure for MyError {}` is a
/// valid (if coarse) implementation that reports the type name as the code.
pub trait AdapterFailure {
    /// Structural view of this failure
    fn shape(&self) -> FailureShape<'_> {
        FailureShape::Opaque
    }

    /// Whether this failure is a hard/exceptional one
    fn is_exceptional(&self) -> bool {
        matches!(self.shape(), FailureShape::Exceptional { .. })
    }

    /// Runtime type name, used as the code of last resort
    fn type_name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// Classify a failure into an `(error.type, error.code)` pair
///
/// Priority: aggregate, then exceptional, then expected, then the opaque
/// fallback keyed off [`AdapterFailure::is_exceptional`] and the type name.
pub fn classify<F>(failure: &F) -> Classification
where
    F: AdapterFailure + ?Sized,
{
    match failure.shape() {
        FailureShape::Aggregate(errors) => {
            let code = representative(&errors)
                .map(|error| classify(error).code)
                .unwrap_or_else(|| ErrorType::Aggregate.as_str().to_string());
            Classification::new(ErrorType::Aggregate, code)
        }
        FailureShape::Exceptional { code } => Classification::new(ErrorType::Exceptional, code),
        FailureShape::Expected { code } => Classification::new(ErrorType::Expected, code),
        FailureShape::Opaque => {
            let error_type = if failure.is_exceptional() {
                ErrorType::Exceptional
            } else {
                ErrorType::Expected
            };
            Classification::new(error_type, failure.type_name())
        }
    }
}

/// First exceptional sub-failure, else the first sub-failure
fn representative<'a>(errors: &[&'a dyn AdapterFailure]) -> Option<&'a dyn AdapterFailure> {
    errors
        .iter()
        .find(|error| error.is_exceptional())
        .or_else(|| errors.first())
        .copied()
}

/// Dispatch wrapper used by generated code to classify any error type
///
/// `(&Probe(error)).classify_failure()` resolves to [`ClassifyFailure`] when
/// the error implements [`AdapterFailure`] and to [`ClassifyOpaque`] (type name
/// as the code, `expected` bucket) otherwise. Both traits must be in scope.
pub struct Probe<'a, T: ?Sized>(pub &'a T);

/// Classification of failures implementing [`AdapterFailure`]
pub trait ClassifyFailure {
    /// Classify the probed failure
    fn classify_failure(&self) -> Classification;
}

impl<T: AdapterFailure + ?Sized> ClassifyFailure for Probe<'_, T> {
    fn classify_failure(&self) -> Classification {
        classify(self.0)
    }
}

/// Fallback classification of failures that expose no structure
pub trait ClassifyOpaque {
    /// Classify the probed failure
    fn classify_failure(&self) -> Classification;
}

impl<T: ?Sized> ClassifyOpaque for &Probe<'_, T> {
    fn classify_failure(&self) -> Classification {
        Classification::new(ErrorType::Expected, std::any::type_name::<T>())
    }
}

type BoxedSource = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Ready-made failure type for adapter contracts
#[derive(Debug, thiserror::Error)]
pub enum AdapterError {
    /// Anticipated domain failure
    #[error("{code}: {message}")]
    Expected {
        /// Stable error code
        code: String,
        /// Human readable description
        message: String,
    },

    /// Hard failure raised by the infrastructure behind the adapter
    #[error("{code}: {message}")]
    Exceptional {
        /// Code of the originating fault
        code: String,
        /// Human readable description
        message: String,
        /// Originating fault, when one was captured
        #[source]
        source: Option<BoxedSource>,
    },

    /// Several failures collected from one call
    #[error("{} errors occurred", .0.len())]
    Many(Vec<AdapterError>),
}

impl AdapterError {
    /// Create an expected failure
    pub fn expected(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Expected {
            code: code.into(),
            message: message.into(),
        }
    }

    /// Create an exceptional failure without a captured source
    pub fn exceptional(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Exceptional {
            code: code.into(),
            message: message.into(),
            source: None,
        }
    }

    /// Create an exceptional failure from an originating fault
    pub fn from_fault<E>(code: impl Into<String>, fault: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Exceptional {
            code: code.into(),
            message: fault.to_string(),
            source: Some(Box::new(fault)),
        }
    }

    /// Collect several failures into one
    pub fn many(errors: impl IntoIterator<Item = AdapterError>) -> Self {
        Self::Many(errors.into_iter().collect())
    }
}

impl AdapterFailure for AdapterError {
    fn shape(&self) -> FailureShape<'_> {
        match self {
            AdapterError::Expected { code, .. } => FailureShape::Expected { code: code.clone() },
            AdapterError::Exceptional { code, .. } => {
                FailureShape::Exceptional { code: code.clone() }
            }
            AdapterError::Many(errors) => FailureShape::Aggregate(
                errors
                    .iter()
                    .map(|error| error as &dyn AdapterFailure)
                    .collect(),
            ),
        }
    }
}

impl AdapterFailure for std::io::Error {
    fn shape(&self) -> FailureShape<'_> {
        FailureShape::Exceptional {
            code: format!("{:?}", self.kind()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    struct Unstructured;

    impl AdapterFailure for Unstructured {}

    struct Fatal;

    impl AdapterFailure for Fatal {
        fn is_exceptional(&self) -> bool {
            true
        }
    }

    #[test]
    fn expected_failure_reports_declared_code() {
        let error = AdapterError::expected("user.not_found", "no user 42");
        assert_eq!(
            classify(&error),
            Classification::new(ErrorType::Expected, "user.not_found")
        );
    }

    #[test]
    fn exceptional_failure_reports_fault_code() {
        let fault = std::io::Error::new(std::io::ErrorKind::TimedOut, "pool exhausted");
        let error = AdapterError::from_fault("db.timeout", fault);
        assert!(error.is_exceptional());
        assert_eq!(
            classify(&error),
            Classification::new(ErrorType::Exceptional, "db.timeout")
        );
    }

    #[test]
    fn aggregate_of_expected_failures_uses_first_code() {
        let error = AdapterError::many([
            AdapterError::expected("order.invalid_sku", "bad sku"),
            AdapterError::expected("order.invalid_qty", "bad quantity"),
        ]);
        assert_eq!(
            classify(&error),
            Classification::new(ErrorType::Aggregate, "order.invalid_sku")
        );
    }

    #[test]
    fn aggregate_prefers_first_exceptional_failure() {
        let error = AdapterError::many([
            AdapterError::expected("order.invalid_sku", "bad sku"),
            AdapterError::exceptional("broker.unavailable", "no broker"),
            AdapterError::exceptional("broker.timeout", "timed out"),
        ]);
        assert_eq!(
            classify(&error),
            Classification::new(ErrorType::Aggregate, "broker.unavailable")
        );
    }

    #[test]
    fn empty_aggregate_falls_back_to_literal_name() {
        let error = AdapterError::many(Vec::new());
        assert_eq!(
            classify(&error),
            Classification::new(ErrorType::Aggregate, "aggregate")
        );
    }

    #[test]
    fn opaque_failures_use_type_name() {
        let expected = classify(&Unstructured);
        assert_eq!(expected.error_type, ErrorType::Expected);
        assert!(expected.code.ends_with("Unstructured"));

        let exceptional = classify(&Fatal);
        assert_eq!(exceptional.error_type, ErrorType::Exceptional);
        assert!(exceptional.code.ends_with("Fatal"));
    }

    #[test]
    fn io_errors_are_exceptional() {
        let error = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        assert_eq!(
            classify(&error),
            Classification::new(ErrorType::Exceptional, "ConnectionRefused")
        );
    }

    #[test]
    fn probe_prefers_structured_classification() {
        use super::{ClassifyFailure as _, ClassifyOpaque as _};

        let error = AdapterError::expected("cache.miss", "miss");
        let structured = (&Probe(&error)).classify_failure();
        assert_matches!(structured.error_type, ErrorType::Expected);
        assert_eq!(structured.code, "cache.miss");

        let plain = String::from("boom");
        let opaque = (&Probe(&plain)).classify_failure();
        assert_matches!(opaque.error_type, ErrorType::Expected);
        assert_eq!(opaque.code, "alloc::string::String");
    }

    #[test]
    fn classify_accepts_trait_objects() {
        let error = AdapterError::expected("cache.miss", "miss");
        let failure: &dyn AdapterFailure = &error;
        assert_eq!(classify(failure).code, "cache.miss");
    }
}
