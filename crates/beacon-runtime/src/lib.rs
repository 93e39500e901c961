//! Beacon runtime support
//!
//! Code emitted by `beacon-codegen` (through the `#[adapter_pipelines]` macro
//! or a build script) calls into this crate to record telemetry around every
//! delegated adapter call:
//!
//! - **Metrics**: `adapter.{category}.requests`, `.responses` and `.duration`
//!   via [`AdapterInstruments`]
//! - **Traces**: one span per call named `"adapter {category} {handler}.{operation}"`
//!   via [`AdapterSpan`]
//! - **Logs**: request/response events under the [`LOG_TARGET`] target via
//!   `tracing`, see [`AdapterLogger`]
//! - **Failures**: [`classify`] maps a returned error onto `error.type` and
//!   `error.code`
//!
//! Generated code only names paths below `::beacon_runtime`, which is why the
//! crate re-exports [`opentelemetry`] and [`tracing`].

#![deny(missing_docs)]

pub mod failure;
pub mod instruments;
pub mod keys;
pub mod logger;
pub mod span;
pub mod tags;

pub use failure::{
    classify, AdapterError, AdapterFailure, Classification, ClassifyFailure, ClassifyOpaque, ErrorType,
    FailureShape, Probe,
};
pub use instruments::{AdapterInstruments, MetricNames};
pub use logger::AdapterLogger;
pub use span::{parent_context, AdapterSpan};
pub use tags::{elapsed_ms, OperationTags};

pub use opentelemetry;
pub use tracing;

/// Layer reported by every generated adapter (`request.layer`)
pub const LAYER: &str = "adapter";

/// `tracing` target of adapter request/response events
pub const LOG_TARGET: &str = "beacon::adapter";
