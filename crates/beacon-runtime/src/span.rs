//! Trace span around one delegated adapter call

use std::borrow::Cow;
use std::future::Future;
use std::time::Duration;

use opentelemetry::global::BoxedTracer;
use opentelemetry::trace::{FutureExt, Status, TraceContextExt, Tracer, WithContext};
use opentelemetry::{Context, KeyValue};

use crate::failure::Classification;
use crate::tags::{self, OperationTags};

/// Parent for a new adapter span
///
/// The caller's active span wins; the pipeline's configured parent is used
/// only when nothing is active.
pub fn parent_context(fallback: &Context) -> Context {
    let current = Context::current();
    if current.has_active_span() {
        current
    } else {
        fallback.clone()
    }
}

/// An open adapter span carrying the 4 request attributes
#[derive(Debug)]
pub struct AdapterSpan {
    cx: Context,
}

impl AdapterSpan {
    /// Start a span named `name` under [`parent_context`]
    pub fn start(
        tracer: &BoxedTracer,
        parent: &Context,
        name: impl Into<Cow<'static, str>>,
        operation: &OperationTags,
    ) -> Self {
        let parent = parent_context(parent);
        let span = tracer.start_with_context(name, &parent);
        let cx = parent.with_span(span);
        set_attributes(&cx, operation.request());
        Self { cx }
    }

    /// Context with this span active
    pub fn context(&self) -> &Context {
        &self.cx
    }

    /// Run a synchronous call with this span as the current context
    pub fn in_scope<R>(&self, call: impl FnOnce() -> R) -> R {
        let _guard = self.cx.clone().attach();
        call()
    }

    /// Attach this span to a future so it is current whenever the future is polled
    pub fn instrument<F: Future>(&self, future: F) -> WithContext<F> {
        future.with_context(self.cx.clone())
    }

    /// End the span as successful (`response.status`, `response.elapsed`)
    pub fn succeed(self, elapsed: Duration) {
        set_attributes(&self.cx, tags::span_success(elapsed));
        let span = self.cx.span();
        span.set_status(Status::Ok);
        span.end();
    }

    /// End the span as failed, adding `error.type` and `error.code`
    pub fn fail(self, elapsed: Duration, classification: &Classification) {
        set_attributes(&self.cx, tags::span_failure(elapsed, classification));
        let span = self.cx.span();
        span.set_status(Status::error(classification.code.clone()));
        span.end();
    }
}

fn set_attributes(cx: &Context, attributes: Vec<KeyValue>) {
    let span = cx.span();
    for attribute in attributes {
        span.set_attribute(attribute);
    }
}
