//! In-memory telemetry backends for pipeline tests
//!
//! Log events are captured by a `tracing-subscriber` layer; spans and metric
//! measurements by a tracer and an instrument provider written against the
//! `opentelemetry` API, so nothing is exported.

#![allow(dead_code)]

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::SystemTime;

use beacon_runtime::opentelemetry::global::BoxedTracer;
use beacon_runtime::opentelemetry::metrics::{
    Counter, Histogram, HistogramBuilder, InstrumentBuilder, InstrumentProvider, Meter,
    SyncInstrument,
};
use beacon_runtime::opentelemetry::trace::{Span, SpanBuilder, SpanContext, Status, Tracer};
use beacon_runtime::opentelemetry::{Context, KeyValue};
use beacon_runtime::tracing::field::{Field, Visit};
use beacon_runtime::tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{self, Layer, SubscriberExt};

/// A `tracing` event with its fields rendered to text
#[derive(Debug, Clone)]
pub struct CapturedEvent {
    pub target: String,
    pub level: Level,
    pub fields: BTreeMap<String, String>,
}

impl CapturedEvent {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    pub fn message(&self) -> Option<&str> {
        self.field("message")
    }
}

/// A span that has ended
#[derive(Debug, Clone)]
pub struct FinishedSpan {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub status: Status,
}

impl FinishedSpan {
    pub fn attribute(&self, key: &str) -> Option<&str> {
        lookup(&self.attributes, key)
    }
}

/// One counter increment or histogram sample
#[derive(Debug, Clone)]
pub struct Measurement {
    pub instrument: String,
    pub value: f64,
    pub attributes: Vec<(String, String)>,
}

impl Measurement {
    pub fn attribute(&self, key: &str) -> Option<&str> {
        lookup(&self.attributes, key)
    }
}

/// Shared sinks for everything a pipeline records
#[derive(Clone, Default)]
pub struct Telemetry {
    events: Arc<Mutex<Vec<CapturedEvent>>>,
    spans: Arc<Mutex<Vec<FinishedSpan>>>,
    measurements: Arc<Mutex<Vec<Measurement>>>,
}

impl Telemetry {
    pub fn tracer(&self) -> BoxedTracer {
        BoxedTracer::new(Box::new(RecordingTracer {
            finished: self.spans.clone(),
        }))
    }

    pub fn meter(&self) -> Meter {
        Meter::new(Arc::new(RecordingInstruments {
            measurements: self.measurements.clone(),
        }))
    }

    /// Run `test` with every event captured
    pub fn capture<R>(&self, test: impl FnOnce() -> R) -> R {
        let subscriber = tracing_subscriber::registry().with(CaptureLayer {
            events: self.events.clone(),
        });
        beacon_runtime::tracing::subscriber::with_default(subscriber, test)
    }

    pub fn events(&self) -> Vec<CapturedEvent> {
        self.events.lock().expect("event sink").clone()
    }

    pub fn spans(&self) -> Vec<FinishedSpan> {
        self.spans.lock().expect("span sink").clone()
    }

    /// Measurements of one instrument, in recording order
    pub fn measurements(&self, instrument: &str) -> Vec<Measurement> {
        self.measurements
            .lock()
            .expect("measurement sink")
            .iter()
            .filter(|measurement| measurement.instrument == instrument)
            .cloned()
            .collect()
    }
}

fn lookup<'a>(pairs: &'a [(String, String)], key: &str) -> Option<&'a str> {
    pairs
        .iter()
        .find(|(name, _)| name == key)
        .map(|(_, value)| value.as_str())
}

fn rendered(attributes: &[KeyValue]) -> Vec<(String, String)> {
    attributes
        .iter()
        .map(|kv| (kv.key.as_str().to_string(), kv.value.as_str().into_owned()))
        .collect()
}

struct CaptureLayer {
    events: Arc<Mutex<Vec<CapturedEvent>>>,
}

impl<S: Subscriber> Layer<S> for CaptureLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: layer::Context<'_, S>) {
        let mut fields = FieldText::default();
        event.record(&mut fields);
        self.events.lock().expect("event sink").push(CapturedEvent {
            target: event.metadata().target().to_string(),
            level: *event.metadata().level(),
            fields: fields.0,
        });
    }
}

#[derive(Default)]
struct FieldText(BTreeMap<String, String>);

impl Visit for FieldText {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.0.insert(field.name().to_string(), value.to_string());
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.0.insert(field.name().to_string(), format!("{value:?}"));
    }
}

struct RecordingTracer {
    finished: Arc<Mutex<Vec<FinishedSpan>>>,
}

impl Tracer for RecordingTracer {
    type Span = RecordingSpan;

    fn build_with_context(&self, builder: SpanBuilder, _parent_cx: &Context) -> RecordingSpan {
        RecordingSpan {
            name: builder.name,
            attributes: builder.attributes.unwrap_or_default(),
            status: Status::Unset,
            context: SpanContext::empty_context(),
            ended: false,
            finished: self.finished.clone(),
        }
    }
}

struct RecordingSpan {
    name: Cow<'static, str>,
    attributes: Vec<KeyValue>,
    status: Status,
    context: SpanContext,
    ended: bool,
    finished: Arc<Mutex<Vec<FinishedSpan>>>,
}

impl Span for RecordingSpan {
    fn add_event_with_timestamp<T>(
        &mut self,
        _name: T,
        _timestamp: SystemTime,
        _attributes: Vec<KeyValue>,
    ) where
        T: Into<Cow<'static, str>>,
    {
    }

    fn span_context(&self) -> &SpanContext {
        &self.context
    }

    fn is_recording(&self) -> bool {
        !self.ended
    }

    fn set_attribute(&mut self, attribute: KeyValue) {
        self.attributes.push(attribute);
    }

    fn set_status(&mut self, status: Status) {
        self.status = status;
    }

    fn update_name<T>(&mut self, new_name: T)
    where
        T: Into<Cow<'static, str>>,
    {
        self.name = new_name.into();
    }

    fn add_link(&mut self, _span_context: SpanContext, _attributes: Vec<KeyValue>) {}

    fn end_with_timestamp(&mut self, _timestamp: SystemTime) {
        if self.ended {
            return;
        }
        self.ended = true;
        self.finished.lock().expect("span sink").push(FinishedSpan {
            name: self.name.to_string(),
            attributes: rendered(&self.attributes),
            status: self.status.clone(),
        });
    }
}

struct RecordingInstruments {
    measurements: Arc<Mutex<Vec<Measurement>>>,
}

impl RecordingInstruments {
    fn recorder(&self, instrument: &str) -> Arc<Recorder> {
        Arc::new(Recorder {
            instrument: instrument.to_string(),
            measurements: self.measurements.clone(),
        })
    }
}

impl InstrumentProvider for RecordingInstruments {
    fn u64_counter(&self, builder: InstrumentBuilder<'_, Counter<u64>>) -> Counter<u64> {
        Counter::new(self.recorder(&builder.name))
    }

    fn f64_histogram(&self, builder: HistogramBuilder<'_, Histogram<f64>>) -> Histogram<f64> {
        Histogram::new(self.recorder(&builder.name))
    }
}

struct Recorder {
    instrument: String,
    measurements: Arc<Mutex<Vec<Measurement>>>,
}

impl Recorder {
    fn push(&self, value: f64, attributes: &[KeyValue]) {
        self.measurements
            .lock()
            .expect("measurement sink")
            .push(Measurement {
                instrument: self.instrument.clone(),
                value,
                attributes: rendered(attributes),
            });
    }
}

impl SyncInstrument<u64> for Recorder {
    fn measure(&self, measurement: u64, attributes: &[KeyValue]) {
        self.push(measurement as f64, attributes);
    }
}

impl SyncInstrument<f64> for Recorder {
    fn measure(&self, measurement: f64, attributes: &[KeyValue]) {
        self.push(measurement, attributes);
    }
}
