//! Source emission for adapter pipelines
//!
//! [`generate`] turns a [`TargetModel`] into the text of one wrapper: the
//! struct, its constructors and accessors, and the contract impl. Output
//! depends only on the model and configuration, so identical input yields
//! byte-identical text.

mod log_shape;
mod operation;
mod writer;

pub use log_shape::{LogShape, CONTEXT_FIELDS, MAX_FIXED_ARITY};
pub use writer::SourceWriter;

use crate::config::{GeneratorConfig, INNER_PARAM};
use crate::model::TargetModel;

/// Emit the wrapper for `model`; `None` when it has no operations
pub fn generate(model: &TargetModel, config: &GeneratorConfig) -> Option<String> {
    if model.is_empty() {
        return None;
    }
    let emitter = Emitter {
        model,
        config,
        runtime: &config.runtime_path,
    };
    let mut w = SourceWriter::new();
    emitter.wrapper_struct(&mut w);
    w.blank();
    emitter.inherent_impl(&mut w);
    w.blank();
    emitter.contract_impl(&mut w);
    Some(w.finish())
}

/// Shared state of one emission
pub(crate) struct Emitter<'a> {
    model: &'a TargetModel,
    config: &'a GeneratorConfig,
    runtime: &'a str,
}

impl Emitter<'_> {
    fn visibility(&self) -> String {
        if self.model.visibility.is_empty() {
            String::new()
        } else {
            format!("{} ", self.model.visibility)
        }
    }

    fn wrapper_struct(&self, w: &mut SourceWriter) {
        let rt = self.runtime;
        let model = self.model;
        w.line(format!(
            "/// Instrumented [`{}`]: every [`{}`] call records metrics, a span and log events",
            model.class_name, model.contract.name
        ));
        w.open(format!("{}struct {} {{", self.visibility(), model.wrapper_name));
        w.line(format!("inner: {},", model.class_name));
        w.line(format!("parent: {rt}::opentelemetry::Context,"));
        w.line(format!("logger: {rt}::AdapterLogger,"));
        w.line(format!("tracer: {rt}::opentelemetry::global::BoxedTracer,"));
        w.line(format!("instruments: {rt}::AdapterInstruments,"));
        w.close("}");
    }

    /// `name: Type` for the wrapper's own trailing parameters
    fn wrapper_params(&self) -> Vec<String> {
        let rt = self.runtime;
        let names = &self.config.wrapper_params;
        vec![
            format!("{}: {rt}::opentelemetry::Context", names.parent),
            format!("{}: {rt}::AdapterLogger", names.logger),
            format!("{}: {rt}::opentelemetry::global::BoxedTracer", names.tracer),
            format!("{}: &{rt}::opentelemetry::metrics::Meter", names.meter),
        ]
    }

    fn inherent_impl(&self, w: &mut SourceWriter) {
        let rt = self.runtime;
        let model = self.model;
        let names = &self.config.wrapper_params;
        let forwarded = names.names().join(", ");
        let category = model.contract.category.to_lowercase();

        w.open(format!("impl {} {{", model.wrapper_name));

        if let Some(constructor) = &model.constructor {
            let mut params: Vec<String> = constructor
                .params
                .iter()
                .map(|param| format!("{}: {}", param.name, param.ty))
                .collect();
            params.extend(self.wrapper_params());

            w.line(format!("/// Build a [`{}`] and wrap it", model.class_name));
            w.line("#[allow(clippy::too_many_arguments)]");
            w.open(format!("pub fn new({}) -> Self {{", params.join(", ")));
            w.line(format!(
                "Self::from_inner({}, {forwarded})",
                constructor.expression(&model.class_name)
            ));
            w.close("}");
            w.blank();
        }

        let mut params = vec![format!("{INNER_PARAM}: {}", model.class_name)];
        params.extend(self.wrapper_params());
        w.line(format!("/// Wrap an existing [`{}`]", model.class_name));
        w.open(format!("pub fn from_inner({}) -> Self {{", params.join(", ")));
        w.open("Self {");
        w.line(format!("{INNER_PARAM},"));
        w.line(format!("parent: {},", names.parent));
        w.line(format!("logger: {},", names.logger));
        w.line(format!("tracer: {},", names.tracer));
        w.open(format!("instruments: {rt}::AdapterInstruments::with_names("));
        w.line(format!("{},", names.meter));
        w.line(format!("\"adapter.{category}.requests\","));
        w.line(format!("\"adapter.{category}.responses\","));
        w.line(format!("\"adapter.{category}.duration\","));
        w.close("),");
        w.close("}");
        w.close("}");
        w.blank();

        w.line(format!("/// The wrapped [`{}`]", model.class_name));
        w.open(format!("pub fn inner(&self) -> &{} {{", model.class_name));
        w.line("&self.inner");
        w.close("}");
        w.blank();

        w.line("/// Unwrap, dropping the instrumentation");
        w.open(format!("pub fn into_inner(self) -> {} {{", model.class_name));
        w.line("self.inner");
        w.close("}");

        w.close("}");
    }

    fn contract_impl(&self, w: &mut SourceWriter) {
        let model = self.model;
        for attr in &model.contract.attrs {
            w.line(attr);
        }
        w.line("#[allow(clippy::let_unit_value)]");
        w.open(format!(
            "impl {} for {} {{",
            model.contract.path, model.wrapper_name
        ));
        for item in &model.contract.items {
            w.line(item);
        }
        for (position, method) in model.methods.iter().enumerate() {
            if position > 0 || !model.contract.items.is_empty() {
                w.blank();
            }
            self.method(w, method);
        }
        w.close("}");
    }
}
