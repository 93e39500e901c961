//! Emission of one contract method on the wrapper
//!
//! Operations (methods with a receiver) are instrumented: request counter,
//! request log, span, timed delegation, then the success or failure record.
//! Associated functions are forwarded to the adapter untouched.

use crate::classify::{self, RESULT_PATH, RESULT_SIZE_PATH};
use crate::model::{MethodInfo, ParameterInfo};
use crate::payload::{self, ReturnShape};

use super::log_shape::LogShape;
use super::writer::SourceWriter;
use super::Emitter;

/// Layer named in every span
const LAYER: &str = "adapter";
/// Message of request events
const REQUEST_MESSAGE: &str = "adapter request";
/// Message of success events
const RESPONSE_MESSAGE: &str = "adapter response";
/// Message of failure events
const FAILURE_MESSAGE: &str = "adapter failure";

impl Emitter<'_> {
    pub(super) fn method(&self, w: &mut SourceWriter, method: &MethodInfo) {
        w.open(format!("{} {{", signature(method)));
        if method.is_operation() {
            self.operation_body(w, method);
        } else {
            self.delegate_body(w, method);
        }
        w.close("}");
    }

    fn delegate_body(&self, w: &mut SourceWriter, method: &MethodInfo) {
        let await_suffix = if method.is_async { ".await" } else { "" };
        w.line(format!(
            "<{} as {}>::{}({}){await_suffix}",
            self.model.class_name,
            self.model.contract.path,
            method.name,
            arguments(&method.params),
        ));
    }

    fn operation_body(&self, w: &mut SourceWriter, method: &MethodInfo) {
        let rt = self.runtime;
        let operation_name = method.name.trim_start_matches("r#");
        let shape = payload::return_shape(&method.return_type, &self.config.result_wrappers);

        w.line(format!(
            "const OPERATION: {rt}::OperationTags = {rt}::OperationTags::new({:?}, {:?}, {:?});",
            self.model.contract.category, self.model.class_name, operation_name,
        ));
        w.line("self.instruments.record_request(&OPERATION);");
        self.request_log(w, &method.params);

        w.line(format!(
            "let __span = {rt}::AdapterSpan::start(&self.tracer, &self.parent, {:?}, &OPERATION);",
            format!(
                "{} {} {}.{}",
                LAYER,
                self.model.contract.category,
                self.model.class_name,
                operation_name
            ),
        ));
        w.line("let __started = ::std::time::Instant::now();");

        let call = format!("self.inner.{}({})", method.name, arguments(&method.params));
        if method.is_async {
            w.line(format!("let __response = __span.instrument({call}).await;"));
        } else {
            w.line(format!("let __response = __span.in_scope(|| {call});"));
        }
        w.line("let __elapsed = __started.elapsed();");

        match &shape {
            ReturnShape::Wrapped { wrapper, .. } => {
                let result_fields = self.result_fields(&shape);
                let binding = if result_fields.is_empty() { "_" } else { "__result" };
                w.open("match &__response {");
                w.open(format!("{}({binding}) => {{", wrapper.success_variant));
                self.success(w, result_fields);
                w.close("}");
                w.open(format!("{}(__error) => {{", wrapper.failure_variant));
                self.failure(w);
                w.close("}");
                w.close("}");
            }
            ReturnShape::Unit | ReturnShape::Plain { .. } => {
                let result_fields = self.result_fields(&shape);
                if !result_fields.is_empty() {
                    w.line("let __result = &__response;");
                }
                self.success(w, result_fields);
            }
        }
        w.line("__response");
    }

    fn request_log(&self, w: &mut SourceWriter, params: &[ParameterInfo]) {
        let mut fields = self.context_fields();
        for param in params {
            if self.config.record_values {
                fields.push(format!("{} = ?{}", param.field_path(), param.name));
            }
            if let Some(size) = &param.size {
                fields.push(format!(
                    "{} = {}",
                    param.size_path(),
                    size.expression(&param.name)
                ));
            }
        }

        match LogShape::select(params.len()) {
            LogShape::Fixed => {
                w.open("if self.logger.is_enabled() {");
                self.event(w, "info", fields, REQUEST_MESSAGE);
                w.close("}");
            }
            LogShape::Dynamic => {
                w.open("self.logger.log_request(|| {");
                self.event(w, "info", fields, REQUEST_MESSAGE);
                w.close("});");
            }
        }
    }

    /// `response.result` and `response.result.count` for the success payload
    fn result_fields(&self, shape: &ReturnShape) -> Vec<String> {
        let Some(payload) = shape.payload() else {
            return Vec::new();
        };
        let mut fields = Vec::new();
        if self.config.record_values {
            fields.push(format!("{RESULT_PATH} = ?__result"));
        }
        if let Some(size) = classify::size_info(payload) {
            fields.push(format!(
                "{RESULT_SIZE_PATH} = {}",
                size.expression("__result")
            ));
        }
        fields
    }

    fn success(&self, w: &mut SourceWriter, result_fields: Vec<String>) {
        let rt = self.runtime;
        w.line("self.instruments.record_success(&OPERATION, __elapsed);");
        w.open("if self.logger.is_enabled() {");
        let mut fields = self.context_fields();
        fields.push(format!("response.status = {rt}::keys::STATUS_SUCCESS"));
        fields.push(format!("response.elapsed = {rt}::elapsed_ms(__elapsed)"));
        fields.extend(result_fields);
        self.event(w, "info", fields, RESPONSE_MESSAGE);
        w.close("}");
        w.line("__span.succeed(__elapsed);");
    }

    fn failure(&self, w: &mut SourceWriter) {
        let rt = self.runtime;
        w.open("let __classification = {");
        w.line("#[allow(unused_imports)]");
        w.line(format!("use {rt}::{{ClassifyFailure as _, ClassifyOpaque as _}};"));
        w.line(format!("(&{rt}::Probe(__error)).classify_failure()"));
        w.close("};");
        w.line("self.instruments.record_failure(&OPERATION, &__classification, __elapsed);");
        w.open("if self.logger.is_enabled() {");
        let mut fields = self.context_fields();
        fields.push(format!("response.status = {rt}::keys::STATUS_FAILURE"));
        fields.push(format!("response.elapsed = {rt}::elapsed_ms(__elapsed)"));
        fields.push("error.type = __classification.error_type.as_str()".to_string());
        fields.push("error.code = %__classification.code".to_string());
        self.event(w, "warn", fields, FAILURE_MESSAGE);
        w.close("}");
        w.line("__span.fail(__elapsed, &__classification);");
    }

    /// The 4 request context fields
    fn context_fields(&self) -> Vec<String> {
        vec![
            "request.layer = OPERATION.layer()".to_string(),
            "request.category = OPERATION.category".to_string(),
            "request.handler = OPERATION.handler".to_string(),
            "request.handler.method = OPERATION.method".to_string(),
        ]
    }

    fn event(&self, w: &mut SourceWriter, level: &str, fields: Vec<String>, message: &str) {
        let rt = self.runtime;
        // Dotted field names cannot follow `target:` unbraced.
        w.open(format!("{rt}::tracing::{level}!("));
        w.line(format!("target: {rt}::LOG_TARGET,"));
        w.open("{");
        for field in fields {
            w.line(format!("{field},"));
        }
        w.close("},");
        w.line(format!("{message:?}"));
        w.close(");");
    }
}

/// Method signature as re-declared on the wrapper
pub(super) fn signature(method: &MethodInfo) -> String {
    let mut inputs: Vec<String> = Vec::with_capacity(method.params.len() + 1);
    if let Some(receiver) = &method.receiver {
        inputs.push(receiver.clone());
    }
    inputs.extend(
        method
            .params
            .iter()
            .map(|param| format!("{}: {}", param.name, param.ty)),
    );

    let mut signature = String::new();
    if method.is_async {
        signature.push_str("async ");
    }
    signature.push_str(&format!(
        "fn {}{}({})",
        method.name,
        method.generics,
        inputs.join(", ")
    ));
    if !method.return_type.is_empty() {
        signature.push_str(&format!(" -> {}", method.return_type));
    }
    if !method.where_clause.is_empty() {
        signature.push_str(&format!(" {}", method.where_clause));
    }
    signature
}

fn arguments(params: &[ParameterInfo]) -> String {
    params
        .iter()
        .map(|param| param.name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signatures_are_redeclared() {
        let mut method = MethodInfo::operation(
            "find",
            vec![ParameterInfo::new("id", "UserId")],
            "Result<User, Error>",
        );
        assert_eq!(
            signature(&method),
            "fn find(&self, id: UserId) -> Result<User, Error>"
        );

        method.is_async = true;
        method.generics = "<'a, T>".to_string();
        method.where_clause = "where T: Send".to_string();
        method.receiver = Some("&'a mut self".to_string());
        method.return_type = String::new();
        assert_eq!(
            signature(&method),
            "async fn find<'a, T>(&'a mut self, id: UserId) where T: Send"
        );
    }
}
