//! Beacon adapter pipeline macros
//!
//! `#[adapter_pipelines]` goes on an inline module holding adapters. Every
//! struct in it marked `#[adapter]` that implements a contract trait gets a
//! `{Name}Pipeline` wrapper appended to the module. The wrapper implements
//! the same trait and records metrics, a span and structured logs around
//! each delegated call through `beacon-runtime`.
//!
//! # Example
//!
//! ```ignore
//! use beacon_macros::adapter_pipelines;
//!
//! #[adapter_pipelines(namespace = "storage")]
//! mod storage {
//!     pub trait UserRepository {
//!         fn find(&self, id: u64) -> Result<Option<User>, AdapterError>;
//!     }
//!
//!     #[adapter]
//!     pub struct PgUserRepository { pub pool: PgPool }
//!
//!     impl UserRepository for PgUserRepository {
//!         fn find(&self, id: u64) -> Result<Option<User>, AdapterError> { .. }
//!     }
//! }
//!
//! let repository = storage::PgUserRepositoryPipeline::new(pool, parent, logger, tracer, &meter);
//! ```
//!
//! # Arguments
//!
//! - `namespace = "..."`: module path reported in diagnostics (defaults to the module name)
//! - `suffix = "..."`: wrapper name suffix (defaults to `Pipeline`)
//! - `runtime = "..."`: path of the runtime crate (defaults to `::beacon_runtime`)
//! - `record_values = false`: log sizes only, never parameter or result values
//! - `strict = true`: turn skipped adapters into compile errors

use proc_macro::TokenStream;
use proc_macro2::{Span, TokenStream as TokenStream2};
use quote::ToTokens;
use syn::parse::{Parse, ParseStream};
use syn::{Ident, ItemMod, Lit, Result, Token};

use beacon_codegen::GeneratorConfig;

/// Arguments of `#[adapter_pipelines(...)]`
#[derive(Default)]
struct PipelineArgs {
    namespace: Option<String>,
    suffix: Option<String>,
    runtime: Option<String>,
    record_values: Option<bool>,
    strict: bool,
}

impl Parse for PipelineArgs {
    fn parse(input: ParseStream<'_>) -> Result<Self> {
        let mut args = PipelineArgs::default();
        while !input.is_empty() {
            let key: Ident = input.parse()?;
            input.parse::<Token![=]>()?;
            let value: Lit = input.parse()?;
            match (key.to_string().as_str(), value) {
                ("namespace", Lit::Str(value)) => args.namespace = Some(value.value()),
                ("suffix", Lit::Str(value)) => args.suffix = Some(value.value()),
                ("runtime", Lit::Str(value)) => args.runtime = Some(value.value()),
                ("record_values", Lit::Bool(value)) => args.record_values = Some(value.value),
                ("strict", Lit::Bool(value)) => args.strict = value.value,
                ("namespace" | "suffix" | "runtime", other) => {
                    return Err(syn::Error::new(other.span(), "expected a string literal"))
                }
                ("record_values" | "strict", other) => {
                    return Err(syn::Error::new(other.span(), "expected `true` or `false`"))
                }
                (other, _) => {
                    return Err(syn::Error::new(
                        key.span(),
                        format!("unknown adapter_pipelines argument: {other}"),
                    ))
                }
            }
            if input.peek(Token![,]) {
                input.parse::<Token![,]>()?;
            }
        }
        Ok(args)
    }
}

impl PipelineArgs {
    fn config(&self) -> Result<GeneratorConfig> {
        let mut config = GeneratorConfig::default();
        if let Some(suffix) = &self.suffix {
            config.wrapper_suffix = suffix.clone();
        }
        if let Some(runtime) = &self.runtime {
            config.runtime_path = runtime.clone();
        }
        if let Some(record_values) = self.record_values {
            config.record_values = record_values;
        }
        config
            .validate()
            .map_err(|err| syn::Error::new(Span::call_site(), err.to_string()))?;
        Ok(config)
    }
}

/// Generate instrumented pipelines for the `#[adapter]` structs of a module
///
/// The module must be inline (`mod name { ... }`). Marker attributes are
/// removed and one wrapper per adapter is appended to the module body.
/// Adapters that cannot be wrapped are left alone unless `strict = true`.
#[proc_macro_attribute]
pub fn adapter_pipelines(args: TokenStream, input: TokenStream) -> TokenStream {
    match adapter_pipelines_impl(args.into(), input.into()) {
        Ok(output) => output.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

fn adapter_pipelines_impl(args: TokenStream2, input: TokenStream2) -> Result<TokenStream2> {
    let args: PipelineArgs = syn::parse2(args)?;
    let mut module: ItemMod = syn::parse2(input)?;
    let config = args.config()?;
    let namespace = args
        .namespace
        .clone()
        .unwrap_or_else(|| module.ident.to_string());

    let Some((_, items)) = module.content.as_mut() else {
        return Err(syn::Error::new_spanned(
            &module.ident,
            "#[adapter_pipelines] requires an inline module: `mod name { ... }`",
        ));
    };

    let expansion = beacon_codegen::expand(items, &namespace, &config);
    if args.strict {
        if let Some(diagnostic) = expansion.diagnostics.first() {
            return Err(syn::Error::new(Span::call_site(), diagnostic.to_string()));
        }
    }

    let generated = expansion
        .tokens()
        .map_err(|err| syn::Error::new(Span::call_site(), err.to_string()))?;
    let generated: syn::File = syn::parse2(generated)?;

    beacon_codegen::frontend::strip_markers(items, &config);
    items.extend(generated.items);
    Ok(module.into_token_stream())
}

/// Mark a struct as an adapter
///
/// Inside `#[adapter_pipelines]` the marker is consumed by the module
/// attribute. On its own (for build-script generation) it leaves the struct
/// unchanged. Accepts `category = "..."` and `contract = "TraitName"`.
#[proc_macro_attribute]
pub fn adapter(_args: TokenStream, input: TokenStream) -> TokenStream {
    input
}
