//! Beacon code generation
//!
//! Generates instrumented wrappers ("pipelines") for adapter types: structs
//! that implement a capability contract crossing a process boundary, such as
//! repositories, service clients and message publishers. The pipeline
//! implements the same contract, delegates every call to the adapter and
//! records metrics, a trace span and structured logs around it.
//!
//! The pass runs in one direction:
//!
//! 1. [`frontend::discover`] lowers marked structs into [`AdapterDecl`]s
//! 2. [`TargetModel::from_decl`] selects the constructor and resolves names
//! 3. [`emit::generate`] renders the wrapper source
//!
//! Two entry points drive it: the `#[adapter_pipelines]` attribute in
//! `beacon-macros`, and [`Builder`] for build scripts.
//!
//! ```ignore
//! // build.rs
//! fn main() -> Result<(), beacon_codegen::CodegenError> {
//!     beacon_codegen::Builder::new()
//!         .config_file("beacon.toml")?
//!         .source("src/adapters.rs")
//!         .generate()?;
//!     Ok(())
//! }
//! ```

pub mod builder;
pub mod classify;
pub mod config;
pub mod constructor;
pub mod emit;
pub mod error;
pub mod frontend;
pub mod model;
pub mod naming;
pub mod payload;
pub mod text;

pub use builder::{Builder, GeneratedFile, Report};
pub use config::{GeneratorConfig, NamingCase, ResultWrapper, WrapperParams};
pub use error::{CodegenError, Result};
pub use frontend::{discover, Diagnostic, Discovery, SkipReason};
pub use model::{AdapterDecl, MethodInfo, ParameterInfo, TargetModel};

use proc_macro2::TokenStream;
use quote::ToTokens;

/// One generated wrapper
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedWrapper {
    /// Adapter type name
    pub adapter: String,
    /// Wrapper type name
    pub wrapper: String,
    /// Wrapper source
    pub code: String,
}

/// Output of one pass over a list of items
#[derive(Debug, Clone, Default)]
pub struct Expansion {
    /// Generated wrappers, in source order
    pub wrappers: Vec<GeneratedWrapper>,
    /// Skipped adapters
    pub diagnostics: Vec<Diagnostic>,
}

impl Expansion {
    /// All wrapper sources, separated by blank lines
    pub fn source_text(&self) -> String {
        self.wrappers
            .iter()
            .map(|wrapper| wrapper.code.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Parse every wrapper back into tokens
    pub fn tokens(&self) -> Result<TokenStream> {
        let mut tokens = TokenStream::new();
        for wrapper in &self.wrappers {
            let file = syn::parse_file(&wrapper.code)
                .map_err(|err| CodegenError::emit(&wrapper.wrapper, err.to_string()))?;
            file.to_tokens(&mut tokens);
        }
        Ok(tokens)
    }
}

/// Discover, resolve and emit every adapter in `items`
pub fn expand(items: &[syn::Item], namespace: &str, config: &GeneratorConfig) -> Expansion {
    let discovery = discover(items, namespace, config);
    let mut expansion = Expansion {
        wrappers: Vec::with_capacity(discovery.declarations.len()),
        diagnostics: discovery.diagnostics,
    };

    for decl in &discovery.declarations {
        let model = TargetModel::from_decl(decl, config);
        match emit::generate(&model, config) {
            Some(code) => {
                tracing::debug!(
                    adapter = %decl.name,
                    wrapper = %model.wrapper_name,
                    operations = model.operations().count(),
                    "generated pipeline"
                );
                expansion.wrappers.push(GeneratedWrapper {
                    adapter: decl.name.clone(),
                    wrapper: model.wrapper_name,
                    code,
                });
            }
            None => {
                let diagnostic = Diagnostic {
                    adapter: decl.name.clone(),
                    location: decl.location.clone(),
                    reason: SkipReason::NoOperations,
                };
                tracing::warn!(%diagnostic, "adapter skipped");
                expansion.diagnostics.push(diagnostic);
            }
        }
    }
    expansion
}
