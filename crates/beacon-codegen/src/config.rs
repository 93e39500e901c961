//! Generator configuration
//!
//! Loaded from a `beacon.toml` next to the build script, or built in code.
//! Every field has a default, so an empty file is a valid configuration:
//!
//! ```toml
//! wrapper_suffix = "Pipeline"
//! naming_case = "snake"
//! record_values = true
//!
//! [wrapper_params]
//! logger = "logger"
//!
//! [[result_wrappers]]
//! name = "Outcome"
//! payload_slot = 1
//! success_variant = "Outcome::Done"
//! failure_variant = "Outcome::Failed"
//! ```

use std::collections::BTreeSet;
use std::path::Path;

use serde::Deserialize;

use crate::error::{CodegenError, Result};

/// Field and `from_inner` parameter holding the wrapped adapter
pub const INNER_PARAM: &str = "inner";

/// Case used when a constructor parameter is renamed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NamingCase {
    /// `base_logger`
    #[default]
    Snake,
    /// `baseLogger`
    Camel,
}

/// A result-like return type whose failure branch is classified
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ResultWrapper {
    /// Outermost type name, compared against the last path segment
    pub name: String,
    /// Index of the success payload among the type arguments
    pub payload_slot: usize,
    /// Pattern path of the success variant
    pub success_variant: String,
    /// Pattern path of the failure variant
    pub failure_variant: String,
}

impl ResultWrapper {
    /// `Result<T, E>`: payload first, `Ok`/`Err`
    pub fn result() -> Self {
        Self {
            name: "Result".to_string(),
            payload_slot: 0,
            success_variant: "Ok".to_string(),
            failure_variant: "Err".to_string(),
        }
    }

    /// `Either<L, R>`: payload second, `Right`/`Left`
    pub fn either() -> Self {
        Self {
            name: "Either".to_string(),
            payload_slot: 1,
            success_variant: "Either::Right".to_string(),
            failure_variant: "Either::Left".to_string(),
        }
    }
}

/// Names of the wrapper's own constructor parameters
///
/// These are also the reserved vocabulary: forwarded constructor parameters
/// that collide with them are renamed.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct WrapperParams {
    /// Fallback parent trace context
    pub parent: String,
    /// Logger handle
    pub logger: String,
    /// Tracer
    pub tracer: String,
    /// Meter used to build the instruments
    pub meter: String,
}

impl Default for WrapperParams {
    fn default() -> Self {
        Self {
            parent: "parent".to_string(),
            logger: "logger".to_string(),
            tracer: "tracer".to_string(),
            meter: "meter".to_string(),
        }
    }
}

impl WrapperParams {
    /// The four names in declaration order
    pub fn names(&self) -> [&str; 4] {
        [&self.parent, &self.logger, &self.tracer, &self.meter]
    }
}

/// Configuration of one generation pass
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GeneratorConfig {
    /// Appended to the adapter name to form the wrapper name
    pub wrapper_suffix: String,
    /// Attribute marking adapters (last path segment)
    pub marker: String,
    /// Wrapper constructor parameter names, reserved for renaming
    pub wrapper_params: WrapperParams,
    /// Prefix given to colliding constructor parameters
    pub rename_prefix: String,
    /// Case of renamed parameters
    pub naming_case: NamingCase,
    /// Path generated code uses to reach the runtime crate
    pub runtime_path: String,
    /// Log parameter and result values; sizes are logged either way
    pub record_values: bool,
    /// Result-like return types, checked in order
    pub result_wrappers: Vec<ResultWrapper>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            wrapper_suffix: "Pipeline".to_string(),
            marker: "adapter".to_string(),
            wrapper_params: WrapperParams::default(),
            rename_prefix: "base".to_string(),
            naming_case: NamingCase::Snake,
            runtime_path: "::beacon_runtime".to_string(),
            record_values: true,
            result_wrappers: vec![ResultWrapper::result(), ResultWrapper::either()],
        }
    }
}

impl GeneratorConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(text).map_err(|err| CodegenError::config(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|err| CodegenError::io(path, err))?;
        Self::from_toml_str(&text)
    }

    /// Check that every configured name can appear in generated code
    pub fn validate(&self) -> Result<()> {
        if self.wrapper_suffix.is_empty() {
            return Err(CodegenError::config("wrapper_suffix must not be empty"));
        }
        ensure_ident("marker", &self.marker)?;
        ensure_ident("rename_prefix", &self.rename_prefix)?;

        let mut seen = BTreeSet::new();
        for name in self.wrapper_params.names() {
            ensure_ident("wrapper_params", name)?;
            if name == INNER_PARAM {
                return Err(CodegenError::config(format!(
                    "wrapper_params: `{name}` is reserved for the wrapped adapter"
                )));
            }
            if !seen.insert(name) {
                return Err(CodegenError::config(format!(
                    "wrapper_params: `{name}` is used twice"
                )));
            }
        }

        if syn::parse_str::<syn::Path>(&self.runtime_path).is_err() {
            return Err(CodegenError::config(format!(
                "runtime_path `{}` is not a path",
                self.runtime_path
            )));
        }

        for wrapper in &self.result_wrappers {
            ensure_ident("result_wrappers.name", &wrapper.name)?;
            for variant in [&wrapper.success_variant, &wrapper.failure_variant] {
                if syn::parse_str::<syn::Path>(variant).is_err() {
                    return Err(CodegenError::config(format!(
                        "result_wrappers: `{variant}` is not a variant path"
                    )));
                }
            }
        }
        Ok(())
    }
}

fn ensure_ident(field: &str, value: &str) -> Result<()> {
    if syn::parse_str::<syn::Ident>(value).is_ok() {
        Ok(())
    } else {
        Err(CodegenError::config(format!(
            "{field}: `{value}` is not an identifier"
        )))
    }
}
