//! Renaming of forwarded constructor parameters
//!
//! The wrapper's constructor takes its own parameters (parent context,
//! logger, tracer, meter) after the forwarded ones, so a forwarded parameter
//! with one of those names would collide. Underscore-prefixed names are
//! renamed as well, since they usually mirror a private field.

use std::collections::BTreeSet;

use crate::config::{GeneratorConfig, NamingCase};

/// Resolves forwarded parameter names against the reserved vocabulary
#[derive(Debug, Clone)]
pub struct NamingResolver {
    reserved: Vec<String>,
    prefix: String,
    case: NamingCase,
}

impl NamingResolver {
    /// Create a resolver
    pub fn new(
        reserved: impl IntoIterator<Item = impl Into<String>>,
        prefix: impl Into<String>,
        case: NamingCase,
    ) -> Self {
        Self {
            reserved: reserved.into_iter().map(Into::into).collect(),
            prefix: prefix.into(),
            case,
        }
    }

    /// Resolver using the configured wrapper parameters as reserved names
    pub fn from_config(config: &GeneratorConfig) -> Self {
        Self::new(
            config.wrapper_params.names(),
            config.rename_prefix.as_str(),
            config.naming_case,
        )
    }

    /// Resolve one name
    pub fn resolve(&self, name: &str) -> String {
        if let Some(stripped) = name.strip_prefix('_') {
            if !stripped.is_empty() {
                return self.prefixed(stripped);
            }
        }
        if self.is_reserved(name) {
            return self.prefixed(name);
        }
        name.to_string()
    }

    /// Resolve every name, preserving order
    ///
    /// A result equal to a reserved name or to an earlier result is prefixed
    /// again until it is unique, so `[_logger, base_logger]` yields
    /// `[base_logger, base_base_logger]`.
    pub fn resolve_all<'a>(&self, names: impl IntoIterator<Item = &'a str>) -> Vec<String> {
        let mut taken: BTreeSet<String> = self.reserved.iter().cloned().collect();
        names
            .into_iter()
            .map(|name| {
                let mut resolved = self.resolve(name);
                while taken.contains(&resolved) {
                    resolved = self.prefixed(&resolved);
                }
                taken.insert(resolved.clone());
                resolved
            })
            .collect()
    }

    /// Whether a name is one of the wrapper's own parameters
    pub fn is_reserved(&self, name: &str) -> bool {
        self.reserved.iter().any(|reserved| reserved == name)
    }

    fn prefixed(&self, rest: &str) -> String {
        match self.case {
            NamingCase::Snake => format!("{}_{}", self.prefix, rest),
            NamingCase::Camel => format!("{}{}", self.prefix, capitalize(rest)),
        }
    }
}

impl Default for NamingResolver {
    fn default() -> Self {
        Self::from_config(&GeneratorConfig::default())
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
