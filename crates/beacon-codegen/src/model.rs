//! Declaration model
//!
//! The front end lowers syn items into [`AdapterDecl`]; [`TargetModel`] is
//! the resolved form handed to emission. Nothing here refers back to syn, so
//! the extractors can be exercised on hand-built declarations.

use std::fmt;

use crate::classify::{self, SizeInfo};
use crate::config::GeneratorConfig;
use crate::constructor::{self, ConstructorCall, ConstructorParam};
use crate::naming::NamingResolver;

/// How a parameter is passed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassMode {
    /// By value
    Value,
    /// Shared reference
    Ref,
    /// Exclusive reference
    RefMut,
}

impl PassMode {
    /// Mode of a parameter type
    pub fn of(ty: &str) -> Self {
        let Some(rest) = ty.trim_start().strip_prefix('&') else {
            return PassMode::Value;
        };
        let rest = match rest.strip_prefix('\'') {
            Some(lifetime) => lifetime
                .split_once(char::is_whitespace)
                .map_or("", |(_, rest)| rest),
            None => rest,
        };
        let rest = rest.trim_start();
        if rest.strip_prefix("mut").is_some_and(|after| after.starts_with(char::is_whitespace)) {
            PassMode::RefMut
        } else {
            PassMode::Ref
        }
    }
}

/// One operation or constructor parameter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterInfo {
    /// Binding name
    pub name: String,
    /// Type text
    pub ty: String,
    /// Pass mode, derived from `ty`
    pub mode: PassMode,
    /// Size information, derived from `ty`
    pub size: Option<SizeInfo>,
}

impl ParameterInfo {
    /// Build a parameter, deriving mode and size from the type text
    pub fn new(name: impl Into<String>, ty: impl Into<String>) -> Self {
        let ty = ty.into();
        Self {
            name: name.into(),
            mode: PassMode::of(&ty),
            size: classify::size_info(&ty),
            ty,
        }
    }

    /// Whether the parameter's size is logged
    pub fn is_collection(&self) -> bool {
        self.size.is_some()
    }

    /// `request.params.<name>`
    pub fn field_path(&self) -> String {
        classify::field_path(&self.name)
    }

    /// `request.params.<name>.count`
    pub fn size_path(&self) -> String {
        classify::size_path(&self.name)
    }
}

/// A contract method as declared in the adapter's trait impl
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodInfo {
    /// Method name
    pub name: String,
    /// Parameters after the receiver, in order
    pub params: Vec<ParameterInfo>,
    /// Return type text, empty for `()`
    pub return_type: String,
    /// Receiver text (`&self`, `&mut self`, `self`, `mut self`); `None` for
    /// associated functions
    pub receiver: Option<String>,
    /// Declared `async`
    pub is_async: bool,
    /// Generic parameter list including angle brackets, or empty
    pub generics: String,
    /// Where clause, or empty
    pub where_clause: String,
}

impl MethodInfo {
    /// Method with a `&self` receiver and no generics
    pub fn operation(
        name: impl Into<String>,
        params: Vec<ParameterInfo>,
        return_type: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            params,
            return_type: return_type.into(),
            receiver: Some("&self".to_string()),
            is_async: false,
            generics: String::new(),
            where_clause: String::new(),
        }
    }

    /// Whether calls are instrumented (the method takes a receiver)
    pub fn is_operation(&self) -> bool {
        self.receiver.is_some()
    }
}

/// Source location of a declaration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Location {
    /// File path, or the module path when no file is known
    pub file: String,
    /// 1-based line
    pub line: usize,
    /// 0-based column
    pub column: usize,
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.column)
    }
}

/// How a constructor builds the value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CtorKind {
    /// Associated function `Type::name(..)`
    Function(String),
    /// Tuple struct literal `Type(..)`
    Tuple,
    /// Braced struct literal `Type { .. }`
    Named,
    /// Unit struct `Type`
    Unit,
    /// `Default::default()`
    Default,
}

impl CtorKind {
    /// Whether this is the struct literal declared by the type's header
    pub fn is_header(&self) -> bool {
        matches!(self, CtorKind::Tuple | CtorKind::Named | CtorKind::Unit)
    }
}

/// One accessible constructor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CtorDecl {
    /// Construction form
    pub kind: CtorKind,
    /// Parameters (struct fields for header constructors)
    pub params: Vec<ParameterInfo>,
}

impl CtorDecl {
    /// Number of parameters
    pub fn arity(&self) -> usize {
        self.params.len()
    }
}

/// A struct and its accessible constructors, in source order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypeDecl {
    /// Type name
    pub name: String,
    /// Accessible constructors
    pub ctors: Vec<CtorDecl>,
}

/// The capability contract implemented by an adapter
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContractInfo {
    /// Trait path as written in the impl, with generic arguments
    pub path: String,
    /// Last path segment
    pub name: String,
    /// Adapter category (`Repository`, `Client`, ...)
    pub category: String,
    /// Impl attributes re-emitted on the wrapper's impl
    pub attrs: Vec<String>,
    /// Associated types and consts re-emitted on the wrapper's impl
    pub items: Vec<String>,
}

/// A marked adapter as found by the front end
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdapterDecl {
    /// Module path the adapter lives in
    pub namespace: String,
    /// Adapter type name
    pub name: String,
    /// Visibility text (`pub`, `pub(crate)`, or empty)
    pub visibility: String,
    /// The adapter's own constructors
    pub ty: TypeDecl,
    /// Base type, one level up
    pub base: Option<TypeDecl>,
    /// Implemented contract
    pub contract: ContractInfo,
    /// Methods of the contract impl, in order
    pub methods: Vec<MethodInfo>,
    /// Declaration site
    pub location: Location,
}

/// Everything emission needs for one wrapper
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TargetModel {
    /// Module path
    pub namespace: String,
    /// Adapter type name
    pub class_name: String,
    /// Generated wrapper name
    pub wrapper_name: String,
    /// Wrapper visibility
    pub visibility: String,
    /// Implemented contract
    pub contract: ContractInfo,
    /// Contract methods, in order
    pub methods: Vec<MethodInfo>,
    /// Selected constructor with resolved parameter names
    pub constructor: Option<ConstructorCall>,
    /// Declaration site
    pub location: Location,
}

impl TargetModel {
    /// Sentinel: nothing to generate
    pub fn empty() -> Self {
        Self::default()
    }

    /// True when the model has no operations
    pub fn is_empty(&self) -> bool {
        self.operations().next().is_none()
    }

    /// Instrumented methods
    pub fn operations(&self) -> impl Iterator<Item = &MethodInfo> {
        self.methods.iter().filter(|method| method.is_operation())
    }

    /// Forwarded constructor parameters; empty when no constructor was selected
    pub fn constructor_parameters(&self) -> &[ConstructorParam] {
        match &self.constructor {
            Some(call) => &call.params,
            None => &[],
        }
    }

    /// Resolve a declaration; adapters without operations yield [`TargetModel::empty`]
    pub fn from_decl(decl: &AdapterDecl, config: &GeneratorConfig) -> Self {
        if !decl.methods.iter().any(MethodInfo::is_operation) {
            return Self::empty();
        }
        let resolver = NamingResolver::from_config(config);
        Self {
            namespace: decl.namespace.clone(),
            class_name: decl.name.clone(),
            wrapper_name: format!("{}{}", decl.name, config.wrapper_suffix),
            visibility: decl.visibility.clone(),
            contract: decl.contract.clone(),
            methods: decl.methods.clone(),
            constructor: constructor::select(&decl.ty, decl.base.as_ref(), &resolver),
            location: decl.location.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pass_modes() {
        assert_eq!(PassMode::of("u64"), PassMode::Value);
        assert_eq!(PassMode::of("&str"), PassMode::Ref);
        assert_eq!(PassMode::of("&'a [u8]"), PassMode::Ref);
        assert_eq!(PassMode::of("&mut Vec<u8>"), PassMode::RefMut);
        assert_eq!(PassMode::of("&'a mut Vec<u8>"), PassMode::RefMut);
        assert_eq!(PassMode::of("&mutex::Guard"), PassMode::Ref);
    }

    #[test]
    fn parameter_info_is_derived_from_type() {
        let param = ParameterInfo::new("userIds", "&[UserId]");
        assert!(param.is_collection());
        assert_eq!(param.mode, PassMode::Ref);
        assert_eq!(param.field_path(), "request.params.userids");
        assert_eq!(param.size_path(), "request.params.userids.count");

        assert!(!ParameterInfo::new("pair", "(Vec<u8>, Vec<u8>)").is_collection());
    }

    #[test]
    fn adapters_without_operations_resolve_to_empty() {
        let decl = AdapterDecl {
            name: "Registry".to_string(),
            methods: vec![MethodInfo {
                receiver: None,
                ..MethodInfo::operation("create", Vec::new(), "Self")
            }],
            ..AdapterDecl::default()
        };
        let model = TargetModel::from_decl(&decl, &GeneratorConfig::default());
        assert!(model.is_empty());
        assert_eq!(model, TargetModel::empty());
    }

    #[test]
    fn wrapper_name_uses_configured_suffix() {
        let decl = AdapterDecl {
            name: "PgUserRepository".to_string(),
            methods: vec![MethodInfo::operation("find", Vec::new(), "")],
            ..AdapterDecl::default()
        };
        let mut config = GeneratorConfig::default();
        config.wrapper_suffix = "Instrumented".to_string();

        let model = TargetModel::from_decl(&decl, &config);
        assert_eq!(model.wrapper_name, "PgUserRepositoryInstrumented");
        assert_eq!(model.operations().count(), 1);
        assert!(model.constructor_parameters().is_empty());
    }
}
