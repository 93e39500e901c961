//! Constructor selection
//!
//! Picks how the generated `new` builds the wrapped adapter and which
//! parameters it forwards. Priority:
//!
//! 1. the adapter's header (struct literal) when it has parameters
//! 2. the adapter's richest constructor with parameters, first on ties
//! 3. steps 1 and 2 against the base type, one level up only
//! 4. any zero-parameter constructor of the adapter
//!
//! With none of these the wrapper only offers `from_inner`.

use crate::model::{CtorDecl, CtorKind, TypeDecl};
use crate::naming::NamingResolver;

/// Where the selected constructor is declared
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConstructorOrigin {
    /// On the adapter itself
    Own,
    /// On the base type; the adapter is built with `From<Base>`
    Base {
        /// Base type name
        name: String,
    },
}

/// A forwarded constructor parameter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstructorParam {
    /// Name on the wrapper's `new`, after collision resolution
    pub name: String,
    /// Name as declared (the field name for braced struct literals)
    pub original: String,
    /// Type text
    pub ty: String,
}

/// The selected constructor with resolved parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstructorCall {
    /// Declaring type
    pub origin: ConstructorOrigin,
    /// Construction form
    pub kind: CtorKind,
    /// Forwarded parameters, in order
    pub params: Vec<ConstructorParam>,
}

impl ConstructorCall {
    /// Expression that builds a `target` from the forwarded parameters
    pub fn expression(&self, target: &str) -> String {
        let owner = match &self.origin {
            ConstructorOrigin::Own => target,
            ConstructorOrigin::Base { name } => name.as_str(),
        };
        let args = self
            .params
            .iter()
            .map(|param| param.name.as_str())
            .collect::<Vec<_>>()
            .join(", ");

        let built = match &self.kind {
            CtorKind::Function(function) => format!("{owner}::{function}({args})"),
            CtorKind::Tuple => format!("{owner}({args})"),
            CtorKind::Named if self.params.is_empty() => format!("{owner} {{}}"),
            CtorKind::Named => {
                let fields = self
                    .params
                    .iter()
                    .map(|param| {
                        if param.name == param.original {
                            param.name.clone()
                        } else {
                            format!("{}: {}", param.original, param.name)
                        }
                    })
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("{owner} {{ {fields} }}")
            }
            CtorKind::Unit => owner.to_string(),
            CtorKind::Default => format!("<{owner} as ::std::default::Default>::default()"),
        };

        match &self.origin {
            ConstructorOrigin::Own => built,
            ConstructorOrigin::Base { name } => {
                format!("<{target} as ::std::convert::From<{name}>>::from({built})")
            }
        }
    }
}

/// Select a constructor for `target`, consulting `base` one level up
pub fn select(
    target: &TypeDecl,
    base: Option<&TypeDecl>,
    resolver: &NamingResolver,
) -> Option<ConstructorCall> {
    if let Some(ctor) = with_parameters(target) {
        return Some(call(ConstructorOrigin::Own, ctor, resolver));
    }
    if let Some(base) = base {
        if let Some(ctor) = with_parameters(base) {
            let origin = ConstructorOrigin::Base {
                name: base.name.clone(),
            };
            return Some(call(origin, ctor, resolver));
        }
    }
    target
        .ctors
        .iter()
        .find(|ctor| ctor.arity() == 0)
        .map(|ctor| call(ConstructorOrigin::Own, ctor, resolver))
}

/// The ordered parameter list the wrapper forwards
pub fn constructor_parameters(
    target: &TypeDecl,
    base: Option<&TypeDecl>,
    resolver: &NamingResolver,
) -> Vec<ConstructorParam> {
    select(target, base, resolver)
        .map(|call| call.params)
        .unwrap_or_default()
}

/// Header constructor with parameters, else the richest one with parameters
fn with_parameters(ty: &TypeDecl) -> Option<&CtorDecl> {
    if let Some(header) = ty
        .ctors
        .iter()
        .find(|ctor| ctor.kind.is_header() && ctor.arity() > 0)
    {
        return Some(header);
    }

    let mut richest: Option<&CtorDecl> = None;
    for ctor in &ty.ctors {
        if ctor.arity() > richest.map_or(0, CtorDecl::arity) {
            richest = Some(ctor);
        }
    }
    richest
}

fn call(origin: ConstructorOrigin, ctor: &CtorDecl, resolver: &NamingResolver) -> ConstructorCall {
    let names = resolver.resolve_all(ctor.params.iter().map(|param| param.name.as_str()));
    ConstructorCall {
        origin,
        kind: ctor.kind.clone(),
        params: ctor
            .params
            .iter()
            .zip(names)
            .map(|(param, name)| ConstructorParam {
                name,
                original: param.name.clone(),
                ty: param.ty.clone(),
            })
            .collect(),
    }
}
