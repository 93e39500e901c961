//! Discovery of marked adapters
//!
//! Scans a list of items (a source file or an inline module body) for structs
//! carrying the adapter marker and lowers each into an [`AdapterDecl`]. The
//! contract is the struct's trait impl; constructors come from the struct
//! header, its inherent impls and `Default`.
//!
//! Adapters that cannot be wrapped are skipped with a [`Diagnostic`]; they
//! never fail the pass.

use std::collections::BTreeMap;
use std::fmt;

use syn::parse::{Parse, ParseStream};
use syn::spanned::Spanned;
use syn::{
    Attribute, Fields, FnArg, ImplItem, ImplItemFn, Item, ItemImpl, ItemStruct, LitStr, Meta, Pat,
    ReturnType, Signature, Token, Type, Visibility,
};

use crate::config::GeneratorConfig;
use crate::model::{
    AdapterDecl, ContractInfo, CtorDecl, CtorKind, Location, MethodInfo, ParameterInfo, TypeDecl,
};
use crate::text::normalize;

/// Traits that are never taken as the capability contract
const WELL_KNOWN_TRAITS: &[&str] = &[
    "AsMut",
    "AsRef",
    "Borrow",
    "Clone",
    "Copy",
    "Debug",
    "Default",
    "Deref",
    "DerefMut",
    "Deserialize",
    "Display",
    "Drop",
    "Eq",
    "Error",
    "From",
    "FromStr",
    "Hash",
    "Into",
    "Iterator",
    "Ord",
    "PartialEq",
    "PartialOrd",
    "Send",
    "Serialize",
    "Sync",
    "TryFrom",
];

/// Why an adapter was skipped
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// Marker arguments do not parse
    InvalidMarker(String),
    /// The adapter has generic parameters
    Generic,
    /// No trait impl qualifies as the contract
    MissingContract {
        /// Requested contract name, if any
        contract: Option<String>,
    },
    /// A method takes a typed receiver such as `self: Box<Self>`
    UnsupportedReceiver {
        /// Method name
        method: String,
    },
    /// A method is `unsafe`, `const`, `extern` or variadic
    UnsupportedMethod {
        /// Method name
        method: String,
        /// Offending qualifier
        qualifier: &'static str,
    },
    /// The contract has no methods with a receiver
    NoOperations,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::InvalidMarker(message) => write!(f, "invalid marker arguments: {message}"),
            SkipReason::Generic => f.write_str("generic adapters are not supported"),
            SkipReason::MissingContract { contract: Some(name) } => {
                write!(f, "no `impl {name} for ..` found")
            }
            SkipReason::MissingContract { contract: None } => {
                f.write_str("no contract trait impl found")
            }
            SkipReason::UnsupportedReceiver { method } => {
                write!(f, "method `{method}` has an unsupported receiver")
            }
            SkipReason::UnsupportedMethod { method, qualifier } => {
                write!(f, "method `{method}` is {qualifier}")
            }
            SkipReason::NoOperations => f.write_str("contract has no operations"),
        }
    }
}

/// A skipped adapter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Adapter name
    pub adapter: String,
    /// Declaration site
    pub location: Location,
    /// Why nothing was generated
    pub reason: SkipReason,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: skipping adapter `{}`: {}",
            self.location, self.adapter, self.reason
        )
    }
}

/// Result of scanning a list of items
#[derive(Debug, Clone, Default)]
pub struct Discovery {
    /// Adapters that can be wrapped, in source order
    pub declarations: Vec<AdapterDecl>,
    /// Adapters that were skipped
    pub diagnostics: Vec<Diagnostic>,
}

/// Arguments of the marker attribute
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MarkerArgs {
    /// Explicit category
    pub category: Option<String>,
    /// Name of the contract trait
    pub contract: Option<String>,
}

impl MarkerArgs {
    fn from_attr(attr: &Attribute) -> syn::Result<Self> {
        match &attr.meta {
            Meta::Path(_) => Ok(Self::default()),
            Meta::List(list) => list.parse_args_with(Self::parse),
            Meta::NameValue(value) => Err(syn::Error::new(
                value.span(),
                "expected #[adapter] or #[adapter(category = \"..\", contract = \"..\")]",
            )),
        }
    }
}

impl Parse for MarkerArgs {
    fn parse(input: ParseStream<'_>) -> syn::Result<Self> {
        let mut args = Self::default();
        while !input.is_empty() {
            let key: syn::Ident = input.parse()?;
            input.parse::<Token![=]>()?;
            let value: LitStr = input.parse()?;
            match key.to_string().as_str() {
                "category" => args.category = Some(value.value()),
                "contract" => args.contract = Some(value.value()),
                other => {
                    return Err(syn::Error::new(
                        key.span(),
                        format!("unknown adapter attribute key: {other}"),
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

/// Whether an attribute is the adapter marker
pub fn is_marker(attr: &Attribute, config: &GeneratorConfig) -> bool {
    attr.path()
        .segments
        .last()
        .is_some_and(|segment| segment.ident == config.marker)
}

/// Remove marker attributes from every struct
pub fn strip_markers(items: &mut [Item], config: &GeneratorConfig) {
    for item in items {
        if let Item::Struct(item) = item {
            item.attrs.retain(|attr| !is_marker(attr, config));
        }
    }
}

/// Find and lower every marked adapter in `items`
pub fn discover(items: &[Item], namespace: &str, config: &GeneratorConfig) -> Discovery {
    let index = ItemIndex::new(items);
    let mut discovery = Discovery::default();

    for item in items {
        let Item::Struct(item) = item else {
            continue;
        };
        let Some(marker) = item.attrs.iter().find(|attr| is_marker(attr, config)) else {
            continue;
        };

        let location = location_of(item, namespace);
        match lower(item, marker, &index, namespace, location.clone()) {
            Ok(decl) => {
                tracing::debug!(
                    adapter = %decl.name,
                    contract = %decl.contract.path,
                    category = %decl.contract.category,
                    methods = decl.methods.len(),
                    "discovered adapter"
                );
                discovery.declarations.push(decl);
            }
            Err(reason) => {
                let diagnostic = Diagnostic {
                    adapter: item.ident.to_string(),
                    location,
                    reason,
                };
                tracing::warn!(%diagnostic, "adapter skipped");
                discovery.diagnostics.push(diagnostic);
            }
        }
    }
    discovery
}

/// Structs and impls of one item list, keyed by type name
struct ItemIndex<'a> {
    structs: BTreeMap<String, &'a ItemStruct>,
    impls: BTreeMap<String, Vec<&'a ItemImpl>>,
}

impl<'a> ItemIndex<'a> {
    fn new(items: &'a [Item]) -> Self {
        let mut structs = BTreeMap::new();
        let mut impls: BTreeMap<String, Vec<&'a ItemImpl>> = BTreeMap::new();
        for item in items {
            match item {
                Item::Struct(item) => {
                    structs.insert(item.ident.to_string(), item);
                }
                Item::Impl(item) => {
                    if let Some(name) = type_name(&item.self_ty) {
                        impls.entry(name).or_default().push(item);
                    }
                }
                _ => {}
            }
        }
        Self { structs, impls }
    }

    fn impls_of(&self, name: &str) -> &[&'a ItemImpl] {
        match self.impls.get(name) {
            Some(impls) => impls,
            None => &[],
        }
    }

    fn trait_impls<'s>(&'s self, name: &str) -> impl Iterator<Item = (&'a ItemImpl, String)> + 's {
        self.impls_of(name).iter().filter_map(|item| {
            let (negative, path, _) = item.trait_.as_ref()?;
            if negative.is_some() || item.unsafety.is_some() {
                return None;
            }
            let last = path.segments.last()?.ident.to_string();
            Some((*item, last))
        })
    }

    fn implements(&self, name: &str, trait_name: &str) -> bool {
        self.trait_impls(name).any(|(_, last)| last == trait_name)
    }
}

fn lower(
    item: &ItemStruct,
    marker: &Attribute,
    index: &ItemIndex<'_>,
    namespace: &str,
    location: Location,
) -> Result<AdapterDecl, SkipReason> {
    let args = MarkerArgs::from_attr(marker)
        .map_err(|err| SkipReason::InvalidMarker(err.to_string()))?;
    if !item.generics.params.is_empty() {
        return Err(SkipReason::Generic);
    }

    let name = item.ident.to_string();
    let (contract_impl, contract_name) = index
        .trait_impls(&name)
        .find(|(_, last)| match &args.contract {
            Some(wanted) => last == wanted,
            None => !WELL_KNOWN_TRAITS.contains(&last.as_str()),
        })
        .ok_or_else(|| SkipReason::MissingContract {
            contract: args.contract.clone(),
        })?;
    if !contract_impl.generics.params.is_empty() {
        return Err(SkipReason::Generic);
    }

    let contract = contract_info(contract_impl, &contract_name, args.category)?;
    let methods = contract_impl
        .items
        .iter()
        .filter_map(|item| match item {
            ImplItem::Fn(method) => Some(lower_method(method)),
            _ => None,
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(AdapterDecl {
        namespace: namespace.to_string(),
        visibility: normalize(&item.vis),
        ty: type_decl(item, index),
        base: base_type(&name, index),
        contract,
        methods,
        location,
        name,
    })
}

fn contract_info(
    item: &ItemImpl,
    name: &str,
    category: Option<String>,
) -> Result<ContractInfo, SkipReason> {
    let path = item
        .trait_
        .as_ref()
        .map(|(_, path, _)| normalize(path))
        .ok_or(SkipReason::MissingContract { contract: None })?;

    let attrs = item
        .attrs
        .iter()
        .filter(|attr| !attr.path().is_ident("doc"))
        .map(normalize)
        .collect();

    let mut items = Vec::new();
    for impl_item in &item.items {
        match impl_item {
            ImplItem::Type(ty) => items.push(normalize(ty)),
            ImplItem::Const(constant) => items.push(normalize(constant)),
            ImplItem::Fn(_) => {}
            other => tracing::debug!(item = %normalize(other), "impl item not copied to wrapper"),
        }
    }

    Ok(ContractInfo {
        path,
        name: name.to_string(),
        category: category.unwrap_or_else(|| last_camel_word(name).to_string()),
        attrs,
        items,
    })
}

fn lower_method(method: &ImplItemFn) -> Result<MethodInfo, SkipReason> {
    let sig = &method.sig;
    let name = sig.ident.to_string();
    if let Some(qualifier) = unsupported_qualifier(sig) {
        return Err(SkipReason::UnsupportedMethod {
            method: name,
            qualifier,
        });
    }

    let receiver = match sig.receiver() {
        Some(receiver) if receiver.colon_token.is_some() => {
            return Err(SkipReason::UnsupportedReceiver { method: name });
        }
        Some(receiver) => Some(match &receiver.reference {
            Some((_, lifetime)) => {
                let lifetime = lifetime
                    .as_ref()
                    .map(|lifetime| format!("{lifetime} "))
                    .unwrap_or_default();
                let mutability = if receiver.mutability.is_some() { "mut " } else { "" };
                format!("&{lifetime}{mutability}self")
            }
            // `mut self` is a binding mode; the wrapper never mutates it.
            None => "self".to_string(),
        }),
        None => None,
    };

    Ok(MethodInfo {
        params: parameters(sig),
        return_type: return_type(&sig.output),
        receiver,
        is_async: sig.asyncness.is_some(),
        generics: if sig.generics.params.is_empty() {
            String::new()
        } else {
            normalize(&sig.generics)
        },
        where_clause: sig
            .generics
            .where_clause
            .as_ref()
            .map(normalize)
            .unwrap_or_default(),
        name,
    })
}

fn unsupported_qualifier(sig: &Signature) -> Option<&'static str> {
    if sig.unsafety.is_some() {
        Some("unsafe")
    } else if sig.constness.is_some() {
        Some("const")
    } else if sig.abi.is_some() {
        Some("extern")
    } else if sig.variadic.is_some() {
        Some("variadic")
    } else {
        None
    }
}

/// Typed parameters; bindings that are not plain identifiers become `argN`
fn parameters(sig: &Signature) -> Vec<ParameterInfo> {
    sig.inputs
        .iter()
        .filter_map(|input| match input {
            FnArg::Typed(typed) => Some(typed),
            FnArg::Receiver(_) => None,
        })
        .enumerate()
        .map(|(position, typed)| {
            let name = match &*typed.pat {
                Pat::Ident(ident) if ident.subpat.is_none() && ident.ident != "_" => {
                    ident.ident.to_string()
                }
                _ => format!("arg{position}"),
            };
            ParameterInfo::new(name, normalize(&typed.ty))
        })
        .collect()
}

fn return_type(output: &ReturnType) -> String {
    match output {
        ReturnType::Default => String::new(),
        ReturnType::Type(_, ty) => normalize(ty),
    }
}

fn type_decl(item: &ItemStruct, index: &ItemIndex<'_>) -> TypeDecl {
    let name = item.ident.to_string();
    let mut ctors = Vec::new();

    if let Some(header) = header_constructor(item) {
        ctors.push(header);
    }

    for block in index.impls_of(&name).iter().filter(|block| block.trait_.is_none()) {
        if !block.generics.params.is_empty() {
            continue;
        }
        for impl_item in &block.items {
            let ImplItem::Fn(function) = impl_item else {
                continue;
            };
            if is_constructor(function, &name) {
                ctors.push(CtorDecl {
                    kind: CtorKind::Function(function.sig.ident.to_string()),
                    params: parameters(&function.sig),
                });
            }
        }
    }

    if derives(&item.attrs, "Default") || index.implements(&name, "Default") {
        ctors.push(CtorDecl {
            kind: CtorKind::Default,
            params: Vec::new(),
        });
    }

    TypeDecl { name, ctors }
}

/// Struct literal, usable only when every field is visible
fn header_constructor(item: &ItemStruct) -> Option<CtorDecl> {
    if !item.fields.iter().all(|field| is_accessible(&field.vis)) {
        return None;
    }
    let (kind, params) = match &item.fields {
        Fields::Named(fields) => (
            CtorKind::Named,
            fields
                .named
                .iter()
                .filter_map(|field| {
                    let ident = field.ident.as_ref()?;
                    Some(ParameterInfo::new(ident.to_string(), normalize(&field.ty)))
                })
                .collect(),
        ),
        Fields::Unnamed(fields) => (
            CtorKind::Tuple,
            fields
                .unnamed
                .iter()
                .enumerate()
                .map(|(position, field)| {
                    ParameterInfo::new(format!("field_{position}"), normalize(&field.ty))
                })
                .collect(),
        ),
        Fields::Unit => (CtorKind::Unit, Vec::new()),
    };
    Some(CtorDecl { kind, params })
}

/// Accessible associated function returning the type, without a receiver
fn is_constructor(function: &ImplItemFn, owner: &str) -> bool {
    let sig = &function.sig;
    if !is_accessible(&function.vis)
        || sig.receiver().is_some()
        || sig.asyncness.is_some()
        || sig.unsafety.is_some()
        || !sig.generics.params.is_empty()
    {
        return false;
    }
    match &sig.output {
        ReturnType::Type(_, ty) => {
            type_name(ty).is_some_and(|name| name == "Self" || name == owner)
        }
        ReturnType::Default => false,
    }
}

fn is_accessible(vis: &Visibility) -> bool {
    matches!(vis, Visibility::Public(_) | Visibility::Restricted(_))
}

fn derives(attrs: &[Attribute], trait_name: &str) -> bool {
    attrs
        .iter()
        .filter(|attr| attr.path().is_ident("derive"))
        .any(|attr| {
            let mut found = false;
            // Malformed derive lists are left to rustc.
            let _ = attr.parse_nested_meta(|meta| {
                if meta.path.segments.last().is_some_and(|s| s.ident == trait_name) {
                    found = true;
                }
                Ok(())
            });
            found
        })
}

/// `Deref::Target` declared in the same item list, with `From<Base>` for the adapter
fn base_type(name: &str, index: &ItemIndex<'_>) -> Option<TypeDecl> {
    let target = index
        .trait_impls(name)
        .filter(|(_, last)| last == "Deref")
        .find_map(|(item, _)| {
            item.items.iter().find_map(|impl_item| match impl_item {
                ImplItem::Type(ty) if ty.ident == "Target" => type_name(&ty.ty),
                _ => None,
            })
        })?;

    let converts = index.trait_impls(name).any(|(item, last)| {
        last == "From"
            && item
                .trait_
                .as_ref()
                .and_then(|(_, path, _)| path.segments.last())
                .is_some_and(|segment| normalize(&segment.arguments) == format!("<{target}>"))
    });
    if !converts {
        return None;
    }

    let base = index.structs.get(&target)?;
    if !base.generics.params.is_empty() {
        return None;
    }
    Some(type_decl(base, index))
}

/// Last path segment of a type, ignoring generic arguments
fn type_name(ty: &Type) -> Option<String> {
    match ty {
        Type::Path(path) if path.qself.is_none() => {
            path.path.segments.last().map(|segment| segment.ident.to_string())
        }
        Type::Group(group) => type_name(&group.elem),
        Type::Paren(paren) => type_name(&paren.elem),
        _ => None,
    }
}

/// `UserRepository` gives `Repository`, `HTTPClient` gives `Client`
pub fn last_camel_word(name: &str) -> &str {
    let chars: Vec<(usize, char)> = name.char_indices().collect();
    let mut start = 0;
    for (position, &(offset, c)) in chars.iter().enumerate().skip(1) {
        if !c.is_uppercase() {
            continue;
        }
        let previous = chars[position - 1].1;
        let next_is_lower = chars.get(position + 1).is_some_and(|(_, n)| n.is_lowercase());
        if previous.is_lowercase()
            || previous.is_ascii_digit()
            || (previous.is_uppercase() && next_is_lower)
        {
            start = offset;
        }
    }
    &name[start..]
}

fn location_of(item: &ItemStruct, namespace: &str) -> Location {
    let start = item.ident.span().start();
    Location {
        file: namespace.to_string(),
        line: start.line,
        column: start.column,
    }
}
