//! Size-observability classification of parameter and return types
//!
//! A type is size-observable when it is an array/slice or one of the known
//! collections. Tuples are never observable, whatever they contain. Type text
//! is parsed with `syn` and queried structurally; text that does not parse as
//! a Rust type falls back to a textual heuristic with the same rules.

use syn::{GenericArgument, PathArguments, Type};

/// Collections whose size is reported, matched on the last path segment
pub const COLLECTIONS: &[&str] = &[
    "Vec",
    "VecDeque",
    "LinkedList",
    "BinaryHeap",
    "HashSet",
    "BTreeSet",
    "HashMap",
    "BTreeMap",
    "IndexMap",
    "IndexSet",
    "SmallVec",
];

/// Pointers that are looked through (`.len()` auto-derefs through them)
const SMART_POINTERS: &[&str] = &["Box", "Rc", "Arc", "Cow"];

/// Prefix of request parameter field paths
pub const REQUEST_PARAMS_PATH: &str = "request.params";
/// Field path of an operation's return value
pub const RESULT_PATH: &str = "response.result";
/// Field path of an observable return value's size
pub const RESULT_SIZE_PATH: &str = "response.result.count";

/// Structural category of a type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeShape {
    /// Fixed-size array or slice
    Array,
    /// One of [`COLLECTIONS`]
    Collection,
    /// Parenthesised product type with at least one element
    Tuple,
    /// Anything else, including `()`
    Scalar,
}

/// How the size of an observable value is taken
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeAccessor {
    /// Arrays and slices
    Length,
    /// Collections
    Count,
}

/// Size information of an observable type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeInfo {
    /// Accessor kind
    pub accessor: SizeAccessor,
    /// Value sits behind an `Option`; an absent value has size zero
    pub optional: bool,
}

impl SizeInfo {
    /// Expression yielding the size of `binding`
    pub fn expression(&self, binding: &str) -> String {
        if self.optional {
            format!("{binding}.as_ref().map_or(0, |v| v.len())")
        } else {
            format!("{binding}.len()")
        }
    }
}

/// Result of classifying a type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeClass {
    /// Structural category
    pub shape: TypeShape,
    /// Wrapped in `Option`
    pub optional: bool,
}

impl TypeClass {
    const SCALAR: TypeClass = TypeClass {
        shape: TypeShape::Scalar,
        optional: false,
    };

    fn new(shape: TypeShape, optional: bool) -> Self {
        Self { shape, optional }
    }

    /// Size information when the type is observable
    pub fn size(&self) -> Option<SizeInfo> {
        let accessor = match self.shape {
            TypeShape::Array => SizeAccessor::Length,
            TypeShape::Collection => SizeAccessor::Count,
            TypeShape::Tuple | TypeShape::Scalar => return None,
        };
        Some(SizeInfo {
            accessor,
            optional: self.optional,
        })
    }
}

/// Classify a type from its text
pub fn classify(ty: &str) -> TypeClass {
    match syn::parse_str::<Type>(ty) {
        Ok(parsed) => classify_type(&parsed, Peeled::default()),
        Err(_) => classify_text(ty),
    }
}

/// Size information of a type, `None` when it is not observable
pub fn size_info(ty: &str) -> Option<SizeInfo> {
    classify(ty).size()
}

/// Whether a type's size is reported
pub fn is_collection_type(ty: &str) -> bool {
    size_info(ty).is_some()
}

/// `request.params.<name>`
pub fn field_path(name: &str) -> String {
    format!("{REQUEST_PARAMS_PATH}.{}", field_name(name))
}

/// `request.params.<name>.count`
pub fn size_path(name: &str) -> String {
    format!("{}.count", field_path(name))
}

/// Field segment for a parameter: raw-identifier marker removed, lowercased
pub fn field_name(name: &str) -> String {
    name.trim_start_matches("r#").to_lowercase()
}

#[derive(Debug, Clone, Copy, Default)]
struct Peeled {
    optional: bool,
    pointer: bool,
}

fn classify_type(ty: &Type, peeled: Peeled) -> TypeClass {
    match ty {
        Type::Reference(reference) => classify_type(&reference.elem, peeled),
        Type::Paren(paren) => classify_type(&paren.elem, peeled),
        Type::Group(group) => classify_type(&group.elem, peeled),
        Type::Tuple(tuple) if tuple.elems.is_empty() => TypeClass::SCALAR,
        Type::Tuple(_) => TypeClass::new(TypeShape::Tuple, peeled.optional),
        Type::Array(_) | Type::Slice(_) => TypeClass::new(TypeShape::Array, peeled.optional),
        Type::Path(path) if path.qself.is_none() => {
            let Some(last) = path.path.segments.last() else {
                return TypeClass::SCALAR;
            };
            let name = last.ident.to_string();
            let inner = last_type_argument(&last.arguments);

            if name == "Option" {
                // Only a single, outermost Option has an `as_ref().map_or` size.
                return match inner {
                    Some(inner) if !peeled.optional && !peeled.pointer => classify_type(
                        inner,
                        Peeled {
                            optional: true,
                            ..peeled
                        },
                    ),
                    _ => TypeClass::SCALAR,
                };
            }
            if SMART_POINTERS.contains(&name.as_str()) {
                return match inner {
                    Some(inner) => classify_type(
                        inner,
                        Peeled {
                            pointer: true,
                            ..peeled
                        },
                    ),
                    None => TypeClass::SCALAR,
                };
            }
            if COLLECTIONS.contains(&name.as_str()) {
                TypeClass::new(TypeShape::Collection, peeled.optional)
            } else {
                TypeClass::SCALAR
            }
        }
        _ => TypeClass::SCALAR,
    }
}

fn last_type_argument(arguments: &PathArguments) -> Option<&Type> {
    let PathArguments::AngleBracketed(arguments) = arguments else {
        return None;
    };
    arguments.args.iter().rev().find_map(|argument| match argument {
        GenericArgument::Type(ty) => Some(ty),
        _ => None,
    })
}

/// Heuristic for text that is not a Rust type (e.g. `int[]`)
fn classify_text(ty: &str) -> TypeClass {
    let text = ty.trim().trim_start_matches('&').trim();
    let (text, optional) = match text.strip_suffix('?') {
        Some(stripped) => (stripped.trim_end(), true),
        None => (text, false),
    };

    if text.starts_with('(') && text.ends_with(')') && text.len() > 2 {
        return TypeClass::new(TypeShape::Tuple, optional);
    }
    if text.ends_with("[]") || (text.starts_with('[') && text.ends_with(']')) {
        return TypeClass::new(TypeShape::Array, optional);
    }

    let head = text.split('<').next().unwrap_or(text).trim();
    let name = head.rsplit("::").next().unwrap_or(head).rsplit('.').next().unwrap_or(head);
    if COLLECTIONS.contains(&name) {
        TypeClass::new(TypeShape::Collection, optional)
    } else {
        TypeClass::SCALAR
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn arrays_and_slices_use_length() {
        for ty in ["[u8; 32]", "&[User]", "&'a [u8]", "Box<[u8]>", "Arc<[String]>", "int[]"] {
            let size = size_info(ty).unwrap_or_else(|| panic!("{ty} should be observable"));
            assert_eq!(size.accessor, SizeAccessor::Length, "{ty}");
            assert!(!size.optional, "{ty}");
        }
    }

    #[test]
    fn collections_use_count_with_or_without_prefix() {
        for ty in [
            "Vec<User>",
            "std::vec::Vec<User>",
            "&Vec<u8>",
            "VecDeque<Job>",
            "std::collections::HashMap<String, Vec<u8>>",
            "::std::collections::BTreeSet<u64>",
            "indexmap::IndexMap<String, u32>",
            "Arc<Vec<Order>>",
        ] {
            let size = size_info(ty).unwrap_or_else(|| panic!("{ty} should be observable"));
            assert_eq!(size.accessor, SizeAccessor::Count, "{ty}");
        }
    }

    #[test]
    fn optional_values_default_to_zero() {
        let size = size_info("Option<Vec<u8>>").expect("observable");
        assert!(size.optional);
        assert_eq!(size.expression("tags"), "tags.as_ref().map_or(0, |v| v.len())");

        let size = size_info("Option<&[u8]>").expect("observable");
        assert_eq!(size.accessor, SizeAccessor::Length);
        assert!(size.optional);

        let size = size_info("Vec<u8>").expect("observable");
        assert_eq!(size.expression("tags"), "tags.len()");
    }

    #[test]
    fn nested_or_boxed_options_are_scalar() {
        assert!(!is_collection_type("Option<Option<Vec<u8>>>"));
        assert!(!is_collection_type("Box<Option<Vec<u8>>>"));
    }

    #[test]
    fn tuples_are_never_observable() {
        for ty in [
            "(Vec<u8>, Vec<u8>)",
            "(Vec<u8>,)",
            "&([u8; 4], HashMap<u8, u8>)",
            "Option<(Vec<u8>, u32)>",
            "(List<int> items, int[] ids)",
        ] {
            assert_eq!(classify(ty).shape, TypeShape::Tuple, "{ty}");
            assert!(!is_collection_type(ty), "{ty}");
        }
    }

    #[test]
    fn scalars_are_not_observable() {
        for ty in ["u64", "String", "()", "UserId", "Result<Vec<u8>, Error>", "dyn Fn() -> Vec<u8>"] {
            assert!(!is_collection_type(ty), "{ty}");
        }
    }

    #[test]
    fn field_paths_are_lowercased() {
        assert_eq!(field_path("userId"), "request.params.userid");
        assert_eq!(size_path("items"), "request.params.items.count");
        assert_eq!(field_path("r#type"), "request.params.type");
    }

    fn tuple_element() -> impl Strategy<Value = String> {
        prop_oneof![
            Just("Vec<u8>".to_string()),
            Just("[u32]".to_string()),
            Just("&[String]".to_string()),
            Just("HashMap<String, Vec<u8>>".to_string()),
            Just("Option<Vec<u8>>".to_string()),
            Just("(Vec<u8>, Vec<u8>)".to_string()),
            Just("u64".to_string()),
        ]
    }

    proptest! {
        #[test]
        fn tuples_never_observable(elements in prop::collection::vec(tuple_element(), 1..5)) {
            let ty = format!("({},)", elements.join(", "));
            prop_assert!(!is_collection_type(&ty));
            let ref_ty = format!("&{ty}");
            prop_assert!(!is_collection_type(&ref_ty));
        }

        #[test]
        fn catalogue_collections_observable_under_any_prefix(
            name in prop::sample::select(COLLECTIONS),
            prefix in prop::sample::select(&["", "std::collections::", "::alloc::", "crate::types::"][..]),
        ) {
            let ty = format!("{prefix}{name}<u8>");
            prop_assert_eq!(classify(&ty).shape, TypeShape::Collection);
        }
    }
}
