//! Payload extraction from result-like return types
//!
//! The success payload of `Wrapper<A, B>` is found by a bracket-balanced scan
//! of the type text. Extraction is best effort: when the wrapper is missing or
//! the text is malformed, the input comes back unchanged.

use crate::config::ResultWrapper;

/// Second type argument of `wrapper<A, B>`
///
/// `extract_second_type_parameter("Either<Error, Vec<User>>", "Either")`
/// returns `"Vec<User>"`.
pub fn extract_second_type_parameter(text: &str, wrapper: &str) -> String {
    extract_type_argument(text, wrapper, 1)
}

/// Type argument at `index` of the first `wrapper<...>` in `text`
///
/// Depth counts `<`, `(` and `[` against `>`, `)` and `]`; the `>` of `->`
/// does not count. Arguments are separated by commas at depth 1.
pub fn extract_type_argument(text: &str, wrapper: &str, index: usize) -> String {
    scan_argument(text, wrapper, index)
        .map(str::to_string)
        .unwrap_or_else(|| text.to_string())
}

fn scan_argument<'a>(text: &'a str, wrapper: &str, index: usize) -> Option<&'a str> {
    let open = find_marker(text, wrapper)?;
    let bytes = text.as_bytes();

    // Locate the start of the requested argument.
    let mut start = open + 1;
    let mut depth = 1_usize;
    let mut commas = 0;
    let mut pos = start;
    while commas < index {
        let byte = *bytes.get(pos)?;
        match byte {
            b'<' | b'(' | b'[' => depth += 1,
            b'>' if is_arrow(bytes, pos) => {}
            b'>' | b')' | b']' => {
                depth -= 1;
                if depth == 0 {
                    // Closed before reaching the requested argument.
                    return None;
                }
            }
            b',' if depth == 1 => {
                commas += 1;
                start = pos + 1;
            }
            _ => {}
        }
        pos += 1;
    }

    while bytes.get(start).is_some_and(u8::is_ascii_whitespace) {
        start += 1;
    }

    // Scan the argument with a fresh depth until it closes or a sibling starts.
    let mut depth = 1_usize;
    let mut pos = start;
    loop {
        let byte = *bytes.get(pos)?;
        match byte {
            b'<' | b'(' | b'[' => depth += 1,
            b'>' if is_arrow(bytes, pos) => {}
            b'>' | b')' | b']' => {
                depth -= 1;
                if depth == 0 {
                    break;
                }
            }
            b',' if depth == 1 => break,
            _ => {}
        }
        pos += 1;
    }

    let argument = text[start..pos].trim_end();
    if argument.is_empty() {
        None
    } else {
        Some(argument)
    }
}

/// Byte offset of the `<` following `wrapper` at an identifier boundary
fn find_marker(text: &str, wrapper: &str) -> Option<usize> {
    if wrapper.is_empty() {
        return None;
    }
    let marker = format!("{wrapper}<");
    text.match_indices(&marker)
        .find(|(at, _)| {
            text[..*at]
                .chars()
                .next_back()
                .map_or(true, |c| !(c.is_alphanumeric() || c == '_'))
        })
        .map(|(at, _)| at + wrapper.len())
}

fn is_arrow(bytes: &[u8], pos: usize) -> bool {
    pos > 0 && bytes[pos - 1] == b'-'
}

/// How an operation's return type is observed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReturnShape {
    /// `()` or no return type
    Unit,
    /// Any type with no failure branch
    Plain {
        /// Return type text
        ty: String,
    },
    /// A configured result wrapper
    Wrapped {
        /// Matched wrapper
        wrapper: ResultWrapper,
        /// Success payload text; `None` when it cannot be extracted
        payload: Option<String>,
    },
}

impl ReturnShape {
    /// Payload type whose value is logged on success, if any
    pub fn payload(&self) -> Option<&str> {
        match self {
            ReturnShape::Unit => None,
            ReturnShape::Plain { ty } => Some(ty),
            ReturnShape::Wrapped { payload, .. } => payload.as_deref().filter(|p| *p != "()"),
        }
    }

    /// Whether the return type has a failure branch
    pub fn is_fallible(&self) -> bool {
        matches!(self, ReturnShape::Wrapped { .. })
    }
}

/// Resolve the shape of a return type against the configured wrappers
pub fn return_shape(return_type: &str, wrappers: &[ResultWrapper]) -> ReturnShape {
    let text = return_type.trim();
    if text.is_empty() || text == "()" {
        return ReturnShape::Unit;
    }

    let outer = outermost_name(text);
    match wrappers.iter().find(|wrapper| wrapper.name == outer) {
        Some(wrapper) => {
            let payload = scan_argument(text, &wrapper.name, wrapper.payload_slot)
                .map(str::to_string);
            ReturnShape::Wrapped {
                wrapper: wrapper.clone(),
                payload,
            }
        }
        None => ReturnShape::Plain {
            ty: text.to_string(),
        },
    }
}

/// Last path segment before the first `<` (`std::io::Result<T>` gives `Result`)
fn outermost_name(text: &str) -> &str {
    let head = text.split('<').next().unwrap_or(text).trim();
    head.rsplit("::").next().unwrap_or(head).trim()
}
