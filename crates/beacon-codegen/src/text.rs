//! Canonical text for token fragments
//!
//! `ToTokens::to_string` spaces every token apart (`Vec < u8 >`). Type text
//! is stored and compared in a compact form so extraction and classification
//! see the same spelling regardless of how the source was formatted.

use proc_macro2::{Group, Ident, TokenStream, TokenTree};
use quote::ToTokens;

const REPLACEMENTS: &[(&str, &str)] = &[
    (" < ", "<"),
    ("< ", "<"),
    (" <", "<"),
    (" >", ">"),
    (" :: ", "::"),
    (":: ", "::"),
    (" ::", "::"),
    (" ,", ","),
    ("& ", "&"),
    (" ;", ";"),
    ("( ", "("),
    (" )", ")"),
    ("[ ", "["),
    (" ]", "]"),
    ("# ", "#"),
    ("! ", "!"),
];

/// Stands in for a literal while the surrounding text is compacted
const LITERAL_MARK: &str = "__beacon_literal_";

/// Compact text of a token fragment; literals are kept verbatim
pub fn normalize<T: ToTokens + ?Sized>(tokens: &T) -> String {
    let mut literals = Vec::new();
    let masked = mask_literals(tokens.to_token_stream(), &mut literals);
    restore_literals(&compact(&masked.to_string()), &literals)
}

fn compact(text: &str) -> String {
    let mut out = text.trim().to_string();
    for (from, to) in REPLACEMENTS {
        while out.contains(from) {
            out = out.replace(from, to);
        }
    }
    out
}

/// Replace every literal with a numbered identifier, collecting the originals
fn mask_literals(stream: TokenStream, literals: &mut Vec<String>) -> TokenStream {
    stream
        .into_iter()
        .map(|tree| match tree {
            TokenTree::Literal(literal) => {
                let mark = Ident::new(
                    &format!("{LITERAL_MARK}{}__", literals.len()),
                    literal.span(),
                );
                literals.push(literal.to_string());
                TokenTree::Ident(mark)
            }
            TokenTree::Group(group) => {
                let mut masked = Group::new(group.delimiter(), mask_literals(group.stream(), literals));
                masked.set_span(group.span());
                TokenTree::Group(masked)
            }
            other => other,
        })
        .collect()
}

/// Put literals back in one pass, so literal text is never rescanned
fn restore_literals(text: &str, literals: &[String]) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(at) = rest.find(LITERAL_MARK) {
        out.push_str(&rest[..at]);
        let after = &rest[at + LITERAL_MARK.len()..];
        let digits = after.bytes().take_while(u8::is_ascii_digit).count();
        let literal = after[..digits]
            .parse::<usize>()
            .ok()
            .and_then(|index| literals.get(index));
        match (literal, after[digits..].strip_prefix("__")) {
            (Some(literal), Some(tail)) => {
                out.push_str(literal);
                rest = tail;
            }
            _ => {
                out.push_str(LITERAL_MARK);
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}
