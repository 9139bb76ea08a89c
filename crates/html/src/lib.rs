pub mod dom_utils;
pub mod serialize;

mod dom_builder;
mod entities;
mod tokenizer;
mod types;

pub use crate::dom_builder::{build_dom, parse_fragment};
pub use crate::entities::{escape_attr, escape_text};
pub use crate::serialize::to_html;
pub use crate::tokenizer::tokenize;
pub use crate::types::{Id, Node, NodeId, Token};

/// Escape `s` for use as a double-quoted attribute value.
pub fn attr_escaped(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    escape_attr(s, &mut out);
    out
}

/// Escape `s` for use as text content.
pub fn text_escaped(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    escape_text(s, &mut out);
    out
}
