use crate::entities::{escape_attr, escape_text};
use crate::tokenizer::is_void_element;
use crate::types::Node;

/// Serialize a node (and its subtree) back to markup.
pub fn to_html(node: &Node) -> String {
    let mut out = String::new();
    write_node(node, &mut out);
    out
}

fn write_node(node: &Node, out: &mut String) {
    match node {
        Node::Document {
            doctype, children, ..
        } => {
            if let Some(dt) = doctype {
                out.push_str("<!");
                out.push_str(dt);
                out.push('>');
            }
            for c in children {
                write_node(c, out);
            }
        }
        Node::Element {
            name,
            attributes,
            children,
            ..
        } => {
            out.push('<');
            out.push_str(name);
            for (k, v) in attributes {
                out.push(' ');
                out.push_str(k);
                if let Some(v) = v {
                    out.push_str("=\"");
                    escape_attr(v, out);
                    out.push('"');
                }
            }
            out.push('>');
            if is_void_element(name) {
                return;
            }
            let raw = matches!(name.as_str(), "script" | "style");
            for c in children {
                match c {
                    Node::Text { text, .. } if raw => out.push_str(text),
                    _ => write_node(c, out),
                }
            }
            out.push_str("</");
            out.push_str(name);
            out.push('>');
        }
        Node::Text { text, .. } => escape_text(text, out),
        Node::Comment { text, .. } => {
            out.push_str("<!--");
            out.push_str(text);
            out.push_str("-->");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse_fragment;

    #[test]
    fn serializes_fragment_back_to_equivalent_markup() {
        let src = r#"<p class="x">a &amp; b<br><input name="n" value="&quot;q&quot;" checked></p>"#;
        let nodes = parse_fragment(src);
        let html: String = nodes.iter().map(to_html).collect();
        assert_eq!(html, src);
    }

    #[test]
    fn script_bodies_are_not_escaped() {
        let nodes = parse_fragment("<script>if (a < b) {}</script>");
        assert_eq!(to_html(&nodes[0]), "<script>if (a < b) {}</script>");
    }
}
