use crate::tokenizer::tokenize;
use crate::types::{Id, Node, Token};

/// Elements closed implicitly when a sibling of the same kind opens.
fn closes_open_sibling(opening: &str, open: &str) -> bool {
    match opening {
        "option" => open == "option",
        "li" => open == "li",
        "p" => open == "p",
        "tr" => open == "tr",
        "td" | "th" => open == "td" || open == "th",
        _ => false,
    }
}

pub fn build_dom(tokens: &[Token]) -> Node {
    let mut open: Vec<Node> = vec![Node::Document {
        id: Id::UNASSIGNED,
        doctype: None,
        children: Vec::new(),
    }];

    fn close_top(open: &mut Vec<Node>) {
        debug_assert!(open.len() > 1, "document root is never closed");
        if let Some(node) = open.pop()
            && let Some(children) = open.last_mut().and_then(Node::children_mut)
        {
            children.push(node);
        }
    }

    fn append(open: &mut [Node], node: Node) {
        if let Some(children) = open.last_mut().and_then(Node::children_mut) {
            children.push(node);
        }
    }

    for token in tokens {
        match token {
            Token::Doctype(s) => {
                if let Some(Node::Document { doctype, .. }) = open.first_mut() {
                    *doctype = Some(s.clone());
                }
            }
            Token::Comment(c) => append(
                &mut open,
                Node::Comment {
                    id: Id::UNASSIGNED,
                    text: c.clone(),
                },
            ),
            Token::Text(txt) => {
                if txt.is_empty() {
                    continue;
                }
                // Merge adjacent text runs so one text node holds one value.
                if let Some(children) = open.last_mut().and_then(Node::children_mut)
                    && let Some(Node::Text { text, .. }) = children.last_mut()
                {
                    text.push_str(txt);
                    continue;
                }
                append(&mut open, Node::text(txt.clone()));
            }
            Token::StartTag {
                name,
                attributes,
                self_closing,
            } => {
                if open.len() > 1
                    && let Some(top) = open.last().and_then(Node::name)
                    && closes_open_sibling(name, top)
                {
                    close_top(&mut open);
                }
                let node = Node::Element {
                    id: Id::UNASSIGNED,
                    name: name.clone(),
                    attributes: attributes.clone(),
                    children: Vec::new(),
                };
                if *self_closing {
                    append(&mut open, node);
                } else {
                    open.push(node);
                }
            }
            Token::EndTag(name) => {
                // Stray end tags (no matching open element) are dropped.
                let Some(pos) = open.iter().rposition(|n| n.is_element(name)) else {
                    continue;
                };
                while open.len() > pos {
                    close_top(&mut open);
                }
            }
        }
    }

    while open.len() > 1 {
        close_top(&mut open);
    }
    open.pop().unwrap_or(Node::Document {
        id: Id::UNASSIGNED,
        doctype: None,
        children: Vec::new(),
    })
}

/// Parse a markup fragment into its top-level nodes.
pub fn parse_fragment(html: &str) -> Vec<Node> {
    match build_dom(&tokenize(html)) {
        Node::Document { children, .. } => children,
        other => vec![other],
    }
}
