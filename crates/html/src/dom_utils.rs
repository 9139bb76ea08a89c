use crate::{Id, Node};

/// Assign ids to every node that does not have one yet, starting after `next`.
///
/// Returns the next free id so later insertions keep ids unique within a tree.
pub fn assign_node_ids(root: &mut Node, next: u32) -> u32 {
    fn walk(node: &mut Node, next: &mut u32) {
        // only assign if currently unset
        if node.id() == Id::UNASSIGNED {
            node.set_id(Id(*next));
            *next = next.wrapping_add(1).max(1);
        }
        if let Some(children) = node.children_mut() {
            for c in children {
                walk(c, next);
            }
        }
    }

    let mut next = next.max(1);
    walk(root, &mut next);
    next
}

pub fn find_node_by_id(node: &Node, id: Id) -> Option<&Node> {
    if node.id() == id {
        return Some(node);
    }
    node.children().iter().find_map(|c| find_node_by_id(c, id))
}

/// First element (pre-order) carrying `class`.
pub fn find_by_class<'a>(node: &'a Node, class: &str) -> Option<&'a Node> {
    if node.has_class(class) {
        return Some(node);
    }
    node.children().iter().find_map(|c| find_by_class(c, class))
}

pub fn find_by_class_mut<'a>(node: &'a mut Node, class: &str) -> Option<&'a mut Node> {
    if node.has_class(class) {
        return Some(node);
    }
    node.children_mut()?
        .iter_mut()
        .find_map(|c| find_by_class_mut(c, class))
}

/// Visit every element in document order.
pub fn for_each_element<'a>(node: &'a Node, f: &mut impl FnMut(&'a Node)) {
    if let Node::Element { .. } = node {
        f(node);
    }
    for c in node.children() {
        for_each_element(c, f);
    }
}

/// Mutable variant of [`for_each_element`].
pub fn for_each_element_mut(node: &mut Node, f: &mut impl FnMut(&mut Node)) {
    if let Node::Element { .. } = node {
        f(node);
    }
    if let Some(children) = node.children_mut() {
        for c in children {
            for_each_element_mut(c, f);
        }
    }
}

pub fn collect_text(nodes: &[Node], out: &mut String) {
    for n in nodes {
        match n {
            Node::Text { text, .. } => out.push_str(text),
            Node::Element { children, .. } | Node::Document { children, .. } => {
                collect_text(children, out);
            }
            Node::Comment { .. } => {}
        }
    }
}
