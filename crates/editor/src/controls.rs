//! Form control classification and seeding of live state from markup.

use crate::input_store::InputValueStore;
use html::dom_utils::collect_text;
use html::{Id, Node};
use std::collections::HashMap;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ControlType {
    /// Any input carrying a free-form value (text, hidden, number, email, ...).
    Text,
    Checkbox,
    Radio,
    Textarea,
    Select { multiple: bool },
    /// Buttons, files, images: never part of the submitted field set.
    Other,
}

pub fn control_type(node: &Node) -> Option<ControlType> {
    let name = node.name()?;
    let ty = match name {
        "input" => {
            let ty = node
                .attr("type")
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .unwrap_or("text");
            match ty.to_ascii_lowercase().as_str() {
                "checkbox" => ControlType::Checkbox,
                "radio" => ControlType::Radio,
                "submit" | "button" | "reset" | "image" | "file" => ControlType::Other,
                _ => ControlType::Text, // missing type defaults to text
            }
        }
        "textarea" => ControlType::Textarea,
        "select" => ControlType::Select {
            multiple: node.has_attr("multiple"),
        },
        _ => return None,
    };
    Some(ty)
}

/// Value a checkbox/radio submits when checked.
pub fn checkable_value(node: &Node) -> &str {
    node.attr("value").unwrap_or("on")
}

/// Value an `<option>` submits: its `value` attribute, else its text.
pub fn option_value(option: &Node) -> String {
    match option.attr("value") {
        Some(v) => v.to_string(),
        None => {
            let mut text = String::new();
            collect_text(option.children(), &mut text);
            text.split_whitespace().collect::<Vec<_>>().join(" ")
        }
    }
}

/// `<option>` descendants of a select, in document order (through `<optgroup>`).
pub fn options_of(select: &Node) -> Vec<&Node> {
    fn walk<'a>(node: &'a Node, out: &mut Vec<&'a Node>) {
        for c in node.children() {
            if c.is_element("option") {
                out.push(c);
            } else if c.is_element("optgroup") {
                walk(c, out);
            }
        }
    }
    let mut out = Vec::new();
    walk(select, &mut out);
    out
}

pub(crate) fn textarea_initial_value(node: &Node) -> String {
    let mut initial = String::new();
    collect_text(node.children(), &mut initial);
    let mut initial = if initial.contains('\r') {
        initial.replace("\r\n", "\n").replace('\r', "\n")
    } else {
        initial
    };
    // HTML textarea parsing: if the first character is a newline, strip it.
    if initial.starts_with('\n') {
        initial.remove(0);
    }
    initial
}

/// Seed live state for every control under `root` that has none yet.
///
/// Radio groups are scoped by name; the last `checked` radio of a group wins, the way
/// a browser resolves conflicting defaults.
pub fn seed_input_state_from_dom(store: &mut InputValueStore, root: &Node) {
    let mut radio_groups: HashMap<String, Id> = HashMap::new();

    fn walk(store: &mut InputValueStore, node: &Node, radio_groups: &mut HashMap<String, Id>) {
        if let Some(ty) = control_type(node) {
            let id = node.id();
            match ty {
                ControlType::Text => {
                    store.ensure_initial(id, node.attr("value").unwrap_or("").to_string());
                }
                ControlType::Checkbox => {
                    store.ensure_initial_checked(id, node.has_attr("checked"));
                }
                ControlType::Radio => {
                    let already_present = store.has(id);
                    store.ensure_initial_checked(id, node.has_attr("checked"));
                    if let Some(group) = node.attr("name").filter(|n| !n.is_empty())
                        && store.is_checked(id)
                    {
                        if let Some(prev) = radio_groups.insert(group.to_string(), id)
                            && prev != id
                            && !already_present
                        {
                            store.set_checked(prev, false);
                        }
                    }
                }
                ControlType::Textarea => {
                    store.ensure_initial(id, textarea_initial_value(node));
                }
                ControlType::Select { multiple } => {
                    let options = options_of(node);
                    // single select: the last `selected` option, else the first option
                    let single = options
                        .iter()
                        .rposition(|o| o.has_attr("selected"))
                        .unwrap_or(0);
                    for (i, option) in options.iter().enumerate() {
                        let selected = if multiple {
                            option.has_attr("selected")
                        } else {
                            i == single
                        };
                        store.ensure_initial_selected(option.id(), selected);
                    }
                }
                ControlType::Other => {}
            }
            // Controls have no nested controls worth seeding.
            return;
        }
        for c in node.children() {
            walk(store, c, radio_groups);
        }
    }

    walk(store, root, &mut radio_groups);
}
