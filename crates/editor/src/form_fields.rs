//! Instance diff extraction.
//!
//! Reads the current value of every successful control in a mounted widget form and
//! rebuilds the instance-update payload from fields named
//! `widget-{id_base}[{number}][{field}]`.
//!
//! Repeated names follow form-data `getAll` semantics: one value yields a string, two
//! or more yield a list of strings in document order. A trailing `[]` on the name is
//! dropped from the key.

use crate::controls::{ControlType, checkable_value, control_type, option_value, options_of};
use crate::input_store::InputValueStore;
use core_types::WidgetNumber;
use html::Node;
use serde_json::Value;
use std::collections::BTreeMap;
use widgets::{BOOKKEEPING_FIELDS, WidgetInstance};

/// Successful controls under `root` as `(name, value)` pairs in document order.
///
/// Disabled and unnamed controls are skipped, as are buttons and file inputs.
pub fn form_data(root: &Node, store: &InputValueStore) -> Vec<(String, String)> {
    fn walk(node: &Node, store: &InputValueStore, out: &mut Vec<(String, String)>) {
        let Some(ty) = control_type(node) else {
            for c in node.children() {
                walk(c, store, out);
            }
            return;
        };
        if node.has_attr("disabled") {
            return;
        }
        let Some(name) = node.attr("name").filter(|n| !n.is_empty()) else {
            return;
        };
        let id = node.id();
        match ty {
            ControlType::Text => {
                let value = store.get(id).or_else(|| node.attr("value")).unwrap_or("");
                out.push((name.to_string(), value.to_string()));
            }
            ControlType::Textarea => {
                let value = match store.get(id) {
                    Some(v) => v.to_string(),
                    None => crate::controls::textarea_initial_value(node),
                };
                out.push((name.to_string(), value));
            }
            ControlType::Checkbox | ControlType::Radio => {
                let checked = if store.has(id) {
                    store.is_checked(id)
                } else {
                    node.has_attr("checked")
                };
                if checked {
                    out.push((name.to_string(), checkable_value(node).to_string()));
                }
            }
            ControlType::Select { .. } => {
                for option in options_of(node) {
                    if option.has_attr("disabled") {
                        continue;
                    }
                    let selected = if store.has_selection(option.id()) {
                        store.is_selected(option.id())
                    } else {
                        option.has_attr("selected")
                    };
                    if selected {
                        out.push((name.to_string(), option_value(option)));
                    }
                }
            }
            ControlType::Other => {}
        }
    }

    let mut out = Vec::new();
    walk(root, store, &mut out);
    out
}

/// Instance key for a field name, or `None` when the name belongs to another placement.
pub fn field_key<'a>(name: &'a str, prefix: &str) -> Option<&'a str> {
    let rest = name.strip_prefix(prefix)?;
    let key = rest
        .strip_suffix("][]")
        .or_else(|| rest.strip_suffix(']'))?;
    (!key.is_empty()).then_some(key)
}

pub fn is_bookkeeping_field(name: &str) -> bool {
    BOOKKEEPING_FIELDS.contains(&name)
}

/// Rebuild the instance from the form rooted at `root`.
pub fn extract_changes(
    root: &Node,
    store: &InputValueStore,
    id_base: &str,
    widget_number: WidgetNumber,
) -> WidgetInstance {
    let prefix = format!("widget-{id_base}[{widget_number}][");
    let mut grouped: BTreeMap<String, Vec<String>> = BTreeMap::new();

    for (name, value) in form_data(root, store) {
        if is_bookkeeping_field(&name) {
            continue;
        }
        let Some(key) = field_key(&name, &prefix) else {
            log::trace!(target: "editor.form_fields", "skipping foreign field `{name}`");
            continue;
        };
        if is_bookkeeping_field(key) {
            continue;
        }
        grouped.entry(key.to_string()).or_default().push(value);
    }

    grouped
        .into_iter()
        .map(|(key, mut values)| {
            let value = if values.len() == 1 {
                Value::String(values.remove(0))
            } else {
                Value::Array(values.into_iter().map(Value::String).collect())
            };
            (key, value)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controls::seed_input_state_from_dom;
    use html::build_dom;
    use html::dom_utils::assign_node_ids;
    use serde_json::json;

    fn dom(markup: &str) -> Node {
        let mut dom = build_dom(&html::tokenize(markup));
        assign_node_ids(&mut dom, 1);
        dom
    }

    #[test]
    fn field_keys_strip_prefix_and_brackets() {
        let prefix = "widget-search[-1][";
        assert_eq!(field_key("widget-search[-1][title]", prefix), Some("title"));
        assert_eq!(field_key("widget-search[-1][cats][]", prefix), Some("cats"));
        assert_eq!(field_key("widget-search[-2][title]", prefix), None);
        assert_eq!(field_key("widget-search[-1][]", prefix), None);
        assert_eq!(field_key("s", prefix), None);
    }

    #[test]
    fn extracts_values_and_drops_bookkeeping() {
        let root = dom(concat!(
            r#"<form><div class="form">"#,
            r#"<input name="widget-text[-1][title]" value="Hello">"#,
            r#"<textarea name="widget-text[-1][text]">"#,
            "\nline</textarea>",
            r#"<input type="hidden" name="widget-text[-1][filter]" value="0">"#,
            r#"<input type="checkbox" name="widget-text[-1][filter]" value="1" checked>"#,
            r#"<input type="checkbox" name="widget-text[-1][off]" value="1">"#,
            r#"<input name="widget-text[-1][gone]" value="x" disabled>"#,
            r#"<input type="submit" name="widget-text[-1][save]" value="Save">"#,
            r#"</div><input type="hidden" name="widget-id" value="text--1">"#,
            r#"<input type="hidden" name="id_base" value="text">"#,
            r#"<input type="hidden" name="widget_number" value="-1">"#,
            r#"<input type="hidden" name="multi_number" value="">"#,
            r#"<input type="hidden" name="add_new" value=""></form>"#,
        ));
        let store = InputValueStore::new();
        let instance = extract_changes(&root, &store, "text", WidgetNumber::DEFAULT);
        assert_eq!(
            serde_json::to_value(&instance).unwrap(),
            json!({ "title": "Hello", "text": "line", "filter": ["0", "1"] })
        );
    }

    #[test]
    fn widget_fields_named_like_bookkeeping_are_dropped() {
        let root = dom(concat!(
            r#"<input name="widget-search[-1][title]" value="t">"#,
            r#"<input type="hidden" name="widget-search[-1][multi_number]" value="3">"#,
            r#"<input type="hidden" name="widget-search[-1][widget-id]" value="search--1">"#,
            r#"<input type="hidden" name="widget-search[-1][add_new][]" value="multi">"#,
        ));
        let instance = extract_changes(&root, &InputValueStore::new(), "search", WidgetNumber::DEFAULT);
        assert_eq!(serde_json::to_value(&instance).unwrap(), json!({ "title": "t" }));
    }

    #[test]
    fn live_store_values_win_over_markup() {
        let root = dom(concat!(
            r#"<input name="widget-a[-1][t]" value="old">"#,
            r#"<input type="radio" name="widget-a[-1][r]" value="x" checked>"#,
            r#"<input type="radio" name="widget-a[-1][r]" value="y">"#,
            r#"<select name="widget-a[-1][s]"><option>One</option><option value="2">Two</option></select>"#,
            r#"<select name="widget-a[-1][m][]" multiple><option value="a" selected><option value="b"><option value="c" selected></select>"#,
        ));
        let mut store = InputValueStore::new();
        seed_input_state_from_dom(&mut store, &root);

        let before = extract_changes(&root, &store, "a", WidgetNumber::DEFAULT);
        assert_eq!(
            serde_json::to_value(&before).unwrap(),
            json!({ "t": "old", "r": "x", "s": "One", "m": ["a", "c"] })
        );

        store.set(input_valued(&root, "old"), "new".into());
        store.set_checked(input_valued(&root, "x"), false);
        store.set_checked(input_valued(&root, "y"), true);
        for (i, option) in options_of(select_named(&root, "widget-a[-1][s]")).into_iter().enumerate() {
            store.set_selected(option.id(), i == 1);
        }

        let after = extract_changes(&root, &store, "a", WidgetNumber::DEFAULT);
        assert_eq!(
            serde_json::to_value(&after).unwrap(),
            json!({ "t": "new", "r": "y", "s": "2", "m": ["a", "c"] })
        );
    }

    fn input_valued(root: &Node, value: &str) -> html::Id {
        let mut found = None;
        html::dom_utils::for_each_element(root, &mut |n| {
            if found.is_none() && n.is_element("input") && n.attr("value") == Some(value) {
                found = Some(n.id());
            }
        });
        found.expect("input fixture")
    }

    fn select_named<'a>(root: &'a Node, name: &str) -> &'a Node {
        let mut found = None;
        html::dom_utils::for_each_element(root, &mut |n| {
            if found.is_none() && n.is_element("select") && n.attr("name") == Some(name) {
                found = Some(n);
            }
        });
        found.expect("select fixture")
    }
}
