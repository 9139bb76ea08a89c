//! Mounted widget forms.
//!
//! The container is built once per placement. Later renders only replace the children
//! of its `.widget-content` node, so the form wrapper and the hidden bookkeeping inputs
//! keep their node ids, attributes and live values across updates.

use crate::controls::{ControlType, checkable_value, control_type, option_value, options_of, seed_input_state_from_dom};
use crate::error::SyncError;
use crate::form_fields;
use crate::input_store::InputValueStore;
use crate::lifecycle::FormLifecycleListener;
use core_types::WidgetNumber;
use html::dom_utils::{assign_node_ids, find_by_class, find_by_class_mut, for_each_element, for_each_element_mut};
use html::{Id, Node};
use std::collections::HashSet;
use widgets::{FieldNames, WidgetInstance};

const CONTENT_CLASS: &str = "widget-content";

fn skeleton(names: &FieldNames, widget_id: &str) -> String {
    format!(
        concat!(
            r#"<div class="widget open"><div class="widget-inside"><form method="post">"#,
            r#"<div class="widget-content"></div>"#,
            r#"<input type="hidden" name="widget-id" class="widget-id" value="{widget_id}">"#,
            r#"<input type="hidden" name="id_base" class="id_base" value="{id_base}">"#,
            r#"<input type="hidden" name="widget_number" class="widget_number" value="{number}">"#,
            r#"<input type="hidden" name="multi_number" class="multi_number" value="">"#,
            r#"<input type="hidden" name="add_new" class="add_new" value="">"#,
            "</form></div></div>",
        ),
        widget_id = html::attr_escaped(widget_id),
        id_base = html::attr_escaped(names.id_base()),
        number = names.number(),
    )
}

/// A named, enabled control found in the container.
struct Control {
    id: Id,
    ty: ControlType,
    hidden: bool,
    /// Submitted value of a checkbox/radio.
    value: String,
    /// `(option id, option value)` of a select.
    options: Vec<(Id, String)>,
}

/// The DOM of one mounted widget form plus the live state of its controls.
#[derive(Clone, Debug)]
pub struct FormContainer {
    dom: Node,
    store: InputValueStore,
    names: FieldNames,
    form_html: String,
    next_id: u32,
}

impl FormContainer {
    pub fn new(names: FieldNames, widget_id: &str, form_html: &str) -> Self {
        let mut dom = html::build_dom(&html::tokenize(&skeleton(&names, widget_id)));
        let next_id = assign_node_ids(&mut dom, 1);
        let mut container = Self {
            dom,
            store: InputValueStore::new(),
            names,
            form_html: String::new(),
            next_id,
        };
        container.replace_content(form_html);
        container
    }

    fn replace_content(&mut self, form_html: &str) {
        let mut nodes = html::parse_fragment(form_html);
        for node in &mut nodes {
            self.next_id = assign_node_ids(node, self.next_id);
        }
        match find_by_class_mut(&mut self.dom, CONTENT_CLASS).and_then(Node::children_mut) {
            Some(children) => *children = nodes,
            None => log::warn!(target: "editor.form_mount", "container lost its `.{CONTENT_CLASS}` node"),
        }

        let mut live = HashSet::new();
        for_each_element(&self.dom, &mut |n| {
            live.insert(n.id());
        });
        self.store.retain(|id| live.contains(&id));
        seed_input_state_from_dom(&mut self.store, &self.dom);
        self.form_html = form_html.to_string();
    }

    pub fn dom(&self) -> &Node {
        &self.dom
    }

    /// The `.widget-content` node holding the rendered form.
    pub fn content(&self) -> Option<&Node> {
        find_by_class(&self.dom, CONTENT_CLASS)
    }

    pub fn store(&self) -> &InputValueStore {
        &self.store
    }

    pub fn names(&self) -> &FieldNames {
        &self.names
    }

    pub fn id_base(&self) -> &str {
        self.names.id_base()
    }

    pub fn widget_number(&self) -> WidgetNumber {
        self.names.number()
    }

    /// The form markup last applied.
    pub fn form_html(&self) -> &str {
        &self.form_html
    }

    /// Instance changes as currently entered in the form.
    pub fn extract_changes(&self) -> WidgetInstance {
        form_fields::extract_changes(&self.dom, &self.store, self.names.id_base(), self.names.number())
    }

    /// Serialize the container with live control state written back into the markup.
    pub fn container_html(&self) -> String {
        let mut dom = self.dom.clone();
        let store = &self.store;
        for_each_element_mut(&mut dom, &mut |n| {
            let id = n.id();
            if n.is_element("option") {
                if store.has_selection(id) {
                    if store.is_selected(id) {
                        n.set_attr("selected", None);
                    } else {
                        n.remove_attr("selected");
                    }
                }
                return;
            }
            match control_type(n) {
                Some(ControlType::Text) => {
                    if let Some(value) = store.get(id) {
                        n.set_attr("value", Some(value.to_string()));
                    }
                }
                Some(ControlType::Checkbox | ControlType::Radio) if store.has(id) => {
                    if store.is_checked(id) {
                        n.set_attr("checked", None);
                    } else {
                        n.remove_attr("checked");
                    }
                }
                Some(ControlType::Textarea) => {
                    if let Some(value) = store.get(id)
                        && let Some(children) = n.children_mut()
                    {
                        *children = vec![Node::text(value)];
                    }
                }
                _ => {}
            }
        });
        html::to_html(&dom)
    }

    fn collect_controls(&self, name: &str) -> Vec<Control> {
        let mut out = Vec::new();
        for_each_element(&self.dom, &mut |n| {
            if n.attr("name") != Some(name) || n.has_attr("disabled") {
                return;
            }
            let Some(ty) = control_type(n).filter(|ty| *ty != ControlType::Other) else {
                return;
            };
            let options = match ty {
                ControlType::Select { .. } => options_of(n)
                    .into_iter()
                    .map(|o| (o.id(), option_value(o)))
                    .collect(),
                _ => Vec::new(),
            };
            out.push(Control {
                id: n.id(),
                ty,
                hidden: n.attr("type").is_some_and(|t| t.trim().eq_ignore_ascii_case("hidden")),
                value: checkable_value(n).to_string(),
                options,
            });
        });
        out
    }

    /// Controls named `name`, or named after the widget field `name`.
    fn controls(&self, name: &str) -> Result<Vec<Control>, SyncError> {
        let field = self.names.field_name(name);
        [name.to_string(), format!("{field}[]"), field]
            .iter()
            .map(|candidate| self.collect_controls(candidate))
            .find(|found| !found.is_empty())
            .ok_or_else(|| SyncError::UnknownField(name.to_string()))
    }

    /// Type into a text control, pick a radio by value, or choose a select option.
    ///
    /// Returns whether anything changed.
    pub fn set_field_value(&mut self, name: &str, value: &str) -> Result<bool, SyncError> {
        let controls = self.controls(name)?;

        if controls.iter().any(|c| c.ty == ControlType::Radio) {
            let target = controls
                .iter()
                .find(|c| c.ty == ControlType::Radio && c.value == value)
                .map(|c| c.id)
                .ok_or_else(|| SyncError::UnknownOption {
                    field: name.to_string(),
                    value: value.to_string(),
                })?;
            let mut changed = false;
            for radio in controls.iter().filter(|c| c.ty == ControlType::Radio) {
                changed |= self.store.set_checked(radio.id, radio.id == target);
            }
            return Ok(changed);
        }

        if let Some(select) = controls.iter().find(|c| matches!(c.ty, ControlType::Select { .. })) {
            return Self::select_in(&mut self.store, name, select, &[value]);
        }

        // A visible control wins over the hidden fallback paired with a checkbox.
        let text = controls
            .iter()
            .filter(|c| matches!(c.ty, ControlType::Text | ControlType::Textarea))
            .min_by_key(|c| c.hidden)
            .ok_or_else(|| SyncError::UnknownField(name.to_string()))?;
        Ok(self.store.set(text.id, value.to_string()))
    }

    /// Check or uncheck a checkbox (or radio) by name.
    pub fn set_field_checked(&mut self, name: &str, checked: bool) -> Result<bool, SyncError> {
        let controls = self.controls(name)?;
        let target = controls
            .iter()
            .find(|c| matches!(c.ty, ControlType::Checkbox | ControlType::Radio))
            .ok_or_else(|| SyncError::UnknownField(name.to_string()))?;

        let mut changed = self.store.set_checked(target.id, checked);
        if target.ty == ControlType::Radio && checked {
            for other in controls.iter().filter(|c| c.ty == ControlType::Radio && c.id != target.id) {
                changed |= self.store.set_checked(other.id, false);
            }
        }
        Ok(changed)
    }

    /// Make `values` the selection of a select control.
    pub fn select_option(&mut self, name: &str, values: &[&str]) -> Result<bool, SyncError> {
        let controls = self.controls(name)?;
        let select = controls
            .iter()
            .find(|c| matches!(c.ty, ControlType::Select { .. }))
            .ok_or_else(|| SyncError::UnknownField(name.to_string()))?;
        Self::select_in(&mut self.store, name, select, values)
    }

    fn select_in(
        store: &mut InputValueStore,
        name: &str,
        select: &Control,
        values: &[&str],
    ) -> Result<bool, SyncError> {
        if let Some(missing) = values
            .iter()
            .find(|v| !select.options.iter().any(|(_, o)| o.as_str() == **v)) {
            return Err(SyncError::UnknownOption {
                field: name.to_string(),
                value: missing.to_string(),
            });
        }
        let multiple = matches!(select.ty, ControlType::Select { multiple: true });
        // a single select keeps the first matching option only
        let single = values
            .first()
            .and_then(|v| select.options.iter().position(|(_, o)| o.as_str() == *v));

        let mut changed = false;
        for (i, (id, value)) in select.options.iter().enumerate() {
            let selected = if multiple {
                values.contains(&value.as_str())
            } else {
                single == Some(i)
            };
            changed |= store.set_selected(*id, selected);
        }
        Ok(changed)
    }
}

/// Owns the mounted form of one session and notifies lifecycle listeners.
#[derive(Default)]
pub struct FormMount {
    container: Option<FormContainer>,
    listeners: Vec<Box<dyn FormLifecycleListener>>,
    last_observed: Option<WidgetInstance>,
}

impl FormMount {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_listener(&mut self, listener: impl FormLifecycleListener + 'static) {
        self.listeners.push(Box::new(listener));
    }

    pub fn container(&self) -> Option<&FormContainer> {
        self.container.as_ref()
    }

    pub fn container_mut(&mut self) -> Option<&mut FormContainer> {
        self.container.as_mut()
    }

    /// Build the container around `form_html`, replacing any previous one.
    pub fn mount(&mut self, names: FieldNames, widget_id: &str, form_html: &str) {
        let container = FormContainer::new(names, widget_id, form_html);
        log::debug!(
            target: "editor.form_mount",
            "mounted `{}` #{} ({} bytes)",
            container.id_base(),
            container.widget_number(),
            form_html.len()
        );
        self.last_observed = Some(container.extract_changes());
        for listener in &mut self.listeners {
            listener.on_form_mounted(&container);
        }
        self.container = Some(container);
    }

    /// Swap in new form markup. Identical markup is a no-op and fires nothing.
    ///
    /// Returns whether the form was patched.
    pub fn apply_form(&mut self, form_html: &str) -> Result<bool, SyncError> {
        let container = self.container.as_mut().ok_or(SyncError::NotMounted)?;
        if container.form_html == form_html {
            return Ok(false);
        }
        container.replace_content(form_html);
        log::debug!(target: "editor.form_mount", "patched `{}` #{}", container.id_base(), container.widget_number());
        self.last_observed = Some(container.extract_changes());
        for listener in &mut self.listeners {
            listener.on_form_patched(container);
        }
        Ok(true)
    }

    pub fn extract_changes(&self) -> Result<WidgetInstance, SyncError> {
        self.container
            .as_ref()
            .map(FormContainer::extract_changes)
            .ok_or(SyncError::NotMounted)
    }

    /// The extracted instance, but only when it differs from the last one observed.
    pub fn take_instance_change(&mut self) -> Option<WidgetInstance> {
        let current = self.container.as_ref()?.extract_changes();
        if self.last_observed.as_ref() == Some(&current) {
            return None;
        }
        self.last_observed = Some(current.clone());
        Some(current)
    }

    pub fn unmount(&mut self) -> Option<FormContainer> {
        self.last_observed = None;
        self.container.take()
    }
}

#[cfg(test)]
mod tests;
