//! Form markup helpers for widget types.
//!
//! Field names follow the legacy convention `widget-{id_base}[{number}][{field}]`;
//! element ids follow `widget-{id_base}-{number}-{field}`.

use core_types::WidgetNumber;
use html::{attr_escaped, text_escaped};
use std::fmt::Write;

/// Name/id generator bound to one widget placement.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldNames {
    id_base: String,
    number: WidgetNumber,
}

impl FieldNames {
    pub fn new(id_base: impl Into<String>, number: WidgetNumber) -> Self {
        Self {
            id_base: id_base.into(),
            number,
        }
    }

    pub fn id_base(&self) -> &str {
        &self.id_base
    }

    pub fn number(&self) -> WidgetNumber {
        self.number
    }

    pub fn field_name(&self, field: &str) -> String {
        format!("widget-{}[{}][{}]", self.id_base, self.number, field)
    }

    pub fn field_id(&self, field: &str) -> String {
        format!("widget-{}-{}-{}", self.id_base, self.number, field)
    }

    /// Id of the widget object, `{id_base}-{number}`, as widget scripts read it.
    pub fn widget_id(&self) -> String {
        format!("{}-{}", self.id_base, self.number)
    }

    /// Prefix shared by every field name of this placement.
    pub fn prefix(&self) -> String {
        format!("widget-{}[{}][", self.id_base, self.number)
    }
}

/// Output buffer a widget type writes its form (or display) markup into.
///
/// Only what lands here is returned from a render; nothing else is captured.
#[derive(Debug)]
pub struct FormBuffer<'a> {
    names: &'a FieldNames,
    out: String,
}

impl<'a> FormBuffer<'a> {
    pub fn new(names: &'a FieldNames) -> Self {
        Self {
            names,
            out: String::new(),
        }
    }

    pub fn names(&self) -> &FieldNames {
        self.names
    }

    /// Append trusted markup verbatim.
    pub fn raw(&mut self, markup: &str) -> &mut Self {
        self.out.push_str(markup);
        self
    }

    pub fn text(&mut self, text: &str) -> &mut Self {
        self.out.push_str(&text_escaped(text));
        self
    }

    pub fn text_input(&mut self, label: &str, field: &str, value: &str) -> &mut Self {
        let id = self.names.field_id(field);
        let name = self.names.field_name(field);
        let _ = write!(
            self.out,
            r#"<p><label for="{id}">{label}</label> <input class="widefat" id="{id}" name="{name}" type="text" value="{value}"></p>"#,
            id = attr_escaped(&id),
            label = text_escaped(label),
            name = attr_escaped(&name),
            value = attr_escaped(value),
        );
        self
    }

    pub fn textarea(&mut self, label: &str, field: &str, value: &str) -> &mut Self {
        let id = self.names.field_id(field);
        let name = self.names.field_name(field);
        let _ = write!(
            self.out,
            r#"<p><label for="{id}">{label}</label><textarea class="widefat" rows="16" cols="20" id="{id}" name="{name}">{value}</textarea></p>"#,
            id = attr_escaped(&id),
            label = text_escaped(label),
            name = attr_escaped(&name),
            value = text_escaped(value),
        );
        self
    }

    /// Checkbox preceded by a hidden `0` of the same name, so an unchecked box still
    /// submits a value.
    pub fn checkbox(&mut self, label: &str, field: &str, checked: bool) -> &mut Self {
        let id = self.names.field_id(field);
        let name = self.names.field_name(field);
        let _ = write!(
            self.out,
            r#"<p><input type="hidden" name="{name}" value="0"><input class="checkbox" type="checkbox" id="{id}" name="{name}" value="1"{checked}> <label for="{id}">{label}</label></p>"#,
            id = attr_escaped(&id),
            label = text_escaped(label),
            name = attr_escaped(&name),
            checked = if checked { " checked" } else { "" },
        );
        self
    }

    pub fn select(&mut self, label: &str, field: &str, options: &[(&str, &str)], selected: &str) -> &mut Self {
        let id = self.names.field_id(field);
        let name = self.names.field_name(field);
        let _ = write!(
            self.out,
            r#"<p><label for="{id}">{label}</label><select class="widefat" id="{id}" name="{name}">"#,
            id = attr_escaped(&id),
            label = text_escaped(label),
            name = attr_escaped(&name),
        );
        for (value, caption) in options {
            let _ = write!(
                self.out,
                r#"<option value="{value}"{sel}>{caption}</option>"#,
                value = attr_escaped(value),
                sel = if *value == selected { " selected" } else { "" },
                caption = text_escaped(caption),
            );
        }
        self.out.push_str("</select></p>");
        self
    }

    pub fn into_markup(self) -> String {
        self.out
    }
}
