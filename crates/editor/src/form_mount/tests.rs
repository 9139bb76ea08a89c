use super::*;
use crate::lifecycle::FormEvent;
use html::dom_utils::find_node_by_id;
use serde_json::json;
use std::cell::RefCell;
use std::rc::Rc;

const TEXT_FORM: &str = concat!(
    r#"<p><label for="widget-text--3-title">Title:</label>"#,
    r#"<input class="widefat" id="widget-text--3-title" name="widget-text[-3][title]" type="text" value="Hi"></p>"#,
    r#"<textarea name="widget-text[-3][text]">Body</textarea>"#,
    r#"<input type="hidden" name="widget-text[-3][filter]" value="0">"#,
    r#"<input type="checkbox" name="widget-text[-3][filter]" value="1">"#,
);

type Log = Rc<RefCell<Vec<(FormEvent, String)>>>;

fn names() -> FieldNames {
    FieldNames::new("text", WidgetNumber::from_raw(-3))
}

fn recording_mount() -> (FormMount, Log) {
    let log: Log = Rc::default();
    let mut mount = FormMount::new();
    let sink = log.clone();
    mount.add_listener(move |event: FormEvent, container: &FormContainer| {
        sink.borrow_mut().push((event, container.form_html().to_string()));
    });
    (mount, log)
}

fn element_named<'a>(root: &'a Node, name: &str) -> &'a Node {
    let mut found = None;
    for_each_element(root, &mut |n| {
        if found.is_none() && n.attr("name") == Some(name) {
            found = Some(n);
        }
    });
    found.expect("named element")
}

#[test]
fn mount_builds_container_with_bookkeeping_fields() {
    let (mut mount, log) = recording_mount();
    mount.mount(names(), "text--3", TEXT_FORM);

    let container = mount.container().unwrap();
    let dom = container.dom();
    assert!(find_by_class(dom, "widget-inside").is_some());
    assert_eq!(element_named(dom, "widget-id").attr("value"), Some("text--3"));
    assert_eq!(element_named(dom, "id_base").attr("value"), Some("text"));
    assert_eq!(element_named(dom, "widget_number").attr("value"), Some("-3"));
    assert_eq!(element_named(dom, "multi_number").attr("value"), Some(""));
    assert_eq!(element_named(dom, "add_new").attr("value"), Some(""));
    assert_eq!(container.content().unwrap().children().len(), 4);

    assert_eq!(*log.borrow(), vec![(FormEvent::Mounted, TEXT_FORM.to_string())]);
}

#[test]
fn identical_form_is_not_patched() {
    let (mut mount, log) = recording_mount();
    mount.mount(names(), "text--3", TEXT_FORM);

    assert!(!mount.apply_form(TEXT_FORM).unwrap());
    assert_eq!(log.borrow().len(), 1);
}

#[test]
fn patch_replaces_only_form_content() {
    let (mut mount, log) = recording_mount();
    mount.mount(names(), "text--3", TEXT_FORM);

    let container = mount.container_mut().unwrap();
    let hidden_id = element_named(container.dom(), "multi_number").id();
    let form_id = find_by_class(container.dom(), "widget-content").unwrap().id();
    container.set_field_value("multi_number", "7").unwrap();
    let old_title = element_named(container.dom(), "widget-text[-3][title]").id();

    let patched = TEXT_FORM.replace("value=\"Hi\"", "value=\"Hello\"");
    assert!(mount.apply_form(&patched).unwrap());

    let container = mount.container().unwrap();
    assert_eq!(element_named(container.dom(), "multi_number").id(), hidden_id);
    assert_eq!(find_by_class(container.dom(), "widget-content").unwrap().id(), form_id);
    assert_eq!(container.store().get(hidden_id), Some("7"));

    // The old title input is gone along with its live state.
    assert!(find_node_by_id(container.dom(), old_title).is_none());
    assert!(!container.store().has(old_title));
    let title = element_named(container.dom(), "widget-text[-3][title]").id();
    assert_eq!(container.store().get(title), Some("Hello"));

    assert_eq!(
        *log.borrow(),
        vec![(FormEvent::Mounted, TEXT_FORM.to_string()), (FormEvent::Patched, patched)]
    );
}

#[test]
fn apply_form_requires_a_mounted_form() {
    let mut mount = FormMount::new();
    assert_eq!(mount.apply_form(TEXT_FORM), Err(SyncError::NotMounted));
    assert_eq!(mount.extract_changes(), Err(SyncError::NotMounted));
    assert_eq!(mount.take_instance_change(), None);
}

#[test]
fn edits_flow_into_extracted_changes() {
    let mut mount = FormMount::new();
    mount.mount(names(), "text--3", TEXT_FORM);

    assert_eq!(
        serde_json::to_value(mount.extract_changes().unwrap()).unwrap(),
        json!({ "title": "Hi", "text": "Body", "filter": "0" })
    );

    let container = mount.container_mut().unwrap();
    assert!(container.set_field_value("title", "New title").unwrap());
    assert!(container.set_field_checked("filter", true).unwrap());
    assert!(!container.set_field_checked("filter", true).unwrap());

    assert_eq!(
        serde_json::to_value(mount.extract_changes().unwrap()).unwrap(),
        json!({ "title": "New title", "text": "Body", "filter": ["0", "1"] })
    );
}

#[test]
fn instance_changes_are_reported_once() {
    let mut mount = FormMount::new();
    mount.mount(names(), "text--3", TEXT_FORM);
    assert_eq!(mount.take_instance_change(), None);

    mount
        .container_mut()
        .unwrap()
        .set_field_value("widget-text[-3][text]", "Edited")
        .unwrap();
    let change = mount.take_instance_change().unwrap();
    assert_eq!(change.get_str("text"), Some("Edited"));
    assert_eq!(mount.take_instance_change(), None);
}

#[test]
fn selects_and_radios() {
    let form = concat!(
        r#"<select name="widget-a[-1][order]"><option value="asc">Up</option><option value="desc">Down</option></select>"#,
        r#"<select name="widget-a[-1][tags][]" multiple><option value="x"><option value="y"><option value="z"></select>"#,
        r#"<input type="radio" name="widget-a[-1][mode]" value="list" checked>"#,
        r#"<input type="radio" name="widget-a[-1][mode]" value="grid">"#,
    );
    let mut mount = FormMount::new();
    mount.mount(FieldNames::new("a", WidgetNumber::DEFAULT), "a--1", form);
    let container = mount.container_mut().unwrap();

    assert!(container.set_field_value("order", "desc").unwrap());
    assert!(container.select_option("tags", &["x", "z"]).unwrap());
    assert!(container.set_field_value("mode", "grid").unwrap());
    assert_eq!(
        container.select_option("order", &["sideways"]),
        Err(SyncError::UnknownOption {
            field: "order".into(),
            value: "sideways".into()
        })
    );
    assert_eq!(
        container.set_field_value("missing", "1"),
        Err(SyncError::UnknownField("missing".into()))
    );

    assert_eq!(
        serde_json::to_value(container.extract_changes()).unwrap(),
        json!({ "order": "desc", "tags": ["x", "z"], "mode": "grid" })
    );
}

#[test]
fn container_html_reflects_live_state() {
    let mut mount = FormMount::new();
    mount.mount(names(), "text--3", TEXT_FORM);
    let container = mount.container_mut().unwrap();
    container.set_field_value("title", "a \"quoted\" title").unwrap();
    container.set_field_value("text", "<b>raw</b>").unwrap();
    container.set_field_checked("filter", true).unwrap();

    let markup = container.container_html();
    assert!(markup.starts_with(r#"<div class="widget open"><div class="widget-inside"><form method="post">"#));
    assert!(markup.contains(r#"value="a &quot;quoted&quot; title""#), "{markup}");
    assert!(markup.contains("&lt;b&gt;raw&lt;/b&gt;</textarea>"), "{markup}");
    assert!(markup.contains(r#"value="1" checked"#), "{markup}");
}
