use bus::{Bus, CoreCommand};
use core_types::WidgetNumber;
use editor::{FormContainer, FormEvent, SessionHost, SessionState, SessionView, WidgetProps};
use net::{LocalTransport, RetryPolicy};
use runtime_net::start_render_runtime;
use serde_json::json;
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use std::sync::mpsc::{Receiver, Sender};
use std::time::{Duration, Instant};
use widgets::{BOOKKEEPING_FIELDS, FieldNames, RenderRequest, WidgetInstance, WidgetRegistry, render};

fn instance(value: serde_json::Value) -> WidgetInstance {
    serde_json::from_value(value).expect("instance fixture")
}

fn mounted(identifier: &str, inst: &WidgetInstance) -> (FormContainer, WidgetInstance) {
    let registry = WidgetRegistry::with_builtins();
    let number = WidgetNumber::from_raw(-4);
    let result = render(&registry, &RenderRequest::read(identifier, inst.clone(), number)).unwrap();
    let container = FormContainer::new(FieldNames::new(&result.id_base, number), &result.id.to_string(), &result.form);
    (container, result.instance)
}

#[test]
fn unedited_text_form_extracts_its_instance() {
    let inst = instance(json!({ "title": "Find stuff" }));
    let (container, _) = mounted("search", &inst);
    assert_eq!(container.extract_changes(), inst);
}

#[test]
fn unedited_forms_round_trip_through_update() {
    let registry = WidgetRegistry::with_builtins();
    let fixtures = [
        ("search", json!({ "title": "" })),
        ("text", json!({ "title": "Hello", "text": "Body", "filter": true })),
        ("text", json!({ "title": "Plain", "text": "", "filter": false })),
        ("categories", json!({ "title": "Cats", "count": true, "hierarchical": false, "dropdown": true })),
        ("archives", json!({ "title": "", "count": false, "dropdown": true })),
        ("tag_cloud", json!({ "title": "Tags", "taxonomy": "category", "count": true })),
    ];
    for (identifier, value) in fixtures {
        let (container, rendered) = mounted(identifier, &instance(value));
        let extracted = container.extract_changes();
        for field in BOOKKEEPING_FIELDS {
            assert!(!extracted.contains(field), "`{identifier}` leaked `{field}`");
        }
        let widget = registry.resolve(identifier).unwrap();
        assert_eq!(
            widget.update(&extracted, &rendered),
            rendered,
            "`{identifier}` extracted {extracted:?}"
        );
    }
}

struct Harness {
    host: SessionHost<Sender<CoreCommand>>,
    events: Receiver<bus::CoreEvent>,
}

impl Harness {
    fn new() -> Self {
        let (bus, cmd_rx) = Bus::new();
        let transport = Arc::new(LocalTransport::new(Arc::new(WidgetRegistry::with_builtins())));
        let retry = RetryPolicy {
            max_attempts: 2,
            initial_backoff_ms: 1,
            max_backoff_ms: 1,
        };
        // Detached: the runtime exits once the host's command sender is dropped.
        let _runtime = start_render_runtime(cmd_rx, bus.evt_tx.clone(), transport, retry);
        Self {
            host: SessionHost::new(bus.cmd_tx),
            events: bus.evt_rx,
        }
    }

    fn settle(&mut self, id: core_types::SessionId) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while self.host.get(id).is_some_and(|s| s.is_rendering()) {
            assert!(Instant::now() < deadline, "session {id} never settled");
            self.host.pump_one(&self.events, Duration::from_millis(50));
        }
    }
}

#[test]
fn search_edit_cycle_end_to_end() {
    let mut harness = Harness::new();
    let owned: Rc<RefCell<Vec<WidgetInstance>>> = Rc::default();
    let lifecycle: Rc<RefCell<Vec<FormEvent>>> = Rc::default();

    let (owner, log) = (owned.clone(), lifecycle.clone());
    let id = harness
        .host
        .open_with(WidgetProps::new("search", WidgetInstance::new()), move |session| {
            session.set_owner(move |inst: &WidgetInstance| owner.borrow_mut().push(inst.clone()));
            session.add_form_listener(move |event: FormEvent, _: &FormContainer| log.borrow_mut().push(event));
        })
        .unwrap();
    harness.settle(id);

    let session = harness.host.get_mut(id).unwrap();
    assert_eq!(session.state(), SessionState::Idle);
    let result = session.last_result().unwrap();
    assert_eq!(result.id_base, "search");
    assert!(!result.form.is_empty());
    session.form_mut().unwrap().set_field_value("title", "Find stuff").unwrap();

    harness.host.submit_update(id).unwrap();
    harness.settle(id);

    let expected = instance(json!({ "title": "Find stuff" }));
    let session = harness.host.get(id).unwrap();
    assert_eq!(session.instance(), &expected);
    assert_eq!(*owned.borrow(), vec![expected.clone()]);
    let SessionView::Form(form) = session.view() else {
        panic!("expected the form");
    };
    assert!(form.form_html().contains("Find stuff"));
    assert_eq!(*lifecycle.borrow(), vec![FormEvent::Mounted, FormEvent::Patched]);

    // The owner persisting the instance echoes it back; nothing is re-rendered.
    assert!(!harness.host.set_props(id, WidgetProps::new("search", expected)).unwrap());
    assert!(!harness.host.get(id).unwrap().is_rendering());

    harness.host.close(id).unwrap();
    assert!(harness.host.is_empty());
}

#[test]
fn unknown_widget_end_to_end() {
    let mut harness = Harness::new();
    let id = harness
        .host
        .open(WidgetProps::new("unknown_widget", WidgetInstance::new()))
        .unwrap();
    harness.settle(id);

    let session = harness.host.get(id).unwrap();
    assert_eq!(session.state(), SessionState::AwaitingInitialRender);
    assert!(matches!(session.view(), SessionView::Loading));
    assert!(session.last_error().is_some());
}
