use crate::form_mount::FormContainer;

/// Notification fired on a mounted widget form.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FormEvent {
    Mounted,
    Patched,
}

impl FormEvent {
    /// Event name widget scripts listen for.
    pub fn legacy_name(self) -> &'static str {
        match self {
            FormEvent::Mounted => "widget-added",
            FormEvent::Patched => "widget-updated",
        }
    }
}

/// Observer of form mounts and patches, the hook third-party widget scripts attach to.
pub trait FormLifecycleListener {
    fn on_form_mounted(&mut self, container: &FormContainer);
    fn on_form_patched(&mut self, container: &FormContainer);
}

impl<F> FormLifecycleListener for F
where
    F: FnMut(FormEvent, &FormContainer),
{
    fn on_form_mounted(&mut self, container: &FormContainer) {
        self(FormEvent::Mounted, container);
    }

    fn on_form_patched(&mut self, container: &FormContainer) {
        self(FormEvent::Patched, container);
    }
}
