//! Live form control state, keyed by DOM node id.
//!
//! Markup carries the initial state; user edits land here without rewriting the DOM, the
//! same split a browser keeps between `defaultValue` and `value`.

use html::Id;
use std::collections::HashMap;

#[derive(Clone, Debug, Default)]
pub struct InputValueStore {
    values: HashMap<Id, String>,
    checked: HashMap<Id, bool>,
    /// Keyed by `<option>` node id.
    selected: HashMap<Id, bool>,
    revision: u64,
}

impl InputValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bumped on every user-visible change.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn has(&self, id: Id) -> bool {
        self.values.contains_key(&id) || self.checked.contains_key(&id)
    }

    pub fn get(&self, id: Id) -> Option<&str> {
        self.values.get(&id).map(String::as_str)
    }

    /// Set/overwrite the value for this control. Returns `true` if it changed.
    pub fn set(&mut self, id: Id, value: String) -> bool {
        if self.values.get(&id) == Some(&value) {
            return false;
        }
        self.values.insert(id, value);
        self.revision += 1;
        true
    }

    /// Ensure an entry exists; if missing, inserts the provided initial value.
    pub fn ensure_initial(&mut self, id: Id, initial: String) {
        self.values.entry(id).or_insert(initial);
    }

    pub fn is_checked(&self, id: Id) -> bool {
        self.checked.get(&id).copied().unwrap_or(false)
    }

    /// Returns `true` if the state actually changed.
    pub fn set_checked(&mut self, id: Id, checked: bool) -> bool {
        let prev = self.checked.insert(id, checked);
        let changed = prev != Some(checked) && (prev.is_some() || checked);
        if changed {
            self.revision += 1;
        }
        changed
    }

    pub fn ensure_initial_checked(&mut self, id: Id, initial_checked: bool) {
        self.checked.entry(id).or_insert(initial_checked);
    }

    pub fn is_selected(&self, option: Id) -> bool {
        self.selected.get(&option).copied().unwrap_or(false)
    }

    pub fn has_selection(&self, option: Id) -> bool {
        self.selected.contains_key(&option)
    }

    pub fn set_selected(&mut self, option: Id, selected: bool) -> bool {
        let prev = self.selected.insert(option, selected);
        let changed = prev != Some(selected);
        if changed {
            self.revision += 1;
        }
        changed
    }

    pub fn ensure_initial_selected(&mut self, option: Id, selected: bool) {
        self.selected.entry(option).or_insert(selected);
    }

    /// Drop state for every id not accepted by `keep`.
    pub fn retain(&mut self, mut keep: impl FnMut(Id) -> bool) {
        self.values.retain(|id, _| keep(*id));
        self.checked.retain(|id, _| keep(*id));
        self.selected.retain(|id, _| keep(*id));
    }

    /// Clear all stored input state.
    pub fn clear(&mut self) {
        self.values.clear();
        self.checked.clear();
        self.selected.clear();
        self.revision += 1;
    }
}
