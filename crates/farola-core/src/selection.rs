// ── User device selection ──
//
// An ordered list of ids chosen by the operator. Its lifecycle is
// independent of the live subscription: ids that vanish from the stream
// stay selected until the consumer prunes them explicitly.

use std::sync::Arc;

use crate::model::{DeviceState, SnapshotMap};

/// A selected id resolved against the current snapshot.
#[derive(Debug, Clone, PartialEq)]
pub enum SelectedDevice {
    Known(Arc<DeviceState>),
    /// Selected, but not in the current snapshot.
    Stale(String),
}

impl SelectedDevice {
    pub fn id(&self) -> &str {
        match self {
            Self::Known(d) => &d.id,
            Self::Stale(id) => id,
        }
    }

    pub fn is_stale(&self) -> bool {
        matches!(self, Self::Stale(_))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    ids: Vec<String>,
}

impl Selection {
    pub fn new(ids: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            ids: ids.into_iter().map(Into::into).collect(),
        }
    }

    /// Replace the selection wholesale, in the caller's order.
    pub fn set(&mut self, ids: impl IntoIterator<Item = impl Into<String>>) {
        self.ids = ids.into_iter().map(Into::into).collect();
    }

    /// Select the id if absent, deselect it if present.
    pub fn toggle(&mut self, id: &str) {
        if let Some(pos) = self.ids.iter().position(|s| s == id) {
            self.ids.remove(pos);
        } else {
            self.ids.push(id.to_owned());
        }
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.iter().any(|s| s == id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Resolve every selected id, in selection order.
    pub fn resolve(&self, devices: &SnapshotMap) -> Vec<SelectedDevice> {
        self.ids
            .iter()
            .map(|id| {
                devices.get(id).map_or_else(
                    || SelectedDevice::Stale(id.clone()),
                    |d| SelectedDevice::Known(Arc::clone(d)),
                )
            })
            .collect()
    }

    /// Selected ids missing from the snapshot.
    pub fn stale_ids(&self, devices: &SnapshotMap) -> Vec<&str> {
        self.ids
            .iter()
            .filter(|id| !devices.contains_key(id.as_str()))
            .map(String::as_str)
            .collect()
    }

    /// Drop stale ids. Returns how many were removed.
    pub fn prune(&mut self, devices: &SnapshotMap) -> usize {
        let before = self.ids.len();
        self.ids.retain(|id| devices.contains_key(id));
        before - self.ids.len()
    }
}
