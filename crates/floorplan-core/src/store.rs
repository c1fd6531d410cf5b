//! Client-side state store
//!
//! Holds the areas and boxes as of the last snapshot. There is no local
//! mutation API for either collection: a snapshot replaces the whole
//! collection, and nothing else changes it. The only locally writable state
//! is the advisory [`LockShadow`], which snapshots never touch and which can
//! therefore disagree with a box's `locked` field until the next
//! `box_lock_updated` arrives.

use std::collections::{HashMap, HashSet};

use floorplan_geometry::ColumnLayout;

use crate::model::{Area, LayoutBox, Snapshot, SnapshotKind};
use crate::protocol::ServerMsg;

/// Client-local record of which boxes the user considers locked
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LockShadow {
    entries: HashMap<String, bool>,
}

impl LockShadow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shadow entry for a box, if one was ever recorded
    pub fn get(&self, name: &str) -> Option<bool> {
        self.entries.get(name).copied()
    }

    pub fn set(&mut self, name: impl Into<String>, locked: bool) {
        self.entries.insert(name.into(), locked);
    }

    /// Forget entries for boxes that no longer exist
    pub fn retain_names<'a>(&mut self, names: impl IntoIterator<Item = &'a str>) {
        let alive: HashSet<&str> = names.into_iter().collect();
        self.entries.retain(|name, _| alive.contains(name.as_str()));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// What an inbound message changed, for the renderer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreChange {
    Replaced(SnapshotKind),
    Lock { name: String, locked: bool },
}

/// Last-known server-confirmed layout of one client session
#[derive(Debug, Clone, Default)]
pub struct StateStore {
    areas: Vec<Area>,
    boxes: Vec<LayoutBox>,
    lock_shadow: LockShadow,
    layout: ColumnLayout,
    areas_revision: u64,
    boxes_revision: u64,
}

impl StateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace one collection wholesale. Never merges: records the snapshot
    /// omits are gone afterwards, along with their lock shadow entries.
    /// Areas are restacked into the column.
    pub fn apply_snapshot(&mut self, snapshot: Snapshot) -> SnapshotKind {
        let kind = snapshot.kind();
        match snapshot {
            Snapshot::Areas(mut areas) => {
                self.layout.stack(&mut areas);
                self.areas = areas;
                self.areas_revision += 1;
            }
            Snapshot::Boxes(boxes) => {
                self.lock_shadow
                    .retain_names(boxes.iter().map(|b| b.name.as_str()));
                self.boxes = boxes;
                self.boxes_revision += 1;
            }
        }
        tracing::debug!(kind = kind.label(), "applied snapshot");
        kind
    }

    /// Apply one inbound message to completion
    pub fn apply(&mut self, msg: ServerMsg) -> StoreChange {
        match msg {
            ServerMsg::BoxLockUpdated(lock) => {
                self.lock_shadow.set(lock.name.clone(), lock.locked);
                StoreChange::Lock {
                    name: lock.name,
                    locked: lock.locked,
                }
            }
            ServerMsg::UpdateAreas(areas) => {
                StoreChange::Replaced(self.apply_snapshot(Snapshot::Areas(areas)))
            }
            ServerMsg::UpdateBoxes(boxes) => {
                StoreChange::Replaced(self.apply_snapshot(Snapshot::Boxes(boxes)))
            }
        }
    }

    pub fn areas(&self) -> &[Area] {
        &self.areas
    }

    pub fn boxes(&self) -> &[LayoutBox] {
        &self.boxes
    }

    pub fn area(&self, name: &str) -> Option<&Area> {
        self.areas.iter().find(|a| a.name == name)
    }

    pub fn box_by_name(&self, name: &str) -> Option<&LayoutBox> {
        self.boxes.iter().find(|b| b.name == name)
    }

    pub fn lock_shadow(&self) -> &LockShadow {
        &self.lock_shadow
    }

    pub fn lock_shadow_mut(&mut self) -> &mut LockShadow {
        &mut self.lock_shadow
    }

    /// Whether drags of this box must be refused: the record says locked, or
    /// the shadow does
    pub fn is_drag_locked(&self, name: &str) -> bool {
        let record = self.box_by_name(name).is_some_and(|b| b.locked);
        record || self.lock_shadow.get(name) == Some(true)
    }

    /// The lock state a toggle flips: the shadow entry when there is one,
    /// otherwise the record
    pub fn effective_lock(&self, name: &str) -> bool {
        self.lock_shadow
            .get(name)
            .unwrap_or_else(|| self.box_by_name(name).is_some_and(|b| b.locked))
    }

    /// Number of area snapshots applied so far
    pub fn areas_revision(&self) -> u64 {
        self.areas_revision
    }

    /// Number of box snapshots applied so far
    pub fn boxes_revision(&self) -> u64 {
        self.boxes_revision
    }

    pub fn layout(&self) -> &ColumnLayout {
        &self.layout
    }
}
