//! Layout authority: the canonical copy of every area and box
//!
//! Every proposal from every client is applied here, one at a time, in
//! arrival order. Whatever is applied last wins; nothing is versioned or
//! compared. After each proposal the affected collection is rebroadcast in
//! full, even when the proposal turned out to be a no-op.
//!
//! The two collections persist to `areas.json` and `boxes.json` in the
//! storage directory.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use floorplan_geometry::ColumnLayout;
use serde::de::DeserializeOwned;

use crate::model::{Area, LayoutBox};
use crate::protocol::{BoxLock, ClientMsg, ServerMsg};

/// File holding the persisted area list
pub const AREAS_FILE: &str = "areas.json";

/// File holding the persisted box list
pub const BOXES_FILE: &str = "boxes.json";

/// Get the default storage directory for the layout files
pub fn default_storage_dir() -> PathBuf {
    // Use XDG data directory if available, otherwise fallback to ~/.local/share
    let data_dir = std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".local/share")
        });
    data_dir.join("floorplan")
}

/// The canonical layout
#[derive(Debug, Clone, Default)]
pub struct LayoutDocument {
    areas: Vec<Area>,
    boxes: Vec<LayoutBox>,
    layout: ColumnLayout,
    /// Directory the layout files live in (if any)
    storage_dir: Option<PathBuf>,
    /// Whether there are unsaved changes
    dirty: bool,
}

impl LayoutDocument {
    /// Create a new empty document
    pub fn new() -> Self {
        Self::default()
    }

    /// Create from existing collections (restacking the areas)
    pub fn from_parts(mut areas: Vec<Area>, boxes: Vec<LayoutBox>) -> Self {
        let layout = ColumnLayout::default();
        layout.stack(&mut areas);
        Self {
            areas,
            boxes,
            layout,
            storage_dir: None,
            dirty: false,
        }
    }

    /// Load both files from a directory. Missing files are empty collections.
    ///
    /// Boxes written before locking existed are backfilled as unlocked and
    /// the document is marked dirty so the next save rewrites them.
    pub fn load(dir: &Path) -> Result<Self> {
        let areas: Vec<Area> = read_collection(&dir.join(AREAS_FILE))?;

        let raw_boxes: Vec<serde_json::Value> = read_collection(&dir.join(BOXES_FILE))?;
        let backfilled = raw_boxes
            .iter()
            .filter(|b| b.get("locked").is_none())
            .count();
        let boxes = raw_boxes
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<LayoutBox>, _>>()
            .with_context(|| format!("Invalid box record in {}", dir.join(BOXES_FILE).display()))?;

        let mut doc = Self::from_parts(areas, boxes);
        doc.storage_dir = Some(dir.to_path_buf());
        if backfilled > 0 {
            tracing::info!(count = backfilled, "backfilled missing lock state");
            doc.dirty = true;
        }
        Ok(doc)
    }

    /// Save to the storage directory (no-op without one)
    pub fn save(&mut self) -> Result<()> {
        if let Some(dir) = self.storage_dir.clone() {
            self.write_files(&dir)?;
        }
        Ok(())
    }

    /// Save to a specific directory and keep saving there
    pub fn save_to(&mut self, dir: &Path) -> Result<()> {
        self.write_files(dir)?;
        self.storage_dir = Some(dir.to_path_buf());
        Ok(())
    }

    /// Serialize unsaved changes so they can be written off the async
    /// runtime. The document counts as saved from here on.
    ///
    /// `None` when nothing changed or there is no storage directory.
    pub fn take_pending_save(&mut self) -> Result<Option<PendingSave>> {
        if !self.dirty {
            return Ok(None);
        }
        let Some(dir) = self.storage_dir.clone() else {
            return Ok(None);
        };
        let pending = self.serialize(dir)?;
        self.dirty = false;
        Ok(Some(pending))
    }

    fn write_files(&mut self, dir: &Path) -> Result<()> {
        self.serialize(dir.to_path_buf())?.write()?;
        self.dirty = false;
        Ok(())
    }

    fn serialize(&self, dir: PathBuf) -> Result<PendingSave> {
        Ok(PendingSave {
            dir,
            areas: serde_json::to_string_pretty(&self.areas)?,
            boxes: serde_json::to_string_pretty(&self.boxes)?,
        })
    }

    pub fn storage_dir(&self) -> Option<&Path> {
        self.storage_dir.as_deref()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn areas(&self) -> &[Area] {
        &self.areas
    }

    pub fn boxes(&self) -> &[LayoutBox] {
        &self.boxes
    }

    pub fn areas_snapshot(&self) -> ServerMsg {
        ServerMsg::UpdateAreas(self.areas.clone())
    }

    pub fn boxes_snapshot(&self) -> ServerMsg {
        ServerMsg::UpdateBoxes(self.boxes.clone())
    }

    /// Everything a newly connected client is sent, in order
    pub fn welcome(&self) -> Vec<ServerMsg> {
        vec![self.areas_snapshot(), self.boxes_snapshot()]
    }

    /// Apply one proposal and return what must be broadcast to every client
    pub fn apply(&mut self, msg: &ClientMsg) -> Vec<ServerMsg> {
        let changed = match msg {
            ClientMsg::CreateArea(area) => {
                if self.area_index(&area.name).is_some() {
                    tracing::warn!(name = %area.name, "area already exists");
                    false
                } else {
                    self.areas.push(area.clone());
                    true
                }
            }
            ClientMsg::UpdateArea(resize) => match self.area_index(&resize.name) {
                Some(idx) => {
                    self.areas[idx].width = resize.width;
                    self.areas[idx].height = resize.height;
                    true
                }
                None => false,
            },
            ClientMsg::DeleteArea(target) => {
                let before = self.areas.len();
                self.areas.retain(|a| a.name != target.name);
                self.areas.len() != before
            }
            ClientMsg::CreateBox(b) => {
                if self.box_index(&b.name).is_some() {
                    tracing::warn!(name = %b.name, "box already exists");
                    false
                } else {
                    let mut b = b.clone();
                    // Newly created boxes always start unlocked
                    b.locked = false;
                    self.boxes.push(b);
                    true
                }
            }
            ClientMsg::UpdateBoxPosition(pos) => self.with_box(&pos.name, |b| {
                b.x = pos.x;
                b.y = pos.y;
            }),
            ClientMsg::UpdateBoxRotation(rot) => {
                self.with_box(&rot.name, |b| b.rotation = rot.rotation)
            }
            ClientMsg::UpdateBoxLock(lock) => self.with_box(&lock.name, |b| b.locked = lock.locked),
            ClientMsg::UpdateBoxComment(c) => {
                self.with_box(&c.name, |b| b.comment = c.comment.clone())
            }
            ClientMsg::DeleteBox(target) => {
                let before = self.boxes.len();
                self.boxes.retain(|b| b.name != target.name);
                self.boxes.len() != before
            }
        };

        if changed {
            self.dirty = true;
        } else {
            tracing::debug!(event = msg.event_name(), target = msg.target(), "proposal had no effect");
        }

        match msg {
            ClientMsg::CreateArea(_) | ClientMsg::UpdateArea(_) | ClientMsg::DeleteArea(_) => {
                self.layout.stack(&mut self.areas);
                vec![self.areas_snapshot()]
            }
            ClientMsg::UpdateBoxLock(lock) => vec![
                ServerMsg::BoxLockUpdated(BoxLock {
                    name: lock.name.clone(),
                    locked: lock.locked,
                }),
                self.boxes_snapshot(),
            ],
            _ => vec![self.boxes_snapshot()],
        }
    }

    fn area_index(&self, name: &str) -> Option<usize> {
        self.areas.iter().position(|a| a.name == name)
    }

    fn box_index(&self, name: &str) -> Option<usize> {
        self.boxes.iter().position(|b| b.name == name)
    }

    fn with_box(&mut self, name: &str, f: impl FnOnce(&mut LayoutBox)) -> bool {
        match self.box_index(name) {
            Some(idx) => {
                f(&mut self.boxes[idx]);
                true
            }
            None => false,
        }
    }
}

fn read_collection<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Invalid JSON in {}", path.display()))
}

/// Both layout files, serialized and waiting to be written
#[derive(Debug)]
pub struct PendingSave {
    dir: PathBuf,
    areas: String,
    boxes: String,
}

impl PendingSave {
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Blocking write of both files
    pub fn write(self) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create {}", self.dir.display()))?;
        for (name, content) in [(AREAS_FILE, self.areas), (BOXES_FILE, self.boxes)] {
            let path = self.dir.join(name);
            fs::write(&path, content)
                .with_context(|| format!("Failed to write {}", path.display()))?;
        }
        Ok(())
    }
}
