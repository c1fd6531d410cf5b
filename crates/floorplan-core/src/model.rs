//! Areas and boxes
//!
//! Field names on the wire match the persisted JSON files, so `isCircle`
//! stays camelCase. Records written before a field existed are read with
//! that field's default.

use floorplan_geometry::{Stacked, AREA_LEFT};
use serde::{Deserialize, Deserializer, Serialize};

/// Size given to a freshly created area, in pixels
pub const DEFAULT_AREA_WIDTH: f64 = 800.0;
pub const DEFAULT_AREA_HEIGHT: f64 = 600.0;

/// Where a new box appears before anyone drags it
pub const BOX_SPAWN_X: f64 = 10.0;
pub const BOX_SPAWN_Y: f64 = 10.0;

/// A named room. `name` is the identity and never changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Area {
    pub name: String,
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
}

impl Area {
    /// New area at the left edge; `y` is assigned by the column layout
    pub fn new(name: impl Into<String>, width: f64, height: f64) -> Self {
        Self {
            name: name.into(),
            width,
            height,
            x: AREA_LEFT,
            y: 0.0,
        }
    }

    /// New area with the default room size
    pub fn with_default_size(name: impl Into<String>) -> Self {
        Self::new(name, DEFAULT_AREA_WIDTH, DEFAULT_AREA_HEIGHT)
    }
}

impl Stacked for Area {
    fn height(&self) -> f64 {
        self.height
    }

    fn place(&mut self, x: f64, y: f64) {
        self.x = x;
        self.y = y;
    }
}

/// A placeable object on the canvas
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutBox {
    pub name: String,
    pub width: f64,
    pub height: f64,
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub color: String,
    #[serde(rename = "isCircle", default)]
    pub is_circle: bool,
    #[serde(default)]
    pub locked: bool,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub comment: String,
    #[serde(default)]
    pub rotation: i32,
}

impl LayoutBox {
    /// New unlocked, unrotated box at the spawn point
    pub fn new(
        name: impl Into<String>,
        width: f64,
        height: f64,
        color: impl Into<String>,
        is_circle: bool,
    ) -> Self {
        Self {
            name: name.into(),
            width,
            height,
            x: BOX_SPAWN_X,
            y: BOX_SPAWN_Y,
            color: color.into(),
            is_circle,
            locked: false,
            comment: String::new(),
            rotation: 0,
        }
    }

    pub fn has_comment(&self) -> bool {
        !self.comment.trim().is_empty()
    }
}

// Older clients sent `comment: null` when a prompt was dismissed.
fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Which collection a snapshot replaces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SnapshotKind {
    Areas,
    Boxes,
}

impl SnapshotKind {
    pub fn label(&self) -> &'static str {
        match self {
            SnapshotKind::Areas => "areas",
            SnapshotKind::Boxes => "boxes",
        }
    }
}

/// A full collection as broadcast by the authority
#[derive(Debug, Clone, PartialEq)]
pub enum Snapshot {
    Areas(Vec<Area>),
    Boxes(Vec<LayoutBox>),
}

impl Snapshot {
    pub fn kind(&self) -> SnapshotKind {
        match self {
            Snapshot::Areas(_) => SnapshotKind::Areas,
            Snapshot::Boxes(_) => SnapshotKind::Boxes,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Snapshot::Areas(areas) => areas.len(),
            Snapshot::Boxes(boxes) => boxes.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
