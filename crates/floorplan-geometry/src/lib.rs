//! Geometry for floorplan layouts
//!
//! Everything crossing the wire is in pixels. Meters only show up at the
//! edge where a human types a size, and [`Scale`] converts between the two.
//! Areas never carry their own vertical position: [`ColumnLayout`] derives
//! it from the order and heights of the area list.

pub mod column;
pub mod units;

pub use column::{ColumnLayout, Stacked, AREA_LEFT, AREA_SPACING, AREA_TOP_OFFSET};
pub use units::{Scale, DEFAULT_METERS_TO_PIXELS};
