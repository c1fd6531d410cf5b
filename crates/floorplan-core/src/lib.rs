//! Core types for floorplan
//!
//! - [`model`]: areas and boxes as they travel over the wire
//! - [`protocol`]: the channel vocabulary and its boundary validation
//! - [`store`]: the client-side cache replaced by every snapshot
//! - [`document`]: the server-side layout authority and its persistence

pub mod document;
pub mod model;
pub mod protocol;
pub mod store;

pub use document::{default_storage_dir, LayoutDocument, PendingSave, AREAS_FILE, BOXES_FILE};
pub use model::{Area, LayoutBox, Snapshot, SnapshotKind};
pub use protocol::{
    AreaResize, BoxComment, BoxLock, BoxPosition, BoxRotation, ChannelError, ClientMsg, NameRef,
    ProposalError, ServerMsg, MAX_FRAME_LEN,
};
pub use store::{LockShadow, StateStore, StoreChange};
