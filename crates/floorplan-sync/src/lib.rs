//! Reconciliation channel transport for floorplan
//!
//! One server process owns the [`LayoutDocument`] and accepts iroh
//! connections on [`ALPN`]. Each client holds one bidirectional stream.
//! Frames are length-prefixed JSON messages from `floorplan-core`.
//!
//! - [`server`]: applies proposals and fans snapshots out to every client
//! - [`client`]: background thread bridging a client session to the server
//! - [`framing`]: the length-prefixed frame codec shared by both sides
//! - [`ticket`]: shareable encoding of the server's endpoint address
//!
//! [`LayoutDocument`]: floorplan_core::LayoutDocument

pub mod client;
pub mod framing;
pub mod server;
pub mod ticket;

/// Protocol identifier for the reconciliation channel
pub const ALPN: &[u8] = b"floorplan/channel/1";

pub use client::{start_client_thread, SyncCommand, SyncEvent, SyncHandle};
pub use server::{start_server, LayoutChannel, ServerHandle};
pub use ticket::{decode_ticket, encode_ticket};
