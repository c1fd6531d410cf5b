//! Channel vocabulary
//!
//! Every message is a tagged variant discriminated by its event name. On the
//! wire a message is a JSON object `{"event": "<name>", "data": <payload>}`.
//! Outbound proposals are validated before they are sent; inbound frames
//! are decoded and validated before they reach the [`StateStore`].
//!
//! [`StateStore`]: crate::store::StateStore

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{Area, LayoutBox, Snapshot};

/// Largest frame either side will accept
pub const MAX_FRAME_LEN: usize = 16 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NameRef {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AreaResize {
    pub name: String,
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoxPosition {
    pub name: String,
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoxRotation {
    pub name: String,
    pub rotation: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoxLock {
    pub name: String,
    pub locked: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoxComment {
    pub name: String,
    pub comment: String,
}

/// Mutation proposals, client to server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ClientMsg {
    CreateArea(Area),
    UpdateArea(AreaResize),
    DeleteArea(NameRef),
    CreateBox(LayoutBox),
    UpdateBoxPosition(BoxPosition),
    UpdateBoxRotation(BoxRotation),
    UpdateBoxLock(BoxLock),
    UpdateBoxComment(BoxComment),
    DeleteBox(NameRef),
}

/// Snapshots and side-channel updates, server to every client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ServerMsg {
    UpdateAreas(Vec<Area>),
    UpdateBoxes(Vec<LayoutBox>),
    BoxLockUpdated(BoxLock),
}

/// A proposal that must not be sent
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProposalError {
    #[error("name must not be empty")]
    EmptyName,
    #[error("{field} must be a positive number, got {value}")]
    InvalidDimension { field: &'static str, value: f64 },
    #[error("{field} must be a finite number")]
    NonFiniteCoordinate { field: &'static str },
    #[error("{0:?} is not a number")]
    NotANumber(String),
    #[error("rotation must be a whole number of degrees, got {0:?}")]
    InvalidRotation(String),
    #[error("box {0:?} is locked")]
    Locked(String),
    #[error("no box named {0:?}")]
    UnknownBox(String),
    #[error("no area named {0:?}")]
    UnknownArea(String),
}

/// A frame that could not be turned into a message
#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("malformed frame: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("frame of {0} bytes exceeds the limit")]
    FrameTooLarge(usize),
    #[error("invalid {event} payload: {reason}")]
    Invalid { event: &'static str, reason: String },
}

fn check_name(name: &str) -> Result<(), ProposalError> {
    if name.trim().is_empty() {
        Err(ProposalError::EmptyName)
    } else {
        Ok(())
    }
}

fn check_dimension(field: &'static str, value: f64) -> Result<(), ProposalError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ProposalError::InvalidDimension { field, value })
    }
}

fn check_coordinate(field: &'static str, value: f64) -> Result<(), ProposalError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ProposalError::NonFiniteCoordinate { field })
    }
}

impl ClientMsg {
    /// Event name as it appears on the wire
    pub fn event_name(&self) -> &'static str {
        match self {
            ClientMsg::CreateArea(_) => "create_area",
            ClientMsg::UpdateArea(_) => "update_area",
            ClientMsg::DeleteArea(_) => "delete_area",
            ClientMsg::CreateBox(_) => "create_box",
            ClientMsg::UpdateBoxPosition(_) => "update_box_position",
            ClientMsg::UpdateBoxRotation(_) => "update_box_rotation",
            ClientMsg::UpdateBoxLock(_) => "update_box_lock",
            ClientMsg::UpdateBoxComment(_) => "update_box_comment",
            ClientMsg::DeleteBox(_) => "delete_box",
        }
    }

    /// Name of the entity the proposal targets
    pub fn target(&self) -> &str {
        match self {
            ClientMsg::CreateArea(area) => &area.name,
            ClientMsg::UpdateArea(resize) => &resize.name,
            ClientMsg::DeleteArea(r) | ClientMsg::DeleteBox(r) => &r.name,
            ClientMsg::CreateBox(b) => &b.name,
            ClientMsg::UpdateBoxPosition(p) => &p.name,
            ClientMsg::UpdateBoxRotation(r) => &r.name,
            ClientMsg::UpdateBoxLock(l) => &l.name,
            ClientMsg::UpdateBoxComment(c) => &c.name,
        }
    }

    /// Check the preconditions a proposal must meet before it is sent
    pub fn validate(&self) -> Result<(), ProposalError> {
        match self {
            ClientMsg::CreateArea(area) => {
                check_name(&area.name)?;
                check_dimension("width", area.width)?;
                check_dimension("height", area.height)
            }
            ClientMsg::UpdateArea(resize) => {
                check_dimension("width", resize.width)?;
                check_dimension("height", resize.height)
            }
            ClientMsg::CreateBox(b) => {
                check_name(&b.name)?;
                check_dimension("width", b.width)?;
                check_dimension("height", b.height)?;
                check_coordinate("x", b.x)?;
                check_coordinate("y", b.y)
            }
            ClientMsg::UpdateBoxPosition(p) => {
                check_coordinate("x", p.x)?;
                check_coordinate("y", p.y)
            }
            ClientMsg::DeleteArea(_)
            | ClientMsg::UpdateBoxRotation(_)
            | ClientMsg::UpdateBoxLock(_)
            | ClientMsg::UpdateBoxComment(_)
            | ClientMsg::DeleteBox(_) => Ok(()),
        }
    }

    pub fn encode(&self) -> Result<Vec<u8>, ChannelError> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Decode and validate a proposal received by the server
    pub fn decode(bytes: &[u8]) -> Result<Self, ChannelError> {
        check_frame_len(bytes)?;
        let msg: ClientMsg = serde_json::from_slice(bytes)?;
        msg.validate().map_err(|e| ChannelError::Invalid {
            event: msg.event_name(),
            reason: e.to_string(),
        })?;
        Ok(msg)
    }
}

impl ServerMsg {
    pub fn event_name(&self) -> &'static str {
        match self {
            ServerMsg::UpdateAreas(_) => "update_areas",
            ServerMsg::UpdateBoxes(_) => "update_boxes",
            ServerMsg::BoxLockUpdated(_) => "box_lock_updated",
        }
    }

    /// The snapshot carried by this message, if it is one
    pub fn into_snapshot(self) -> Option<Snapshot> {
        match self {
            ServerMsg::UpdateAreas(areas) => Some(Snapshot::Areas(areas)),
            ServerMsg::UpdateBoxes(boxes) => Some(Snapshot::Boxes(boxes)),
            ServerMsg::BoxLockUpdated(_) => None,
        }
    }

    /// Reject snapshots with geometry no renderer could draw.
    ///
    /// A snapshot is accepted or refused as a whole; a store never sees half
    /// of one.
    pub fn validate(&self) -> Result<(), String> {
        match self {
            ServerMsg::UpdateAreas(areas) => {
                for area in areas {
                    for (field, value) in [
                        ("width", area.width),
                        ("height", area.height),
                        ("x", area.x),
                        ("y", area.y),
                    ] {
                        if !value.is_finite() {
                            return Err(format!("area {:?} has non-finite {}", area.name, field));
                        }
                    }
                }
                Ok(())
            }
            ServerMsg::UpdateBoxes(boxes) => {
                for b in boxes {
                    for (field, value) in
                        [("width", b.width), ("height", b.height), ("x", b.x), ("y", b.y)]
                    {
                        if !value.is_finite() {
                            return Err(format!("box {:?} has non-finite {}", b.name, field));
                        }
                    }
                }
                Ok(())
            }
            ServerMsg::BoxLockUpdated(_) => Ok(()),
        }
    }

    pub fn encode(&self) -> Result<Vec<u8>, ChannelError> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Decode and validate a message received by a client
    pub fn decode(bytes: &[u8]) -> Result<Self, ChannelError> {
        check_frame_len(bytes)?;
        let msg: ServerMsg = serde_json::from_slice(bytes)?;
        msg.validate().map_err(|reason| ChannelError::Invalid {
            event: msg.event_name(),
            reason,
        })?;
        Ok(msg)
    }
}

fn check_frame_len(bytes: &[u8]) -> Result<(), ChannelError> {
    if bytes.len() > MAX_FRAME_LEN {
        Err(ChannelError::FrameTooLarge(bytes.len()))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn proposals_are_tagged_by_event_name() {
        let msg = ClientMsg::UpdateBoxPosition(BoxPosition {
            name: "sofa".into(),
            x: 5.0,
            y: 5.0,
        });
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(
            value,
            json!({"event": "update_box_position", "data": {"name": "sofa", "x": 5.0, "y": 5.0}})
        );
        assert_eq!(msg.event_name(), "update_box_position");
    }

    #[test]
    fn create_box_payload_matches_wire_schema() {
        let bytes = br##"{"event":"create_box","data":{"name":"sofa","width":100,"height":50,"x":10,"y":10,"color":"#add8e6","isCircle":false,"locked":false,"comment":" ","rotation":0}}"##;
        let msg = ClientMsg::decode(bytes).unwrap();
        let ClientMsg::CreateBox(sofa) = msg else {
            panic!("expected create_box");
        };
        assert_eq!(sofa.name, "sofa");
        assert_eq!(sofa.width, 100.0);
        assert_eq!(sofa.color, "#add8e6");
        assert_eq!(sofa.comment, " ");
    }

    #[test]
    fn lock_side_channel_round_trips_its_name() {
        let msg = ServerMsg::BoxLockUpdated(BoxLock {
            name: "sofa".into(),
            locked: true,
        });
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["event"], "box_lock_updated");
        assert_eq!(value["data"]["locked"], true);
    }

    #[test]
    fn unknown_events_are_rejected() {
        let err = ServerMsg::decode(br#"{"event":"update_everything","data":[]}"#).unwrap_err();
        assert!(matches!(err, ChannelError::Decode(_)));
    }

    #[test]
    fn wrong_payload_shape_is_rejected() {
        let err = ClientMsg::decode(br#"{"event":"update_box_rotation","data":{"name":"sofa","rotation":"ninety"}}"#)
            .unwrap_err();
        assert!(matches!(err, ChannelError::Decode(_)));
    }

    #[test]
    fn empty_names_never_validate() {
        let msg = ClientMsg::CreateArea(Area::with_default_size("  "));
        assert_eq!(msg.validate(), Err(ProposalError::EmptyName));

        let bytes = msg.encode().unwrap();
        assert!(matches!(
            ClientMsg::decode(&bytes),
            Err(ChannelError::Invalid { event: "create_area", .. })
        ));
    }

    #[test]
    fn non_positive_sizes_never_validate() {
        let msg = ClientMsg::UpdateArea(AreaResize {
            name: "Kitchen".into(),
            width: 0.0,
            height: 300.0,
        });
        assert_eq!(
            msg.validate(),
            Err(ProposalError::InvalidDimension { field: "width", value: 0.0 })
        );
    }

    #[test]
    fn oversized_frames_are_refused() {
        let big = vec![b' '; MAX_FRAME_LEN + 1];
        assert!(matches!(
            ServerMsg::decode(&big),
            Err(ChannelError::FrameTooLarge(n)) if n == MAX_FRAME_LEN + 1
        ));
    }

    #[test]
    fn snapshot_messages_unwrap_to_snapshots() {
        let msg = ServerMsg::UpdateAreas(vec![Area::with_default_size("Hall")]);
        let snapshot = msg.into_snapshot().unwrap();
        assert_eq!(snapshot.len(), 1);

        let lock = ServerMsg::BoxLockUpdated(BoxLock { name: "x".into(), locked: false });
        assert!(lock.into_snapshot().is_none());
    }
}
