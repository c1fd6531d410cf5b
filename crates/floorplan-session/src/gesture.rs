//! Gesture to proposal mapping
//!
//! [`propose`] is pure apart from the lock shadow: it reads the store, may
//! flip one shadow entry, and yields exactly one outbound message or the
//! reason none may be sent. Nothing here touches the network.

use floorplan_core::{
    Area, AreaResize, BoxComment, BoxLock, BoxPosition, BoxRotation, ClientMsg, LayoutBox,
    NameRef, ProposalError, StateStore,
};
use floorplan_geometry::Scale;

/// How far a duplicate is shifted from its original, on both axes
pub const DUPLICATE_OFFSET: f64 = 10.0;

/// The new-box form, sizes in meters
#[derive(Debug, Clone, PartialEq)]
pub struct BoxForm {
    pub name: String,
    pub width_m: f64,
    pub height_m: f64,
    pub color: String,
    pub is_circle: bool,
}

/// A user action that may turn into a proposal
#[derive(Debug, Clone, PartialEq)]
pub enum Gesture {
    CreateArea { name: String },
    /// New size in meters
    ModifyArea { name: String, width_m: f64, height_m: f64 },
    DeleteArea { name: String },
    CreateBox(BoxForm),
    /// Drop position in canvas pixels
    DragBox { name: String, x: f64, y: f64 },
    /// Degrees as typed by the user
    RotateBox { name: String, degrees: String },
    CommentBox { name: String, comment: String },
    ToggleLock { name: String },
    /// Copy `name` under `new_name`
    DuplicateBox { name: String, new_name: String },
    DeleteBox { name: String },
}

/// Map a gesture to the one proposal it produces
pub fn propose(
    store: &mut StateStore,
    scale: Scale,
    gesture: Gesture,
) -> Result<ClientMsg, ProposalError> {
    let msg = match gesture {
        Gesture::CreateArea { name } => {
            let mut area = Area::with_default_size(name);
            area.y = store.layout().next_top(store.areas());
            ClientMsg::CreateArea(area)
        }
        Gesture::ModifyArea { name, width_m, height_m } => {
            if store.area(&name).is_none() {
                return Err(ProposalError::UnknownArea(name));
            }
            ClientMsg::UpdateArea(AreaResize {
                name,
                width: scale.to_pixels(width_m),
                height: scale.to_pixels(height_m),
            })
        }
        Gesture::DeleteArea { name } => ClientMsg::DeleteArea(NameRef { name }),
        Gesture::CreateBox(form) => ClientMsg::CreateBox(LayoutBox::new(
            form.name,
            scale.to_pixels(form.width_m),
            scale.to_pixels(form.height_m),
            form.color,
            form.is_circle,
        )),
        Gesture::DragBox { name, x, y } => {
            require_box(store, &name)?;
            if store.is_drag_locked(&name) {
                tracing::debug!(%name, "drag refused, box is locked");
                return Err(ProposalError::Locked(name));
            }
            ClientMsg::UpdateBoxPosition(BoxPosition { name, x, y })
        }
        Gesture::RotateBox { name, degrees } => {
            require_box(store, &name)?;
            let rotation = parse_rotation(&degrees)?;
            ClientMsg::UpdateBoxRotation(BoxRotation { name, rotation })
        }
        Gesture::CommentBox { name, comment } => {
            require_box(store, &name)?;
            ClientMsg::UpdateBoxComment(BoxComment { name, comment })
        }
        Gesture::ToggleLock { name } => {
            require_box(store, &name)?;
            let locked = !store.effective_lock(&name);
            store.lock_shadow_mut().set(name.clone(), locked);
            ClientMsg::UpdateBoxLock(BoxLock { name, locked })
        }
        Gesture::DuplicateBox { name, new_name } => {
            let mut copy = require_box(store, &name)?.clone();
            copy.name = new_name;
            copy.x += DUPLICATE_OFFSET;
            copy.y += DUPLICATE_OFFSET;
            copy.locked = false;
            ClientMsg::CreateBox(copy)
        }
        Gesture::DeleteBox { name } => ClientMsg::DeleteBox(NameRef { name }),
    };

    msg.validate()?;
    Ok(msg)
}

fn require_box<'a>(store: &'a StateStore, name: &str) -> Result<&'a LayoutBox, ProposalError> {
    store
        .box_by_name(name)
        .ok_or_else(|| ProposalError::UnknownBox(name.to_string()))
}

/// Parse degrees the lenient way a form field does: leading whitespace,
/// an optional sign, then a run of digits. Anything after the digits is
/// ignored, so `"45deg"` is 45 and `"90.5"` is 90.
pub fn parse_rotation(input: &str) -> Result<i32, ProposalError> {
    let trimmed = input.trim_start();
    let (sign, rest) = match trimmed.as_bytes().first() {
        Some(b'-') => ("-", &trimmed[1..]),
        Some(b'+') => ("", &trimmed[1..]),
        _ => ("", trimmed),
    };
    let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return Err(ProposalError::InvalidRotation(input.to_string()));
    }
    format!("{sign}{digits}")
        .parse::<i32>()
        .map_err(|_| ProposalError::InvalidRotation(input.to_string()))
}

/// Parse a length in meters typed by the user
pub fn parse_meters(input: &str) -> Result<f64, ProposalError> {
    let trimmed = input.trim();
    let value: f64 = trimmed
        .parse()
        .map_err(|_| ProposalError::NotANumber(trimmed.to_string()))?;
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(ProposalError::InvalidDimension { field: "meters", value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use floorplan_core::{ServerMsg, Snapshot};

    fn store_with(boxes: Vec<LayoutBox>) -> StateStore {
        let mut store = StateStore::new();
        store.apply_snapshot(Snapshot::Boxes(boxes));
        store
    }

    fn sofa() -> LayoutBox {
        LayoutBox::new("sofa", 100.0, 50.0, "#add8e6", false)
    }

    #[test]
    fn locked_box_refuses_drag() {
        let mut locked = sofa();
        locked.locked = true;
        let mut store = store_with(vec![locked]);

        let result = propose(
            &mut store,
            Scale::default(),
            Gesture::DragBox { name: "sofa".into(), x: 1.0, y: 1.0 },
        );
        assert_eq!(result, Err(ProposalError::Locked("sofa".into())));
    }

    #[test]
    fn shadow_lock_refuses_drag_before_echo() {
        let mut store = store_with(vec![sofa()]);
        let scale = Scale::default();

        let lock = propose(&mut store, scale, Gesture::ToggleLock { name: "sofa".into() }).unwrap();
        assert_eq!(lock, ClientMsg::UpdateBoxLock(BoxLock { name: "sofa".into(), locked: true }));

        let drag = propose(&mut store, scale, Gesture::DragBox { name: "sofa".into(), x: 0.0, y: 0.0 });
        assert!(matches!(drag, Err(ProposalError::Locked(_))));
    }

    #[test]
    fn toggle_flips_shadow_not_record() {
        let mut store = store_with(vec![sofa()]);
        let scale = Scale::default();

        propose(&mut store, scale, Gesture::ToggleLock { name: "sofa".into() }).unwrap();
        let unlock = propose(&mut store, scale, Gesture::ToggleLock { name: "sofa".into() }).unwrap();

        assert_eq!(unlock, ClientMsg::UpdateBoxLock(BoxLock { name: "sofa".into(), locked: false }));
        assert_eq!(store.lock_shadow().get("sofa"), Some(false));
        assert!(!store.box_by_name("sofa").unwrap().locked);
    }

    #[test]
    fn toggle_starts_from_record_without_shadow() {
        let mut locked = sofa();
        locked.locked = true;
        let mut store = store_with(vec![locked]);

        let msg = propose(&mut store, Scale::default(), Gesture::ToggleLock { name: "sofa".into() }).unwrap();
        assert_eq!(msg, ClientMsg::UpdateBoxLock(BoxLock { name: "sofa".into(), locked: false }));
    }

    #[test]
    fn create_box_converts_meters() {
        let mut store = StateStore::new();
        let msg = propose(
            &mut store,
            Scale::new(25.0).unwrap(),
            Gesture::CreateBox(BoxForm {
                name: "bed".into(),
                width_m: 1.6,
                height_m: 2.05,
                color: "#ffffff".into(),
                is_circle: false,
            }),
        )
        .unwrap();

        let ClientMsg::CreateBox(bed) = msg else {
            panic!("expected create_box");
        };
        assert_eq!(bed.width, 40.0);
        assert_eq!(bed.height, 51.0);
        assert_eq!((bed.x, bed.y), (10.0, 10.0));
        assert!(!bed.locked);
        assert_eq!(bed.rotation, 0);
    }

    #[test]
    fn create_area_targets_next_free_slot() {
        let mut store = StateStore::new();
        store.apply(ServerMsg::UpdateAreas(vec![Area::new("Hall", 800.0, 600.0)]));

        let msg = propose(&mut store, Scale::default(), Gesture::CreateArea { name: "Kitchen".into() }).unwrap();
        let ClientMsg::CreateArea(kitchen) = msg else {
            panic!("expected create_area");
        };
        assert_eq!(kitchen.y, 720.0);
        assert_eq!((kitchen.width, kitchen.height), (800.0, 600.0));
    }

    #[test]
    fn empty_area_name_is_malformed() {
        let mut store = StateStore::new();
        let result = propose(&mut store, Scale::default(), Gesture::CreateArea { name: String::new() });
        assert_eq!(result, Err(ProposalError::EmptyName));
    }

    #[test]
    fn modify_unknown_area_is_refused() {
        let mut store = StateStore::new();
        let result = propose(
            &mut store,
            Scale::default(),
            Gesture::ModifyArea { name: "Attic".into(), width_m: 2.0, height_m: 2.0 },
        );
        assert_eq!(result, Err(ProposalError::UnknownArea("Attic".into())));
    }

    #[test]
    fn duplicate_takes_the_new_name_and_offsets() {
        let mut locked = sofa();
        locked.locked = true;
        locked.rotation = 90;
        let mut store = store_with(vec![locked]);

        let msg = propose(
            &mut store,
            Scale::default(),
            Gesture::DuplicateBox { name: "sofa".into(), new_name: "sofa_copy".into() },
        )
        .unwrap();
        let ClientMsg::CreateBox(dup) = msg else {
            panic!("expected create_box");
        };
        assert_eq!(dup.name, "sofa_copy");
        assert_eq!((dup.x, dup.y), (20.0, 20.0));
        assert_eq!(dup.rotation, 90);
        assert!(!dup.locked);
    }

    #[test]
    fn rotation_parses_like_a_form_field() {
        assert_eq!(parse_rotation("90"), Ok(90));
        assert_eq!(parse_rotation("  -45"), Ok(-45));
        assert_eq!(parse_rotation("+30"), Ok(30));
        assert_eq!(parse_rotation("45deg"), Ok(45));
        assert_eq!(parse_rotation("90.5"), Ok(90));
        assert_eq!(parse_rotation("720"), Ok(720));
        assert!(parse_rotation("ninety").is_err());
        assert!(parse_rotation("").is_err());
        assert!(parse_rotation("-").is_err());
        assert!(parse_rotation("99999999999").is_err());
    }

    #[test]
    fn malformed_rotation_sends_nothing() {
        let mut store = store_with(vec![sofa()]);
        let result = propose(
            &mut store,
            Scale::default(),
            Gesture::RotateBox { name: "sofa".into(), degrees: "abc".into() },
        );
        assert_eq!(result, Err(ProposalError::InvalidRotation("abc".into())));
    }

    #[test]
    fn meters_must_be_positive_numbers() {
        assert_eq!(parse_meters(" 2.5 "), Ok(2.5));
        assert_eq!(parse_meters("x"), Err(ProposalError::NotANumber("x".into())));
        assert!(matches!(parse_meters("0"), Err(ProposalError::InvalidDimension { .. })));
        assert!(matches!(parse_meters("-3"), Err(ProposalError::InvalidDimension { .. })));
    }

    #[test]
    fn gestures_on_unknown_boxes_fail() {
        let mut store = StateStore::new();
        for gesture in [
            Gesture::DragBox { name: "ghost".into(), x: 0.0, y: 0.0 },
            Gesture::ToggleLock { name: "ghost".into() },
            Gesture::DuplicateBox { name: "ghost".into(), new_name: "ghost_copy".into() },
        ] {
            assert_eq!(
                propose(&mut store, Scale::default(), gesture),
                Err(ProposalError::UnknownBox("ghost".into()))
            );
        }
        assert!(store.lock_shadow().is_empty());
    }
}
