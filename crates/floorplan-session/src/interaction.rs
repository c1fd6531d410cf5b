//! Prompted actions
//!
//! The area and box actions that ask the user something first. Each one
//! returns `Ok(None)` when the user backs out, `Ok(Some(msg))` with the
//! proposal that was sent, or the reason the input was malformed. A
//! malformed answer is never retried; the caller reports it and moves on.

use floorplan_core::{ClientMsg, ProposalError};

use crate::gesture::{parse_meters, Gesture};
use crate::prompt::{PromptOutcome, Prompter};
use crate::session::{ProposalSink, Session};

type Prompted = Result<Option<ClientMsg>, ProposalError>;

impl<S: ProposalSink> Session<S> {
    /// Ask for a name and propose a new default-sized area
    pub async fn prompt_create_area(&mut self, prompter: &mut dyn Prompter) -> Prompted {
        let name = match prompter.ask("Enter area name:", None).await {
            PromptOutcome::Value(name) if !name.is_empty() => name,
            _ => return Ok(None),
        };
        self.handle(Gesture::CreateArea { name }).map(Some)
    }

    /// Ask for a new width and height in meters
    pub async fn prompt_modify_area(&mut self, prompter: &mut dyn Prompter, name: &str) -> Prompted {
        let area = self
            .store()
            .area(name)
            .ok_or_else(|| ProposalError::UnknownArea(name.to_string()))?;
        let width_default = format_meters(self.scale().to_meters(area.width));
        let height_default = format_meters(self.scale().to_meters(area.height));

        let width = prompter
            .ask("Enter new width (meters):", Some(&width_default))
            .await;
        let height = prompter
            .ask("Enter new height (meters):", Some(&height_default))
            .await;
        let (PromptOutcome::Value(width), PromptOutcome::Value(height)) = (width, height) else {
            return Ok(None);
        };
        if width.is_empty() || height.is_empty() {
            return Ok(None);
        }

        let gesture = Gesture::ModifyArea {
            name: name.to_string(),
            width_m: parse_meters(&width)?,
            height_m: parse_meters(&height)?,
        };
        self.handle(gesture).map(Some)
    }

    /// Confirm, then propose deleting the area
    pub async fn prompt_delete_area(&mut self, prompter: &mut dyn Prompter, name: &str) -> Prompted {
        let question = format!("Are you sure you want to delete the area \"{name}\"?");
        if !prompter.confirm(&question).await {
            return Ok(None);
        }
        self.handle(Gesture::DeleteArea { name: name.to_string() })
            .map(Some)
    }

    /// Ask for a rotation in degrees
    pub async fn prompt_rotate_box(&mut self, prompter: &mut dyn Prompter, name: &str) -> Prompted {
        let current = self
            .store()
            .box_by_name(name)
            .ok_or_else(|| ProposalError::UnknownBox(name.to_string()))?
            .rotation
            .to_string();
        let Some(degrees) = prompter
            .ask("Enter rotation in degrees:", Some(&current))
            .await
            .value()
        else {
            return Ok(None);
        };
        self.handle(Gesture::RotateBox { name: name.to_string(), degrees })
            .map(Some)
    }

    /// Ask for a comment, pre-filled with the current one
    pub async fn prompt_comment_box(&mut self, prompter: &mut dyn Prompter, name: &str) -> Prompted {
        let current = self
            .store()
            .box_by_name(name)
            .ok_or_else(|| ProposalError::UnknownBox(name.to_string()))?
            .comment
            .clone();
        let Some(comment) = prompter
            .ask("Enter a comment:", Some(&current))
            .await
            .value()
        else {
            return Ok(None);
        };
        self.handle(Gesture::CommentBox { name: name.to_string(), comment })
            .map(Some)
    }

    /// Ask for the copy's name, pre-filled with `<name>_copy`
    pub async fn prompt_duplicate_box(&mut self, prompter: &mut dyn Prompter, name: &str) -> Prompted {
        if self.store().box_by_name(name).is_none() {
            return Err(ProposalError::UnknownBox(name.to_string()));
        }
        let suggested = format!("{name}_copy");
        let new_name = match prompter
            .ask("Enter name for the duplicate:", Some(&suggested))
            .await
        {
            PromptOutcome::Value(new_name) if !new_name.is_empty() => new_name,
            _ => return Ok(None),
        };
        self.handle(Gesture::DuplicateBox { name: name.to_string(), new_name })
            .map(Some)
    }
}

/// Meters without a trailing `.0` for whole numbers
pub fn format_meters(meters: f64) -> String {
    if meters.fract() == 0.0 {
        format!("{meters:.0}")
    } else {
        format!("{meters}")
    }
}
