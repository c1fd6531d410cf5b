//! One connected client
//!
//! Constructed when the client joins and dropped when it disconnects. All
//! layout state of the client lives in the session's [`StateStore`]; the
//! store only changes when a message from the server is handed to
//! [`Session::receive`], apart from the lock shadow that a lock toggle
//! writes immediately.

use anyhow::Result;
use floorplan_core::{ClientMsg, ProposalError, ServerMsg, StateStore, StoreChange};
use floorplan_geometry::Scale;

use crate::gesture::{propose, Gesture};

/// Where proposals go once they pass validation
pub trait ProposalSink {
    fn send(&mut self, msg: ClientMsg) -> Result<()>;
}

/// Collects proposals in memory
impl ProposalSink for Vec<ClientMsg> {
    fn send(&mut self, msg: ClientMsg) -> Result<()> {
        self.push(msg);
        Ok(())
    }
}

pub struct Session<S> {
    store: StateStore,
    scale: Scale,
    sink: S,
}

impl<S: ProposalSink> Session<S> {
    pub fn new(scale: Scale, sink: S) -> Self {
        Self {
            store: StateStore::new(),
            scale,
            sink,
        }
    }

    pub fn store(&self) -> &StateStore {
        &self.store
    }

    pub fn scale(&self) -> Scale {
        self.scale
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    /// Turn a gesture into a proposal and send it.
    ///
    /// Malformed gestures are reported and nothing is sent. A send that
    /// fails is not retried: the proposal is simply lost, exactly as if the
    /// server had never applied it.
    pub fn handle(&mut self, gesture: Gesture) -> Result<ClientMsg, ProposalError> {
        let msg = propose(&mut self.store, self.scale, gesture)?;
        tracing::debug!(event = msg.event_name(), target = msg.target(), "proposing");
        if let Err(e) = self.sink.send(msg.clone()) {
            tracing::debug!(event = msg.event_name(), error = %e, "proposal lost in flight");
        }
        Ok(msg)
    }

    /// Apply a message from the server
    pub fn receive(&mut self, msg: ServerMsg) -> StoreChange {
        self.store.apply(msg)
    }

    /// Tear the session down, handing back the sink
    pub fn disconnect(self) -> S {
        tracing::debug!(
            areas = self.store.areas().len(),
            boxes = self.store.boxes().len(),
            "session closed"
        );
        self.sink
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use floorplan_core::{BoxPosition, LayoutBox};

    struct Unplugged;

    impl ProposalSink for Unplugged {
        fn send(&mut self, _msg: ClientMsg) -> Result<()> {
            anyhow::bail!("not connected")
        }
    }

    #[test]
    fn proposals_are_not_applied_locally() {
        let mut session = Session::new(Scale::default(), Vec::new());
        session.receive(ServerMsg::UpdateBoxes(vec![LayoutBox::new("sofa", 100.0, 50.0, "red", false)]));

        session
            .handle(Gesture::DragBox { name: "sofa".into(), x: 300.0, y: 300.0 })
            .unwrap();

        // Still at the spawn point until the server echoes the move
        let sofa = session.store().box_by_name("sofa").unwrap();
        assert_eq!((sofa.x, sofa.y), (10.0, 10.0));
        assert_eq!(
            session.sink().as_slice(),
            &[ClientMsg::UpdateBoxPosition(BoxPosition { name: "sofa".into(), x: 300.0, y: 300.0 })]
        );
    }

    #[test]
    fn lost_sends_are_swallowed() {
        let mut session = Session::new(Scale::default(), Unplugged);
        let msg = session.handle(Gesture::CreateArea { name: "Kitchen".into() });
        assert!(msg.is_ok());
        assert!(session.store().areas().is_empty());
    }

    #[test]
    fn malformed_gestures_send_nothing() {
        let mut session = Session::new(Scale::default(), Vec::new());
        assert!(session.handle(Gesture::CreateArea { name: " ".into() }).is_err());
        assert!(session.disconnect().is_empty());
    }
}
