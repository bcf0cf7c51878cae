//! Pause and play, with optional rewind to the last play point.

use crate::error::InspectorError;
use crate::events::InspectorEvent;
use crate::selection::SelectionModel;
use crate::tree::TreeWidget;
use si_core::{Engine, SceneSerializer};

/// Snapshot key used for auto-rewind.
pub const PAUSE_STATE_KEY: &str = "pauseState";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PlayState {
    #[default]
    Playing,
    Paused,
}

#[derive(Debug, Clone, Default)]
pub struct PauseController {
    state: PlayState,
}

impl PauseController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> PlayState {
        self.state
    }

    pub fn is_paused(&self) -> bool {
        self.state == PlayState::Paused
    }

    /// Pause or resume the engine and return the event to publish.
    ///
    /// With a serializer and auto-rewind, pausing clears the selection and
    /// restores the snapshot taken at the last play; playing takes that
    /// snapshot. Both happen before the time scale changes.
    pub fn set_paused(
        &mut self,
        paused: bool,
        engine: &mut Engine,
        serializer: Option<&mut (dyn SceneSerializer + '_)>,
        auto_rewind: bool,
        selection: &mut SelectionModel,
        tree: &mut dyn TreeWidget,
    ) -> Result<InspectorEvent, InspectorError> {
        let rewind = serializer.filter(|_| auto_rewind);
        if paused {
            if let Some(s) = rewind {
                selection.clear(&engine.world, tree);
                if !s.load_state(engine, PAUSE_STATE_KEY)? {
                    log::debug!("no {PAUSE_STATE_KEY} snapshot to restore");
                }
            }
            engine.timing.time_scale = 0.0;
            self.state = PlayState::Paused;
            Ok(InspectorEvent::Paused)
        } else {
            if let Some(s) = rewind {
                s.save_state(engine, PAUSE_STATE_KEY)?;
            }
            engine.timing.time_scale = 1.0;
            self.state = PlayState::Playing;
            Ok(InspectorEvent::Play)
        }
    }
}
