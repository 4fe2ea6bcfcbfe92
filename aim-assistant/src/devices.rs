//! Interfaces to the external collaborators of the engagement loop
//!
//! Screen capture, input injection and key polling live outside this crate.
//! The loop only sees these traits.

use crate::error::{AssistError, Result};
use crate::types::Frame;

/// On-demand frame capture
pub trait FrameSource {
    /// Grab the latest frame.
    ///
    /// `Err(AssistError::FrameUnavailable)` means "skip this tick" (for
    /// example the source window is not found); it is never fatal.
    fn grab(&mut self) -> Result<Frame>;
}

/// Synthetic pointer input
///
/// Calls are fire-and-forget from the scheduler's point of view: failures
/// are logged and counted, never retried.
pub trait Actuator {
    /// Relative pointer displacement
    fn move_relative(&mut self, dx: i32, dy: i32) -> Result<()>;

    fn press_primary(&mut self) -> Result<()>;

    fn release_primary(&mut self) -> Result<()>;
}

/// Polled activation key
pub trait ActivationInput {
    /// Whether the toggle key is currently held down
    fn is_toggle_down(&mut self) -> bool;
}

/// Edge detector turning a polled key level into toggle events
#[derive(Debug, Clone, Default)]
pub struct ToggleLatch {
    was_down: bool,
    active: bool,
}

impl ToggleLatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Feed one poll of the key level; returns the new activation state on
    /// a press edge (up -> down), `None` otherwise.
    pub fn poll(&mut self, down: bool) -> Option<bool> {
        let pressed = down && !self.was_down;
        self.was_down = down;
        if pressed {
            self.active = !self.active;
            Some(self.active)
        } else {
            None
        }
    }

    /// Force the activation state without a key edge
    pub fn set_active(&mut self, active: bool) {
        self.active = active;
    }
}

/// Command observed by a [`RecordingActuator`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActuatorCommand {
    Move { dx: i32, dy: i32 },
    Press,
    Release,
}

/// Actuator that records every command, optionally rejecting them
#[derive(Debug, Clone, Default)]
pub struct RecordingActuator {
    pub commands: Vec<ActuatorCommand>,
    /// When set, every call is recorded and then reported as failed
    pub reject: bool,
}

impl RecordingActuator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn moves(&self) -> Vec<(i32, i32)> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                ActuatorCommand::Move { dx, dy } => Some((*dx, *dy)),
                _ => None,
            })
            .collect()
    }

    pub fn clicks(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, ActuatorCommand::Release))
            .count()
    }

    fn record(&mut self, command: ActuatorCommand) -> Result<()> {
        self.commands.push(command);
        if self.reject {
            Err(AssistError::actuation(format!("{:?} rejected", command)))
        } else {
            Ok(())
        }
    }
}

impl Actuator for RecordingActuator {
    fn move_relative(&mut self, dx: i32, dy: i32) -> Result<()> {
        self.record(ActuatorCommand::Move { dx, dy })
    }

    fn press_primary(&mut self) -> Result<()> {
        self.record(ActuatorCommand::Press)
    }

    fn release_primary(&mut self) -> Result<()> {
        self.record(ActuatorCommand::Release)
    }
}
