//! Host commands and the queues that hold them until a tick boundary.
//!
//! No command is applied synchronously. World and propagation commands are
//! drained at the start of the next animation frame; signal and warrant
//! commands wait for the next state tick of the signal engine.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use ubiquity_types::{Mode, Point, SignalKind, WarrantId, WorldObject};

/// A command from the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Command {
    /// Switch mode with a hard reset and a freshly seeded scene.
    SetMode(Mode),
    /// Replace the world obstacles.
    SetWorldObjects(Vec<WorldObject>),
    /// Add one randomly placed, mode-appropriate obstacle.
    AddObject,
    /// Emit a wavefront at a point.
    EmitWavefront(Point),
    /// Emit a wavefront at the orchestrator and a random signal.
    Broadcast,
    /// Emit a signal, of a random kind when unspecified.
    EmitSignal(Option<SignalKind>),
    /// Acknowledge an active warrant.
    AcknowledgeWarrant(WarrantId),
    /// Dismiss a warrant.
    DismissWarrant(WarrantId),
    /// Change the frame time scale.
    SetTimeScale(f64),
    /// Clear wavefronts, reception and the signal engine.
    Reset,
    /// Re-seed nodes and obstacles for the current mode.
    InitializeScene,
}

/// Which tick boundary applies a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Boundary {
    /// The next animation frame.
    Frame,
    /// The next signal state tick.
    StateTick,
}

impl Command {
    /// The boundary at which this command is applied.
    pub const fn boundary(&self) -> Boundary {
        match self {
            Self::EmitSignal(_) | Self::AcknowledgeWarrant(_) | Self::DismissWarrant(_) => {
                Boundary::StateTick
            }
            Self::SetMode(_)
            | Self::SetWorldObjects(_)
            | Self::AddObject
            | Self::EmitWavefront(_)
            | Self::Broadcast
            | Self::SetTimeScale(_)
            | Self::Reset
            | Self::InitializeScene => Boundary::Frame,
        }
    }
}

/// Commands waiting for their tick boundary.
#[derive(Debug, Clone, Default)]
pub struct CommandQueue {
    frame: VecDeque<Command>,
    state: VecDeque<Command>,
}

impl CommandQueue {
    /// Create empty queues.
    pub const fn new() -> Self {
        Self {
            frame: VecDeque::new(),
            state: VecDeque::new(),
        }
    }

    /// Queue `command` for its boundary.
    pub fn push(&mut self, command: Command) {
        match command.boundary() {
            Boundary::Frame => self.frame.push_back(command),
            Boundary::StateTick => self.state.push_back(command),
        }
    }

    /// Take every command due at the next frame, in submission order.
    pub fn drain_frame(&mut self) -> Vec<Command> {
        self.frame.drain(..).collect()
    }

    /// Take every command due at the next state tick, in submission order.
    pub fn drain_state(&mut self) -> Vec<Command> {
        self.state.drain(..).collect()
    }

    /// Drop pending signal commands.
    pub fn clear_state(&mut self) {
        self.state.clear();
    }

    /// Number of commands waiting across both boundaries.
    pub fn len(&self) -> usize {
        self.frame.len().saturating_add(self.state.len())
    }

    /// Whether nothing is waiting.
    pub fn is_empty(&self) -> bool {
        self.frame.is_empty() && self.state.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn commands_route_to_their_boundary() {
        let mut queue = CommandQueue::new();
        queue.push(Command::EmitSignal(None));
        queue.push(Command::Broadcast);
        queue.push(Command::DismissWarrant(WarrantId(3)));
        queue.push(Command::SetTimeScale(0.25));
        assert_eq!(queue.len(), 4);

        assert_eq!(
            queue.drain_frame(),
            vec![Command::Broadcast, Command::SetTimeScale(0.25)]
        );
        assert_eq!(
            queue.drain_state(),
            vec![
                Command::EmitSignal(None),
                Command::DismissWarrant(WarrantId(3))
            ]
        );
        assert!(queue.is_empty());
    }

    #[test]
    fn commands_parse_from_json() {
        let set: Command =
            serde_json::from_str(r#"{"type":"set_mode","value":"gravity"}"#).unwrap();
        assert_eq!(set, Command::SetMode(Mode::Gravity));

        let emit: Command =
            serde_json::from_str(r#"{"type":"emit_wavefront","value":{"x":10.0,"y":20.0}}"#)
                .unwrap();
        assert_eq!(emit, Command::EmitWavefront(Point::new(10.0, 20.0)));

        let reset: Command = serde_json::from_str(r#"{"type":"reset"}"#).unwrap();
        assert_eq!(reset, Command::Reset);
    }
}
