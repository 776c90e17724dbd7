//! Line tool: connect two shapes with two clicks.
//!
//! `begin` arms the tool. The first shape clicked becomes the start of the
//! line and is marked selected on the canvas. Clicking a different shape
//! submits one `AddLine` and disarms the tool. Clicking the start shape
//! again does nothing, so a line can never loop back to its own shape.

use crate::commands::{Command, UndoRedoController};
use dg_core::{Graph, LineId, ShapeNumber};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineToolState {
    #[default]
    Off,
    AwaitingFirst,
    AwaitingSecond {
        from: ShapeNumber,
    },
}

/// What a click did to the line tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineClick {
    /// The tool is off; the click is not for us.
    Inactive,
    /// First endpoint chosen.
    Marked(ShapeNumber),
    /// Same shape clicked twice; nothing changed.
    Ignored,
    /// The line was added.
    Completed(LineId),
}

#[derive(Debug, Default)]
pub struct LineTool {
    state: LineToolState,
}

impl LineTool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> LineToolState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state != LineToolState::Off
    }

    /// Arm the tool. Returns false if it was already armed.
    pub fn begin(&mut self) -> bool {
        if self.is_active() {
            return false;
        }
        self.state = LineToolState::AwaitingFirst;
        log::debug!("line tool armed");
        true
    }

    /// A click landed on `shape`.
    pub fn click(&mut self, graph: &mut Graph, history: &mut UndoRedoController, shape: ShapeNumber) -> LineClick {
        match self.state {
            LineToolState::Off => LineClick::Inactive,
            LineToolState::AwaitingFirst => {
                graph.set_selected(shape, true);
                self.state = LineToolState::AwaitingSecond { from: shape };
                log::debug!("line from shape {shape}");
                LineClick::Marked(shape)
            }
            LineToolState::AwaitingSecond { from } => {
                let Some(line) = graph.create_line(from, shape) else {
                    return LineClick::Ignored;
                };
                let id = line.id;
                history.add_and_execute(graph, Command::add_line(line));
                graph.set_selected(from, false);
                self.state = LineToolState::Off;
                LineClick::Completed(id)
            }
        }
    }

    /// Disarm the tool and clear the start mark, if any.
    pub fn cancel(&mut self, graph: &mut Graph) {
        if let LineToolState::AwaitingSecond { from } = self.state {
            graph.set_selected(from, false);
        }
        if self.is_active() {
            log::debug!("line tool cancelled");
        }
        self.state = LineToolState::Off;
    }
}
