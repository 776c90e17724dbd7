//! Drag gesture: pointer down → move* → up becomes one `MoveShape`.
//!
//! While the pointer is held the shape follows it directly through the
//! graph, so listeners redraw it live. Those intermediate positions are not
//! history. On release the shape is put back where the gesture started and
//! the whole displacement is submitted as a single command, which makes one
//! drag exactly one undo step.
//!
//! Positions are measured in the target's enclosing canvas. The offset of
//! the pointer inside the shape is recorded at press time so the shape does
//! not jump to the pointer.

use crate::commands::{Command, UndoRedoController};
use crate::enablement::{EnablementBridge, RelayCommand};
use crate::input::PointerCapture;
use dg_core::{ElementId, Graph, Point, ResolveError, ShapeNumber, VisualTree};

/// Everything a gesture touches while handling one event.
pub struct GestureContext<'a> {
    pub graph: &'a mut Graph,
    pub history: &'a mut UndoRedoController,
    pub tree: &'a dyn VisualTree,
    pub pointer: &'a mut dyn PointerCapture,
}

/// State recorded when a drag starts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Capture {
    pub target: ElementId,
    pub shape: ShapeNumber,
    /// The canvas positions are measured in.
    pub container: ElementId,
    /// Pointer position inside the target at press time.
    pub offset: Point,
    /// Shape position when the gesture began.
    pub initial: Point,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum GestureState {
    #[default]
    Idle,
    Capturing(Capture),
}

/// Converts pointer events on shape elements into move commands.
///
/// The gate is checked when the pointer goes down. A gesture that has
/// started always completes, even if the gate closes halfway.
#[derive(Debug, Default)]
pub struct DragGesture {
    state: GestureState,
    gate: EnablementBridge,
}

impl DragGesture {
    /// A gesture that is always allowed to start.
    pub fn new() -> Self {
        Self::default()
    }

    /// A gesture gated by `command`'s legality.
    pub fn gated_by(command: RelayCommand) -> Self {
        Self {
            state: GestureState::Idle,
            gate: EnablementBridge::bound_to(command),
        }
    }

    /// Replace the gating command.
    pub fn set_gate(&mut self, command: Option<RelayCommand>) {
        self.gate.bind(command);
    }

    pub fn is_enabled(&self) -> bool {
        self.gate.is_enabled()
    }

    pub fn state(&self) -> GestureState {
        self.state
    }

    pub fn is_capturing(&self) -> bool {
        matches!(self.state, GestureState::Capturing(_))
    }

    /// Pointer pressed on `target` at window position `position`.
    /// Returns true if a drag started.
    pub fn pointer_down(&mut self, ctx: &mut GestureContext<'_>, target: ElementId, position: Point) -> bool {
        if let GestureState::Capturing(stale) = self.state {
            // The release never arrived (capture was lost); start over.
            log::warn!("pointer down on {target} while dragging {}, resetting", stale.target);
            self.abort(ctx);
        }

        if !self.gate.is_enabled() {
            log::debug!("drag on {target} ignored, moving is disabled");
            return false;
        }
        let Some(shape) = ctx.tree.shape_of(target) else {
            return false;
        };
        let Some(initial) = ctx.graph.shape(shape).map(|s| s.position()) else {
            log::warn!("drag on {target} ignored, shape {shape} is not on the canvas");
            return false;
        };
        let (container, offset) = match locate(ctx, target, position) {
            Ok(found) => found,
            Err(err) => {
                log::warn!("drag on {target} ignored: {err}");
                return false;
            }
        };

        ctx.pointer.capture(target);
        self.state = GestureState::Capturing(Capture {
            target,
            shape,
            container,
            offset,
            initial,
        });
        log::debug!("drag start: shape {shape} at ({}, {})", initial.x, initial.y);
        true
    }

    /// Pointer moved to window position `position`. Moves the dragged shape
    /// for feedback; ignored when idle.
    pub fn pointer_move(&mut self, ctx: &mut GestureContext<'_>, position: Point) {
        let GestureState::Capturing(capture) = self.state else {
            return;
        };
        match ctx.tree.to_local(position, capture.container, ctx.graph) {
            Ok(local) => {
                let live = local - capture.offset;
                log::trace!("drag shape {} to ({}, {})", capture.shape, live.x, live.y);
                ctx.graph.set_shape_position(capture.shape, live);
            }
            Err(err) => log::warn!("drag feedback skipped: {err}"),
        }
    }

    /// Pointer released. Submits the gesture's `MoveShape` and returns to
    /// idle. Capture is released whether or not a drag was in progress.
    /// Returns true if a command was submitted.
    pub fn pointer_up(&mut self, ctx: &mut GestureContext<'_>) -> bool {
        let state = std::mem::take(&mut self.state);
        ctx.pointer.release_capture();
        let GestureState::Capturing(capture) = state else {
            return false;
        };

        let Some(end) = ctx.graph.shape(capture.shape).map(|s| s.position()) else {
            panic!("shape {} vanished during a drag", capture.shape);
        };
        let delta = end - capture.initial;
        // Rewind the live feedback so the command applies the whole delta.
        ctx.graph.set_shape_position(capture.shape, capture.initial);
        ctx.history
            .add_and_execute(ctx.graph, Command::move_shape(capture.shape, delta.x, delta.y));
        log::debug!("drag end: shape {} moved by ({}, {})", capture.shape, delta.x, delta.y);
        true
    }

    /// Abandon a drag in progress: the shape returns to where it started,
    /// nothing is recorded, and capture is released.
    pub fn abort(&mut self, ctx: &mut GestureContext<'_>) {
        if let GestureState::Capturing(capture) = std::mem::take(&mut self.state) {
            ctx.graph.set_shape_position(capture.shape, capture.initial);
            log::debug!("drag aborted: shape {} restored", capture.shape);
        }
        ctx.pointer.release_capture();
    }
}

/// The target's canvas and the pointer's position inside the target.
fn locate(ctx: &GestureContext<'_>, target: ElementId, position: Point) -> Result<(ElementId, Point), ResolveError> {
    let container = ctx.tree.container_of(target)?;
    let offset = ctx.tree.to_local(position, target, ctx.graph)?;
    Ok((container, offset))
}
