//! Editing session: the graph, its history, and the input state machines.
//!
//! `Editor` is what a UI talks to. Buttons call the action methods
//! (`add_shape`, `remove_selected_shapes`, `undo`, ...) and bind their
//! enabled state to the matching `RelayCommand` in `commands()`. Pointer
//! events go through `handle`, which routes them to the drag gesture and,
//! while the line tool is armed, to the line tool.
//!
//! Each session owns exactly one `UndoRedoController`; nothing is global.

use crate::commands::{Command, UndoRedoController};
use crate::config::EditorConfig;
use crate::enablement::RelayCommand;
use crate::gesture::{DragGesture, GestureContext, GestureState};
use crate::input::{InputEvent, PointerCapture, VirtualPointer};
use crate::tools::{LineClick, LineTool, LineToolState};
use dg_core::{ElementId, ElementTree, Graph, LineId, Listener, Point, ResolveError, ShapeNumber, VisualTree, hit_test};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// Borrow the fields a gesture needs, leaving `drag` free.
macro_rules! gesture_context {
    ($editor:expr) => {
        GestureContext {
            graph: &mut $editor.graph,
            history: &mut $editor.history,
            tree: &$editor.tree,
            pointer: &mut *$editor.pointer,
        }
    };
}

/// Shapes and lines picked in the UI (list boxes, marquee, ...).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    pub shapes: Vec<ShapeNumber>,
    pub lines: Vec<LineId>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct HistoryState {
    can_undo: bool,
    can_redo: bool,
}

/// Legality of each editor action, for binding UI affordances.
#[derive(Debug, Clone)]
pub struct EditorCommands {
    pub undo: RelayCommand,
    pub redo: RelayCommand,
    /// Legal when exactly one shape is selected.
    pub remove_shapes: RelayCommand,
    /// Legal when at least one line is selected.
    pub remove_lines: RelayCommand,
    /// Legal while the line tool is off. Gates drag gestures.
    pub move_shape: RelayCommand,
}

pub struct Editor {
    graph: Graph,
    history: UndoRedoController,
    tree: ElementTree,
    canvas: ElementId,
    pointer: Box<dyn PointerCapture>,
    drag: DragGesture,
    line_tool: LineTool,
    config: EditorConfig,
    selection: Rc<RefCell<Selection>>,
    line_mode: Rc<Cell<bool>>,
    history_state: Rc<Cell<HistoryState>>,
    commands: EditorCommands,
}

impl Editor {
    /// Start a session over `graph` with an in-process pointer.
    pub fn new(graph: Graph, config: EditorConfig) -> Result<Self, ResolveError> {
        Self::with_pointer(graph, config, Box::new(VirtualPointer::new()))
    }

    /// Start a session over `graph` with a platform pointer.
    pub fn with_pointer(
        graph: Graph,
        config: EditorConfig,
        pointer: Box<dyn PointerCapture>,
    ) -> Result<Self, ResolveError> {
        let mut tree = ElementTree::new();
        let root = tree.root();
        let canvas = tree.add_canvas(root, "canvas", config.canvas_offset)?;
        tree.sync_shapes(canvas, &graph)?;

        let selection = Rc::new(RefCell::new(Selection::default()));
        let line_mode = Rc::new(Cell::new(false));
        let history_state = Rc::new(Cell::new(HistoryState::default()));

        let commands = EditorCommands {
            undo: {
                let state = Rc::clone(&history_state);
                RelayCommand::new(move || state.get().can_undo)
            },
            redo: {
                let state = Rc::clone(&history_state);
                RelayCommand::new(move || state.get().can_redo)
            },
            remove_shapes: {
                let selection = Rc::clone(&selection);
                RelayCommand::new(move || selection.borrow().shapes.len() == 1)
            },
            remove_lines: {
                let selection = Rc::clone(&selection);
                RelayCommand::new(move || !selection.borrow().lines.is_empty())
            },
            move_shape: {
                let line_mode = Rc::clone(&line_mode);
                RelayCommand::new(move || !line_mode.get())
            },
        };

        Ok(Self {
            graph,
            history: UndoRedoController::with_max_depth(config.max_undo_depth),
            tree,
            canvas,
            pointer,
            drag: DragGesture::gated_by(commands.move_shape.clone()),
            line_tool: LineTool::new(),
            config,
            selection,
            line_mode,
            history_state,
            commands,
        })
    }

    // ─── Accessors ───────────────────────────────────────────────────────

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn history(&self) -> &UndoRedoController {
        &self.history
    }

    pub fn tree(&self) -> &ElementTree {
        &self.tree
    }

    pub fn canvas(&self) -> ElementId {
        self.canvas
    }

    pub fn pointer(&self) -> &dyn PointerCapture {
        &*self.pointer
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn commands(&self) -> &EditorCommands {
        &self.commands
    }

    pub fn drag_state(&self) -> GestureState {
        self.drag.state()
    }

    pub fn line_state(&self) -> LineToolState {
        self.line_tool.state()
    }

    pub fn selection(&self) -> Selection {
        self.selection.borrow().clone()
    }

    /// Register a listener for graph mutations (renderers).
    pub fn subscribe(&mut self, listener: Listener) {
        self.graph.subscribe(listener);
    }

    /// Opacity to draw shapes with: dimmed while the line tool is armed.
    pub fn mode_opacity(&self) -> f64 {
        if self.line_mode.get() {
            self.config.line_mode_opacity
        } else {
            1.0
        }
    }

    // ─── Actions ─────────────────────────────────────────────────────────

    /// Add a shape from the configured template. Returns its number.
    pub fn add_shape(&mut self) -> ShapeNumber {
        self.settle_gesture();
        let t = &self.config.new_shape;
        let shape = self.graph.create_shape(t.x, t.y, t.width, t.height);
        let number = shape.number;
        self.history.add_and_execute(&mut self.graph, Command::add_shape(shape));
        self.after_history_change();
        number
    }

    /// Replace the shape selection. Unknown numbers are dropped.
    pub fn select_shapes(&mut self, shapes: impl IntoIterator<Item = ShapeNumber>) {
        let shapes: Vec<ShapeNumber> = shapes.into_iter().filter(|n| self.graph.shape(*n).is_some()).collect();
        self.selection.borrow_mut().shapes = shapes;
        self.commands.remove_shapes.raise_can_execute_changed();
    }

    /// Replace the line selection. Unknown ids are dropped.
    pub fn select_lines(&mut self, lines: impl IntoIterator<Item = LineId>) {
        let lines: Vec<LineId> = lines.into_iter().filter(|id| self.graph.line(*id).is_some()).collect();
        self.selection.borrow_mut().lines = lines;
        self.commands.remove_lines.raise_can_execute_changed();
    }

    /// Remove the selected shape and its lines. Returns false when the
    /// action is not currently legal.
    pub fn remove_selected_shapes(&mut self) -> bool {
        if !self.commands.remove_shapes.can_execute() {
            return false;
        }
        self.settle_gesture();
        let selected = self.selection.borrow().shapes.clone();
        if let LineToolState::AwaitingSecond { from } = self.line_tool.state()
            && selected.contains(&from)
        {
            self.line_tool.cancel(&mut self.graph);
            self.set_line_mode(false);
        }
        self.history.add_and_execute(&mut self.graph, Command::remove_shapes(selected));
        self.after_history_change();
        true
    }

    /// Remove the selected lines. Returns false when the action is not
    /// currently legal.
    pub fn remove_selected_lines(&mut self) -> bool {
        if !self.commands.remove_lines.can_execute() {
            return false;
        }
        let selected = self.selection.borrow().lines.clone();
        self.history.add_and_execute(&mut self.graph, Command::remove_lines(selected));
        self.after_history_change();
        true
    }

    /// Arm the line tool. Dragging is disabled until the line is finished
    /// or cancelled.
    pub fn begin_line(&mut self) -> bool {
        if !self.line_tool.begin() {
            return false;
        }
        self.set_line_mode(true);
        true
    }

    pub fn cancel_line(&mut self) {
        if self.line_tool.is_active() {
            self.line_tool.cancel(&mut self.graph);
            self.set_line_mode(false);
        }
    }

    /// Undo the last command. An armed line tool is cancelled first, so
    /// no shape is captured by history with its start mark set.
    pub fn undo(&mut self) -> Option<String> {
        self.settle_gesture();
        self.cancel_line();
        let desc = self.history.undo(&mut self.graph);
        self.after_history_change();
        desc
    }

    pub fn redo(&mut self) -> Option<String> {
        self.settle_gesture();
        self.cancel_line();
        let desc = self.history.redo(&mut self.graph);
        self.after_history_change();
        desc
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    // ─── Pointer input ───────────────────────────────────────────────────

    pub fn handle(&mut self, event: &InputEvent) {
        let position = event.position();
        match *event {
            InputEvent::PointerDown { target, .. } => match self.resolve_target(target, position) {
                Some(target) => {
                    self.drag.pointer_down(&mut gesture_context!(self), target, position);
                }
                None => {
                    if self.drag.is_capturing() {
                        log::warn!("pointer down on background while dragging, resetting");
                        self.drag.abort(&mut gesture_context!(self));
                    }
                }
            },
            InputEvent::PointerMove { .. } => {
                self.drag.pointer_move(&mut gesture_context!(self), position);
            }
            InputEvent::PointerUp { target, .. } => {
                let was_dragging = self.drag.is_capturing();
                if self.drag.pointer_up(&mut gesture_context!(self)) {
                    self.after_history_change();
                }
                if !was_dragging && self.line_tool.is_active() {
                    self.line_click(target, position);
                }
            }
        }
    }

    fn line_click(&mut self, target: Option<ElementId>, position: Point) {
        let Some(shape) = self
            .resolve_target(target, position)
            .and_then(|t| self.tree.shape_of(t))
        else {
            return;
        };
        if let LineClick::Completed(_) = self.line_tool.click(&mut self.graph, &mut self.history, shape) {
            self.set_line_mode(false);
            self.after_history_change();
        }
    }

    /// The element under the pointer: the platform's target if it gave
    /// one, otherwise the topmost shape at `position`.
    fn resolve_target(&self, target: Option<ElementId>, position: Point) -> Option<ElementId> {
        if target.is_some() {
            return target;
        }
        let local = self.tree.to_local(position, self.canvas, &self.graph).ok()?;
        hit_test(&self.graph, local.x, local.y).map(ElementId::for_shape)
    }

    // ─── Bookkeeping ─────────────────────────────────────────────────────

    /// End any drag in progress before the history changes under it.
    fn settle_gesture(&mut self) {
        if self.drag.is_capturing() {
            self.drag.abort(&mut gesture_context!(self));
        }
    }

    fn set_line_mode(&mut self, active: bool) {
        self.line_mode.set(active);
        self.commands.move_shape.raise_can_execute_changed();
    }

    /// Bring derived state in line with the graph after a command ran.
    fn after_history_change(&mut self) {
        if let Err(err) = self.tree.sync_shapes(self.canvas, &self.graph) {
            log::warn!("element tree out of sync: {err}");
        }

        {
            let graph = &self.graph;
            let mut selection = self.selection.borrow_mut();
            selection.shapes.retain(|n| graph.shape(*n).is_some());
            selection.lines.retain(|id| graph.line(*id).is_some());
        }

        self.history_state.set(HistoryState {
            can_undo: self.history.can_undo(),
            can_redo: self.history.can_redo(),
        });
        for command in [
            &self.commands.undo,
            &self.commands.redo,
            &self.commands.remove_shapes,
            &self.commands.remove_lines,
        ] {
            command.raise_can_execute_changed();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn editor() -> Editor {
        Editor::new(Graph::sample(), EditorConfig::default()).unwrap()
    }

    #[test]
    fn add_shape_uses_template_and_is_undoable() {
        let mut ed = editor();
        let number = ed.add_shape();
        let shape = ed.graph().shape(number).unwrap();
        assert_eq!((shape.width, shape.height), (100.0, 100.0));
        assert!(ed.tree().contains(ElementId::for_shape(number)));
        assert!(ed.commands().undo.can_execute());

        assert_eq!(ed.undo(), Some(format!("Add shape {number}")));
        assert!(ed.graph().shape(number).is_none());
        assert!(!ed.tree().contains(ElementId::for_shape(number)));
        assert!(ed.commands().redo.can_execute());
    }

    #[test]
    fn remove_shape_requires_exactly_one_selected() {
        let mut ed = editor();
        assert!(!ed.remove_selected_shapes());

        ed.select_shapes([ShapeNumber(1), ShapeNumber(2)]);
        assert!(!ed.commands().remove_shapes.can_execute());
        assert!(!ed.remove_selected_shapes());

        ed.select_shapes([ShapeNumber(2)]);
        assert!(ed.remove_selected_shapes());
        assert!(ed.graph().lines().is_empty());
        assert!(ed.selection().shapes.is_empty());
        assert!(!ed.commands().remove_shapes.can_execute());
    }

    #[test]
    fn remove_lines_requires_a_selection() {
        let mut ed = editor();
        assert!(!ed.remove_selected_lines());
        ed.select_lines([LineId(1)]);
        assert!(ed.remove_selected_lines());
        assert!(ed.graph().lines().is_empty());
        ed.undo();
        assert_eq!(ed.graph().lines().len(), 1);
    }

    #[test]
    fn undo_prunes_selection_of_vanished_shapes() {
        let mut ed = editor();
        let number = ed.add_shape();
        ed.select_shapes([number]);
        ed.undo();
        assert!(ed.selection().shapes.is_empty());
        assert!(!ed.remove_selected_shapes());
    }

    #[test]
    fn line_mode_dims_and_disables_dragging() {
        let mut ed = editor();
        assert_eq!(ed.mode_opacity(), 1.0);
        assert!(ed.begin_line());
        assert_eq!(ed.mode_opacity(), 0.4);
        assert!(!ed.commands().move_shape.can_execute());

        ed.handle(&InputEvent::down(ElementId::for_shape(ShapeNumber(1)), 35.0, 45.0));
        assert_eq!(ed.drag_state(), GestureState::Idle);

        ed.cancel_line();
        assert_eq!(ed.mode_opacity(), 1.0);
        assert!(ed.commands().move_shape.can_execute());
    }
}
