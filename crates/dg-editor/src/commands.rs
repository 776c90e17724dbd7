//! Undo/Redo commands and the controller that owns their history.
//!
//! Every mutation of the diagram is wrapped in a reversible `Command`.
//! `execute` applies the forward change, `undo` restores the graph exactly
//! as it was (same shape numbers, same line ids, same z-order). Commands
//! record whatever they need to reverse themselves while executing, so a
//! command can be undone and redone any number of times.
//!
//! A drag gesture produces one `MoveShape` holding the total gesture delta,
//! so the whole drag is a single undo step.

use dg_core::{Graph, Line, LineId, Point, Shape, ShapeNumber};
use smallvec::SmallVec;

/// A reversible unit of change over the `Graph`.
///
/// Commands assume their preconditions were checked by the caller
/// (existing, non-empty selections). A violated precondition is a logic
/// fault and panics.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    AddShape {
        shape: Shape,
    },
    RemoveShapes {
        selected: SmallVec<[ShapeNumber; 1]>,
        /// Removed shapes with their index at removal time, in removal order.
        removed_shapes: Vec<(usize, Shape)>,
        /// Lines removed along with the shapes, in removal order.
        removed_lines: Vec<(usize, Line)>,
    },
    AddLine {
        line: Line,
    },
    RemoveLines {
        selected: SmallVec<[LineId; 4]>,
        removed: Vec<(usize, Line)>,
    },
    MoveShape {
        shape: ShapeNumber,
        dx: f64,
        dy: f64,
        /// Position before the last `execute`. Undo restores it exactly
        /// instead of subtracting the delta.
        origin: Option<Point>,
    },
}

impl Command {
    pub fn add_shape(shape: Shape) -> Self {
        Self::AddShape { shape }
    }

    /// Remove shapes together with every line touching them.
    /// Duplicate numbers are collapsed.
    pub fn remove_shapes(selected: impl IntoIterator<Item = ShapeNumber>) -> Self {
        let mut unique: SmallVec<[ShapeNumber; 1]> = SmallVec::new();
        for number in selected {
            if !unique.contains(&number) {
                unique.push(number);
            }
        }
        Self::RemoveShapes {
            selected: unique,
            removed_shapes: Vec::new(),
            removed_lines: Vec::new(),
        }
    }

    pub fn add_line(line: Line) -> Self {
        Self::AddLine { line }
    }

    /// Remove lines. Duplicate ids are collapsed.
    pub fn remove_lines(selected: impl IntoIterator<Item = LineId>) -> Self {
        let mut unique: SmallVec<[LineId; 4]> = SmallVec::new();
        for id in selected {
            if !unique.contains(&id) {
                unique.push(id);
            }
        }
        Self::RemoveLines {
            selected: unique,
            removed: Vec::new(),
        }
    }

    pub fn move_shape(shape: ShapeNumber, dx: f64, dy: f64) -> Self {
        Self::MoveShape {
            shape,
            dx,
            dy,
            origin: None,
        }
    }

    /// Human-readable label, e.g. for an Edit menu.
    pub fn description(&self) -> String {
        match self {
            Self::AddShape { shape } => format!("Add shape {}", shape.number),
            Self::RemoveShapes { selected, .. } => match selected.as_slice() {
                [one] => format!("Remove shape {one}"),
                many => format!("Remove {} shapes", many.len()),
            },
            Self::AddLine { line } => format!("Add line {} → {}", line.from, line.to),
            Self::RemoveLines { selected, .. } => match selected.len() {
                1 => "Remove line".to_string(),
                n => format!("Remove {n} lines"),
            },
            Self::MoveShape { shape, dx, dy, .. } => format!("Move shape {shape} by ({dx}, {dy})"),
        }
    }

    /// Apply the forward mutation.
    pub fn execute(&mut self, graph: &mut Graph) {
        match self {
            Self::AddShape { shape } => graph.push_shape(shape.clone()),
            Self::RemoveShapes {
                selected,
                removed_shapes,
                removed_lines,
            } => {
                removed_shapes.clear();
                removed_lines.clear();
                for &number in selected.iter() {
                    let incident: SmallVec<[LineId; 4]> =
                        graph.incident_lines(number).map(|l| l.id).collect();
                    for id in incident {
                        if let Some(entry) = graph.remove_line(id) {
                            removed_lines.push(entry);
                        }
                    }
                    let Some(entry) = graph.remove_shape(number) else {
                        panic!("cannot remove shape {number}: not on the canvas");
                    };
                    removed_shapes.push(entry);
                }
            }
            Self::AddLine { line } => {
                assert!(
                    graph.shape(line.from).is_some() && graph.shape(line.to).is_some(),
                    "cannot add line {}: endpoint {} or {} not on the canvas",
                    line.id,
                    line.from,
                    line.to
                );
                graph.push_line(*line);
            }
            Self::RemoveLines { selected, removed } => {
                removed.clear();
                for &id in selected.iter() {
                    let Some(entry) = graph.remove_line(id) else {
                        panic!("cannot remove {id}: not on the canvas");
                    };
                    removed.push(entry);
                }
            }
            Self::MoveShape { shape, dx, dy, origin } => {
                let Some(before) = graph.shape(*shape).map(|s| s.position()) else {
                    panic!("cannot move shape {shape}: not on the canvas");
                };
                *origin = Some(before);
                graph.translate_shape(*shape, *dx, *dy);
            }
        }
    }

    /// Apply the exact inverse of the last `execute`.
    pub fn undo(&mut self, graph: &mut Graph) {
        match self {
            Self::AddShape { shape } => {
                let Some((_, removed)) = graph.remove_shape(shape.number) else {
                    panic!("cannot undo add of shape {}: not on the canvas", shape.number);
                };
                *shape = removed;
            }
            Self::RemoveShapes {
                removed_shapes,
                removed_lines,
                ..
            } => {
                // Shapes first so every restored line has both endpoints.
                for (index, shape) in removed_shapes.drain(..).rev() {
                    graph.insert_shape(index, shape);
                }
                for (index, line) in removed_lines.drain(..).rev() {
                    graph.insert_line(index, line);
                }
            }
            Self::AddLine { line } => {
                if graph.remove_line(line.id).is_none() {
                    panic!("cannot undo add of {}: not on the canvas", line.id);
                }
            }
            Self::RemoveLines { removed, .. } => {
                for (index, line) in removed.drain(..).rev() {
                    graph.insert_line(index, line);
                }
            }
            Self::MoveShape { shape, origin, .. } => {
                let Some(before) = origin.take() else {
                    panic!("cannot undo move of shape {shape}: never executed");
                };
                if !graph.set_shape_position(*shape, before) {
                    panic!("cannot undo move of shape {shape}: not on the canvas");
                }
            }
        }
    }
}

/// Linear undo/redo history for one editing session.
///
/// The two stacks are disjoint: a command lives on exactly one of them
/// from the moment it is first executed until it is discarded.
#[derive(Debug, Default)]
pub struct UndoRedoController {
    undo_stack: Vec<Command>,
    redo_stack: Vec<Command>,
    /// Maximum undo depth. `None` keeps the full history.
    max_depth: Option<usize>,
}

impl UndoRedoController {
    pub fn new() -> Self {
        Self::default()
    }

    /// A controller that evicts the oldest entry beyond `max_depth`.
    pub fn with_max_depth(max_depth: Option<usize>) -> Self {
        Self {
            max_depth,
            ..Self::default()
        }
    }

    /// Execute a command and push it to the undo stack.
    /// Any redo history is discarded.
    pub fn add_and_execute(&mut self, graph: &mut Graph, mut command: Command) {
        command.execute(graph);
        log::debug!("execute: {}", command.description());
        self.undo_stack.push(command);
        if let Some(max) = self.max_depth
            && self.undo_stack.len() > max
        {
            let evicted = self.undo_stack.remove(0);
            log::trace!("history full, evicted: {}", evicted.description());
        }

        // Clear redo stack on new action
        self.redo_stack.clear();
    }

    /// Undo the most recent command. Returns its description, or `None`
    /// when there is nothing to undo.
    pub fn undo(&mut self, graph: &mut Graph) -> Option<String> {
        let mut command = self.undo_stack.pop()?;
        command.undo(graph);
        let desc = command.description();
        log::debug!("undo: {desc}");
        self.redo_stack.push(command);
        Some(desc)
    }

    /// Redo the most recently undone command.
    pub fn redo(&mut self, graph: &mut Graph) -> Option<String> {
        let mut command = self.redo_stack.pop()?;
        command.execute(graph);
        let desc = command.description();
        log::debug!("redo: {desc}");
        self.undo_stack.push(command);
        Some(desc)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// The command `undo` would reverse next.
    pub fn peek_undo(&self) -> Option<&Command> {
        self.undo_stack.last()
    }

    /// The command `redo` would reapply next.
    pub fn peek_redo(&self) -> Option<&Command> {
        self.redo_stack.last()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn shape_at(graph: &Graph, number: u32) -> Point {
        graph.shape(ShapeNumber(number)).unwrap().position()
    }

    #[test]
    fn undo_redo_move() {
        let mut graph = Graph::sample();
        let mut history = UndoRedoController::new();

        history.add_and_execute(&mut graph, Command::move_shape(ShapeNumber(1), 50.0, 30.0));
        assert_eq!(shape_at(&graph, 1), Point::new(80.0, 70.0));

        let desc = history.undo(&mut graph);
        assert_eq!(desc, Some("Move shape #1 by (50, 30)".to_string()));
        assert_eq!(shape_at(&graph, 1), Point::new(30.0, 40.0));

        let desc = history.redo(&mut graph);
        assert_eq!(desc, Some("Move shape #1 by (50, 30)".to_string()));
        assert_eq!(shape_at(&graph, 1), Point::new(80.0, 70.0));
    }

    #[test]
    fn redo_clears_on_new_action() {
        let mut graph = Graph::sample();
        let mut history = UndoRedoController::new();

        history.add_and_execute(&mut graph, Command::move_shape(ShapeNumber(1), 5.0, 0.0));
        history.undo(&mut graph);
        assert!(history.can_redo());

        // New action clears redo
        history.add_and_execute(&mut graph, Command::move_shape(ShapeNumber(1), 1.0, 0.0));
        assert!(!history.can_redo());
    }

    #[test]
    fn max_depth_trims_oldest() {
        let mut graph = Graph::sample();
        let mut history = UndoRedoController::with_max_depth(Some(3));

        for i in 0..5 {
            history.add_and_execute(&mut graph, Command::move_shape(ShapeNumber(1), (i + 1) as f64, 0.0));
        }
        // Only 3 entries remain
        let mut undo_count = 0;
        while history.undo(&mut graph).is_some() {
            undo_count += 1;
        }
        assert_eq!(undo_count, 3);
        // Moves of 1 and 2 were evicted and stay applied.
        assert_eq!(shape_at(&graph, 1), Point::new(33.0, 40.0));
    }

    #[test]
    fn empty_stacks_are_no_ops() {
        let mut graph = Graph::sample();
        let mut history = UndoRedoController::new();
        assert_eq!(history.undo(&mut graph), None);
        assert_eq!(history.redo(&mut graph), None);
        assert_eq!(graph, Graph::sample());
    }

    #[test]
    fn add_shape_roundtrip() {
        let mut graph = Graph::sample();
        let before = Graph::sample();
        let shape = graph.create_shape(1.0, 2.0, 3.0, 4.0);
        let number = shape.number;
        let mut command = Command::add_shape(shape);

        command.execute(&mut graph);
        assert_eq!(graph.shapes().last().map(|s| s.number), Some(number));
        command.undo(&mut graph);
        assert_eq!(graph, before);
    }

    #[test]
    fn remove_shapes_restores_former_index() {
        let mut graph = Graph::sample();
        let before = Graph::sample();
        let mut command = Command::remove_shapes([ShapeNumber(1)]);

        command.execute(&mut graph);
        assert_eq!(graph.shapes().len(), 1);
        assert!(graph.lines().is_empty());

        command.undo(&mut graph);
        assert_eq!(graph, before);
        assert_eq!(graph.shapes()[0].number, ShapeNumber(1));
    }

    #[test]
    fn remove_lines_restores_order() {
        let mut graph = Graph::sample();
        let c = graph.create_shape(400.0, 40.0, 50.0, 50.0);
        let c_number = c.number;
        graph.push_shape(c);
        for from in [ShapeNumber(2), ShapeNumber(1)] {
            let line = graph.create_line(from, c_number).unwrap();
            graph.push_line(line);
        }
        let ids: Vec<LineId> = graph.lines().iter().map(|l| l.id).collect();
        let before_lines = graph.lines().to_vec();

        let mut command = Command::remove_lines([ids[2], ids[0]]);
        command.execute(&mut graph);
        assert_eq!(graph.lines().len(), 1);
        assert_eq!(graph.lines()[0].id, ids[1]);

        command.undo(&mut graph);
        assert_eq!(graph.lines(), before_lines.as_slice());
    }

    #[test]
    fn duplicate_selection_is_collapsed() {
        let command = Command::remove_shapes([ShapeNumber(1), ShapeNumber(1)]);
        match command {
            Command::RemoveShapes { selected, .. } => assert_eq!(selected.as_slice(), &[ShapeNumber(1)]),
            other => panic!("expected RemoveShapes, got {other:?}"),
        }
    }

    #[test]
    #[should_panic(expected = "not on the canvas")]
    fn moving_a_missing_shape_is_fatal() {
        let mut graph = Graph::new();
        Command::move_shape(ShapeNumber(42), 1.0, 1.0).execute(&mut graph);
    }
}
