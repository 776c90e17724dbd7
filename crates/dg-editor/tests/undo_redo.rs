//! Integration tests: undo/redo history (dg-editor).
//!
//! Drives the `UndoRedoController` against a real `Graph` and checks that
//! every command round-trips the graph exactly.

use dg_core::{Graph, LineId, Point, ShapeNumber};
use dg_editor::commands::{Command, UndoRedoController};
use pretty_assertions::assert_eq;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Sample graph plus a third shape wired to both sample shapes:
/// lines 1→2 (id 1), 3→1 (id 2), 2→3 (id 3).
fn make_graph() -> Graph {
    let mut graph = Graph::sample();
    let c = graph.create_shape(300.0, 60.0, 40.0, 40.0);
    let c_number = c.number;
    graph.push_shape(c);
    for (from, to) in [(c_number, ShapeNumber(1)), (ShapeNumber(2), c_number)] {
        let line = graph.create_line(from, to).unwrap();
        graph.push_line(line);
    }
    graph
}

fn every_kind_of_command(graph: &mut Graph) -> Vec<Command> {
    let shape = graph.create_shape(10.0, 10.0, 20.0, 20.0);
    let line = graph.create_line(ShapeNumber(2), ShapeNumber(1)).unwrap();
    vec![
        Command::add_shape(shape),
        Command::move_shape(ShapeNumber(2), -15.5, 42.0),
        Command::add_line(line),
        Command::remove_lines([LineId(1), LineId(3)]),
        Command::remove_shapes([ShapeNumber(1)]),
    ]
}

// ─── Round trips ────────────────────────────────────────────────────────

#[test]
fn n_executes_then_n_undos_restore_the_graph() {
    init_logging();
    let mut graph = make_graph();
    let before = make_graph();
    let mut history = UndoRedoController::new();

    let commands = every_kind_of_command(&mut graph);
    let n = commands.len();
    for command in commands {
        history.add_and_execute(&mut graph, command);
    }
    assert_ne!(graph, before);

    for _ in 0..n {
        assert!(history.undo(&mut graph).is_some());
    }
    assert_eq!(graph, before);
    assert!(!history.can_undo());
}

#[test]
fn execute_undo_execute_equals_single_execute() {
    let mut scratch = make_graph();
    let commands = every_kind_of_command(&mut scratch);

    for command in commands {
        let mut once = make_graph();
        let mut single = command.clone();
        single.execute(&mut once);

        let mut cycled = make_graph();
        let mut repeated = command.clone();
        repeated.execute(&mut cycled);
        repeated.undo(&mut cycled);
        repeated.execute(&mut cycled);

        assert_eq!(cycled, once, "{}", command.description());
    }
}

#[test]
fn repeated_move_cycles_do_not_drift() {
    let mut graph = make_graph();
    let mut command = Command::move_shape(ShapeNumber(1), 0.1, -0.3);
    for _ in 0..1000 {
        command.execute(&mut graph);
        command.undo(&mut graph);
    }
    assert_eq!(graph, make_graph());
}

#[test]
fn move_undo_is_exact_for_huge_deltas() {
    let mut graph = make_graph();
    graph.set_shape_position(ShapeNumber(1), Point::new(30.0, 30.3));
    let mut history = UndoRedoController::new();

    history.add_and_execute(&mut graph, Command::move_shape(ShapeNumber(1), -7.1, 1e17));
    let moved = graph.shape(ShapeNumber(1)).unwrap().position();

    history.undo(&mut graph);
    assert_eq!(graph.shape(ShapeNumber(1)).unwrap().position(), Point::new(30.0, 30.3));

    history.redo(&mut graph);
    assert_eq!(graph.shape(ShapeNumber(1)).unwrap().position(), moved);
    history.undo(&mut graph);
    assert_eq!(graph.shape(ShapeNumber(1)).unwrap().position(), Point::new(30.0, 30.3));
}

// ─── Availability ───────────────────────────────────────────────────────

#[test]
fn add_and_execute_always_clears_redo() {
    let mut graph = make_graph();
    let mut history = UndoRedoController::new();

    history.add_and_execute(&mut graph, Command::move_shape(ShapeNumber(1), 1.0, 1.0));
    history.add_and_execute(&mut graph, Command::move_shape(ShapeNumber(2), 1.0, 1.0));
    history.undo(&mut graph);
    history.undo(&mut graph);
    assert!(history.can_redo());

    history.add_and_execute(&mut graph, Command::move_shape(ShapeNumber(1), 5.0, 0.0));
    assert!(!history.can_redo());
    assert_eq!(history.redo(&mut graph), None);
}

#[test]
fn undoing_the_only_entry_flips_availability() {
    let mut graph = make_graph();
    let mut history = UndoRedoController::new();
    assert!(!history.can_undo());
    assert!(!history.can_redo());

    history.add_and_execute(&mut graph, Command::remove_lines([LineId(2)]));
    assert!(history.can_undo());

    history.undo(&mut graph);
    assert!(!history.can_undo());
    assert!(history.can_redo());
}

#[test]
fn undo_and_redo_are_strictly_lifo() {
    let mut graph = make_graph();
    let mut history = UndoRedoController::new();

    history.add_and_execute(&mut graph, Command::move_shape(ShapeNumber(1), 10.0, 0.0));
    history.add_and_execute(&mut graph, Command::move_shape(ShapeNumber(1), 0.0, 10.0));

    assert_eq!(history.undo(&mut graph).as_deref(), Some("Move shape #1 by (0, 10)"));
    assert_eq!(graph.shape(ShapeNumber(1)).unwrap().position(), Point::new(40.0, 40.0));
    assert_eq!(history.undo(&mut graph).as_deref(), Some("Move shape #1 by (10, 0)"));

    assert_eq!(history.redo(&mut graph).as_deref(), Some("Move shape #1 by (10, 0)"));
    assert_eq!(history.redo(&mut graph).as_deref(), Some("Move shape #1 by (0, 10)"));
    assert_eq!(graph.shape(ShapeNumber(1)).unwrap().position(), Point::new(40.0, 50.0));
}

// ─── Cascading removal ──────────────────────────────────────────────────

#[test]
fn removing_a_shape_removes_both_incident_lines() {
    let mut graph = make_graph();
    let before = make_graph();
    let mut history = UndoRedoController::new();

    // Shape #1 is an endpoint of lines 1 and 2.
    history.add_and_execute(&mut graph, Command::remove_shapes([ShapeNumber(1)]));
    assert!(graph.shape(ShapeNumber(1)).is_none());
    let remaining: Vec<LineId> = graph.lines().iter().map(|l| l.id).collect();
    assert_eq!(remaining, vec![LineId(3)]);

    history.undo(&mut graph);
    assert_eq!(graph, before);
    let line = graph.line(LineId(1)).unwrap();
    assert_eq!((line.from, line.to), (ShapeNumber(1), ShapeNumber(2)));
    let line = graph.line(LineId(2)).unwrap();
    assert_eq!((line.from, line.to), (ShapeNumber(3), ShapeNumber(1)));
}

#[test]
fn removing_connected_shapes_together_round_trips() {
    let mut graph = make_graph();
    let mut history = UndoRedoController::new();

    history.add_and_execute(&mut graph, Command::remove_shapes([ShapeNumber(3), ShapeNumber(1)]));
    assert_eq!(graph.shapes().len(), 1);
    assert!(graph.lines().is_empty());

    history.undo(&mut graph);
    assert_eq!(graph, make_graph());

    history.redo(&mut graph);
    assert_eq!(graph.shapes().len(), 1);
    assert!(graph.lines().is_empty());
}
