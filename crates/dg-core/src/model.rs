//! Diagram data model: shapes, lines, and the graph that owns them.
//!
//! The `Graph` is the single source of truth for the canvas. Its
//! collections are only mutable through `Graph` methods, and every
//! mutation publishes a `GraphEvent` to the registered listeners once it
//! has been applied. Renderers and other observers stay current by
//! listening instead of caching copies.

use crate::id::{LineId, ShapeNumber};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Sub};

// ─── Geometry ────────────────────────────────────────────────────────────

/// A 2D point or vector in some coordinate space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const ZERO: Point = Point { x: 0.0, y: 0.0 };

    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl Add for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

// ─── Shapes & Lines ──────────────────────────────────────────────────────

/// A box on the canvas. Position is relative to the canvas origin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shape {
    pub number: ShapeNumber,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    /// Marks the first endpoint while a line is being drawn.
    #[serde(default)]
    pub is_selected: bool,
}

impl Shape {
    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }

    /// Whether the canvas point `(px, py)` lies inside this shape.
    pub fn contains(&self, px: f64, py: f64) -> bool {
        px >= self.x && px <= self.x + self.width && py >= self.y && py <= self.y + self.height
    }
}

/// A connection between two distinct shapes, referenced by number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Line {
    pub id: LineId,
    pub from: ShapeNumber,
    pub to: ShapeNumber,
}

impl Line {
    /// Whether `number` is one of this line's endpoints.
    pub fn touches(&self, number: ShapeNumber) -> bool {
        self.from == number || self.to == number
    }
}

// ─── Change notification ─────────────────────────────────────────────────

/// A completed mutation of the graph, published to listeners.
#[derive(Debug, Clone, PartialEq)]
pub enum GraphEvent {
    ShapeInserted { index: usize, number: ShapeNumber },
    ShapeRemoved { index: usize, number: ShapeNumber },
    ShapeMoved { number: ShapeNumber, x: f64, y: f64 },
    ShapeSelection { number: ShapeNumber, selected: bool },
    LineInserted { index: usize, id: LineId },
    LineRemoved { index: usize, id: LineId },
}

/// Callback invoked after each graph mutation.
pub type Listener = Box<dyn FnMut(&GraphEvent)>;

// ─── Graph ───────────────────────────────────────────────────────────────

/// The shapes and lines of one diagram, in insertion (z-) order.
///
/// Identity counters only ever grow, so numbers stay unique even when a
/// shape is removed and a new one is created afterwards.
pub struct Graph {
    shapes: Vec<Shape>,
    lines: Vec<Line>,
    next_shape: u32,
    next_line: u32,
    listeners: Vec<Listener>,
}

impl Default for Graph {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Graph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Graph")
            .field("shapes", &self.shapes)
            .field("lines", &self.lines)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

/// Two graphs are equal when their shape and line collections are equal.
/// Identity counters and listeners are not compared.
impl PartialEq for Graph {
    fn eq(&self, other: &Self) -> bool {
        self.shapes == other.shapes && self.lines == other.lines
    }
}

impl Graph {
    /// Create an empty graph. The first shape created gets number 1.
    #[must_use]
    pub fn new() -> Self {
        Self {
            shapes: Vec::new(),
            lines: Vec::new(),
            next_shape: 1,
            next_line: 1,
            listeners: Vec::new(),
        }
    }

    /// The starter document: two shapes joined by one line.
    #[must_use]
    pub fn sample() -> Self {
        let mut graph = Self::new();
        let a = graph.create_shape(30.0, 40.0, 80.0, 80.0);
        let b = graph.create_shape(140.0, 230.0, 100.0, 100.0);
        let (from, to) = (a.number, b.number);
        graph.push_shape(a);
        graph.push_shape(b);
        if let Some(line) = graph.create_line(from, to) {
            graph.push_line(line);
        }
        graph
    }

    /// Register a listener for all subsequent mutations.
    pub fn subscribe(&mut self, listener: Listener) {
        self.listeners.push(listener);
    }

    fn notify(&mut self, event: GraphEvent) {
        for listener in &mut self.listeners {
            listener(&event);
        }
    }

    // ─── Construction ────────────────────────────────────────────────────

    /// Allocate a new shape with a fresh number. The shape is not inserted.
    pub fn create_shape(&mut self, x: f64, y: f64, width: f64, height: f64) -> Shape {
        let number = ShapeNumber(self.next_shape);
        self.next_shape += 1;
        Shape {
            number,
            x,
            y,
            width,
            height,
            is_selected: false,
        }
    }

    /// Allocate a new line between two distinct shapes. The line is not
    /// inserted. Returns `None` for a self-loop.
    pub fn create_line(&mut self, from: ShapeNumber, to: ShapeNumber) -> Option<Line> {
        if from == to {
            return None;
        }
        let id = LineId(self.next_line);
        self.next_line += 1;
        Some(Line { id, from, to })
    }

    // ─── Queries ─────────────────────────────────────────────────────────

    pub fn shapes(&self) -> &[Shape] {
        &self.shapes
    }

    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    pub fn shape(&self, number: ShapeNumber) -> Option<&Shape> {
        self.shapes.iter().find(|s| s.number == number)
    }

    pub fn shape_index(&self, number: ShapeNumber) -> Option<usize> {
        self.shapes.iter().position(|s| s.number == number)
    }

    pub fn line(&self, id: LineId) -> Option<&Line> {
        self.lines.iter().find(|l| l.id == id)
    }

    pub fn line_index(&self, id: LineId) -> Option<usize> {
        self.lines.iter().position(|l| l.id == id)
    }

    /// Lines with `number` as one of their endpoints, in z-order.
    pub fn incident_lines(&self, number: ShapeNumber) -> impl Iterator<Item = &Line> {
        self.lines.iter().filter(move |l| l.touches(number))
    }

    // ─── Shape mutations ─────────────────────────────────────────────────

    /// Append a shape at the top of the z-order.
    pub fn push_shape(&mut self, shape: Shape) {
        let index = self.shapes.len();
        self.insert_shape(index, shape);
    }

    /// Insert a shape at `index`.
    ///
    /// # Panics
    /// Panics if `index > shapes().len()`.
    pub fn insert_shape(&mut self, index: usize, shape: Shape) {
        let number = shape.number;
        self.next_shape = self.next_shape.max(number.0 + 1);
        self.shapes.insert(index, shape);
        self.notify(GraphEvent::ShapeInserted { index, number });
    }

    /// Remove a shape, returning its former index and value.
    /// Incident lines are left untouched.
    pub fn remove_shape(&mut self, number: ShapeNumber) -> Option<(usize, Shape)> {
        let index = self.shape_index(number)?;
        let shape = self.shapes.remove(index);
        self.notify(GraphEvent::ShapeRemoved { index, number });
        Some((index, shape))
    }

    /// Offset a shape's position. Returns false if the shape is missing.
    pub fn translate_shape(&mut self, number: ShapeNumber, dx: f64, dy: f64) -> bool {
        let Some(shape) = self.shapes.iter_mut().find(|s| s.number == number) else {
            return false;
        };
        shape.x += dx;
        shape.y += dy;
        let (x, y) = (shape.x, shape.y);
        self.notify(GraphEvent::ShapeMoved { number, x, y });
        true
    }

    /// Place a shape at an absolute canvas position.
    /// Returns false if the shape is missing.
    pub fn set_shape_position(&mut self, number: ShapeNumber, position: Point) -> bool {
        let Some(shape) = self.shapes.iter_mut().find(|s| s.number == number) else {
            return false;
        };
        shape.x = position.x;
        shape.y = position.y;
        self.notify(GraphEvent::ShapeMoved {
            number,
            x: position.x,
            y: position.y,
        });
        true
    }

    /// Set the line-drawing selection mark. Returns false if the shape is
    /// missing.
    pub fn set_selected(&mut self, number: ShapeNumber, selected: bool) -> bool {
        let Some(shape) = self.shapes.iter_mut().find(|s| s.number == number) else {
            return false;
        };
        if shape.is_selected != selected {
            shape.is_selected = selected;
            self.notify(GraphEvent::ShapeSelection { number, selected });
        }
        true
    }

    // ─── Line mutations ──────────────────────────────────────────────────

    /// Append a line at the top of the z-order.
    pub fn push_line(&mut self, line: Line) {
        let index = self.lines.len();
        self.insert_line(index, line);
    }

    /// Insert a line at `index`.
    ///
    /// # Panics
    /// Panics if `index > lines().len()`.
    pub fn insert_line(&mut self, index: usize, line: Line) {
        let id = line.id;
        self.next_line = self.next_line.max(id.0 + 1);
        self.lines.insert(index, line);
        self.notify(GraphEvent::LineInserted { index, id });
    }

    /// Remove a line, returning its former index and value.
    pub fn remove_line(&mut self, id: LineId) -> Option<(usize, Line)> {
        let index = self.line_index(id)?;
        let line = self.lines.remove(index);
        self.notify(GraphEvent::LineRemoved { index, id });
        Some((index, line))
    }
}
